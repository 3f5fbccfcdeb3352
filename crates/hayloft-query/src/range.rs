//! Rowkey range forms accepted by `range(..)`.

use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

use hayloft_codec::{TypedValue, encode, prefix_successor};
use hayloft_store::ScanDescriptor;

use crate::compile::FilterError;

#[derive(Debug, Clone, PartialEq)]
pub enum RangeSpec {
    /// Start (inclusive) and/or stop bounds; `None` is unbounded on that
    /// side. An inclusive stop compiles to the successor of its bytes.
    Bounds {
        start: Option<TypedValue>,
        stop: Option<TypedValue>,
        stop_inclusive: bool,
    },
    /// Union of rowkey prefixes; more than one compiles to a union of
    /// sub-ranges, de-duplicated, in row order.
    Prefix(Vec<TypedValue>),
}

impl RangeSpec {
    /// Explicit bounds, both optional, stop exclusive.
    pub fn start_stop(
        start: Option<impl Into<TypedValue>>,
        stop: Option<impl Into<TypedValue>>,
    ) -> Self {
        RangeSpec::Bounds {
            start: start.map(Into::into),
            stop: stop.map(Into::into),
            stop_inclusive: false,
        }
    }

    pub fn prefix(value: impl Into<TypedValue>) -> Self {
        RangeSpec::Prefix(vec![value.into()])
    }

    pub fn prefixes<T: Into<TypedValue>>(values: impl IntoIterator<Item = T>) -> Self {
        RangeSpec::Prefix(values.into_iter().map(Into::into).collect())
    }

    /// Write the compiled row bounds into a scan descriptor.
    pub fn apply(&self, descriptor: &mut ScanDescriptor) -> Result<(), FilterError> {
        match self {
            RangeSpec::Bounds {
                start,
                stop,
                stop_inclusive,
            } => {
                descriptor.start_row = start.as_ref().map(encode);
                descriptor.stop_row = match stop {
                    None => None,
                    Some(value) => {
                        let bytes = encode(value);
                        if *stop_inclusive {
                            // No successor means no upper bound exists.
                            prefix_successor(&bytes)
                        } else {
                            Some(bytes)
                        }
                    }
                };
                descriptor.prefixes.clear();
            }
            RangeSpec::Prefix(values) => {
                if values.is_empty() {
                    return Err(FilterError(
                        "prefix range requires at least one prefix".to_string(),
                    ));
                }
                let mut encoded: Vec<Vec<u8>> = values.iter().map(encode).collect();
                if encoded.len() == 1 {
                    let prefix = take_single(&mut encoded);
                    descriptor.stop_row = prefix_successor(&prefix);
                    descriptor.start_row = Some(prefix);
                    descriptor.prefixes.clear();
                } else {
                    encoded.sort();
                    encoded.dedup();
                    descriptor.start_row = None;
                    descriptor.stop_row = None;
                    descriptor.prefixes = encoded;
                }
            }
        }
        Ok(())
    }
}

fn take_single(encoded: &mut Vec<Vec<u8>>) -> Vec<u8> {
    encoded.pop().unwrap_or_default()
}

impl<T: Into<TypedValue>> From<Range<T>> for RangeSpec {
    fn from(range: Range<T>) -> Self {
        RangeSpec::Bounds {
            start: Some(range.start.into()),
            stop: Some(range.end.into()),
            stop_inclusive: false,
        }
    }
}

impl<T: Into<TypedValue>> From<RangeInclusive<T>> for RangeSpec {
    fn from(range: RangeInclusive<T>) -> Self {
        let (start, stop) = range.into_inner();
        RangeSpec::Bounds {
            start: Some(start.into()),
            stop: Some(stop.into()),
            stop_inclusive: true,
        }
    }
}

impl<T: Into<TypedValue>> From<RangeFrom<T>> for RangeSpec {
    fn from(range: RangeFrom<T>) -> Self {
        RangeSpec::Bounds {
            start: Some(range.start.into()),
            stop: None,
            stop_inclusive: false,
        }
    }
}

impl<T: Into<TypedValue>> From<RangeTo<T>> for RangeSpec {
    fn from(range: RangeTo<T>) -> Self {
        RangeSpec::Bounds {
            start: None,
            stop: Some(range.end.into()),
            stop_inclusive: false,
        }
    }
}

impl<T: Into<TypedValue>> From<RangeToInclusive<T>> for RangeSpec {
    fn from(range: RangeToInclusive<T>) -> Self {
        RangeSpec::Bounds {
            start: None,
            stop: Some(range.end.into()),
            stop_inclusive: true,
        }
    }
}

impl From<RangeFull> for RangeSpec {
    fn from(_: RangeFull) -> Self {
        RangeSpec::Bounds {
            start: None,
            stop: None,
            stop_inclusive: false,
        }
    }
}

// A bare value is a start-only range.
impl From<TypedValue> for RangeSpec {
    fn from(value: TypedValue) -> Self {
        RangeSpec::Bounds {
            start: Some(value),
            stop: None,
            stop_inclusive: false,
        }
    }
}

impl From<&str> for RangeSpec {
    fn from(value: &str) -> Self {
        RangeSpec::from(TypedValue::from(value))
    }
}

impl From<String> for RangeSpec {
    fn from(value: String) -> Self {
        RangeSpec::from(TypedValue::from(value))
    }
}

impl From<i64> for RangeSpec {
    fn from(value: i64) -> Self {
        RangeSpec::from(TypedValue::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(spec: RangeSpec) -> ScanDescriptor {
        let mut desc = ScanDescriptor::default();
        spec.apply(&mut desc).unwrap();
        desc
    }

    #[test]
    fn exclusive_range_keeps_stop_bytes() {
        let desc = applied(RangeSpec::from("row-111".."row-120"));
        assert_eq!(desc.start_row.as_deref(), Some(b"row-111".as_slice()));
        assert_eq!(desc.stop_row.as_deref(), Some(b"row-120".as_slice()));
    }

    #[test]
    fn inclusive_range_stops_at_successor() {
        let desc = applied(RangeSpec::from("row-111"..="row-120"));
        assert_eq!(desc.stop_row.as_deref(), Some(b"row-121".as_slice()));
    }

    #[test]
    fn single_value_is_start_only() {
        let desc = applied(RangeSpec::from("row-5"));
        assert_eq!(desc.start_row.as_deref(), Some(b"row-5".as_slice()));
        assert!(desc.stop_row.is_none());
    }

    #[test]
    fn open_sides_stay_unbounded() {
        let desc = applied(RangeSpec::start_stop(None::<&str>, Some("m")));
        assert!(desc.start_row.is_none());
        assert_eq!(desc.stop_row.as_deref(), Some(b"m".as_slice()));
    }

    #[test]
    fn single_prefix_compiles_to_bounds() {
        let desc = applied(RangeSpec::prefix("user-1"));
        assert_eq!(desc.start_row.as_deref(), Some(b"user-1".as_slice()));
        assert_eq!(desc.stop_row.as_deref(), Some(b"user-2".as_slice()));
        assert!(desc.prefixes.is_empty());
    }

    #[test]
    fn many_prefixes_compile_to_sorted_union() {
        let desc = applied(RangeSpec::prefixes(["cow", "ant", "cow"]));
        assert_eq!(desc.prefixes, vec![b"ant".to_vec(), b"cow".to_vec()]);
        assert!(desc.start_row.is_none());
        assert!(desc.stop_row.is_none());
    }

    #[test]
    fn empty_prefix_list_is_rejected() {
        let mut desc = ScanDescriptor::default();
        let err = RangeSpec::Prefix(vec![]).apply(&mut desc).unwrap_err();
        assert!(err.0.contains("at least one prefix"), "{}", err.0);
    }

    #[test]
    fn inclusive_stop_at_carry_boundary_becomes_unbounded() {
        let spec = RangeSpec::Bounds {
            start: None,
            stop: Some(TypedValue::Raw(vec![0x7F, 0x7F])),
            stop_inclusive: true,
        };
        let desc = applied(spec);
        assert!(desc.stop_row.is_none());
    }
}
