//! Composable server-side filter primitives.
//!
//! A filter tree travels inside the scan descriptor and is evaluated by
//! the store against each candidate row. Comparisons run on raw encoded
//! bytes with the store's unsigned lexicographic comparator; regex
//! comparisons decode the value as UTF-8 first.

use hayloft_codec::ColumnKey;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::row::RawRow;

/// Value comparison operators understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone)]
pub enum ScanFilter {
    /// Compare a column's latest value against fixed bytes.
    ///
    /// A row missing the column matches only under `Ne`: absence differs
    /// from every value but equals none.
    ValueCompare {
        column: ColumnKey,
        op: CompareOp,
        value: Vec<u8>,
    },
    /// Regex over the column's latest value decoded as UTF-8; rows missing
    /// the column, or holding non-UTF-8 bytes, do not match.
    ValueRegex { column: ColumnKey, regex: Regex },
    /// Matches rows where the column is missing or holds an empty value.
    ColumnAbsent { column: ColumnKey },
    And(Vec<ScanFilter>),
    Or(Vec<ScanFilter>),
    /// Early-termination wrapper: once the inner filter fails for a row,
    /// the scan stops entirely instead of skipping that row.
    WhileMatch(Box<ScanFilter>),
}

impl ScanFilter {
    /// Evaluate against a full (pre-projection) row.
    pub fn matches(&self, row: &RawRow) -> bool {
        match self {
            ScanFilter::ValueCompare { column, op, value } => {
                match row.latest(column.family(), column.qualifier()) {
                    None => matches!(op, CompareOp::Ne),
                    Some(actual) => compare(actual, *op, value),
                }
            }
            ScanFilter::ValueRegex { column, regex } => {
                match row.latest(column.family(), column.qualifier()) {
                    Some(actual) => match std::str::from_utf8(actual) {
                        Ok(text) => regex.is_match(text),
                        Err(_) => false,
                    },
                    None => false,
                }
            }
            ScanFilter::ColumnAbsent { column } => row
                .latest(column.family(), column.qualifier())
                .is_none_or(|bytes| bytes.is_empty()),
            ScanFilter::And(children) => children.iter().all(|child| child.matches(row)),
            ScanFilter::Or(children) => children.iter().any(|child| child.matches(row)),
            ScanFilter::WhileMatch(inner) => inner.matches(row),
        }
    }

    /// True when a `WhileMatch` wrapper anywhere in the tree fails for this
    /// row, meaning the scan must stop rather than skip.
    pub fn while_exhausted(&self, row: &RawRow) -> bool {
        match self {
            ScanFilter::WhileMatch(inner) => !inner.matches(row),
            ScanFilter::And(children) | ScanFilter::Or(children) => {
                children.iter().any(|child| child.while_exhausted(row))
            }
            _ => false,
        }
    }
}

fn compare(actual: &[u8], op: CompareOp, expected: &[u8]) -> bool {
    match op {
        CompareOp::Eq => actual == expected,
        CompareOp::Ne => actual != expected,
        CompareOp::Lt => actual < expected,
        CompareOp::Lte => actual <= expected,
        CompareOp::Gt => actual > expected,
        CompareOp::Gte => actual >= expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with(value: &[u8]) -> RawRow {
        let mut row = RawRow::new(b"r".to_vec());
        row.insert("cf", b"q", 1, value.to_vec());
        row
    }

    fn compare_filter(op: CompareOp, value: &[u8]) -> ScanFilter {
        ScanFilter::ValueCompare {
            column: ColumnKey::parse("cf:q"),
            op,
            value: value.to_vec(),
        }
    }

    #[test]
    fn eq_matches_exact_bytes() {
        assert!(compare_filter(CompareOp::Eq, b"abc").matches(&row_with(b"abc")));
        assert!(!compare_filter(CompareOp::Eq, b"abc").matches(&row_with(b"abd")));
    }

    #[test]
    fn missing_column_matches_only_ne() {
        let empty = RawRow::new(b"r".to_vec());
        assert!(compare_filter(CompareOp::Ne, b"x").matches(&empty));
        assert!(!compare_filter(CompareOp::Eq, b"x").matches(&empty));
        assert!(!compare_filter(CompareOp::Gt, b"x").matches(&empty));
    }

    #[test]
    fn absent_matches_missing_and_empty() {
        let absent = ScanFilter::ColumnAbsent {
            column: ColumnKey::parse("cf:q"),
        };
        assert!(absent.matches(&RawRow::new(b"r".to_vec())));
        assert!(absent.matches(&row_with(b"")));
        assert!(!absent.matches(&row_with(b"x")));
    }

    #[test]
    fn regex_matches_decoded_text() {
        let filter = ScanFilter::ValueRegex {
            column: ColumnKey::parse("cf:q"),
            regex: Regex::new("^ab").unwrap(),
        };
        assert!(filter.matches(&row_with(b"abc")));
        assert!(!filter.matches(&row_with(b"xbc")));
        assert!(!filter.matches(&row_with(&[0xFF, 0xFE])));
    }

    #[test]
    fn and_or_compose() {
        let both = ScanFilter::And(vec![
            compare_filter(CompareOp::Gte, b"b"),
            compare_filter(CompareOp::Lt, b"d"),
        ]);
        assert!(both.matches(&row_with(b"c")));
        assert!(!both.matches(&row_with(b"a")));

        let either = ScanFilter::Or(vec![
            compare_filter(CompareOp::Eq, b"a"),
            compare_filter(CompareOp::Eq, b"z"),
        ]);
        assert!(either.matches(&row_with(b"z")));
        assert!(!either.matches(&row_with(b"m")));
    }

    #[test]
    fn while_exhausted_fires_on_inner_failure() {
        let filter = ScanFilter::And(vec![ScanFilter::WhileMatch(Box::new(compare_filter(
            CompareOp::Lte,
            b"b",
        )))]);
        assert!(!filter.while_exhausted(&row_with(b"a")));
        assert!(filter.while_exhausted(&row_with(b"c")));
    }
}
