//! Compilation of declarative predicates into server-side filters.

use hayloft_codec::{ColumnKey, TypedValue};
use hayloft_store::{CompareOp, ScanFilter};
use regex::RegexBuilder;

use crate::predicate::PredicateSpec;

/// Validation error raised while building a query.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterError(pub String);

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid filter: {}", self.0)
    }
}

impl std::error::Error for FilterError {}

/// Compile one column's predicate spec into a filter tree.
///
/// `encode` turns a typed value into the column's stored byte form; the
/// caller supplies it so schema-aware coercion stays outside this crate.
/// Validation is eager: empty lists, unbounded ranges and bad regex
/// patterns fail here, naming the column, never at scan time.
pub fn build_filter<E>(
    column: &ColumnKey,
    spec: &PredicateSpec,
    encode: &E,
) -> Result<ScanFilter, FilterError>
where
    E: Fn(&TypedValue) -> Result<Vec<u8>, FilterError>,
{
    if column.family().is_empty() {
        return Err(FilterError(format!(
            "column {column:?} has an empty family"
        )));
    }
    match spec {
        PredicateSpec::Eq(value) => Ok(ScanFilter::ValueCompare {
            column: column.clone(),
            op: CompareOp::Eq,
            value: encode(value)?,
        }),
        PredicateSpec::Absent => Ok(ScanFilter::ColumnAbsent {
            column: column.clone(),
        }),
        PredicateSpec::Range {
            lower,
            lower_inclusive,
            upper,
            upper_inclusive,
        } => {
            let mut parts = Vec::new();
            if let Some(value) = lower {
                let op = if *lower_inclusive {
                    CompareOp::Gte
                } else {
                    CompareOp::Gt
                };
                parts.push(ScanFilter::ValueCompare {
                    column: column.clone(),
                    op,
                    value: encode(value)?,
                });
            }
            if let Some(value) = upper {
                let op = if *upper_inclusive {
                    CompareOp::Lte
                } else {
                    CompareOp::Lt
                };
                parts.push(ScanFilter::ValueCompare {
                    column: column.clone(),
                    op,
                    value: encode(value)?,
                });
            }
            match parts.len() {
                0 => Err(FilterError(format!(
                    "range on column {column} has no bounds"
                ))),
                1 => Ok(take_single(parts)),
                _ => Ok(ScanFilter::And(parts)),
            }
        }
        PredicateSpec::AnyOf(specs) => {
            if specs.is_empty() {
                return Err(FilterError(format!(
                    "empty value list for column {column}"
                )));
            }
            let children = specs
                .iter()
                .map(|sub| build_filter(column, sub, encode))
                .collect::<Result<Vec<_>, _>>()?;
            if children.len() == 1 {
                Ok(take_single(children))
            } else {
                Ok(ScanFilter::Or(children))
            }
        }
        PredicateSpec::AllOf(specs) => {
            if specs.is_empty() {
                return Err(FilterError(format!(
                    "empty comparator set for column {column}"
                )));
            }
            let children = specs
                .iter()
                .map(|sub| build_filter(column, sub, encode))
                .collect::<Result<Vec<_>, _>>()?;
            if children.len() == 1 {
                Ok(take_single(children))
            } else {
                Ok(ScanFilter::And(children))
            }
        }
        PredicateSpec::Compare { op, value } => Ok(ScanFilter::ValueCompare {
            column: column.clone(),
            op: *op,
            value: encode(value)?,
        }),
        PredicateSpec::Pattern {
            pattern,
            case_insensitive,
        } => {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(*case_insensitive)
                .build()
                .map_err(|e| {
                    FilterError(format!("invalid pattern for column {column}: {e}"))
                })?;
            Ok(ScanFilter::ValueRegex {
                column: column.clone(),
                regex,
            })
        }
    }
}

fn take_single(mut filters: Vec<ScanFilter>) -> ScanFilter {
    match filters.pop() {
        Some(filter) => filter,
        None => ScanFilter::And(Vec::new()),
    }
}

/// AND the per-column filters of a whole query; while-predicates get the
/// early-stop wrapper before joining the chain.
pub fn combine_filters(
    filters: Vec<ScanFilter>,
    while_filters: Vec<ScanFilter>,
) -> Option<ScanFilter> {
    let mut all = filters;
    all.extend(
        while_filters
            .into_iter()
            .map(|filter| ScanFilter::WhileMatch(Box::new(filter))),
    );
    match all.len() {
        0 => None,
        1 => Some(take_single(all)),
        _ => Some(ScanFilter::And(all)),
    }
}
