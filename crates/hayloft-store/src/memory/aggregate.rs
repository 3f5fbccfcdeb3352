//! Aggregation over scanned rows, standing in for the store's server-side
//! aggregation endpoint.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use hayloft_codec::{ColumnKey, TypeTag, TypedValue, decode};

use crate::error::StoreError;
use crate::row::RawRow;
use crate::scan::AggregateOp;

/// Numeric value class an interpreter tag maps into.
enum Num {
    Long(i64),
    Double(f64),
    Decimal(BigDecimal),
}

impl Num {
    fn as_f64(&self) -> f64 {
        match self {
            Num::Long(v) => *v as f64,
            Num::Double(v) => *v,
            Num::Decimal(d) => {
                use bigdecimal::ToPrimitive;
                d.to_f64().unwrap_or(f64::NAN)
            }
        }
    }
}

pub(crate) fn run_aggregate(
    rows: &[RawRow],
    op: AggregateOp,
    interpreter: TypeTag,
    column: Option<&ColumnKey>,
) -> Result<TypedValue, StoreError> {
    if matches!(op, AggregateOp::RowCount) {
        return Ok(TypedValue::Long(rows.len() as i64));
    }
    let column = column.ok_or_else(|| {
        StoreError::Storage("aggregation requires a selected column".to_string())
    })?;

    let mut values = Vec::new();
    for row in rows {
        // Rows without the column contribute nothing, matching the
        // store's null-cell handling.
        if let Some(bytes) = row.latest(column.family(), column.qualifier()) {
            values.push(interpret(interpreter, bytes, column)?);
        }
    }

    match op {
        AggregateOp::RowCount => unreachable!("handled above"),
        AggregateOp::Sum => Ok(sum(values)),
        AggregateOp::Min => {
            fold_extreme(values, column, |current, candidate| candidate < current)
        }
        AggregateOp::Max => {
            fold_extreme(values, column, |current, candidate| candidate > current)
        }
        AggregateOp::Avg => {
            if values.is_empty() {
                return Err(empty_selection(column));
            }
            let total: f64 = values.iter().map(Num::as_f64).sum();
            Ok(TypedValue::Double(total / values.len() as f64))
        }
        AggregateOp::StdDev => {
            if values.is_empty() {
                return Err(empty_selection(column));
            }
            let count = values.len() as f64;
            let mean = values.iter().map(Num::as_f64).sum::<f64>() / count;
            let variance = values
                .iter()
                .map(|v| {
                    let delta = v.as_f64() - mean;
                    delta * delta
                })
                .sum::<f64>()
                / count;
            Ok(TypedValue::Double(variance.sqrt()))
        }
    }
}

fn interpret(tag: TypeTag, bytes: &[u8], column: &ColumnKey) -> Result<Num, StoreError> {
    let value = decode(tag, bytes)
        .map_err(|e| StoreError::Storage(format!("column {column}: {e}")))?;
    match value {
        TypedValue::Long(v) => Ok(Num::Long(v)),
        TypedValue::Int(v) => Ok(Num::Long(i64::from(v))),
        TypedValue::Short(v) => Ok(Num::Long(i64::from(v))),
        TypedValue::Byte(v) => Ok(Num::Long(i64::from(v))),
        TypedValue::Double(v) => Ok(Num::Double(v)),
        TypedValue::Float(v) => Ok(Num::Double(f64::from(v))),
        TypedValue::Decimal(d) => Ok(Num::Decimal(*d)),
        TypedValue::BigInt(v) => Ok(Num::Decimal(BigDecimal::from(*v))),
        other => Err(StoreError::Unsupported(format!(
            "aggregation over non-numeric column {column} ({})",
            other.tag()
        ))),
    }
}

fn sum(values: Vec<Num>) -> TypedValue {
    let mut long_total: i128 = 0;
    let mut double_total: f64 = 0.0;
    let mut decimal_total = BigDecimal::from(0);
    let mut class = None;
    for value in values {
        match value {
            Num::Long(v) => {
                long_total += i128::from(v);
                class.get_or_insert(TypeTag::Long);
            }
            Num::Double(v) => {
                double_total += v;
                class.get_or_insert(TypeTag::Double);
            }
            Num::Decimal(d) => {
                decimal_total += d;
                class.get_or_insert(TypeTag::Decimal);
            }
        }
    }
    match class {
        Some(TypeTag::Double) => TypedValue::Double(double_total),
        Some(TypeTag::Decimal) => TypedValue::Decimal(Box::new(decimal_total)),
        // Empty selections sum to long zero.
        _ => match i64::try_from(long_total) {
            Ok(v) => TypedValue::Long(v),
            Err(_) => TypedValue::BigInt(Box::new(BigInt::from(long_total))),
        },
    }
}

fn fold_extreme(
    values: Vec<Num>,
    column: &ColumnKey,
    wins: impl Fn(f64, f64) -> bool,
) -> Result<TypedValue, StoreError> {
    let mut best: Option<Num> = None;
    for value in values {
        best = match best {
            None => Some(value),
            Some(current) => {
                if wins(current.as_f64(), value.as_f64()) {
                    Some(value)
                } else {
                    Some(current)
                }
            }
        };
    }
    match best {
        Some(Num::Long(v)) => Ok(TypedValue::Long(v)),
        Some(Num::Double(v)) => Ok(TypedValue::Double(v)),
        Some(Num::Decimal(d)) => Ok(TypedValue::Decimal(Box::new(d))),
        None => Err(empty_selection(column)),
    }
}

fn empty_selection(column: &ColumnKey) -> StoreError {
    StoreError::Storage(format!("no values to aggregate in column {column}"))
}
