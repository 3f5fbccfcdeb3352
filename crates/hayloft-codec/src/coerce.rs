//! Schema-driven value coercion.
//!
//! When a schema declares a column's wire type, values written or compared
//! against that column are adapted to the declared tag before encoding.
//! Integer-family values narrow and widen with range checks; the float and
//! string families interchange within themselves; everything else must
//! already carry the target tag.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::codec::CodecError;
use crate::value::{TypeTag, TypedValue};

/// Adapt `value` to `target`, or fail when no lossless-enough mapping
/// exists. Narrowing an integer outside the target's range fails with
/// [`CodecError::OutOfRange`] rather than wrapping.
pub fn coerce(value: TypedValue, target: TypeTag) -> Result<TypedValue, CodecError> {
    if value.tag() == target {
        return Ok(value);
    }
    let from = value.tag();
    match (value, target) {
        (TypedValue::Long(v), t) if is_integer(t) => integer(i128::from(v), t),
        (TypedValue::Int(v), t) if is_integer(t) => integer(i128::from(v), t),
        (TypedValue::Short(v), t) if is_integer(t) => integer(i128::from(v), t),
        (TypedValue::Byte(v), t) if is_integer(t) => integer(i128::from(v), t),
        (TypedValue::BigInt(v), t) if is_integer(t) => match i128::try_from(&*v) {
            Ok(wide) => integer(wide, t),
            Err(_) => Err(CodecError::OutOfRange {
                tag: t,
                value: v.to_string(),
            }),
        },

        (TypedValue::Long(v), TypeTag::Decimal) => Ok(TypedValue::Decimal(Box::new(
            BigDecimal::from(v),
        ))),
        (TypedValue::Int(v), TypeTag::Decimal) => Ok(TypedValue::Decimal(Box::new(
            BigDecimal::from(v),
        ))),
        (TypedValue::BigInt(v), TypeTag::Decimal) => Ok(TypedValue::Decimal(Box::new(
            BigDecimal::from(*v),
        ))),

        (TypedValue::Double(v), TypeTag::Float) => Ok(TypedValue::Float(v as f32)),
        (TypedValue::Float(v), TypeTag::Double) => Ok(TypedValue::Double(f64::from(v))),

        (TypedValue::String(s), TypeTag::Symbol) => Ok(TypedValue::Symbol(s)),
        (TypedValue::Symbol(s), TypeTag::String) => Ok(TypedValue::String(s)),

        (_, to) => Err(CodecError::Incompatible { from, to }),
    }
}

fn is_integer(tag: TypeTag) -> bool {
    matches!(
        tag,
        TypeTag::Long | TypeTag::Int | TypeTag::Short | TypeTag::Byte | TypeTag::BigInt
    )
}

fn integer(wide: i128, target: TypeTag) -> Result<TypedValue, CodecError> {
    let out_of_range = || CodecError::OutOfRange {
        tag: target,
        value: wide.to_string(),
    };
    match target {
        TypeTag::Long => i64::try_from(wide)
            .map(TypedValue::Long)
            .map_err(|_| out_of_range()),
        TypeTag::Int => i32::try_from(wide)
            .map(TypedValue::Int)
            .map_err(|_| out_of_range()),
        TypeTag::Short => i16::try_from(wide)
            .map(TypedValue::Short)
            .map_err(|_| out_of_range()),
        TypeTag::Byte => i8::try_from(wide)
            .map(TypedValue::Byte)
            .map_err(|_| out_of_range()),
        TypeTag::BigInt => Ok(TypedValue::BigInt(Box::new(BigInt::from(wide)))),
        _ => Err(out_of_range()),
    }
}
