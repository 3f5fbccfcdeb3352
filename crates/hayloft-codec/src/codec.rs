//! Byte encoding for typed values.
//!
//! Layouts match the store's native types so values written here are
//! readable by any other client of the same store:
//! - string/symbol: UTF-8 bytes, no length prefix, no terminator
//! - long/int/short/byte: big-endian two's-complement, fixed width
//! - double/float: IEEE-754 big-endian bit pattern
//! - boolean: one byte, `0x00` false, nonzero true
//! - bigint: minimal two's-complement big-endian bytes
//! - decimal: 4-byte big-endian scale, then the unscaled value as bigint
//! - raw: identity
//!
//! A `nil`/absent value encodes as the empty sequence; decoding an empty
//! sequence succeeds only for string, symbol and raw.

use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::value::{TypeTag, TypedValue};

#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Byte length incompatible with the tag's layout.
    TypeMismatch { tag: TypeTag, len: usize },
    /// Value cannot be narrowed to the target tag without loss.
    OutOfRange { tag: TypeTag, value: String },
    /// No coercion exists between the two tags.
    Incompatible { from: TypeTag, to: TypeTag },
    /// Bytes are the right length but not a valid value for the tag.
    Corrupt { tag: TypeTag, reason: String },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::TypeMismatch { tag, len } => {
                write!(f, "cannot decode {len} bytes as {tag}")
            }
            CodecError::OutOfRange { tag, value } => {
                write!(f, "value {value} does not fit in {tag}")
            }
            CodecError::Incompatible { from, to } => {
                write!(f, "no coercion from {from} to {to}")
            }
            CodecError::Corrupt { tag, reason } => {
                write!(f, "invalid {tag} bytes: {reason}")
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// Encode a typed value into its store-native byte form.
pub fn encode(value: &TypedValue) -> Vec<u8> {
    match value {
        TypedValue::String(s) | TypedValue::Symbol(s) => s.as_bytes().to_vec(),
        TypedValue::Long(v) => v.to_be_bytes().to_vec(),
        TypedValue::Int(v) => v.to_be_bytes().to_vec(),
        TypedValue::Short(v) => v.to_be_bytes().to_vec(),
        TypedValue::Byte(v) => v.to_be_bytes().to_vec(),
        TypedValue::Double(v) => v.to_be_bytes().to_vec(),
        TypedValue::Float(v) => v.to_be_bytes().to_vec(),
        TypedValue::Boolean(v) => vec![u8::from(*v)],
        TypedValue::BigInt(v) => v.to_signed_bytes_be(),
        TypedValue::Decimal(v) => {
            let (unscaled, exponent) = v.as_bigint_and_exponent();
            // The store's decimal layout carries the scale as an i32.
            let scale = exponent as i32;
            let mut out = scale.to_be_bytes().to_vec();
            out.extend_from_slice(&unscaled.to_signed_bytes_be());
            out
        }
        TypedValue::Raw(v) => v.clone(),
    }
}

/// Decode store-native bytes into a typed value.
///
/// Fails with [`CodecError::TypeMismatch`] when the byte length is
/// incompatible with a fixed-width tag, and with [`CodecError::Corrupt`]
/// when the bytes are not a valid value of the tag. Decoding with the
/// wrong same-width tag yields a well-formed but meaningless value; it is
/// never reinterpreted silently as another type.
pub fn decode(tag: TypeTag, bytes: &[u8]) -> Result<TypedValue, CodecError> {
    if let Some(width) = tag.fixed_width() {
        if bytes.len() != width {
            return Err(CodecError::TypeMismatch {
                tag,
                len: bytes.len(),
            });
        }
    }
    match tag {
        TypeTag::String => utf8(tag, bytes).map(TypedValue::String),
        TypeTag::Symbol => utf8(tag, bytes).map(TypedValue::Symbol),
        TypeTag::Long => Ok(TypedValue::Long(i64::from_be_bytes(fixed(bytes)))),
        TypeTag::Int => Ok(TypedValue::Int(i32::from_be_bytes(fixed(bytes)))),
        TypeTag::Short => Ok(TypedValue::Short(i16::from_be_bytes(fixed(bytes)))),
        TypeTag::Byte => Ok(TypedValue::Byte(i8::from_be_bytes(fixed(bytes)))),
        TypeTag::Double => Ok(TypedValue::Double(f64::from_be_bytes(fixed(bytes)))),
        TypeTag::Float => Ok(TypedValue::Float(f32::from_be_bytes(fixed(bytes)))),
        TypeTag::Boolean => Ok(TypedValue::Boolean(bytes[0] != 0)),
        TypeTag::BigInt => {
            if bytes.is_empty() {
                return Err(CodecError::TypeMismatch { tag, len: 0 });
            }
            Ok(TypedValue::BigInt(Box::new(BigInt::from_signed_bytes_be(
                bytes,
            ))))
        }
        TypeTag::Decimal => {
            if bytes.len() < 4 {
                return Err(CodecError::TypeMismatch {
                    tag,
                    len: bytes.len(),
                });
            }
            let scale = i32::from_be_bytes(fixed(&bytes[..4]));
            let unscaled = BigInt::from_signed_bytes_be(&bytes[4..]);
            Ok(TypedValue::Decimal(Box::new(BigDecimal::new(
                unscaled,
                i64::from(scale),
            ))))
        }
        TypeTag::Raw => Ok(TypedValue::Raw(bytes.to_vec())),
    }
}

fn utf8(tag: TypeTag, bytes: &[u8]) -> Result<String, CodecError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| CodecError::Corrupt {
        tag,
        reason: e.to_string(),
    })
}

/// Copy a slice whose length was already validated into a fixed array.
fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}
