use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// Wire type of a column value.
///
/// Determines the encode/decode rules in [`crate::codec`]. Fixed-width tags
/// use the store's native big-endian two's-complement layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    String,
    Symbol,
    Long,
    Int,
    Short,
    Byte,
    Double,
    Float,
    Boolean,
    BigInt,
    Decimal,
    Raw,
}

impl TypeTag {
    /// Byte width for tags whose encoding has a fixed length.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            TypeTag::Long => Some(8),
            TypeTag::Int => Some(4),
            TypeTag::Short => Some(2),
            TypeTag::Byte => Some(1),
            TypeTag::Double => Some(8),
            TypeTag::Float => Some(4),
            TypeTag::Boolean => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::String => "string",
            TypeTag::Symbol => "symbol",
            TypeTag::Long => "long",
            TypeTag::Int => "int",
            TypeTag::Short => "short",
            TypeTag::Byte => "byte",
            TypeTag::Double => "double",
            TypeTag::Float => "float",
            TypeTag::Boolean => "boolean",
            TypeTag::BigInt => "bigint",
            TypeTag::Decimal => "decimal",
            TypeTag::Raw => "raw",
        };
        write!(f, "{name}")
    }
}

/// A decoded column value carrying its wire type.
///
/// `BigInt` and `Decimal` are boxed to keep the enum small.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    String(String),
    Symbol(String),
    Long(i64),
    Int(i32),
    Short(i16),
    Byte(i8),
    Double(f64),
    Float(f32),
    Boolean(bool),
    BigInt(Box<BigInt>),
    Decimal(Box<BigDecimal>),
    Raw(Vec<u8>),
}

impl TypedValue {
    pub fn tag(&self) -> TypeTag {
        match self {
            TypedValue::String(_) => TypeTag::String,
            TypedValue::Symbol(_) => TypeTag::Symbol,
            TypedValue::Long(_) => TypeTag::Long,
            TypedValue::Int(_) => TypeTag::Int,
            TypedValue::Short(_) => TypeTag::Short,
            TypedValue::Byte(_) => TypeTag::Byte,
            TypedValue::Double(_) => TypeTag::Double,
            TypedValue::Float(_) => TypeTag::Float,
            TypedValue::Boolean(_) => TypeTag::Boolean,
            TypedValue::BigInt(_) => TypeTag::BigInt,
            TypedValue::Decimal(_) => TypeTag::Decimal,
            TypedValue::Raw(_) => TypeTag::Raw,
        }
    }

    /// A symbol-like token value, encoded as its name.
    pub fn symbol(name: impl Into<String>) -> Self {
        TypedValue::Symbol(name.into())
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(s) => write!(f, "{s:?}"),
            TypedValue::Symbol(s) => write!(f, ":{s}"),
            TypedValue::Long(v) => write!(f, "{v}"),
            TypedValue::Int(v) => write!(f, "{v}"),
            TypedValue::Short(v) => write!(f, "{v}"),
            TypedValue::Byte(v) => write!(f, "{v}"),
            TypedValue::Double(v) => write!(f, "{v}"),
            TypedValue::Float(v) => write!(f, "{v}"),
            TypedValue::Boolean(v) => write!(f, "{v}"),
            TypedValue::BigInt(v) => write!(f, "{v}"),
            TypedValue::Decimal(v) => write!(f, "{v}"),
            TypedValue::Raw(v) => write!(f, "{} raw bytes", v.len()),
        }
    }
}

impl From<&str> for TypedValue {
    fn from(v: &str) -> Self {
        TypedValue::String(v.to_string())
    }
}

impl From<String> for TypedValue {
    fn from(v: String) -> Self {
        TypedValue::String(v)
    }
}

impl From<i64> for TypedValue {
    fn from(v: i64) -> Self {
        TypedValue::Long(v)
    }
}

impl From<i32> for TypedValue {
    fn from(v: i32) -> Self {
        TypedValue::Int(v)
    }
}

impl From<i16> for TypedValue {
    fn from(v: i16) -> Self {
        TypedValue::Short(v)
    }
}

impl From<i8> for TypedValue {
    fn from(v: i8) -> Self {
        TypedValue::Byte(v)
    }
}

impl From<f64> for TypedValue {
    fn from(v: f64) -> Self {
        TypedValue::Double(v)
    }
}

impl From<f32> for TypedValue {
    fn from(v: f32) -> Self {
        TypedValue::Float(v)
    }
}

impl From<bool> for TypedValue {
    fn from(v: bool) -> Self {
        TypedValue::Boolean(v)
    }
}

impl From<Vec<u8>> for TypedValue {
    fn from(v: Vec<u8>) -> Self {
        TypedValue::Raw(v)
    }
}

impl From<&[u8]> for TypedValue {
    fn from(v: &[u8]) -> Self {
        TypedValue::Raw(v.to_vec())
    }
}

impl From<BigInt> for TypedValue {
    fn from(v: BigInt) -> Self {
        TypedValue::BigInt(Box::new(v))
    }
}

impl From<BigDecimal> for TypedValue {
    fn from(v: BigDecimal) -> Self {
        TypedValue::Decimal(Box::new(v))
    }
}
