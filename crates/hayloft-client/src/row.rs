//! Decoded view over one returned row.

use std::collections::BTreeMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use hayloft_codec::{ColumnKey, TypeTag, TypedValue, decode};
use hayloft_store::RawRow;

use crate::cell::Cell;
use crate::error::Error;
use crate::schema::{ColumnRef, TableSchema};

/// Read-only view over one store-returned row, decoding lazily through the
/// owning table's schema.
pub struct RowResult {
    raw: RawRow,
    schema: Option<Arc<TableSchema>>,
}

/// Defines the singular (latest value) and plural (all versions, newest
/// first) accessor pair for one wire type.
macro_rules! typed_accessor {
    ($single:ident, $multi:ident, $tag:expr, $ty:ty, $extract:expr) => {
        pub fn $single(&self, column: impl Into<ColumnRef>) -> Result<Option<$ty>, Error> {
            let key = self.locate(&column.into())?;
            match self.decode_latest(&key, $tag)? {
                Some(value) => Ok(Some($extract(value))),
                None => Ok(None),
            }
        }

        pub fn $multi(&self, column: impl Into<ColumnRef>) -> Result<Vec<(i64, $ty)>, Error> {
            let key = self.locate(&column.into())?;
            Ok(self
                .decode_versions(&key, $tag)?
                .into_iter()
                .map(|(ts, value)| (ts, $extract(value)))
                .collect())
        }
    };
}

impl RowResult {
    pub(crate) fn new(raw: RawRow, schema: Option<Arc<TableSchema>>) -> Self {
        Self { raw, schema }
    }

    pub fn rowkey(&self) -> &[u8] {
        &self.raw.key
    }

    pub fn rowkey_as(&self, tag: TypeTag) -> Result<TypedValue, Error> {
        Ok(decode(tag, &self.raw.key)?)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.raw.cell_count()
    }

    pub fn raw_row(&self) -> &RawRow {
        &self.raw
    }

    /// Resolve a surface reference to a concrete column. Bare identifiers
    /// need a schema entry; `"family:qualifier"` and key forms work as-is.
    fn locate(&self, reference: &ColumnRef) -> Result<ColumnKey, Error> {
        match reference {
            ColumnRef::Key(key) => Ok(key.clone()),
            ColumnRef::Ident(ident) => {
                if let Some(schema) = self.schema.as_deref() {
                    if let Some(hit) = schema.resolve_ident(ident) {
                        return Ok(hit.key());
                    }
                }
                if ident.contains(':') {
                    Ok(ColumnKey::parse(ident))
                } else {
                    Err(Error::Validation(format!(
                        "column {ident:?} is not registered in the table schema; \
                         use the \"family:qualifier\" form"
                    )))
                }
            }
        }
    }

    fn decode_latest(
        &self,
        key: &ColumnKey,
        tag: TypeTag,
    ) -> Result<Option<TypedValue>, Error> {
        match self.raw.latest(key.family(), key.qualifier()) {
            None => Ok(None),
            Some(bytes) => Ok(Some(decode(tag, bytes)?)),
        }
    }

    fn decode_versions(
        &self,
        key: &ColumnKey,
        tag: TypeTag,
    ) -> Result<Vec<(i64, TypedValue)>, Error> {
        let Some(versions) = self.raw.versions(key.family(), key.qualifier()) else {
            return Ok(Vec::new());
        };
        versions
            .iter()
            .rev()
            .map(|(ts, bytes)| Ok((*ts, decode(tag, bytes)?)))
            .collect()
    }

    /// Latest value decoded through the schema; raw bytes for columns no
    /// schema entry covers.
    pub fn get(&self, column: impl Into<ColumnRef>) -> Result<Option<TypedValue>, Error> {
        let key = self.locate(&column.into())?;
        let tag = self
            .schema
            .as_deref()
            .and_then(|schema| schema.resolve(key.family(), key.qualifier()))
            .map(|hit| hit.tag)
            .unwrap_or(TypeTag::Raw);
        self.decode_latest(&key, tag)
    }

    /// All versions of a column, newest first, decoded through the schema.
    pub fn get_versions(
        &self,
        column: impl Into<ColumnRef>,
    ) -> Result<Vec<(i64, TypedValue)>, Error> {
        let key = self.locate(&column.into())?;
        let tag = self
            .schema
            .as_deref()
            .and_then(|schema| schema.resolve(key.family(), key.qualifier()))
            .map(|hit| hit.tag)
            .unwrap_or(TypeTag::Raw);
        self.decode_versions(&key, tag)
    }

    typed_accessor!(string, strings, TypeTag::String, String, |v| match v {
        TypedValue::String(s) => s,
        _ => unreachable!(),
    });
    typed_accessor!(symbol, symbols, TypeTag::Symbol, String, |v| match v {
        TypedValue::Symbol(s) => s,
        _ => unreachable!(),
    });
    typed_accessor!(long, longs, TypeTag::Long, i64, |v| match v {
        TypedValue::Long(x) => x,
        _ => unreachable!(),
    });
    typed_accessor!(int, ints, TypeTag::Int, i32, |v| match v {
        TypedValue::Int(x) => x,
        _ => unreachable!(),
    });
    typed_accessor!(short, shorts, TypeTag::Short, i16, |v| match v {
        TypedValue::Short(x) => x,
        _ => unreachable!(),
    });
    typed_accessor!(byte, bytes, TypeTag::Byte, i8, |v| match v {
        TypedValue::Byte(x) => x,
        _ => unreachable!(),
    });
    typed_accessor!(double, doubles, TypeTag::Double, f64, |v| match v {
        TypedValue::Double(x) => x,
        _ => unreachable!(),
    });
    typed_accessor!(float, floats, TypeTag::Float, f32, |v| match v {
        TypedValue::Float(x) => x,
        _ => unreachable!(),
    });
    typed_accessor!(boolean, booleans, TypeTag::Boolean, bool, |v| match v {
        TypedValue::Boolean(x) => x,
        _ => unreachable!(),
    });
    typed_accessor!(bigint, bigints, TypeTag::BigInt, BigInt, |v| match v {
        TypedValue::BigInt(x) => *x,
        _ => unreachable!(),
    });
    typed_accessor!(decimal, decimals, TypeTag::Decimal, BigDecimal, |v| match v {
        TypedValue::Decimal(x) => *x,
        _ => unreachable!(),
    });
    typed_accessor!(raw, raws, TypeTag::Raw, Vec<u8>, |v| match v {
        TypedValue::Raw(x) => x,
        _ => unreachable!(),
    });

    /// Latest value of every column, decoded through the row's schema.
    pub fn to_map(&self) -> Result<BTreeMap<ColumnKey, TypedValue>, Error> {
        self.to_map_with(self.schema.as_deref())
    }

    /// Like [`to_map`](Self::to_map) with an explicit schema override.
    pub fn to_map_with(
        &self,
        schema: Option<&TableSchema>,
    ) -> Result<BTreeMap<ColumnKey, TypedValue>, Error> {
        let mut out = BTreeMap::new();
        for (family, quals) in &self.raw.families {
            for (qualifier, versions) in quals {
                let Some((_, bytes)) = versions.iter().next_back() else {
                    continue;
                };
                let key = ColumnKey::new(family.clone(), qualifier.clone());
                let tag = schema
                    .and_then(|s| s.resolve(family, qualifier))
                    .map(|hit| hit.tag)
                    .unwrap_or(TypeTag::Raw);
                out.insert(key, decode(tag, bytes)?);
            }
        }
        Ok(out)
    }

    /// Every column's versions, newest first, decoded through the schema.
    pub fn to_versioned_map(
        &self,
    ) -> Result<BTreeMap<ColumnKey, Vec<(i64, TypedValue)>>, Error> {
        self.to_versioned_map_with(self.schema.as_deref())
    }

    pub fn to_versioned_map_with(
        &self,
        schema: Option<&TableSchema>,
    ) -> Result<BTreeMap<ColumnKey, Vec<(i64, TypedValue)>>, Error> {
        let mut out = BTreeMap::new();
        for (family, quals) in &self.raw.families {
            for (qualifier, versions) in quals {
                let key = ColumnKey::new(family.clone(), qualifier.clone());
                let tag = schema
                    .and_then(|s| s.resolve(family, qualifier))
                    .map(|hit| hit.tag)
                    .unwrap_or(TypeTag::Raw);
                let decoded = versions
                    .iter()
                    .rev()
                    .map(|(ts, bytes)| Ok((*ts, decode(tag, bytes)?)))
                    .collect::<Result<Vec<_>, Error>>()?;
                out.insert(key, decoded);
            }
        }
        Ok(out)
    }

    /// All cells in store-native order: (family, qualifier) ascending,
    /// then timestamp descending.
    pub fn cells(&self) -> Vec<Cell> {
        let mut out = Vec::with_capacity(self.raw.cell_count());
        for (family, quals) in &self.raw.families {
            for (qualifier, versions) in quals {
                for (ts, value) in versions.iter().rev() {
                    out.push(Cell {
                        row: self.raw.key.clone(),
                        column: ColumnKey::new(family.clone(), qualifier.clone()),
                        timestamp: *ts,
                        value: value.clone(),
                    });
                }
            }
        }
        out
    }
}
