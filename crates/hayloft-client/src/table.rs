use std::sync::Arc;

use hayloft_codec::{ColumnKey, TypeTag, TypedValue, coerce, encode};
use hayloft_query::{PredicateSpec, ProjectionSpec, RangeSpec};
use hayloft_store::{
    Append, ColumnSelector, Delete, Increment, Put, PutCell, ScanDescriptor, StoreClient,
};

use crate::config::ClientConfig;
use crate::error::Error;
use crate::row::RowResult;
use crate::schema::{ColumnRef, SchemaDef, SchemaRegistry, TableSchema};
use crate::scoped::ScopedQuery;

/// A connected store handle plus the schema registry and client defaults.
pub struct Client<S: StoreClient> {
    store: Arc<S>,
    config: ClientConfig,
    schemas: Arc<SchemaRegistry>,
}

impl<S: StoreClient> Client<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, ClientConfig::default())
    }

    pub fn with_config(store: S, config: ClientConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
            schemas: Arc::new(SchemaRegistry::new()),
        }
    }

    /// Handle sharing an existing registry, used by the pool so every
    /// pooled connection sees the same schemas.
    pub(crate) fn with_registry(
        store: S,
        config: ClientConfig,
        schemas: Arc<SchemaRegistry>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            config,
            schemas,
        }
    }

    /// Assign a table's schema; an empty definition clears it.
    pub fn set_schema(&self, table: &str, def: &SchemaDef) -> Result<(), Error> {
        self.schemas.set(table, def)
    }

    pub fn clear_schema(&self, table: &str) {
        self.schemas.clear(table)
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn create_table(&self, name: &str, families: &[&str]) -> Result<(), Error> {
        self.store.create_table(name, families)?;
        Ok(())
    }

    /// A handle to one table. Cheap; dropping it releases only this
    /// handle's reference to the connection.
    pub fn table(&self, name: impl Into<String>) -> Table<S> {
        Table {
            name: name.into(),
            store: self.store.clone(),
            schemas: self.schemas.clone(),
            config: self.config.clone(),
        }
    }
}

/// Handle to one table of the store.
pub struct Table<S: StoreClient> {
    name: String,
    store: Arc<S>,
    schemas: Arc<SchemaRegistry>,
    pub(crate) config: ClientConfig,
}

impl<S: StoreClient> Clone for Table<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            store: self.store.clone(),
            schemas: self.schemas.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: StoreClient> Table<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub(crate) fn schema(&self) -> Option<Arc<TableSchema>> {
        self.schemas.get(&self.name)
    }

    /// Resolve a surface column reference through the schema. Identifiers
    /// the schema knows resolve to their declared (family, qualifier, type);
    /// anything else parses as `"family:qualifier"` with no declared type.
    pub(crate) fn resolve_ref(&self, reference: &ColumnRef) -> Result<(ColumnKey, Option<TypeTag>), Error> {
        let schema = self.schema();
        let (key, tag) = match reference {
            ColumnRef::Key(key) => {
                let tag = schema
                    .as_deref()
                    .and_then(|s| s.resolve(key.family(), key.qualifier()))
                    .map(|hit| hit.tag);
                (key.clone(), tag)
            }
            ColumnRef::Ident(ident) => match schema.as_deref().and_then(|s| s.resolve_ident(ident)) {
                Some(hit) => (hit.key(), Some(hit.tag)),
                None => (ColumnKey::parse(ident), None),
            },
        };
        if key.family().is_empty() {
            return Err(Error::Validation(format!(
                "column reference {reference:?} has an empty family"
            )));
        }
        Ok((key, tag))
    }

    /// Encode a value for a column, coercing to the declared type when the
    /// schema covers the column.
    pub(crate) fn encode_value(
        &self,
        tag: Option<TypeTag>,
        value: &TypedValue,
    ) -> Result<Vec<u8>, Error> {
        match tag {
            Some(tag) => Ok(encode(&coerce(value.clone(), tag)?)),
            None => Ok(encode(value)),
        }
    }

    // ── Query entry points ──────────────────────────────────────

    pub fn scan(&self) -> ScopedQuery<'_, S> {
        ScopedQuery::new(self)
    }

    pub fn range(&self, range: impl Into<RangeSpec>) -> ScopedQuery<'_, S> {
        self.scan().range(range)
    }

    pub fn filter(
        &self,
        column: impl Into<ColumnRef>,
        spec: impl Into<PredicateSpec>,
    ) -> ScopedQuery<'_, S> {
        self.scan().filter(column, spec)
    }

    pub fn scan_while(
        &self,
        column: impl Into<ColumnRef>,
        spec: impl Into<PredicateSpec>,
    ) -> ScopedQuery<'_, S> {
        self.scan().scan_while(column, spec)
    }

    pub fn project(&self, spec: impl Into<ProjectionSpec>) -> ScopedQuery<'_, S> {
        self.scan().project(spec)
    }

    pub fn limit(&self, rows: usize) -> ScopedQuery<'_, S> {
        self.scan().limit(rows)
    }

    pub fn versions(&self, count: u32) -> ScopedQuery<'_, S> {
        self.scan().versions(count)
    }

    pub fn caching(&self, hint: usize) -> ScopedQuery<'_, S> {
        self.scan().caching(hint)
    }

    pub fn batch(&self, size: usize) -> ScopedQuery<'_, S> {
        self.scan().batch(size)
    }

    // ── Single-row reads ────────────────────────────────────────

    /// Fetch one row. A missing row is `Ok(None)`, not an error.
    pub fn get(&self, row: impl Into<TypedValue>) -> Result<Option<RowResult>, Error> {
        let rowkey = encode(&row.into());
        let mut fetched = self
            .store
            .get(&self.name, &[rowkey], &ScanDescriptor::default())?;
        Ok(fetched
            .pop()
            .flatten()
            .map(|raw| RowResult::new(raw, self.schema())))
    }

    /// Fetch several rows; the result aligns with the input order.
    pub fn get_many<T: Into<TypedValue>>(
        &self,
        rows: impl IntoIterator<Item = T>,
    ) -> Result<Vec<Option<RowResult>>, Error> {
        let keys: Vec<Vec<u8>> = rows
            .into_iter()
            .map(|row| encode(&row.into()))
            .collect();
        let fetched = self.store.get(&self.name, &keys, &ScanDescriptor::default())?;
        Ok(fetched
            .into_iter()
            .map(|raw| raw.map(|r| RowResult::new(r, self.schema())))
            .collect())
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Write cells to a row with a store-assigned timestamp. Values coerce
    /// to the schema's declared types where registered.
    pub fn put(
        &self,
        row: impl Into<TypedValue>,
        cells: &[(&str, TypedValue)],
    ) -> Result<(), Error> {
        self.put_at(row, None, cells)
    }

    /// Write cells at an explicit timestamp.
    pub fn put_at(
        &self,
        row: impl Into<TypedValue>,
        timestamp: Option<i64>,
        cells: &[(&str, TypedValue)],
    ) -> Result<(), Error> {
        let rowkey = encode(&row.into());
        let mut put_cells = Vec::with_capacity(cells.len());
        for (column, value) in cells {
            let (key, tag) = self.resolve_ref(&ColumnRef::from(*column))?;
            let bytes = self.encode_value(tag, value)?;
            put_cells.push(PutCell {
                column: key,
                timestamp,
                value: bytes,
            });
        }
        self.store.put(
            &self.name,
            &[Put {
                row: rowkey,
                cells: put_cells,
            }],
        )?;
        Ok(())
    }

    /// Delete an entire row.
    pub fn delete(&self, row: impl Into<TypedValue>) -> Result<(), Error> {
        self.store.delete(
            &self.name,
            &Delete {
                row: encode(&row.into()),
                columns: Vec::new(),
            },
        )?;
        Ok(())
    }

    /// Delete specific columns (`"family:qualifier"`) or whole families
    /// (`"family"`) within a row.
    pub fn delete_columns(
        &self,
        row: impl Into<TypedValue>,
        columns: &[&str],
    ) -> Result<(), Error> {
        let selectors = columns
            .iter()
            .map(|spec| {
                if spec.contains(':') {
                    ColumnSelector::Column(ColumnKey::parse(spec))
                } else {
                    ColumnSelector::Family(spec.to_string())
                }
            })
            .collect();
        self.store.delete(
            &self.name,
            &Delete {
                row: encode(&row.into()),
                columns: selectors,
            },
        )?;
        Ok(())
    }

    /// Atomically add to a `long` counter column; returns the new value.
    pub fn increment(
        &self,
        row: impl Into<TypedValue>,
        column: impl Into<ColumnRef>,
        amount: i64,
    ) -> Result<i64, Error> {
        let (key, _) = self.resolve_ref(&column.into())?;
        let next = self.store.increment(
            &self.name,
            &Increment {
                row: encode(&row.into()),
                column: key,
                amount,
            },
        )?;
        Ok(next)
    }

    /// Append bytes to a column's current value.
    pub fn append(
        &self,
        row: impl Into<TypedValue>,
        column: impl Into<ColumnRef>,
        value: &[u8],
    ) -> Result<(), Error> {
        let (key, _) = self.resolve_ref(&column.into())?;
        self.store.append(
            &self.name,
            &Append {
                row: encode(&row.into()),
                column: key,
                value: value.to_vec(),
            },
        )?;
        Ok(())
    }
}
