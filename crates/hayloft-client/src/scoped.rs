//! The chainable, immutable query object.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use hayloft_codec::{ColumnKey, TypeTag, TypedValue};
use hayloft_query::{
    FilterError, PredicateSpec, ProjectionSpec, RangeSpec, build_filter, combine_filters,
    compile_projection,
};
use hayloft_store::{AggregateOp, RowScanner, ScanDescriptor, StoreClient};

use crate::error::Error;
use crate::row::RowResult;
use crate::schema::{ColumnRef, TableSchema};
use crate::table::Table;

/// Immutable scan description for one table.
///
/// Every mutator clones the query and replaces one field, so instances can
/// be shared, stored and extended from any thread; chaining never mutates
/// the original. Compilation to a [`ScanDescriptor`] happens lazily, once
/// per terminal operation.
pub struct ScopedQuery<'t, S: StoreClient> {
    table: &'t Table<S>,
    state: QueryState,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct QueryState {
    range: Option<RangeSpec>,
    filters: Vec<(ColumnRef, PredicateSpec)>,
    while_filters: Vec<(ColumnRef, PredicateSpec)>,
    projections: Vec<ProjectionSpec>,
    max_versions: Option<u32>,
    caching: Option<usize>,
    batch: Option<usize>,
    row_limit: Option<usize>,
}

impl<'t, S: StoreClient> Clone for ScopedQuery<'t, S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            state: self.state.clone(),
        }
    }
}

impl<'t, S: StoreClient> PartialEq for ScopedQuery<'t, S> {
    fn eq(&self, other: &Self) -> bool {
        self.table.name() == other.table.name() && self.state == other.state
    }
}

impl<'t, S: StoreClient> fmt::Debug for ScopedQuery<'t, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedQuery")
            .field("table", &self.table.name())
            .field("state", &self.state)
            .finish()
    }
}

impl<'t, S: StoreClient> ScopedQuery<'t, S> {
    pub(crate) fn new(table: &'t Table<S>) -> Self {
        Self {
            table,
            state: QueryState::default(),
        }
    }

    fn with(&self, build: impl FnOnce(&mut QueryState)) -> Self {
        let mut state = self.state.clone();
        build(&mut state);
        Self {
            table: self.table,
            state,
        }
    }

    /// Restrict the rowkey window. Replaces any earlier range.
    pub fn range(&self, range: impl Into<RangeSpec>) -> Self {
        let range = range.into();
        self.with(|state| state.range = Some(range))
    }

    /// Add a per-column predicate; predicates on different columns AND
    /// together.
    pub fn filter(
        &self,
        column: impl Into<ColumnRef>,
        spec: impl Into<PredicateSpec>,
    ) -> Self {
        let entry = (column.into(), spec.into());
        self.with(|state| state.filters.push(entry))
    }

    /// Like [`filter`](Self::filter), but the scan stops entirely at the
    /// first row that fails the predicate instead of skipping it.
    pub fn scan_while(
        &self,
        column: impl Into<ColumnRef>,
        spec: impl Into<PredicateSpec>,
    ) -> Self {
        let entry = (column.into(), spec.into());
        self.with(|state| state.while_filters.push(entry))
    }

    /// Add a projection entry: a column, a family, a qualifier byte-range
    /// or an offset/limit window.
    pub fn project(&self, spec: impl Into<ProjectionSpec>) -> Self {
        let spec = spec.into();
        self.with(|state| state.projections.push(spec))
    }

    /// Cap total rows returned. Fails at compile time with `NotSupported`
    /// when the store cannot honor it.
    pub fn limit(&self, rows: usize) -> Self {
        self.with(|state| state.row_limit = Some(rows))
    }

    /// Per-column version cap; unset returns every stored version.
    pub fn versions(&self, count: u32) -> Self {
        self.with(|state| state.max_versions = Some(count))
    }

    /// Scanner caching hint; affects throughput only.
    pub fn caching(&self, hint: usize) -> Self {
        self.with(|state| state.caching = Some(hint))
    }

    /// Per-response cell batch hint; affects throughput only.
    pub fn batch(&self, size: usize) -> Self {
        self.with(|state| state.batch = Some(size))
    }

    /// A fresh query for the same table with all state reset.
    pub fn unscope(&self) -> Self {
        Self::new(self.table)
    }

    // ── Compilation ─────────────────────────────────────────────

    fn compile(&self) -> Result<ScanDescriptor, Error> {
        let mut descriptor = ScanDescriptor::default();

        if let Some(range) = &self.state.range {
            range.apply(&mut descriptor)?;
        }

        let filters = self.compile_filters(&self.state.filters)?;
        let while_filters = self.compile_filters(&self.state.while_filters)?;
        descriptor.filter = combine_filters(filters, while_filters);

        compile_projection(&self.state.projections, &mut descriptor)?;

        if let Some(cap) = self.state.max_versions {
            if cap == 0 {
                return Err(Error::Validation(
                    "versions requires a positive count".to_string(),
                ));
            }
            descriptor.max_versions = Some(cap);
        }

        descriptor.caching = self.state.caching.or(self.table.config.caching);
        descriptor.batch = self.state.batch.or(self.table.config.batch);

        if let Some(limit) = self.state.row_limit {
            if !self.table.store().supports_row_limit() {
                return Err(Error::NotSupported(
                    "row limit is not supported by this store".to_string(),
                ));
            }
            descriptor.row_limit = Some(limit);
        }

        debug!(table = self.table.name(), "compiled scan descriptor");
        Ok(descriptor)
    }

    fn compile_filters(
        &self,
        entries: &[(ColumnRef, PredicateSpec)],
    ) -> Result<Vec<hayloft_store::ScanFilter>, Error> {
        let mut compiled = Vec::with_capacity(entries.len());
        for (reference, spec) in entries {
            let (key, tag) = self.table.resolve_ref(reference)?;
            let table = self.table;
            let encode = |value: &TypedValue| {
                table
                    .encode_value(tag, value)
                    .map_err(|e| FilterError(format!("column {key}: {e}")))
            };
            compiled.push(build_filter(&key, spec, &encode)?);
        }
        Ok(compiled)
    }

    // ── Terminal operations ─────────────────────────────────────

    /// Execute the scan and stream decoded rows lazily. Each call compiles
    /// and scans afresh; dropping the stream, finished or not, releases
    /// the scanner.
    pub fn rows(&self) -> Result<RowStream<'t, S>, Error> {
        let descriptor = self.compile()?;
        let scanner = self.table.store().scan(self.table.name(), &descriptor)?;
        Ok(RowStream {
            scanner,
            schema: self.table.schema(),
        })
    }

    /// First matching row, if any.
    pub fn first(&self) -> Result<Option<RowResult>, Error> {
        self.rows()?.next().transpose()
    }

    /// Count matching rows with a minimal scan (values stripped, one cell
    /// per row) that never materializes row data.
    pub fn count(&self) -> Result<u64, Error> {
        let mut descriptor = self.compile()?;
        descriptor.key_only = true;
        descriptor.first_cell_only = true;
        let mut scanner = self.table.store().scan(self.table.name(), &descriptor)?;
        let mut total = 0;
        while scanner.next_row()?.is_some() {
            total += 1;
        }
        Ok(total)
    }

    /// Server-side aggregation over the current projection, filter and
    /// range. The single projected column's schema type picks the value
    /// interpretation; unregistered columns read as `long`.
    pub fn aggregate(&self, op: AggregateOp) -> Result<TypedValue, Error> {
        let column = self.single_projected_column(op)?;
        let tag = column
            .as_ref()
            .and_then(|key| {
                self.table
                    .schema()
                    .and_then(|schema| schema.resolve(key.family(), key.qualifier()))
            })
            .map(|hit| hit.tag)
            .unwrap_or(TypeTag::Long);
        self.run_aggregate(op, tag)
    }

    /// Aggregation with an explicit value interpretation.
    pub fn aggregate_as(&self, op: AggregateOp, tag: TypeTag) -> Result<TypedValue, Error> {
        self.single_projected_column(op)?;
        self.run_aggregate(op, tag)
    }

    fn run_aggregate(&self, op: AggregateOp, tag: TypeTag) -> Result<TypedValue, Error> {
        let descriptor = self.compile()?;
        let value = self
            .table
            .store()
            .aggregate(self.table.name(), op, tag, &descriptor)?;
        Ok(value)
    }

    /// `row_count` takes no projected column; every other operation takes
    /// exactly one.
    fn single_projected_column(&self, op: AggregateOp) -> Result<Option<ColumnKey>, Error> {
        if matches!(op, AggregateOp::RowCount) {
            if self.state.projections.is_empty() {
                return Ok(None);
            }
            return Err(Error::Validation(
                "row_count aggregation takes no projected column".to_string(),
            ));
        }
        match self.state.projections.as_slice() {
            [ProjectionSpec::Column(key)] => Ok(Some(key.clone())),
            other => Err(Error::Validation(format!(
                "aggregation requires exactly one projected column, got {} projection entries",
                other.len()
            ))),
        }
    }
}

/// Lazy, forward-only stream of decoded rows.
///
/// Dropping the stream releases the underlying scanner, on normal
/// completion and on early exit alike.
pub struct RowStream<'t, S: StoreClient + 't> {
    scanner: S::Scanner<'t>,
    schema: Option<Arc<TableSchema>>,
}

impl<'t, S: StoreClient> Iterator for RowStream<'t, S> {
    type Item = Result<RowResult, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.scanner.next_row() {
            Err(e) => Some(Err(e.into())),
            Ok(Some(raw)) => Some(Ok(RowResult::new(raw, self.schema.clone()))),
            Ok(None) => None,
        }
    }
}
