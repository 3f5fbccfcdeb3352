use hayloft_codec::{TypeTag, TypedValue};

use crate::error::StoreError;
use crate::mutation::{Append, Delete, Increment, Put};
use crate::row::RawRow;
use crate::scan::{AggregateOp, ScanDescriptor};

/// Streaming handle over one scan's results.
///
/// Dropping a scanner, after full consumption or mid-stream, releases
/// whatever server-side resources it holds.
pub trait RowScanner {
    fn next_row(&mut self) -> Result<Option<RawRow>, StoreError>;
}

/// The opaque store driver boundary.
///
/// Everything above this trait is data shaping and query composition;
/// everything below it (transport, sessions, retries) belongs to the
/// driver. Failures pass through unmodified.
pub trait StoreClient: Send + Sync {
    type Scanner<'a>: RowScanner
    where
        Self: 'a;

    /// Create a table with the given column families. Idempotent.
    fn create_table(&self, table: &str, families: &[&str]) -> Result<(), StoreError>;

    fn scan<'a>(
        &'a self,
        table: &str,
        descriptor: &ScanDescriptor,
    ) -> Result<Self::Scanner<'a>, StoreError>;

    /// Fetch whole rows by key, shaped by the descriptor's projection and
    /// version settings. A missing row yields `None`, not an error.
    fn get(
        &self,
        table: &str,
        rows: &[Vec<u8>],
        descriptor: &ScanDescriptor,
    ) -> Result<Vec<Option<RawRow>>, StoreError>;

    fn put(&self, table: &str, puts: &[Put]) -> Result<(), StoreError>;

    fn delete(&self, table: &str, delete: &Delete) -> Result<(), StoreError>;

    /// Returns the counter's new value.
    fn increment(&self, table: &str, increment: &Increment) -> Result<i64, StoreError>;

    fn append(&self, table: &str, append: &Append) -> Result<(), StoreError>;

    /// Server-side aggregation over the rows the descriptor selects,
    /// reading each row's single selected column through `interpreter`.
    fn aggregate(
        &self,
        table: &str,
        op: AggregateOp,
        interpreter: TypeTag,
        descriptor: &ScanDescriptor,
    ) -> Result<TypedValue, StoreError>;

    /// Whether scans honor [`ScanDescriptor::row_limit`].
    fn supports_row_limit(&self) -> bool {
        true
    }
}
