mod error;
mod filter;
mod mutation;
mod row;
mod scan;
mod store;

pub use error::StoreError;
pub use filter::{CompareOp, ScanFilter};
pub use mutation::{Append, Delete, Increment, Put, PutCell};
pub use row::{RawRow, VersionedCells};
pub use scan::{AggregateOp, ColumnSelector, QualifierRange, QualifierWindow, ScanDescriptor};
pub use store::{RowScanner, StoreClient};

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "memory")]
pub use memory::{MemoryScanner, MemoryStore};
