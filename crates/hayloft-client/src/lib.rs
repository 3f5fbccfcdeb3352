mod cell;
mod config;
mod error;
mod pool;
mod row;
mod schema;
mod scoped;
mod table;

pub use cell::Cell;
pub use config::ClientConfig;
pub use error::Error;
pub use pool::{ClientPool, PooledClient};
pub use row::RowResult;
pub use schema::{ColumnRef, ResolvedColumn, SchemaDef, SchemaRegistry, TableSchema};
pub use scoped::{RowStream, ScopedQuery};
pub use table::{Client, Table};

pub use hayloft_codec::{ColumnKey, TypeTag, TypedValue};
pub use hayloft_query::{PredicateSpec, ProjectionSpec, RangeSpec, predicate};
pub use hayloft_store::AggregateOp;
