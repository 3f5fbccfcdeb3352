use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    TableNotFound(String),
    /// Operation the store (or its driver version) cannot perform.
    Unsupported(String),
    Storage(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::TableNotFound(name) => write!(f, "table not found: {name}"),
            StoreError::Unsupported(msg) => write!(f, "unsupported by this store: {msg}"),
            StoreError::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
