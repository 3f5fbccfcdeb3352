use hayloft_codec::ColumnKey;

use crate::scan::ColumnSelector;

/// One cell write within a [`Put`].
#[derive(Debug, Clone)]
pub struct PutCell {
    pub column: ColumnKey,
    /// `None` lets the store assign its own timestamp.
    pub timestamp: Option<i64>,
    pub value: Vec<u8>,
}

/// Write one or more cells to a row.
#[derive(Debug, Clone)]
pub struct Put {
    pub row: Vec<u8>,
    pub cells: Vec<PutCell>,
}

/// Delete a row, or specific families/columns within it.
#[derive(Debug, Clone)]
pub struct Delete {
    pub row: Vec<u8>,
    /// Empty deletes the entire row.
    pub columns: Vec<ColumnSelector>,
}

/// Atomically add to a column holding a `long` counter.
#[derive(Debug, Clone)]
pub struct Increment {
    pub row: Vec<u8>,
    pub column: ColumnKey,
    pub amount: i64,
}

/// Append bytes to a column's current value.
#[derive(Debug, Clone)]
pub struct Append {
    pub row: Vec<u8>,
    pub column: ColumnKey,
    pub value: Vec<u8>,
}
