use std::cmp::Ordering;

use hayloft_codec::{ColumnKey, TypeTag, TypedValue, decode};

use crate::error::Error;

/// One (row, family, qualifier, timestamp) → value data point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: Vec<u8>,
    pub column: ColumnKey,
    pub timestamp: i64,
    pub value: Vec<u8>,
}

impl Cell {
    pub fn decode_as(&self, tag: TypeTag) -> Result<TypedValue, Error> {
        Ok(decode(tag, &self.value)?)
    }
}

/// Store-native order: row, then family, then qualifier ascending, then
/// timestamp descending, so the latest version comes first.
impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.column.cmp(&other.column))
            .then_with(|| other.timestamp.cmp(&self.timestamp))
            .then_with(|| self.value.cmp(&other.value))
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: &[u8], column: &str, timestamp: i64) -> Cell {
        Cell {
            row: row.to_vec(),
            column: ColumnKey::parse(column),
            timestamp,
            value: Vec::new(),
        }
    }

    #[test]
    fn orders_row_family_qualifier_then_newest_first() {
        let mut cells = vec![
            cell(b"r1", "cf:a", 5),
            cell(b"r1", "cf:a", 9),
            cell(b"r1", "cf:b", 1),
            cell(b"r0", "zz:z", 1),
        ];
        cells.sort();
        assert_eq!(cells[0].row, b"r0".to_vec());
        assert_eq!(cells[1].timestamp, 9);
        assert_eq!(cells[2].timestamp, 5);
        assert_eq!(cells[3].column, ColumnKey::parse("cf:b"));
    }
}
