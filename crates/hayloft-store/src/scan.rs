use hayloft_codec::ColumnKey;
use serde::{Deserialize, Serialize};

use crate::filter::ScanFilter;

/// One column-selection entry on a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSelector {
    /// Every qualifier in the family.
    Family(String),
    /// One exact column.
    Column(ColumnKey),
}

impl ColumnSelector {
    pub fn selects(&self, family: &str, qualifier: &[u8]) -> bool {
        match self {
            ColumnSelector::Family(name) => name == family,
            ColumnSelector::Column(key) => {
                key.family() == family && key.qualifier() == qualifier
            }
        }
    }
}

/// Byte-range of qualifiers within one family. Start is inclusive; the
/// stop bound is exclusive unless flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifierRange {
    pub family: String,
    pub start: Option<Vec<u8>>,
    pub stop: Option<Vec<u8>>,
    pub stop_inclusive: bool,
}

impl QualifierRange {
    pub fn contains(&self, family: &str, qualifier: &[u8]) -> bool {
        if family != self.family {
            return false;
        }
        if let Some(start) = &self.start {
            if qualifier < start.as_slice() {
                return false;
            }
        }
        match &self.stop {
            Some(stop) if self.stop_inclusive => qualifier <= stop.as_slice(),
            Some(stop) => qualifier < stop.as_slice(),
            None => true,
        }
    }
}

/// Offset/limit window over the qualifiers of each row, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifierWindow {
    pub offset: usize,
    pub limit: usize,
}

/// Server-side aggregation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOp {
    Sum,
    Min,
    Max,
    Avg,
    /// Population standard deviation.
    StdDev,
    RowCount,
}

/// The compiled, store-native scan configuration: range, filter chain,
/// column selection, versioning and tuning in one unit.
#[derive(Debug, Clone, Default)]
pub struct ScanDescriptor {
    /// Inclusive start rowkey.
    pub start_row: Option<Vec<u8>>,
    /// Exclusive stop rowkey.
    pub stop_row: Option<Vec<u8>>,
    /// Union of rowkey prefixes; when non-empty, takes precedence over
    /// `start_row`/`stop_row`. Result is de-duplicated, in row order.
    pub prefixes: Vec<Vec<u8>>,
    pub filter: Option<ScanFilter>,
    pub columns: Vec<ColumnSelector>,
    pub qualifier_range: Option<QualifierRange>,
    pub window: Option<QualifierWindow>,
    /// Per-column version cap; `None` returns every stored version.
    pub max_versions: Option<u32>,
    /// Scanner caching hint; affects throughput only.
    pub caching: Option<usize>,
    /// Per-response cell batch hint; affects throughput only.
    pub batch: Option<usize>,
    /// Cap on total rows returned.
    pub row_limit: Option<usize>,
    /// Strip values, keep coordinates (used by counting scans).
    pub key_only: bool,
    /// Keep only each row's first cell (used by counting scans).
    pub first_cell_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_family_covers_all_qualifiers() {
        let sel = ColumnSelector::Family("cf".into());
        assert!(sel.selects("cf", b"anything"));
        assert!(!sel.selects("other", b"anything"));
    }

    #[test]
    fn qualifier_range_bounds() {
        let range = QualifierRange {
            family: "cf".into(),
            start: Some(b"b".to_vec()),
            stop: Some(b"d".to_vec()),
            stop_inclusive: false,
        };
        assert!(!range.contains("cf", b"a"));
        assert!(range.contains("cf", b"b"));
        assert!(range.contains("cf", b"c"));
        assert!(!range.contains("cf", b"d"));
        assert!(!range.contains("other", b"c"));
    }
}
