use std::collections::BTreeMap;

/// Multi-version cells for one column: timestamp → value bytes.
///
/// `BTreeMap` keeps timestamps ascending; callers read newest-first with
/// `iter().next_back()` / `.rev()`.
pub type VersionedCells = BTreeMap<i64, Vec<u8>>;

/// One row as returned by the store: rowkey bytes plus the raw
/// multi-version cell map, `family -> qualifier -> timestamp -> bytes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub key: Vec<u8>,
    pub families: BTreeMap<String, BTreeMap<Vec<u8>, VersionedCells>>,
}

impl RawRow {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            families: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, family: &str, qualifier: &[u8], timestamp: i64, value: Vec<u8>) {
        self.families
            .entry(family.to_string())
            .or_default()
            .entry(qualifier.to_vec())
            .or_default()
            .insert(timestamp, value);
    }

    /// Latest version of a column's value.
    pub fn latest(&self, family: &str, qualifier: &[u8]) -> Option<&[u8]> {
        self.versions(family, qualifier)?
            .iter()
            .next_back()
            .map(|(_, v)| v.as_slice())
    }

    pub fn versions(&self, family: &str, qualifier: &[u8]) -> Option<&VersionedCells> {
        self.families.get(family)?.get(qualifier)
    }

    pub fn is_empty(&self) -> bool {
        self.families.values().all(|quals| quals.is_empty())
    }

    pub fn cell_count(&self) -> usize {
        self.families
            .values()
            .flat_map(|quals| quals.values())
            .map(|versions| versions.len())
            .sum()
    }
}
