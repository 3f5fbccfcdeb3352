use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a (family, qualifier) pair.
///
/// Orders by family, then by qualifier bytes under unsigned lexicographic
/// comparison, the store's native column order. The qualifier may be
/// empty (the "no qualifier" column); an empty family is never valid and
/// is rejected by the layers that build keys from user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    family: String,
    qualifier: Vec<u8>,
}

impl ColumnKey {
    pub fn new(family: impl Into<String>, qualifier: impl Into<Vec<u8>>) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
        }
    }

    /// Parse a `"family:qualifier"` spec. Without a colon the whole spec
    /// is the family and the qualifier is empty.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((family, qualifier)) => Self::new(family, qualifier.as_bytes()),
            None => Self::new(spec, Vec::new()),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn qualifier(&self) -> &[u8] {
        &self.qualifier
    }

    /// The qualifier's string form, when it is valid UTF-8.
    pub fn qualifier_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.qualifier).ok()
    }
}

impl Ord for ColumnKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.family
            .cmp(&other.family)
            .then_with(|| self.qualifier.cmp(&other.qualifier))
    }
}

impl PartialOrd for ColumnKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.family,
            String::from_utf8_lossy(&self.qualifier)
        )
    }
}

impl From<&str> for ColumnKey {
    fn from(spec: &str) -> Self {
        ColumnKey::parse(spec)
    }
}

impl From<&String> for ColumnKey {
    fn from(spec: &String) -> Self {
        ColumnKey::parse(spec)
    }
}

impl<F: Into<String>, Q: Into<Vec<u8>>> From<(F, Q)> for ColumnKey {
    fn from((family, qualifier): (F, Q)) -> Self {
        ColumnKey::new(family, qualifier)
    }
}
