//! Per-table column schemas.
//!
//! A schema maps column identifiers (exact names or regex patterns) to a
//! (family, qualifier, type) triple, so reads decode and writes encode
//! without per-call type annotations. Schemas are immutable once built:
//! assignment validates the declaration, builds both lookup indices in one
//! pass and swaps the whole table entry in atomically.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use regex::Regex;
use tracing::debug;

use hayloft_codec::{ColumnKey, TypeTag};

use crate::error::Error;

/// A column reference as accepted at the query surface: either a concrete
/// (family, qualifier) key or an identifier string resolved through the
/// table's schema first.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRef {
    Ident(String),
    Key(ColumnKey),
}

impl From<&str> for ColumnRef {
    fn from(ident: &str) -> Self {
        ColumnRef::Ident(ident.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(ident: String) -> Self {
        ColumnRef::Ident(ident)
    }
}

impl From<ColumnKey> for ColumnRef {
    fn from(key: ColumnKey) -> Self {
        ColumnRef::Key(key)
    }
}

impl<F: Into<String>, Q: Into<Vec<u8>>> From<(F, Q)> for ColumnRef {
    fn from(pair: (F, Q)) -> Self {
        ColumnRef::Key(ColumnKey::from(pair))
    }
}

/// Declarative schema for one table.
#[derive(Debug, Clone, Default)]
pub struct SchemaDef {
    entries: Vec<SchemaEntry>,
}

#[derive(Debug, Clone)]
struct SchemaEntry {
    family: String,
    matcher: MatcherDef,
    tag: TypeTag,
}

#[derive(Debug, Clone)]
enum MatcherDef {
    Exact(String),
    Pattern(String),
}

impl SchemaDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact column entry; accepts `"family:qualifier"` and pair forms.
    pub fn column(mut self, column: impl Into<ColumnKey>, tag: TypeTag) -> Self {
        let key = column.into();
        self.entries.push(SchemaEntry {
            family: key.family().to_string(),
            matcher: MatcherDef::Exact(String::from_utf8_lossy(key.qualifier()).into_owned()),
            tag,
        });
        self
    }

    /// Pattern entry: qualifiers in `family` whose string form matches
    /// `pattern`.
    pub fn pattern(
        mut self,
        family: impl Into<String>,
        pattern: impl Into<String>,
        tag: TypeTag,
    ) -> Self {
        self.entries.push(SchemaEntry {
            family: family.into(),
            matcher: MatcherDef::Pattern(pattern.into()),
            tag,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A column resolved through a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub family: String,
    pub qualifier: Vec<u8>,
    pub tag: TypeTag,
}

impl ResolvedColumn {
    pub fn key(&self) -> ColumnKey {
        ColumnKey::new(self.family.clone(), self.qualifier.clone())
    }
}

/// Immutable, lookup-optimized schema for one table: an exact-match index
/// and an ordered pattern list, both built at assignment time.
#[derive(Debug)]
pub struct TableSchema {
    /// `"family:qualifier"` → entry.
    by_full: HashMap<String, ResolvedColumn>,
    /// Bare qualifier → entry; first registered wins when families collide.
    by_qualifier: HashMap<String, ResolvedColumn>,
    /// Registration order; first match wins.
    patterns: Vec<PatternEntry>,
}

#[derive(Debug)]
struct PatternEntry {
    family: String,
    regex: Regex,
    tag: TypeTag,
}

impl TableSchema {
    fn build(def: &SchemaDef) -> Result<Self, Error> {
        let mut by_full = HashMap::new();
        let mut by_qualifier = HashMap::new();
        let mut patterns = Vec::new();

        for entry in &def.entries {
            if entry.family.is_empty() {
                return Err(Error::Validation(
                    "schema entry has an empty family name".to_string(),
                ));
            }
            match &entry.matcher {
                MatcherDef::Exact(qualifier) => {
                    let full = format!("{}:{}", entry.family, qualifier);
                    let resolved = ResolvedColumn {
                        family: entry.family.clone(),
                        qualifier: qualifier.clone().into_bytes(),
                        tag: entry.tag,
                    };
                    if by_full.insert(full.clone(), resolved.clone()).is_some() {
                        return Err(Error::Validation(format!(
                            "duplicate schema entry for column {full}"
                        )));
                    }
                    by_qualifier.entry(qualifier.clone()).or_insert(resolved);
                }
                MatcherDef::Pattern(pattern) => {
                    let regex = Regex::new(pattern).map_err(|e| {
                        Error::Validation(format!(
                            "invalid schema pattern {pattern:?} for family {}: {e}",
                            entry.family
                        ))
                    })?;
                    patterns.push(PatternEntry {
                        family: entry.family.clone(),
                        regex,
                        tag: entry.tag,
                    });
                }
            }
        }

        Ok(Self {
            by_full,
            by_qualifier,
            patterns,
        })
    }

    /// Resolve a concrete (family, qualifier). Exact entries win over
    /// patterns; patterns try in registration order and the probed
    /// qualifier substitutes into the result.
    pub fn resolve(&self, family: &str, qualifier: &[u8]) -> Option<ResolvedColumn> {
        let text = std::str::from_utf8(qualifier).ok()?;
        let full = format!("{family}:{text}");
        if let Some(hit) = self.by_full.get(&full) {
            return Some(hit.clone());
        }
        self.patterns
            .iter()
            .find(|entry| entry.family == family && entry.regex.is_match(text))
            .map(|entry| ResolvedColumn {
                family: entry.family.clone(),
                qualifier: qualifier.to_vec(),
                tag: entry.tag,
            })
    }

    /// Resolve a surface identifier: `"family:qualifier"` resolves within
    /// the family; a bare name tries the qualifier index, then patterns
    /// across families in registration order.
    pub fn resolve_ident(&self, ident: &str) -> Option<ResolvedColumn> {
        if let Some((family, qualifier)) = ident.split_once(':') {
            return self.resolve(family, qualifier.as_bytes());
        }
        if let Some(hit) = self.by_qualifier.get(ident) {
            return Some(hit.clone());
        }
        self.patterns
            .iter()
            .find(|entry| entry.regex.is_match(ident))
            .map(|entry| ResolvedColumn {
                family: entry.family.clone(),
                qualifier: ident.as_bytes().to_vec(),
                tag: entry.tag,
            })
    }
}

/// Per-table schema map.
///
/// Readers load the whole map atomically and never see a partial update;
/// assignments serialize on a lock, rebuild the map copy-on-write and swap
/// it in wholesale.
pub struct SchemaRegistry {
    tables: ArcSwap<HashMap<String, Arc<TableSchema>>>,
    write: Mutex<()>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            tables: ArcSwap::new(Arc::new(HashMap::new())),
            write: Mutex::new(()),
        }
    }

    /// Assign a table's schema. An empty definition clears the entry, a
    /// valid no-op delete. Validation happens before anything is replaced.
    pub fn set(&self, table: &str, def: &SchemaDef) -> Result<(), Error> {
        if def.is_empty() {
            self.clear(table);
            return Ok(());
        }
        let schema = Arc::new(TableSchema::build(def)?);
        let _guard = self.write.lock().unwrap();
        let mut next = (**self.tables.load()).clone();
        next.insert(table.to_string(), schema);
        self.tables.store(Arc::new(next));
        debug!(table, "schema assigned");
        Ok(())
    }

    pub fn clear(&self, table: &str) {
        let _guard = self.write.lock().unwrap();
        let mut next = (**self.tables.load()).clone();
        next.remove(table);
        self.tables.store(Arc::new(next));
        debug!(table, "schema cleared");
    }

    /// Unknown tables yield `None`; raw-byte access stays available.
    pub fn get(&self, table: &str) -> Option<Arc<TableSchema>> {
        self.tables.load().get(table).cloned()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
