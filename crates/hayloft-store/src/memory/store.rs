use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use arc_swap::ArcSwap;
use imbl::OrdMap;

use hayloft_codec::{TypeTag, TypedValue};

use crate::error::StoreError;
use crate::mutation::{Append, Delete, Increment, Put};
use crate::row::{RawRow, VersionedCells};
use crate::scan::{AggregateOp, ColumnSelector, ScanDescriptor};
use crate::store::{RowScanner, StoreClient};

use super::aggregate::run_aggregate;
use super::scan::{project, run_scan};

/// A row's cells, `family -> qualifier -> timestamp -> bytes`: the same
/// shape [`RawRow`] exposes.
pub(crate) type RowData = BTreeMap<String, BTreeMap<Vec<u8>, VersionedCells>>;

/// One table's rows, keyed by rowkey. Cheap to snapshot thanks to imbl
/// structural sharing.
pub(crate) type TableData = OrdMap<Vec<u8>, RowData>;

#[derive(Clone)]
struct TableEntry {
    families: Arc<Vec<String>>,
    data: Arc<ArcSwap<TableData>>,
}

/// In-memory store backend.
///
/// Reads snapshot a table atomically via `ArcSwap::load`; the write path
/// is serialized on a single lock and swaps a rebuilt map in, so readers
/// see either the old or the new table state, never a partial one.
pub struct MemoryStore {
    tables: RwLock<HashMap<String, TableEntry>>,
    write_lock: Mutex<()>,
    clock: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
            clock: AtomicI64::new(1),
        }
    }

    fn entry(&self, table: &str) -> Result<TableEntry, StoreError> {
        let tables = self.tables.read().unwrap();
        tables
            .get(table)
            .cloned()
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    fn next_timestamp(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    fn check_family(entry: &TableEntry, family: &str) -> Result<(), StoreError> {
        if entry.families.iter().any(|f| f == family) {
            Ok(())
        } else {
            Err(StoreError::Storage(format!(
                "unknown column family: {family}"
            )))
        }
    }

    /// Run a closure over a mutable copy of the table's data, then swap
    /// the result in. Writers serialize on `write_lock`.
    fn mutate<T>(
        &self,
        table: &str,
        f: impl FnOnce(&TableEntry, &mut TableData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().unwrap();
        let entry = self.entry(table)?;
        let mut data = (**entry.data.load()).clone();
        let out = f(&entry, &mut data)?;
        entry.data.store(Arc::new(data));
        Ok(out)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreClient for MemoryStore {
    type Scanner<'a> = MemoryScanner;

    fn create_table(&self, table: &str, families: &[&str]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().unwrap();
        tables.entry(table.to_string()).or_insert_with(|| TableEntry {
            families: Arc::new(families.iter().map(|f| f.to_string()).collect()),
            data: Arc::new(ArcSwap::new(Arc::new(OrdMap::new()))),
        });
        Ok(())
    }

    fn scan<'a>(
        &'a self,
        table: &str,
        descriptor: &ScanDescriptor,
    ) -> Result<Self::Scanner<'a>, StoreError> {
        let entry = self.entry(table)?;
        let data = entry.data.load_full();
        Ok(MemoryScanner {
            rows: run_scan(&data, descriptor).into_iter(),
        })
    }

    fn get(
        &self,
        table: &str,
        rows: &[Vec<u8>],
        descriptor: &ScanDescriptor,
    ) -> Result<Vec<Option<RawRow>>, StoreError> {
        let entry = self.entry(table)?;
        let data = entry.data.load_full();
        Ok(rows
            .iter()
            .map(|key| {
                data.get(key).and_then(|row_data| {
                    let raw = RawRow {
                        key: key.clone(),
                        families: row_data.clone(),
                    };
                    let projected = project(raw, descriptor);
                    if projected.is_empty() {
                        None
                    } else {
                        Some(projected)
                    }
                })
            })
            .collect())
    }

    fn put(&self, table: &str, puts: &[Put]) -> Result<(), StoreError> {
        let default_ts = self.next_timestamp();
        self.mutate(table, |entry, data| {
            for put in puts {
                let mut row = data.get(&put.row).cloned().unwrap_or_default();
                for cell in &put.cells {
                    Self::check_family(entry, cell.column.family())?;
                    row.entry(cell.column.family().to_string())
                        .or_default()
                        .entry(cell.column.qualifier().to_vec())
                        .or_default()
                        .insert(cell.timestamp.unwrap_or(default_ts), cell.value.clone());
                }
                data.insert(put.row.clone(), row);
            }
            Ok(())
        })
    }

    fn delete(&self, table: &str, delete: &Delete) -> Result<(), StoreError> {
        self.mutate(table, |_entry, data| {
            if delete.columns.is_empty() {
                data.remove(&delete.row);
                return Ok(());
            }
            let Some(mut row) = data.get(&delete.row).cloned() else {
                return Ok(());
            };
            for selector in &delete.columns {
                match selector {
                    ColumnSelector::Family(family) => {
                        row.remove(family);
                    }
                    ColumnSelector::Column(key) => {
                        if let Some(quals) = row.get_mut(key.family()) {
                            quals.remove(key.qualifier());
                        }
                    }
                }
            }
            row.retain(|_, quals| !quals.is_empty());
            if row.is_empty() {
                data.remove(&delete.row);
            } else {
                data.insert(delete.row.clone(), row);
            }
            Ok(())
        })
    }

    fn increment(&self, table: &str, increment: &Increment) -> Result<i64, StoreError> {
        let ts = self.next_timestamp();
        self.mutate(table, |entry, data| {
            Self::check_family(entry, increment.column.family())?;
            let mut row = data.get(&increment.row).cloned().unwrap_or_default();
            let versions = row
                .entry(increment.column.family().to_string())
                .or_default()
                .entry(increment.column.qualifier().to_vec())
                .or_default();
            let current = match versions.iter().next_back() {
                None => 0,
                Some((_, bytes)) => match <[u8; 8]>::try_from(bytes.as_slice()) {
                    Ok(wide) => i64::from_be_bytes(wide),
                    Err(_) => {
                        return Err(StoreError::Storage(format!(
                            "column {} is not an 8-byte counter",
                            increment.column
                        )));
                    }
                },
            };
            let next = current.wrapping_add(increment.amount);
            versions.insert(ts, next.to_be_bytes().to_vec());
            data.insert(increment.row.clone(), row);
            Ok(next)
        })
    }

    fn append(&self, table: &str, append: &Append) -> Result<(), StoreError> {
        let ts = self.next_timestamp();
        self.mutate(table, |entry, data| {
            Self::check_family(entry, append.column.family())?;
            let mut row = data.get(&append.row).cloned().unwrap_or_default();
            let versions = row
                .entry(append.column.family().to_string())
                .or_default()
                .entry(append.column.qualifier().to_vec())
                .or_default();
            let mut value = versions
                .iter()
                .next_back()
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            value.extend_from_slice(&append.value);
            versions.insert(ts, value);
            data.insert(append.row.clone(), row);
            Ok(())
        })
    }

    fn aggregate(
        &self,
        table: &str,
        op: AggregateOp,
        interpreter: TypeTag,
        descriptor: &ScanDescriptor,
    ) -> Result<TypedValue, StoreError> {
        let entry = self.entry(table)?;
        let data = entry.data.load_full();
        let rows = run_scan(&data, descriptor);
        let column = descriptor.columns.iter().find_map(|sel| match sel {
            ColumnSelector::Column(key) => Some(key.clone()),
            ColumnSelector::Family(_) => None,
        });
        run_aggregate(&rows, op, interpreter, column.as_ref())
    }
}

pub struct MemoryScanner {
    rows: std::vec::IntoIter<RawRow>,
}

impl RowScanner for MemoryScanner {
    fn next_row(&mut self) -> Result<Option<RawRow>, StoreError> {
        Ok(self.rows.next())
    }
}

#[cfg(test)]
mod tests {
    use hayloft_codec::ColumnKey;

    use super::*;
    use crate::mutation::PutCell;

    fn put_one(store: &MemoryStore, row: &[u8], column: &str, value: &[u8]) {
        store
            .put(
                "t",
                &[Put {
                    row: row.to_vec(),
                    cells: vec![PutCell {
                        column: ColumnKey::parse(column),
                        timestamp: None,
                        value: value.to_vec(),
                    }],
                }],
            )
            .unwrap();
    }

    fn setup() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_table("t", &["cf"]).unwrap();
        store
    }

    #[test]
    fn put_then_get_roundtrip() {
        let store = setup();
        put_one(&store, b"r1", "cf:name", b"alice");
        let rows = store
            .get("t", &[b"r1".to_vec()], &ScanDescriptor::default())
            .unwrap();
        let row = rows[0].as_ref().expect("row should exist");
        assert_eq!(row.latest("cf", b"name"), Some(b"alice".as_slice()));
    }

    #[test]
    fn get_missing_row_is_none() {
        let store = setup();
        let rows = store
            .get("t", &[b"nope".to_vec()], &ScanDescriptor::default())
            .unwrap();
        assert!(rows[0].is_none());
    }

    #[test]
    fn unknown_table_errors() {
        let store = MemoryStore::new();
        let err = store.scan("missing", &ScanDescriptor::default()).err();
        assert!(matches!(err, Some(StoreError::TableNotFound(_))));
    }

    #[test]
    fn unknown_family_rejected_on_put() {
        let store = setup();
        let result = store.put(
            "t",
            &[Put {
                row: b"r".to_vec(),
                cells: vec![PutCell {
                    column: ColumnKey::parse("bogus:q"),
                    timestamp: None,
                    value: b"x".to_vec(),
                }],
            }],
        );
        assert!(result.is_err());
    }

    #[test]
    fn successive_puts_create_versions() {
        let store = setup();
        put_one(&store, b"r1", "cf:v", b"one");
        put_one(&store, b"r1", "cf:v", b"two");
        let rows = store
            .get("t", &[b"r1".to_vec()], &ScanDescriptor::default())
            .unwrap();
        let row = rows[0].as_ref().unwrap();
        assert_eq!(row.versions("cf", b"v").unwrap().len(), 2);
        assert_eq!(row.latest("cf", b"v"), Some(b"two".as_slice()));
    }

    #[test]
    fn delete_column_and_row() {
        let store = setup();
        put_one(&store, b"r1", "cf:a", b"1");
        put_one(&store, b"r1", "cf:b", b"2");
        store
            .delete(
                "t",
                &Delete {
                    row: b"r1".to_vec(),
                    columns: vec![ColumnSelector::Column(ColumnKey::parse("cf:a"))],
                },
            )
            .unwrap();
        let rows = store
            .get("t", &[b"r1".to_vec()], &ScanDescriptor::default())
            .unwrap();
        let row = rows[0].as_ref().unwrap();
        assert!(row.latest("cf", b"a").is_none());
        assert!(row.latest("cf", b"b").is_some());

        store
            .delete(
                "t",
                &Delete {
                    row: b"r1".to_vec(),
                    columns: vec![],
                },
            )
            .unwrap();
        let rows = store
            .get("t", &[b"r1".to_vec()], &ScanDescriptor::default())
            .unwrap();
        assert!(rows[0].is_none());
    }

    #[test]
    fn increment_starts_from_zero_and_accumulates() {
        let store = setup();
        let col = ColumnKey::parse("cf:hits");
        let inc = |amount| Increment {
            row: b"r1".to_vec(),
            column: col.clone(),
            amount,
        };
        assert_eq!(store.increment("t", &inc(5)).unwrap(), 5);
        assert_eq!(store.increment("t", &inc(-2)).unwrap(), 3);
    }

    #[test]
    fn append_concatenates_latest() {
        let store = setup();
        let app = |value: &[u8]| Append {
            row: b"r1".to_vec(),
            column: ColumnKey::parse("cf:log"),
            value: value.to_vec(),
        };
        store.append("t", &app(b"ab")).unwrap();
        store.append("t", &app(b"cd")).unwrap();
        let rows = store
            .get("t", &[b"r1".to_vec()], &ScanDescriptor::default())
            .unwrap();
        assert_eq!(
            rows[0].as_ref().unwrap().latest("cf", b"log"),
            Some(b"abcd".as_slice())
        );
    }
}
