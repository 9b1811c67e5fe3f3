//! Store provider seam and a reference in-memory implementation.
//!
//! The bridge never touches rows directly; it asks a `DataStore` for table
//! metadata and for rows matching a predicate. `MemoryStore` keeps rows in
//! memory and can snapshot them to a directory (`catalog.json` plus one
//! bincode `<table id>.rows` file per table).

#[cfg(test)]
mod tests;

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use ahash::RandomState;
use bincode::config::{self, Config};
use bincode::serde::{decode_from_slice, encode_to_vec};
use catalog::{Catalog, Column, TableMeta};
use common::{BridgeError, BridgeResult, ResultSet, Row, TableId};
use expr::{EvalContext, Predicate};
use hashbrown::HashMap;
use uuid::Uuid;

pub type Map<K, V> = HashMap<K, V, RandomState>;

const CATALOG_FILE: &str = "catalog.json";

fn bincode_config() -> impl Config {
    config::legacy()
}

/// Data access the bridge needs from the active workspace.
pub trait DataStore: Send + Sync {
    /// Metadata for every table in the workspace.
    fn tables(&self) -> BridgeResult<Vec<TableMeta>>;

    fn column_by_display_name(&self, table: &TableId, name: &str) -> BridgeResult<Option<Column>> {
        Ok(self
            .table(table)?
            .and_then(|t| t.column_by_display_name(name).cloned()))
    }

    fn column_by_element_key(&self, table: &TableId, key: &str) -> BridgeResult<Option<Column>> {
        Ok(self
            .table(table)?
            .and_then(|t| t.column_by_element_key(key).cloned()))
    }

    fn table(&self, id: &TableId) -> BridgeResult<Option<TableMeta>> {
        Ok(self.tables()?.into_iter().find(|t| &t.id == id))
    }

    /// Rows matching `predicate`, projected onto `column_order` (element keys).
    fn fetch(
        &self,
        table: &TableId,
        predicate: &Predicate,
        column_order: &[String],
    ) -> BridgeResult<ResultSet>;

    /// Number of rows per distinct value of `column` (element key); null
    /// cells are counted under `None`.
    fn group_counts(&self, table: &TableId, column: &str) -> BridgeResult<Map<Option<String>, usize>>;
}

#[derive(Debug, Default)]
struct Inner {
    catalog: Catalog,
    rows: Map<TableId, Vec<Row>>,
}

/// In-memory `DataStore` with directory snapshots.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Load a snapshot written by [`MemoryStore::save`]. A missing directory
    /// yields an empty store.
    pub fn load(dir: &Path) -> BridgeResult<Self> {
        let catalog = Catalog::load(&dir.join(CATALOG_FILE))?;
        let mut rows = Map::default();
        for table in catalog.tables() {
            let path = dir.join(format!("{}.rows", table.id));
            let table_rows: Vec<Row> = if path.exists() {
                let bytes = fs::read(&path)?;
                let (decoded, _) = decode_from_slice(&bytes, bincode_config()).map_err(|e| {
                    BridgeError::Storage(format!("read rows of '{}' failed: {e}", table.id))
                })?;
                decoded
            } else {
                Vec::new()
            };
            rows.insert(table.id.clone(), table_rows);
        }
        tracing::debug!(dir = %dir.display(), tables = catalog.len(), "loaded store snapshot");
        Ok(Self {
            inner: RwLock::new(Inner { catalog, rows }),
            available: AtomicBool::new(true),
        })
    }

    /// Write the catalog and every table's rows under `dir`.
    pub fn save(&self, dir: &Path) -> BridgeResult<()> {
        fs::create_dir_all(dir)?;
        let inner = self.read()?;
        inner.catalog.save(&dir.join(CATALOG_FILE))?;
        for table in inner.catalog.tables() {
            let rows = inner.rows.get(&table.id).map(Vec::as_slice).unwrap_or(&[]);
            let bytes = encode_to_vec(rows, bincode_config()).map_err(|e| {
                BridgeError::Storage(format!("write rows of '{}' failed: {e}", table.id))
            })?;
            fs::write(dir.join(format!("{}.rows", table.id)), bytes)?;
        }
        tracing::debug!(dir = %dir.display(), "saved store snapshot");
        Ok(())
    }

    /// Register a table; `id` defaults to a generated identifier.
    pub fn create_table(
        &self,
        id: Option<TableId>,
        display_name: &str,
        columns: Vec<Column>,
        prime_columns: Vec<String>,
    ) -> BridgeResult<TableId> {
        let mut inner = self.write()?;
        let id = match id {
            Some(id) => inner
                .catalog
                .create_table_with_id(id, display_name, columns, prime_columns)?,
            None => inner
                .catalog
                .create_table(display_name, columns, prime_columns)?,
        };
        inner.rows.insert(id.clone(), Vec::new());
        Ok(id)
    }

    pub fn drop_table(&self, display_name: &str) -> BridgeResult<()> {
        let mut inner = self.write()?;
        let removed = inner.catalog.drop_table(display_name)?;
        inner.rows.remove(&removed.id);
        Ok(())
    }

    /// Append a row in declared column order, returning its generated row id.
    pub fn insert_row(&self, table: &TableId, cells: Vec<Option<String>>) -> BridgeResult<String> {
        let mut inner = self.write()?;
        let width = inner
            .catalog
            .table_by_id(table)
            .ok_or_else(|| BridgeError::Storage(format!("unknown table id '{table}'")))?
            .columns()
            .len();
        if cells.len() != width {
            return Err(BridgeError::Storage(format!(
                "row has {} cells but '{table}' has {width} columns",
                cells.len()
            )));
        }
        let row_id = Uuid::new_v4().to_string();
        inner
            .rows
            .entry(table.clone())
            .or_default()
            .push(Row::new(cells).with_id(row_id.clone()));
        Ok(row_id)
    }

    /// Simulate the backend going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> BridgeResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(BridgeError::BackendUnavailable("store is closed".into()))
        }
    }

    fn read(&self) -> BridgeResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| BridgeError::Storage("store lock poisoned".into()))
    }

    fn write(&self) -> BridgeResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| BridgeError::Storage("store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore for MemoryStore {
    fn tables(&self) -> BridgeResult<Vec<TableMeta>> {
        self.check_available()?;
        Ok(self.read()?.catalog.tables().cloned().collect())
    }

    fn table(&self, id: &TableId) -> BridgeResult<Option<TableMeta>> {
        self.check_available()?;
        Ok(self.read()?.catalog.table_by_id(id).cloned())
    }

    fn fetch(
        &self,
        table: &TableId,
        predicate: &Predicate,
        column_order: &[String],
    ) -> BridgeResult<ResultSet> {
        self.check_available()?;
        let inner = self.read()?;
        let meta = inner
            .catalog
            .table_by_id(table)
            .ok_or_else(|| BridgeError::Storage(format!("unknown table id '{table}'")))?;
        let schema = meta.column_order();
        let projection = column_order
            .iter()
            .map(|key| {
                meta.schema.ordinal_by_element_key(key).ok_or_else(|| {
                    BridgeError::Storage(format!("unknown column '{key}' on '{table}'"))
                })
            })
            .collect::<BridgeResult<Vec<_>>>()?;

        let ctx = EvalContext { schema: &schema };
        let mut rows = Vec::new();
        for row in inner.rows.get(table).map(Vec::as_slice).unwrap_or(&[]) {
            if !ctx.eval(predicate, row)? {
                continue;
            }
            let cells = projection
                .iter()
                .map(|&i| row.cells.get(i).cloned().flatten())
                .collect();
            let mut projected = Row::new(cells);
            if let Some(id) = row.id() {
                projected = projected.with_id(id);
            }
            rows.push(projected);
        }
        tracing::trace!(table = %table, matched = rows.len(), "fetched rows");
        Ok(ResultSet::new(column_order.to_vec(), rows))
    }

    fn group_counts(&self, table: &TableId, column: &str) -> BridgeResult<Map<Option<String>, usize>> {
        self.check_available()?;
        let inner = self.read()?;
        let ordinal = inner
            .catalog
            .table_by_id(table)
            .and_then(|meta| meta.schema.ordinal_by_element_key(column))
            .ok_or_else(|| BridgeError::Storage(format!("unknown column '{column}' on '{table}'")))?;
        let mut counts = Map::default();
        for row in inner.rows.get(table).map(Vec::as_slice).unwrap_or(&[]) {
            let key = row.cells.get(ordinal).cloned().flatten();
            *counts.entry(key).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
