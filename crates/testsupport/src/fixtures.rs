//! Common test fixtures.
//!
//! Seeded reference stores and helpers for building tables row by row.

use std::sync::Arc;

use catalog::Column;
use common::{Config, TableId};
use storage::MemoryStore;
use tempfile::TempDir;
use types::ColumnType;

/// `Clients(Name[alias nm], Region)` with rows Ann/East, Bo/West, Cy/East.
/// Not indexed.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
/// use storage::DataStore;
///
/// let store = clients_store();
/// assert_eq!(store.tables().unwrap()[0].display_name, "Clients");
/// ```
pub fn clients_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    add_clients(&store);
    Arc::new(store)
}

/// `Orders(Item, Region)` grouped by `Region`, with rows pen/East,
/// ink/West, pad/East.
pub fn orders_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    add_orders(&store);
    Arc::new(store)
}

/// Both demo tables in one store.
pub fn demo_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    add_clients(&store);
    add_orders(&store);
    Arc::new(store)
}

pub fn add_clients(store: &MemoryStore) -> TableId {
    let id = store
        .create_table(
            Some(TableId::new("clients")),
            "Clients",
            vec![
                Column::new("name", "Name", ColumnType::Text).with_alias("nm"),
                Column::new("region", "Region", ColumnType::Text),
            ],
            vec![],
        )
        .expect("create Clients");
    insert_rows(store, &id, &[&["Ann", "East"], &["Bo", "West"], &["Cy", "East"]]);
    id
}

pub fn add_orders(store: &MemoryStore) -> TableId {
    let id = store
        .create_table(
            Some(TableId::new("orders")),
            "Orders",
            vec![
                Column::new("item", "Item", ColumnType::Text),
                Column::new("region", "Region", ColumnType::Text),
            ],
            vec!["_region".into()],
        )
        .expect("create Orders");
    insert_rows(store, &id, &[&["pen", "East"], &["ink", "West"], &["pad", "East"]]);
    id
}

/// A `Groups(Key, Label)` table grouped by `Key`; `None` keys are stored as
/// missing cells.
pub fn grouped_store(keys: &[Option<String>]) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    let id = store
        .create_table(
            Some(TableId::new("groups")),
            "Groups",
            vec![
                Column::new("key", "Key", ColumnType::Text),
                Column::new("label", "Label", ColumnType::Text),
            ],
            vec!["key".into()],
        )
        .expect("create Groups");
    for (i, key) in keys.iter().enumerate() {
        store
            .insert_row(&id, vec![key.clone(), Some(format!("row{i}"))])
            .expect("insert group row");
    }
    Arc::new(store)
}

/// Insert text rows; every cell is present.
pub fn insert_rows(store: &MemoryStore, table: &TableId, rows: &[&[&str]]) {
    for row in rows {
        store
            .insert_row(table, row.iter().map(|cell| Some(cell.to_string())).collect())
            .expect("insert row");
    }
}

/// A config rooted in a fresh temporary directory, removed on drop.
pub struct TempConfig {
    _dir: TempDir,
    pub config: Config,
}

impl TempConfig {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = Config::builder().data_dir(dir.path().to_path_buf()).build();
        Self { _dir: dir, config }
    }
}

impl Default for TempConfig {
    fn default() -> Self {
        Self::new()
    }
}
