use std::sync::{Arc, Mutex, OnceLock};

use ahash::RandomState;
use catalog::TableMeta;
use common::{BridgeError, BridgeResult, Config, GroupCountStrategy};
use expr::Predicate;
use hashbrown::HashMap;
use storage::DataStore;

use crate::table_data::TableData;

type TableCache = HashMap<String, TableMeta, RandomState>;

/// Opens the host's table view for a table, filtered by a parsed query.
pub trait TableViewLauncher: Send + Sync {
    fn launch_table_view(&self, table: &TableMeta, query: &Predicate, raw_query: &str) -> BridgeResult<()>;
}

/// Query router: table display name + search text → [`TableData`].
///
/// Table metadata is loaded on first use and cached for the lifetime of the
/// router. A page gets a fresh router each time it binds to the store.
pub struct Control {
    store: Arc<dyn DataStore>,
    launcher: Option<Arc<dyn TableViewLauncher>>,
    strategy: GroupCountStrategy,
    tables: OnceLock<TableCache>,
    init_lock: Mutex<()>,
}

impl Control {
    pub fn new(store: Arc<dyn DataStore>, strategy: GroupCountStrategy) -> Self {
        Self {
            store,
            launcher: None,
            strategy,
            tables: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    pub fn from_config(store: Arc<dyn DataStore>, config: &Config) -> Self {
        Self::new(store, config.group_count_strategy)
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn TableViewLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    pub fn strategy(&self) -> GroupCountStrategy {
        self.strategy
    }

    pub(crate) fn store(&self) -> &dyn DataStore {
        self.store.as_ref()
    }

    /// Metadata of every table, keyed by display name. Loads once; a failed
    /// load is not cached so a later call can retry.
    pub fn list_tables(&self) -> BridgeResult<&HashMap<String, TableMeta, RandomState>> {
        if let Some(tables) = self.tables.get() {
            return Ok(tables);
        }
        let _guard = self
            .init_lock
            .lock()
            .map_err(|_| BridgeError::InvalidState("table cache lock poisoned".into()))?;
        if let Some(tables) = self.tables.get() {
            return Ok(tables);
        }

        let loaded: TableCache = self
            .store
            .tables()
            .map_err(backend_error)?
            .into_iter()
            .map(|t| (t.display_name.clone(), t))
            .collect();
        tracing::debug!(tables = loaded.len(), "loaded table metadata");
        Ok(self.tables.get_or_init(|| loaded))
    }

    /// Display names of every table, sorted.
    pub fn table_names(&self) -> BridgeResult<Vec<String>> {
        let mut names: Vec<String> = self.list_tables()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn table(&self, table_name: &str) -> BridgeResult<Option<&TableMeta>> {
        Ok(self.list_tables()?.get(table_name))
    }

    /// Hand the table and parsed query to the table view. `false` when the
    /// table is unknown.
    pub fn open_table(&self, table_name: &str, query: &str) -> BridgeResult<bool> {
        let Some(table) = self.table(table_name)? else {
            return Ok(false);
        };
        let predicate = parser::parse_query(query, table)?;
        match &self.launcher {
            Some(launcher) => launcher.launch_table_view(table, &predicate, query)?,
            None => tracing::warn!(table = table_name, "no table view launcher registered"),
        }
        Ok(true)
    }

    /// Rows of `table_name` matching `query`. `None` when the table is unknown;
    /// a match of zero rows is `Some` with a count of 0.
    pub fn query(&self, table_name: &str, query: &str) -> BridgeResult<Option<TableData>> {
        let Some(table) = self.table(table_name)? else {
            return Ok(None);
        };
        let result = self.fetch(table, query)?;
        TableData::build(table.clone(), result, Some(self)).map(Some)
    }

    /// Number of rows of `table_name` matching `query`, without building a
    /// grouped accessor.
    pub(crate) fn count(&self, table_name: &str, query: &str) -> BridgeResult<Option<usize>> {
        let Some(table) = self.table(table_name)? else {
            return Ok(None);
        };
        Ok(Some(self.fetch(table, query)?.height()))
    }

    fn fetch(&self, table: &TableMeta, query: &str) -> BridgeResult<common::ResultSet> {
        let predicate = parser::parse_query(query, table)?;
        self.store
            .fetch(&table.id, &predicate, &table.column_order())
            .map_err(backend_error)
    }
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("strategy", &self.strategy)
            .field("loaded", &self.tables.get().map(|t| t.len()))
            .finish()
    }
}

/// Store failures reach script callers as a single "backend unavailable"
/// condition, distinct from unknown tables and empty results.
pub(crate) fn backend_error(err: BridgeError) -> BridgeError {
    match err {
        BridgeError::Storage(msg) => {
            tracing::warn!(error = %msg, "store request failed");
            BridgeError::BackendUnavailable(msg)
        }
        BridgeError::Io(io) => {
            tracing::warn!(error = %io, "store request failed");
            BridgeError::BackendUnavailable(io.to_string())
        }
        other => other,
    }
}
