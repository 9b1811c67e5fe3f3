
pub mod pretty;

use serde::{Deserialize, Serialize};
use std::{fmt, fs, io, path::Path, path::PathBuf};
use thiserror::Error;

/// Internal identifier of a table, distinct from its display name.
/// Examples:
/// - `let clients = TableId::new("clients");`
/// - `let survey = TableId::new("tbl_2f31c9");`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub String);

impl TableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Positional row of cell values; `None` is a null cell.
/// Examples:
/// - `let row = Row::new(vec![Some("Ann".into()), Some("East".into())]);`
/// - `let row = Row::new(vec![Some("Bo".into()), None]).with_id("r-2");`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Option<String>>,
    #[serde(default)]
    id: Option<String>,
}

impl Row {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells, id: None }
    }

    /// Build a row where every cell is present.
    pub fn from_strs(cells: &[&str]) -> Self {
        Self::new(cells.iter().map(|c| Some((*c).to_string())).collect())
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn cell(&self, ordinal: usize) -> Option<&str> {
        self.cells.get(ordinal).and_then(|c| c.as_deref())
    }
}

/// Ordered rows fetched from a table, with the element keys of the
/// columns they were fetched with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Cell at `(row, ordinal)`. A missing row is an error, a null cell is `Ok(None)`.
    pub fn data(&self, row: usize, ordinal: usize) -> BridgeResult<Option<&str>> {
        let r = self.rows.get(row).ok_or(BridgeError::IndexOutOfRange {
            index: row,
            len: self.rows.len(),
        })?;
        if ordinal >= self.columns.len() {
            return Err(BridgeError::IndexOutOfRange {
                index: ordinal,
                len: self.columns.len(),
            });
        }
        Ok(r.cell(ordinal))
    }
}

/// Canonical error type shared across the bridge crates.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no collection for row {0}")]
    NoSuchGroup(usize),
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("query: {0}")]
    Query(String),
    #[error("catalog: {0}")]
    Catalog(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("script: {0}")]
    Script(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a `BridgeError`.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// How group sizes of an indexed table are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupCountStrategy {
    /// Re-query the same table once per row with `<column>:<value>`.
    #[default]
    PointQueries,
    /// Ask the store for every group's count in a single call.
    Aggregate,
}

/// Runtime configuration for the bridge and its host.
///
/// # Example
/// ```
/// use common::{Config, GroupCountStrategy};
/// use std::path::PathBuf;
///
/// let config = Config::builder()
///     .data_dir(PathBuf::from("./my_tables"))
///     .app_name("survey".to_string())
///     .group_count_strategy(GroupCountStrategy::Aggregate)
///     .build();
/// assert_eq!(config.control_handle, "control");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(default)]
pub struct Config {
    /// Root directory holding per-app folders.
    #[builder(default = PathBuf::from("./tables_data"))]
    pub data_dir: PathBuf,
    /// Application folder under `data_dir`; hosted pages resolve against it.
    #[builder(default = String::from("tables"))]
    pub app_name: String,
    #[builder(default)]
    pub group_count_strategy: GroupCountStrategy,
    /// Global name of the router object inside the script context.
    #[builder(default = String::from("control"))]
    pub control_handle: String,
    /// Global name of the response-queue object inside the script context.
    #[builder(default = String::from("data"))]
    pub data_handle: String,
    /// Global name of the accessor object inside the script context.
    #[builder(default = String::from("tableData"))]
    pub table_data_handle: String,
    /// Script evaluated when a response is queued.
    #[builder(default = String::from("datarsp.responseAvailable();"))]
    pub response_callback: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tables_data"),
            app_name: "tables".into(),
            group_count_strategy: GroupCountStrategy::PointQueries,
            control_handle: "control".into(),
            data_handle: "data".into(),
            table_data_handle: "tableData".into(),
            response_callback: "datarsp.responseAvailable();".into(),
        }
    }
}

impl Config {
    /// Load a JSON config file; missing fields take their defaults.
    pub fn load(path: &Path) -> BridgeResult<Self> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|err| BridgeError::InvalidState(format!("invalid config file: {err}")))
    }

    /// Directory that hosted files of the configured app live in.
    pub fn app_dir(&self) -> PathBuf {
        self.data_dir.join(&self.app_name)
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{BridgeError, BridgeResult, Config, GroupCountStrategy, ResultSet, Row, TableId};
    pub use types::ColumnType;
}
