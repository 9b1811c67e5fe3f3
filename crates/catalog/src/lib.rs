use std::{fs, path::Path};

use ahash::RandomState;
use common::{BridgeError, BridgeResult, TableId};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use types::ColumnType;
use uuid::Uuid;

type Map<K, V> = HashMap<K, V, RandomState>;

/// Persistent catalog holding the table metadata of one workspace.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    tables: Vec<TableMeta>,
    #[serde(skip)]
    #[serde(default)]
    table_name_index: Map<String, usize>,
    #[serde(skip)]
    #[serde(default)]
    table_id_index: Map<TableId, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        let mut catalog = Self {
            tables: Vec::new(),
            table_name_index: Map::default(),
            table_id_index: Map::default(),
        };
        catalog.rebuild_indexes();
        catalog
    }

    /// Load a catalog from disk, returning an empty catalog if the file does not exist.
    pub fn load(path: &Path) -> BridgeResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = fs::read_to_string(path)?;
        let mut catalog: Catalog = serde_json::from_str(&data)
            .map_err(|err| BridgeError::Catalog(format!("invalid catalog file: {err}")))?;
        for table in &mut catalog.tables {
            table.schema.rebuild_lookups()?;
        }
        catalog.rebuild_indexes();
        Ok(catalog)
    }

    /// Persist the catalog contents as pretty JSON.
    pub fn save(&self, path: &Path) -> BridgeResult<()> {
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| BridgeError::Catalog(format!("serialize failed: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Returns a table by display name.
    pub fn table(&self, display_name: &str) -> Option<&TableMeta> {
        self.table_name_index
            .get(display_name)
            .and_then(|idx| self.tables.get(*idx))
    }

    /// Returns a table by internal identifier.
    pub fn table_by_id(&self, id: &TableId) -> Option<&TableMeta> {
        self.table_id_index
            .get(id)
            .and_then(|idx| self.tables.get(*idx))
    }

    /// Register a table under a freshly generated identifier.
    pub fn create_table(
        &mut self,
        display_name: &str,
        columns: Vec<Column>,
        prime_columns: Vec<String>,
    ) -> BridgeResult<TableId> {
        let id = TableId(format!("tbl_{}", Uuid::new_v4().simple()));
        self.create_table_with_id(id, display_name, columns, prime_columns)
    }

    /// Register a table under a caller-chosen identifier.
    pub fn create_table_with_id(
        &mut self,
        id: TableId,
        display_name: &str,
        columns: Vec<Column>,
        prime_columns: Vec<String>,
    ) -> BridgeResult<TableId> {
        if self.table_name_index.contains_key(display_name) {
            return Err(BridgeError::Catalog(format!(
                "table '{display_name}' already exists"
            )));
        }
        if self.table_id_index.contains_key(&id) {
            return Err(BridgeError::Catalog(format!("table id '{id}' already exists")));
        }
        let schema = TableSchema::try_new(columns)?;
        let table = TableMeta::new(id.clone(), display_name.to_string(), schema, prime_columns)?;
        self.tables.push(table);
        self.rebuild_indexes();
        Ok(id)
    }

    /// Remove a table by display name.
    pub fn drop_table(&mut self, display_name: &str) -> BridgeResult<TableMeta> {
        let idx = self
            .table_name_index
            .get(display_name)
            .copied()
            .ok_or_else(|| BridgeError::Catalog(format!("unknown table '{display_name}'")))?;
        let removed = self.tables.remove(idx);
        self.rebuild_indexes();
        Ok(removed)
    }

    /// Immutable iterator over all tables, in registration order.
    pub fn tables(&self) -> impl Iterator<Item = &TableMeta> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn rebuild_indexes(&mut self) {
        self.table_name_index.clear();
        self.table_id_index.clear();
        for (idx, table) in self.tables.iter().enumerate() {
            self.table_name_index.insert(table.display_name.clone(), idx);
            self.table_id_index.insert(table.id.clone(), idx);
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata describing a registered table.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableMeta {
    pub id: TableId,
    pub display_name: String,
    pub schema: TableSchema,
    /// Element keys of the grouping columns; the first one is the collection key.
    pub prime_columns: Vec<String>,
}

impl TableMeta {
    fn new(
        id: TableId,
        display_name: String,
        schema: TableSchema,
        prime_columns: Vec<String>,
    ) -> BridgeResult<Self> {
        for prime in &prime_columns {
            if schema.resolve_prime(prime).is_none() {
                return Err(BridgeError::Catalog(format!(
                    "prime column '{prime}' is not a column of '{display_name}'"
                )));
            }
        }
        Ok(Self {
            id,
            display_name,
            schema,
            prime_columns,
        })
    }

    /// Column definitions in declared order.
    pub fn columns(&self) -> &[Column] {
        &self.schema.columns
    }

    /// Element keys in declared order; rows are fetched in this order.
    pub fn column_order(&self) -> Vec<String> {
        self.schema
            .columns
            .iter()
            .map(|c| c.element_key.clone())
            .collect()
    }

    pub fn column_by_display_name(&self, name: &str) -> Option<&Column> {
        self.schema
            .ordinal_by_display_name(name)
            .map(|idx| &self.schema.columns[idx])
    }

    pub fn column_by_element_key(&self, key: &str) -> Option<&Column> {
        self.schema
            .ordinal_by_element_key(key)
            .map(|idx| &self.schema.columns[idx])
    }

    /// Resolve a label the way users type it: display name first, then alias.
    pub fn column_by_user_label(&self, label: &str) -> Option<&Column> {
        self.schema
            .ordinal_by_user_label(label)
            .map(|idx| &self.schema.columns[idx])
    }

    pub fn is_indexed(&self) -> bool {
        !self.prime_columns.is_empty()
    }

    /// The column rows are grouped by: the first prime column.
    pub fn group_column(&self) -> Option<&Column> {
        let prime = self.prime_columns.first()?;
        self.schema
            .resolve_prime(prime)
            .map(|idx| &self.schema.columns[idx])
    }
}

/// Column layout for a table, along with lookup structures.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: Vec<Column>,
    #[serde(skip)]
    #[serde(default)]
    by_display_name: Map<String, usize>,
    #[serde(skip)]
    #[serde(default)]
    by_alias: Map<String, usize>,
    #[serde(skip)]
    #[serde(default)]
    by_element_key: Map<String, usize>,
}

impl TableSchema {
    pub fn try_new(columns: Vec<Column>) -> BridgeResult<Self> {
        if columns.is_empty() {
            return Err(BridgeError::Catalog(
                "table must contain at least one column".into(),
            ));
        }
        let mut schema = Self {
            columns,
            by_display_name: Map::default(),
            by_alias: Map::default(),
            by_element_key: Map::default(),
        };
        schema.rebuild_lookups()?;
        Ok(schema)
    }

    fn rebuild_lookups(&mut self) -> BridgeResult<()> {
        self.by_display_name.clear();
        self.by_alias.clear();
        self.by_element_key.clear();
        for (idx, column) in self.columns.iter().enumerate() {
            if self
                .by_element_key
                .insert(column.element_key.clone(), idx)
                .is_some()
            {
                return Err(BridgeError::Catalog(format!(
                    "duplicate element key '{}'",
                    column.element_key
                )));
            }
            if self
                .by_display_name
                .insert(column.display_name.clone(), idx)
                .is_some()
            {
                return Err(BridgeError::Catalog(format!(
                    "duplicate column '{}'",
                    column.display_name
                )));
            }
        }
        for (idx, column) in self.columns.iter().enumerate() {
            let Some(alias) = &column.alias else {
                continue;
            };
            let clashes = self
                .by_display_name
                .get(alias)
                .is_some_and(|other| *other != idx);
            if clashes || self.by_alias.insert(alias.clone(), idx).is_some() {
                return Err(BridgeError::Catalog(format!(
                    "alias '{alias}' is not unique"
                )));
            }
        }
        Ok(())
    }

    pub fn ordinal_by_display_name(&self, name: &str) -> Option<usize> {
        self.by_display_name.get(name).copied()
    }

    pub fn ordinal_by_element_key(&self, key: &str) -> Option<usize> {
        self.by_element_key.get(key).copied()
    }

    pub fn ordinal_by_user_label(&self, label: &str) -> Option<usize> {
        self.ordinal_by_display_name(label)
            .or_else(|| self.by_alias.get(label).copied())
    }

    /// Prime columns are stored either as a plain element key or with a
    /// leading `_` marker.
    fn resolve_prime(&self, prime: &str) -> Option<usize> {
        self.ordinal_by_element_key(prime).or_else(|| {
            let stripped = prime.strip_prefix('_')?;
            self.ordinal_by_element_key(stripped).or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.display_name.eq_ignore_ascii_case(stripped))
            })
        })
    }
}

/// Describes a logical column within a table schema.
///
/// # Example
/// ```
/// use catalog::Column;
/// use types::ColumnType;
///
/// let col = Column::builder()
///     .element_key("region".to_string())
///     .display_name("Region".to_string())
///     .alias("reg".to_string())
///     .ty(ColumnType::Text)
///     .build();
/// assert_eq!(col.alias.as_deref(), Some("reg"));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, bon::Builder)]
pub struct Column {
    pub element_key: String,
    pub display_name: String,
    /// Short label (the SMS label in the original app).
    pub alias: Option<String>,
    pub ty: ColumnType,
}

impl Column {
    pub fn new(element_key: impl Into<String>, display_name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            element_key: element_key.into(),
            display_name: display_name.into(),
            alias: None,
            ty,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}
