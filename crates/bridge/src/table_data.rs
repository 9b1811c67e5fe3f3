use ahash::RandomState;
use catalog::TableMeta;
use common::{BridgeError, BridgeResult, GroupCountStrategy, ResultSet};
use hashbrown::HashMap;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::control::{Control, backend_error};
use crate::row_data::RowData;

/// Rows of one table, addressable by row index and column display name.
///
/// Tables with prime columns are "indexed": every row belongs to a
/// collection (the rows sharing its value in the first prime column), and the
/// size of each row's collection is computed up front.
#[derive(Clone, Debug)]
pub struct TableData {
    meta: TableMeta,
    result: ResultSet,
    /// Display names and aliases → position in `result.columns`.
    col_map: HashMap<String, usize, RandomState>,
    /// One entry per row when the table is indexed.
    collection_sizes: Option<Vec<usize>>,
}

impl TableData {
    /// Wrap a result set that was not produced by a router. Collection sizes
    /// of an indexed table are counted within `result` itself.
    pub fn from_rows(meta: TableMeta, result: ResultSet) -> BridgeResult<Self> {
        Self::build(meta, result, None)
    }

    pub(crate) fn build(meta: TableMeta, result: ResultSet, control: Option<&Control>) -> BridgeResult<Self> {
        let col_map = build_col_map(&meta, &result);
        let mut data = Self {
            meta,
            result,
            col_map,
            collection_sizes: None,
        };
        if data.is_indexed() {
            let sizes = match control {
                Some(control) => match control.strategy() {
                    GroupCountStrategy::PointQueries => data.sizes_by_point_queries(control)?,
                    GroupCountStrategy::Aggregate => data.sizes_by_aggregate(control)?,
                },
                None => data.sizes_by_local_recount()?,
            };
            debug_assert_eq!(sizes.len(), data.get_count());
            data.collection_sizes = Some(sizes);
        }
        Ok(data)
    }

    pub fn table(&self) -> &TableMeta {
        &self.meta
    }

    /// The fetched rows; columns are element keys in declared order.
    pub fn result(&self) -> &ResultSet {
        &self.result
    }

    /// Number of rows.
    pub fn get_count(&self) -> usize {
        self.result.height()
    }

    /// Cell at `row` under `column_name`. `Ok(None)` for an unknown column or
    /// a null cell; a row outside the result is an error.
    pub fn get_data(&self, row: usize, column_name: &str) -> BridgeResult<Option<String>> {
        let Some(&ordinal) = self.col_map.get(column_name) else {
            return Ok(None);
        };
        Ok(self.result.data(row, ordinal)?.map(str::to_string))
    }

    /// Every row's value for `column_name` as a JSON array. Unknown columns
    /// and null cells yield empty strings.
    pub fn get_column_data(&self, column_name: &str) -> String {
        let ordinal = self.col_map.get(column_name).copied();
        let values: Vec<JsonValue> = self
            .result
            .rows
            .iter()
            .map(|row| {
                let cell = ordinal.and_then(|i| row.cell(i)).unwrap_or("");
                JsonValue::String(cell.to_string())
            })
            .collect();
        JsonValue::Array(values).to_string()
    }

    /// JSON object mapping each display name and alias to its type label.
    pub fn get_columns(&self) -> String {
        let columns: JsonMap<String, JsonValue> = self
            .col_map
            .keys()
            .filter_map(|name| {
                let column = self.meta.column_by_user_label(name)?;
                Some((name.clone(), JsonValue::String(column.ty.label().to_string())))
            })
            .collect();
        JsonValue::Object(columns).to_string()
    }

    pub fn is_indexed(&self) -> bool {
        self.meta.is_indexed()
    }

    /// Number of rows in the collection `row` belongs to.
    pub fn get_collection_size(&self, row: usize) -> BridgeResult<usize> {
        self.collection_sizes
            .as_ref()
            .and_then(|sizes| sizes.get(row).copied())
            .ok_or(BridgeError::NoSuchGroup(row))
    }

    /// Storage row id of `row`, when the store supplied one.
    pub fn row_id(&self, row: usize) -> BridgeResult<Option<&str>> {
        let len = self.get_count();
        self.result
            .rows
            .get(row)
            .map(|r| r.id())
            .ok_or(BridgeError::IndexOutOfRange { index: row, len })
    }

    /// Snapshot of one row keyed by element key.
    pub fn row_data(&self, row: usize) -> BridgeResult<RowData> {
        let len = self.get_count();
        let r = self
            .result
            .rows
            .get(row)
            .ok_or(BridgeError::IndexOutOfRange { index: row, len })?;
        let data: Vec<(String, String)> = self
            .result
            .columns
            .iter()
            .zip(&r.cells)
            .filter_map(|(key, cell)| cell.clone().map(|c| (key.clone(), c)))
            .collect();
        Ok(RowData::with_data(self.meta.clone(), data))
    }

    /// Display name of the collection column.
    fn group_column_name(&self) -> BridgeResult<String> {
        self.meta
            .group_column()
            .map(|column| column.display_name.clone())
            .ok_or_else(|| {
                BridgeError::Catalog(format!(
                    "'{}' has no grouping column",
                    self.meta.display_name
                ))
            })
    }

    /// Grouped count via N point queries: one `<column>:<value>` query per row
    /// against the same table.
    fn sizes_by_point_queries(&self, control: &Control) -> BridgeResult<Vec<usize>> {
        let column = self.group_column_name()?;
        let label = parser::quote_value(&column);
        let table_name = &self.meta.display_name;
        (0..self.get_count())
            .map(|row| {
                let search = match self.get_data(row, &column)? {
                    Some(value) => format!("{label}:{}", parser::quote_value(&value)),
                    None => format!("{label}:null"),
                };
                control.count(table_name, &search)?.ok_or_else(|| {
                    BridgeError::Catalog(format!("table '{table_name}' disappeared"))
                })
            })
            .collect()
    }

    /// Grouped count via a single aggregate request to the store.
    fn sizes_by_aggregate(&self, control: &Control) -> BridgeResult<Vec<usize>> {
        let column = self.group_column_name()?;
        let key = self
            .meta
            .column_by_user_label(&column)
            .map(|c| c.element_key.clone())
            .ok_or_else(|| BridgeError::Catalog(format!("unknown column '{column}'")))?;
        let counts = control
            .store()
            .group_counts(&self.meta.id, &key)
            .map_err(backend_error)?;
        (0..self.get_count())
            .map(|row| {
                let value = self.get_data(row, &column)?;
                Ok(counts.get(&value).copied().unwrap_or(0))
            })
            .collect()
    }

    fn sizes_by_local_recount(&self) -> BridgeResult<Vec<usize>> {
        let column = self.group_column_name()?;
        let mut counts: HashMap<Option<String>, usize, RandomState> = HashMap::default();
        let values = (0..self.get_count())
            .map(|row| self.get_data(row, &column))
            .collect::<BridgeResult<Vec<_>>>()?;
        for value in &values {
            *counts.entry(value.clone()).or_insert(0) += 1;
        }
        Ok(values.iter().map(|v| counts[v]).collect())
    }
}

fn build_col_map(meta: &TableMeta, result: &ResultSet) -> HashMap<String, usize, RandomState> {
    let mut col_map = HashMap::default();
    for column in meta.columns() {
        let Some(ordinal) = result.columns.iter().position(|k| *k == column.element_key) else {
            continue;
        };
        col_map.insert(column.display_name.clone(), ordinal);
        if let Some(alias) = &column.alias {
            col_map.insert(alias.clone(), ordinal);
        }
    }
    col_map
}
