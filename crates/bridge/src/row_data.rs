use ahash::RandomState;
use catalog::TableMeta;
use hashbrown::HashMap;

type Cells = HashMap<String, String, RandomState>;

/// A single row keyed by element key, read through user-facing labels.
#[derive(Clone, Debug)]
pub struct RowData {
    meta: TableMeta,
    data: Cells,
}

impl RowData {
    pub fn new(meta: TableMeta) -> Self {
        Self {
            meta,
            data: Cells::default(),
        }
    }

    pub fn with_data(meta: TableMeta, data: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            meta,
            data: data.into_iter().collect(),
        }
    }

    /// Replace the row's cells.
    pub fn set(&mut self, data: impl IntoIterator<Item = (String, String)>) {
        self.data = data.into_iter().collect();
    }

    /// Value under a display name or alias; `None` for unknown labels and
    /// null cells.
    pub fn get(&self, label: &str) -> Option<&str> {
        let column = self.meta.column_by_user_label(label)?;
        self.data.get(&column.element_key).map(String::as_str)
    }

    /// The row as a JSON object keyed by display name; null cells are omitted.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .meta
            .columns()
            .iter()
            .filter_map(|c| {
                let value = self.data.get(&c.element_key)?;
                Some((c.display_name.clone(), serde_json::Value::String(value.clone())))
            })
            .collect();
        serde_json::Value::Object(map)
    }
}
