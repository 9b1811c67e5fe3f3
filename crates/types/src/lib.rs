use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Declared type tag of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    None,
    Text,
    Integer,
    Number,
    Date,
    DateTime,
    Time,
    Boolean,
    MultipleChoices,
    Location,
    Image,
}

impl ColumnType {
    pub const ALL: [ColumnType; 11] = [
        ColumnType::None,
        ColumnType::Text,
        ColumnType::Integer,
        ColumnType::Number,
        ColumnType::Date,
        ColumnType::DateTime,
        ColumnType::Time,
        ColumnType::Boolean,
        ColumnType::MultipleChoices,
        ColumnType::Location,
        ColumnType::Image,
    ];

    /// Label reported to script callers.
    pub fn label(self) -> &'static str {
        match self {
            ColumnType::None => "none",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::DateTime => "dateTime",
            ColumnType::Time => "time",
            ColumnType::Boolean => "boolean",
            ColumnType::MultipleChoices => "mc_options",
            ColumnType::Location => "location",
            ColumnType::Image => "image",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Number)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColumnType::ALL
            .into_iter()
            .find(|ty| ty.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown column type '{s}'"))
    }
}

/// Order two cell values, numerically when both parse as finite numbers.
///
/// Examples:
/// - `compare_cells("9", "10") == Ordering::Less`
/// - `compare_cells("b", "a") == Ordering::Greater`
/// - `compare_cells("NaN", "1")` orders as text
///
/// Only ordering uses this; equality of cells is exact text equality.
pub fn compare_cells(left: &str, right: &str) -> Ordering {
    match (finite_number(left), finite_number(right)) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        _ => left.cmp(right),
    }
}

fn finite_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
