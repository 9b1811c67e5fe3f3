use crate::{ResultSet, Row};
use tabled::{Table, Tabled, builder::Builder, settings};

/// Predefined output styles that map to `tabled` styles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TableStyleKind {
    #[default]
    Modern,
    Ascii,
    Plain,
}

impl TableStyleKind {
    fn apply(self, table: &mut Table) {
        match self {
            Self::Modern => table.with(settings::Style::modern()),
            Self::Ascii => table.with(settings::Style::ascii()),
            Self::Plain => table.with(settings::Style::empty()),
        };
    }
}

/// Render a `ResultSet` with the given header labels.
///
/// `headers` usually carries display names; when it is empty the element keys
/// stored in the result set are used instead.
pub fn render_result_set(rs: &ResultSet, headers: &[String], style: TableStyleKind) -> String {
    let headers = if headers.is_empty() {
        &rs.columns
    } else {
        headers
    };
    if headers.is_empty() && rs.rows.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for row in &rs.rows {
        builder.push_record(row.cells.iter().map(|c| format_cell(c.as_deref())));
    }

    let mut table = builder.build();
    style.apply(&mut table);
    table.to_string()
}

/// Render arbitrary string rows with the provided style.
pub fn render_string_table(
    headers: &[&str],
    rows: Vec<Vec<String>>,
    style: TableStyleKind,
) -> String {
    if headers.is_empty() && rows.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();

    if !headers.is_empty() {
        builder.push_record(headers.iter().copied());
    }

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    style.apply(&mut table);
    table.to_string()
}

/// Render any `Tabled` rows with the provided style.
pub fn render_structured_rows<T>(rows: &[T], style: TableStyleKind) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "<empty>".into();
    }

    let mut table = Table::new(rows.to_vec());
    style.apply(&mut table);
    table.to_string()
}

/// Format a full row into a comma-separated string.
pub fn format_row(row: &Row) -> String {
    row.cells
        .iter()
        .map(|c| format_cell(c.as_deref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a single cell for display.
pub fn format_cell(cell: Option<&str>) -> String {
    match cell {
        Some(text) => text.to_string(),
        None => "NULL".into(),
    }
}
