//! Command-line access to a tables store through the script bridge.
//!
//! Every read goes through [`bridge::Control`] and [`bridge::TableData`], so
//! the output matches what a hosted page would see.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use bridge::{Control, TableData};
use catalog::Column;
use clap::{Parser, Subcommand, ValueEnum};
use common::{
    Config, GroupCountStrategy, TableId,
    pretty::{self, TableStyleKind},
};
use storage::{DataStore, MemoryStore};
use tabled::Tabled;
use tracing_subscriber::EnvFilter;
use types::ColumnType;

#[derive(Parser, Debug)]
#[command(
    name = "tables-bridge",
    about = "Query a tables store the way hosted pages do"
)]
struct Args {
    /// JSON config file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Store directory; defaults to the configured app directory
    #[arg(long)]
    store: Option<PathBuf>,
    /// How collection sizes of grouped tables are counted
    #[arg(long, value_enum)]
    strategy: Option<CliStrategy>,
    /// Table rendering style
    #[arg(long, value_enum, default_value_t = CliTableStyle::Modern)]
    style: CliTableStyle,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the Clients and Orders demo tables into the store
    Demo {
        /// Replace tables that already exist
        #[arg(long)]
        force: bool,
    },
    /// List tables
    Tables,
    /// Run a search expression against a table
    Query {
        table: String,
        #[arg(default_value = "")]
        expr: String,
        /// Print one JSON object per row instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show a table's columns and their types
    Columns { table: String },
    /// Show the collection size of every row of a grouped table
    Groups {
        table: String,
        #[arg(default_value = "")]
        expr: String,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CliStrategy {
    PointQueries,
    Aggregate,
}

impl From<CliStrategy> for GroupCountStrategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::PointQueries => GroupCountStrategy::PointQueries,
            CliStrategy::Aggregate => GroupCountStrategy::Aggregate,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CliTableStyle {
    Modern,
    Ascii,
    Plain,
}

impl From<CliTableStyle> for TableStyleKind {
    fn from(value: CliTableStyle) -> Self {
        match value {
            CliTableStyle::Modern => TableStyleKind::Modern,
            CliTableStyle::Ascii => TableStyleKind::Ascii,
            CliTableStyle::Plain => TableStyleKind::Plain,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(strategy) = args.strategy {
        config.group_count_strategy = strategy.into();
    }
    let store_dir = args.store.clone().unwrap_or_else(|| config.app_dir());
    let style = TableStyleKind::from(args.style);

    let output = run(&args.command, &config, &store_dir, style)?;
    println!("{output}");
    Ok(())
}

fn run(command: &Command, config: &Config, store_dir: &Path, style: TableStyleKind) -> Result<String> {
    let open = || -> Result<Control> {
        let store = MemoryStore::load(store_dir)
            .with_context(|| format!("failed to load store from {}", store_dir.display()))?;
        Ok(Control::from_config(Arc::new(store), config))
    };

    match command {
        Command::Demo { force } => seed_demo(store_dir, *force),
        Command::Tables => show_tables(&open()?, style),
        Command::Query { table, expr, json } => {
            let data = query(&open()?, table, expr)?;
            if *json {
                let lines = (0..data.get_count())
                    .map(|row| data.row_data(row).map(|r| r.to_json().to_string()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(lines.join("\n"))
            } else {
                Ok(render_rows(&data, style))
            }
        }
        Command::Columns { table } => show_columns(&open()?, table, style),
        Command::Groups { table, expr } => show_groups(&open()?, table, expr, style),
    }
}

fn query(control: &Control, table: &str, expr: &str) -> Result<TableData> {
    control
        .query(table, expr)?
        .ok_or_else(|| anyhow!("no table named '{table}'"))
}

fn render_rows(data: &TableData, style: TableStyleKind) -> String {
    let headers: Vec<String> = data
        .table()
        .columns()
        .iter()
        .map(|c| c.display_name.clone())
        .collect();
    let rendered = pretty::render_result_set(data.result(), &headers, style);
    format!("{rendered}\n({} row(s))", data.get_count())
}

fn show_tables(control: &Control, style: TableStyleKind) -> Result<String> {
    #[derive(Clone, Tabled)]
    struct TableRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Id")]
        id: String,
        #[tabled(rename = "Columns")]
        columns: usize,
        #[tabled(rename = "Grouped by")]
        grouped_by: String,
    }

    let tables = control.list_tables()?;
    let mut rows: Vec<TableRow> = tables
        .values()
        .map(|meta| TableRow {
            name: meta.display_name.clone(),
            id: meta.id.to_string(),
            columns: meta.columns().len(),
            grouped_by: meta.prime_columns.join(", "),
        })
        .collect();
    if rows.is_empty() {
        return Ok("No tables.".into());
    }
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pretty::render_structured_rows(&rows, style))
}

fn show_columns(control: &Control, table: &str, style: TableStyleKind) -> Result<String> {
    #[derive(Clone, Tabled)]
    struct ColumnRow {
        #[tabled(rename = "Column")]
        name: String,
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Alias")]
        alias: String,
        #[tabled(rename = "Type")]
        ty: String,
    }

    let meta = control
        .table(table)?
        .ok_or_else(|| anyhow!("no table named '{table}'"))?;
    let rows: Vec<ColumnRow> = meta
        .columns()
        .iter()
        .map(|c| ColumnRow {
            name: c.display_name.clone(),
            key: c.element_key.clone(),
            alias: c.alias.clone().unwrap_or_default(),
            ty: c.ty.label().to_string(),
        })
        .collect();
    Ok(pretty::render_structured_rows(&rows, style))
}

fn show_groups(control: &Control, table: &str, expr: &str, style: TableStyleKind) -> Result<String> {
    let data = query(control, table, expr)?;
    if !data.is_indexed() {
        bail!("table '{table}' is not grouped");
    }
    let Some(group_label) = data.table().group_column().map(|c| c.display_name.clone()) else {
        bail!("table '{table}' has no usable grouping column");
    };

    let mut rows = Vec::with_capacity(data.get_count());
    for row in 0..data.get_count() {
        rows.push(vec![
            row.to_string(),
            pretty::format_cell(data.get_data(row, &group_label)?.as_deref()),
            data.get_collection_size(row)?.to_string(),
        ]);
    }
    Ok(pretty::render_string_table(
        &["Row", group_label.as_str(), "Collection size"],
        rows,
        style,
    ))
}

fn seed_demo(store_dir: &Path, force: bool) -> Result<String> {
    let store = MemoryStore::load(store_dir)
        .with_context(|| format!("failed to load store from {}", store_dir.display()))?;

    let tables: [(&str, &str, Vec<Column>, Vec<String>, Vec<[&str; 2]>); 2] = [
        (
            "clients",
            "Clients",
            vec![
                Column::new("name", "Name", ColumnType::Text).with_alias("nm"),
                Column::new("region", "Region", ColumnType::Text),
            ],
            vec![],
            vec![["Ann", "East"], ["Bo", "West"], ["Cy", "East"]],
        ),
        (
            "orders",
            "Orders",
            vec![
                Column::new("item", "Item", ColumnType::Text),
                Column::new("region", "Region", ColumnType::Text),
            ],
            vec!["_region".into()],
            vec![["pen", "East"], ["ink", "West"], ["pad", "East"]],
        ),
    ];

    for (id, name, columns, prime, rows) in tables {
        if store.table(&TableId::new(id))?.is_some() {
            if !force {
                bail!("table '{name}' already exists; pass --force to replace it");
            }
            store.drop_table(name)?;
        }
        let id = store.create_table(Some(TableId::new(id)), name, columns, prime)?;
        for row in &rows {
            store.insert_row(&id, row.iter().map(|cell| Some(cell.to_string())).collect())?;
        }
        tracing::info!(table = name, rows = rows.len(), "seeded demo table");
    }

    store
        .save(store_dir)
        .with_context(|| format!("failed to save store to {}", store_dir.display()))?;
    Ok(format!("Seeded Clients and Orders in {}", store_dir.display()))
}
