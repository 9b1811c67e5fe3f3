//! Script-facing table access.
//!
//! A hosted page talks to the data store through two objects:
//!
//! - [`Control`] resolves a table's display name and runs a search
//!   expression against it, returning a [`TableData`].
//! - [`TableData`] exposes the fetched rows by row index and column display
//!   name, plus whole-column and schema views serialized as JSON.
//!
//! Both are reachable from script content through [`ScriptInterface`]
//! objects. Accessors handed to a script live in a [`HandleRegistry`] until
//! the script releases them.
//!
//! ```text
//! script ──call──▶ ControlInterface ──Weak──▶ Control ──▶ DataStore
//!                        │                       │
//!                        └──handle──▶ HandleRegistry ◀── TableData
//! ```

mod control;
mod handles;
mod interface;
mod row_data;
mod table_data;

pub use control::{Control, TableViewLauncher};
pub use handles::HandleRegistry;
pub use interface::{ControlInterface, ScriptInterface, TableDataInterface};
pub use row_data::RowData;
pub use table_data::TableData;
