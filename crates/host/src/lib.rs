//! Hosting of script pages on top of the bridge.
//!
//! One [`EngineView`] exists per process and is moved between containers.
//! A [`WebPage`] binds the view to a data store: while the store is
//! available it injects the `control`, `data` and `tableData` objects and
//! loads its file; responses produced in the background are queued and
//! announced to the script on the UI thread.

mod engine;
mod page;
mod ui;
mod view;

pub use engine::{ConsoleLevel, DiagnosticSink, ScriptEngine, TracingDiagnostics};
pub use page::{
    DataInterface, DatabaseConnectionListener, PageSnapshot, PageState, ResponseQueue, WebPage,
};
pub use ui::{InlineExecutor, UiExecutor, UiThread};
pub use view::{Container, EngineView, Visibility};
