use std::fmt;
use std::sync::Arc;

use bridge::ScriptInterface;
use common::BridgeResult;

/// The embedded script engine (a web view in the mobile app).
///
/// Implementations render content and run script; the host only drives them
/// through this trait.
pub trait ScriptEngine: Send {
    /// Drop whatever is currently rendered.
    fn clear(&mut self);

    fn load_url(&mut self, url: &str) -> BridgeResult<()>;

    fn load_data(&mut self, data: &str, mime_type: &str, encoding: &str) -> BridgeResult<()>;

    /// Run a script in the loaded page without waiting for a result.
    fn evaluate(&mut self, script: &str) -> BridgeResult<()>;

    /// Expose `object` to the page as the global `name`, replacing any
    /// previous object of that name.
    fn add_interface(&mut self, name: &str, object: Arc<dyn ScriptInterface>);

    fn remove_interface(&mut self, name: &str);

    fn set_diagnostics(&mut self, sink: Arc<dyn DiagnosticSink>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleLevel {
    Tip,
    Log,
    Warning,
    Error,
    Debug,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsoleLevel::Tip => "TIP",
            ConsoleLevel::Log => "LOG",
            ConsoleLevel::Warning => "WARNING",
            ConsoleLevel::Error => "ERROR",
            ConsoleLevel::Debug => "DEBUG",
        };
        f.write_str(name)
    }
}

/// Receives diagnostics reported by the engine.
pub trait DiagnosticSink: Send + Sync {
    fn console_message(&self, level: ConsoleLevel, message: &str, line: u32, source: &str);

    fn load_error(&self, code: i32, description: &str, url: &str);

    fn quota_exceeded(&self, required: u64, quota: u64);
}

/// Routes engine diagnostics into `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn console_message(&self, level: ConsoleLevel, message: &str, line: u32, source: &str) {
        tracing::info!(target: "host::console", %level, line, source, "{message}");
    }

    fn load_error(&self, code: i32, description: &str, url: &str) {
        tracing::error!(code, url, "load failed: {description}");
    }

    fn quota_exceeded(&self, required: u64, quota: u64) {
        tracing::info!(required, quota, "reached max app cache size");
    }
}
