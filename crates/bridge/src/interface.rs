use std::sync::{Arc, Weak};

use common::{BridgeError, BridgeResult};
use serde_json::Value as JsonValue;

use crate::control::Control;
use crate::handles::HandleRegistry;

/// An object injected into the script context. Arguments and results are
/// JSON-compatible values.
pub trait ScriptInterface: Send + Sync {
    fn call(&self, method: &str, args: &[JsonValue]) -> BridgeResult<JsonValue>;
}

/// Upgrade the router a script object was created for. Once the hosting page
/// unbinds or rebinds, the router is gone and the store counts as unavailable.
fn bound_control(control: &Weak<Control>) -> BridgeResult<Arc<Control>> {
    control
        .upgrade()
        .ok_or_else(|| BridgeError::BackendUnavailable("no database bound".into()))
}

/// Script view of a [`Control`].
///
/// Holds the router weakly: the hosting page owns it, and once the page
/// rebinds or goes away every call fails instead of keeping the old router
/// alive.
pub struct ControlInterface {
    control: Weak<Control>,
    handles: Arc<HandleRegistry>,
}

impl ControlInterface {
    pub fn new(control: &Arc<Control>, handles: Arc<HandleRegistry>) -> Self {
        Self {
            control: Arc::downgrade(control),
            handles,
        }
    }
}

impl ScriptInterface for ControlInterface {
    fn call(&self, method: &str, args: &[JsonValue]) -> BridgeResult<JsonValue> {
        let control = bound_control(&self.control)?;
        match method {
            "openTable" => {
                let opened = control.open_table(arg_str(args, 0, method)?, opt_str(args, 1))?;
                Ok(JsonValue::Bool(opened))
            }
            "query" => match control.query(arg_str(args, 0, method)?, opt_str(args, 1))? {
                Some(data) => Ok(JsonValue::String(self.handles.insert(data)?)),
                None => Ok(JsonValue::Null),
            },
            "listTables" => Ok(JsonValue::from(control.table_names()?)),
            other => Err(unknown_method("control", other)),
        }
    }
}

/// Script view of the accessors in a [`HandleRegistry`]; the handle is the
/// first argument of every method.
///
/// Tied to the same router as its [`ControlInterface`], so both objects stop
/// working together when the binding ends.
pub struct TableDataInterface {
    control: Weak<Control>,
    handles: Arc<HandleRegistry>,
}

impl TableDataInterface {
    pub fn new(control: &Arc<Control>, handles: Arc<HandleRegistry>) -> Self {
        Self {
            control: Arc::downgrade(control),
            handles,
        }
    }
}

impl ScriptInterface for TableDataInterface {
    fn call(&self, method: &str, args: &[JsonValue]) -> BridgeResult<JsonValue> {
        bound_control(&self.control)?;
        let handle = arg_str(args, 0, method)?;
        if method == "release" {
            return Ok(JsonValue::Bool(self.handles.release(handle)?));
        }
        let data = self.handles.get(handle)?;
        match method {
            "getCount" => Ok(JsonValue::from(data.get_count())),
            "getData" => {
                let row = arg_index(args, 1, method)?;
                let value = data.get_data(row, arg_str(args, 2, method)?)?;
                Ok(value.map_or(JsonValue::Null, JsonValue::String))
            }
            "getColumnData" => Ok(JsonValue::String(
                data.get_column_data(arg_str(args, 1, method)?),
            )),
            "getColumns" => Ok(JsonValue::String(data.get_columns())),
            "isIndexed" => Ok(JsonValue::Bool(data.is_indexed())),
            "getCollectionSize" => {
                let row = arg_index(args, 1, method)?;
                Ok(JsonValue::from(data.get_collection_size(row)?))
            }
            "getRowId" => {
                let row = arg_index(args, 1, method)?;
                Ok(data
                    .row_id(row)?
                    .map_or(JsonValue::Null, |id| JsonValue::String(id.to_string())))
            }
            "getRow" => {
                let row = arg_index(args, 1, method)?;
                Ok(JsonValue::String(data.row_data(row)?.to_json().to_string()))
            }
            other => Err(unknown_method("tableData", other)),
        }
    }
}

fn unknown_method(object: &str, method: &str) -> BridgeError {
    BridgeError::Script(format!("{object} has no method '{method}'"))
}

fn arg_str<'a>(args: &'a [JsonValue], idx: usize, method: &str) -> BridgeResult<&'a str> {
    args.get(idx).and_then(JsonValue::as_str).ok_or_else(|| {
        BridgeError::Script(format!("{method}: argument {idx} must be a string"))
    })
}

/// Optional string argument; missing or null reads as "".
fn opt_str(args: &[JsonValue], idx: usize) -> &str {
    args.get(idx).and_then(JsonValue::as_str).unwrap_or("")
}

fn arg_index(args: &[JsonValue], idx: usize, method: &str) -> BridgeResult<usize> {
    let value = args.get(idx).and_then(JsonValue::as_i64).ok_or_else(|| {
        BridgeError::Script(format!("{method}: argument {idx} must be an integer"))
    })?;
    usize::try_from(value)
        .map_err(|_| BridgeError::Script(format!("{method}: row index {value} is negative")))
}
