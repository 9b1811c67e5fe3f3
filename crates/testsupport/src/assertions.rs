//! Custom assertion helpers for testing.

use common::{BridgeError, BridgeResult};
use pretty_assertions::assert_eq;
use serde_json::Value as JsonValue;

/// Assert that an operation returns an error containing a specific substring.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let result: Result<(), common::BridgeError> =
///     Err(common::BridgeError::Query("unknown column 'Country'".into()));
/// assert_error_contains(result, "unknown column");
/// ```
pub fn assert_error_contains<T: std::fmt::Debug>(result: BridgeResult<T>, expected_msg: &str) {
    match result {
        Ok(value) => panic!("expected error containing '{expected_msg}', got Ok({value:?})"),
        Err(err) => {
            let msg = err.to_string();
            assert!(
                msg.contains(expected_msg),
                "expected error containing '{expected_msg}', got '{msg}'"
            );
        }
    }
}

/// Assert that an operation failed because the store could not be reached.
pub fn assert_backend_unavailable<T: std::fmt::Debug>(result: BridgeResult<T>) {
    match result {
        Err(BridgeError::BackendUnavailable(_)) => {}
        other => panic!("expected BackendUnavailable, got {other:?}"),
    }
}

/// Assert that a JSON-encoded string parses to `expected`.
///
/// Script-facing methods return JSON inside strings; this compares them
/// structurally instead of textually.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
/// use serde_json::json;
///
/// assert_json_str_eq(r#"["East", "West"]"#, &json!(["East", "West"]));
/// ```
pub fn assert_json_str_eq(actual: &str, expected: &JsonValue) {
    let parsed: JsonValue = serde_json::from_str(actual)
        .unwrap_or_else(|err| panic!("not valid JSON ({err}): {actual}"));
    assert_eq!(&parsed, expected);
}
