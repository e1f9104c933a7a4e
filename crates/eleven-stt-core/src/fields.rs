//! Tolerant reads over provider JSON.
//!
//! The API has used several names for the same field over time
//! (`transcription_id` vs `id`, `status` vs `state`, ...). Every such lookup
//! goes through [`first_present`], which walks an ordered list of dotted
//! paths and returns the first value that is present. `null` and empty
//! strings count as absent, so a later candidate can still win.

use serde_json::Value;

/// Resolve a dotted path (`"result.transcription_id"`) inside `value`.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |node, key| node.get(key))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// First present value among `paths`, in priority order.
pub fn first_present<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths
        .iter()
        .filter_map(|path| lookup(value, path))
        .find(|candidate| is_present(candidate))
}

/// Like [`first_present`] but only accepts strings, or numbers rendered as
/// strings (some endpoints return numeric ids).
pub fn first_string(value: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| lookup(value, path))
        .find_map(|candidate| match candidate {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}
