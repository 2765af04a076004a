//! Flat dotted-path patches merged into a nested record.

use serde_json::{Map, Value};
use tracing::warn;

use claimfill_contracts::pipeline::FlatPatch;

use crate::path::{split, PathSegment};

/// Apply every entry of `patch` to a copy of `record` and return the copy.
///
/// Entries are applied in patch order, so a later entry for the same path
/// wins. Intermediate containers are created as needed. A bare segment that
/// lands on an array addresses element 0; use `name[idx]` to reach others.
/// The input record is never modified.
pub fn inject(patch: &FlatPatch, record: &Value) -> Value {
    let mut root = match record {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    for (path, value) in patch {
        let Some(segments) = split(path) else {
            warn!(path = %path, "skipping patch entry with an empty path segment");
            continue;
        };
        set_path(&mut root, &segments, value.clone());
    }

    Value::Object(root)
}

fn set_path(map: &mut Map<String, Value>, segments: &[PathSegment<'_>], value: Value) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    let is_final = rest.is_empty();

    match *segment {
        PathSegment::Indexed { name, index } => {
            let slot = map.entry(name.to_string()).or_insert(Value::Null);
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            let Value::Array(items) = slot else { return };
            while items.len() <= index {
                items.push(Value::Object(Map::new()));
            }
            if is_final {
                items[index] = value;
            } else {
                descend(&mut items[index], rest, value);
            }
        }
        PathSegment::Key(name) => {
            if is_final {
                map.insert(name.to_string(), value);
                return;
            }
            let slot = map.entry(name.to_string()).or_insert(Value::Null);
            match slot {
                Value::Array(items) => {
                    if items.is_empty() {
                        items.push(Value::Object(Map::new()));
                    }
                    descend(&mut items[0], rest, value);
                }
                other => descend(other, rest, value),
            }
        }
    }
}

/// Continue into `slot`, replacing it with an empty object unless it is one.
fn descend(slot: &mut Value, rest: &[PathSegment<'_>], value: Value) {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        set_path(map, rest, value);
    }
}
