//! Missing-leaf detection.
//!
//! The schema template is always the iteration source; the data is only
//! probed. Paths are emitted in template declaration order, and a path may
//! appear more than once (one occurrence per list item that lacks it).

use serde_json::{Map, Value};

use crate::path::join;

/// List every unfilled leaf path of `schema` in `data`.
///
/// Rules per template key, with `full_path = prefix.key`:
///
/// - key absent from `data` → every leaf under the template subtree
/// - template object → recurse, or all leaves when `data[key]` is not an object
/// - template array of objects → all representative leaves once when the data
///   list is falsy, otherwise recurse per element against the representative
/// - template array of scalars → `full_path` when the data value is falsy
/// - template scalar → `full_path` when the data value is `""` or `null`
///
/// A `data` value that is not an object is treated as an empty object.
pub fn find_missing(schema: &Value, data: &Value, prefix: &str) -> Vec<String> {
    let mut missing = Vec::new();
    if let Value::Object(schema_map) = schema {
        let empty = Map::new();
        let data_map = data.as_object().unwrap_or(&empty);
        walk_object(schema_map, data_map, prefix, &mut missing);
    }
    missing
}

fn walk_object(
    schema: &Map<String, Value>,
    data: &Map<String, Value>,
    prefix: &str,
    missing: &mut Vec<String>,
) {
    for (key, schema_val) in schema {
        let full_path = join(prefix, key);

        let Some(data_val) = data.get(key) else {
            collect_leaves(schema_val, &full_path, missing);
            continue;
        };

        match schema_val {
            Value::Object(child_schema) => match data_val {
                Value::Object(child_data) => walk_object(child_schema, child_data, &full_path, missing),
                _ => collect_leaves(schema_val, &full_path, missing),
            },

            Value::Array(items) => match items.first() {
                Some(representative @ Value::Object(rep_map)) => {
                    if is_falsy(data_val) {
                        collect_leaves(representative, &full_path, missing);
                    } else if let Value::Array(elements) = data_val {
                        for element in elements {
                            match element {
                                Value::Object(element_map) => {
                                    walk_object(rep_map, element_map, &full_path, missing)
                                }
                                _ => collect_leaves(representative, &full_path, missing),
                            }
                        }
                    } else {
                        // A truthy non-list where a list of objects belongs
                        // cannot satisfy any of the representative's fields.
                        collect_leaves(representative, &full_path, missing);
                    }
                }
                // List of scalars (or a template list with no representative):
                // the whole list is one leaf.
                _ => {
                    if is_falsy(data_val) {
                        missing.push(full_path);
                    }
                }
            },

            _ => {
                if is_unfilled_scalar(data_val) {
                    missing.push(full_path);
                }
            }
        }
    }
}

/// List every leaf path under a template subtree.
///
/// Used when a whole branch is absent: all of its leaves count as missing.
/// Arrays of objects contribute their representative's leaves; any other
/// array, and every scalar, is a single leaf.
pub fn find_all_leaf_paths(schema: &Value, prefix: &str) -> Vec<String> {
    let mut leaves = Vec::new();
    if let Value::Object(map) = schema {
        for (key, val) in map {
            collect_leaves(val, &join(prefix, key), &mut leaves);
        }
    }
    leaves
}

/// Leaves of `schema` rooted at `path`, where `path` already names `schema`.
fn collect_leaves(schema: &Value, path: &str, out: &mut Vec<String>) {
    match schema {
        Value::Object(map) => {
            for (key, val) in map {
                collect_leaves(val, &join(path, key), out);
            }
        }
        Value::Array(items) => match items.first() {
            Some(rep @ Value::Object(_)) => collect_leaves(rep, path, out),
            _ => out.push(path.to_string()),
        },
        _ => out.push(path.to_string()),
    }
}

/// Every leaf path of a template, in declaration order.
pub fn all_keys(schema: &Value) -> Vec<String> {
    find_all_leaf_paths(schema, "")
}

/// True when `data` fills every leaf of `schema`.
pub fn is_complete(schema: &Value, data: &Value) -> bool {
    find_missing(schema, data, "").is_empty()
}

/// Scalar leaves are unfilled only when empty string or null.
pub fn is_unfilled_scalar(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Truthiness used for list-valued fields: null, `false`, zero, and empty
/// strings, arrays and objects are all falsy.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
