//! Dotted-path parsing and lookup.
//!
//! A path such as `claimant.parties[1].email` is split into segments. A
//! segment is either a plain key or `name[idx]`. Indices that do not parse
//! as `usize` leave the whole segment as a plain key.

use serde_json::Value;

/// One component of a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment<'a> {
    Key(&'a str),
    Indexed { name: &'a str, index: usize },
}

impl<'a> PathSegment<'a> {
    pub fn parse(segment: &'a str) -> Self {
        if let Some(body) = segment.strip_suffix(']') {
            if let Some((name, idx)) = body.split_once('[') {
                if !name.is_empty() {
                    if let Ok(index) = idx.parse::<usize>() {
                        return Self::Indexed { name, index };
                    }
                }
            }
        }
        Self::Key(segment)
    }

    pub fn name(&self) -> &'a str {
        match self {
            Self::Key(name) | Self::Indexed { name, .. } => name,
        }
    }
}

/// Split `path` into segments. Returns `None` for an empty path or one with
/// an empty segment (`"a..b"`, `".a"`).
pub fn split(path: &str) -> Option<Vec<PathSegment<'_>>> {
    if path.is_empty() {
        return None;
    }
    let segments: Vec<_> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments.into_iter().map(PathSegment::parse).collect())
}

/// `prefix.key`, or just `key` at the root.
pub fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Look up the value at a dotted path.
///
/// Bare segments that land on an array resolve through element 0, matching
/// how the injector writes them.
pub fn resolve<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let segments = split(path)?;
    let last = segments.len() - 1;
    let mut current = value;
    for (i, segment) in segments.into_iter().enumerate() {
        let child = current.as_object()?.get(segment.name())?;
        current = match (segment, child) {
            (PathSegment::Indexed { index, .. }, _) => child.as_array()?.get(index)?,
            // The array itself when it is the target, element 0 otherwise.
            (PathSegment::Key(_), Value::Array(items)) if i < last => items.first()?,
            (PathSegment::Key(_), _) => child,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_indexed_segment() {
        assert_eq!(
            PathSegment::parse("parties[2]"),
            PathSegment::Indexed { name: "parties", index: 2 }
        );
    }

    #[test]
    fn non_numeric_index_is_a_plain_key() {
        assert_eq!(PathSegment::parse("parties[x]"), PathSegment::Key("parties[x]"));
        assert_eq!(PathSegment::parse("[3]"), PathSegment::Key("[3]"));
    }

    #[test]
    fn empty_segments_are_rejected() {
        assert!(split("").is_none());
        assert!(split("a..b").is_none());
        assert!(split(".a").is_none());
        assert_eq!(split("a.b").map(|s| s.len()), Some(2));
    }

    #[test]
    fn resolves_nested_and_indexed_paths() {
        let record = json!({
            "claim_details": { "claim_value": "307174.85" },
            "parties": [{ "name": "A" }, { "name": "B" }]
        });
        assert_eq!(resolve(&record, "claim_details.claim_value"), Some(&json!("307174.85")));
        assert_eq!(resolve(&record, "parties[1].name"), Some(&json!("B")));
        assert_eq!(resolve(&record, "parties[5].name"), None);
        assert_eq!(resolve(&record, "claim_details.missing"), None);
        assert_eq!(resolve(&record, "parties.name"), Some(&json!("A")));
        assert!(resolve(&record, "parties").is_some_and(Value::is_array));
    }
}
