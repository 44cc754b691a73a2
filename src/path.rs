//! Key-path addressing into a configuration tree.
//!
//! A key path is either a dotted string (`"server.port"`) or a list of raw
//! segments (`["hosts", "db.internal"]`). Only the segment form can address
//! a key that itself contains a `.`.

use crate::config::deep_merge;
use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Value};
use std::fmt;

/// A path into a configuration tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPath {
    /// `.`-delimited path, split on every dot.
    Dotted(String),
    /// Raw segments, never split.
    Segments(Vec<String>),
}

impl KeyPath {
    /// The segments this path walks, in order.
    ///
    /// An empty dotted string has no segments and addresses the whole tree.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            KeyPath::Dotted(s) if s.is_empty() => Vec::new(),
            KeyPath::Dotted(s) => s.split('.').collect(),
            KeyPath::Segments(segments) => segments.iter().map(String::as_str).collect(),
        }
    }

    /// True when the path addresses the root of the tree.
    pub fn is_empty(&self) -> bool {
        match self {
            KeyPath::Dotted(s) => s.is_empty(),
            KeyPath::Segments(segments) => segments.is_empty(),
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPath::Dotted(s) => write!(f, "{}", s),
            KeyPath::Segments(segments) => write!(f, "{:?}", segments),
        }
    }
}

impl From<&str> for KeyPath {
    fn from(s: &str) -> Self {
        KeyPath::Dotted(s.to_string())
    }
}

impl From<String> for KeyPath {
    fn from(s: String) -> Self {
        KeyPath::Dotted(s)
    }
}

impl From<&String> for KeyPath {
    fn from(s: &String) -> Self {
        KeyPath::Dotted(s.clone())
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        KeyPath::Segments(segments)
    }
}

impl From<Vec<&str>> for KeyPath {
    fn from(segments: Vec<&str>) -> Self {
        KeyPath::Segments(segments.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        KeyPath::Segments(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        KeyPath::Segments(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl TryFrom<&Value> for KeyPath {
    type Error = ConfigError;

    /// Build a key path from a dynamic value: a string, or an array whose
    /// items are all strings.
    fn try_from(value: &Value) -> ConfigResult<Self> {
        let invalid = || ConfigError::InvalidKeyPath {
            key_path: value.to_string(),
        };

        match value {
            Value::String(s) => Ok(KeyPath::Dotted(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect::<ConfigResult<Vec<_>>>()
                .map(KeyPath::Segments),
            _ => Err(invalid()),
        }
    }
}

/// Read the value at `path`, or the whole tree for an empty path.
///
/// Returns `None` when any segment is missing or walks through a scalar.
pub fn get_path<'a>(tree: &'a Value, path: &KeyPath) -> Option<&'a Value> {
    path.segments()
        .into_iter()
        .try_fold(tree, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Write `value` at `path`, creating intermediate mappings as needed.
///
/// Intermediate scalars are replaced by empty mappings. An existing sequence
/// is indexed by the segment; an index past the end pads the sequence with
/// `null` up to it. A segment that is not an index into a sequence fails
/// with `InvalidKeyPath` and leaves the tree unchanged.
pub fn put_path(tree: &mut Value, path: &KeyPath, value: Value) -> ConfigResult<()> {
    let segments = path.segments();
    let invalid = || ConfigError::InvalidKeyPath {
        key_path: format!("{:?}", path.to_string()),
    };
    if segments.is_empty() || !sequence_indexes_valid(tree, &segments) {
        return Err(invalid());
    }

    put_segments(tree, &segments, value);
    Ok(())
}

/// Write `value` at `path` with accessor semantics: when both the current
/// value and `value` are mappings they are deep-merged, otherwise `value`
/// replaces whatever was there.
pub fn set_path(tree: &mut Value, path: &KeyPath, value: Value) -> ConfigResult<()> {
    let merged = match get_path(tree, path) {
        Some(current @ Value::Object(_)) if !path.is_empty() => deep_merge(current.clone(), value),
        _ => value,
    };
    put_path(tree, path, merged)
}

fn put_segments(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    let child = child_or_insert(node, head);
    if rest.is_empty() {
        *child = value;
    } else {
        put_segments(child, rest, value);
    }
}

/// Largest index a write may pad a sequence up to.
const MAX_SEQUENCE_INDEX: usize = 1 << 16;

/// Check every segment that lands on an existing sequence is a usable index.
fn sequence_indexes_valid(tree: &Value, segments: &[&str]) -> bool {
    let mut node = Some(tree);
    for segment in segments {
        node = match node {
            Some(Value::Array(items)) => match sequence_index(segment) {
                Some(i) => items.get(i),
                None => return false,
            },
            Some(Value::Object(map)) => map.get(*segment),
            // Scalars and fresh nodes become mappings below this point.
            _ => None,
        };
    }
    true
}

fn sequence_index(segment: &str) -> Option<usize> {
    segment
        .parse::<usize>()
        .ok()
        .filter(|i| *i <= MAX_SEQUENCE_INDEX)
}

fn child_or_insert<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    match node {
        Value::Array(items) => {
            // Indexes were checked by `sequence_indexes_valid`.
            let i = sequence_index(segment).unwrap_or(items.len());
            if i >= items.len() {
                items.resize(i + 1, Value::Null);
            }
            &mut items[i]
        }
        node => ensure_object(node)
            .entry(segment.to_string())
            .or_insert(Value::Null),
    }
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was replaced with an object above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_empty_path_returns_tree() {
        let tree = json!({"a": 1});
        assert_eq!(get_path(&tree, &KeyPath::from("")), Some(&tree));
        assert_eq!(get_path(&tree, &KeyPath::Segments(vec![])), Some(&tree));
    }

    #[test]
    fn test_get_dotted_and_segments() {
        let tree = json!({"a": {"b": {"c": 3}}, "x.y": "literal"});
        assert_eq!(get_path(&tree, &"a.b.c".into()), Some(&json!(3)));
        assert_eq!(get_path(&tree, &["x.y"].into()), Some(&json!("literal")));
        assert_eq!(get_path(&tree, &"x.y".into()), None);
    }

    #[test]
    fn test_get_missing_or_through_scalar_is_none() {
        let tree = json!({"a": 1});
        assert_eq!(get_path(&tree, &"b".into()), None);
        assert_eq!(get_path(&tree, &"a.b".into()), None);
    }

    #[test]
    fn test_get_indexes_into_sequences() {
        let tree = json!({"hosts": ["a", "b"]});
        assert_eq!(get_path(&tree, &"hosts.1".into()), Some(&json!("b")));
        assert_eq!(get_path(&tree, &"hosts.5".into()), None);
    }

    #[test]
    fn test_put_creates_intermediate_mappings() {
        let mut tree = json!({});
        put_path(&mut tree, &"a.b.c".into(), json!(true)).unwrap();
        assert_eq!(tree, json!({"a": {"b": {"c": true}}}));
    }

    #[test]
    fn test_put_replaces_scalar_intermediate() {
        let mut tree = json!({"a": 5});
        put_path(&mut tree, &"a.b".into(), json!(1)).unwrap();
        assert_eq!(tree, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_put_segment_with_dot_is_literal() {
        let mut tree = json!({});
        put_path(&mut tree, &["db.host", "port"].into(), json!(5432)).unwrap();
        assert_eq!(tree, json!({"db.host": {"port": 5432}}));
    }

    #[test]
    fn test_put_into_sequence_element() {
        let mut tree = json!({"hosts": [{"name": "a"}]});
        put_path(&mut tree, &"hosts.0.port".into(), json!(80)).unwrap();
        assert_eq!(tree, json!({"hosts": [{"name": "a", "port": 80}]}));
    }

    #[test]
    fn test_put_past_sequence_end_pads_with_null() {
        let mut tree = json!({"hosts": ["a", "b"]});
        put_path(&mut tree, &"hosts.4".into(), json!("x")).unwrap();
        assert_eq!(tree, json!({"hosts": ["a", "b", null, null, "x"]}));

        put_path(&mut tree, &"hosts.2.port".into(), json!(80)).unwrap();
        assert_eq!(tree, json!({"hosts": ["a", "b", {"port": 80}, null, "x"]}));
    }

    #[test]
    fn test_put_non_index_into_sequence_is_invalid() {
        let mut tree = json!({"hosts": ["a", "b"]});
        for path in ["hosts.name", "hosts.-1", "hosts.99999999999"] {
            let err = put_path(&mut tree, &path.into(), json!("x")).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidKeyPath { .. }), "{}", path);
        }
        assert_eq!(tree, json!({"hosts": ["a", "b"]}));
    }

    #[test]
    fn test_put_empty_path_is_invalid() {
        let mut tree = json!({});
        let err = put_path(&mut tree, &"".into(), json!(1)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKeyPath { .. }));
    }

    #[test]
    fn test_set_path_merges_mappings() {
        let mut tree = json!({"db": {"host": "a", "port": 1}});
        set_path(&mut tree, &"db".into(), json!({"port": 2})).unwrap();
        assert_eq!(tree, json!({"db": {"host": "a", "port": 2}}));
    }

    #[test]
    fn test_set_path_replaces_non_mappings() {
        let mut tree = json!({"list": [1, 2], "db": {"host": "a"}});
        set_path(&mut tree, &"list".into(), json!([3])).unwrap();
        set_path(&mut tree, &"db".into(), json!("off")).unwrap();
        assert_eq!(tree, json!({"list": [3], "db": "off"}));
    }

    #[test]
    fn test_key_path_from_value() {
        assert_eq!(
            KeyPath::try_from(&json!("a.b")).unwrap(),
            KeyPath::Dotted("a.b".into())
        );
        assert_eq!(
            KeyPath::try_from(&json!(["a", "b.c"])).unwrap(),
            KeyPath::Segments(vec!["a".into(), "b.c".into()])
        );
        assert!(KeyPath::try_from(&json!(42)).is_err());
        assert!(KeyPath::try_from(&json!(["a", 1])).is_err());
        assert!(KeyPath::try_from(&json!(null)).is_err());
    }
}
