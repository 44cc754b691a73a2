//! Deep merge for configuration trees.
//!
//! Mappings are merged key by key; everything else (sequences, scalars,
//! `null`) in the overlay replaces the base value outright.

use serde_json::Value;

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans and nulls are replaced entirely
/// - Keys absent from overlay leave base untouched
///
/// # Example
/// ```
/// use serde_json::json;
/// use tiered_config::config::deep_merge;
///
/// let base = json!({
///     "server": { "port": 8080, "host": "localhost" },
///     "features": ["a", "b"]
/// });
/// let overlay = json!({
///     "server": { "port": 9000 },
///     "features": ["c"]
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(
///     result,
///     json!({ "server": { "port": 9000, "host": "localhost" }, "features": ["c"] })
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        // Both are objects: merge recursively
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                // Merge in place so existing keys keep their position
                match base_map.get_mut(&key) {
                    Some(base_value) => {
                        let merged_value = deep_merge(base_value.take(), overlay_value);
                        *base_value = merged_value;
                    }
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
            Value::Object(base_map)
        }
        // Any other case: overlay replaces base entirely
        (_, overlay) => overlay,
    }
}

/// Fold a chain of layers ordered highest precedence first.
///
/// Layer *i* wins over layer *i + 1* wherever keys collide. An empty chain
/// yields an empty mapping.
pub fn merge_chain(layers: impl IntoIterator<Item = Value>) -> Value {
    let layers: Vec<Value> = layers.into_iter().collect();
    layers
        .into_iter()
        .rev()
        .fold(Value::Object(Default::default()), deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_simple_objects() {
        let base = json!({"a": 1, "b": 2});
        let overlay = json!({"b": 3, "c": 4});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_merge_nested_objects() {
        let base = json!({
            "server": {"host": "localhost", "port": 8080},
            "debug": true
        });
        let overlay = json!({
            "server": {"port": 9000}
        });
        let result = deep_merge(base, overlay);
        assert_eq!(
            result,
            json!({
                "server": {"host": "localhost", "port": 9000},
                "debug": true
            })
        );
    }

    #[test]
    fn test_arrays_replaced_not_merged() {
        let base = json!({"items": [1, 2, 3]});
        let overlay = json!({"items": [4, 5]});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"items": [4, 5]}));
    }

    #[test]
    fn test_null_overrides_base() {
        let base = json!({"a": 1, "b": {"c": 2}});
        let overlay = json!({"a": null, "b": {"c": null}});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"a": null, "b": {"c": null}}));
    }

    #[test]
    fn test_absent_keys_preserve_base() {
        let base = json!({"a": 1, "b": {"c": 2, "d": 3}});
        let overlay = json!({"b": {}});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"a": 1, "b": {"c": 2, "d": 3}}));
    }

    #[test]
    fn test_overlay_replaces_primitive_with_object() {
        let base = json!({"value": 42});
        let overlay = json!({"value": {"nested": true}});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"value": {"nested": true}}));
    }

    #[test]
    fn test_overlay_replaces_object_with_primitive() {
        let base = json!({"value": {"nested": true}});
        let overlay = json!({"value": 42});
        let result = deep_merge(base, overlay);
        assert_eq!(result, json!({"value": 42}));
    }

    #[test]
    fn test_chain_first_layer_wins() {
        let layers = vec![
            json!({"a": 3}),
            json!({"b": {"c": 2}}),
            json!({"a": 1, "b": {"c": 1, "d": 1}}),
        ];
        let result = merge_chain(layers);
        assert_eq!(result, json!({"a": 3, "b": {"c": 2, "d": 1}}));
    }

    #[test]
    fn test_empty_chain_is_empty_mapping() {
        assert_eq!(merge_chain(Vec::new()), json!({}));
    }
}
