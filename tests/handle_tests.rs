//! Integration tests for reading, writing and freezing a resolved handle.

use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;
use tiered_config::{ConfigError, ConfigHandle, ConfigOptions, FreezeState, fetch_config};

/// Handle over a temp dir whose `config/common.json` holds `common`.
fn load_with_common(common: Value) -> (TempDir, ConfigHandle) {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("config")).unwrap();
    fs::write(
        temp.path().join("config/common.json"),
        serde_json::to_vec(&common).unwrap(),
    )
    .unwrap();
    let config = fetch_config(temp.path(), ConfigOptions::default()).unwrap();
    (temp, config)
}

#[test]
fn test_set_with_dotted_and_segment_keys() {
    let (_temp, mut config) = load_with_common(json!({}));

    config.set("key1", json!("value1")).unwrap();
    config.set("key2.nested", json!("value2")).unwrap();
    config.set(["key3", "nested"], json!("value3")).unwrap();
    config.set(["key4.with.dots"], json!("value4")).unwrap();

    assert_eq!(config.get("key1").unwrap(), Some(json!("value1")));
    assert_eq!(config.get("key2").unwrap(), Some(json!({"nested": "value2"})));
    assert_eq!(config.get("key3.nested").unwrap(), Some(json!("value3")));
    assert_eq!(config.get(["key4.with.dots"]).unwrap(), Some(json!("value4")));
    assert_eq!(config.get("key4.with.dots").unwrap(), None);
}

#[test]
fn test_set_mappings_accumulate() {
    let (_temp, mut config) = load_with_common(json!({}));

    config.set("key", json!({"foo": "bar"})).unwrap();
    config.set("key", json!({"baz": "quux"})).unwrap();
    config.set("key.plain", json!(1)).unwrap();

    assert_eq!(
        config.get("key").unwrap(),
        Some(json!({"foo": "bar", "baz": "quux", "plain": 1}))
    );
}

#[test]
fn test_set_scalar_over_mapping_replaces() {
    let (_temp, mut config) = load_with_common(json!({"db": {"host": "a", "port": 1}}));

    config.set("db", json!("sqlite://memory")).unwrap();

    assert_eq!(config.get("db").unwrap(), Some(json!("sqlite://memory")));
}

#[test]
fn test_set_rejects_invalid_key_paths() {
    let (_temp, mut config) = load_with_common(json!({}));

    let err = config.set_dynamic(&Value::Null, json!("x")).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidKeyPath { .. }));
    assert_eq!(err.error_type(), "invalid.keypath");

    let err = config.set_dynamic(&json!(42), json!("x")).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidKeyPath { .. }));

    let err = config.set("", json!("x")).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidKeyPath { .. }));

    config.set_dynamic(&json!(["a", "b"]), json!(true)).unwrap();
    assert_eq!(config.get("a.b").unwrap(), Some(json!(true)));
}

#[test]
fn test_reads_are_copies() {
    let (_temp, config) = load_with_common(json!({"server": {"port": 3000}}));

    let mut server = config.get("server").unwrap().unwrap();
    server["port"] = json!(1);
    let mut all = config.get_all();
    all["server"] = json!(null);

    assert_eq!(config.get("server.port").unwrap(), Some(json!(3000)));
}

#[test]
fn test_multi_set_keeps_dotted_keys_literal() {
    let (_temp, mut config) = load_with_common(json!({"a": {"x": 1}}));

    config
        .multi_set(&json!({"a": {"y": 2}, "b.c": 3}))
        .unwrap();

    assert_eq!(config.get("a").unwrap(), Some(json!({"x": 1, "y": 2})));
    assert_eq!(config.get(["b.c"]).unwrap(), Some(json!(3)));
    assert_eq!(config.get("b").unwrap(), None);
}

#[test]
fn test_multi_set_requires_an_object() {
    let (_temp, mut config) = load_with_common(json!({}));

    for bad in [json!(null), json!([1, 2]), json!("x")] {
        let err = config.multi_set(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMultiSetArgument { .. }));
    }
}

#[test]
fn test_freeze_blocks_writes_but_not_remote() {
    let (_temp, mut config) = load_with_common(json!({"port": 3000}));

    config.freeze();
    config.freeze();
    assert_eq!(config.freeze_state(), FreezeState::Frozen);

    let err = config.set("port", json!(1)).unwrap_err();
    assert!(matches!(err, ConfigError::SetOnFrozenConfig { .. }));
    let err = config.multi_set(&json!({"port": 1})).unwrap_err();
    assert!(matches!(err, ConfigError::SetOnFrozenConfig { .. }));
    assert_eq!(config.get("port").unwrap(), Some(json!(3000)));

    config.set_remote("flags.beta", json!(true)).unwrap();
    assert_eq!(config.get_remote("flags.beta"), Some(json!(true)));
    assert_eq!(config.get("flags").unwrap(), None);
}

#[test]
fn test_deep_freeze_shares_the_tree() {
    let (_temp, mut config) = load_with_common(json!({"a": 1}));

    config.deep_freeze();
    assert!(config.is_frozen());
    assert!(config.is_deep_frozen());

    let first = config.snapshot();
    let second = config.snapshot();
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    config.freeze();
    assert_eq!(config.freeze_state(), FreezeState::DeepFrozen);
}

#[test]
fn test_clone_of_frozen_handle_is_writable() {
    let (_temp, mut config) = load_with_common(json!({"a": {"b": 1}}));
    config.set_remote("r", json!("remote")).unwrap();
    config.deep_freeze();

    let mut copy = config.clone();
    assert_eq!(copy.freeze_state(), FreezeState::Thawed);
    assert_eq!(copy.get_remote("r"), Some(json!("remote")));

    copy.set("a.b", json!(2)).unwrap();
    copy.set_remote("r", json!("changed")).unwrap();

    assert_eq!(copy.get("a.b").unwrap(), Some(json!(2)));
    assert_eq!(config.get("a.b").unwrap(), Some(json!(1)));
    assert_eq!(config.get_remote("r"), Some(json!("remote")));
}

#[test]
fn test_writes_to_original_do_not_reach_clone() {
    let (_temp, mut config) = load_with_common(json!({"db": {"primary": {"host": "a", "port": 5432}}}));
    config.set_remote("r", json!({"x": 1})).unwrap();

    let copy = config.clone();

    config.set("db.primary", json!({"host": "b"})).unwrap();
    config.set(["db", "replica"], json!({"host": "c"})).unwrap();
    config.multi_set(&json!({"extra": true})).unwrap();
    config.set_remote("r.x", json!(2)).unwrap();
    config.freeze();

    assert_eq!(
        config.get("db").unwrap(),
        Some(json!({"primary": {"host": "b", "port": 5432}, "replica": {"host": "c"}}))
    );
    assert_eq!(
        copy.get("db").unwrap(),
        Some(json!({"primary": {"host": "a", "port": 5432}}))
    );
    assert_eq!(copy.get("extra").unwrap(), None);
    assert_eq!(copy.get_remote("r"), Some(json!({"x": 1})));
    assert_eq!(copy.freeze_state(), FreezeState::Thawed);
}

#[test]
fn test_set_past_sequence_end_pads_existing_list() {
    let (_temp, mut config) = load_with_common(json!({"hosts": ["a", "b"]}));

    config.set("hosts.5", json!("x")).unwrap();

    assert_eq!(
        config.get("hosts").unwrap(),
        Some(json!(["a", "b", null, null, null, "x"]))
    );
}

#[test]
fn test_clone_keeps_strict_mode() {
    let temp = TempDir::new().unwrap();
    let config = fetch_config(temp.path(), ConfigOptions::default().strict()).unwrap();

    let copy = config.clone();

    assert!(!copy.is_loose());
    assert!(matches!(
        copy.get("missing").unwrap_err(),
        ConfigError::NonexistentKeyPath { .. }
    ));
}

#[test]
fn test_remote_is_shared_across_threads() {
    let (_temp, config) = load_with_common(json!({}));
    let remote = config.remote();

    std::thread::scope(|scope| {
        for i in 0..4 {
            scope.spawn(move || {
                remote.set(vec![format!("worker{}", i)], json!(i)).unwrap();
            });
        }
    });

    for i in 0..4 {
        assert_eq!(config.get_remote(vec![format!("worker{}", i)]), Some(json!(i)));
    }
}
