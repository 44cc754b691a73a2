//! Runtime-pushed configuration values.
//!
//! A separate tree, empty at start, that other tasks can update while
//! readers keep going. Readers never block writers: each update swaps in a
//! new tree.

use crate::error::{ConfigError, ConfigResult};
use crate::path::{KeyPath, get_path, set_path};
use arc_swap::ArcSwap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Lock-free tree for values pushed at runtime.
pub struct RemoteConfig {
    tree: ArcSwap<Value>,
}

impl RemoteConfig {
    /// Create an empty remote tree.
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// Create a remote tree starting from `tree`.
    pub fn from_value(tree: Value) -> Self {
        Self {
            tree: ArcSwap::from_pointee(tree),
        }
    }

    /// Copy of the value at `key_path`; the whole tree for an empty path.
    pub fn get(&self, key_path: impl Into<KeyPath>) -> Option<Value> {
        let tree = self.tree.load();
        get_path(&tree, &key_path.into()).cloned()
    }

    /// Current tree, shared.
    pub fn snapshot(&self) -> Arc<Value> {
        self.tree.load_full()
    }

    /// Set `value` at `key_path`, deep-merging into an existing mapping.
    pub fn set(&self, key_path: impl Into<KeyPath>, value: Value) -> ConfigResult<()> {
        let path = key_path.into();
        if path.is_empty() {
            return Err(ConfigError::InvalidKeyPath {
                key_path: format!("{:?}", path.to_string()),
            });
        }

        let mut outcome = Ok(());
        self.tree.rcu(|current| {
            let mut next = Value::clone(current);
            outcome = set_path(&mut next, &path, value.clone());
            next
        });
        debug!(key_path = %path, "Remote config value set");
        outcome
    }

    /// Set every top-level key of `obj`.
    pub fn multi_set(&self, obj: &Value) -> ConfigResult<()> {
        let map = obj
            .as_object()
            .ok_or_else(|| ConfigError::InvalidMultiSetArgument {
                value: obj.to_string(),
            })?;
        for (key, value) in map {
            self.set(vec![key.clone()], value.clone())?;
        }
        Ok(())
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("tree", &self.snapshot())
            .finish()
    }
}
