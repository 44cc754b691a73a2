//! The resolved configuration handle.
//!
//! Wraps the merged tree with path-addressed reads and writes, a one-way
//! freeze state machine, an independent remote tree and the error channel.

use crate::config::ResolvedSource;
use crate::error::{ConfigError, ConfigResult};
use crate::notify::{ErrorChannel, ErrorSubscription};
use crate::path::{KeyPath, get_path, set_path};
use crate::remote::RemoteConfig;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Mutation state of a handle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FreezeState {
    /// Reads and writes allowed.
    Thawed,
    /// Writes rejected.
    Frozen,
    /// Writes rejected and the tree is shared without copying.
    DeepFrozen,
}

/// A resolved configuration tree.
#[derive(Debug)]
pub struct ConfigHandle {
    tree: Arc<Value>,
    state: FreezeState,
    loose: bool,
    sources: Vec<ResolvedSource>,
    remote: RemoteConfig,
    errors: ErrorChannel,
}

impl ConfigHandle {
    /// Wrap an already-resolved tree.
    pub fn new(tree: Value, loose: bool) -> Self {
        Self {
            tree: Arc::new(tree),
            state: FreezeState::Thawed,
            loose,
            sources: Vec::new(),
            remote: RemoteConfig::new(),
            errors: ErrorChannel::closed(None),
        }
    }

    pub(crate) fn with_sources(mut self, sources: Vec<ResolvedSource>) -> Self {
        self.sources = sources;
        self
    }

    /// Copy of the value at `key_path`.
    ///
    /// In loose mode an absent path yields `Ok(None)`; in strict mode it
    /// fails with `NonexistentKeyPath`. An empty path returns the whole tree.
    pub fn get(&self, key_path: impl Into<KeyPath>) -> ConfigResult<Option<Value>> {
        let path = key_path.into();
        match get_path(&self.tree, &path) {
            Some(value) => Ok(Some(value.clone())),
            None if self.loose => Ok(None),
            None => Err(ConfigError::NonexistentKeyPath {
                key_path: path.to_string(),
            }),
        }
    }

    /// Copy of the whole tree.
    pub fn get_all(&self) -> Value {
        Value::clone(&self.tree)
    }

    /// The whole tree behind an `Arc`.
    ///
    /// After [`deep_freeze`](Self::deep_freeze) this shares the tree without
    /// copying; before that it returns a fresh copy.
    pub fn snapshot(&self) -> Arc<Value> {
        match self.state {
            FreezeState::DeepFrozen => Arc::clone(&self.tree),
            _ => Arc::new(self.get_all()),
        }
    }

    /// Set `value` at `key_path`.
    ///
    /// A mapping written over an existing mapping is deep-merged into it, so
    /// repeated mapping writes accumulate keys. Anything else replaces the
    /// current value.
    pub fn set(&mut self, key_path: impl Into<KeyPath>, value: Value) -> ConfigResult<()> {
        let path = key_path.into();
        if self.is_frozen() {
            return Err(ConfigError::SetOnFrozenConfig {
                key_path: path.to_string(),
                value: value.to_string(),
            });
        }
        if path.is_empty() {
            return Err(ConfigError::InvalidKeyPath {
                key_path: format!("{:?}", path.to_string()),
            });
        }

        set_path(Arc::make_mut(&mut self.tree), &path, value)?;
        debug!(key_path = %path, "Config value set");
        Ok(())
    }

    /// Set a key path given as a dynamic value (string or list of strings).
    pub fn set_dynamic(&mut self, key_path: &Value, value: Value) -> ConfigResult<()> {
        let path = KeyPath::try_from(key_path)?;
        self.set(path, value)
    }

    /// Set every top-level key of `obj`, in its key order.
    ///
    /// Each key is written as a single literal segment, so keys containing
    /// dots are not split.
    pub fn multi_set(&mut self, obj: &Value) -> ConfigResult<()> {
        let map = obj
            .as_object()
            .ok_or_else(|| ConfigError::InvalidMultiSetArgument {
                value: obj.to_string(),
            })?;
        if self.is_frozen() {
            return Err(ConfigError::SetOnFrozenConfig {
                key_path: "<multi-set>".to_string(),
                value: obj.to_string(),
            });
        }

        for (key, value) in map {
            self.set(vec![key.clone()], value.clone())?;
        }
        Ok(())
    }

    /// Reject all further writes. Idempotent.
    pub fn freeze(&mut self) {
        if self.state == FreezeState::Thawed {
            debug!("Config frozen");
            self.state = FreezeState::Frozen;
        }
    }

    /// Freeze and share the tree immutably from now on.
    pub fn deep_freeze(&mut self) {
        if self.state != FreezeState::DeepFrozen {
            debug!("Config deep-frozen");
            self.state = FreezeState::DeepFrozen;
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.state >= FreezeState::Frozen
    }

    pub fn is_deep_frozen(&self) -> bool {
        self.state == FreezeState::DeepFrozen
    }

    pub fn freeze_state(&self) -> FreezeState {
        self.state
    }

    /// Whether reads of absent keys return `None` rather than failing.
    pub fn is_loose(&self) -> bool {
        self.loose
    }

    /// Sources that contributed to the tree, highest precedence first.
    pub fn sources(&self) -> &[ResolvedSource] {
        &self.sources
    }

    /// Copy of a runtime-pushed value.
    pub fn get_remote(&self, key_path: impl Into<KeyPath>) -> Option<Value> {
        self.remote.get(key_path)
    }

    /// Push a runtime value. Unaffected by freezing.
    pub fn set_remote(&self, key_path: impl Into<KeyPath>, value: Value) -> ConfigResult<()> {
        self.remote.set(key_path, value)
    }

    /// The remote tree, for sharing with tasks that push values.
    pub fn remote(&self) -> &RemoteConfig {
        &self.remote
    }

    /// Subscribe to the errors raised while this handle was built.
    ///
    /// Every subscription replays them in order and then ends.
    pub fn subscribe(&self) -> ErrorSubscription {
        self.errors.subscribe()
    }

    /// The first error raised while this handle was built, or `None` when
    /// construction was clean.
    pub async fn next_error(&self) -> Option<ConfigError> {
        self.subscribe().recv().await
    }

    /// Attach the non-fatal errors raised during construction.
    pub(crate) fn with_errors(mut self, errors: impl IntoIterator<Item = ConfigError>) -> Self {
        self.errors = ErrorChannel::closed(errors);
        self
    }
}

impl Clone for ConfigHandle {
    /// An independent, thawed handle over a deep copy of the current tree.
    ///
    /// The copy keeps the loose flag and source list, takes a copy of the
    /// remote tree, and starts with an empty error channel.
    fn clone(&self) -> Self {
        Self {
            tree: Arc::new(self.get_all()),
            state: FreezeState::Thawed,
            loose: self.loose,
            sources: self.sources.clone(),
            remote: RemoteConfig::from_value(Value::clone(&self.remote.snapshot())),
            errors: ErrorChannel::closed(None),
        }
    }
}
