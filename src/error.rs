//! Structured error types for configuration resolution and access.

use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Construction errors
    InvalidDirname,
    DatacenterRequired,
    DatacenterFileRequired,
    InvalidReplacementSpec,
    InvalidConfigFile,
    ConfigFileUnreadable,
    InvalidSourceName,

    // Warnings
    MissingDatacenter,

    // Accessor errors
    InvalidKeyPath,
    NonexistentKeyPath,
    InvalidMultiSetArgument,
    SetOnFrozenConfig,
}

/// Errors raised while resolving or accessing a configuration tree.
///
/// Values are cheap to clone so the same error can be replayed to every
/// subscriber of the error channel.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error(
        "invalid dirname argument: expected a non-empty path but got {dirname:?}. \
         SUGGESTED FIX: pass the directory that contains `config/`"
    )]
    InvalidDirname { dirname: String },

    #[error(
        "a datacenter value or datacenter file is required when the env tier is \"production\" \
         (env tier: {env_tier}). SUGGESTED FIX: set `datacenter_value` or `datacenter_file`"
    )]
    DatacenterRequired { env_tier: String },

    #[error(
        "no such file or directory '{path}': the datacenter file must exist when the env tier \
         is \"production\" ({reason})"
    )]
    DatacenterFileRequired { path: String, reason: String },

    #[error("no such file or directory '{path}': expected to find datacenter configuration there ({reason})")]
    MissingDatacenter { path: String, reason: String },

    #[error("invalid key path {key_path}: expected a string or a sequence of strings")]
    InvalidKeyPath { key_path: String },

    #[error("nonexistent key path {key_path}. SUGGESTED FIX: add {key_path} and a value to config")]
    NonexistentKeyPath { key_path: String },

    #[error("invalid multi-set argument: expected an object but got {value}")]
    InvalidMultiSetArgument { value: String },

    #[error("cannot set {key_path} to {value}: config is frozen")]
    SetOnFrozenConfig { key_path: String, value: String },

    #[error("invalid replacement spec: {reason}")]
    InvalidReplacementSpec { reason: String },

    #[error("invalid config file '{path}': {reason}")]
    InvalidConfigFile { path: String, reason: String },

    #[error("could not read config file '{path}': {reason}")]
    ConfigFileUnreadable { path: String, reason: String },

    #[error(
        "invalid {field} {value:?}: it names a file under config/ and must not contain \
         '/', '\\' or '..'"
    )]
    InvalidSourceName { field: String, value: String },
}

impl ConfigError {
    /// Programmatic code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::InvalidDirname { .. } => ErrorCode::InvalidDirname,
            ConfigError::DatacenterRequired { .. } => ErrorCode::DatacenterRequired,
            ConfigError::DatacenterFileRequired { .. } => ErrorCode::DatacenterFileRequired,
            ConfigError::MissingDatacenter { .. } => ErrorCode::MissingDatacenter,
            ConfigError::InvalidKeyPath { .. } => ErrorCode::InvalidKeyPath,
            ConfigError::NonexistentKeyPath { .. } => ErrorCode::NonexistentKeyPath,
            ConfigError::InvalidMultiSetArgument { .. } => ErrorCode::InvalidMultiSetArgument,
            ConfigError::SetOnFrozenConfig { .. } => ErrorCode::SetOnFrozenConfig,
            ConfigError::InvalidReplacementSpec { .. } => ErrorCode::InvalidReplacementSpec,
            ConfigError::InvalidConfigFile { .. } => ErrorCode::InvalidConfigFile,
            ConfigError::ConfigFileUnreadable { .. } => ErrorCode::ConfigFileUnreadable,
            ConfigError::InvalidSourceName { .. } => ErrorCode::InvalidSourceName,
        }
    }

    /// Stable dotted type string, suitable for log fields and matching.
    pub fn error_type(&self) -> &'static str {
        match self.code() {
            ErrorCode::InvalidDirname => "missing.dirname.argument",
            ErrorCode::DatacenterRequired => "datacenter.option.required",
            ErrorCode::DatacenterFileRequired => "datacenter.file.required",
            ErrorCode::MissingDatacenter => "missing.datacenter.file",
            ErrorCode::InvalidKeyPath => "invalid.keypath",
            ErrorCode::NonexistentKeyPath => "nonexistent.key.path",
            ErrorCode::InvalidMultiSetArgument => "invalid.multi.set",
            ErrorCode::SetOnFrozenConfig => "set.frozen.object",
            ErrorCode::InvalidReplacementSpec => "invalid.replacement.spec",
            ErrorCode::InvalidConfigFile => "invalid.config.file",
            ErrorCode::ConfigFileUnreadable => "unreadable.config.file",
            ErrorCode::InvalidSourceName => "invalid.source.name",
        }
    }

    /// Whether this error is a non-fatal warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, ConfigError::MissingDatacenter { .. })
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
