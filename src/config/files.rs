//! File access for file-backed configuration sources.
//!
//! Missing files are an expected outcome (most tier files are optional), so
//! readers report them as `Ok(None)` rather than as errors.

use crate::error::{ConfigError, ConfigResult};
use serde_json::Value;
use std::io;
use std::path::Path;

/// Reads raw bytes for file-backed sources.
pub trait SourceFiles: Send + Sync {
    /// Read the file at `path`, returning `Ok(None)` when it does not exist.
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>>;
}

/// Reads sources from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl SourceFiles for LocalFiles {
    fn read(&self, path: &Path) -> io::Result<Option<Vec<u8>>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Load a JSON mapping from `path`.
///
/// Returns `Ok(None)` for a missing file. A present file must parse as a
/// JSON object.
pub fn read_json_source(files: &dyn SourceFiles, path: &Path) -> ConfigResult<Option<Value>> {
    let display = path.to_string_lossy().to_string();

    let Some(bytes) = files
        .read(path)
        .map_err(|e| ConfigError::ConfigFileUnreadable {
            path: display.clone(),
            reason: e.to_string(),
        })?
    else {
        return Ok(None);
    };

    let value: Value = serde_json::from_slice(&bytes).map_err(|e| ConfigError::InvalidConfigFile {
        path: display.clone(),
        reason: e.to_string(),
    })?;

    if !value.is_object() {
        return Err(ConfigError::InvalidConfigFile {
            path: display,
            reason: "top-level value must be an object".to_string(),
        });
    }

    Ok(Some(value))
}
