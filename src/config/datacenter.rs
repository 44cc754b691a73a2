//! Datacenter identity resolution.
//!
//! The identity comes from an explicit value or from a file. Production
//! requires one or the other; elsewhere a missing file only warns.

use super::files::SourceFiles;
use super::options::ConfigOptions;
use crate::error::{ConfigError, ConfigResult};
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Outcome of datacenter resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum DatacenterState {
    /// Neither a value nor a file was supplied.
    NotRequested,
    /// Identity resolved, whitespace stripped.
    Resolved(String),
    /// The file could not be read outside production; carries the warning.
    Failed(ConfigError),
}

impl DatacenterState {
    /// The resolved identity, if any.
    pub fn datacenter(&self) -> Option<&str> {
        match self {
            DatacenterState::Resolved(dc) => Some(dc),
            _ => None,
        }
    }

    /// The `{ "datacenter": <id> }` source, if resolved.
    pub fn as_source(&self) -> Option<Value> {
        self.datacenter().map(|dc| json!({ "datacenter": dc }))
    }

    /// The non-fatal warning to deliver asynchronously, if any.
    pub fn warning(&self) -> Option<&ConfigError> {
        match self {
            DatacenterState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Resolve the datacenter identity for `options`.
///
/// Fatal conditions (`DatacenterRequired`, `DatacenterFileRequired`) are
/// returned as `Err`; a missing file outside production is returned as
/// [`DatacenterState::Failed`] so resolution can continue without it.
pub fn resolve_datacenter(
    options: &ConfigOptions,
    files: &dyn SourceFiles,
) -> ConfigResult<DatacenterState> {
    let production = options.is_production();

    if let Some(value) = options.datacenter_value.as_deref() {
        let dc = strip_whitespace(value);
        if !dc.is_empty() {
            debug!(datacenter = %dc, "Datacenter from explicit value");
            return Ok(DatacenterState::Resolved(dc));
        }
    }

    let Some(path) = options.datacenter_file.as_deref() else {
        if production {
            return Err(ConfigError::DatacenterRequired {
                env_tier: options.normalized_env_tier().unwrap_or_default(),
            });
        }
        return Ok(DatacenterState::NotRequested);
    };

    let failure = match files.read(path) {
        Ok(Some(bytes)) => {
            let dc = strip_whitespace(&String::from_utf8_lossy(&bytes));
            if !dc.is_empty() {
                debug!(datacenter = %dc, path = %path.display(), "Datacenter from file");
                return Ok(DatacenterState::Resolved(dc));
            }
            "file is empty".to_string()
        }
        Ok(None) => "file not found".to_string(),
        Err(e) => e.to_string(),
    };

    let path = path.to_string_lossy().to_string();
    if production {
        return Err(ConfigError::DatacenterFileRequired {
            path,
            reason: failure,
        });
    }

    warn!(path = %path, reason = %failure, "Datacenter file missing, continuing without datacenter");
    Ok(DatacenterState::Failed(ConfigError::MissingDatacenter {
        path,
        reason: failure,
    }))
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
