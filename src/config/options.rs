//! Construction inputs for the configuration loader.

use super::replace::{ReplacementRule, Replacements};
use serde_json::Value;
use std::path::PathBuf;

/// Environment variable consulted by [`ConfigOptions::from_env`] for the tier.
pub const ENV_TIER_VAR: &str = "APP_ENV";

/// The env tier that requires a datacenter identity and loads production secrets.
pub const PRODUCTION_TIER: &str = "production";

/// Inputs that drive source resolution.
///
/// Nothing here is read from the process environment implicitly; use
/// [`ConfigOptions::from_env`] to seed the tier and argv from ambient state.
#[derive(Debug, Clone)]
pub struct ConfigOptions {
    /// Deployment tier, e.g. `development` or `production`.
    pub env_tier: Option<String>,
    /// Datacenter identity given directly.
    pub datacenter_value: Option<String>,
    /// File holding the datacenter identity.
    pub datacenter_file: Option<PathBuf>,
    /// CLI arguments, without the program name.
    pub cli_argv: Vec<String>,
    /// CLI keys dropped before merging.
    pub blacklist_keys: Vec<String>,
    /// Highest precedence source.
    pub seed: Option<Value>,
    /// Lowest precedence source.
    pub defaults: Option<Value>,
    /// Load `staging.json` overlays.
    pub is_staging: bool,
    /// Rules applied to every string leaf after merging.
    pub replacements: Replacements,
    /// Reads of absent keys return `None` instead of failing.
    pub loose: bool,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            env_tier: None,
            datacenter_value: None,
            datacenter_file: None,
            cli_argv: Vec::new(),
            blacklist_keys: vec!["_".to_string()],
            seed: None,
            defaults: None,
            is_staging: false,
            replacements: Replacements::default(),
            loose: true,
        }
    }
}

impl ConfigOptions {
    /// Options seeded from the process: tier from `APP_ENV`, argv from the
    /// current process arguments.
    pub fn from_env() -> Self {
        Self {
            env_tier: std::env::var(ENV_TIER_VAR).ok(),
            cli_argv: std::env::args().skip(1).collect(),
            ..Self::default()
        }
    }

    pub fn with_env_tier(mut self, tier: impl Into<String>) -> Self {
        self.env_tier = Some(tier.into());
        self
    }

    pub fn with_datacenter_value(mut self, value: impl Into<String>) -> Self {
        self.datacenter_value = Some(value.into());
        self
    }

    pub fn with_datacenter_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.datacenter_file = Some(path.into());
        self
    }

    pub fn with_argv<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cli_argv = argv.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the CLI key blacklist (the default strips `_`).
    pub fn with_blacklist<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_seed(mut self, seed: Value) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_defaults(mut self, defaults: Value) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn staging(mut self, is_staging: bool) -> Self {
        self.is_staging = is_staging;
        self
    }

    pub fn with_replacements(mut self, rules: Vec<ReplacementRule>) -> Self {
        self.replacements = Replacements::Rules(rules);
        self
    }

    /// Replacement rules as JSON, validated when the config is loaded.
    pub fn with_replacement_spec(mut self, spec: Value) -> Self {
        self.replacements = Replacements::Spec(spec);
        self
    }

    /// Make reads of absent keys fail with `NonexistentKeyPath`.
    pub fn strict(mut self) -> Self {
        self.loose = false;
        self
    }

    /// The tier as used for file names: lowercased, `None` when empty.
    pub fn normalized_env_tier(&self) -> Option<String> {
        self.env_tier
            .as_deref()
            .map(str::trim)
            .filter(|tier| !tier.is_empty())
            .map(str::to_lowercase)
    }

    /// Whether the normalized tier is production.
    pub fn is_production(&self) -> bool {
        self.normalized_env_tier().as_deref() == Some(PRODUCTION_TIER)
    }
}
