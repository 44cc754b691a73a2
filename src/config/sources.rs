//! Source chain resolution.
//!
//! Builds the ranked list of configuration sources for a given runtime
//! context, loads the ones that apply, and folds them into a single tree.
//! The chain is ordered highest precedence first:
//!
//! 1. seed
//! 2. CLI arguments
//! 3. file named by `--config`
//! 4. `{ "datacenter": <id> }`
//! 5. `staging.<dc>.json`
//! 6. `staging.json`
//! 7. `<tier>.<dc>.json`
//! 8. `secrets/secrets.json` (production only)
//! 9. `secrets/secrets-<tier>.json` (other tiers)
//! 10. `<tier>.json`
//! 11. `common.json`
//! 12. defaults

use super::files::{SourceFiles, read_json_source};
use super::merge::merge_chain;
use super::options::PRODUCTION_TIER;
use crate::error::{ConfigError, ConfigResult};
use crate::path::{KeyPath, put_path};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the directory holding tier files, relative to the dirname.
pub const CONFIG_DIR: &str = "config";

/// CLI flag naming an extra config file.
pub const CONFIG_FLAG: &str = "config";

/// Position of a source in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Seed,
    Cli,
    ConfigFlag,
    Datacenter,
    StagingDatacenter,
    Staging,
    TierDatacenter,
    Secrets,
    TierSecrets,
    Tier,
    Common,
    Defaults,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceKind::Seed => "seed",
            SourceKind::Cli => "cli",
            SourceKind::ConfigFlag => "config flag",
            SourceKind::Datacenter => "datacenter",
            SourceKind::StagingDatacenter => "staging datacenter",
            SourceKind::Staging => "staging",
            SourceKind::TierDatacenter => "tier datacenter",
            SourceKind::Secrets => "secrets",
            SourceKind::TierSecrets => "tier secrets",
            SourceKind::Tier => "tier",
            SourceKind::Common => "common",
            SourceKind::Defaults => "defaults",
        };
        write!(f, "{}", name)
    }
}

/// One contributor to the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A tree used as-is.
    Literal(Value),
    /// Flat `"a.b": value` pairs expanded into a tree.
    Flat(Map<String, Value>),
    /// A JSON file; skipped when missing.
    File(PathBuf),
    /// Not applicable in the current context.
    Skip,
}

/// A source with its rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSource {
    pub kind: SourceKind,
    pub source: Source,
}

/// A source that contributed to the resolved tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSource {
    pub kind: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Runtime inputs the chain depends on.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    /// Normalized (lowercased) env tier.
    pub env_tier: Option<String>,
    pub datacenter: Option<String>,
    pub is_staging: bool,
    /// CLI arguments after blacklist filtering, still flat.
    pub cli: Map<String, Value>,
    pub seed: Option<Value>,
    pub defaults: Option<Value>,
}

/// Decides which sources apply and folds them into one tree.
pub struct SourceChainResolver<'a> {
    config_dir: PathBuf,
    files: &'a dyn SourceFiles,
}

impl<'a> SourceChainResolver<'a> {
    /// Resolver reading tier files from `<dirname>/config`.
    pub fn new(dirname: &Path, files: &'a dyn SourceFiles) -> Self {
        Self {
            config_dir: dirname.join(CONFIG_DIR),
            files,
        }
    }

    /// Directory holding the tier files.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// The full chain for `ctx`, highest precedence first, with
    /// inapplicable entries marked [`Source::Skip`].
    pub fn chain(&self, ctx: &ResolutionContext) -> Vec<RankedSource> {
        let tier = ctx.env_tier.as_deref();
        let dc = ctx.datacenter.as_deref();
        let dir = &self.config_dir;
        let file = |name: String| Source::File(dir.join(name));

        let config_flag = ctx
            .cli
            .get(CONFIG_FLAG)
            .and_then(Value::as_str)
            .filter(|path| !path.is_empty())
            .map(|path| Source::File(PathBuf::from(path)));

        let entries = [
            (SourceKind::Seed, ctx.seed.clone().map(Source::Literal)),
            (SourceKind::Cli, Some(Source::Flat(ctx.cli.clone()))),
            (SourceKind::ConfigFlag, config_flag),
            (
                SourceKind::Datacenter,
                dc.map(|dc| Source::Literal(serde_json::json!({ "datacenter": dc }))),
            ),
            (
                SourceKind::StagingDatacenter,
                dc.filter(|_| ctx.is_staging)
                    .map(|dc| file(format!("staging.{}.json", dc))),
            ),
            (
                SourceKind::Staging,
                ctx.is_staging.then(|| file("staging.json".to_string())),
            ),
            (
                SourceKind::TierDatacenter,
                tier.zip(dc)
                    .map(|(tier, dc)| file(format!("{}.{}.json", tier, dc))),
            ),
            (
                SourceKind::Secrets,
                (tier == Some(PRODUCTION_TIER))
                    .then(|| Source::File(dir.join("secrets").join("secrets.json"))),
            ),
            (
                SourceKind::TierSecrets,
                tier.filter(|tier| *tier != PRODUCTION_TIER).map(|tier| {
                    Source::File(dir.join("secrets").join(format!("secrets-{}.json", tier)))
                }),
            ),
            (
                SourceKind::Tier,
                tier.map(|tier| file(format!("{}.json", tier))),
            ),
            (SourceKind::Common, Some(file("common.json".to_string()))),
            (SourceKind::Defaults, ctx.defaults.clone().map(Source::Literal)),
        ];

        entries
            .into_iter()
            .map(|(kind, source)| RankedSource {
                kind,
                source: source.unwrap_or(Source::Skip),
            })
            .collect()
    }

    /// Load every applicable source and fold the chain into one tree.
    ///
    /// Returns the merged tree and the sources that contributed to it.
    pub fn resolve(&self, ctx: &ResolutionContext) -> ConfigResult<(Value, Vec<ResolvedSource>)> {
        let mut layers = Vec::new();
        let mut contributed = Vec::new();

        for RankedSource { kind, source } in self.chain(ctx) {
            let (layer, path) = match source {
                Source::Skip => continue,
                Source::Literal(value) => (value, None),
                Source::Flat(flat) => (expand_flat(&flat), None),
                Source::File(path) => match read_json_source(self.files, &path)? {
                    Some(value) => (value, Some(path)),
                    None => {
                        debug!(source = %kind, path = %path.display(), "Config file not found, skipping");
                        continue;
                    }
                },
            };

            debug!(source = %kind, path = ?path, "Loaded config source");
            layers.push(layer);
            contributed.push(ResolvedSource { kind, path });
        }

        Ok((merge_chain(layers), contributed))
    }
}

/// Expand flat dotted keys into a nested tree.
///
/// `{"a.b": 1, "a.c": 2}` becomes `{"a": {"b": 1, "c": 2}}`. Empty keys, and
/// keys that walk into a repeated flag's sequence by a non-index segment,
/// cannot be addressed and are dropped.
pub fn expand_flat(flat: &Map<String, Value>) -> Value {
    let mut tree = Value::Object(Map::new());
    for (key, value) in flat {
        if key.is_empty() {
            continue;
        }
        if let Err(e) = put_path(&mut tree, &KeyPath::from(key), value.clone()) {
            debug!(key = %key, error = %e, "Dropping CLI key that cannot be addressed");
        }
    }
    tree
}

/// Check that a tier or datacenter name can only address a file directly
/// under the config directory.
pub fn check_name_component(field: &str, value: &str) -> ConfigResult<()> {
    if value.contains(['/', '\\']) || value.contains("..") {
        return Err(ConfigError::InvalidSourceName {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Remove blacklisted keys from flat CLI arguments.
pub fn strip_blacklist(cli: &mut Map<String, Value>, blacklist: &[String]) {
    for key in blacklist {
        cli.remove(key);
    }
}
