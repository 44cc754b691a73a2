//! CLI definitions for the `tiered-config` binary.
//!
//! The binary resolves a config directory the same way an application
//! would and prints the resulting tree (or one key of it).

use crate::config::{ConfigOptions, ENV_TIER_VAR, ReplacementRule};
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;

/// Output format for resolved values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    #[default]
    Json,
    /// YAML
    Yaml,
}

/// Resolve and print layered configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing the `config/` folder
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Environment tier (defaults to $APP_ENV)
    #[arg(short, long)]
    pub env: Option<String>,

    /// Datacenter identity
    #[arg(long)]
    pub datacenter: Option<String>,

    /// File holding the datacenter identity
    #[arg(long)]
    pub datacenter_file: Option<PathBuf>,

    /// Load staging overlays
    #[arg(long)]
    pub staging: bool,

    /// Fail when the requested key does not exist
    #[arg(long)]
    pub strict: bool,

    /// Replacement rule applied to every string value, as FROM=TO (repeatable)
    #[arg(long = "replace", value_name = "FROM=TO")]
    pub replacements: Vec<String>,

    /// CLI keys to drop before merging (repeatable, default `_`)
    #[arg(long = "blacklist", value_name = "KEY")]
    pub blacklist: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: String,

    /// Key path to print (whole tree when omitted)
    pub key: Option<String>,

    /// Arguments passed to the resolver as the application's own argv
    #[arg(last = true)]
    pub app_args: Vec<String>,
}

impl Cli {
    /// Build resolver options from the parsed arguments.
    pub fn to_options(&self) -> Result<ConfigOptions> {
        let mut options = ConfigOptions::default().with_argv(self.app_args.iter().cloned());

        options.env_tier = self
            .env
            .clone()
            .or_else(|| std::env::var(ENV_TIER_VAR).ok());
        options.datacenter_value = self.datacenter.clone();
        options.datacenter_file = self.datacenter_file.clone();
        options.is_staging = self.staging;
        options.loose = !self.strict;

        if !self.blacklist.is_empty() {
            options = options.with_blacklist(self.blacklist.iter().cloned());
        }

        let rules = self
            .replacements
            .iter()
            .map(|spec| parse_replacement(spec))
            .collect::<Result<Vec<_>>>()?;
        Ok(options.with_replacements(rules))
    }
}

/// Parse a `FROM=TO` literal replacement.
pub fn parse_replacement(spec: &str) -> Result<ReplacementRule> {
    let Some((from, to)) = spec.split_once('=') else {
        bail!("invalid replacement {:?}: expected FROM=TO", spec);
    };
    if from.is_empty() {
        bail!("invalid replacement {:?}: FROM must not be empty", spec);
    }
    Ok(ReplacementRule::literal(from, to))
}

/// Render a value in the requested format.
pub fn render(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("Failed to render JSON"),
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to render YAML"),
    }
}
