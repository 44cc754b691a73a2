//! Configuration loader.
//!
//! Resolves the datacenter, builds and folds the source chain, applies
//! replacement rules and hands back a [`ConfigHandle`].

use super::datacenter::resolve_datacenter;
use super::files::{LocalFiles, SourceFiles};
use super::options::ConfigOptions;
use super::replace::apply_replacements;
use super::sources::{
    ResolutionContext, SourceChainResolver, check_name_component, strip_blacklist,
};
use crate::argv::parse_args;
use crate::error::{ConfigError, ConfigResult};
use crate::handle::ConfigHandle;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Loads configuration for one process.
pub struct ConfigLoader {
    dirname: PathBuf,
    options: ConfigOptions,
    files: Box<dyn SourceFiles>,
}

impl ConfigLoader {
    /// Loader reading tier files from `<dirname>/config` on local disk.
    pub fn new(dirname: impl Into<PathBuf>, options: ConfigOptions) -> Self {
        Self {
            dirname: dirname.into(),
            options,
            files: Box::new(LocalFiles),
        }
    }

    /// Read file-backed sources through `files` instead of local disk.
    pub fn with_files(mut self, files: impl SourceFiles + 'static) -> Self {
        self.files = Box::new(files);
        self
    }

    pub fn dirname(&self) -> &Path {
        &self.dirname
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    /// Resolve every source and build the handle.
    ///
    /// Fatal problems are returned as `Err`. A missing datacenter file
    /// outside production is logged and queued on the handle's error
    /// channel instead; subscribe after this returns to receive it.
    pub fn load(self) -> ConfigResult<ConfigHandle> {
        if self.dirname.as_os_str().is_empty() {
            return Err(ConfigError::InvalidDirname {
                dirname: self.dirname.to_string_lossy().to_string(),
            });
        }

        let options = &self.options;
        let rules = options.replacements.resolve()?;
        let datacenter = resolve_datacenter(options, self.files.as_ref())?;

        let mut cli = parse_args(&options.cli_argv);
        strip_blacklist(&mut cli, &options.blacklist_keys);

        let env_tier = options.normalized_env_tier();
        if let Some(tier) = &env_tier {
            check_name_component("env tier", tier)?;
        }
        if let Some(dc) = datacenter.datacenter() {
            check_name_component("datacenter", dc)?;
        }

        let ctx = ResolutionContext {
            env_tier,
            datacenter: datacenter.datacenter().map(str::to_string),
            is_staging: options.is_staging,
            cli,
            seed: options.seed.clone(),
            defaults: options.defaults.clone(),
        };

        let resolver = SourceChainResolver::new(&self.dirname, self.files.as_ref());
        let (mut tree, sources) = resolver.resolve(&ctx)?;

        if !rules.is_empty() {
            tree = apply_replacements(tree, &rules);
        }

        info!(
            config_dir = %resolver.config_dir().display(),
            env_tier = ctx.env_tier.as_deref().unwrap_or("-"),
            datacenter = ctx.datacenter.as_deref().unwrap_or("-"),
            sources = sources.len(),
            "Configuration resolved"
        );

        let warning = datacenter.warning().cloned();
        if let Some(warning) = &warning {
            warn!(error_type = warning.error_type(), "{}", warning);
        }

        Ok(ConfigHandle::new(tree, options.loose)
            .with_sources(sources)
            .with_errors(warning))
    }
}

/// Resolve configuration for a process whose `config/` directory lives
/// under `dirname`.
pub fn fetch_config(dirname: impl Into<PathBuf>, options: ConfigOptions) -> ConfigResult<ConfigHandle> {
    ConfigLoader::new(dirname, options).load()
}
