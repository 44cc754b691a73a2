//! Tiered Config CLI
//!
//! Resolves a layered configuration directory and prints the effective tree.

use anyhow::{Context, Result};
use clap::Parser;
use tiered_config::cli::{Cli, render};
use tiered_config::config::ConfigLoader;
use tiered_config::logging::{LogTarget, init_logging};
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let loader = ConfigLoader::new(&cli.dir, cli.to_options()?);
    debug!(
        dir = %loader.dirname().display(),
        env_tier = loader.options().normalized_env_tier().as_deref().unwrap_or("-"),
        staging = loader.options().is_staging,
        "Resolving configuration"
    );
    let config = loader
        .load()
        .with_context(|| format!("Failed to resolve configuration in {}", cli.dir.display()))?;

    // Report warnings queued during resolution
    let mut errors = config.subscribe();
    while let Some(err) = errors.try_recv() {
        warn!(error_type = err.error_type(), "{}", err);
        eprintln!("Warning: {}", err);
    }

    for source in config.sources() {
        debug!(source = %source.kind, path = ?source.path, "Contributing source");
    }

    let value = match cli.key.as_deref() {
        Some(key) => config.get(key)?,
        None => Some(config.get_all()),
    };

    match value {
        Some(value) => println!("{}", render(&value, cli.format)?),
        None => {
            eprintln!("Key not found: {}", cli.key.as_deref().unwrap_or_default());
            std::process::exit(1);
        }
    }

    Ok(())
}
