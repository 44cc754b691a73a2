//! Tiered Configuration Library
//!
//! Resolves one effective configuration tree from ranked sources (seed, CLI
//! arguments, tier and datacenter files, secrets, defaults) and exposes
//! path-addressed access to it with optional freezing.
//!
//! ```no_run
//! use tiered_config::{ConfigOptions, fetch_config};
//!
//! let config = fetch_config(".", ConfigOptions::from_env())?;
//! let port = config.get("server.port")?;
//! # Ok::<(), tiered_config::ConfigError>(())
//! ```

pub mod argv;
pub mod cli;
pub mod config;
pub mod error;
pub mod handle;
pub mod logging;
pub mod notify;
pub mod path;
pub mod remote;

pub use config::{ConfigLoader, ConfigOptions, fetch_config};
pub use error::{ConfigError, ConfigResult, ErrorCode};
pub use handle::{ConfigHandle, FreezeState};
pub use path::KeyPath;
