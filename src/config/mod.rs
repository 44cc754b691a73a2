//! Layered configuration resolution.
//!
//! Composes ranked sources into one tree. Highest precedence first:
//! 1. **Seed** - in-code overrides
//! 2. **CLI** - `--key value` arguments, dotted keys expanded
//! 3. **`--config <file>`** - an explicit JSON file
//! 4. **Datacenter** - `{ "datacenter": <id> }`
//! 5. **Staging** - `staging.<dc>.json`, `staging.json`
//! 6. **Tier** - `<tier>.<dc>.json`, secrets, `<tier>.json`
//! 7. **Common** - `common.json`
//! 8. **Defaults** - in-code fallbacks
//!
//! ## Merge Strategy
//! - Mappings: deep merge field-by-field
//! - Sequences and scalars: replaced by the higher-precedence source
//!
//! ## Environment Variables
//! - `APP_ENV` - env tier, read only by [`ConfigOptions::from_env`]

mod datacenter;
mod files;
mod loader;
mod merge;
mod options;
mod replace;
mod sources;

pub use datacenter::{DatacenterState, resolve_datacenter};
pub use files::{LocalFiles, SourceFiles, read_json_source};
pub use loader::{ConfigLoader, fetch_config};
pub use merge::{deep_merge, merge_chain};
pub use options::{ConfigOptions, ENV_TIER_VAR, PRODUCTION_TIER};
pub use replace::{Pattern, ReplacementRule, Replacements, apply_replacements, parse_rules};
pub use sources::{
    CONFIG_DIR, RankedSource, ResolutionContext, ResolvedSource, Source, SourceChainResolver,
    SourceKind, check_name_component, expand_flat, strip_blacklist,
};
