//! Settings file management and the per-call configuration snapshot.

/// Local-network address validation.
pub mod address;

mod manager;

pub use address::validate_local_address;
pub use manager::{
    ConfigFile, ConfigManager, DEFAULT_SPLIT_THRESHOLD, DEFAULT_TEMPERATURE, ResolveOptions,
    ResolvedConfig, TranslateConfig, TranslateSettings, resolve_config,
};
