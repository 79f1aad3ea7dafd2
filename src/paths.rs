//! XDG-style path utilities for configuration and cache directories.
//!
//! This module provides consistent path resolution across platforms,
//! preferring XDG Base Directory Specification conventions over
//! OS-specific locations.

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "tlstream";

/// Returns the configuration directory for tlstream.
///
/// Resolution order:
/// 1. `$XDG_CONFIG_HOME/tlstream` if `XDG_CONFIG_HOME` is set
/// 2. `~/.config/tlstream` otherwise
pub fn config_dir() -> Result<PathBuf> {
    match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => Ok(PathBuf::from(xdg).join(APP_DIR)),
        _ => Ok(home_dir()?.join(".config").join(APP_DIR)),
    }
}

/// Returns the cache directory for tlstream.
///
/// Resolution order:
/// 1. `$XDG_CACHE_HOME/tlstream` if `XDG_CACHE_HOME` is set
/// 2. `~/.cache/tlstream` otherwise
pub fn cache_dir() -> Result<PathBuf> {
    match std::env::var("XDG_CACHE_HOME") {
        Ok(xdg) if !xdg.is_empty() => Ok(PathBuf::from(xdg).join(APP_DIR)),
        _ => Ok(home_dir()?.join(".cache").join(APP_DIR)),
    }
}

/// Returns the private directory on-device model files are copied into.
pub fn models_dir() -> Result<PathBuf> {
    Ok(cache_dir()?.join("models"))
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Failed to determine home directory")
}
