//! Subcommand implementations.

/// Settings display and editing.
pub mod config;

/// Translation command handler.
pub mod translate;
