//! Colour helpers for CLI output, built on owo-colors.

use owo_colors::OwoColorize;
use std::fmt::Display;

/// Semantic styles shared by all commands.
pub struct Style;

impl Style {
    /// Section headers such as "Configuration".
    pub fn header<T: Display>(text: T) -> String {
        format!("{}", text.bold())
    }

    /// Setting names.
    pub fn label<T: Display>(text: T) -> String {
        format!("{}", text.dimmed())
    }

    /// Setting values.
    pub fn value<T: Display>(text: T) -> String {
        format!("{}", text.cyan())
    }

    /// Paths and other supplementary details.
    pub fn secondary<T: Display>(text: T) -> String {
        format!("{}", text.dimmed())
    }

    pub fn success<T: Display>(text: T) -> String {
        format!("{}", text.green())
    }

    pub fn error<T: Display>(text: T) -> String {
        format!("{}", text.red().bold())
    }

    pub fn warning<T: Display>(text: T) -> String {
        format!("{}", text.yellow())
    }

    /// Marker shown next to a built-in fallback value.
    pub fn default_marker() -> String {
        format!("{}", "(default)".dimmed())
    }
}
