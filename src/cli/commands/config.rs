//! Settings display and editing.

use anyhow::{Context, Result, bail};

use crate::config::{
    ConfigFile, ConfigManager, DEFAULT_SPLIT_THRESHOLD, DEFAULT_TEMPERATURE, TranslateSettings,
    validate_local_address,
};
use crate::translation::BackendKind;
use crate::ui::Style;

/// Keys accepted by `tlstream config set`.
pub const SETTING_KEYS: &[&str] = &[
    "method",
    "threshold",
    "temperature",
    "prompt",
    "address",
    "model",
    "model-path",
];

pub fn show_config() -> Result<()> {
    let manager = ConfigManager::new()?;
    let config = manager.load_or_default()?;

    println!("{}", Style::header("Configuration"));
    println!("  {}", Style::secondary(manager.config_path().display().to_string()));
    println!();
    print_settings(&config.translate);
    Ok(())
}

fn print_settings(settings: &TranslateSettings) {
    let method = settings.method.map_or_else(
        || format!("{} {}", BackendKind::default(), Style::default_marker()),
        |m| m.to_string(),
    );
    let threshold = settings.split_threshold.map_or_else(
        || format!("{DEFAULT_SPLIT_THRESHOLD} {}", Style::default_marker()),
        |t| t.to_string(),
    );
    let temperature = settings.temperature.map_or_else(
        || format!("{DEFAULT_TEMPERATURE} {}", Style::default_marker()),
        |t| t.to_string(),
    );

    print_row("method", &method);
    print_row("threshold", &threshold);
    print_row("temperature", &temperature);
    print_row("prompt", &summarize(settings.prompt.as_deref()));
    print_row("address", &or_not_set(settings.address.as_deref()));
    print_row("model", &or_not_set(settings.model.as_deref()));
    print_row("model-path", &or_not_set(settings.model_path.as_deref()));
}

fn print_row(key: &str, value: &str) {
    println!("  {:12} {}", Style::label(key), Style::value(value));
}

fn or_not_set(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "(not set)".to_string(),
    }
}

fn summarize(prompt: Option<&str>) -> String {
    match prompt {
        Some(p) if !p.is_empty() => {
            let head: String = p.chars().take(30).collect();
            if p.chars().count() > 30 {
                format!("{head}...")
            } else {
                head
            }
        }
        _ => format!("(built-in) {}", Style::default_marker()),
    }
}

pub fn set_value(key: &str, value: Option<&str>) -> Result<()> {
    let manager = ConfigManager::new()?;
    let mut config = manager.load_or_default()?;

    apply_setting(&mut config, key, value)?;
    manager.save(&config)?;

    println!(
        "{} {} saved to {}",
        Style::success("✓"),
        Style::value(key),
        Style::secondary(manager.config_path().display().to_string())
    );
    Ok(())
}

/// Updates one field of `config`; `None` clears it.
pub fn apply_setting(config: &mut ConfigFile, key: &str, value: Option<&str>) -> Result<()> {
    let settings = &mut config.translate;
    let value = value.map(str::trim).filter(|v| !v.is_empty());

    match key {
        "method" => {
            settings.method = value
                .map(str::parse::<BackendKind>)
                .transpose()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        "threshold" => {
            let threshold = value
                .map(str::parse::<usize>)
                .transpose()
                .context("threshold must be a positive integer")?;
            if threshold == Some(0) {
                bail!("threshold must be a positive integer");
            }
            settings.split_threshold = threshold;
        }
        "temperature" => {
            let temperature = value
                .map(str::parse::<f32>)
                .transpose()
                .context("temperature must be a number")?;
            if temperature.is_some_and(|t| !t.is_finite() || t < 0.0) {
                bail!("temperature must be a non-negative number");
            }
            settings.temperature = temperature;
        }
        "prompt" => settings.prompt = value.map(str::to_string),
        "address" => {
            if let Some(address) = value {
                validate_local_address(address)?;
            }
            settings.address = value.map(str::to_string);
        }
        "model" => settings.model = value.map(str::to_string),
        "model-path" => settings.model_path = value.map(str::to_string),
        other => bail!(
            "Unknown setting: '{other}'\n\nAvailable: {}",
            SETTING_KEYS.join(", ")
        ),
    }

    Ok(())
}
