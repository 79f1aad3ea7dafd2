use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::paths;
use crate::translation::{BackendKind, DEFAULT_SYSTEM_PROMPT};

/// Default chunk size, in characters.
pub const DEFAULT_SPLIT_THRESHOLD: usize = 1500;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Settings in the `[translate]` section of config.toml.
///
/// Every field is optional; missing values fall back to built-in defaults
/// when the snapshot is taken.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateSettings {
    /// Backend selection. Accepts `"on-device"`, `"remote"` or the legacy
    /// numeric values `0` and `1`.
    #[serde(default, deserialize_with = "deserialize_method")]
    pub method: Option<BackendKind>,
    /// Maximum characters sent to the backend per request.
    pub split_threshold: Option<usize>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// System prompt.
    pub prompt: Option<String>,
    /// Remote endpoint as `host:port`.
    pub address: Option<String>,
    /// Remote model identifier.
    pub model: Option<String>,
    /// Locator of the on-device model asset (path or `file://` URL).
    pub model_path: Option<String>,
}

/// The complete configuration file structure.
///
/// Corresponds to `~/.config/tlstream/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub translate: TranslateSettings,
}

fn deserialize_method<'de, D>(deserializer: D) -> Result<Option<BackendKind>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Code(i64),
        Name(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Code(code)) => BackendKind::from_method(code)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown method code {code}"))),
        Some(Repr::Name(name)) => name.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Immutable settings snapshot handed to one `translate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateConfig {
    /// Maximum characters per chunk.
    pub split_threshold: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Remote endpoint as `host:port`.
    pub address: String,
    /// Remote model identifier.
    pub model_name: String,
    /// System prompt.
    pub system_prompt: String,
    /// Locator of the on-device model asset.
    pub model_locator: Option<String>,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
            temperature: DEFAULT_TEMPERATURE,
            address: String::new(),
            model_name: String::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model_locator: None,
        }
    }
}

/// Resolved configuration after merging CLI arguments and config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// The backend to dispatch to.
    pub method: BackendKind,
    /// The settings snapshot.
    pub config: TranslateConfig,
}

/// Options for resolving configuration.
///
/// Contains CLI overrides that take precedence over config file values.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub method: Option<BackendKind>,
    pub split_threshold: Option<usize>,
    pub temperature: Option<f32>,
    pub prompt: Option<String>,
    pub address: Option<String>,
    pub model: Option<String>,
    pub model_path: Option<String>,
}

/// Resolves configuration by merging CLI options with config file settings.
///
/// CLI options take precedence over config file values, which take
/// precedence over built-in defaults. Missing addresses or model paths are
/// not rejected here: the backend reports them when it is actually used.
///
/// # Errors
///
/// Returns an error if the split threshold is zero or the temperature is
/// negative or not finite.
pub fn resolve_config(
    options: &ResolveOptions,
    config_file: &ConfigFile,
) -> Result<ResolvedConfig> {
    let file = &config_file.translate;
    let defaults = TranslateConfig::default();

    let method = options.method.or(file.method).unwrap_or_default();

    let split_threshold = options
        .split_threshold
        .or(file.split_threshold)
        .unwrap_or(defaults.split_threshold);
    if split_threshold == 0 {
        bail!(
            "Invalid configuration: 'split_threshold' must be a positive integer\n\n\
             Please fix it via:\n  \
             - CLI option: tlstream --threshold <n>\n  \
             - Config file: ~/.config/tlstream/config.toml"
        );
    }

    let temperature = options
        .temperature
        .or(file.temperature)
        .unwrap_or(defaults.temperature);
    if !temperature.is_finite() || temperature < 0.0 {
        bail!(
            "Invalid configuration: 'temperature' must be a non-negative number, \
             got {temperature}"
        );
    }

    let pick = |cli: &Option<String>, file: &Option<String>| {
        cli.as_ref().or(file.as_ref()).cloned().filter(|v| !v.is_empty())
    };

    Ok(ResolvedConfig {
        method,
        config: TranslateConfig {
            split_threshold,
            temperature,
            address: pick(&options.address, &file.address).unwrap_or_default(),
            model_name: pick(&options.model, &file.model).unwrap_or_default(),
            system_prompt: pick(&options.prompt, &file.prompt).unwrap_or(defaults.system_prompt),
            model_locator: pick(&options.model_path, &file.model_path),
        },
    })
}

/// Manages loading and saving configuration files.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager.
    ///
    /// Configuration is stored at `$XDG_CONFIG_HOME/tlstream/config.toml`
    /// or `~/.config/tlstream/config.toml` if `XDG_CONFIG_HOME` is not set.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_path: paths::config_dir()?.join("config.toml"),
        })
    }

    /// Creates a config manager for an explicit file.
    pub const fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub const fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn load(&self) -> Result<ConfigFile> {
        let contents = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;

        let config_file: ConfigFile =
            toml::from_str(&contents).with_context(|| "Failed to parse config file")?;

        Ok(config_file)
    }

    pub fn save(&self, config: &ConfigFile) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

        crate::fs::atomic_write(&self.config_path, &contents).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;

        Ok(())
    }

    /// Loads the config file, falling back to defaults if it is missing.
    ///
    /// A file that exists but cannot be parsed is still an error.
    pub fn load_or_default(&self) -> Result<ConfigFile> {
        if self.config_path.exists() {
            self.load()
        } else {
            Ok(ConfigFile::default())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_manager(temp_dir: &TempDir) -> ConfigManager {
        ConfigManager::with_path(temp_dir.path().join("config.toml"))
    }

    fn create_test_config() -> ConfigFile {
        ConfigFile {
            translate: TranslateSettings {
                method: Some(BackendKind::Remote),
                split_threshold: Some(800),
                temperature: Some(0.3),
                prompt: Some("Translate to Japanese.".to_string()),
                address: Some("192.168.1.20:1234".to_string()),
                model: Some("gemma-3-12b".to_string()),
                model_path: Some("/models/gemma.task".to_string()),
            },
        }
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_test_manager(&temp_dir);

        manager.save(&create_test_config()).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.translate.method, Some(BackendKind::Remote));
        assert_eq!(loaded.translate.split_threshold, Some(800));
        assert_eq!(
            loaded.translate.address,
            Some("192.168.1.20:1234".to_string())
        );
    }

    #[test]
    fn test_load_nonexistent_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_test_manager(&temp_dir);

        assert!(manager.load().is_err());
        let config = manager.load_or_default().unwrap();
        assert!(config.translate.method.is_none());
    }

    #[test]
    fn test_load_or_default_rejects_broken_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_test_manager(&temp_dir);
        fs::write(manager.config_path(), "[translate\nmethod = ").unwrap();

        assert!(manager.load_or_default().is_err());
    }

    #[test]
    fn test_method_accepts_legacy_numbers() {
        let config: ConfigFile = toml::from_str("[translate]\nmethod = 0\n").unwrap();
        assert_eq!(config.translate.method, Some(BackendKind::OnDevice));

        let config: ConfigFile = toml::from_str("[translate]\nmethod = 1\n").unwrap();
        assert_eq!(config.translate.method, Some(BackendKind::Remote));

        assert!(toml::from_str::<ConfigFile>("[translate]\nmethod = 7\n").is_err());
    }

    #[test]
    fn test_method_accepts_names() {
        let config: ConfigFile = toml::from_str("[translate]\nmethod = \"on-device\"\n").unwrap();
        assert_eq!(config.translate.method, Some(BackendKind::OnDevice));
    }

    #[test]
    fn test_resolve_config_defaults() {
        let resolved = resolve_config(&ResolveOptions::default(), &ConfigFile::default()).unwrap();

        assert_eq!(resolved.method, BackendKind::Remote);
        assert_eq!(resolved.config, TranslateConfig::default());
        assert_eq!(resolved.config.split_threshold, 1500);
        assert!((resolved.config.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_resolve_config_falls_back_to_file() {
        let resolved = resolve_config(&ResolveOptions::default(), &create_test_config()).unwrap();

        assert_eq!(resolved.config.split_threshold, 800);
        assert_eq!(resolved.config.address, "192.168.1.20:1234");
        assert_eq!(resolved.config.model_name, "gemma-3-12b");
        assert_eq!(resolved.config.system_prompt, "Translate to Japanese.");
        assert_eq!(
            resolved.config.model_locator.as_deref(),
            Some("/models/gemma.task")
        );
    }

    #[test]
    fn test_resolve_config_cli_overrides_file() {
        let options = ResolveOptions {
            method: Some(BackendKind::OnDevice),
            split_threshold: Some(200),
            address: Some("10.0.0.5:8080".to_string()),
            ..ResolveOptions::default()
        };

        let resolved = resolve_config(&options, &create_test_config()).unwrap();

        assert_eq!(resolved.method, BackendKind::OnDevice);
        assert_eq!(resolved.config.split_threshold, 200);
        assert_eq!(resolved.config.address, "10.0.0.5:8080");
        assert_eq!(resolved.config.model_name, "gemma-3-12b");
    }

    #[test]
    fn test_resolve_config_empty_prompt_uses_default() {
        let mut file = create_test_config();
        file.translate.prompt = Some(String::new());

        let resolved = resolve_config(&ResolveOptions::default(), &file).unwrap();
        assert_eq!(resolved.config.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_resolve_config_rejects_zero_threshold() {
        let options = ResolveOptions {
            split_threshold: Some(0),
            ..ResolveOptions::default()
        };

        let result = resolve_config(&options, &ConfigFile::default());
        assert!(result.unwrap_err().to_string().contains("split_threshold"));
    }

    #[test]
    fn test_resolve_config_rejects_negative_temperature() {
        let options = ResolveOptions {
            temperature: Some(-1.0),
            ..ResolveOptions::default()
        };

        let result = resolve_config(&options, &ConfigFile::default());
        assert!(result.unwrap_err().to_string().contains("temperature"));
    }
}
