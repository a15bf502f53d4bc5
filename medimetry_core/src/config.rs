//! Configuration file support for Medimetry.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/medimetry/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Short names mapped to registered formula names
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,
}

/// Result rendering
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::Config(format!("Unknown output format '{}'", other))),
        }
    }
}

/// Output configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Decimal places shown in text output
    #[serde(default = "default_precision")]
    pub precision: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            precision: default_precision(),
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_precision() -> usize {
    2
}

fn default_log_level() -> String {
    "warn".into()
}

fn default_aliases() -> BTreeMap<String, String> {
    [
        ("qtc", "qtc_bazett"),
        ("bsa", "bsa_mosteller"),
        ("egfr", "ckd_epi_2021"),
    ]
    .into_iter()
    .map(|(alias, name)| (alias.to_string(), name.to_string()))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            aliases: default_aliases(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            Some(config_path) => {
                tracing::info!("No config file found at {:?}, using defaults", config_path);
                Ok(Self::new())
            }
            None => {
                tracing::info!("No config directory available, using defaults");
                Ok(Self::new())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("medimetry").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.output.precision > 10 {
            return Err(Error::Config(format!(
                "output.precision must be at most 10, got {}",
                self.output.precision
            )));
        }
        Ok(())
    }

    /// Resolve an alias to a formula name; unknown names pass through
    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.output.precision, 2);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.resolve_alias("qtc"), "qtc_bazett");
        assert_eq!(config.resolve_alias("egfr"), "ckd_epi_2021");
        assert_eq!(config.resolve_alias("bmi"), "bmi");
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::new();
        config.output.format = OutputFormat::Json;
        config.aliases.insert("map".into(), "mean_arterial_pressure".into());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[output]
precision = 1
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.precision, 1);
        assert_eq!(config.output.format, OutputFormat::Text); // default
        assert_eq!(config.resolve_alias("bsa"), "bsa_mosteller"); // default
    }

    #[test]
    fn test_aliases_replace_defaults() {
        let toml_str = r#"
[aliases]
qtc = "qtc_fridericia"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.resolve_alias("qtc"), "qtc_fridericia");
        assert_eq!(config.resolve_alias("bsa"), "bsa");
    }

    #[test]
    fn test_invalid_precision_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[output]\nprecision = 50\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert!(toml::from_str::<Config>("[output]\nformat = \"yaml\"\n").is_err());
    }
}
