//! Configuration management for vnpatch.
//!
//! Handles loading, saving, and validating configuration from a TOML file,
//! either at an explicit path or in the platform-specific config directory.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config directory.
const APP_NAME: &str = "vnpatch";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input/output directories and cache location.
    pub paths: PathsConfig,

    /// Translation backend and worker settings.
    pub translation: TranslationConfig,

    /// Which files count as scripts and which lines are left alone.
    pub scripts: ScriptsConfig,

    /// External archive packager.
    pub packaging: PackagingConfig,
}

/// File path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the extracted game files.
    pub input: PathBuf,

    /// Root of the mirrored, translated tree.
    pub output: PathBuf,

    /// JSON file holding previously obtained translations.
    pub cache_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input"),
            output: PathBuf::from("output"),
            cache_file: PathBuf::from("translation_cache.json"),
        }
    }
}

/// Translation behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Target language code passed to the backend (e.g. "es", "en").
    pub target_language: String,

    /// Source language code; "auto" lets the backend detect it.
    pub source_language: String,

    /// Number of files processed concurrently.
    pub workers: usize,

    /// Upper bound for a single backend call, in seconds.
    pub timeout_secs: u64,

    /// Base URL of the translation web endpoint.
    pub endpoint: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_language: "es".to_string(),
            source_language: "auto".to_string(),
            workers: 8,
            timeout_secs: 20,
            endpoint: "https://translate.google.com/m".to_string(),
        }
    }
}

impl TranslationConfig {
    /// Returns the backend timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Script classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// File extensions (without dot, case-insensitive) treated as scripts.
    pub extensions: Vec<String>,

    /// Leading characters marking comment, label and command lines.
    pub control_prefixes: Vec<String>,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["ks".to_string(), "tjs".to_string(), "scn".to_string()],
            control_prefixes: vec![
                "@".to_string(),
                ";".to_string(),
                "*".to_string(),
                "#".to_string(),
            ],
        }
    }
}

/// External packaging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingConfig {
    /// Packager script; packaging is skipped when it does not exist.
    pub script: PathBuf,

    /// Name of the archive to produce.
    pub archive: String,

    /// Program used to run the script, looked up on PATH.
    pub interpreter: String,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::from("xp3.py"),
            archive: "patch.xp3".to_string(),
            interpreter: "python".to_string(),
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            // Create default config
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.translation.target_language.trim().is_empty() {
            return Err(ConfigError::MissingValue(
                "translation.target_language".to_string(),
            ));
        }

        if self.translation.workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "translation.workers".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.translation.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "translation.timeout_secs".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.scripts.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "scripts.extensions".to_string(),
                message: "at least one script extension is required".to_string(),
            });
        }

        Ok(())
    }
}
