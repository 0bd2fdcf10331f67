//! The `config.yaml` settings file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::providers::KNOWN_PROVIDER_IDENTITIES;

/// Placeholder replaced by the mapping file path in deobfuscator arguments.
pub const MAPPING_PLACEHOLDER: &str = "{mapping}";

/// Log verbosity selectable from the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the `log` crate's level filter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Severity attached to exported diagnostics-list entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
    Hint,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        };
        f.write_str(name)
    }
}

/// External deobfuscation filter (ProGuard/R8 `retrace` by default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeobfuscatorConfig {
    /// Program to run, split with shell-words rules (no shell is involved).
    pub command: String,
    /// Extra arguments; `{mapping}` is replaced by the mapping file path.
    pub args: Vec<String>,
}

impl Default for DeobfuscatorConfig {
    fn default() -> Self {
        Self {
            command: "retrace".to_string(),
            args: vec![MAPPING_PLACEHOLDER.to_string()],
        }
    }
}

/// Diagnostics-list export settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub severity: Severity,
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    /// Root handed to language servers; the current directory when unset.
    pub workspace_root: Option<PathBuf>,
    pub deobfuscator: DeobfuscatorConfig,
    pub diagnostics: DiagnosticsConfig,
    /// Provider identities to start, in query order.
    pub providers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            workspace_root: None,
            deobfuscator: DeobfuscatorConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            providers: KNOWN_PROVIDER_IDENTITIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when the file
    /// does not exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);

        if !config_path.exists() {
            log::info!("No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    /// Load and validate a specific YAML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(ConfigError::from)?;
        let config = Self::from_yaml(&contents)?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse and validate YAML text. An empty document yields the defaults.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml_ng::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a later command fail in a confusing way.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deobfuscator.command.trim().is_empty() {
            return Err(ConfigError::Validation(
                "deobfuscator.command must not be empty".to_string(),
            ));
        }
        for identity in &self.providers {
            if !KNOWN_PROVIDER_IDENTITIES.contains(&identity.as_str()) {
                log::warn!(
                    "providers: '{identity}' is not a recognized Java language server and will be ignored"
                );
            }
        }
        Ok(())
    }

    /// Directory holding `config.yaml` and `providers/`.
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("stacknav")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            // XDG convention on all platforms: ~/.config/stacknav
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("stacknav")
            } else {
                PathBuf::from(".")
            }
        }
    }

    /// Path of the settings file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Workspace root for language servers.
    pub fn resolved_workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
