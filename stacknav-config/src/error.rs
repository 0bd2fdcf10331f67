//! Typed error variants for the stacknav-config crate.
//!
//! `Config::load` and `Config::load_from` return `anyhow::Result` for callers
//! that only want a message, but every failure originates as a `ConfigError`
//! so library consumers can downcast and match on the failure mode.
//!
//! # Example
//!
//! ```rust,no_run
//! use stacknav_config::ConfigError;
//!
//! fn check_load_err(e: &anyhow::Error) {
//!     if let Some(cfg_err) = e.downcast_ref::<ConfigError>() {
//!         match cfg_err {
//!             ConfigError::Io(io) => eprintln!("I/O error: {io}"),
//!             ConfigError::Parse(p) => eprintln!("YAML parse error: {p}"),
//!             ConfigError::Toml { path, .. } => eprintln!("bad provider file {path}"),
//!             ConfigError::Validation(msg) => eprintln!("Validation: {msg}"),
//!         }
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors that can occur when loading configuration or provider records.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred reading the config file.
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file contained invalid YAML.
    #[error("YAML parse error in config: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// A provider record contained invalid TOML.
    #[error("TOML parse error in provider file '{path}': {source}")]
    Toml {
        /// Path (or `<embedded>`) of the offending record.
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A field value failed semantic validation.
    ///
    /// The inner string describes which field is invalid and why.
    #[error("Config validation error: {0}")]
    Validation(String),
}
