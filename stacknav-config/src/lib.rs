//! Configuration system for stacknav.
//!
//! - [`config`] - the `config.yaml` settings file (logging, deobfuscator,
//!   diagnostics severity, enabled providers)
//! - [`providers`] - TOML records describing the Java language servers used
//!   for class lookup, and the identity whitelist
//! - [`error`] - typed [`ConfigError`]

pub mod config;
pub mod error;
pub mod providers;

pub use config::{
    Config, DeobfuscatorConfig, DiagnosticsConfig, LogLevel, MAPPING_PLACEHOLDER, Severity,
};
pub use error::ConfigError;
pub use providers::{
    KNOWN_PROVIDER_IDENTITIES, ProviderConfig, discover_providers, is_known_identity,
    resolve_binary_in_path,
};
