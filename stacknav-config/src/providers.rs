//! Language-server provider records.
//!
//! A provider is a Java language server that can answer class-symbol queries.
//! Only the identities in [`KNOWN_PROVIDER_IDENTITIES`] are ever started;
//! records for anything else are dropped during discovery.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Provider identities recognized as Java language servers.
pub const KNOWN_PROVIDER_IDENTITIES: &[&str] = &["jdtls", "java-language-server"];

/// Whether `identity` is on the provider whitelist.
pub fn is_known_identity(identity: &str) -> bool {
    KNOWN_PROVIDER_IDENTITIES.contains(&identity)
}

/// Provider configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub identity: String,
    pub name: String,
    #[serde(default)]
    pub active: Option<bool>,
    pub run_command: HashMap<String, String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Whether the server binary was found in PATH during discovery.
    /// Populated by [`discover_providers`], not deserialized.
    #[serde(skip)]
    pub installed: bool,
}

impl ProviderConfig {
    /// Returns the run command for the current platform.
    /// Falls back to the wildcard `"*"` entry if the platform-specific key is absent.
    pub fn run_command_for_platform(&self) -> Option<&str> {
        let platform = if cfg!(target_os = "macos") {
            "macos"
        } else if cfg!(target_os = "windows") {
            "windows"
        } else {
            "linux"
        };
        self.run_command
            .get(platform)
            .or_else(|| self.run_command.get("*"))
            .map(|s| s.as_str())
    }

    /// Returns whether this provider is active. Defaults to `true` if not specified.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }

    /// Check if the run command binary exists in `PATH` and update
    /// [`installed`](Self::installed).
    pub fn detect_installed(&mut self) {
        self.installed = self
            .run_command_for_platform()
            .and_then(|cmd| cmd.split_whitespace().next())
            .is_some_and(|binary| resolve_binary_in_path(binary).is_some());
    }
}

/// Resolve a binary name to its absolute path by searching `PATH`.
pub fn resolve_binary_in_path(binary: &str) -> Option<PathBuf> {
    resolve_binary_in_path_str(binary, &std::env::var("PATH").ok()?)
}

/// Resolve a binary name to its absolute path by searching the given PATH string.
pub fn resolve_binary_in_path_str(binary: &str, path_var: &str) -> Option<PathBuf> {
    if binary.is_empty() {
        return None;
    }
    let path = Path::new(binary);
    if path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }
    std::env::split_paths(path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// Default provider records embedded at compile time.
const EMBEDDED_PROVIDERS: &[&str] = &[
    r#"
identity = "jdtls"
name = "Eclipse JDT Language Server"

[run_command]
"*" = "jdtls"
"#,
    r#"
identity = "java-language-server"
name = "Java Language Server"

[run_command]
"*" = "java-language-server"
"#,
];

/// Parse a single provider record.
pub fn parse_provider(source: &str, origin: &str) -> Result<ProviderConfig, ConfigError> {
    toml::from_str::<ProviderConfig>(source).map_err(|source| ConfigError::Toml {
        path: origin.to_string(),
        source,
    })
}

/// Discover providers from the embedded defaults and `<user_config_dir>/providers/`.
///
/// User records override embedded ones with the same identity. Inactive
/// records and identities outside the whitelist are filtered out.
pub fn discover_providers(user_config_dir: &Path) -> Vec<ProviderConfig> {
    let mut providers = Vec::new();

    for embedded in EMBEDDED_PROVIDERS {
        match parse_provider(embedded, "<embedded>") {
            Ok(config) => providers.push(config),
            Err(e) => log::error!("{e}"),
        }
    }

    load_providers_from_dir(&user_config_dir.join("providers"), &mut providers);

    providers.retain(|p| {
        if !is_known_identity(&p.identity) {
            log::warn!(
                "Ignoring provider '{}': not a recognized Java language server",
                p.identity
            );
            return false;
        }
        p.is_active()
    });

    for provider in &mut providers {
        provider.detect_installed();
    }

    providers
}

/// Load all `.toml` provider files from a directory.
/// If a provider with the same identity already exists in the list, it is replaced.
fn load_providers_from_dir(dir: &Path, providers: &mut Vec<ProviderConfig>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "toml") {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                log::error!("Failed to read provider config {}: {e}", path.display());
                continue;
            }
        };
        match parse_provider(&content, &path.display().to_string()) {
            Ok(config) => {
                providers.retain(|p| p.identity != config.identity);
                providers.push(config);
            }
            Err(e) => log::error!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_providers_parse_and_are_known() {
        for (i, source) in EMBEDDED_PROVIDERS.iter().enumerate() {
            let config = parse_provider(source, "<embedded>")
                .unwrap_or_else(|e| panic!("Embedded provider {i} failed to parse: {e}"));
            assert!(is_known_identity(&config.identity));
            assert!(config.run_command_for_platform().is_some());
            assert!(config.is_active());
        }
    }

    #[test]
    fn test_unknown_identity_is_rejected_by_whitelist() {
        assert!(is_known_identity("jdtls"));
        assert!(is_known_identity("java-language-server"));
        assert!(!is_known_identity("rust-analyzer"));
    }

    #[test]
    fn test_bad_toml_reports_origin() {
        let err = parse_provider("identity = ", "custom.toml").unwrap_err();
        match err {
            ConfigError::Toml { path, .. } => assert_eq!(path, "custom.toml"),
            other => panic!("expected Toml error, got {other:?}"),
        }
    }

    #[test]
    fn test_user_override_and_whitelist() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let dir = tmp_dir.path().join("providers");
        std::fs::create_dir_all(&dir).unwrap();

        std::fs::write(
            dir.join("jdtls.toml"),
            r#"
identity = "jdtls"
name = "JDT LS (custom)"

[run_command]
"*" = "jdtls -data /tmp/jdtls-ws"
"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("other.toml"),
            r#"
identity = "kotlin-language-server"
name = "Kotlin"

[run_command]
"*" = "kotlin-language-server"
"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("jls.toml"),
            r#"
identity = "java-language-server"
name = "JLS"
active = false

[run_command]
"*" = "java-language-server"
"#,
        )
        .unwrap();

        let providers = discover_providers(tmp_dir.path());
        let identities: Vec<&str> = providers.iter().map(|p| p.identity.as_str()).collect();
        assert_eq!(identities, vec!["jdtls"]);
        assert_eq!(providers[0].name, "JDT LS (custom)");
        assert_eq!(
            providers[0].run_command_for_platform(),
            Some("jdtls -data /tmp/jdtls-ws")
        );
    }

    #[test]
    fn test_resolve_binary_in_path_str() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let bin = tmp_dir.path().join("fake-jdtls");
        std::fs::write(&bin, "#!/bin/sh\n").unwrap();
        let path_var = tmp_dir.path().display().to_string();
        assert_eq!(resolve_binary_in_path_str("fake-jdtls", &path_var), Some(bin));
        assert_eq!(resolve_binary_in_path_str("missing-binary", &path_var), None);
        assert_eq!(resolve_binary_in_path_str("", &path_var), None);
    }
}
