//! A language server as a [`SymbolProvider`].
//!
//! The server process is started on the first query and lives as long as
//! the provider. A failed start is not retried.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use stacknav_config::ProviderConfig;
use stacknav_lsp::{LspClient, LspError, SymbolInformation};

use super::provider::{ClassSymbol, ProviderError, SymbolKind, SymbolProvider};

pub struct LspSymbolProvider {
    identity: String,
    command: String,
    env: HashMap<String, String>,
    root: PathBuf,
    client: OnceCell<Result<LspClient, String>>,
}

impl LspSymbolProvider {
    pub fn new(
        identity: impl Into<String>,
        command: impl Into<String>,
        env: HashMap<String, String>,
        root: PathBuf,
    ) -> Self {
        Self {
            identity: identity.into(),
            command: command.into(),
            env,
            root,
            client: OnceCell::new(),
        }
    }

    /// Build from a discovered provider record, or `None` when the record
    /// has no run command for this platform.
    pub fn from_config(config: &ProviderConfig, root: PathBuf) -> Option<Self> {
        let command = config.run_command_for_platform()?;
        Some(Self::new(
            config.identity.clone(),
            command,
            config.env.clone(),
            root,
        ))
    }

    async fn client(&self) -> Result<&LspClient, ProviderError> {
        let started = self
            .client
            .get_or_init(|| async {
                LspClient::spawn(&self.command, &self.env, &self.root)
                    .await
                    .map_err(|e| {
                        log::warn!("Language server '{}' failed to start: {e}", self.identity);
                        e.to_string()
                    })
            })
            .await;
        started
            .as_ref()
            .map_err(|reason| ProviderError::Failed(reason.clone()))
    }
}

fn to_class_symbol(symbol: SymbolInformation) -> ClassSymbol {
    ClassSymbol {
        path: symbol.location.as_ref().and_then(|loc| loc.file_path()),
        kind: SymbolKind::from_lsp(symbol.kind),
        name: symbol.name,
        container_name: symbol.container_name,
    }
}

#[async_trait]
impl SymbolProvider for LspSymbolProvider {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn find_class(&self, query: &str) -> Result<Vec<ClassSymbol>, ProviderError> {
        let client = self.client().await?;
        if client.is_closed() {
            return Err(ProviderError::Failed(format!(
                "language server '{}' has exited",
                self.identity
            )));
        }
        let symbols = client
            .workspace_symbol(query)
            .await
            .map_err(|e: LspError| {
                log::warn!("workspace/symbol '{query}' on '{}' failed: {e}", self.identity);
                ProviderError::from(e)
            })?;
        log::debug!(
            "'{}' returned {} symbols for '{query}'",
            self.identity,
            symbols.len()
        );
        Ok(symbols.into_iter().map(to_class_symbol).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stacknav_lsp::Location;

    #[test]
    fn test_symbol_conversion() {
        let symbol = SymbolInformation {
            name: "Thread".to_string(),
            kind: 5,
            container_name: Some("java.lang".to_string()),
            location: Some(Location {
                uri: "jdt://contents/java.base/java.lang/Thread.class".to_string(),
                range: None,
            }),
        };
        let class = to_class_symbol(symbol);
        assert_eq!(class.kind, SymbolKind::Class);
        assert_eq!(class.qualified_name(), "java.lang.Thread");
        assert_eq!(class.path, None);
    }

    #[tokio::test]
    async fn test_missing_server_reports_failure_once() {
        let provider = LspSymbolProvider::new(
            "jdtls",
            "stacknav-no-such-language-server-binary",
            HashMap::new(),
            std::env::temp_dir(),
        );
        assert!(matches!(
            provider.find_class("Foo").await,
            Err(ProviderError::Failed(_))
        ));
        assert!(matches!(
            provider.find_class("Foo").await,
            Err(ProviderError::Failed(_))
        ));
    }
}
