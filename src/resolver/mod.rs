//! Cached, concurrent class-to-source-file resolution.
//!
//! Sub-modules:
//! - [`provider`] - `SymbolProvider` trait, `ClassSymbol`, `ProviderError`
//! - [`cache`]    - `ResolutionCache`
//! - [`lsp`]      - `LspSymbolProvider`, a language server behind the trait

pub mod cache;
pub mod lsp;
pub mod provider;

use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;

pub use cache::{CacheKey, ResolutionCache};
pub use lsp::LspSymbolProvider;
pub use provider::{ClassSymbol, ProviderError, SymbolKind, SymbolProvider};

use crate::error::ResolveError;
use crate::trace::{Frame, outer_class_name};
use stacknav_config::is_known_identity;

/// Maps frames to source files through whitelisted symbol providers.
pub struct Resolver {
    providers: Vec<Arc<dyn SymbolProvider>>,
    cache: ResolutionCache,
}

impl Resolver {
    /// Build a resolver over `providers`, dropping any whose identity is not
    /// a recognized Java language server.
    pub fn new(providers: Vec<Arc<dyn SymbolProvider>>) -> Self {
        let providers = providers
            .into_iter()
            .filter(|p| {
                let known = is_known_identity(p.identity());
                if !known {
                    log::warn!("Ignoring unrecognized symbol provider '{}'", p.identity());
                }
                known
            })
            .collect();
        Self {
            providers,
            cache: ResolutionCache::new(),
        }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolve the source file for `frame`.
    ///
    /// All providers are queried at once; the first acceptable answer wins.
    /// Queries still running at that point are left to finish on their own
    /// and their results are discarded.
    pub async fn resolve(&self, frame: &Frame) -> Result<PathBuf, ResolveError> {
        let class = outer_class_name(&frame.class_name).to_string();
        let key = ResolutionCache::key(&class, frame.file_name.expected());
        if let Some(path) = self.cache.get(&key) {
            log::trace!("Resolver cache hit for {class}");
            return Ok(path);
        }
        if self.providers.is_empty() {
            return Err(ResolveError::NoProviders);
        }

        let query = class.rsplit('.').next().unwrap_or(&class).to_string();
        let mut pending: FuturesUnordered<_> = self
            .providers
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                let query = query.clone();
                tokio::spawn(async move {
                    let result = provider.find_class(&query).await;
                    (provider.identity().to_string(), result)
                })
            })
            .collect();

        let mut matched_without_location = false;
        while let Some(joined) = pending.next().await {
            let (identity, result) = match joined {
                Ok(answer) => answer,
                Err(e) => {
                    log::error!("Symbol query task failed: {e}");
                    continue;
                }
            };
            let symbols = match result {
                Ok(symbols) => symbols,
                Err(e) => {
                    log::warn!("Provider '{identity}' failed to look up {class}: {e}");
                    continue;
                }
            };
            for symbol in symbols.iter().filter(|s| s.is_class_named(&class)) {
                match &symbol.path {
                    Some(path) => {
                        log::debug!("Resolved {class} to {} via {identity}", path.display());
                        self.cache.insert(key, path);
                        return Ok(path.clone());
                    }
                    None => matched_without_location = true,
                }
            }
        }

        if matched_without_location {
            Err(ResolveError::MissingLocation { class })
        } else {
            Err(ResolveError::NotFound { class })
        }
    }
}
