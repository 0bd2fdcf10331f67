//! The symbol-provider seam the resolver queries.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Symbol kinds the resolver distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Class,
    Interface,
    Enum,
    Other(u32),
}

impl SymbolKind {
    /// Map an LSP `SymbolKind` number.
    pub fn from_lsp(kind: u32) -> Self {
        use stacknav_lsp::symbol_kind;
        match kind {
            symbol_kind::CLASS => SymbolKind::Class,
            symbol_kind::INTERFACE => SymbolKind::Interface,
            symbol_kind::ENUM => SymbolKind::Enum,
            other => SymbolKind::Other(other),
        }
    }
}

/// One symbol returned by a provider's class search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSymbol {
    pub name: String,
    pub container_name: Option<String>,
    pub kind: SymbolKind,
    /// Source file, when the location is a local file.
    pub path: Option<PathBuf>,
}

impl ClassSymbol {
    /// `container.name`, or `name` alone when there is no container.
    pub fn qualified_name(&self) -> String {
        match self.container_name.as_deref() {
            Some(container) if !container.is_empty() => format!("{container}.{}", self.name),
            _ => self.name.clone(),
        }
    }

    /// Whether this symbol is the class `outer_class_name`. A symbol without
    /// a container only matches by its simple name.
    pub fn is_class_named(&self, outer_class_name: &str) -> bool {
        self.kind == SymbolKind::Class && self.qualified_name() == outer_class_name
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Lsp(#[from] stacknav_lsp::LspError),

    #[error("{0}")]
    Failed(String),
}

/// Something that can answer "which symbols are named like this class".
#[async_trait]
pub trait SymbolProvider: Send + Sync {
    /// Provider identity; only whitelisted identities are queried.
    fn identity(&self) -> &str;

    /// Search for symbols matching `query` (a simple class name).
    async fn find_class(&self, query: &str) -> Result<Vec<ClassSymbol>, ProviderError>;
}
