//! Shared integration test helpers for stacknav.
//!
//! Include with `mod common;` at the top of a test file. The
//! `#![allow(dead_code)]` keeps files that use only some helpers quiet.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use stacknav::resolver::{ClassSymbol, ProviderError, SymbolKind, SymbolProvider};
use stacknav::{Deobfuscator, Resolver, Session};
use stacknav_config::{DeobfuscatorConfig, Severity};

/// A trace with one cause, an elision and a blank-free layout.
///
/// Line numbers: header 1, frames 2-4, `Caused by:` 5, frames 6-7, elision 8.
pub const CHAINED_TRACE: &str = "\
java.lang.RuntimeException: wrapper
\tat com.example.app.Service.handle(Service.java:42)
\tat com.example.app.Controller.dispatch(Controller.java:17)
\tat com.example.app.Main.main(Main.java:8)
Caused by: java.io.IOException: disk full
\tat com.example.io.Writer.flush(Writer.java:99)
\tat com.example.io.Writer$Buffer.close(Writer.java:120)
\t... 3 more
";

/// Provider identity on the whitelist.
pub const JDTLS: &str = "jdtls";

/// A class symbol with a source file.
pub fn class_symbol(qualified: &str, path: &str) -> ClassSymbol {
    let (container, name) = match qualified.rsplit_once('.') {
        Some((container, name)) => (Some(container.to_string()), name.to_string()),
        None => (None, qualified.to_string()),
    };
    ClassSymbol {
        name,
        container_name: container,
        kind: SymbolKind::Class,
        path: Some(PathBuf::from(path)),
    }
}

/// Answers class queries from a fixed table keyed by simple name and counts
/// every query.
pub struct MockProvider {
    identity: String,
    symbols: HashMap<String, Vec<ClassSymbol>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(identity: &str) -> Self {
        Self {
            identity: identity.to_string(),
            symbols: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_class(mut self, qualified: &str, path: &str) -> Self {
        let symbol = class_symbol(qualified, path);
        self.symbols
            .entry(symbol.name.clone())
            .or_default()
            .push(symbol);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SymbolProvider for MockProvider {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn find_class(&self, query: &str) -> Result<Vec<ClassSymbol>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.symbols.get(query).cloned().unwrap_or_default())
    }
}

/// A provider that knows every class in [`CHAINED_TRACE`] except `Main`.
pub fn sample_provider() -> Arc<MockProvider> {
    Arc::new(
        MockProvider::new(JDTLS)
            .with_class("com.example.app.Service", "/src/app/Service.java")
            .with_class("com.example.app.Controller", "/src/app/Controller.java")
            .with_class("com.example.io.Writer", "/src/io/Writer.java"),
    )
}

pub fn resolver_with(provider: Arc<MockProvider>) -> Arc<Resolver> {
    Arc::new(Resolver::new(vec![provider as Arc<dyn SymbolProvider>]))
}

pub fn session_with(resolver: Arc<Resolver>) -> Session {
    Session::new(resolver, Deobfuscator::default(), Severity::Error)
}

/// A session whose deobfuscator runs `command` with `args`.
pub fn session_with_filter(command: &str, args: &[&str]) -> Session {
    let config = DeobfuscatorConfig {
        command: command.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
    };
    Session::new(
        Arc::new(Resolver::new(Vec::new())),
        Deobfuscator::new(&config),
        Severity::Error,
    )
}
