//! Typed error types for stacknav.
//!
//! Every failure a command can hit is one of these variants, so the hosting
//! layer (CLI or JSON-RPC server) can match on the category and show the
//! human-readable message. None of them is fatal to the process.

use thiserror::Error;

/// Top-level error for trace loading, navigation and export.
#[derive(Debug, Error)]
pub enum TraceError {
    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------
    /// No stack-trace-shaped line was found in the requested scope.
    #[error("no stack trace found")]
    Parse,

    /// The named register does not exist or is empty.
    #[error("register '{0}' is empty or unavailable")]
    UnknownRegister(char),

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------
    /// A navigation or export command ran with nothing loaded.
    #[error("no stack trace loaded")]
    NoTraceLoaded,

    /// `goto_index` outside `1..=len`.
    #[error("frame index {index} out of range (1..={len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Prompted index input was not a number.
    #[error("'{0}' is not a frame index")]
    InvalidIndex(String),

    // -----------------------------------------------------------------------
    // Collaborators
    // -----------------------------------------------------------------------
    #[error(transparent)]
    Resolution(#[from] ResolveError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Deduplication left no resolvable frame to export.
    #[error("no frame of the stack trace could be resolved to a source file")]
    EmptyExport,

    /// The user dismissed an interactive prompt.
    #[error("cancelled")]
    Cancelled,

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure to map a class to its source file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No whitelisted symbol provider is configured or installed.
    #[error("no Java language server is available to resolve classes")]
    NoProviders,

    /// Every provider failed or returned no matching class symbol.
    #[error("class '{class}' not found by any language server")]
    NotFound { class: String },

    /// A matching class symbol was found but none had a usable file location.
    #[error("class '{class}' has no source file location")]
    MissingLocation { class: String },
}

/// Failure of the external deobfuscation filter.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("failed to start deobfuscator '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("deobfuscator I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured command line could not be tokenized.
    #[error("invalid deobfuscator command: {0}")]
    InvalidCommand(String),

    /// The filter exited without printing anything.
    #[error("deobfuscator produced no output")]
    EmptyOutput,

    /// The filter printed text that contains no stack frame.
    #[error("deobfuscator output contains no stack trace")]
    Unparseable,
}

pub type Result<T, E = TraceError> = std::result::Result<T, E>;
