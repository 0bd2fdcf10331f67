//! Error type for the language-server client.

use thiserror::Error;

use crate::jsonrpc::RpcError;

#[derive(Debug, Error)]
pub enum LspError {
    /// The configured run command was empty or could not be tokenized.
    #[error("invalid server command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },

    /// The server process could not be started.
    #[error("failed to spawn language server '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("language server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("language server sent invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The `Content-Length` framing was malformed.
    #[error("language server framing error: {0}")]
    Framing(String),

    /// The server answered with a JSON-RPC error object.
    #[error("language server returned {0}")]
    Rpc(RpcError),

    /// The server closed its output before answering.
    #[error("language server connection closed")]
    Closed,
}
