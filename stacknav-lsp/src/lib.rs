//! stacknav-lsp: the language-server client stacknav uses to find the
//! source file of a Java class.
//!
//! - [`client`] - [`LspClient`]: spawn, `initialize` handshake, requests,
//!   `workspace/symbol`
//! - [`jsonrpc`] - JSON-RPC 2.0 wire types and `Content-Length` framing
//! - [`protocol`] - symbol/location types and `file://` URI conversion
//!
//! # Example
//!
//! ```ignore
//! use stacknav_lsp::LspClient;
//!
//! let client = LspClient::spawn("jdtls", &Default::default(), root).await?;
//! for symbol in client.workspace_symbol("MyClass").await? {
//!     println!("{:?} -> {:?}", symbol.container_name, symbol.location);
//! }
//! ```

pub mod client;
pub mod error;
pub mod jsonrpc;
pub mod protocol;

pub use client::LspClient;
pub use error::LspError;
pub use protocol::{Location, SymbolInformation, symbol_kind};
