//! Navigate, export and deobfuscate Java stack traces.
//!
//! The pipeline is text → [`trace`] (grammar, assembler, reducer) →
//! [`navigator`] → [`resolver`] → [`sinks`]. [`session`] ties them together
//! into the commands an editor host binds, and [`server`] exposes those
//! commands over JSON-RPC.

/// Crate version, reported by the server and the log banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod debug;

pub mod cli;
pub mod context;
pub mod deobfuscate;
pub mod error;
pub mod navigator;
pub mod resolver;
pub mod server;
pub mod session;
pub mod sinks;
pub mod trace;

pub use context::{BufferContext, EditorContext, NoPrompt, Prompter, SourceSelector};
pub use deobfuscate::{Deobfuscated, Deobfuscator};
pub use error::{FilterError, ResolveError, Result, TraceError};
pub use navigator::{Navigator, Step};
pub use resolver::{ClassSymbol, Resolver, SymbolKind, SymbolProvider};
pub use session::Session;
pub use sinks::{
    DiagnosticItem, DiagnosticsSink, JumpSink, JumpTarget, PickItem, PickList, RecordingJumpSink,
};
pub use trace::{FileName, Frame, FrameSequence, parse_line, parse_text};
