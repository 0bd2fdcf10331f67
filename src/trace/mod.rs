//! Java stack trace recovery from free-form text.
//!
//! - **Tolerant grammar**: one frame per line, with noise before and after,
//!   optional module qualifiers, constructor and lambda method markers
//! - **Block assembly**: `Caused by:` chains are flattened innermost-first,
//!   `... N more` elisions are skipped, hard-wrapped frames are rejoined
//! - **Reduction**: adjacent duplicate frames collapse to one
//!
//! Sub-modules:
//! - [`frame`]     - `Frame`, `FileName`, `FrameSequence`
//! - [`grammar`]   - `parse_line`
//! - [`source`]    - `TextSource`, `TextLines`
//! - [`assembler`] - `assemble_around`, `assemble_text`, `Assembly`
//! - [`reducer`]   - `reduce`
//! - [`markers`]   - compiled patterns for marker lines (internal)

pub mod assembler;
pub mod frame;
pub mod grammar;
mod markers;
pub mod reducer;
pub mod source;


pub use assembler::{Assembly, assemble_around, assemble_text};
pub use frame::{FileName, Frame, FrameSequence, FrameSite, outer_class_name};
pub use grammar::parse_line;
pub use reducer::reduce;
pub use source::{TextLines, TextSource};

/// Parse canonical or free-form trace text into a sequence.
pub fn parse_text(text: &str) -> crate::error::Result<FrameSequence> {
    assemble_text(&TextLines::new(text)).map(|assembly| assembly.frames)
}
