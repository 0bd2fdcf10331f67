//! Multi-line frame assembly.
//!
//! Finds the block of trace text around an anchor line, walks it forward
//! collecting frames across `Caused by:` resets and `... N more` elisions,
//! and returns the reduced, innermost-first [`FrameSequence`].

use std::ops::RangeInclusive;

use super::frame::{Frame, FrameSequence};
use super::grammar::parse_line;
use super::markers::{is_caused_by, is_elision};
use super::reducer::collapse_runs;
use super::source::TextSource;
use crate::error::{Result, TraceError};

/// Output of a successful assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub frames: FrameSequence,
    /// 1-based index of the frame containing the anchor line, if any.
    pub cursor: Option<usize>,
    /// Physical lines the block spans.
    pub lines: RangeInclusive<usize>,
}

/// What one physical line contributes to a block.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineKind {
    Frame(Span),
    CausedBy,
    Elision,
    Other,
}

/// A frame and the physical lines it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    frame: Frame,
    first: usize,
    last: usize,
}

impl Span {
    fn single(frame: Frame, line: usize) -> Self {
        Self {
            frame,
            first: line,
            last: line,
        }
    }

    fn contains(&self, line: usize) -> bool {
        (self.first..=self.last).contains(&line)
    }
}

/// A collected frame plus whether it holds the anchor line.
#[derive(Debug)]
struct Tagged {
    frame: Frame,
    anchor: bool,
}

/// Assemble the block of trace text containing `anchor` (1-based).
///
/// When `anchor` is not itself part of a trace (for example the exception
/// header line), discovery starts from the line below it.
pub fn assemble_around<S: TextSource + ?Sized>(source: &S, anchor: usize) -> Result<Assembly> {
    let (anchor, kind) = match classify(source, anchor) {
        LineKind::Other => {
            let below = anchor + 1;
            match classify(source, below) {
                LineKind::Other => return Err(TraceError::Parse),
                kind => (below, kind),
            }
        }
        kind => (anchor, kind),
    };
    let first = match &kind {
        LineKind::Frame(span) => span.first,
        _ => anchor,
    };
    let first = discover_first(source, first);
    log::debug!("Trace block around line {anchor} starts at line {first}");
    assemble_from(source, first, Some(anchor))
}

/// Assemble text that is expected to be a trace, such as deobfuscator output.
///
/// Leading lines that are neither frames nor trace markers are skipped.
pub fn assemble_text<S: TextSource + ?Sized>(source: &S) -> Result<Assembly> {
    let first = (1..=source.line_count())
        .find(|&n| !matches!(classify(source, n), LineKind::Other))
        .ok_or(TraceError::Parse)?;
    let first = match classify(source, first) {
        LineKind::Frame(span) => span.first,
        _ => first,
    };
    assemble_from(source, first, None)
}

/// Walk upward from `first` while lines continue the block.
fn discover_first<S: TextSource + ?Sized>(source: &S, mut first: usize) -> usize {
    while first > 1 {
        let above = first - 1;
        match classify(source, above) {
            LineKind::CausedBy | LineKind::Elision => first = above,
            // A span reaching below `above` would overlap the block.
            LineKind::Frame(span) if span.last == above => first = span.first,
            _ => break,
        }
    }
    first
}

/// Walk forward from `first`, collecting frames until a line ends the block.
fn assemble_from<S: TextSource + ?Sized>(
    source: &S,
    first: usize,
    anchor: Option<usize>,
) -> Result<Assembly> {
    // Printed outermost-first; each cause goes ahead of what came before.
    let mut segments: Vec<Vec<Tagged>> = vec![Vec::new()];
    let mut line = first;
    let mut last = first;

    while line <= source.line_count() {
        let kind = source
            .line(line)
            .and_then(marker_kind)
            .unwrap_or_else(|| forward_frame(source, line));
        match kind {
            LineKind::Frame(span) => {
                let is_anchor = anchor.is_some_and(|a| span.contains(a));
                let segment = segments.last_mut().ok_or_else(|| {
                    TraceError::Internal("assembler lost its current segment".to_string())
                })?;
                match segment.last_mut() {
                    Some(prev) if prev.frame.same_site(&span.frame) => prev.anchor |= is_anchor,
                    _ => segment.push(Tagged {
                        frame: span.frame,
                        anchor: is_anchor,
                    }),
                }
                last = span.last;
                line = span.last + 1;
            }
            LineKind::CausedBy => {
                segments.push(Vec::new());
                last = line;
                line += 1;
            }
            LineKind::Elision => {
                last = line;
                line += 1;
            }
            LineKind::Other => break,
        }
    }

    let ordered: Vec<Tagged> = segments.into_iter().rev().flatten().collect();
    let reduced = collapse_runs(ordered, |t| &t.frame, |kept, dup| kept.anchor |= dup.anchor);

    let cursor = reduced.iter().position(|t| t.anchor).map(|i| i + 1);
    let frames = FrameSequence::new(reduced.into_iter().map(|t| t.frame).collect())
        .ok_or(TraceError::Parse)?;
    if anchor.is_some() && cursor.is_none() {
        log::debug!("Anchor line is not inside a frame; cursor left unset");
    }
    Ok(Assembly {
        frames,
        cursor,
        lines: first..=last,
    })
}

/// Full classification used when the neighbourhood of `n` is unknown:
/// the line alone, then joined with the line above, then with the line below.
fn classify<S: TextSource + ?Sized>(source: &S, n: usize) -> LineKind {
    let Some(text) = source.line(n) else {
        return LineKind::Other;
    };
    if let Some(kind) = marker_kind(text) {
        return kind;
    }
    if let Some(frame) = parse_line(text) {
        return LineKind::Frame(Span::single(frame, n));
    }
    if let Some(span) = n
        .checked_sub(1)
        .and_then(|above| join(source, above, n))
    {
        return LineKind::Frame(span);
    }
    join(source, n, n + 1).map_or(LineKind::Other, LineKind::Frame)
}

/// Classification during the forward walk. The line above has already been
/// consumed, so only a join with the line below is tried.
fn forward_frame<S: TextSource + ?Sized>(source: &S, n: usize) -> LineKind {
    let Some(text) = source.line(n) else {
        return LineKind::Other;
    };
    if let Some(frame) = parse_line(text) {
        return LineKind::Frame(Span::single(frame, n));
    }
    join(source, n, n + 1).map_or(LineKind::Other, LineKind::Frame)
}

fn marker_kind(text: &str) -> Option<LineKind> {
    if is_caused_by(text) {
        Some(LineKind::CausedBy)
    } else if is_elision(text) {
        Some(LineKind::Elision)
    } else {
        None
    }
}

/// Parse lines `upper` and `upper + 1` as one hard-wrapped frame.
///
/// Neither line may parse or be a marker on its own.
fn join<S: TextSource + ?Sized>(source: &S, upper: usize, lower: usize) -> Option<Span> {
    if upper == 0 {
        return None;
    }
    let head = source.line(upper)?;
    let tail = source.line(lower)?;
    for part in [head, tail] {
        if marker_kind(part).is_some() || parse_line(part).is_some() {
            return None;
        }
    }
    let (head, tail) = (head.trim_end(), tail.trim_start());
    // The grammar has no inner spaces outside `at` and the sentinels, so the
    // spaced join only succeeds for wraps at a space.
    let frame = parse_line(&format!("{head} {tail}"))
        .or_else(|| parse_line(&format!("{head}{tail}")))?;
    Some(Span {
        frame,
        first: upper,
        last: lower,
    })
}
