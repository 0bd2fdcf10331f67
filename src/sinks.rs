//! Adapters from resolved frames to editor actions: jumps, diagnostics-list
//! entries and pick-list entries.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use stacknav_config::Severity;

use crate::trace::{Frame, FrameSequence};

/// A source location to jump to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JumpTarget {
    pub path: PathBuf,
    pub line: u32,
}

impl fmt::Display for JumpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Receives "open this file at this line" requests.
pub trait JumpSink: Send {
    fn go_to(&mut self, path: &Path, line: u32);
}

/// Keeps every jump; the server reports the last one in its response.
#[derive(Debug, Default)]
pub struct RecordingJumpSink {
    pub jumps: Vec<JumpTarget>,
}

impl RecordingJumpSink {
    pub fn last(&self) -> Option<&JumpTarget> {
        self.jumps.last()
    }
}

impl JumpSink for RecordingJumpSink {
    fn go_to(&mut self, path: &Path, line: u32) {
        self.jumps.push(JumpTarget {
            path: path.to_path_buf(),
            line,
        });
    }
}

/// One diagnostics-list (quickfix) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticItem {
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
    pub label: String,
    pub severity: Severity,
}

impl DiagnosticItem {
    pub fn new(frame: &Frame, path: PathBuf, severity: Severity) -> Self {
        Self {
            path,
            line: frame.line_number,
            column: 1,
            label: frame.qualified_method(),
            severity,
        }
    }
}

/// `path:line:col: severity: label`, the errorformat most editors read.
impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.path.display(),
            self.line,
            self.column,
            self.severity,
            self.label
        )
    }
}

/// Receives a complete diagnostics list.
pub trait DiagnosticsSink: Send {
    fn publish(&mut self, items: &[DiagnosticItem]);
}

impl DiagnosticsSink for Vec<DiagnosticItem> {
    fn publish(&mut self, items: &[DiagnosticItem]) {
        self.clear();
        self.extend_from_slice(items);
    }
}

/// One pick-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickItem {
    /// 1-based index of the frame in the sequence the list was built from.
    pub index: usize,
    pub path: PathBuf,
    pub line: u32,
    pub label: String,
}

impl PickItem {
    pub fn new(index: usize, frame: &Frame, path: PathBuf) -> Self {
        Self {
            index,
            path,
            line: frame.line_number,
            label: format!(
                "{index}: {} ({}:{})",
                frame.qualified_method(),
                frame.file_name,
                frame.line_number
            ),
        }
    }
}

impl From<&PickItem> for JumpTarget {
    fn from(item: &PickItem) -> Self {
        Self {
            path: item.path.clone(),
            line: item.line,
        }
    }
}

/// Pick-list items tied to the navigator generation they were built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickList {
    pub generation: u64,
    pub items: Vec<PickItem>,
}

impl PickList {
    pub fn labels(&self) -> Vec<String> {
        self.items.iter().map(|item| item.label.clone()).collect()
    }
}

/// First occurrence of each frame site, with its 1-based sequence index.
pub fn distinct_frames(sequence: &FrameSequence) -> Vec<(usize, &Frame)> {
    let mut seen = HashSet::new();
    sequence
        .iter()
        .enumerate()
        .filter(|(_, frame)| seen.insert(frame.site()))
        .map(|(i, frame)| (i + 1, frame))
        .collect()
}
