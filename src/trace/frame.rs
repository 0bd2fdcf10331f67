//! `Frame` and `FrameSequence` value types.

use std::fmt;

/// File column of a frame: a real file name or one of the JVM sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileName {
    /// A source file name such as `MyClass.java`.
    Source(String),
    /// `Unknown Source` (class compiled without debug info).
    Unknown,
    /// `Native Method`.
    Native,
}

impl FileName {
    pub const UNKNOWN_SOURCE: &'static str = "Unknown Source";
    pub const NATIVE_METHOD: &'static str = "Native Method";

    /// The file name a resolver should expect, absent for the sentinels.
    pub fn expected(&self) -> Option<&str> {
        match self {
            FileName::Source(name) => Some(name),
            FileName::Unknown | FileName::Native => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FileName::Source(name) => name,
            FileName::Unknown => Self::UNKNOWN_SOURCE,
            FileName::Native => Self::NATIVE_METHOD,
        }
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed call site.
///
/// `PartialEq` compares every field. Deduplication uses the looser
/// [`Frame::same_site`], which ignores the method name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    /// Dotted outer class name (nested `$` suffix already stripped).
    pub class_name: String,
    pub method_name: String,
    pub file_name: FileName,
    /// Always >= 1.
    pub line_number: u32,
}

impl Frame {
    pub fn new(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        file_name: FileName,
        line_number: u32,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            file_name,
            line_number: line_number.max(1),
        }
    }

    /// Identity used for deduplication: class, file and line.
    pub fn same_site(&self, other: &Frame) -> bool {
        self.site() == other.site()
    }

    /// Hashable form of the deduplication identity.
    pub fn site(&self) -> FrameSite<'_> {
        FrameSite {
            class_name: &self.class_name,
            file_name: &self.file_name,
            line_number: self.line_number,
        }
    }

    /// `class.method` as shown in lists.
    pub fn qualified_method(&self) -> String {
        format!("{}.{}", self.class_name, self.method_name)
    }
}

/// Canonical serialization: `at <class>.<method>(<file>:<line>)`.
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at {}.{}({}:{})",
            self.class_name, self.method_name, self.file_name, self.line_number
        )
    }
}

/// Borrowed deduplication key of a [`Frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSite<'a> {
    pub class_name: &'a str,
    pub file_name: &'a FileName,
    pub line_number: u32,
}

/// The portion of a class name before its first `$`.
pub fn outer_class_name(class_name: &str) -> &str {
    class_name
        .split_once('$')
        .map_or(class_name, |(outer, _)| outer)
}

/// A non-empty, innermost-first list of frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence(Vec<Frame>);

impl FrameSequence {
    /// Wrap `frames`, returning `None` when empty.
    pub fn new(frames: Vec<Frame>) -> Option<Self> {
        (!frames.is_empty()).then_some(Self(frames))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Frame at a 1-based position.
    pub fn get(&self, position: usize) -> Option<&Frame> {
        position.checked_sub(1).and_then(|i| self.0.get(i))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.0.iter()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.0
    }

    /// One canonical line per frame, newline terminated.
    pub fn serialize(&self) -> String {
        self.0.iter().map(|frame| format!("{frame}\n")).collect()
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
