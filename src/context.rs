//! What a command needs from its host: the editing context it runs in and
//! a way to ask the user for input.

use std::collections::HashMap;
use std::path::PathBuf;

use arboard::Clipboard;
use async_trait::async_trait;

use crate::trace::TextSource;

/// Where a load command reads its text from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelector {
    /// The block of text around the cursor.
    Cursor,
    /// A named register (`+` and `*` are the system clipboards).
    Register(char),
    /// Literal trace text.
    Text(String),
}

impl SourceSelector {
    /// Empty or absent selects the cursor, one character names a register,
    /// anything longer is literal text.
    pub fn parse(token: Option<&str>) -> Self {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return SourceSelector::Cursor;
        };
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(name), None) => SourceSelector::Register(name),
            _ => SourceSelector::Text(token.to_string()),
        }
    }
}

/// The editing context a command runs against.
pub trait EditorContext {
    /// Current buffer.
    fn buffer(&self) -> &dyn TextSource;

    /// 1-based cursor line in [`buffer`](Self::buffer).
    fn cursor_line(&self) -> usize;

    /// Contents of register `name`, if it exists.
    fn register(&self, name: char) -> Option<String>;
}

/// Interactive prompts. `None` means the user dismissed the prompt.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Choose one of `items`, returning its 0-based position.
    async fn select(&self, title: &str, items: &[String]) -> Option<usize>;

    async fn input(&self, prompt: &str) -> Option<String>;

    async fn pick_file(&self, prompt: &str) -> Option<PathBuf>;
}

/// A prompter for non-interactive hosts: every prompt is dismissed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

#[async_trait]
impl Prompter for NoPrompt {
    async fn select(&self, title: &str, _items: &[String]) -> Option<usize> {
        log::debug!("Prompt '{title}' dismissed (non-interactive)");
        None
    }

    async fn input(&self, prompt: &str) -> Option<String> {
        log::debug!("Prompt '{prompt}' dismissed (non-interactive)");
        None
    }

    async fn pick_file(&self, prompt: &str) -> Option<PathBuf> {
        log::debug!("Prompt '{prompt}' dismissed (non-interactive)");
        None
    }
}

/// An in-memory buffer with a cursor and named registers.
#[derive(Debug, Clone, Default)]
pub struct BufferContext {
    lines: Vec<String>,
    cursor_line: usize,
    registers: HashMap<char, String>,
    system_clipboard: bool,
}

impl BufferContext {
    pub fn new(text: &str, cursor_line: usize) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
            cursor_line,
            ..Default::default()
        }
    }

    pub fn from_lines(lines: Vec<String>, cursor_line: usize) -> Self {
        Self {
            lines,
            cursor_line,
            ..Default::default()
        }
    }

    pub fn with_register(mut self, name: char, contents: impl Into<String>) -> Self {
        self.registers.insert(name, contents.into());
        self
    }

    /// Serve `+` and `*` from the system clipboard when they are not set.
    pub fn with_system_clipboard(mut self, enabled: bool) -> Self {
        self.system_clipboard = enabled;
        self
    }
}

impl EditorContext for BufferContext {
    fn buffer(&self) -> &dyn TextSource {
        &self.lines
    }

    fn cursor_line(&self) -> usize {
        self.cursor_line
    }

    fn register(&self, name: char) -> Option<String> {
        if let Some(contents) = self.registers.get(&name) {
            return Some(contents.clone());
        }
        match name {
            '+' | '*' if self.system_clipboard => read_clipboard(name),
            _ => None,
        }
    }
}

/// `+` is the clipboard; `*` is the primary selection on Linux and the
/// clipboard elsewhere.
fn read_clipboard(name: char) -> Option<String> {
    let mut clipboard = match Clipboard::new() {
        Ok(clipboard) => clipboard,
        Err(e) => {
            log::warn!("Clipboard not available: {e}");
            return None;
        }
    };
    let result = if name == '*' {
        read_primary_selection(&mut clipboard)
    } else {
        clipboard.get_text()
    };
    match result {
        Ok(text) => {
            log::debug!("Read {} chars from register '{name}'", text.len());
            Some(text)
        }
        Err(e) => {
            log::error!("Failed to get clipboard text: {e}");
            None
        }
    }
}

#[cfg(target_os = "linux")]
fn read_primary_selection(clipboard: &mut Clipboard) -> Result<String, arboard::Error> {
    use arboard::GetExtLinux;
    clipboard
        .get()
        .clipboard(arboard::LinuxClipboardKind::Primary)
        .text()
}

#[cfg(not(target_os = "linux"))]
fn read_primary_selection(clipboard: &mut Clipboard) -> Result<String, arboard::Error> {
    clipboard.get_text()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse() {
        assert_eq!(SourceSelector::parse(None), SourceSelector::Cursor);
        assert_eq!(SourceSelector::parse(Some("")), SourceSelector::Cursor);
        assert_eq!(
            SourceSelector::parse(Some("  ")),
            SourceSelector::Text("  ".to_string())
        );
        assert_eq!(SourceSelector::parse(Some(" ")), SourceSelector::Register(' '));
        assert_eq!(SourceSelector::parse(Some("a")), SourceSelector::Register('a'));
        assert_eq!(SourceSelector::parse(Some("+")), SourceSelector::Register('+'));
        assert_eq!(
            SourceSelector::parse(Some("at a.B.c(B.java:1)")),
            SourceSelector::Text("at a.B.c(B.java:1)".to_string())
        );
    }

    #[test]
    fn test_buffer_context_registers() {
        let ctx = BufferContext::new("one\ntwo", 2).with_register('a', "text");
        assert_eq!(ctx.buffer().line_count(), 2);
        assert_eq!(ctx.buffer().line(2), Some("two"));
        assert_eq!(ctx.cursor_line(), 2);
        assert_eq!(ctx.register('a').as_deref(), Some("text"));
        assert_eq!(ctx.register('b'), None);
        // Clipboard access is off unless requested.
        assert_eq!(ctx.register('+'), None);
    }
}
