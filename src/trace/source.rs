//! Line-addressable text the assembler reads from.

/// A sequence of lines with 1-based random access.
pub trait TextSource {
    fn line_count(&self) -> usize;

    /// Line `n` (1-based), or `None` outside `1..=line_count()`.
    fn line(&self, n: usize) -> Option<&str>;
}

impl<S: AsRef<str>> TextSource for [S] {
    fn line_count(&self) -> usize {
        self.len()
    }

    fn line(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.get(i))
            .map(AsRef::as_ref)
    }
}

impl<S: AsRef<str>> TextSource for Vec<S> {
    fn line_count(&self) -> usize {
        self.as_slice().line_count()
    }

    fn line(&self, n: usize) -> Option<&str> {
        self.as_slice().line(n)
    }
}

/// A borrowed string split into lines (`\n` or `\r\n`).
#[derive(Debug, Clone)]
pub struct TextLines<'a> {
    lines: Vec<&'a str>,
}

impl<'a> TextLines<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
        }
    }
}

impl TextSource for TextLines<'_> {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, n: usize) -> Option<&str> {
        self.lines.as_slice().line(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_lines_are_one_based() {
        let text = TextLines::new("first\r\nsecond\nthird");
        assert_eq!(text.line_count(), 3);
        assert_eq!(text.line(0), None);
        assert_eq!(text.line(1), Some("first"));
        assert_eq!(text.line(2), Some("second"));
        assert_eq!(text.line(3), Some("third"));
        assert_eq!(text.line(4), None);
    }

    #[test]
    fn test_owned_lines() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(lines.line_count(), 2);
        assert_eq!(lines.line(2), Some("b"));
    }
}
