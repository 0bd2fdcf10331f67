//! Recursive-descent grammar for a single stack frame line.
//!
//! ```text
//! line    := noise "at" ws+ module? class "." method "(" file (":" digits)? ")" noise
//! module  := word ("." word)* ("@" version)? "/"
//! class   := segment ("." segment)*
//! method  := lambda | constructor | identifier
//! lambda  := "lambda$" (digits | "static$" digits | word "$" digits)
//! file    := "Unknown Source" | "Native Method" | filename
//! ```
//!
//! Every `at` occurrence on the line is tried in turn, so prose before or
//! after the frame is tolerated.

use super::frame::{FileName, Frame, outer_class_name};

/// Parse one physical line into a [`Frame`].
pub fn parse_line(text: &str) -> Option<Frame> {
    at_markers(text).find_map(|offset| parse_frame(&text[offset..]))
}

/// Byte offsets just past each standalone `at` keyword followed by whitespace.
fn at_markers(text: &str) -> impl Iterator<Item = usize> + '_ {
    text.match_indices("at").filter_map(move |(i, _)| {
        let before_ok = text[..i]
            .chars()
            .next_back()
            .is_none_or(|c| !is_ident_char(c));
        let after = i + 2;
        let after_ok = text[after..].chars().next().is_some_and(char::is_whitespace);
        (before_ok && after_ok).then_some(after)
    })
}

/// A frame as matched, before the nested-class suffix is stripped.
#[derive(Debug, PartialEq, Eq)]
struct RawFrame<'a> {
    class: &'a str,
    method: &'a str,
    file: FileName,
    line: Option<u32>,
}

fn parse_frame(rest: &str) -> Option<Frame> {
    let mut start = Cursor::new(rest);
    start.skip_whitespace();

    // No-module form first, then the module-qualified form.
    let raw = {
        let mut c = start;
        frame_body(&mut c)
    }
    .or_else(|| {
        let mut c = start;
        module(&mut c)?;
        frame_body(&mut c)
    })?;

    Some(Frame::new(
        outer_class_name(raw.class),
        raw.method,
        raw.file,
        raw.line.unwrap_or(1),
    ))
}

fn frame_body<'a>(c: &mut Cursor<'a>) -> Option<RawFrame<'a>> {
    let (class, method) = class_and_method(c)?;
    c.expect("(")?;
    let file = file_name(c)?;
    let line = if c.eat(":") {
        Some(c.eat_while(|ch| ch.is_ascii_digit()).parse::<u32>().ok()?)
    } else {
        None
    };
    c.expect(")")?;
    Some(RawFrame {
        class,
        method,
        file,
        line,
    })
}

/// `java.base/`, `java.base@17.0.2/`, `my.module/`.
fn module(c: &mut Cursor<'_>) -> Option<()> {
    loop {
        if c.eat_while(is_word_char).is_empty() {
            return None;
        }
        if !c.eat(".") {
            break;
        }
    }
    if c.eat("@") && c.eat_while(|ch| is_word_char(ch) || ch == '.' || ch == '-').is_empty() {
        return None;
    }
    c.expect("/")
}

fn class_and_method<'a>(c: &mut Cursor<'a>) -> Option<(&'a str, &'a str)> {
    let start = c.pos;
    loop {
        if c.eat_while(is_ident_char).is_empty() {
            return None;
        }
        let dot = c.pos;
        if !c.eat(".") {
            break;
        }
        if c.peek() == Some('<') {
            let class = &c.text[start..dot];
            return Some((class, constructor(c)?));
        }
    }
    let path = &c.text[start..c.pos];
    let (class, last) = path.rsplit_once('.')?;
    let method = lambda(last).or_else(|| identifier(last))?;
    Some((class, method))
}

fn constructor(c: &mut Cursor<'_>) -> Option<&'static str> {
    ["<init>", "<clinit>"].into_iter().find(|marker| c.eat(marker))
}

fn lambda(name: &str) -> Option<&str> {
    let tail = name.strip_prefix("lambda$")?;
    let digits = match tail.strip_prefix("static$") {
        Some(digits) => digits,
        None => match tail.rsplit_once('$') {
            Some((word, digits)) if !word.is_empty() && !word.contains('$') => digits,
            Some(_) => return None,
            None => tail,
        },
    };
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(name)
}

fn identifier(name: &str) -> Option<&str> {
    let first = name.chars().next()?;
    (!first.is_ascii_digit() && name.chars().all(is_ident_char)).then_some(name)
}

fn file_name(c: &mut Cursor<'_>) -> Option<FileName> {
    if c.eat(FileName::UNKNOWN_SOURCE) {
        return Some(FileName::Unknown);
    }
    if c.eat(FileName::NATIVE_METHOD) {
        return Some(FileName::Native);
    }
    let name = c.eat_while(|ch| is_ident_char(ch) || ch == '.' || ch == '-');
    if name.is_empty() || name.starts_with('.') || name.ends_with('.') || name.contains("..") {
        return None;
    }
    Some(FileName::Source(name.to_string()))
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, literal: &str) -> Option<()> {
        self.eat(literal).then_some(())
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|ch: char| !pred(ch)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn skip_whitespace(&mut self) {
        self.eat_while(char::is_whitespace);
    }
}
