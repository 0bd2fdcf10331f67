//! Compiled regex patterns for the non-frame lines of a Java trace.

use std::sync::OnceLock;

use regex::Regex;

fn re_caused_by() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*Caused by:")
            .expect("re_caused_by: pattern is valid and should always compile")
    })
}

fn re_elision() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\.\.\.\s*\d+\s+more\b")
            .expect("re_elision: pattern is valid and should always compile")
    })
}

/// `Caused by: ...` header of a nested cause.
pub(super) fn is_caused_by(line: &str) -> bool {
    re_caused_by().is_match(line)
}

/// `... N more` elision marker.
pub(super) fn is_elision(line: &str) -> bool {
    re_elision().is_match(line)
}
