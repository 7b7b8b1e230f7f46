// * Pattern Matcher
// * Finds every non-overlapping occurrence of a rule pattern, scanning left to right

use crate::engine::rules::RulePattern;
use serde::Serialize;

/// A single occurrence of a pattern inside page content (byte offsets)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl PatternMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Returns all matches of `pattern` in `content`, in order of appearance.
/// Every call walks a fresh iterator, so no scan position leaks between calls.
/// Zero-width matches are dropped since they cannot carry a link.
pub fn find_matches(content: &str, pattern: &RulePattern) -> Vec<PatternMatch> {
    pattern
        .matcher()
        .find_iter(content)
        .filter(|m| !m.as_str().is_empty())
        .map(|m| PatternMatch {
            text: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// True when a literal pattern matched its keyword exactly (ignoring case)
pub fn is_exact_match(pattern: &RulePattern, matched: &str) -> bool {
    match pattern.literal_text() {
        Some(text) => text.to_lowercase() == matched.to_lowercase(),
        None => false,
    }
}
