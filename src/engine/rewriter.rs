// * Content Rewriter
// * Splices ranked suggestions into content, highest offset first so pending offsets stay valid

use crate::engine::ranker::LinkSuggestion;
use serde::{Deserialize, Serialize};

/// Markup emitted around a linked keyword
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMarkup {
    #[default]
    Html,
    Markdown,
}

impl LinkMarkup {
    fn render(&self, text: &str, suggestion: &LinkSuggestion) -> String {
        match self {
            LinkMarkup::Html => format!(
                r#"<a href="{}" class="internal-link" title="{}">{}</a>"#,
                escape_attr(&suggestion.target_url),
                escape_attr(&suggestion.anchor_text),
                text
            ),
            LinkMarkup::Markdown => format!(
                r#"[{}]({} "{}")"#,
                escape_markdown(text, &['[', ']']),
                escape_markdown(&suggestion.target_url, &['(', ')', ' ']),
                escape_markdown(&suggestion.anchor_text, &['"'])
            ),
        }
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// * Backslash-escapes `special` (and backslash itself); a space in a destination becomes %20
fn escape_markdown(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == ' ' && special.contains(&' ') {
            out.push_str("%20");
            continue;
        }
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Applies `suggestions` to `content`.
///
/// Offsets come from the analysis of this exact content and are not re-validated,
/// except that a span overlapping an already applied span (or out of bounds) is skipped.
pub fn apply_suggestions(content: &str, suggestions: &[LinkSuggestion], markup: LinkMarkup) -> String {
    let mut ordered: Vec<&LinkSuggestion> = suggestions.iter().collect();
    ordered.sort_by(|a, b| b.position.cmp(&a.position));

    let mut result = content.to_string();
    let mut boundary = content.len();

    for suggestion in ordered {
        let start = suggestion.position;
        let end = start + suggestion.length;

        if end > boundary || !content.is_char_boundary(start) || !content.is_char_boundary(end) {
            continue;
        }

        let replacement = markup.render(&content[start..end], suggestion);
        result.replace_range(start..end, &replacement);
        boundary = start;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(content: &str, keyword: &str, target: &str, anchor: &str) -> LinkSuggestion {
        let position = content.find(keyword).unwrap();
        LinkSuggestion {
            rule_id: "r".to_string(),
            keyword: keyword.to_string(),
            target_url: target.to_string(),
            anchor_text: anchor.to_string(),
            confidence: 0.8,
            seo_value: 1.0,
            position,
            length: keyword.len(),
            context: String::new(),
            reason: String::new(),
        }
    }

    #[test]
    fn test_no_suggestions_returns_content_unchanged() {
        let content = "Plain text with nothing to link.";
        assert_eq!(apply_suggestions(content, &[], LinkMarkup::Html), content);
    }

    #[test]
    fn test_multiple_replacements_keep_offsets() {
        let content = "We offer AI strategy and machine learning.";
        let suggestions = vec![
            suggestion(content, "AI strategy", "/services/ai-strategy/", "AI strategy consulting"),
            suggestion(content, "machine learning", "/services/ml/", "ML"),
        ];

        let rewritten = apply_suggestions(content, &suggestions, LinkMarkup::Html);
        assert_eq!(
            rewritten,
            "We offer <a href=\"/services/ai-strategy/\" class=\"internal-link\" title=\"AI strategy consulting\">AI strategy</a> \
             and <a href=\"/services/ml/\" class=\"internal-link\" title=\"ML\">machine learning</a>."
        );
    }

    #[test]
    fn test_overlapping_span_skipped() {
        let content = "generative AI strategy";
        let outer = suggestion(content, "generative AI", "/gen/", "gen");
        let inner = suggestion(content, "AI strategy", "/strategy/", "strategy");

        let rewritten = apply_suggestions(content, &[outer, inner], LinkMarkup::Markdown);
        assert_eq!(rewritten, "generative [AI strategy](/strategy/ \"strategy\")");
    }

    #[test]
    fn test_markdown_escaping() {
        let content = "see [beta] pricing";
        let s = suggestion(content, "[beta] pricing", "/pricing_(2024)", "Plans \"2024\"");

        let rewritten = apply_suggestions(content, &[s], LinkMarkup::Markdown);
        assert_eq!(
            rewritten,
            r#"see [\[beta\] pricing](/pricing_\(2024\) "Plans \"2024\"")"#
        );
    }

    #[test]
    fn test_attribute_escaping() {
        let content = "see pricing";
        let s = suggestion(content, "pricing", "/pricing?a=1&b=2", "Plans \"2024\"");

        let rewritten = apply_suggestions(content, &[s], LinkMarkup::Html);
        assert!(rewritten.contains("href=\"/pricing?a=1&amp;b=2\""));
        assert!(rewritten.contains("title=\"Plans &quot;2024&quot;\""));
    }

    #[test]
    fn test_out_of_bounds_suggestion_ignored() {
        let content = "short";
        let mut s = suggestion(content, "short", "/x/", "x");
        s.position = 3;
        s.length = 10;

        assert_eq!(apply_suggestions(content, &[s], LinkMarkup::Html), "short");
    }
}
