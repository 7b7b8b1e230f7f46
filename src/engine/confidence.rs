// * Link Confidence Scorer
// * Scores a single rule match on a page in [0, 1] from proximity terms,
// * exact keyword equality and a keyword-stuffing guard

use crate::config::LinkingConfig;
use crate::engine::matcher::{is_exact_match, PatternMatch};
use crate::engine::rules::LinkRule;
use serde::Serialize;

const SCORE_MIN: f64 = 0.0;
const SCORE_MAX: f64 = 1.0;

/// Breakdown of confidence components for debugging and reports
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub base_score: f64,
    pub proximity_ratio: f64,
    pub proximity_bonus: f64,
    pub exact_match_bonus: f64,
    pub keyword_density: f64,
    pub stuffing_penalty: f64,
    pub final_score: f64,
}

/// Confidence scorer configured from the linking settings
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    base_confidence: f64,
    proximity_weight: f64,
    proximity_window: usize,
    exact_match_bonus: f64,
    stuffing_penalty: f64,
    stuffing_threshold: f64,
}

impl ConfidenceScorer {
    /// Creates a scorer with default constants
    pub fn new() -> Self {
        Self::with_config(&LinkingConfig::default())
    }

    /// Creates a scorer from custom linking settings
    pub fn with_config(config: &LinkingConfig) -> Self {
        Self {
            base_confidence: config.base_confidence,
            proximity_weight: config.proximity_weight,
            proximity_window: config.proximity_window,
            exact_match_bonus: config.exact_match_bonus,
            stuffing_penalty: config.stuffing_penalty,
            stuffing_threshold: config.stuffing_threshold,
        }
    }

    /// Scores one match of `rule` in `content`.
    /// `occurrences` is the total number of matches of the rule on the page.
    pub fn score(
        &self,
        content: &str,
        rule: &LinkRule,
        matched: &PatternMatch,
        occurrences: usize,
    ) -> ScoreBreakdown {
        let mut breakdown = ScoreBreakdown {
            base_score: self.base_confidence,
            ..Default::default()
        };

        let mut score = self.base_confidence;

        // * Proximity terms around the match
        let terms = rule.proximity_terms();
        if !terms.is_empty() {
            let window = surrounding(content, matched.start, matched.end, self.proximity_window).to_lowercase();
            let present = terms
                .iter()
                .filter(|term| window.contains(&term.to_lowercase()))
                .count();
            breakdown.proximity_ratio = present as f64 / terms.len() as f64;
            breakdown.proximity_bonus = breakdown.proximity_ratio * self.proximity_weight;
            score += breakdown.proximity_bonus;
        }

        // * Exact keyword equality for literal rules
        if is_exact_match(&rule.pattern, &matched.text) {
            breakdown.exact_match_bonus = self.exact_match_bonus;
            score += self.exact_match_bonus;
        }

        // * Keyword-stuffing guard, measured in characters
        let content_chars = content.chars().count();
        if content_chars > 0 {
            breakdown.keyword_density =
                (occurrences * matched.text.chars().count()) as f64 / content_chars as f64;
            if breakdown.keyword_density > self.stuffing_threshold {
                breakdown.stuffing_penalty = -self.stuffing_penalty;
                score -= self.stuffing_penalty;
            }
        }

        breakdown.final_score = score.clamp(SCORE_MIN, SCORE_MAX);
        breakdown
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the slice of `content` reaching `radius` characters either side of `start..end`.
/// Offsets are byte offsets on char boundaries; the window never splits a character.
pub fn surrounding(content: &str, start: usize, end: usize, radius: usize) -> &str {
    let lo = content[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);

    let hi = content[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(content.len());

    &content[lo..hi]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::matcher::find_matches;
    use crate::engine::rules::{RulePattern, RuleScope};

    fn filler(words: usize) -> String {
        vec!["lorem"; words].join(" ")
    }

    fn literal_rule(keyword: &str, proximity: &[&str]) -> LinkRule {
        LinkRule::keyword("r", keyword, "/target/", "anchor")
            .unwrap()
            .with_scope(RuleScope {
                proximity_terms: proximity.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            })
    }

    #[test]
    fn test_literal_match_gets_exact_bonus() {
        let content = format!("{} AI strategy {}", filler(60), filler(60));
        let rule = literal_rule("AI strategy", &[]);
        let matches = find_matches(&content, &rule.pattern);

        let breakdown = ConfidenceScorer::new().score(&content, &rule, &matches[0], matches.len());
        assert!((breakdown.exact_match_bonus - 0.10).abs() < 1e-9);
        assert!((breakdown.final_score - 0.80).abs() < 1e-9);
    }

    #[test]
    fn test_expression_match_has_no_exact_bonus() {
        let content = format!("{} LLMs {}", filler(60), filler(60));
        let rule = LinkRule::new("r", RulePattern::regex(r"\bLLMs?\b").unwrap(), "/llm/", "llm");
        let matches = find_matches(&content, &rule.pattern);

        let breakdown = ConfidenceScorer::new().score(&content, &rule, &matches[0], matches.len());
        assert_eq!(breakdown.exact_match_bonus, 0.0);
        assert!((breakdown.final_score - 0.70).abs() < 1e-9);
    }

    #[test]
    fn test_proximity_terms_raise_confidence() {
        let content = format!(
            "{} Our AI strategy builds a business roadmap. {}",
            filler(60),
            filler(60)
        );
        let rule = literal_rule("AI strategy", &["roadmap", "business", "budget", "hiring"]);
        let matches = find_matches(&content, &rule.pattern);

        let breakdown = ConfidenceScorer::new().score(&content, &rule, &matches[0], matches.len());
        assert!((breakdown.proximity_ratio - 0.5).abs() < 1e-9);
        assert!((breakdown.proximity_bonus - 0.15).abs() < 1e-9);
        assert!((breakdown.final_score - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_far_proximity_terms_ignored() {
        let content = format!("roadmap {} AI strategy {}", filler(100), filler(10));
        let rule = literal_rule("AI strategy", &["roadmap"]);
        let matches = find_matches(&content, &rule.pattern);

        let breakdown = ConfidenceScorer::new().score(&content, &rule, &matches[0], matches.len());
        assert_eq!(breakdown.proximity_bonus, 0.0);
    }

    #[test]
    fn test_keyword_stuffing_penalty() {
        let content = "AI strategy AI strategy AI strategy and more";
        let rule = literal_rule("AI strategy", &[]);
        let matches = find_matches(content, &rule.pattern);

        let breakdown = ConfidenceScorer::new().score(content, &rule, &matches[0], matches.len());
        assert!(breakdown.keyword_density > 0.05);
        assert!((breakdown.stuffing_penalty + 0.20).abs() < 1e-9);
        assert!((breakdown.final_score - 0.60).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_density_counts_characters() {
        let content = format!("café {}", "ü".repeat(60));
        let rule = literal_rule("café", &[]);
        let matches = find_matches(&content, &rule.pattern);
        assert_eq!(matches.len(), 1);

        let breakdown = ConfidenceScorer::new().score(&content, &rule, &matches[0], matches.len());
        assert!((breakdown.keyword_density - 4.0 / 65.0).abs() < 1e-9);
        assert!((breakdown.stuffing_penalty + 0.20).abs() < 1e-9);
        assert!((breakdown.final_score - 0.60).abs() < 1e-9);
    }

    #[test]
    fn test_score_clamped_at_both_ends() {
        let content = "AI strategy roadmap";
        let rule = literal_rule("AI strategy", &["roadmap"]);
        let matches = find_matches(content, &rule.pattern);

        let generous = LinkingConfig {
            base_confidence: 0.95,
            stuffing_penalty: 0.0,
            ..Default::default()
        };
        let high = ConfidenceScorer::with_config(&generous).score(content, &rule, &matches[0], 1);
        assert_eq!(high.final_score, 1.0);

        let harsh = LinkingConfig {
            base_confidence: 0.0,
            proximity_weight: 0.0,
            exact_match_bonus: 0.0,
            stuffing_penalty: 0.5,
            ..Default::default()
        };
        let low = ConfidenceScorer::with_config(&harsh).score(content, &rule, &matches[0], 1);
        assert_eq!(low.final_score, 0.0);
    }

    #[test]
    fn test_surrounding_respects_char_boundaries() {
        let content = "ééééé keyword ééééé";
        let start = content.find("keyword").unwrap();
        let end = start + "keyword".len();

        let window = surrounding(content, start, end, 3);
        assert_eq!(window, "éé keyword éé");
    }

    #[test]
    fn test_surrounding_clips_at_edges() {
        let content = "keyword";
        assert_eq!(surrounding(content, 0, 7, 100), "keyword");
    }
}
