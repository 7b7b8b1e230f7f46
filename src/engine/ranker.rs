// * Suggestion Ranker
// * Priority-first candidate selection under per-page caps, then value-weighted final ranking

use crate::config::LinkingConfig;
use crate::engine::confidence::{surrounding, ConfidenceScorer};
use crate::engine::matcher::find_matches;
use crate::engine::normalization::page_key;
use crate::engine::page::PageContext;
use crate::engine::rules::{Position, RuleStore};
use crate::engine::scope;
use crate::ops::telemetry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use url::Url;

/// A proposed internal link, produced from one accepted rule match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSuggestion {
    pub rule_id: String,
    /// Matched text as it appears in the content
    pub keyword: String,
    pub target_url: String,
    pub anchor_text: String,
    pub confidence: f64,
    pub seo_value: f64,
    /// Byte offset of the match in the source content
    pub position: usize,
    /// Byte length of the match
    pub length: usize,
    /// Content surrounding the match
    pub context: String,
    pub reason: String,
}

impl LinkSuggestion {
    /// Weight used for final ordering
    pub fn value(&self) -> f64 {
        self.seo_value * self.confidence
    }
}

/// Why a candidate match was not kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Position,
    DuplicateAnchor,
    LowConfidence,
}

impl Rejection {
    fn as_str(&self) -> &'static str {
        match self {
            Rejection::Position => "position",
            Rejection::DuplicateAnchor => "duplicate_anchor",
            Rejection::LowConfidence => "low_confidence",
        }
    }
}

/// Runs the match -> scope -> score -> select pipeline for one page
#[derive(Debug, Clone)]
pub struct SuggestionRanker {
    scorer: ConfidenceScorer,
    min_confidence: f64,
    max_suggestions: usize,
    context_window: usize,
}

impl SuggestionRanker {
    pub fn new(config: &LinkingConfig) -> Self {
        Self {
            scorer: ConfidenceScorer::with_config(config),
            min_confidence: config.min_confidence,
            max_suggestions: config.max_suggestions,
            context_window: config.context_window,
        }
    }

    /// Produces the ranked suggestions for `page` from the active rules in `store`
    pub fn rank(&self, store: &RuleStore, page: &PageContext, base: &Url) -> Vec<LinkSuggestion> {
        let content = page.content.as_str();
        let page_type = Some(page.effective_page_type());
        let current_key = page_key(&page.url, base);

        let mut accepted: Vec<LinkSuggestion> = Vec::new();
        let mut per_target: HashMap<String, usize> = HashMap::new();
        let mut used_anchors: HashSet<String> = HashSet::new();

        for rule in store.by_priority() {
            if !scope::admits(rule.scope.as_ref(), &page.url, page_type) {
                continue;
            }

            // * A page never links to itself
            if page_key(&rule.target_url, base) == current_key {
                continue;
            }

            let matches = find_matches(content, &rule.pattern);
            if matches.is_empty() {
                continue;
            }

            let last_index = matches.len() - 1;
            let cap = rule.max_links_per_page();
            let position = rule.position();

            for (index, matched) in matches.iter().enumerate() {
                // * Only early matches count toward the cap: stop, don't skip
                if let Some(cap) = cap {
                    if per_target.get(&rule.target_url).copied().unwrap_or(0) >= cap {
                        telemetry::record_suggestion_outcome("capped");
                        break;
                    }
                }

                let rejection = match position {
                    Position::First if index != 0 => Some(Rejection::Position),
                    Position::Last if index != last_index => Some(Rejection::Position),
                    _ if used_anchors.contains(&rule.anchor_text) => Some(Rejection::DuplicateAnchor),
                    _ => None,
                };
                if let Some(rejection) = rejection {
                    telemetry::record_suggestion_outcome(rejection.as_str());
                    continue;
                }

                let breakdown = self.scorer.score(content, rule, matched, matches.len());
                if breakdown.final_score < self.min_confidence {
                    debug!(
                        rule_id = %rule.id,
                        confidence = breakdown.final_score,
                        "Match rejected below confidence threshold"
                    );
                    telemetry::record_suggestion_outcome(Rejection::LowConfidence.as_str());
                    continue;
                }

                accepted.push(LinkSuggestion {
                    rule_id: rule.id.clone(),
                    keyword: matched.text.clone(),
                    target_url: rule.target_url.clone(),
                    anchor_text: rule.anchor_text.clone(),
                    confidence: breakdown.final_score,
                    seo_value: rule.seo_value,
                    position: matched.start,
                    length: matched.len(),
                    context: surrounding(content, matched.start, matched.end, self.context_window)
                        .trim()
                        .to_string(),
                    reason: rule.reason(),
                });
                *per_target.entry(rule.target_url.clone()).or_insert(0) += 1;
                used_anchors.insert(rule.anchor_text.clone());
                telemetry::record_suggestion_outcome("accepted");
            }
        }

        // * Final ordering by value; stable so priority order breaks ties
        accepted.sort_by(|a, b| b.value().partial_cmp(&a.value()).unwrap_or(Ordering::Equal));
        accepted.truncate(self.max_suggestions);

        debug!(url = %page.url, suggestions = accepted.len(), "Page analyzed");
        telemetry::record_page_analyzed();
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::{LinkRule, RulePattern, RuleScope};

    fn base() -> Url {
        Url::parse("https://example.com").unwrap()
    }

    fn ranker() -> SuggestionRanker {
        SuggestionRanker::new(&LinkingConfig::default())
    }

    fn padded(text: &str) -> String {
        let filler = vec!["lorem ipsum dolor"; 40].join(" ");
        format!("{} {} {}", filler, text, filler)
    }

    fn rule(id: &str, keyword: &str, target: &str, anchor: &str) -> LinkRule {
        LinkRule::keyword(id, keyword, target, anchor).unwrap()
    }

    #[test]
    fn test_inactive_rules_never_fire() {
        let store = RuleStore::from_rules(vec![
            rule("off", "machine learning", "/ml/", "ml").inactive(),
        ]);
        let page = PageContext::new("/blog/post", padded("machine learning"));

        assert!(ranker().rank(&store, &page, &base()).is_empty());
    }

    #[test]
    fn test_max_links_per_page_breaks_after_cap() {
        let scope = RuleScope {
            max_links_per_page: Some(1),
            ..Default::default()
        };
        let store = RuleStore::from_rules(vec![
            rule("a", "data platform", "/platform/", "data platform").with_scope(scope.clone()),
            rule("b", "analytics", "/platform/", "analytics platform").with_scope(scope),
        ]);
        let page = PageContext::new("/blog/post", padded("data platform and analytics"));

        let suggestions = ranker().rank(&store, &page, &base());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].rule_id, "a");
    }

    #[test]
    fn test_position_first_and_last() {
        let store = RuleStore::from_rules(vec![
            rule("first", "alpha", "/alpha/", "alpha").with_scope(RuleScope {
                position: Position::First,
                ..Default::default()
            }),
            rule("last", "beta", "/beta/", "beta").with_scope(RuleScope {
                position: Position::Last,
                ..Default::default()
            }),
        ]);
        let content = padded("alpha beta one. alpha beta two. alpha beta three.");
        let page = PageContext::new("/blog/post", content.clone());

        let suggestions = ranker().rank(&store, &page, &base());
        let first = suggestions.iter().find(|s| s.rule_id == "first").unwrap();
        let last = suggestions.iter().find(|s| s.rule_id == "last").unwrap();

        assert_eq!(first.position, content.find("alpha").unwrap());
        assert_eq!(last.position, content.rfind("beta").unwrap());
    }

    #[test]
    fn test_anchor_used_once_per_page() {
        let store = RuleStore::from_rules(vec![
            rule("a", "alpha", "/alpha/", "shared anchor"),
            rule("b", "beta", "/beta/", "shared anchor"),
        ]);
        let page = PageContext::new("/blog/post", padded("alpha alpha beta"));

        let suggestions = ranker().rank(&store, &page, &base());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].rule_id, "a");
    }

    #[test]
    fn test_low_confidence_rejected() {
        let config = LinkingConfig {
            min_confidence: 0.9,
            ..Default::default()
        };
        let store = RuleStore::from_rules(vec![rule("a", "alpha", "/alpha/", "alpha")]);
        let page = PageContext::new("/blog/post", padded("alpha"));

        assert!(SuggestionRanker::new(&config).rank(&store, &page, &base()).is_empty());
    }

    #[test]
    fn test_truncated_to_max_and_sorted_by_value() {
        let rules: Vec<LinkRule> = (0..15)
            .map(|i| {
                rule(&format!("r{i}"), &format!("topic{i}"), &format!("/t{i}/"), &format!("anchor {i}"))
                    .with_seo_value(i as f64 / 15.0 + 0.1)
            })
            .collect();
        let text: Vec<String> = (0..15).map(|i| format!("topic{i}")).collect();
        let page = PageContext::new("/blog/post", padded(&text.join(" and ")));

        let suggestions = ranker().rank(&RuleStore::from_rules(rules), &page, &base());
        assert_eq!(suggestions.len(), 10);
        assert!(suggestions.windows(2).all(|w| w[0].value() >= w[1].value()));
        assert_eq!(suggestions[0].rule_id, "r14");
    }

    #[test]
    fn test_self_link_skipped() {
        let store = RuleStore::from_rules(vec![rule("a", "alpha", "/alpha/", "alpha")]);
        let page = PageContext::new("https://example.com/alpha", padded("alpha"));

        assert!(ranker().rank(&store, &page, &base()).is_empty());
    }

    #[test]
    fn test_expression_rule_suggestion_fields() {
        let pattern = RulePattern::regex(r"(?i)\bLLMs?\b").unwrap();
        let store = RuleStore::from_rules(vec![
            LinkRule::new("llm", pattern, "/services/llm/", "LLM integration")
                .with_seo_value(0.8)
                .with_description("LLM mentions"),
        ]);
        let content = padded("we deploy LLMs safely");
        let page = PageContext::new("/blog/post", content.clone());

        let suggestions = ranker().rank(&store, &page, &base());
        assert_eq!(suggestions.len(), 1);

        let s = &suggestions[0];
        assert_eq!(s.keyword, "LLMs");
        assert_eq!(&content[s.position..s.position + s.length], "LLMs");
        assert_eq!(s.reason, "LLM mentions");
        assert!(s.context.contains("we deploy LLMs safely"));
        assert!((s.confidence - 0.70).abs() < 1e-9);
    }
}
