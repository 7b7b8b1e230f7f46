// * Linking Report
// * Combines the site analysis with a summary of the rule set and per-rule effectiveness

use crate::engine::graph::LinkingAnalysis;
use crate::engine::ranker::LinkSuggestion;
use crate::engine::rules::RuleStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesSummary {
    pub total_rules: usize,
    pub active_rules: usize,
    pub average_priority: f64,
    /// Number of rules pointing at each target URL
    pub rules_per_target: BTreeMap<String, usize>,
}

impl RulesSummary {
    pub fn from_store(store: &RuleStore) -> Self {
        let rules = store.list();
        let active: Vec<_> = rules.iter().filter(|r| r.is_active).collect();

        let average_priority = if active.is_empty() {
            0.0
        } else {
            active.iter().map(|r| r.priority as f64).sum::<f64>() / active.len() as f64
        };

        let mut rules_per_target = BTreeMap::new();
        for rule in &active {
            *rules_per_target.entry(rule.target_url.clone()).or_insert(0) += 1;
        }

        Self {
            total_rules: rules.len(),
            active_rules: active.len(),
            average_priority,
            rules_per_target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleUsage {
    pub rule_id: String,
    pub suggestions: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationSummary {
    /// Active rules that produced no suggestion on any page
    pub unused_rules: Vec<String>,
    /// Active rules by suggestion count, most effective first
    pub rule_usage: Vec<RuleUsage>,
    /// Pages with no outbound suggestions
    pub pages_without_links: Vec<String>,
    pub opportunities: Vec<String>,
}

impl OptimizationSummary {
    pub fn build(store: &RuleStore, per_page: &[(String, Vec<LinkSuggestion>)]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (_, suggestions) in per_page {
            for suggestion in suggestions {
                *counts.entry(suggestion.rule_id.as_str()).or_insert(0) += 1;
            }
        }

        let mut rule_usage: Vec<RuleUsage> = store
            .list()
            .iter()
            .filter(|r| r.is_active)
            .map(|r| RuleUsage {
                rule_id: r.id.clone(),
                suggestions: counts.get(r.id.as_str()).copied().unwrap_or(0),
            })
            .collect();
        rule_usage.sort_by(|a, b| b.suggestions.cmp(&a.suggestions));

        let unused_rules: Vec<String> = rule_usage
            .iter()
            .filter(|u| u.suggestions == 0)
            .map(|u| u.rule_id.clone())
            .collect();

        let pages_without_links: Vec<String> = per_page
            .iter()
            .filter(|(_, s)| s.is_empty())
            .map(|(url, _)| url.clone())
            .collect();

        let mut opportunities = Vec::new();
        if !unused_rules.is_empty() {
            opportunities.push(format!(
                "{} rule(s) never matched; broaden their patterns or retire them: {}",
                unused_rules.len(),
                unused_rules.join(", ")
            ));
        }
        if let Some(top) = rule_usage.first().filter(|u| u.suggestions > 0) {
            opportunities.push(format!(
                "Rule '{}' is the most productive with {} suggestion(s); mirror its keywords for related targets",
                top.rule_id, top.suggestions
            ));
        }
        if !pages_without_links.is_empty() {
            opportunities.push(format!(
                "{} page(s) have no link opportunities; enrich their copy with service and industry terms",
                pages_without_links.len()
            ));
        }

        Self {
            unused_rules,
            rule_usage,
            pages_without_links,
            opportunities,
        }
    }
}

/// Full linking report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkingReport {
    pub analysis: LinkingAnalysis,
    pub rules_summary: RulesSummary,
    pub optimization: OptimizationSummary,
}

impl LinkingReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::LinkRule;

    fn store() -> RuleStore {
        RuleStore::from_rules(vec![
            LinkRule::keyword("a", "alpha", "/alpha/", "alpha").unwrap().with_priority(10),
            LinkRule::keyword("b", "beta", "/alpha/", "beta").unwrap().with_priority(20),
            LinkRule::keyword("c", "gamma", "/gamma/", "gamma").unwrap().inactive(),
        ])
    }

    fn suggestion(rule_id: &str) -> LinkSuggestion {
        LinkSuggestion {
            rule_id: rule_id.to_string(),
            keyword: String::new(),
            target_url: "/alpha/".to_string(),
            anchor_text: String::new(),
            confidence: 0.8,
            seo_value: 1.0,
            position: 0,
            length: 0,
            context: String::new(),
            reason: String::new(),
        }
    }

    #[test]
    fn test_rules_summary() {
        let summary = RulesSummary::from_store(&store());
        assert_eq!(summary.total_rules, 3);
        assert_eq!(summary.active_rules, 2);
        assert!((summary.average_priority - 15.0).abs() < f64::EPSILON);
        assert_eq!(summary.rules_per_target.get("/alpha/"), Some(&2));
        assert!(!summary.rules_per_target.contains_key("/gamma/"));
    }

    #[test]
    fn test_optimization_summary() {
        let per_page = vec![
            ("/one".to_string(), vec![suggestion("a"), suggestion("a")]),
            ("/two".to_string(), vec![]),
        ];

        let summary = OptimizationSummary::build(&store(), &per_page);
        assert_eq!(summary.unused_rules, vec!["b".to_string()]);
        assert_eq!(summary.rule_usage[0], RuleUsage { rule_id: "a".to_string(), suggestions: 2 });
        assert_eq!(summary.pages_without_links, vec!["/two".to_string()]);
        assert_eq!(summary.opportunities.len(), 3);
    }
}
