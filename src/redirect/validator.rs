// * Redirect Chain Validator
// * Static pass over the rule set: loops, over-long chains and unparseable destinations

use crate::ops::telemetry;
use crate::redirect::resolver::{ConditionMode, RedirectResolver};
use crate::redirect::rules::{Destination, RedirectRule, RedirectSource};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectIssueKind {
    Loop,
    Chain,
    InvalidDestination,
}

impl RedirectIssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectIssueKind::Loop => "loop",
            RedirectIssueKind::Chain => "chain",
            RedirectIssueKind::InvalidDestination => "invalid_destination",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectIssue {
    pub kind: RedirectIssueKind,
    pub rule_id: String,
    pub message: String,
    /// URLs visited while following the chain, in order
    pub path: Vec<String>,
}

/// Outcome of validating a rule set; `valid` iff `issues` is empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedirectValidation {
    pub valid: bool,
    pub issues: Vec<RedirectIssue>,
}

impl RedirectValidation {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Static loop, chain-length and destination checks over a rule list
#[derive(Debug, Clone)]
pub struct ChainValidator<'a> {
    base: &'a Url,
    max_depth: usize,
}

impl<'a> ChainValidator<'a> {
    pub fn new(base: &'a Url, max_depth: usize) -> Self {
        Self { base, max_depth }
    }

    pub fn validate(&self, rules: &[RedirectRule]) -> RedirectValidation {
        let mut issues = Vec::new();

        for rule in rules.iter().filter(|r| r.is_active) {
            if let Some(issue) = self.check_destination(rule) {
                issues.push(issue);
                continue;
            }
            if let Some(issue) = self.follow_chain(rules, rule) {
                issues.push(issue);
            }
        }

        for issue in &issues {
            warn!(
                rule_id = %issue.rule_id,
                kind = issue.kind.as_str(),
                message = %issue.message,
                "Redirect issue"
            );
            telemetry::record_redirect_issue(issue.kind.as_str());
        }

        RedirectValidation {
            valid: issues.is_empty(),
            issues,
        }
    }

    fn check_destination(&self, rule: &RedirectRule) -> Option<RedirectIssue> {
        let template = rule.destination.as_literal()?;
        if !template.trim().is_empty() && self.base.join(template).is_ok() {
            return None;
        }

        Some(RedirectIssue {
            kind: RedirectIssueKind::InvalidDestination,
            rule_id: rule.id.clone(),
            message: format!("Destination '{}' is not a valid URL", template),
            path: vec![template.to_string()],
        })
    }

    // * Re-resolve each destination as a fresh request until nothing matches,
    // * a URL repeats, or the hop cap is exceeded
    fn follow_chain(&self, rules: &[RedirectRule], rule: &RedirectRule) -> Option<RedirectIssue> {
        let first = match (&rule.source, &rule.destination) {
            (_, Destination::Literal(template)) => template.clone(),
            (RedirectSource::Exact(source), Destination::Computed(transform)) => transform(source),
            // * A computed destination behind a pattern has no static first hop
            (RedirectSource::Pattern(_), Destination::Computed(_)) => return None,
        };

        let resolver = RedirectResolver::new(self.base);
        let mut visited: HashSet<String> = HashSet::new();
        let mut trail: Vec<String> = Vec::new();

        if let RedirectSource::Exact(source) = &rule.source {
            visited.insert(self.key(source));
            trail.push(source.clone());
        }

        let mut current = first;
        let mut hops = 1usize;

        loop {
            let key = self.key(&current);
            trail.push(current.clone());

            if !visited.insert(key) {
                return Some(RedirectIssue {
                    kind: RedirectIssueKind::Loop,
                    rule_id: rule.id.clone(),
                    message: format!("Redirect loop: {}", trail.join(" -> ")),
                    path: trail,
                });
            }

            let next = resolver.first_match(rules, &current, None, ConditionMode::Ignore)?;
            hops += 1;
            if hops > self.max_depth {
                trail.push(next.destination);
                return Some(RedirectIssue {
                    kind: RedirectIssueKind::Chain,
                    rule_id: rule.id.clone(),
                    message: format!(
                        "Redirect chain too long: more than {} hops starting at {}",
                        self.max_depth,
                        rule.source.as_str()
                    ),
                    path: trail,
                });
            }
            current = next.destination;
        }
    }

    // * Absolute form without fragment, so relative and absolute spellings compare equal
    fn key(&self, url: &str) -> String {
        match self.base.join(url) {
            Ok(mut parsed) => {
                parsed.set_fragment(None);
                parsed.to_string()
            }
            Err(_) => url.to_string(),
        }
    }
}
