// * Redirect Resolver
// * Single-pass, stateless resolution of a request URL against the redirect rules

use crate::ops::telemetry;
use crate::redirect::rules::{Destination, RedirectConditions, RedirectRule, RedirectSource};
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

pub(crate) static BACKREFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("! CRITICAL: backreference regex"));

/// Request attributes the redirect conditions may test
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    /// Lowercased header name -> value
    pub headers: HashMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }
}

/// Result of one resolution
#[derive(Debug, Clone, Serialize)]
pub struct RedirectMatch {
    pub rule: RedirectRule,
    /// Absolute destination URL
    pub destination: String,
    pub status_code: u16,
    /// Capture groups 1..N of a pattern source; `None` for groups that did not participate
    pub captures: Vec<Option<String>>,
}

/// Whether request conditions gate the match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConditionMode {
    Enforce,
    /// Static analysis: conditions are assumed satisfied
    Ignore,
}

/// Resolves URLs against an ordered rule list relative to a base origin
#[derive(Debug, Clone)]
pub struct RedirectResolver<'a> {
    base: &'a Url,
}

impl<'a> RedirectResolver<'a> {
    pub fn new(base: &'a Url) -> Self {
        Self { base }
    }

    /// First active rule matching `url` wins; `None` means no redirect
    pub fn resolve(
        &self,
        rules: &[RedirectRule],
        url: &str,
        context: Option<&RequestContext>,
    ) -> Option<RedirectMatch> {
        let resolved = self.first_match(rules, url, context, ConditionMode::Enforce);

        match &resolved {
            Some(m) => debug!(
                url = url,
                rule_id = %m.rule.id,
                destination = %m.destination,
                status = m.status_code,
                "Redirect resolved"
            ),
            None => debug!(url = url, "No redirect matched"),
        }
        telemetry::record_redirect_resolution(resolved.as_ref().map(|m| m.status_code));

        resolved
    }

    pub(crate) fn first_match(
        &self,
        rules: &[RedirectRule],
        url: &str,
        context: Option<&RequestContext>,
        mode: ConditionMode,
    ) -> Option<RedirectMatch> {
        let request = self.base.join(url).ok()?;
        let path = request.path().to_string();

        let mut full = request.clone();
        full.set_query(None);
        full.set_fragment(None);
        let candidates = [path.as_str(), full.as_str(), url];

        for rule in rules.iter().filter(|r| r.is_active) {
            let Some(captures) = match_source(&rule.source, &candidates) else {
                continue;
            };

            if mode == ConditionMode::Enforce {
                if let Some(conditions) = &rule.conditions {
                    if !conditions_pass(conditions, context) {
                        continue;
                    }
                }
            }

            let computed = match &rule.destination {
                Destination::Literal(template) => substitute(template, &captures),
                Destination::Computed(transform) => transform(&path),
            };

            let destination = self.finalize(&computed, rule, &request);
            return Some(RedirectMatch {
                rule: rule.clone(),
                destination,
                status_code: rule.status_code.code(),
                captures,
            });
        }

        None
    }

    // * Absolutize against the base origin, then carry query/fragment over when asked
    fn finalize(&self, computed: &str, rule: &RedirectRule, request: &Url) -> String {
        let Ok(mut target) = self.base.join(computed) else {
            return computed.to_string();
        };

        if rule.preserve_query {
            if let Some(query) = request.query().filter(|q| !q.is_empty()) {
                let merged = match target.query().filter(|q| !q.is_empty()) {
                    Some(existing) => format!("{}&{}", existing, query),
                    None => query.to_string(),
                };
                target.set_query(Some(&merged));
            }
        }

        if rule.preserve_fragment {
            if let Some(fragment) = request.fragment() {
                target.set_fragment(Some(fragment));
            }
        }

        target.to_string()
    }
}

// * Returns capture groups 1..N when any candidate form of the URL matches
fn match_source(source: &RedirectSource, candidates: &[&str]) -> Option<Vec<Option<String>>> {
    match source {
        RedirectSource::Exact(expected) => candidates
            .iter()
            .any(|c| *c == expected.as_str())
            .then(Vec::new),
        RedirectSource::Pattern(regex) => candidates.iter().find_map(|candidate| {
            regex.captures(candidate).map(|caps| {
                caps.iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.as_str().to_string()))
                    .collect()
            })
        }),
    }
}

/// Replaces `$N` with capture group N; a missing group leaves the token as written
pub fn substitute(template: &str, captures: &[Option<String>]) -> String {
    BACKREFERENCE
        .replace_all(template, |caps: &Captures| {
            let token = &caps[0];
            caps[1]
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .and_then(|n| captures.get(n - 1))
                .and_then(|group| group.clone())
                .unwrap_or_else(|| token.to_string())
        })
        .into_owned()
}

fn conditions_pass(conditions: &RedirectConditions, context: Option<&RequestContext>) -> bool {
    let empty = RequestContext::default();
    let context = context.unwrap_or(&empty);

    let gate = |pattern: &Option<Regex>, value: Option<&String>| match pattern {
        Some(regex) => value.is_some_and(|v| regex.is_match(v)),
        None => true,
    };

    gate(&conditions.user_agent, context.user_agent.as_ref())
        && gate(&conditions.referer, context.referer.as_ref())
        && conditions
            .headers
            .iter()
            .all(|(name, regex)| context.headers.get(name).is_some_and(|v| regex.is_match(v)))
}
