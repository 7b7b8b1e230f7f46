// * Redirect Rule Store
// * Source -> destination mappings evaluated in insertion order (first match wins)

use crate::ops::clock::now_unix;
use crate::redirect::errors::RedirectError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

/// Declarative form of a redirect source, as written in rule files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SourceSpec {
    /// Path or full URL compared verbatim
    Exact(String),
    /// Regular expression, may carry capture groups for `$N` destinations
    Pattern(String),
}

/// What incoming URLs a redirect applies to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SourceSpec", into = "SourceSpec")]
pub enum RedirectSource {
    Exact(String),
    Pattern(Regex),
}

impl RedirectSource {
    pub fn exact(path: impl Into<String>) -> Self {
        RedirectSource::Exact(path.into())
    }

    pub fn pattern(expression: &str) -> Result<Self, RedirectError> {
        Regex::new(expression)
            .map(RedirectSource::Pattern)
            .map_err(|source| RedirectError::InvalidSource {
                pattern: expression.to_string(),
                source,
            })
    }

    /// Source text as written
    pub fn as_str(&self) -> &str {
        match self {
            RedirectSource::Exact(path) => path,
            RedirectSource::Pattern(regex) => regex.as_str(),
        }
    }
}

impl TryFrom<SourceSpec> for RedirectSource {
    type Error = RedirectError;

    fn try_from(spec: SourceSpec) -> Result<Self, Self::Error> {
        match spec {
            SourceSpec::Exact(path) => Ok(RedirectSource::Exact(path)),
            SourceSpec::Pattern(expression) => RedirectSource::pattern(&expression),
        }
    }
}

impl From<RedirectSource> for SourceSpec {
    fn from(source: RedirectSource) -> Self {
        match source {
            RedirectSource::Exact(path) => SourceSpec::Exact(path),
            RedirectSource::Pattern(regex) => SourceSpec::Pattern(regex.as_str().to_string()),
        }
    }
}

/// Transform from the request path to a destination
pub type DestinationFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Where a redirect points
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Destination {
    /// Template that may reference source capture groups as `$1`, `$2`, ...
    Literal(String),
    /// Computed from the request path; not expressible in rule files or server configs
    Computed(DestinationFn),
}

impl Destination {
    pub fn literal(template: impl Into<String>) -> Self {
        Destination::Literal(template.into())
    }

    pub fn computed<F>(transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Destination::Computed(Arc::new(transform))
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Destination::Literal(template) => Some(template),
            Destination::Computed(_) => None,
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Literal(template) => f.debug_tuple("Literal").field(template).finish(),
            Destination::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

impl From<String> for Destination {
    fn from(template: String) -> Self {
        Destination::Literal(template)
    }
}

impl From<Destination> for String {
    fn from(destination: Destination) -> Self {
        match destination {
            Destination::Literal(template) => template,
            Destination::Computed(_) => "<computed>".to_string(),
        }
    }
}

/// Redirect class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectKind {
    #[default]
    Permanent,
    Temporary,
    Internal,
    External,
}

/// HTTP status emitted for a redirect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum RedirectStatus {
    #[default]
    MovedPermanently,
    Found,
    TemporaryRedirect,
    PermanentRedirect,
}

impl RedirectStatus {
    pub fn code(&self) -> u16 {
        match self {
            RedirectStatus::MovedPermanently => 301,
            RedirectStatus::Found => 302,
            RedirectStatus::TemporaryRedirect => 307,
            RedirectStatus::PermanentRedirect => 308,
        }
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, RedirectStatus::MovedPermanently | RedirectStatus::PermanentRedirect)
    }
}

impl TryFrom<u16> for RedirectStatus {
    type Error = RedirectError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            301 => Ok(RedirectStatus::MovedPermanently),
            302 => Ok(RedirectStatus::Found),
            307 => Ok(RedirectStatus::TemporaryRedirect),
            308 => Ok(RedirectStatus::PermanentRedirect),
            other => Err(RedirectError::InvalidStatus(other)),
        }
    }
}

impl From<RedirectStatus> for u16 {
    fn from(status: RedirectStatus) -> Self {
        status.code()
    }
}

/// Declarative request conditions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionsSpec {
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub headers: BTreeMap<String, String>,
}

/// Request gates; every present condition must match for the redirect to apply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "ConditionsSpec", into = "ConditionsSpec")]
pub struct RedirectConditions {
    pub user_agent: Option<Regex>,
    pub referer: Option<Regex>,
    /// Lowercased header name -> value pattern
    pub headers: BTreeMap<String, Regex>,
}

fn compile_condition(expression: &str) -> Result<Regex, RedirectError> {
    Regex::new(expression).map_err(|source| RedirectError::InvalidCondition {
        pattern: expression.to_string(),
        source,
    })
}

impl RedirectConditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_agent(mut self, expression: &str) -> Result<Self, RedirectError> {
        self.user_agent = Some(compile_condition(expression)?);
        Ok(self)
    }

    pub fn referer(mut self, expression: &str) -> Result<Self, RedirectError> {
        self.referer = Some(compile_condition(expression)?);
        Ok(self)
    }

    pub fn header(mut self, name: &str, expression: &str) -> Result<Self, RedirectError> {
        self.headers.insert(name.to_lowercase(), compile_condition(expression)?);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.user_agent.is_none() && self.referer.is_none() && self.headers.is_empty()
    }
}

impl TryFrom<ConditionsSpec> for RedirectConditions {
    type Error = RedirectError;

    fn try_from(spec: ConditionsSpec) -> Result<Self, Self::Error> {
        let mut conditions = RedirectConditions::new();
        if let Some(ua) = spec.user_agent.as_deref() {
            conditions = conditions.user_agent(ua)?;
        }
        if let Some(referer) = spec.referer.as_deref() {
            conditions = conditions.referer(referer)?;
        }
        for (name, expression) in &spec.headers {
            conditions = conditions.header(name, expression)?;
        }
        Ok(conditions)
    }
}

impl From<RedirectConditions> for ConditionsSpec {
    fn from(conditions: RedirectConditions) -> Self {
        ConditionsSpec {
            user_agent: conditions.user_agent.map(|r| r.as_str().to_string()),
            referer: conditions.referer.map(|r| r.as_str().to_string()),
            headers: conditions
                .headers
                .into_iter()
                .map(|(name, regex)| (name, regex.as_str().to_string()))
                .collect(),
        }
    }
}

/// Stable id derived from the source text
pub fn derive_id(source: &str) -> String {
    format!("redirect-{:016x}", xxh64(source.as_bytes(), 0))
}

fn default_active() -> bool {
    true
}

/// Redirect rule as written in rule files; `id` is optional
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectRuleSpec {
    #[serde(default)]
    pub id: Option<String>,
    pub source: SourceSpec,
    pub destination: String,
    #[serde(default)]
    pub kind: RedirectKind,
    #[serde(default)]
    pub status_code: RedirectStatus,
    #[serde(default)]
    pub conditions: Option<ConditionsSpec>,
    #[serde(default)]
    pub preserve_query: bool,
    #[serde(default)]
    pub preserve_fragment: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// A single redirect
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RedirectRuleSpec")]
pub struct RedirectRule {
    pub id: String,
    pub source: RedirectSource,
    pub destination: Destination,
    pub kind: RedirectKind,
    pub status_code: RedirectStatus,
    pub conditions: Option<RedirectConditions>,
    pub preserve_query: bool,
    pub preserve_fragment: bool,
    pub is_active: bool,
    pub created_at: u64,
    pub modified_at: u64,
}

impl RedirectRule {
    /// Creates a 301 redirect; the id is derived from the source text
    pub fn new(source: RedirectSource, destination: Destination) -> Self {
        let now = now_unix();
        Self {
            id: derive_id(source.as_str()),
            source,
            destination,
            kind: RedirectKind::default(),
            status_code: RedirectStatus::default(),
            conditions: None,
            preserve_query: false,
            preserve_fragment: false,
            is_active: true,
            created_at: now,
            modified_at: now,
        }
    }

    /// Exact path -> literal destination
    pub fn exact(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::new(RedirectSource::exact(source), Destination::literal(destination))
    }

    /// Pattern -> destination template with `$N` backreferences
    pub fn pattern(expression: &str, destination: impl Into<String>) -> Result<Self, RedirectError> {
        Ok(Self::new(
            RedirectSource::pattern(expression)?,
            Destination::literal(destination),
        ))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_kind(mut self, kind: RedirectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_status(mut self, status: RedirectStatus) -> Self {
        self.status_code = status;
        self
    }

    pub fn with_conditions(mut self, conditions: RedirectConditions) -> Self {
        self.conditions = (!conditions.is_empty()).then_some(conditions);
        self
    }

    pub fn preserving_query(mut self) -> Self {
        self.preserve_query = true;
        self
    }

    pub fn preserving_fragment(mut self) -> Self {
        self.preserve_fragment = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl TryFrom<RedirectRuleSpec> for RedirectRule {
    type Error = RedirectError;

    fn try_from(spec: RedirectRuleSpec) -> Result<Self, Self::Error> {
        let source = RedirectSource::try_from(spec.source)?;
        let mut rule = RedirectRule::new(source, Destination::Literal(spec.destination))
            .with_kind(spec.kind)
            .with_status(spec.status_code);

        if let Some(id) = spec.id {
            rule.id = id;
        }
        if let Some(conditions) = spec.conditions {
            rule = rule.with_conditions(RedirectConditions::try_from(conditions)?);
        }
        rule.preserve_query = spec.preserve_query;
        rule.preserve_fragment = spec.preserve_fragment;
        rule.is_active = spec.is_active;
        Ok(rule)
    }
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct RedirectUpdate {
    pub source: Option<RedirectSource>,
    pub destination: Option<Destination>,
    pub kind: Option<RedirectKind>,
    pub status_code: Option<RedirectStatus>,
    pub conditions: Option<Option<RedirectConditions>>,
    pub preserve_query: Option<bool>,
    pub preserve_fragment: Option<bool>,
    pub is_active: Option<bool>,
}

/// In-memory redirect rules in evaluation order
#[derive(Debug, Clone, Default)]
pub struct RedirectStore {
    rules: Vec<RedirectRule>,
}

impl RedirectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<RedirectRule>) -> Self {
        let mut store = Self::new();
        for rule in rules {
            store.add(rule);
        }
        store
    }

    /// Loads a JSON array of redirect rules
    pub fn from_json_str(contents: &str) -> Result<Self, RedirectError> {
        let rules: Vec<RedirectRule> = serde_json::from_str(contents)?;
        Ok(Self::from_rules(rules))
    }

    /// The fixed redirect set the site starts with
    pub fn with_defaults() -> Self {
        Self::from_rules(default_redirects())
    }

    /// Adds a rule; a rule with the same id is replaced in place
    pub fn add(&mut self, rule: RedirectRule) {
        debug!(id = %rule.id, source = rule.source.as_str(), "Redirect rule added");
        match self.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Applies `update` to the rule `id`; false when no such rule exists
    pub fn update(&mut self, id: &str, update: RedirectUpdate) -> bool {
        let Some(rule) = self.rules.iter_mut().find(|r| r.id == id) else {
            return false;
        };

        if let Some(source) = update.source {
            rule.source = source;
        }
        if let Some(destination) = update.destination {
            rule.destination = destination;
        }
        if let Some(kind) = update.kind {
            rule.kind = kind;
        }
        if let Some(status) = update.status_code {
            rule.status_code = status;
        }
        if let Some(conditions) = update.conditions {
            rule.conditions = conditions;
        }
        if let Some(preserve) = update.preserve_query {
            rule.preserve_query = preserve;
        }
        if let Some(preserve) = update.preserve_fragment {
            rule.preserve_fragment = preserve;
        }
        if let Some(active) = update.is_active {
            rule.is_active = active;
        }
        rule.modified_at = now_unix().max(rule.created_at);

        debug!(id = id, "Redirect rule updated");
        true
    }

    /// Removes the rule `id`; false when no such rule exists
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        let removed = self.rules.len() != before;
        if removed {
            debug!(id = id, "Redirect rule removed");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&RedirectRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn list(&self) -> &[RedirectRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Default redirects for retired site sections
pub fn default_redirects() -> Vec<RedirectRule> {
    let mut rules = Vec::new();

    if let Ok(rule) = RedirectRule::pattern(r"^/old-services/(.+)$", "/services/$1/") {
        rules.push(rule.with_id("old-services"));
    }
    if let Ok(rule) = RedirectRule::pattern(r"^/blog/(.+)$", "/insights/$1") {
        rules.push(rule.with_id("blog-to-insights").preserving_query());
    }

    rules.push(RedirectRule::exact("/ai-consulting", "/services/ai-strategy/").with_id("ai-consulting"));
    rules.push(
        RedirectRule::exact("/contact-us", "/contact/")
            .with_id("contact-us")
            .with_status(RedirectStatus::PermanentRedirect)
            .preserving_query(),
    );
    rules.push(
        RedirectRule::exact("/careers", "https://jobs.example.com/")
            .with_id("careers")
            .with_kind(RedirectKind::External)
            .with_status(RedirectStatus::Found),
    );

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_derived_from_source() {
        let a = RedirectRule::exact("/old", "/new");
        let b = RedirectRule::exact("/old", "/other");
        assert_eq!(a.id, b.id);
        assert!(a.id.starts_with("redirect-"));
        assert_ne!(a.id, RedirectRule::exact("/older", "/new").id);
    }

    #[test]
    fn test_invalid_source_pattern_rejected() {
        assert!(matches!(
            RedirectRule::pattern("^/broken(", "/x"),
            Err(RedirectError::InvalidSource { .. })
        ));
    }

    #[test]
    fn test_status_code_conversion() {
        assert_eq!(RedirectStatus::try_from(308).unwrap(), RedirectStatus::PermanentRedirect);
        assert!(matches!(RedirectStatus::try_from(200), Err(RedirectError::InvalidStatus(200))));
        assert!(RedirectStatus::MovedPermanently.is_permanent());
        assert!(!RedirectStatus::Found.is_permanent());
    }

    #[test]
    fn test_store_crud() {
        let mut store = RedirectStore::new();
        store.add(RedirectRule::exact("/a", "/b").with_id("a"));
        store.add(RedirectRule::exact("/c", "/d").with_id("c"));
        assert_eq!(store.len(), 2);

        assert!(store.update(
            "a",
            RedirectUpdate {
                destination: Some(Destination::literal("/z")),
                status_code: Some(RedirectStatus::Found),
                ..Default::default()
            }
        ));
        let rule = store.get("a").unwrap();
        assert_eq!(rule.destination.as_literal(), Some("/z"));
        assert_eq!(rule.status_code.code(), 302);
        assert!(rule.modified_at >= rule.created_at);

        assert!(!store.update("missing", RedirectUpdate::default()));
        assert!(store.remove("c"));
        assert!(!store.remove("c"));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_add_same_id_replaces_in_place() {
        let mut store = RedirectStore::from_rules(vec![
            RedirectRule::exact("/a", "/b").with_id("a"),
            RedirectRule::exact("/c", "/d").with_id("c"),
        ]);
        store.add(RedirectRule::exact("/a", "/new").with_id("a"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[0].destination.as_literal(), Some("/new"));
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"[
            {"source": {"pattern": "^/legacy/(.+)$"}, "destination": "/new/$1", "status_code": 308,
             "conditions": {"user_agent": "(?i)bot", "headers": {"X-Region": "^eu$"}}},
            {"id": "home", "source": {"exact": "/index.html"}, "destination": "/", "is_active": false}
        ]"#;

        let store = RedirectStore::from_json_str(json).unwrap();
        assert_eq!(store.len(), 2);

        let legacy = &store.list()[0];
        assert_eq!(legacy.id, derive_id("^/legacy/(.+)$"));
        assert_eq!(legacy.status_code, RedirectStatus::PermanentRedirect);
        let conditions = legacy.conditions.as_ref().unwrap();
        assert!(conditions.user_agent.is_some());
        assert!(conditions.headers.contains_key("x-region"));

        assert!(!store.get("home").unwrap().is_active);
    }

    #[test]
    fn test_from_json_rejects_bad_status() {
        let json = r#"[{"source": {"exact": "/a"}, "destination": "/b", "status_code": 200}]"#;
        assert!(matches!(RedirectStore::from_json_str(json), Err(RedirectError::Json(_))));
    }

    #[test]
    fn test_computed_destination_serializes_as_placeholder() {
        let rule = RedirectRule::new(
            RedirectSource::exact("/x"),
            Destination::computed(|path| path.to_uppercase()),
        );
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["destination"], "<computed>");
        assert_eq!(json["status_code"], 301);
        assert_eq!(json["source"]["exact"], "/x");
    }

    #[test]
    fn test_defaults() {
        let store = RedirectStore::with_defaults();
        assert!(store.get("old-services").is_some());
        assert!(store.list().iter().all(|r| r.is_active));
    }
}
