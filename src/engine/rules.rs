// * Linking Rule Store
// * Declarative keyword -> target rules with priority, SEO weight and scoping conditions

use crate::engine::page::PageType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to parse rules: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Declarative form of a pattern, as written in rule files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PatternSpec {
    /// Plain keyword, matched case-insensitively on word boundaries
    Literal(String),
    /// Regular expression used as written
    Regex(String),
}

/// A compiled, always-matchable rule pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PatternSpec", into = "PatternSpec")]
pub enum RulePattern {
    Literal { text: String, matcher: Regex },
    Expression(Regex),
}

impl RulePattern {
    /// Builds a literal keyword pattern.
    /// Word boundaries are only added on sides where the keyword starts/ends with a word character.
    pub fn literal(text: impl Into<String>) -> Result<Self, RuleError> {
        let text = text.into();
        let escaped = regex::escape(&text);
        let is_word = |c: char| c.is_alphanumeric() || c == '_';
        let lead = if text.chars().next().is_some_and(is_word) { r"\b" } else { "" };
        let trail = if text.chars().last().is_some_and(is_word) { r"\b" } else { "" };

        let source = format!("(?i){lead}{escaped}{trail}");
        let matcher = Regex::new(&source).map_err(|source| RuleError::InvalidPattern {
            pattern: text.clone(),
            source,
        })?;

        Ok(RulePattern::Literal { text, matcher })
    }

    /// Builds an expression pattern; case sensitivity is controlled by the expression's own flags
    pub fn regex(expression: &str) -> Result<Self, RuleError> {
        Regex::new(expression)
            .map(RulePattern::Expression)
            .map_err(|source| RuleError::InvalidPattern {
                pattern: expression.to_string(),
                source,
            })
    }

    /// Returns the compiled matcher
    pub fn matcher(&self) -> &Regex {
        match self {
            RulePattern::Literal { matcher, .. } => matcher,
            RulePattern::Expression(regex) => regex,
        }
    }

    /// Returns the literal keyword, if this is a literal pattern
    pub fn literal_text(&self) -> Option<&str> {
        match self {
            RulePattern::Literal { text, .. } => Some(text),
            RulePattern::Expression(_) => None,
        }
    }

    /// Human-readable form used in reasons and summaries
    pub fn describe(&self) -> String {
        match self {
            RulePattern::Literal { text, .. } => format!("\"{}\"", text),
            RulePattern::Expression(regex) => format!("/{}/", regex.as_str()),
        }
    }
}

impl TryFrom<PatternSpec> for RulePattern {
    type Error = RuleError;

    fn try_from(spec: PatternSpec) -> Result<Self, Self::Error> {
        match spec {
            PatternSpec::Literal(text) => RulePattern::literal(text),
            PatternSpec::Regex(expression) => RulePattern::regex(&expression),
        }
    }
}

impl From<RulePattern> for PatternSpec {
    fn from(pattern: RulePattern) -> Self {
        match pattern {
            RulePattern::Literal { text, .. } => PatternSpec::Literal(text),
            RulePattern::Expression(regex) => PatternSpec::Regex(regex.as_str().to_string()),
        }
    }
}

/// Which matches of a rule on a page may become suggestions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    First,
    Last,
    #[default]
    All,
}

/// Per-rule conditions restricting where and how often a rule fires
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleScope {
    /// URL substrings; when non-empty the page URL must contain one of them
    pub include_pages: Vec<String>,
    /// URL substrings; a page URL containing any of them is skipped
    pub exclude_pages: Vec<String>,
    /// Maximum suggestions pointing at this rule's target on one page
    pub max_links_per_page: Option<usize>,
    pub position: Position,
    /// Terms whose presence near a match raises confidence
    pub proximity_terms: Vec<String>,
    /// When non-empty, only pages of these types are considered
    pub page_types: Vec<PageType>,
}

fn default_active() -> bool {
    true
}

fn default_seo_value() -> f64 {
    1.0
}

/// A keyword -> internal link rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRule {
    pub id: String,
    pub pattern: RulePattern,
    pub target_url: String,
    pub anchor_text: String,
    /// Higher is evaluated first
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_seo_value")]
    pub seo_value: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scope: Option<RuleScope>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl LinkRule {
    pub fn new(
        id: impl Into<String>,
        pattern: RulePattern,
        target_url: impl Into<String>,
        anchor_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            pattern,
            target_url: target_url.into(),
            anchor_text: anchor_text.into(),
            priority: 0,
            seo_value: default_seo_value(),
            description: String::new(),
            scope: None,
            is_active: true,
        }
    }

    /// Shorthand for a literal keyword rule
    pub fn keyword(
        id: impl Into<String>,
        keyword: &str,
        target_url: impl Into<String>,
        anchor_text: impl Into<String>,
    ) -> Result<Self, RuleError> {
        Ok(Self::new(id, RulePattern::literal(keyword)?, target_url, anchor_text))
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_seo_value(mut self, seo_value: f64) -> Self {
        self.seo_value = seo_value;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_scope(mut self, scope: RuleScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Reason string attached to suggestions produced by this rule
    pub fn reason(&self) -> String {
        if self.description.is_empty() {
            format!("Matched {} -> {}", self.pattern.describe(), self.target_url)
        } else {
            self.description.clone()
        }
    }

    pub fn proximity_terms(&self) -> &[String] {
        self.scope.as_ref().map(|s| s.proximity_terms.as_slice()).unwrap_or(&[])
    }

    pub fn max_links_per_page(&self) -> Option<usize> {
        self.scope.as_ref().and_then(|s| s.max_links_per_page)
    }

    pub fn position(&self) -> Position {
        self.scope.as_ref().map(|s| s.position).unwrap_or_default()
    }
}

/// Partial update for a stored rule; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub pattern: Option<RulePattern>,
    pub target_url: Option<String>,
    pub anchor_text: Option<String>,
    pub priority: Option<i32>,
    pub seo_value: Option<f64>,
    pub description: Option<String>,
    /// `Some(None)` clears the scope
    pub scope: Option<Option<RuleScope>>,
    pub is_active: Option<bool>,
}

impl RuleUpdate {
    fn apply(self, rule: &mut LinkRule) {
        if let Some(pattern) = self.pattern {
            rule.pattern = pattern;
        }
        if let Some(target_url) = self.target_url {
            rule.target_url = target_url;
        }
        if let Some(anchor_text) = self.anchor_text {
            rule.anchor_text = anchor_text;
        }
        if let Some(priority) = self.priority {
            rule.priority = priority;
        }
        if let Some(seo_value) = self.seo_value {
            rule.seo_value = seo_value;
        }
        if let Some(description) = self.description {
            rule.description = description;
        }
        if let Some(scope) = self.scope {
            rule.scope = scope;
        }
        if let Some(is_active) = self.is_active {
            rule.is_active = is_active;
        }
    }
}

/// In-memory rule collection keyed by id, kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: Vec<LinkRule>,
}

impl RuleStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given rules in order
    pub fn from_rules(rules: Vec<LinkRule>) -> Self {
        let mut store = Self::new();
        for rule in rules {
            store.add(rule);
        }
        store
    }

    /// Loads rules from a JSON array; every pattern is compiled on load
    pub fn from_json_str(json: &str) -> Result<Self, RuleError> {
        let rules: Vec<LinkRule> = serde_json::from_str(json)?;
        Ok(Self::from_rules(rules))
    }

    /// Creates a store with the default consulting-site rule set
    pub fn with_defaults() -> Self {
        Self::from_rules(default_rules())
    }

    /// Adds a rule. A rule with an existing id replaces it in place.
    pub fn add(&mut self, rule: LinkRule) {
        debug!(rule_id = %rule.id, target = %rule.target_url, "Link rule added");
        match self.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    /// Applies a partial update; returns false if the id is unknown
    pub fn update(&mut self, id: &str, update: RuleUpdate) -> bool {
        match self.rules.iter_mut().find(|r| r.id == id) {
            Some(rule) => {
                update.apply(rule);
                debug!(rule_id = %id, "Link rule updated");
                true
            }
            None => false,
        }
    }

    /// Removes a rule; returns false if the id is unknown
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        let removed = self.rules.len() != before;
        if removed {
            debug!(rule_id = %id, "Link rule removed");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&LinkRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// All rules in insertion order
    pub fn list(&self) -> &[LinkRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Active rules by descending priority; ties keep insertion order
    pub fn by_priority(&self) -> Vec<&LinkRule> {
        let mut active: Vec<&LinkRule> = self.rules.iter().filter(|r| r.is_active).collect();
        active.sort_by(|a, b| b.priority.cmp(&a.priority));
        active
    }
}

fn keyword_rule(
    id: &str,
    keyword: &str,
    target: &str,
    anchor: &str,
    priority: i32,
    seo_value: f64,
    scope: RuleScope,
) -> Option<LinkRule> {
    LinkRule::keyword(id, keyword, target, anchor)
        .ok()
        .map(|rule| {
            rule.with_priority(priority)
                .with_seo_value(seo_value)
                .with_description(format!("Links \"{}\" mentions to {}", keyword, target))
                .with_scope(scope)
        })
}

fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

/// The fixed rule set the site starts with
pub fn default_rules() -> Vec<LinkRule> {
    let mut rules: Vec<LinkRule> = [
        keyword_rule(
            "ai-strategy",
            "AI strategy",
            "/services/ai-strategy/",
            "AI strategy consulting",
            100,
            0.95,
            RuleScope {
                max_links_per_page: Some(1),
                proximity_terms: terms(&["roadmap", "business", "transformation", "enterprise"]),
                exclude_pages: terms(&["/services/ai-strategy"]),
                ..Default::default()
            },
        ),
        keyword_rule(
            "generative-ai",
            "generative AI",
            "/services/generative-ai/",
            "generative AI services",
            95,
            0.9,
            RuleScope {
                max_links_per_page: Some(1),
                proximity_terms: terms(&["content", "automation", "model", "assistant"]),
                ..Default::default()
            },
        ),
        keyword_rule(
            "machine-learning",
            "machine learning",
            "/services/machine-learning/",
            "machine learning solutions",
            95,
            0.85,
            RuleScope {
                max_links_per_page: Some(1),
                position: Position::First,
                proximity_terms: terms(&["model", "data", "predict", "training"]),
                ..Default::default()
            },
        ),
        keyword_rule(
            "ai-readiness",
            "AI readiness assessment",
            "/services/ai-readiness-assessment/",
            "AI readiness assessment",
            90,
            0.8,
            RuleScope {
                max_links_per_page: Some(1),
                ..Default::default()
            },
        ),
        keyword_rule(
            "data-engineering",
            "data engineering",
            "/services/data-engineering/",
            "data engineering services",
            85,
            0.75,
            RuleScope {
                max_links_per_page: Some(1),
                proximity_terms: terms(&["pipeline", "warehouse", "platform"]),
                ..Default::default()
            },
        ),
        keyword_rule(
            "computer-vision",
            "computer vision",
            "/use-cases/computer-vision/",
            "computer vision use cases",
            80,
            0.7,
            RuleScope {
                max_links_per_page: Some(1),
                ..Default::default()
            },
        ),
        keyword_rule(
            "healthcare",
            "healthcare",
            "/industries/healthcare/",
            "AI for healthcare",
            75,
            0.7,
            RuleScope {
                max_links_per_page: Some(1),
                proximity_terms: terms(&["patient", "clinical", "hospital", "AI"]),
                exclude_pages: terms(&["/industries/healthcare"]),
                ..Default::default()
            },
        ),
        keyword_rule(
            "financial-services",
            "financial services",
            "/industries/financial-services/",
            "AI for financial services",
            75,
            0.7,
            RuleScope {
                max_links_per_page: Some(1),
                proximity_terms: terms(&["bank", "risk", "fraud", "compliance"]),
                ..Default::default()
            },
        ),
        keyword_rule(
            "case-studies",
            "case studies",
            "/case-studies/",
            "client case studies",
            70,
            0.6,
            RuleScope {
                max_links_per_page: Some(1),
                exclude_pages: terms(&["/case-studies"]),
                ..Default::default()
            },
        ),
        keyword_rule(
            "contact",
            "contact us",
            "/contact/",
            "contact our AI consultants",
            60,
            0.5,
            RuleScope {
                max_links_per_page: Some(1),
                position: Position::Last,
                exclude_pages: terms(&["/contact"]),
                ..Default::default()
            },
        ),
    ]
    .into_iter()
    .flatten()
    .collect();

    // * Expression rule: LLM mentions in either spelling
    if let Ok(pattern) = RulePattern::regex(r"(?i)\b(?:large language models?|LLMs?)\b") {
        rules.push(
            LinkRule::new("llm-integration", pattern, "/services/llm-integration/", "LLM integration services")
                .with_priority(90)
                .with_seo_value(0.85)
                .with_description("Links large language model mentions to the LLM integration service")
                .with_scope(RuleScope {
                    max_links_per_page: Some(1),
                    position: Position::First,
                    ..Default::default()
                }),
        );
    }

    rules
}
