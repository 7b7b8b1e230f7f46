// * Internal Linking Engine
// * Goal: Turn declarative keyword rules into ranked link suggestions, rewritten content
// * and a site-wide link graph analysis.

pub mod confidence;
pub mod graph;
pub mod matcher;
pub mod normalization;
pub mod page;
pub mod ranker;
pub mod report;
pub mod rewriter;
pub mod rules;
pub mod scope;

// * Re-exports for convenient access
pub use confidence::{ConfidenceScorer, ScoreBreakdown};
pub use graph::{LinkGraphAnalyzer, LinkedTarget, LinkingAnalysis, PageLinks};
pub use matcher::{find_matches, PatternMatch};
pub use page::{PageContext, PageType};
pub use ranker::{LinkSuggestion, SuggestionRanker};
pub use report::{LinkingReport, OptimizationSummary, RuleUsage, RulesSummary};
pub use rewriter::{apply_suggestions, LinkMarkup};
pub use rules::{LinkRule, PatternSpec, Position, RuleError, RulePattern, RuleScope, RuleStore, RuleUpdate};

use crate::config::constants::DEFAULT_BASE_URL;
use crate::config::{ConfigError, LinkingConfig, Settings};
use url::Url;

/// Entry point for content analysis, rewriting and site-wide linking reports.
///
/// # Example
/// ```ignore
/// use link_flow::engine::InternalLinker;
///
/// let linker = InternalLinker::with_defaults();
/// let html = linker.apply_internal_links(content, "/insights/ai-roadmaps");
/// ```
#[derive(Debug, Clone)]
pub struct InternalLinker {
    store: RuleStore,
    config: LinkingConfig,
    ranker: SuggestionRanker,
    base: Url,
    root_url: String,
    markup: LinkMarkup,
}

impl InternalLinker {
    /// Creates a linker over an explicit rule store
    pub fn new(store: RuleStore, settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            ranker: SuggestionRanker::new(&settings.linking),
            config: settings.linking.clone(),
            base: settings.base()?,
            root_url: settings.root_url.clone(),
            markup: LinkMarkup::default(),
        })
    }

    /// Creates a linker with the default rules and settings
    pub fn with_defaults() -> Self {
        let config = LinkingConfig::default();
        Self {
            store: RuleStore::with_defaults(),
            ranker: SuggestionRanker::new(&config),
            config,
            base: Url::parse(DEFAULT_BASE_URL).expect("! CRITICAL: default base URL must parse"),
            root_url: "/".to_string(),
            markup: LinkMarkup::default(),
        }
    }

    pub fn with_markup(mut self, markup: LinkMarkup) -> Self {
        self.markup = markup;
        self
    }

    pub fn rules(&self) -> &RuleStore {
        &self.store
    }

    pub fn rules_mut(&mut self) -> &mut RuleStore {
        &mut self.store
    }

    /// Suggestions for raw content at `current_url`
    pub fn analyze_content(&self, content: &str, current_url: &str) -> Vec<LinkSuggestion> {
        self.analyze_page(&PageContext::new(current_url, content))
    }

    /// Suggestions for a full page context (honours page-type scopes)
    pub fn analyze_page(&self, page: &PageContext) -> Vec<LinkSuggestion> {
        self.ranker.rank(&self.store, page, &self.base)
    }

    /// Content with the accepted suggestions spliced in as links
    pub fn apply_internal_links(&self, content: &str, current_url: &str) -> String {
        let suggestions = self.analyze_content(content, current_url);
        apply_suggestions(content, &suggestions, self.markup)
    }

    /// Runs the suggestion pipeline on every page and aggregates the link graph
    pub fn analyze_site_linking(&self, pages: &[PageContext]) -> LinkingAnalysis {
        let per_page = self.suggestions_per_page(pages);
        self.analyze_graph(&per_page)
    }

    /// Site analysis plus rule summary and optimization hints
    pub fn generate_linking_report(&self, pages: &[PageContext]) -> LinkingReport {
        let per_page = self.suggestions_per_page(pages);
        LinkingReport {
            analysis: self.analyze_graph(&per_page),
            rules_summary: RulesSummary::from_store(&self.store),
            optimization: OptimizationSummary::build(&self.store, &per_page),
        }
    }

    fn suggestions_per_page(&self, pages: &[PageContext]) -> Vec<(String, Vec<LinkSuggestion>)> {
        pages
            .iter()
            .map(|page| (page.url.clone(), self.analyze_page(page)))
            .collect()
    }

    fn analyze_graph(&self, per_page: &[(String, Vec<LinkSuggestion>)]) -> LinkingAnalysis {
        let links: Vec<PageLinks<'_>> = per_page
            .iter()
            .map(|(url, suggestions)| PageLinks {
                url: url.as_str(),
                suggestions: suggestions.as_slice(),
            })
            .collect();

        LinkGraphAnalyzer::new(&self.config, &self.base, &self.root_url).analyze(&links)
    }
}

impl Default for InternalLinker {
    fn default() -> Self {
        Self::with_defaults()
    }
}
