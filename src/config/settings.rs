// * Runtime Settings
// * Serde-backed configuration for every stage, loadable from a JSON file

use crate::config::constants::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Tunables for the content-analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkingConfig {
    pub base_confidence: f64,
    pub proximity_weight: f64,
    pub proximity_window: usize,
    pub context_window: usize,
    pub exact_match_bonus: f64,
    pub stuffing_penalty: f64,
    pub stuffing_threshold: f64,
    pub min_confidence: f64,
    pub max_suggestions: usize,
    pub hub_threshold: usize,
    pub max_recommended_depth: usize,
    pub internal_ratio_target: f64,
    pub top_linked_limit: usize,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            base_confidence: BASE_CONFIDENCE,
            proximity_weight: PROXIMITY_WEIGHT,
            proximity_window: PROXIMITY_WINDOW_CHARS,
            context_window: CONTEXT_WINDOW_CHARS,
            exact_match_bonus: EXACT_MATCH_BONUS,
            stuffing_penalty: STUFFING_PENALTY,
            stuffing_threshold: STUFFING_DENSITY_THRESHOLD,
            min_confidence: MIN_CONFIDENCE,
            max_suggestions: MAX_SUGGESTIONS_PER_PAGE,
            hub_threshold: HUB_LINK_THRESHOLD,
            max_recommended_depth: MAX_RECOMMENDED_DEPTH,
            internal_ratio_target: INTERNAL_LINK_RATIO_TARGET,
            top_linked_limit: TOP_LINKED_LIMIT,
        }
    }
}

/// Tunables for redirect resolution and validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RedirectConfig {
    /// Maximum hops followed when simulating a redirect chain
    pub max_chain_depth: usize,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: MAX_REDIRECT_CHAIN,
        }
    }
}

/// Tunables for live page fetching
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: PAGE_TIMEOUT_MS,
            user_agent: format!("link-flow/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Top-level settings shared by the linker, redirect manager and schema auditor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Origin used to absolutize relative URLs
    pub base_url: String,
    /// Root page for link-depth traversal
    pub root_url: String,
    pub linking: LinkingConfig,
    pub redirects: RedirectConfig,
    pub fetch: FetchConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            root_url: DEFAULT_ROOT_URL.to_string(),
            linking: LinkingConfig::default(),
            redirects: RedirectConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file; missing fields fall back to defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parses settings from a JSON string and checks the base URL
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(contents)?;
        settings.base()?;
        Ok(settings)
    }

    /// Returns the parsed base origin
    pub fn base(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidBaseUrl(self.base_url.clone()))
    }
}
