// * Configuration Constants
// * Central location for all tunable thresholds used by the linking, redirect and schema stages

// * Page fetch timeout in milliseconds
pub const PAGE_TIMEOUT_MS: u64 = 30_000;

// * Confidence scoring
pub const BASE_CONFIDENCE: f64 = 0.70;
pub const PROXIMITY_WEIGHT: f64 = 0.30;
pub const EXACT_MATCH_BONUS: f64 = 0.10;
pub const STUFFING_PENALTY: f64 = 0.20;

// * Keyword density above which a match is treated as keyword stuffing
pub const STUFFING_DENSITY_THRESHOLD: f64 = 0.05;

// * Characters on each side of a match searched for proximity terms
pub const PROXIMITY_WINDOW_CHARS: usize = 200;

// * Characters on each side of a match kept as the suggestion's context snippet
pub const CONTEXT_WINDOW_CHARS: usize = 100;

// * Suggestions below this confidence are discarded
pub const MIN_CONFIDENCE: f64 = 0.5;

// * Maximum suggestions kept per page after final ranking
pub const MAX_SUGGESTIONS_PER_PAGE: usize = 10;

// * Outbound suggestion count at which a page counts as a hub
pub const HUB_LINK_THRESHOLD: usize = 10;

// * Pages deeper than this many hops from the root get a recommendation
pub const MAX_RECOMMENDED_DEPTH: usize = 3;

// * Share of internal links below which a recommendation is emitted
pub const INTERNAL_LINK_RATIO_TARGET: f64 = 0.80;

// * Number of top-linked targets listed in a site analysis
pub const TOP_LINKED_LIMIT: usize = 10;

// * Redirect hops followed before a chain is reported as too long
pub const MAX_REDIRECT_CHAIN: usize = 5;

// * Default origin used to absolutize relative URLs
pub const DEFAULT_BASE_URL: &str = "https://example.com";

// * Root page for link-depth traversal
pub const DEFAULT_ROOT_URL: &str = "/";

// * Structured-data scoring points
pub const REQUIRED_FIELD_POINTS: u32 = 20;
pub const RECOMMENDED_FIELD_POINTS: u32 = 10;
pub const AI_FIELD_POINTS: u32 = 15;
pub const PASSED_CHECK_POINTS: u32 = 10;
pub const MAX_SCHEMA_SCORE: u32 = 100;

// * Descriptions shorter than this fail the description-length check
pub const MIN_DESCRIPTION_LENGTH: usize = 100;

// * Nesting deeper than this is reported as a structural problem
pub const MAX_SCHEMA_DEPTH: usize = 10;

// * Number of most frequent issues listed in a validation report
pub const COMMON_ISSUES_LIMIT: usize = 10;
