use thiserror::Error;

// * Unified Error type for the Redirect stage.
#[derive(Error, Debug)]
pub enum RedirectError {
    #[error("Invalid source pattern '{pattern}': {source}")]
    InvalidSource {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid condition pattern '{pattern}': {source}")]
    InvalidCondition {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown status code {0} (expected 301, 302, 307 or 308)")]
    InvalidStatus(u16),

    #[error("Unknown server type '{0}' (expected nginx, apache, vercel or netlify)")]
    UnknownServer(String),

    #[error("Redirect '{0}' has a computed destination and cannot be written to a server config")]
    ComputedDestination(String),

    #[error("Redirect '{id}' uses a pattern {server} cannot express: {pattern}")]
    UnsupportedPattern {
        id: String,
        server: String,
        pattern: String,
    },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON failure: {0}")]
    Json(#[from] serde_json::Error),
}
