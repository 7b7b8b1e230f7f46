// * Telemetry - JSON Logging and Prometheus Metrics
// * Structured logging setup plus process-wide counters for linking, redirects and schema audits

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Encoder,
    Histogram, TextEncoder,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    // * Candidate matches by outcome (accepted or the reason they were dropped)
    pub static ref SUGGESTIONS_TOTAL: CounterVec = register_counter_vec!(
        "linkflow_suggestions_total",
        "Link suggestion candidates by outcome",
        &["outcome"]
    ).unwrap();

    // * Pages run through the suggestion pipeline
    pub static ref PAGES_ANALYZED_TOTAL: Counter = register_counter!(
        "linkflow_pages_analyzed_total",
        "Total pages analyzed for internal links"
    ).unwrap();

    // * Redirect resolutions by status code ("none" when nothing matched)
    pub static ref REDIRECTS_RESOLVED_TOTAL: CounterVec = register_counter_vec!(
        "linkflow_redirects_resolved_total",
        "Redirect resolutions by resulting status",
        &["status"]
    ).unwrap();

    // * Redirect configuration issues found by the chain validator
    pub static ref REDIRECT_ISSUES_TOTAL: CounterVec = register_counter_vec!(
        "linkflow_redirect_issues_total",
        "Redirect validation issues by kind",
        &["kind"]
    ).unwrap();

    // * Structured-data validations by result
    pub static ref SCHEMA_VALIDATIONS_TOTAL: CounterVec = register_counter_vec!(
        "linkflow_schema_validations_total",
        "Structured-data validations by result",
        &["result"]
    ).unwrap();

    // * Distribution of structured-data scores (0 - 100)
    pub static ref SCHEMA_SCORE: Histogram = register_histogram!(
        "linkflow_schema_score",
        "Structured-data validation score",
        vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
    ).unwrap();
}

/// Initializes the tracing subscriber with JSON formatting
///
/// # Example
/// ```ignore
/// use link_flow::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(url = "/services/", "Analyzing page");
/// ```
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initializes tracing with custom log level
pub fn init_tracing_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    // * try_init: a second initialization (tests, embedding) is a no-op
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .try_init();
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty().with_writer(std::io::stderr))
        .try_init();
}

/// Returns the current metrics in the Prometheus text format
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Records the outcome of one candidate match
pub fn record_suggestion_outcome(outcome: &str) {
    SUGGESTIONS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Records a page run through the suggestion pipeline
pub fn record_page_analyzed() {
    PAGES_ANALYZED_TOTAL.inc();
}

/// Records a redirect resolution; `None` means no rule matched
pub fn record_redirect_resolution(status: Option<u16>) {
    let label = status.map_or_else(|| "none".to_string(), |code| code.to_string());
    REDIRECTS_RESOLVED_TOTAL.with_label_values(&[&label]).inc();
}

/// Records a redirect validation issue by kind
pub fn record_redirect_issue(kind: &str) {
    REDIRECT_ISSUES_TOTAL.with_label_values(&[kind]).inc();
}

/// Records a schema validation result and its score
pub fn record_schema_validation(valid: bool, score: u32) {
    let result = if valid { "valid" } else { "invalid" };
    SCHEMA_VALIDATIONS_TOTAL.with_label_values(&[result]).inc();
    SCHEMA_SCORE.observe(score as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_suggestion_outcome() {
        let before = SUGGESTIONS_TOTAL.with_label_values(&["accepted"]).get();
        record_suggestion_outcome("accepted");
        assert!(SUGGESTIONS_TOTAL.with_label_values(&["accepted"]).get() >= before + 1.0);
    }

    #[test]
    fn test_record_redirect_resolution_labels() {
        record_redirect_resolution(Some(301));
        record_redirect_resolution(None);

        assert!(REDIRECTS_RESOLVED_TOTAL.with_label_values(&["301"]).get() >= 1.0);
        assert!(REDIRECTS_RESOLVED_TOTAL.with_label_values(&["none"]).get() >= 1.0);
    }

    #[test]
    fn test_record_schema_validation() {
        let before = SCHEMA_SCORE.get_sample_count();
        record_schema_validation(true, 85);
        record_schema_validation(false, 20);
        assert!(SCHEMA_SCORE.get_sample_count() >= before + 2);
    }

    #[test]
    fn test_get_metrics_string() {
        record_page_analyzed();
        record_redirect_issue("loop");

        let metrics = get_metrics_string();
        assert!(metrics.contains("linkflow_pages_analyzed_total"));
        assert!(metrics.contains("linkflow_redirect_issues_total"));
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing_pretty();
    }
}
