// * Operations
// * Goal: Observability for the linking, redirect and schema stages
// * This module provides structured logging setup and Prometheus metrics

pub mod clock;
pub mod telemetry;

// * Re-exports for convenient access
pub use clock::now_unix;
pub use telemetry::{
    get_metrics_string, init_tracing, init_tracing_pretty, init_tracing_with_level,
    record_page_analyzed, record_redirect_issue, record_redirect_resolution,
    record_schema_validation, record_suggestion_outcome,
};
