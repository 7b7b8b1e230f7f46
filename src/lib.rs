// * Link-Flow
// * Internal-linking, redirect and structured-data engine for content sites.
// *
// * Stages:
// *   engine     - keyword rules -> ranked link suggestions, rewriting, site link graph
// *   redirect   - ordered redirect rules, resolution, chain validation, server configs
// *   refinery   - JSON-LD / microdata extraction and schema scoring
// *   network    - HTML fetch helper for live audits
// *   ops        - tracing setup and Prometheus metrics
// *   config     - constants and JSON-loadable settings

pub mod config;
pub mod engine;
pub mod network;
pub mod ops;
pub mod redirect;
pub mod refinery;

pub use config::Settings;
pub use engine::InternalLinker;
pub use redirect::RedirectManager;
pub use refinery::SchemaAuditor;
