pub mod constants;
pub mod settings;

pub use settings::{ConfigError, FetchConfig, LinkingConfig, RedirectConfig, Settings};
