// * Redirect Stage
// * Goal: Resolve incoming URLs against ordered redirect rules, statically validate the rule set
// * and export it to web-server configs.

pub mod errors;
pub mod resolver;
pub mod rules;
pub mod server_config;
pub mod validator;

// * Re-exports for convenient access
pub use errors::RedirectError;
pub use resolver::{substitute, RedirectMatch, RedirectResolver, RequestContext};
pub use rules::{
    ConditionsSpec, Destination, RedirectConditions, RedirectKind, RedirectRule, RedirectRuleSpec,
    RedirectSource, RedirectStatus, RedirectStore, RedirectUpdate, SourceSpec,
};
pub use server_config::ServerType;
pub use validator::{ChainValidator, RedirectIssue, RedirectIssueKind, RedirectValidation};

use crate::config::constants::{DEFAULT_BASE_URL, MAX_REDIRECT_CHAIN};
use crate::config::{ConfigError, Settings};
use std::path::Path;
use tracing::info;
use url::Url;

/// Entry point for redirect resolution, validation and config export
#[derive(Debug, Clone)]
pub struct RedirectManager {
    store: RedirectStore,
    base: Url,
    max_chain_depth: usize,
}

impl RedirectManager {
    pub fn new(store: RedirectStore, settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            base: settings.base()?,
            max_chain_depth: settings.redirects.max_chain_depth,
        })
    }

    /// Default redirects against the default base origin
    pub fn with_defaults() -> Self {
        Self {
            store: RedirectStore::with_defaults(),
            base: Url::parse(DEFAULT_BASE_URL).expect("! CRITICAL: default base URL must parse"),
            max_chain_depth: MAX_REDIRECT_CHAIN,
        }
    }

    pub fn store(&self) -> &RedirectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RedirectStore {
        &mut self.store
    }

    pub fn find_redirect(&self, url: &str, context: Option<&RequestContext>) -> Option<RedirectMatch> {
        RedirectResolver::new(&self.base).resolve(self.store.list(), url, context)
    }

    pub fn validate_redirects(&self) -> RedirectValidation {
        ChainValidator::new(&self.base, self.max_chain_depth).validate(self.store.list())
    }

    pub fn generate_server_config(&self, server: ServerType) -> Result<String, RedirectError> {
        server_config::generate(self.store.list(), server)
    }

    /// Generates the config for `server` and writes it to `path`
    pub async fn write_server_config(
        &self,
        path: impl AsRef<Path>,
        server: ServerType,
    ) -> Result<(), RedirectError> {
        let contents = self.generate_server_config(server)?;
        tokio::fs::write(path.as_ref(), contents.as_bytes()).await?;

        info!(
            path = %path.as_ref().display(),
            server = server.as_str(),
            rules = self.store.len(),
            "Server config written"
        );
        Ok(())
    }
}

impl Default for RedirectManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_defaults() {
        let manager = RedirectManager::with_defaults();

        let m = manager.find_redirect("/old-services/consulting", None).unwrap();
        assert_eq!(m.destination, "https://example.com/services/consulting/");
        assert!(manager.find_redirect("/services/", None).is_none());
        assert!(manager.validate_redirects().valid);
    }

    #[test]
    fn test_manager_uses_settings_base() {
        let settings = Settings {
            base_url: "https://acme.test".to_string(),
            ..Default::default()
        };
        let manager = RedirectManager::new(RedirectStore::with_defaults(), &settings).unwrap();

        let m = manager.find_redirect("/ai-consulting", None).unwrap();
        assert_eq!(m.destination, "https://acme.test/services/ai-strategy/");
    }

    #[tokio::test]
    async fn test_write_server_config() {
        let manager = RedirectManager::with_defaults();
        let path = std::env::temp_dir().join(format!("link-flow-{}.conf", std::process::id()));

        manager.write_server_config(&path, ServerType::Nginx).await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(written.contains("location ~ \"^/old-services/(.+)$\""));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_server_config_propagates_io_error() {
        let manager = RedirectManager::with_defaults();
        let path = std::env::temp_dir().join("link-flow-missing-dir").join("nested").join("x.conf");

        let result = manager.write_server_config(&path, ServerType::Apache).await;
        assert!(matches!(result, Err(RedirectError::Io(_))));
    }
}
