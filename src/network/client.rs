use crate::config::FetchConfig;
use crate::network::errors::NetworkError;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

// * HTML fetch helper for live structured-data audits.
// * One GET per call: no retry, no cancellation beyond the request timeout.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    inner: Client,
}

impl PageFetcher {
    // * Builds the client with the configured timeout and user agent.
    pub fn new(config: &FetchConfig) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { inner: client })
    }

    // * Fetches `url` and returns the body of a successful response.
    pub async fn fetch(&self, url: &str) -> Result<String, NetworkError> {
        let parsed = parse_http_url(url)?;

        let resp = self.inner.get(parsed).send().await?;
        let status = resp.status();

        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "Fetch returned non-success status");
            return Err(NetworkError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;
        debug!(url = url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

// * Only absolute http(s) URLs are fetched
fn parse_http_url(url: &str) -> Result<Url, NetworkError> {
    let parsed = Url::parse(url).map_err(|_| NetworkError::InvalidUrl(url.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(NetworkError::InvalidUrl(url.to_string())),
    }
}
