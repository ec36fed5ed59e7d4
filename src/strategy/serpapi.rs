//! SerpApi Google Scholar Author client.
//!
//! API Details:
//! - Endpoint: GET /search.json?engine=google_scholar_author
//! - Up to 100 articles per request (`num`)
//! - Errors may arrive as a 2xx body with a top-level `error` string

use super::{DataSourceStrategy, RawPayload};
use crate::error::{MetricsError, OptionExt, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

/// SerpApi base URL
pub const DEFAULT_SERPAPI_URL: &str = "https://serpapi.com";

/// Maximum articles SerpApi returns in one author request
const MAX_ARTICLES: &str = "100";

/// Structured author-metrics API strategy
#[derive(Clone)]
pub struct SerpApiStrategy {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for SerpApiStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerpApiStrategy")
            .field("base_url", &self.base_url)
            .field("has_api_key", &!self.api_key.is_empty())
            .finish()
    }
}

impl SerpApiStrategy {
    /// Create a new strategy
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (carries the timeout)
    /// * `api_key` - SerpApi key
    /// * `base_url` - Override for mirrors and mock servers
    pub fn new(client: reqwest::Client, api_key: String, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SERPAPI_URL.to_string());
        Self {
            client,
            api_key,
            base_url,
        }
    }

    fn author_url(&self, author_id: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/search.json", self.base_url))
            .map_err(|e| MetricsError::Config(format!("Invalid SerpApi base URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("engine", "google_scholar_author")
            .append_pair("author_id", author_id)
            .append_pair("hl", "en")
            .append_pair("num", MAX_ARTICLES)
            .append_pair("api_key", &self.api_key);

        Ok(url)
    }
}

#[async_trait]
impl DataSourceStrategy for SerpApiStrategy {
    fn id(&self) -> &str {
        "serpapi"
    }

    async fn fetch_raw(&self, author_id: &str) -> Result<RawPayload> {
        if author_id.trim().is_empty() {
            return Err(MetricsError::Validation("author id is empty".to_string()));
        }

        let url = self.author_url(author_id)?;
        info!(author_id, base = %self.base_url, "Fetching author from SerpApi");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "SerpApi response not OK");
            return Err(MetricsError::from_status(status, "SerpApi"));
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| MetricsError::Parse(format!("SerpApi returned invalid JSON: {}", e)))?;

        let keys: Vec<String> = body
            .as_object()
            .ok_or_parse("SerpApi payload is not a JSON object")?
            .keys()
            .cloned()
            .collect();

        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(MetricsError::Api {
                code: 0,
                message: message.to_string(),
            });
        }

        debug!(keys = ?keys, "SerpApi payload received");

        Ok(RawPayload::new(self.id(), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy(base: Option<&str>) -> SerpApiStrategy {
        SerpApiStrategy::new(reqwest::Client::new(), "secret-key".to_string(), base)
    }

    #[test]
    fn test_author_url() {
        let url = strategy(None)
            .author_url("DGm9l2wAAAAJ")
            .expect("Failed to build URL");
        assert!(url.as_str().starts_with("https://serpapi.com/search.json?"));
        assert!(url.as_str().contains("engine=google_scholar_author"));
        assert!(url.as_str().contains("author_id=DGm9l2wAAAAJ"));
        assert!(url.as_str().contains("num=100"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let url = strategy(Some("http://127.0.0.1:9999/"))
            .author_url("abc")
            .expect("Failed to build URL");
        assert!(url.as_str().starts_with("http://127.0.0.1:9999/search.json"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let debug = format!("{:?}", strategy(None));
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("has_api_key"));
    }

    #[tokio::test]
    async fn test_empty_author_id_rejected() {
        let err = strategy(None).fetch_raw("  ").await.expect_err("should fail");
        assert!(matches!(err, MetricsError::Validation(_)));
    }
}
