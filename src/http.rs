//! Shared HTTP client construction for outbound strategies.

use crate::error::{MetricsError, Result};
use std::time::Duration;

/// User agent string for requests
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Build HTTP client with a per-request timeout and optional proxy
pub fn build_http_client(timeout: Duration, proxy: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .cookie_store(true);

    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            MetricsError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e))
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| MetricsError::Config(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_without_proxy() {
        assert!(build_http_client(Duration::from_secs(5), None).is_ok());
    }

    #[test]
    fn test_invalid_proxy_is_config_error() {
        let err = build_http_client(Duration::from_secs(5), Some("http://[invalid"))
            .expect_err("proxy should be rejected");
        assert!(matches!(err, MetricsError::Config(_)));
    }
}
