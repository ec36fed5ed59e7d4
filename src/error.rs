//! Custom error types for scholarmetrics.
//!
//! Every data-source strategy reports its failures through [`MetricsError`].
//! The resolver treats all of them alike: log, then advance to the next strategy.

use thiserror::Error;

/// Main error type for scholarmetrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request exceeded the configured per-call timeout
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Payload could not be interpreted (HTML or JSON shape)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by external API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code, or 0 when the error came inside a 2xx body
        code: u16,
        /// Error message from API
        message: String,
    },

    /// CAPTCHA / unusual traffic page instead of the profile
    #[error("CAPTCHA detected on profile page")]
    Captcha,

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for MetricsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else {
            Self::Network(e)
        }
    }
}

impl MetricsError {
    /// Build an API error from a non-success HTTP status.
    pub fn from_status(status: reqwest::StatusCode, upstream: &str) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Self::RateLimited(60);
        }
        Self::Api {
            code: status.as_u16(),
            message: format!("{} responded with {}", upstream, status),
        }
    }

    /// Whether the failure happened on the wire rather than in our parsing.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited(_) | Self::Api { .. }
        )
    }
}

/// Result type alias using `MetricsError`
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| MetricsError::Parse(msg.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_rate_limited() {
        let err = MetricsError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "SerpApi");
        assert!(matches!(err, MetricsError::RateLimited(60)));
        assert!(err.is_transport());
    }

    #[test]
    fn test_from_status_server_error() {
        let err = MetricsError::from_status(reqwest::StatusCode::BAD_GATEWAY, "SerpApi");
        match &err {
            MetricsError::Api { code, message } => {
                assert_eq!(*code, 502);
                assert!(message.contains("SerpApi"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ok_or_parse() {
        let missing: Option<u32> = None;
        let err = missing.ok_or_parse("no profile name").expect_err("should fail");
        assert!(!err.is_transport());
        assert!(err.to_string().contains("no profile name"));
    }
}
