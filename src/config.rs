//! Process-wide configuration.
//!
//! Read once at startup from environment variables. Presence of
//! `SERPAPI_KEY` enables the structured API strategy; scraping is opt-in via
//! `SCHOLAR_SCRAPE_ENABLED=true`; the snapshot strategy is always available.

use crate::error::{MetricsError, Result};
use crate::http::build_http_client;
use crate::resolver::{ReconcileMode, Resolver};
use crate::snapshot::SnapshotStore;
use crate::strategy::{
    DataSourceStrategy, ProfileScrapeStrategy, SerpApiStrategy, SnapshotStrategy,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Google Scholar id used when `SCHOLAR_AUTHOR_ID` is unset
pub const DEFAULT_AUTHOR_ID: &str = "DGm9l2wAAAAJ";

/// Per-request HTTP timeout
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Strategy kinds that can be named in `SCHOLAR_STRATEGIES`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    SerpApi,
    Scrape,
    Snapshot,
}

impl FromStr for StrategyKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serpapi" | "api" => Ok(Self::SerpApi),
            "scrape" | "html" => Ok(Self::Scrape),
            "snapshot" | "cache" => Ok(Self::Snapshot),
            other => Err(MetricsError::Config(format!("Unknown strategy '{}'", other))),
        }
    }
}

/// Default preference order
pub const DEFAULT_STRATEGY_ORDER: &[StrategyKind] =
    &[StrategyKind::SerpApi, StrategyKind::Scrape, StrategyKind::Snapshot];

/// Service configuration
#[derive(Clone)]
pub struct Config {
    /// Scholar author identifier
    pub author_id: String,
    /// SerpApi key; enables the structured API strategy
    pub serpapi_key: Option<String>,
    /// Override for the SerpApi base URL
    pub serpapi_base_url: Option<String>,
    /// Whether the profile scraping strategy is enabled
    pub scrape_enabled: bool,
    /// Override for the Google Scholar base URL (mirrors)
    pub scholar_base_url: Option<String>,
    /// Snapshot file; `None` means the default under the home directory
    pub snapshot_path: Option<PathBuf>,
    /// Save successful live payloads to the snapshot file
    pub snapshot_write: bool,
    /// Strategy preference order
    pub strategy_order: Vec<StrategyKind>,
    /// How to combine multiple successful strategies
    pub reconcile: ReconcileMode,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Proxy URL (e.g., "http://127.0.0.1:7890")
    pub proxy: Option<String>,
    /// Include a `debug` block in successful responses
    pub debug_payload: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("author_id", &self.author_id)
            .field("has_serpapi_key", &self.serpapi_key.is_some())
            .field("serpapi_base_url", &self.serpapi_base_url)
            .field("scrape_enabled", &self.scrape_enabled)
            .field("scholar_base_url", &self.scholar_base_url)
            .field("snapshot_path", &self.snapshot_path)
            .field("snapshot_write", &self.snapshot_write)
            .field("strategy_order", &self.strategy_order)
            .field("reconcile", &self.reconcile)
            .field("http_timeout", &self.http_timeout)
            .field("proxy", &self.proxy)
            .field("debug_payload", &self.debug_payload)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            author_id: DEFAULT_AUTHOR_ID.to_string(),
            serpapi_key: None,
            serpapi_base_url: None,
            scrape_enabled: false,
            scholar_base_url: None,
            snapshot_path: None,
            snapshot_write: true,
            strategy_order: DEFAULT_STRATEGY_ORDER.to_vec(),
            reconcile: ReconcileMode::FirstSuccess,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            proxy: None,
            debug_payload: false,
        }
    }
}

impl Config {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a config error for unknown strategy names or unparseable values.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let flag = |key: &str, default: bool| parse_flag(get(key), key, default);
        let defaults = Self::default();

        let strategy_order = match get("SCHOLAR_STRATEGIES") {
            Some(list) => list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(StrategyKind::from_str)
                .collect::<Result<Vec<_>>>()?,
            None => defaults.strategy_order,
        };

        let http_timeout = match get("SCHOLAR_HTTP_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(secs.parse().map_err(|_| {
                MetricsError::Config(format!(
                    "SCHOLAR_HTTP_TIMEOUT_SECS is not a number: {}",
                    secs
                ))
            })?),
            None => defaults.http_timeout,
        };

        let reconcile = if flag("SCHOLAR_MERGE_SOURCES", false)? {
            ReconcileMode::Merge
        } else {
            ReconcileMode::FirstSuccess
        };

        Ok(Self {
            author_id: get("SCHOLAR_AUTHOR_ID").unwrap_or(defaults.author_id),
            serpapi_key: get("SERPAPI_KEY"),
            serpapi_base_url: get("SERPAPI_BASE_URL"),
            scrape_enabled: flag("SCHOLAR_SCRAPE_ENABLED", false)?,
            scholar_base_url: get("SCHOLAR_BASE_URL"),
            snapshot_path: get("SCHOLAR_SNAPSHOT_PATH").map(PathBuf::from),
            snapshot_write: flag("SCHOLAR_SNAPSHOT_WRITE", true)?,
            strategy_order,
            reconcile,
            http_timeout,
            proxy: get("SCHOLAR_PROXY"),
            debug_payload: flag("SCHOLAR_DEBUG_PAYLOAD", false)?,
        })
    }

    /// Snapshot store at the configured (or default) path.
    pub fn snapshot_store(&self) -> SnapshotStore {
        match &self.snapshot_path {
            Some(path) => SnapshotStore::with_path(path.clone()),
            None => SnapshotStore::default(),
        }
    }

    /// Build the enabled strategies in preference order.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built (e.g. invalid proxy).
    pub fn build_strategies(&self) -> Result<Vec<Arc<dyn DataSourceStrategy>>> {
        let client = build_http_client(self.http_timeout, self.proxy.as_deref())?;
        let mut strategies: Vec<Arc<dyn DataSourceStrategy>> = Vec::new();

        for kind in &self.strategy_order {
            match kind {
                StrategyKind::SerpApi => match &self.serpapi_key {
                    Some(key) => strategies.push(Arc::new(SerpApiStrategy::new(
                        client.clone(),
                        key.clone(),
                        self.serpapi_base_url.as_deref(),
                    ))),
                    None => info!("SERPAPI_KEY not set, structured API disabled"),
                },
                StrategyKind::Scrape => {
                    if self.scrape_enabled {
                        strategies.push(Arc::new(ProfileScrapeStrategy::new(
                            client.clone(),
                            self.scholar_base_url.as_deref(),
                        )));
                    } else {
                        info!(
                            "Profile scraping disabled. Set SCHOLAR_SCRAPE_ENABLED=true to enable."
                        );
                    }
                }
                StrategyKind::Snapshot => {
                    strategies.push(Arc::new(SnapshotStrategy::from_store(self.snapshot_store())));
                }
            }
        }

        let ids: Vec<&str> = strategies.iter().map(|s| s.id()).collect();
        info!(strategies = ?ids, "Data sources configured");
        Ok(strategies)
    }

    /// Build the resolver, with snapshot write-through when enabled.
    pub fn build_resolver(&self) -> Resolver {
        let resolver = Resolver::new(self.reconcile);
        if self.snapshot_write {
            resolver.with_snapshot_writes(self.snapshot_store())
        } else {
            resolver
        }
    }
}

fn parse_flag(value: Option<String>, name: &str, default: bool) -> Result<bool> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(MetricsError::Config(format!(
            "{} must be true or false, got '{}'",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = config_from(&[])?;
        assert_eq!(config.author_id, DEFAULT_AUTHOR_ID);
        assert!(config.serpapi_key.is_none());
        assert!(!config.scrape_enabled);
        assert!(config.snapshot_write);
        assert_eq!(config.strategy_order, DEFAULT_STRATEGY_ORDER);
        assert_eq!(config.reconcile, ReconcileMode::FirstSuccess);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
        Ok(())
    }

    #[test]
    fn test_api_key_enables_serpapi() -> Result<()> {
        let without = config_from(&[("SCHOLAR_SNAPSHOT_PATH", "/tmp/none.json")])?;
        let ids: Vec<String> = without
            .build_strategies()?
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(ids, vec!["snapshot"]);

        let with = config_from(&[
            ("SERPAPI_KEY", "k"),
            ("SCHOLAR_SCRAPE_ENABLED", "true"),
            ("SCHOLAR_SNAPSHOT_PATH", "/tmp/none.json"),
        ])?;
        let ids: Vec<String> = with
            .build_strategies()?
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(ids, vec!["serpapi", "scrape", "snapshot"]);
        Ok(())
    }

    #[test]
    fn test_strategy_order_from_env() -> Result<()> {
        let config = config_from(&[
            ("SERPAPI_KEY", "k"),
            ("SCHOLAR_SCRAPE_ENABLED", "1"),
            ("SCHOLAR_STRATEGIES", "scrape, serpapi"),
        ])?;
        let ids: Vec<String> = config
            .build_strategies()?
            .iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(ids, vec!["scrape", "serpapi"]);
        Ok(())
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let err = config_from(&[("SCHOLAR_STRATEGIES", "serpapi,ftp")]).expect_err("should fail");
        assert!(matches!(err, MetricsError::Config(_)));
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(config_from(&[("SCHOLAR_HTTP_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config_from(&[("SCHOLAR_MERGE_SOURCES", "maybe")]).is_err());
    }

    #[test]
    fn test_merge_and_timeout() -> Result<()> {
        let config = config_from(&[
            ("SCHOLAR_MERGE_SOURCES", "true"),
            ("SCHOLAR_HTTP_TIMEOUT_SECS", "5"),
            ("SCHOLAR_SNAPSHOT_WRITE", "off"),
        ])?;
        assert_eq!(config.reconcile, ReconcileMode::Merge);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert!(!config.snapshot_write);
        assert_eq!(config.build_resolver().mode(), ReconcileMode::Merge);
        Ok(())
    }

    #[test]
    fn test_debug_hides_api_key() -> Result<()> {
        let config = config_from(&[("SERPAPI_KEY", "super-secret-key")])?;
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("has_serpapi_key"));
        Ok(())
    }
}
