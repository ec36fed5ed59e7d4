//! Citation metrics resolver.
//!
//! Tries the configured strategies strictly in order, normalizes the payload
//! of the first one that succeeds and returns the resulting [`AuthorMetrics`].
//! Upstream failures never escape: when every strategy fails the caller gets
//! a zeroed record tagged [`UNAVAILABLE_SOURCE`](crate::models::UNAVAILABLE_SOURCE).

use crate::models::AuthorMetrics;
use crate::normalize::{self, Extracted};
use crate::snapshot::SnapshotStore;
use crate::strategy::{DataSourceStrategy, RawPayload};
use std::sync::Arc;
use tracing::{info, warn};

/// How payloads from several successful strategies are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    /// Commit to the first strategy that succeeds
    #[default]
    FirstSuccess,
    /// Try every live strategy and merge works by title key, preferring
    /// earlier strategies on conflict
    Merge,
}

/// A strategy that failed during one resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: String,
    pub message: String,
}

/// Metrics plus the failures seen while producing them
#[derive(Debug, Clone)]
pub struct Resolution {
    pub metrics: AuthorMetrics,
    pub failures: Vec<StrategyFailure>,
}

impl Resolution {
    /// True when no strategy produced data.
    pub fn is_exhausted(&self) -> bool {
        self.metrics.is_unavailable()
    }

    /// One-line description of every failure, for error responses.
    pub fn failure_summary(&self) -> String {
        if self.failures.is_empty() {
            return "no data sources configured".to_string();
        }
        self.failures
            .iter()
            .map(|f| format!("{}: {}", f.strategy, f.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Stateless resolver; one instance is shared by all requests
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    mode: ReconcileMode,
    snapshot: Option<SnapshotStore>,
}

impl Resolver {
    pub fn new(mode: ReconcileMode) -> Self {
        Self {
            mode,
            snapshot: None,
        }
    }

    /// Save every successful live payload to `store`.
    pub fn with_snapshot_writes(mut self, store: SnapshotStore) -> Self {
        self.snapshot = Some(store);
        self
    }

    pub fn mode(&self) -> ReconcileMode {
        self.mode
    }

    /// Resolve metrics for `author_id` using `strategies` in preference order.
    pub async fn resolve(
        &self,
        author_id: &str,
        strategies: &[Arc<dyn DataSourceStrategy>],
    ) -> AuthorMetrics {
        self.resolve_detailed(author_id, strategies).await.metrics
    }

    /// Like [`resolve`](Self::resolve), also reporting which strategies failed.
    pub async fn resolve_detailed(
        &self,
        author_id: &str,
        strategies: &[Arc<dyn DataSourceStrategy>],
    ) -> Resolution {
        let mut failures = Vec::new();
        let mut collected: Option<Extracted> = None;

        for strategy in strategies {
            if collected.is_some() && !strategy.is_live() {
                // snapshots only stand in for live data, never extend it
                continue;
            }

            info!(strategy = %strategy.id(), author_id, "Trying data source");
            match strategy.fetch_raw(author_id).await {
                Ok(payload) => {
                    info!(strategy = %strategy.id(), "Data source succeeded");
                    if collected.is_none() && strategy.is_live() {
                        self.write_snapshot(&payload);
                    }

                    let current = normalize::extract(&payload);
                    collected = Some(match collected {
                        Some(primary) => primary.merge(current),
                        None => current,
                    });

                    if self.mode == ReconcileMode::FirstSuccess {
                        break;
                    }
                }
                Err(e) => {
                    warn!(
                        strategy = %strategy.id(),
                        transport = e.is_transport(),
                        error = %e,
                        "Data source failed"
                    );
                    failures.push(StrategyFailure {
                        strategy: strategy.id().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let metrics = match collected {
            Some(extracted) => extracted.finalize(),
            None => {
                warn!(
                    author_id,
                    attempted = strategies.len(),
                    "All data sources failed"
                );
                AuthorMetrics::unavailable()
            }
        };

        info!(
            source = %metrics.data_source,
            citations = metrics.citation_count,
            publications = metrics.publication_count,
            h_index = metrics.h_index,
            i10_index = metrics.i10_index,
            "Resolved citation metrics"
        );

        Resolution { metrics, failures }
    }

    fn write_snapshot(&self, payload: &RawPayload) {
        if let Some(store) = &self.snapshot {
            if let Err(e) = store.save(payload) {
                warn!(error = %e, path = ?store.path(), "Failed to write snapshot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MetricsError, Result};
    use crate::strategy::SnapshotStrategy;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Strategy with a scripted outcome that counts its calls.
    #[derive(Debug)]
    struct Scripted {
        id: &'static str,
        body: Option<Value>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(id: &'static str, body: Value) -> Arc<Self> {
            Arc::new(Self {
                id,
                body: Some(body),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(id: &'static str) -> Arc<Self> {
            Arc::new(Self {
                id,
                body: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DataSourceStrategy for Scripted {
        fn id(&self) -> &str {
            self.id
        }

        async fn fetch_raw(&self, _author_id: &str) -> Result<RawPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.body {
                Some(body) => Ok(RawPayload::new(self.id, body.clone())),
                None => Err(MetricsError::Api {
                    code: 503,
                    message: "unavailable".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_first_success_stops_early() {
        let failing = Scripted::failing("serpapi");
        let sparse = Scripted::ok("scrape", json!({"author": {"name": "Ada"}}));
        let later = Scripted::ok("other", json!({"citations": 999}));
        let strategies: Vec<Arc<dyn DataSourceStrategy>> =
            vec![failing.clone(), sparse.clone(), later.clone()];

        let resolution = Resolver::default()
            .resolve_detailed("id", &strategies)
            .await;

        assert_eq!(resolution.metrics.data_source, "scrape");
        assert_eq!(resolution.metrics.author_name, "Ada");
        assert_eq!(resolution.metrics.citation_count, 0);
        assert_eq!(resolution.failures.len(), 1);
        assert_eq!(resolution.failures[0].strategy, "serpapi");
        assert_eq!(failing.calls(), 1);
        assert_eq!(later.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_fail_returns_unavailable() {
        let strategies: Vec<Arc<dyn DataSourceStrategy>> =
            vec![Scripted::failing("serpapi"), Scripted::failing("scrape")];

        let resolution = Resolver::default()
            .resolve_detailed("id", &strategies)
            .await;

        assert!(resolution.is_exhausted());
        assert_eq!(resolution.metrics.citation_count, 0);
        assert!(resolution.metrics.papers.is_empty());
        assert!(resolution.failure_summary().contains("serpapi"));
        assert!(resolution.failure_summary().contains("scrape"));
    }

    #[tokio::test]
    async fn test_no_strategies() {
        let resolution = Resolver::default().resolve_detailed("id", &[]).await;
        assert!(resolution.is_exhausted());
        assert_eq!(resolution.failure_summary(), "no data sources configured");
    }

    #[tokio::test]
    async fn test_empty_work_list_is_success() {
        let strategies: Vec<Arc<dyn DataSourceStrategy>> =
            vec![Scripted::ok("serpapi", json!({"articles": []}))];
        let metrics = Resolver::default().resolve("id", &strategies).await;
        assert!(!metrics.is_unavailable());
        assert_eq!(metrics.publication_count, 0);
    }

    #[tokio::test]
    async fn test_merge_mode_combines_live_sources() {
        let strategies: Vec<Arc<dyn DataSourceStrategy>> = vec![
            Scripted::ok(
                "serpapi",
                json!({"articles": [{"title": "Alpha", "citations": 12}]}),
            ),
            Scripted::ok(
                "scrape",
                json!({"articles": [
                    {"title": "ALPHA", "citations": 1},
                    {"title": "Beta", "citations": 11}
                ]}),
            ),
            Arc::new(SnapshotStrategy::fixed(
                json!({"articles": [{"title": "Stale", "citations": 500}]}),
            )),
        ];

        let metrics = Resolver::new(ReconcileMode::Merge)
            .resolve("id", &strategies)
            .await;

        assert_eq!(metrics.data_source, "serpapi+scrape");
        assert_eq!(metrics.publication_count, 2);
        assert_eq!(metrics.papers[0].title, "Alpha");
        assert_eq!(metrics.i10_index, 2);
    }

    #[tokio::test]
    async fn test_snapshot_fallback_after_live_failures() {
        let strategies: Vec<Arc<dyn DataSourceStrategy>> = vec![
            Scripted::failing("serpapi"),
            Arc::new(SnapshotStrategy::fixed(json!({"citations": 44}))),
        ];
        let metrics = Resolver::new(ReconcileMode::Merge)
            .resolve("id", &strategies)
            .await;
        assert_eq!(metrics.data_source, "snapshot");
        assert_eq!(metrics.citation_count, 44);
    }

    #[tokio::test]
    async fn test_live_success_written_through() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let store = SnapshotStore::with_path(dir.path().join("snap.json"));
        let strategies: Vec<Arc<dyn DataSourceStrategy>> =
            vec![Scripted::ok("serpapi", json!({"citations": 7}))];

        Resolver::default()
            .with_snapshot_writes(store.clone())
            .resolve("id", &strategies)
            .await;

        let saved = store.load()?;
        assert_eq!(saved.source.as_deref(), Some("serpapi"));
        assert_eq!(saved.payload["citations"], 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_payload_not_written_back() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let store = SnapshotStore::with_path(dir.path().join("snap.json"));
        let strategies: Vec<Arc<dyn DataSourceStrategy>> =
            vec![Arc::new(SnapshotStrategy::fixed(json!({"citations": 1})))];

        Resolver::default()
            .with_snapshot_writes(store.clone())
            .resolve("id", &strategies)
            .await;

        assert!(!store.path().exists());
        Ok(())
    }
}
