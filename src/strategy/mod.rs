//! Data-source strategies.
//!
//! Each strategy is one way of obtaining an author's raw citation payload:
//!
//! - [`SerpApiStrategy`] - structured Scholar author API
//! - [`ProfileScrapeStrategy`] - scrape of the public profile page
//! - [`SnapshotStrategy`] - last-known-good payload from disk, or a fixed value
//!
//! The resolver tries strategies in the order it is given and stops at the
//! first one that returns `Ok`. A strategy only fails for transport or parse
//! problems; a payload with missing optional fields is still a success.

mod scrape;
mod serpapi;
mod snapshot;

pub use scrape::ProfileScrapeStrategy;
pub use serpapi::SerpApiStrategy;
pub use snapshot::SnapshotStrategy;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unnormalized payload returned by a strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPayload {
    /// Id of the strategy that produced the payload
    pub source: String,
    /// Body in the Scholar author shape; schema not contractually fixed
    pub body: Value,
}

impl RawPayload {
    pub fn new(source: impl Into<String>, body: Value) -> Self {
        Self {
            source: source.into(),
            body,
        }
    }
}

/// One method of obtaining raw citation data for an author.
#[async_trait]
pub trait DataSourceStrategy: Send + Sync + std::fmt::Debug {
    /// Short identifier used as the `data_source` tag (e.g. "serpapi")
    fn id(&self) -> &str;

    /// Whether the payload comes from an upstream service rather than a
    /// stored snapshot. Only live payloads are written through to the snapshot.
    fn is_live(&self) -> bool {
        true
    }

    /// Fetch the raw payload for `author_id`.
    async fn fetch_raw(&self, author_id: &str) -> Result<RawPayload>;
}
