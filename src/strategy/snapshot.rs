//! Last-resort strategy backed by a stored or fixed payload.

use super::{DataSourceStrategy, RawPayload};
use crate::error::Result;
use crate::snapshot::SnapshotStore;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Clone)]
enum SnapshotSource {
    File(SnapshotStore),
    Fixed(Value),
}

/// Serves the last-known-good payload without touching the network
#[derive(Debug, Clone)]
pub struct SnapshotStrategy {
    source: SnapshotSource,
}

impl SnapshotStrategy {
    /// Read the payload from a snapshot file on every call.
    pub fn from_store(store: SnapshotStore) -> Self {
        Self {
            source: SnapshotSource::File(store),
        }
    }

    /// Always return `payload`; this variant cannot fail.
    pub fn fixed(payload: Value) -> Self {
        Self {
            source: SnapshotSource::Fixed(payload),
        }
    }
}

#[async_trait]
impl DataSourceStrategy for SnapshotStrategy {
    fn id(&self) -> &str {
        "snapshot"
    }

    fn is_live(&self) -> bool {
        false
    }

    async fn fetch_raw(&self, author_id: &str) -> Result<RawPayload> {
        match &self.source {
            SnapshotSource::Fixed(payload) => Ok(RawPayload::new(self.id(), payload.clone())),
            SnapshotSource::File(store) => {
                let snapshot = store.load()?;
                info!(
                    author_id,
                    path = ?store.path(),
                    saved_at = snapshot.saved_at.as_deref().unwrap_or("unknown"),
                    "Serving snapshot"
                );
                Ok(RawPayload::new(self.id(), snapshot.payload))
            }
        }
    }
}
