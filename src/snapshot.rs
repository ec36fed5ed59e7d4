//! Last-known-good snapshot persistence.
//!
//! After a live strategy succeeds, its raw payload can be written here so the
//! snapshot strategy has something to serve when every upstream is down.

use crate::error::{MetricsError, Result};
use crate::strategy::RawPayload;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name used under the home directory when no path is configured
const SNAPSHOT_FILE_NAME: &str = ".scholar_metrics_snapshot.json";

/// Default snapshot file path: `~/.scholar_metrics_snapshot.json`
pub fn default_snapshot_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(SNAPSHOT_FILE_NAME))
        .ok_or_else(|| MetricsError::Config("Cannot determine home directory".to_string()))
}

/// On-disk envelope around a raw payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// RFC 3339 timestamp of the save
    #[serde(default)]
    pub saved_at: Option<String>,
    /// Strategy that produced the payload
    #[serde(default)]
    pub source: Option<String>,
    pub payload: Value,
}

/// Snapshot store for loading and saving the last good payload
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a new SnapshotStore with default path
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: default_snapshot_path()?,
        })
    }

    /// Create a new SnapshotStore with custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the snapshot file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored snapshot.
    ///
    /// Accepts either a [`SnapshotFile`] envelope or a bare payload object.
    pub fn load(&self) -> Result<SnapshotFile> {
        let content = std::fs::read_to_string(&self.path)?;
        let value: Value = serde_json::from_str(&content)?;

        if !value.is_object() {
            return Err(MetricsError::Parse(format!(
                "snapshot {:?} is not a JSON object",
                self.path
            )));
        }

        let snapshot = if value.get("payload").is_some_and(Value::is_object) {
            serde_json::from_value(value)?
        } else {
            SnapshotFile {
                saved_at: None,
                source: None,
                payload: value,
            }
        };

        debug!(
            path = ?self.path,
            saved_at = ?snapshot.saved_at,
            source = ?snapshot.source,
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Save a payload as the new last-known-good snapshot.
    ///
    /// Writes to a sibling temp file first so a crash never leaves a torn file.
    pub fn save(&self, payload: &RawPayload) -> Result<()> {
        let snapshot = SnapshotFile {
            saved_at: Some(chrono::Utc::now().to_rfc3339()),
            source: Some(payload.source.clone()),
            payload: payload.body.clone(),
        };
        let content = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;

        info!(path = ?self.path, source = %payload.source, "Saved snapshot");
        Ok(())
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            path: PathBuf::from(SNAPSHOT_FILE_NAME),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_missing() {
        let store = SnapshotStore::with_path("/nonexistent/path/snapshot.json");
        assert!(matches!(store.load(), Err(MetricsError::Io(_))));
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = TempDir::new()?;
        let store = SnapshotStore::with_path(dir.path().join("nested").join("snap.json"));

        let payload = RawPayload::new("serpapi", json!({"author": {"name": "Ada"}}));
        store.save(&payload)?;

        let loaded = store.load()?;
        assert_eq!(loaded.source.as_deref(), Some("serpapi"));
        assert!(loaded.saved_at.is_some());
        assert_eq!(loaded.payload["author"]["name"], "Ada");
        Ok(())
    }

    #[test]
    fn test_load_bare_payload() -> Result<()> {
        let mut temp = NamedTempFile::new()?;
        write!(temp, r#"{{"citations": 44, "articles": []}}"#)?;

        let loaded = SnapshotStore::with_path(temp.path()).load()?;
        assert!(loaded.source.is_none());
        assert_eq!(loaded.payload["citations"], 44);
        Ok(())
    }

    #[test]
    fn test_load_invalid_json() -> Result<()> {
        let mut temp = NamedTempFile::new()?;
        write!(temp, "not json")?;
        let store = SnapshotStore::with_path(temp.path());
        assert!(matches!(store.load(), Err(MetricsError::Json(_))));
        Ok(())
    }

    #[test]
    fn test_load_non_object() -> Result<()> {
        let mut temp = NamedTempFile::new()?;
        write!(temp, "[1, 2, 3]")?;
        let store = SnapshotStore::with_path(temp.path());
        assert!(matches!(store.load(), Err(MetricsError::Parse(_))));
        Ok(())
    }
}
