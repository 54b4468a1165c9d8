//! Polling for artifacts created after a reference timestamp.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::domain::models::WatcherConfig;

/// Scans a directory for files of a given kind created after a reference
/// timestamp, optionally retrying for a bounded period while waiting for a
/// file to appear (logs are flushed to disk a beat after the build ends).
#[derive(Debug, Clone)]
pub struct ArtifactWatcher {
    retry_attempts: u32,
    retry_interval: Duration,
}

impl ArtifactWatcher {
    pub fn new(config: &WatcherConfig) -> Self {
        Self {
            retry_attempts: config.retry_attempts,
            retry_interval: Duration::from_millis(config.retry_interval_ms),
        }
    }

    /// Files in `directory` with the `kind` extension created strictly after
    /// `since`, in filesystem enumeration order.
    ///
    /// With `retry` false this is a single pass: absence is meaningful and
    /// must not block. With `retry` true an empty first pass is followed by
    /// up to `retry_attempts` further passes with a pause in between,
    /// returning as soon as one is non-empty. Absence after all attempts is
    /// a valid terminal outcome, not an error.
    pub async fn files_created_after(
        &self,
        directory: &Path,
        since: DateTime<Utc>,
        kind: Option<&str>,
        retry: bool,
    ) -> Vec<PathBuf> {
        let found = Self::scan(directory, since, kind);
        if !found.is_empty() || !retry {
            return found;
        }

        for _ in 0..self.retry_attempts {
            let found = Self::scan(directory, since, kind);
            if !found.is_empty() {
                return found;
            }
            tokio::time::sleep(self.retry_interval).await;
        }

        Vec::new()
    }

    /// Single directory pass. Read failures are swallowed and reported as
    /// empty results: scanning a transient or not-yet-created directory must
    /// not abort classification.
    fn scan(directory: &Path, since: DateTime<Utc>, kind: Option<&str>) -> Vec<PathBuf> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(directory = %directory.display(), %err, "directory scan failed");
                return Vec::new();
            }
        };

        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| !Self::is_hidden(path))
            .filter(|path| Self::kind_matches(path, kind))
            .filter(|path| Self::created_after(path, since))
            .collect()
    }

    fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'))
    }

    fn kind_matches(path: &Path, kind: Option<&str>) -> bool {
        match kind {
            Some(kind) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == kind),
            None => true,
        }
    }

    /// Unknown creation time means not newer.
    fn created_after(path: &Path, since: DateTime<Utc>) -> bool {
        fs::metadata(path)
            .and_then(|meta| meta.created())
            .map(|created| DateTime::<Utc>::from(created) > since)
            .unwrap_or(false)
    }
}
