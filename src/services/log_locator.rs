//! Resolution of a project's on-disk log directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use crate::domain::errors::{RecoveryError, RecoveryResult};
use crate::domain::models::ProjectContext;

/// Manifest file anchoring the tool's per-project log layout.
const MANIFEST_FILE: &str = "LogStoreManifest.plist";

/// Default derived-data location relative to the user's home directory.
const DEFAULT_DERIVED_DATA: &str = "Library/Developer/Xcode/DerivedData";

/// Directories where the tool writes build, test, and launch artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirectories {
    pub build_dir: PathBuf,
    pub test_dir: PathBuf,
    pub launch_dir: PathBuf,
}

/// One-shot filesystem lookup of a project's log directories, anchored on
/// the per-project log manifest. No retries: if the manifest is not there
/// the tool has never built this project (or the paths are stale).
#[derive(Debug, Clone, Default)]
pub struct LogLocator {
    search_root: Option<PathBuf>,
}

impl LogLocator {
    /// `search_root` overrides where project log containers are looked for;
    /// when `None` the event's tool home directory or the tool's default
    /// derived-data location is used.
    pub fn new(search_root: Option<PathBuf>) -> Self {
        Self { search_root }
    }

    /// Resolve the build/test/launch log directories for `context`.
    pub fn resolve(&self, context: &ProjectContext) -> RecoveryResult<LogDirectories> {
        let root = self.root_for(context)?;
        let container = self.find_container(&root, context)?;

        let logs = container.join("Logs");
        Ok(LogDirectories {
            build_dir: logs.join("Build"),
            test_dir: logs.join("Test"),
            launch_dir: logs.join("Launch"),
        })
    }

    fn root_for(&self, context: &ProjectContext) -> RecoveryResult<PathBuf> {
        if let Some(root) = &self.search_root {
            return Ok(root.clone());
        }
        if let Some(home) = context.tool_home.as_deref().filter(|s| !s.is_empty()) {
            return Ok(PathBuf::from(home).join("DerivedData"));
        }
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_DERIVED_DATA))
            .ok_or_else(|| RecoveryError::ManifestNotFound(context.identity().to_string()))
    }

    /// A project's container is named `<stem>-<hash>` under the root and
    /// holds `Logs/Build/LogStoreManifest.plist`. When several candidates
    /// match (stale containers linger), the newest manifest wins.
    fn find_container(&self, root: &Path, context: &ProjectContext) -> RecoveryResult<PathBuf> {
        let stem = context.display_name();
        let entries = fs::read_dir(root).map_err(|err| {
            debug!(root = %root.display(), %err, "derived data root unreadable");
            RecoveryError::ManifestNotFound(context.identity().to_string())
        })?;

        let mut best: Option<(SystemTime, PathBuf)> = None;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() || !Self::container_matches(&path, stem.as_deref()) {
                continue;
            }

            let manifest = path.join("Logs").join("Build").join(MANIFEST_FILE);
            let Ok(meta) = fs::metadata(&manifest) else {
                continue;
            };
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if best.as_ref().is_none_or(|(seen, _)| modified > *seen) {
                best = Some((modified, path));
            }
        }

        best.map(|(_, path)| path)
            .ok_or_else(|| RecoveryError::ManifestNotFound(context.identity().to_string()))
    }

    fn container_matches(path: &Path, stem: Option<&str>) -> bool {
        let Some(stem) = stem else {
            // No project name to match on; any manifest-bearing container
            // under the root is a candidate.
            return true;
        };
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == stem || name.starts_with(&format!("{stem}-")))
    }
}
