//! Classification of build failures from freshly produced log artifacts.

use flate2::read::GzDecoder;
use regex::Regex;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use crate::domain::errors::{RecoveryError, RecoveryResult};
use crate::domain::models::FailureSignature;
use crate::services::artifact_watcher::ArtifactWatcher;
use crate::services::log_locator::LogDirectories;

/// Extension of the tool's gzip-compressed build logs.
pub const BUILD_LOG_EXTENSION: &str = "xcactivitylog";

/// Extension of test/launch result bundles.
pub const RESULT_EXTENSION: &str = "xcresult";

/// Signature patterns, compiled once. The patterns are hard-coded constants
/// verified by the signature tests, so compilation cannot fail at runtime.
static SIGNATURE_PATTERNS: LazyLock<Vec<(FailureSignature, Regex)>> = LazyLock::new(|| {
    FailureSignature::ALL
        .into_iter()
        .filter_map(|signature| {
            signature
                .search_pattern()
                .map(|pattern| (signature, Regex::new(pattern).expect("hard-coded pattern")))
        })
        .collect()
});

/// Reads the most recent build log plus the test/launch result directories
/// and maps what it finds to the set of known failure signatures.
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    watcher: ArtifactWatcher,
}

impl FailureClassifier {
    pub fn new(watcher: ArtifactWatcher) -> Self {
        Self { watcher }
    }

    /// Classify the failure whose artifacts were produced after `since`.
    ///
    /// Fails only if the primary build log cannot be obtained; the result
    /// artifact presence checks union into whatever the log scan found.
    pub async fn classify(
        &self,
        dirs: &LogDirectories,
        since: chrono::DateTime<chrono::Utc>,
    ) -> RecoveryResult<HashSet<FailureSignature>> {
        // The log lookup goes first because it is the only step that
        // retries-and-waits; the presence checks below do not retry and
        // benefit from any log-flush delay having already resolved.
        let log = self.build_log(dirs, since).await?;
        let mut signatures = Self::scan_log(&log);

        let test_results = self
            .watcher
            .files_created_after(&dirs.test_dir, since, Some(RESULT_EXTENSION), false)
            .await;
        if !test_results.is_empty() {
            signatures.insert(FailureSignature::HasTestResultArtifact);
        }

        let launch_results = self
            .watcher
            .files_created_after(&dirs.launch_dir, since, Some(RESULT_EXTENSION), false)
            .await;
        if !launch_results.is_empty() {
            signatures.insert(FailureSignature::HasLaunchResultArtifact);
        }

        debug!(?signatures, "classified build failure");
        Ok(signatures)
    }

    /// Locate and decode the most recent build log created after `since`.
    async fn build_log(
        &self,
        dirs: &LogDirectories,
        since: chrono::DateTime<chrono::Utc>,
    ) -> RecoveryResult<String> {
        let logs = self
            .watcher
            .files_created_after(&dirs.build_dir, since, Some(BUILD_LOG_EXTENSION), true)
            .await;
        let path = logs.first().ok_or(RecoveryError::NoLogsFound)?;
        Self::decode_log(path).await
    }

    /// Build logs are gzip-compressed UTF-8 text.
    async fn decode_log(path: &Path) -> RecoveryResult<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| RecoveryError::UnreadableLog(err.to_string()))?;

        let mut text = String::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_string(&mut text)
            .map_err(|err| RecoveryError::UnreadableLog(err.to_string()))?;
        Ok(text)
    }

    /// Scan the decoded log against every signature pattern. Failures are
    /// conventionally near the end, so lines are walked back to front.
    fn scan_log(log: &str) -> HashSet<FailureSignature> {
        let mut signatures = HashSet::new();
        for (signature, pattern) in SIGNATURE_PATTERNS.iter() {
            if log.lines().rev().any(|line| pattern.is_match(line)) {
                signatures.insert(*signature);
            }
        }
        signatures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::WatcherConfig;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn fixture(log_text: Option<&str>) -> (TempDir, LogDirectories) {
        let root = TempDir::new().unwrap();
        let dirs = LogDirectories {
            build_dir: root.path().join("Build"),
            test_dir: root.path().join("Test"),
            launch_dir: root.path().join("Launch"),
        };
        fs::create_dir_all(&dirs.build_dir).unwrap();
        fs::create_dir_all(&dirs.test_dir).unwrap();
        fs::create_dir_all(&dirs.launch_dir).unwrap();
        if let Some(text) = log_text {
            fs::write(dirs.build_dir.join("1.xcactivitylog"), gzip(text)).unwrap();
        }
        (root, dirs)
    }

    fn classifier() -> FailureClassifier {
        // One retry pass keeps the no-logs tests fast.
        FailureClassifier::new(ArtifactWatcher::new(&WatcherConfig {
            retry_attempts: 1,
            retry_interval_ms: 1,
        }))
    }

    fn epoch() -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::UNIX_EPOCH
    }

    #[tokio::test]
    async fn single_pattern_yields_single_signature() {
        let (_root, dirs) = fixture(Some(
            "compile things\ntargetID (42) not found in _activeTargets\nbuild failed\n",
        ));

        let signatures = classifier().classify(&dirs, epoch()).await.unwrap();
        assert_eq!(
            signatures,
            HashSet::from([FailureSignature::TargetIdNotFound])
        );
    }

    #[tokio::test]
    async fn multiple_patterns_all_detected() {
        let (_root, dirs) = fixture(Some(
            "contains multiple references with the same GUID\nBuild again to continue\n",
        ));

        let signatures = classifier().classify(&dirs, epoch()).await.unwrap();
        assert!(signatures.contains(&FailureSignature::CanRetryDirectly));
        assert!(signatures.contains(&FailureSignature::DuplicateGuidReference));
        assert_eq!(signatures.len(), 2);
    }

    #[tokio::test]
    async fn target_id_pattern_requires_numeric_id() {
        let (_root, dirs) = fixture(Some("targetID (foo) not found in _activeTargets\n"));
        let signatures = classifier().classify(&dirs, epoch()).await.unwrap();
        assert!(signatures.is_empty());
    }

    #[tokio::test]
    async fn result_artifacts_union_into_signature_set() {
        let (_root, dirs) = fixture(Some("CodeSign failed with a nonzero exit code\n"));
        fs::write(dirs.test_dir.join("run.xcresult"), b"bundle").unwrap();
        fs::write(dirs.launch_dir.join("run.xcresult"), b"bundle").unwrap();

        let signatures = classifier().classify(&dirs, epoch()).await.unwrap();
        assert_eq!(
            signatures,
            HashSet::from([
                FailureSignature::CodesignNonZeroExit,
                FailureSignature::HasTestResultArtifact,
                FailureSignature::HasLaunchResultArtifact,
            ])
        );
    }

    #[tokio::test]
    async fn artifact_checks_run_even_without_log_matches() {
        let (_root, dirs) = fixture(Some("some unrelated failure\n"));
        fs::write(dirs.test_dir.join("run.xcresult"), b"bundle").unwrap();

        let signatures = classifier().classify(&dirs, epoch()).await.unwrap();
        assert_eq!(
            signatures,
            HashSet::from([FailureSignature::HasTestResultArtifact])
        );
    }

    #[tokio::test]
    async fn missing_log_fails_with_no_logs_found() {
        let (_root, dirs) = fixture(None);
        let err = classifier().classify(&dirs, epoch()).await.unwrap_err();
        assert!(matches!(err, RecoveryError::NoLogsFound));
    }

    #[tokio::test]
    async fn non_gzip_log_fails_with_unreadable_log() {
        let (_root, dirs) = fixture(None);
        fs::write(dirs.build_dir.join("1.xcactivitylog"), b"plain text").unwrap();

        let err = classifier().classify(&dirs, epoch()).await.unwrap_err();
        assert!(matches!(err, RecoveryError::UnreadableLog(_)));
    }
}
