//! Background-process quiescence polling.

use async_trait::async_trait;
use regex::Regex;
use std::sync::Mutex;
use std::time::Duration;
use sysinfo::{ProcessRefreshKind, RefreshKind, System, UpdateKind};
use tokio::time::Instant;
use tracing::debug;

use crate::domain::errors::{RecoveryError, RecoveryResult};
use crate::domain::models::{BackgroundWork, ProcessWaitConfig};
use crate::domain::ports::{ProcessLister, ProcessWatcher};

/// Polls the process list until no process matching a background work class
/// remains, with a hard ceiling measured from watch start.
pub struct PollingProcessWatcher<L> {
    lister: L,
    poll_interval: Duration,
    timeout: Duration,
    resolve_patterns: Vec<Regex>,
    clean_patterns: Vec<Regex>,
}

impl<L: ProcessLister> PollingProcessWatcher<L> {
    /// Compiles the configured process-name patterns up front; invalid
    /// patterns are rejected at construction rather than mid-recovery.
    pub fn new(lister: L, config: &ProcessWaitConfig) -> RecoveryResult<Self> {
        Ok(Self {
            lister,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
            resolve_patterns: Self::compile(&config.resolve_patterns)?,
            clean_patterns: Self::compile(&config.clean_patterns)?,
        })
    }

    fn compile(patterns: &[String]) -> RecoveryResult<Vec<Regex>> {
        patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| RecoveryError::InvalidProcessPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }

    fn patterns_for(&self, work: BackgroundWork) -> &[Regex] {
        match work {
            BackgroundWork::ResolvingDependencies => &self.resolve_patterns,
            BackgroundWork::Cleaning => &self.clean_patterns,
        }
    }
}

#[async_trait]
impl<L: ProcessLister> ProcessWatcher for PollingProcessWatcher<L> {
    async fn await_quiescence(&self, work: BackgroundWork) -> RecoveryResult<()> {
        let patterns = self.patterns_for(work);
        let started = Instant::now();

        while started.elapsed() < self.timeout {
            tokio::time::sleep(self.poll_interval).await;

            let processes = self.lister.list();
            let busy = processes
                .iter()
                .any(|line| patterns.iter().any(|pattern| pattern.is_match(line)));
            if !busy {
                debug!(%work, "background processes quiesced");
                return Ok(());
            }
        }

        Err(RecoveryError::ProcessWaitTimeout { work })
    }
}

/// OS-backed process lister; each line is the process name followed by its
/// command line.
pub struct SysinfoProcessLister {
    system: Mutex<System>,
}

impl SysinfoProcessLister {
    pub fn new() -> Self {
        let refresh = RefreshKind::new()
            .with_processes(ProcessRefreshKind::new().with_cmd(UpdateKind::Always));
        Self {
            system: Mutex::new(System::new_with_specifics(refresh)),
        }
    }
}

impl Default for SysinfoProcessLister {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLister for SysinfoProcessLister {
    fn list(&self) -> Vec<String> {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_processes();
        system
            .processes()
            .values()
            .map(|process| format!("{} {}", process.name(), process.cmd().join(" ")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockProcessLister;

    fn watcher(lister: MockProcessLister) -> PollingProcessWatcher<MockProcessLister> {
        PollingProcessWatcher::new(lister, &ProcessWaitConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn returns_once_matching_processes_end() {
        let lister = MockProcessLister::with_snapshots(vec![
            vec!["swift-frontend -scan-dependencies".to_string()],
            vec!["swift-frontend -scan-dependencies".to_string()],
            vec!["unrelated-daemon".to_string()],
        ]);
        let calls = lister.call_count_handle();

        watcher(lister)
            .await_quiescence(BackgroundWork::ResolvingDependencies)
            .await
            .unwrap();

        // Two busy polls, then the quiesced one.
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_processes_never_end() {
        let lister = MockProcessLister::always(vec!["swift-driver compiling".to_string()]);

        let err = watcher(lister)
            .await_quiescence(BackgroundWork::Cleaning)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RecoveryError::ProcessWaitTimeout {
                work: BackgroundWork::Cleaning
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn clean_patterns_do_not_match_resolve_wait() {
        // A lingering swift-driver only blocks cleaning, not resolution.
        let lister = MockProcessLister::always(vec!["swift-driver compiling".to_string()]);

        watcher(lister)
            .await_quiescence(BackgroundWork::ResolvingDependencies)
            .await
            .unwrap();
    }

    #[test]
    fn invalid_pattern_rejected_at_construction() {
        let config = ProcessWaitConfig {
            resolve_patterns: vec!["(unclosed".to_string()],
            ..ProcessWaitConfig::default()
        };
        let err = PollingProcessWatcher::new(MockProcessLister::always(vec![]), &config)
            .err()
            .unwrap();
        assert!(matches!(err, RecoveryError::InvalidProcessPattern { .. }));
    }
}
