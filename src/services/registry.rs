//! In-memory per-project state registry.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::models::ProjectIdentity;

/// Where a project currently sits in the recovery lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPhase {
    Idle,
    AwaitingClassification,
    AttemptingRecovery,
    /// Retry budget spent; stays blocked until a future successful build.
    Blocked,
}

/// Intentionally mutable per-project state. Lives for the lifetime of the
/// orchestrator process; never explicitly destroyed.
#[derive(Debug)]
pub struct ProjectState {
    pub identity: ProjectIdentity,
    /// Last known-good moment. Classification only considers log content
    /// produced after this point. Seeded with the epoch: before the first
    /// successful build every log is relevant.
    pub last_build_success: DateTime<Utc>,
    pub retries_remaining: u32,
    pub phase: RecoveryPhase,
}

impl ProjectState {
    fn new(identity: ProjectIdentity, max_retries: u32) -> Self {
        Self {
            identity,
            last_build_success: DateTime::UNIX_EPOCH,
            retries_remaining: max_retries,
            phase: RecoveryPhase::Idle,
        }
    }

    /// A successful build restores the full budget and moves the known-good
    /// marker forward.
    pub fn record_build_success(&mut self, max_retries: u32) {
        self.retries_remaining = max_retries;
        self.last_build_success = Utc::now();
        self.phase = RecoveryPhase::Idle;
    }

    /// Consume one retry. Returns false (and leaves the budget untouched)
    /// when the budget is already spent.
    pub fn consume_retry(&mut self) -> bool {
        if self.retries_remaining == 0 {
            return false;
        }
        self.retries_remaining -= 1;
        true
    }
}

/// Shared map from project identity to its state, with per-key locking.
///
/// The outer lock only guards map shape; each project's state has its own
/// mutex which handlers hold for the duration of an event pass, serializing
/// all mutation per identity.
pub struct ProjectRegistry {
    max_retries: u32,
    projects: RwLock<HashMap<ProjectIdentity, Arc<Mutex<ProjectState>>>>,
    resolved_failures: AtomicU64,
}

impl ProjectRegistry {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            projects: RwLock::new(HashMap::new()),
            resolved_failures: AtomicU64::new(0),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Fetch the state handle for an identity, creating it lazily on first
    /// reference.
    pub async fn get_or_insert(&self, identity: ProjectIdentity) -> Arc<Mutex<ProjectState>> {
        {
            let projects = self.projects.read().await;
            if let Some(state) = projects.get(&identity) {
                return Arc::clone(state);
            }
        }

        let mut projects = self.projects.write().await;
        Arc::clone(projects.entry(identity.clone()).or_insert_with(|| {
            Arc::new(Mutex::new(ProjectState::new(identity, self.max_retries)))
        }))
    }

    /// Count of failures resolved automatically since process start.
    pub fn resolved_failures(&self) -> u64 {
        self.resolved_failures.load(Ordering::Relaxed)
    }

    pub fn record_resolved_failure(&self) -> u64 {
        self.resolved_failures.fetch_add(1, Ordering::Relaxed) + 1
    }
}
