//! Mock collaborators for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::errors::{RecoveryError, RecoveryResult};
use crate::domain::models::{BackgroundWork, CommandKind, CommandRequest};
use crate::domain::ports::{ActionExecutor, ProcessLister, ProcessWatcher};

/// Action executor that records every request and answers from a script of
/// configured responses. Defaults to success for everything.
#[derive(Default)]
pub struct MockActionExecutor {
    calls: Mutex<Vec<CommandRequest>>,
    failures: Mutex<Vec<(CommandKind, String)>>,
}

impl MockActionExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent command of `kind` report this failure message.
    pub fn fail_with(&self, kind: CommandKind, message: impl Into<String>) {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((kind, message.into()));
    }

    /// Every request executed so far, in order.
    pub fn calls(&self) -> Vec<CommandRequest> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl ActionExecutor for MockActionExecutor {
    async fn execute(&self, request: &CommandRequest) -> RecoveryResult<Option<String>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        let failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(failures
            .iter()
            .find(|(kind, _)| *kind == request.kind)
            .map(|(_, message)| message.clone()))
    }
}

/// Process watcher that resolves immediately, optionally timing out for a
/// chosen work class. Counts invocations so tests can assert the
/// prerequisite wait actually happened.
#[derive(Default)]
pub struct MockProcessWatcher {
    timeout_for: Mutex<Option<BackgroundWork>>,
    waits: AtomicUsize,
}

impl MockProcessWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the wait ceiling being hit for `work`.
    pub fn time_out_on(&self, work: BackgroundWork) {
        *self
            .timeout_for
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(work);
    }

    pub fn wait_count(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessWatcher for MockProcessWatcher {
    async fn await_quiescence(&self, work: BackgroundWork) -> RecoveryResult<()> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        let timeout_for = *self
            .timeout_for
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if timeout_for == Some(work) {
            return Err(RecoveryError::ProcessWaitTimeout { work });
        }
        Ok(())
    }
}

/// Process lister answering from a scripted sequence of snapshots, then a
/// fixed fallback snapshot once the script is exhausted.
pub struct MockProcessLister {
    snapshots: Mutex<VecDeque<Vec<String>>>,
    fallback: Vec<String>,
    calls: Arc<AtomicUsize>,
}

impl MockProcessLister {
    /// Serve each snapshot once, then empty process lists.
    pub fn with_snapshots(snapshots: Vec<Vec<String>>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into()),
            fallback: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serve the same snapshot forever.
    pub fn always(snapshot: Vec<String>) -> Self {
        Self {
            snapshots: Mutex::new(VecDeque::new()),
            fallback: snapshot,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl ProcessLister for MockProcessLister {
    fn list(&self) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
