//! Ports to the effectful collaborators surrounding the core.

use async_trait::async_trait;

use super::errors::RecoveryResult;
use super::models::{BackgroundWork, CommandRequest};

/// Executes a corrective command by driving the external build tool.
///
/// The mechanics (UI automation, scripting) are outside the core; the
/// contract is success or an error message surfaced verbatim to the console.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Run the command. `Ok(None)` means the tool accepted it; `Ok(Some(msg))`
    /// means the tool ran it but reported a failure. `Err` is reserved for
    /// infrastructure failures (e.g. the script could not be spawned).
    async fn execute(&self, request: &CommandRequest) -> RecoveryResult<Option<String>>;
}

/// Suspends a task until a class of background tool processes has quiesced.
#[async_trait]
pub trait ProcessWatcher: Send + Sync {
    /// Poll until no process matching `work`'s patterns remains, failing with
    /// [`RecoveryError::ProcessWaitTimeout`] once the wait ceiling is hit.
    ///
    /// [`RecoveryError::ProcessWaitTimeout`]: super::errors::RecoveryError::ProcessWaitTimeout
    async fn await_quiescence(&self, work: BackgroundWork) -> RecoveryResult<()>;
}

/// Snapshot of currently running OS processes, one line per process.
///
/// Kept separate from [`ProcessWatcher`] so the polling loop itself can be
/// exercised against scripted process lists.
pub trait ProcessLister: Send + Sync {
    fn list(&self) -> Vec<String>;
}
