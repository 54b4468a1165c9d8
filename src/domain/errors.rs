//! Domain errors for failure classification and recovery.

use thiserror::Error;

use super::models::BackgroundWork;

/// Errors local to a single (project, event) handling pass. None of these
/// crash the orchestrator's event loop.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The log manifest anchoring the project's log directories could not be
    /// located (tool never built this project, or paths are stale).
    #[error("No log manifest found for {0}")]
    ManifestNotFound(String),

    /// No build log appeared after the last known-good moment, even after
    /// waiting out the artifact retry budget.
    #[error("No logs found")]
    NoLogsFound,

    /// The build log was found but could not be decompressed or decoded.
    #[error("Failed to read log: {0}")]
    UnreadableLog(String),

    /// The per-project retry budget is spent; no command was issued.
    #[error("Not running \"{command}\" due to multiple consecutive failures")]
    RetryBudgetExhausted { command: &'static str },

    /// A background tool process did not quiesce within the wait ceiling.
    #[error("Timed out waiting for {work} to end")]
    ProcessWaitTimeout { work: BackgroundWork },

    /// The automated tool ran the command but reported a failure.
    #[error("{0}")]
    ActionExecution(String),

    /// Resolve-dependencies recovery is disabled by preference.
    #[error("Resolving packages to fix failures is disabled")]
    ResolvingPackagesDisabled,

    /// Clean recovery is disabled by preference.
    #[error("Cleaning to fix failures is disabled")]
    CleaningDisabled,

    /// A configured process-name pattern does not compile.
    #[error("Invalid process pattern \"{pattern}\": {source}")]
    InvalidProcessPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RecoveryError {
    /// Whether this error is an expected early exit rather than something
    /// going wrong; expected exits are surfaced as informational console
    /// lines instead of errors.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Self::RetryBudgetExhausted { .. }
                | Self::ResolvingPackagesDisabled
                | Self::CleaningDisabled
        )
    }
}

pub type RecoveryResult<T> = Result<T, RecoveryError>;
