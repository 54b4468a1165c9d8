//! Recovery orchestration: consumes lifecycle events, classifies build
//! failures, and drives the minimum corrective action within a bounded
//! per-project retry budget.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::domain::errors::{RecoveryError, RecoveryResult};
use crate::domain::models::{
    BackgroundWork, CommandKind, CommandRequest, Config, EventKind, FailureSignature,
    LifecycleEvent, Preferences, ProjectContext, Severity,
};
use crate::domain::ports::{ActionExecutor, ProcessWatcher};
use crate::services::registry::{ProjectState, RecoveryPhase};
use crate::services::{
    ArtifactWatcher, ConsoleSink, FailureClassifier, LogLocator, ProjectRegistry,
};

/// Recovery path chosen by the decision policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    RetryDirectly,
    ResolveDependenciesThenRetry,
    CleanThenRetry,
}

/// Fixed-priority decision over the raw signature set. The rules are not
/// mutually exclusive in the set, but only the first matching rule fires.
/// The ordering (retry over resolve over clean) follows the original tool's
/// policy and is deliberately not re-derived here.
fn decide(signatures: &HashSet<FailureSignature>) -> Option<Recovery> {
    if signatures.contains(&FailureSignature::CanRetryDirectly) {
        Some(Recovery::RetryDirectly)
    } else if signatures.contains(&FailureSignature::DuplicateGuidReference) {
        Some(Recovery::ResolveDependenciesThenRetry)
    } else if signatures.contains(&FailureSignature::DuplicateTargetEndedMessage)
        || signatures.contains(&FailureSignature::TargetIdNotFound)
        || signatures.contains(&FailureSignature::CodesignNonZeroExit)
    {
        Some(Recovery::CleanThenRetry)
    } else {
        None
    }
}

/// What the user was trying to do when the build failed, inferred from which
/// result artifact was produced. Tests take precedence over launch when both
/// are present.
fn intended_kind(signatures: &HashSet<FailureSignature>) -> CommandKind {
    if signatures.contains(&FailureSignature::HasTestResultArtifact) {
        CommandKind::Test
    } else if signatures.contains(&FailureSignature::HasLaunchResultArtifact) {
        CommandKind::Launch
    } else {
        CommandKind::Build
    }
}

/// Per-project recovery state machine over a stream of lifecycle events.
///
/// No error raised while handling a single (project, event) pair propagates
/// out of the event loop; everything is surfaced through the console sink.
pub struct RecoveryOrchestrator {
    registry: Arc<ProjectRegistry>,
    console: Arc<ConsoleSink>,
    executor: Arc<dyn ActionExecutor>,
    process_watcher: Arc<dyn ProcessWatcher>,
    locator: LogLocator,
    classifier: FailureClassifier,
    preferences: Preferences,
    shutdown_tx: broadcast::Sender<()>,
}

impl RecoveryOrchestrator {
    pub fn new(
        config: &Config,
        registry: Arc<ProjectRegistry>,
        console: Arc<ConsoleSink>,
        executor: Arc<dyn ActionExecutor>,
        process_watcher: Arc<dyn ProcessWatcher>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            registry,
            console,
            executor,
            process_watcher,
            locator: LogLocator::new(config.log_root.clone()),
            classifier: FailureClassifier::new(ArtifactWatcher::new(&config.watcher)),
            preferences: config.preferences.clone(),
            shutdown_tx,
        }
    }

    /// Consume events until the channel closes or shutdown is signalled.
    /// Each event is handled on its own task; outstanding handlers are
    /// aborted on shutdown so their cooperative waits end promptly.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<LifecycleEvent>) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut handlers: JoinSet<()> = JoinSet::new();

        self.console.append("Listening for events", Severity::Dim);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("shutdown requested, aborting outstanding handlers");
                    handlers.abort_all();
                    break;
                }
                Some(result) = handlers.join_next(), if !handlers.is_empty() => {
                    if let Err(err) = result {
                        if !err.is_cancelled() {
                            warn!(%err, "event handler panicked");
                        }
                    }
                }
                event = events.recv() => match event {
                    Some(event) => {
                        let this = Arc::clone(&self);
                        handlers.spawn(async move { this.handle_event(event).await });
                    }
                    None => break,
                },
            }
        }

        while handlers.join_next().await.is_some() {}
    }

    /// Signal `run` to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Handle one lifecycle event. All mutation of the project's state
    /// happens under its per-identity lock, serializing concurrent events
    /// for the same project.
    pub async fn handle_event(&self, event: LifecycleEvent) {
        let context = &event.context;
        let handle = self.registry.get_or_insert(context.identity()).await;
        let mut state = handle.lock().await;

        self.console_for(context, event.kind.console_label(), Severity::Dim);

        match event.kind {
            EventKind::BuildStarted => {
                // Deliberately no state change: the known-good marker only
                // moves on success.
            }
            EventKind::BuildSucceeded => {
                state.record_build_success(self.registry.max_retries());
            }
            EventKind::BuildFailed => {
                if let Err(err) = self.handle_failure(context, &mut state).await {
                    if err.is_informational() {
                        self.console_for(context, err.to_string(), Severity::Dim);
                    } else {
                        self.console_for(context, format!("Error: {err}"), Severity::Error);
                    }
                    if !matches!(err, RecoveryError::RetryBudgetExhausted { .. }) {
                        state.phase = RecoveryPhase::Idle;
                    }
                }
            }
            EventKind::TestStarted | EventKind::TestSucceeded | EventKind::TestFailed => {
                // Observability only; recovery is triggered solely by build
                // failure.
            }
        }
    }

    /// Classify the failure and attempt the minimum corrective action.
    async fn handle_failure(
        &self,
        context: &ProjectContext,
        state: &mut ProjectState,
    ) -> RecoveryResult<()> {
        state.phase = RecoveryPhase::AwaitingClassification;

        let dirs = self.locator.resolve(context)?;
        let signatures = self.classifier.classify(&dirs, state.last_build_success).await?;

        if signatures.contains(&FailureSignature::HasTestResultArtifact)
            && !self.preferences.fix_when_running_tests
        {
            self.console_for(
                context,
                "Fixing failures when running tests is disabled",
                Severity::Dim,
            );
            state.phase = RecoveryPhase::Idle;
            return Ok(());
        }

        if signatures.contains(&FailureSignature::HasLaunchResultArtifact)
            && !self.preferences.fix_when_launching
        {
            self.console_for(
                context,
                "Fixing failures when launching is disabled",
                Severity::Dim,
            );
            state.phase = RecoveryPhase::Idle;
            return Ok(());
        }

        let Some(recovery) = decide(&signatures) else {
            self.console_for(
                context,
                "No known recovery steps for build failure",
                Severity::Dim,
            );
            state.phase = RecoveryPhase::Idle;
            return Ok(());
        };

        self.announce_resolvable(context, &signatures);
        state.phase = RecoveryPhase::AttemptingRecovery;

        let intended = self.command(context, intended_kind(&signatures));
        match recovery {
            Recovery::RetryDirectly => {
                self.perform(context, state, intended).await?;
            }
            Recovery::ResolveDependenciesThenRetry => {
                if !self.preferences.allow_resolving_packages {
                    return Err(RecoveryError::ResolvingPackagesDisabled);
                }
                let resolve = self.command(context, CommandKind::ResolvePackages);
                self.perform(context, state, resolve).await?;
                self.process_watcher
                    .await_quiescence(BackgroundWork::ResolvingDependencies)
                    .await?;
                self.perform(context, state, intended).await?;
            }
            Recovery::CleanThenRetry => {
                if !self.preferences.allow_cleaning {
                    return Err(RecoveryError::CleaningDisabled);
                }
                let clean = self.command(context, CommandKind::Clean);
                self.perform(context, state, clean).await?;
                self.process_watcher
                    .await_quiescence(BackgroundWork::Cleaning)
                    .await?;
                self.perform(context, state, intended).await?;
            }
        }

        self.registry.record_resolved_failure();
        state.phase = RecoveryPhase::Idle;
        Ok(())
    }

    /// Issue one command: budget gate, decrement, log, then execute.
    async fn perform(
        &self,
        context: &ProjectContext,
        state: &mut ProjectState,
        request: CommandRequest,
    ) -> RecoveryResult<()> {
        if !state.consume_retry() {
            state.phase = RecoveryPhase::Blocked;
            return Err(RecoveryError::RetryBudgetExhausted {
                command: request.kind.display_name(),
            });
        }

        self.console_for(
            context,
            format!("Running \"{}\"", request.kind.display_name()),
            Severity::Normal,
        );

        match self.executor.execute(&request).await? {
            None => Ok(()),
            Some(message) => Err(RecoveryError::ActionExecution(message)),
        }
    }

    fn command(&self, context: &ProjectContext, kind: CommandKind) -> CommandRequest {
        CommandRequest {
            kind,
            project_name: context.display_name(),
            use_shortcuts: self.preferences.allow_keyboard_shortcuts,
            use_rerun_shortcut: self.preferences.allow_rerunning_individual_tests,
            use_window_names: self.preferences.use_window_names,
        }
    }

    /// One console line naming the first resolvable error found; printing a
    /// single one is enough.
    fn announce_resolvable(&self, context: &ProjectContext, signatures: &HashSet<FailureSignature>) {
        for signature in FailureSignature::ALL {
            if !signatures.contains(&signature) {
                continue;
            }
            if let Some(name) = signature.display_name() {
                self.console_for(
                    context,
                    format!("Found resolvable error \"{name}\""),
                    Severity::Normal,
                );
                return;
            }
        }
    }

    fn console_for(&self, context: &ProjectContext, message: impl AsRef<str>, severity: Severity) {
        self.console
            .append(format!("{} - {}", context.label(), message.as_ref()), severity);
    }

    /// Count of failures resolved automatically since process start.
    pub fn resolved_failures(&self) -> u64 {
        self.registry.resolved_failures()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(signatures: &[FailureSignature]) -> HashSet<FailureSignature> {
        signatures.iter().copied().collect()
    }

    #[test]
    fn retry_rule_wins_over_resolve() {
        let signatures = set(&[
            FailureSignature::CanRetryDirectly,
            FailureSignature::DuplicateGuidReference,
        ]);
        assert_eq!(decide(&signatures), Some(Recovery::RetryDirectly));
    }

    #[test]
    fn retry_rule_wins_over_clean() {
        let signatures = set(&[
            FailureSignature::CanRetryDirectly,
            FailureSignature::CodesignNonZeroExit,
        ]);
        assert_eq!(decide(&signatures), Some(Recovery::RetryDirectly));
    }

    #[test]
    fn resolve_rule_wins_over_clean() {
        let signatures = set(&[
            FailureSignature::DuplicateGuidReference,
            FailureSignature::TargetIdNotFound,
        ]);
        assert_eq!(decide(&signatures), Some(Recovery::ResolveDependenciesThenRetry));
    }

    #[test]
    fn any_of_the_stale_state_trio_triggers_clean() {
        for signature in [
            FailureSignature::DuplicateTargetEndedMessage,
            FailureSignature::TargetIdNotFound,
            FailureSignature::CodesignNonZeroExit,
        ] {
            assert_eq!(decide(&set(&[signature])), Some(Recovery::CleanThenRetry));
        }
    }

    #[test]
    fn artifact_signatures_alone_have_no_recovery() {
        let signatures = set(&[
            FailureSignature::HasTestResultArtifact,
            FailureSignature::HasLaunchResultArtifact,
        ]);
        assert_eq!(decide(&signatures), None);
        assert_eq!(decide(&HashSet::new()), None);
    }

    #[test]
    fn intended_kind_prefers_tests_over_launch() {
        assert_eq!(
            intended_kind(&set(&[
                FailureSignature::HasTestResultArtifact,
                FailureSignature::HasLaunchResultArtifact,
            ])),
            CommandKind::Test
        );
        assert_eq!(
            intended_kind(&set(&[FailureSignature::HasLaunchResultArtifact])),
            CommandKind::Launch
        );
        assert_eq!(intended_kind(&set(&[])), CommandKind::Build);
    }
}
