//! Known failure signatures detectable from build artifacts.

/// An independently detectable condition found while classifying a failed
/// build. A classification pass yields a *set* of these; several may hold at
/// once and the orchestrator's priority policy picks the corrective action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureSignature {
    /// The log says retrying the same operation is enough.
    CanRetryDirectly,
    /// Dependency graph corruption; resolving package versions fixes it.
    DuplicateGuidReference,
    /// Stale incremental build state.
    DuplicateTargetEndedMessage,
    /// Stale incremental build state.
    TargetIdNotFound,
    /// Signing step tripped over leftover build products.
    CodesignNonZeroExit,
    /// A test-result artifact was produced: the user was running tests.
    HasTestResultArtifact,
    /// A launch-result artifact was produced: the user was launching the app.
    HasLaunchResultArtifact,
}

impl FailureSignature {
    /// All variants, in priority-policy documentation order.
    pub const ALL: [Self; 7] = [
        Self::CanRetryDirectly,
        Self::DuplicateGuidReference,
        Self::DuplicateTargetEndedMessage,
        Self::TargetIdNotFound,
        Self::CodesignNonZeroExit,
        Self::HasTestResultArtifact,
        Self::HasLaunchResultArtifact,
    ];

    /// Case-sensitive regex searched for in the decoded build log, or `None`
    /// for signatures that are detected through result-artifact presence
    /// rather than log content.
    pub fn search_pattern(self) -> Option<&'static str> {
        match self {
            Self::CanRetryDirectly => Some("Build again to continue"),
            Self::DuplicateGuidReference => {
                Some("contains multiple references with the same GUID")
            }
            Self::DuplicateTargetEndedMessage => {
                Some("received multiple target ended messages for target ID")
            }
            Self::TargetIdNotFound => Some(r"targetID \(\d+\) not found in _activeTargets"),
            Self::CodesignNonZeroExit => Some("CodeSign failed with a nonzero exit code"),
            Self::HasTestResultArtifact | Self::HasLaunchResultArtifact => None,
        }
    }

    /// Name shown in the "Found resolvable error" console line. Artifact
    /// signatures describe what the user was doing, not an error, and have
    /// no display name.
    pub fn display_name(self) -> Option<&'static str> {
        match self {
            Self::CanRetryDirectly => Some("Build again to continue"),
            Self::DuplicateGuidReference => {
                Some("Contains multiple references with the same GUID")
            }
            Self::DuplicateTargetEndedMessage => {
                Some("Received multiple target ended messages for target ID")
            }
            Self::TargetIdNotFound => Some("Target ID not found in active targets"),
            Self::CodesignNonZeroExit => Some("CodeSign failed with a nonzero exit code"),
            Self::HasTestResultArtifact | Self::HasLaunchResultArtifact => None,
        }
    }
}
