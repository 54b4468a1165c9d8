//! Core services: log location, artifact polling, failure classification,
//! per-project state, and the console ring buffer.

pub mod artifact_watcher;
pub mod classifier;
pub mod console;
pub mod log_locator;
pub mod registry;

pub use artifact_watcher::ArtifactWatcher;
pub use classifier::FailureClassifier;
pub use console::ConsoleSink;
pub use log_locator::{LogDirectories, LogLocator};
pub use registry::{ProjectRegistry, ProjectState, RecoveryPhase};
