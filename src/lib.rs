//! Buildmend - automatic build failure recovery
//!
//! Buildmend watches a build tool's lifecycle events, inspects the tool's
//! log artifacts to recognize known transient failure modes, and retries the
//! failed operation with the minimum corrective action (retry, resolve
//! dependencies, or clean) within a bounded per-project retry budget.
//!
//! # Architecture
//!
//! The crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, ports and errors
//! - **Service Layer** (`services`): log location, artifact polling, failure
//!   classification, per-project state, console ring buffer
//! - **Application Layer** (`application`): the recovery orchestrator
//! - **Adapters** (`adapters`): script-backed action execution, OS process
//!   polling, mocks for tests
//! - **Infrastructure** (`infrastructure`): configuration loading
//!
//! # Example
//!
//! ```ignore
//! use buildmend::application::RecoveryOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire an event channel into the orchestrator and run it.
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::RecoveryOrchestrator;
pub use domain::errors::{RecoveryError, RecoveryResult};
pub use domain::models::{
    BackgroundWork, CommandKind, CommandRequest, Config, ConsoleLine, EventKind, FailureSignature,
    LifecycleEvent, Preferences, ProjectContext, ProjectIdentity, Severity,
};
pub use domain::ports::{ActionExecutor, ProcessLister, ProcessWatcher};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ConsoleSink, ProjectRegistry};
