//! Application layer: the recovery orchestrator.

pub mod orchestrator;

pub use orchestrator::RecoveryOrchestrator;
