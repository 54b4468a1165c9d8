//! Domain layer: models, ports and errors for build failure recovery.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{RecoveryError, RecoveryResult};
