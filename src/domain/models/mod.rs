pub mod command;
pub mod config;
pub mod console;
pub mod event;
pub mod signature;

pub use command::{BackgroundWork, CommandKind, CommandRequest};
pub use config::{
    Config, LoggingConfig, Preferences, ProcessWaitConfig, ScriptsConfig, WatcherConfig,
};
pub use console::{ConsoleLine, Severity};
pub use event::{EventKind, LifecycleEvent, ProjectContext, ProjectIdentity};
pub use signature::FailureSignature;
