//! Port implementations for the effectful collaborators.

pub mod mock;
pub mod process;
pub mod script;

pub use process::{PollingProcessWatcher, SysinfoProcessLister};
pub use script::ScriptActionExecutor;
