//! Commands issued to the external action executor.

use serde::{Deserialize, Serialize};

/// The named scripts the action executor knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    Build,
    Test,
    Launch,
    Clean,
    ResolvePackages,
}

impl CommandKind {
    /// Script file stem under the configured scripts directory.
    pub fn script_name(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Test => "test",
            Self::Launch => "launch",
            Self::Clean => "clean",
            Self::ResolvePackages => "resolve-packages",
        }
    }

    /// Name quoted in "Running \"...\"" console lines.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Test => "test again",
            Self::Launch => "launch",
            Self::Clean => "clean",
            Self::ResolvePackages => "resolve package versions",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A fully parameterized command handed to the action executor.
///
/// Besides the command kind this carries the optional project name (used to
/// bring the right tool window forward when `use_window_names` is set) and
/// the pass-through preference flags the automation scripts consult.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub kind: CommandKind,
    pub project_name: Option<String>,
    pub use_shortcuts: bool,
    pub use_rerun_shortcut: bool,
    pub use_window_names: bool,
}

/// Classes of background work the build tool spawns while a prerequisite
/// command runs. Each class maps to OS process-name patterns in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackgroundWork {
    ResolvingDependencies,
    Cleaning,
}

impl std::fmt::Display for BackgroundWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ResolvingDependencies => write!(f, "Resolving Packages"),
            Self::Cleaning => write!(f, "Cleaning"),
        }
    }
}
