//! Lifecycle events delivered by the build tool's behaviour hooks.

use serde::{Deserialize, Serialize};

/// The lifecycle moments the build tool reports.
///
/// Wire names match the alert strings the tool puts in its hook environment
/// ("Build Started", "Test Failed", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "Build Started")]
    BuildStarted,
    #[serde(rename = "Build Succeeded")]
    BuildSucceeded,
    #[serde(rename = "Build Failed")]
    BuildFailed,
    #[serde(rename = "Test Started")]
    TestStarted,
    #[serde(rename = "Test Succeeded")]
    TestSucceeded,
    #[serde(rename = "Test Failed")]
    TestFailed,
}

impl EventKind {
    /// Parse the raw alert string the build tool exports (e.g. "Build Failed").
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Build Started" => Some(Self::BuildStarted),
            "Build Succeeded" => Some(Self::BuildSucceeded),
            "Build Failed" => Some(Self::BuildFailed),
            "Test Started" => Some(Self::TestStarted),
            "Test Succeeded" => Some(Self::TestSucceeded),
            "Test Failed" => Some(Self::TestFailed),
            _ => None,
        }
    }

    /// Human-readable console label.
    pub fn console_label(self) -> &'static str {
        match self {
            Self::BuildStarted => "Build started",
            Self::BuildSucceeded => "Build succeeded",
            Self::BuildFailed => "Build failed",
            Self::TestStarted => "Test started",
            Self::TestSucceeded => "Test succeeded",
            Self::TestFailed => "Test failed",
        }
    }
}

/// One lifecycle occurrence, consumed exactly once by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    #[serde(rename = "alertMessage")]
    pub kind: EventKind,
    #[serde(rename = "environment")]
    pub context: ProjectContext,
}

/// Key under which all per-project state is tracked.
///
/// Derived from the context: two contexts with the same identity refer to the
/// same logical project even if their other fields differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectIdentity(String);

impl ProjectIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectIdentity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The project-describing fields the build tool exposes to its hooks.
///
/// All fields are optional; which ones are populated depends on what was open
/// in the tool when the event fired.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectContext {
    #[serde(rename = "projectName")]
    pub project_name: Option<String>,
    #[serde(rename = "projectPath")]
    pub project_path: Option<String>,
    #[serde(rename = "workspacePath")]
    pub workspace_path: Option<String>,
    #[serde(rename = "toolHomeDirectory")]
    pub tool_home: Option<String>,
}

/// Project file suffixes stripped when deriving a display name.
const PROJECT_SUFFIXES: [&str; 2] = [".xcodeproj", ".xcworkspace"];

impl ProjectContext {
    /// Derive the identity used as the per-project state key: the first
    /// non-empty of project path, workspace path and project name.
    pub fn identity(&self) -> ProjectIdentity {
        let chosen = [&self.project_path, &self.workspace_path, &self.project_name]
            .into_iter()
            .find_map(|field| field.as_deref().filter(|s| !s.is_empty()));
        ProjectIdentity(chosen.unwrap_or("Unknown").to_string())
    }

    /// The project name, falling back to a name derived from the workspace
    /// path. Package builds carry no project name in the environment, but
    /// their workspace path ends in `<Name>/.swiftpm/...`.
    pub fn name(&self) -> Option<String> {
        if let Some(name) = self.project_name.as_deref().filter(|s| !s.is_empty()) {
            return Some(name.to_string());
        }

        self.workspace_path
            .as_deref()?
            .split("/.swiftpm")
            .next()?
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    /// Name with the project-file extension stripped, as used to address the
    /// tool's windows and to parameterize commands.
    pub fn display_name(&self) -> Option<String> {
        let mut name = self.name()?;
        for suffix in PROJECT_SUFFIXES {
            if let Some(stripped) = name.strip_suffix(suffix) {
                name = stripped.to_string();
            }
        }
        Some(name)
    }

    /// Console-line prefix for this project.
    pub fn label(&self) -> String {
        self.name().unwrap_or_else(|| "Unknown project".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(
        name: Option<&str>,
        project: Option<&str>,
        workspace: Option<&str>,
    ) -> ProjectContext {
        ProjectContext {
            project_name: name.map(String::from),
            project_path: project.map(String::from),
            workspace_path: workspace.map(String::from),
            tool_home: None,
        }
    }

    #[test]
    fn identity_prefers_project_path() {
        let ctx = context(Some("App.xcodeproj"), Some("/code/App"), Some("/code/App.xcworkspace"));
        assert_eq!(ctx.identity().as_str(), "/code/App");
    }

    #[test]
    fn identity_skips_empty_fields() {
        let ctx = context(Some("App.xcodeproj"), Some(""), None);
        assert_eq!(ctx.identity().as_str(), "App.xcodeproj");
    }

    #[test]
    fn identity_falls_back_to_unknown() {
        assert_eq!(context(None, None, None).identity().as_str(), "Unknown");
    }

    #[test]
    fn name_derived_from_swiftpm_workspace() {
        let ctx = context(None, None, Some("/code/MyPackage/.swiftpm/xcode/package.xcworkspace"));
        assert_eq!(ctx.name().as_deref(), Some("MyPackage"));
    }

    #[test]
    fn display_name_strips_project_extensions() {
        assert_eq!(
            context(Some("App.xcodeproj"), None, None).display_name().as_deref(),
            Some("App")
        );
        assert_eq!(
            context(Some("App.xcworkspace"), None, None).display_name().as_deref(),
            Some("App")
        );
    }

    #[test]
    fn event_round_trips_wire_names() {
        let json = r#"{"alertMessage":"Build Failed","environment":{"projectName":"App.xcodeproj","projectPath":null,"workspacePath":null,"toolHomeDirectory":null}}"#;
        let event: LifecycleEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, EventKind::BuildFailed);
        assert_eq!(event.context.label(), "App.xcodeproj");
    }

    #[test]
    fn from_label_matches_wire_names() {
        assert_eq!(EventKind::from_label("Test Succeeded"), Some(EventKind::TestSucceeded));
        assert_eq!(EventKind::from_label("nonsense"), None);
    }
}
