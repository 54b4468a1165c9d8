//! Script-backed action executor.
//!
//! Each command kind maps to a named script under the configured directory;
//! the script owns the actual tool automation. The core only cares about
//! success or the failure message.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::RecoveryResult;
use crate::domain::models::{CommandKind, CommandRequest, ScriptsConfig};
use crate::domain::ports::ActionExecutor;

/// Runs `<dir>/<command>.sh` with the request's parameters as arguments.
pub struct ScriptActionExecutor {
    dir: PathBuf,
}

impl ScriptActionExecutor {
    pub fn new(config: &ScriptsConfig) -> Self {
        Self {
            dir: config.dir.clone(),
        }
    }

    fn script_path(&self, kind: CommandKind) -> PathBuf {
        self.dir.join(format!("{}.sh", kind.script_name()))
    }

    fn args(request: &CommandRequest) -> Vec<String> {
        let mut args = Vec::new();
        if request.use_window_names {
            if let Some(name) = &request.project_name {
                args.push("--project".to_string());
                args.push(name.clone());
            }
        }
        if request.use_shortcuts {
            args.push("--use-shortcuts".to_string());
        }
        if request.kind == CommandKind::Test && request.use_rerun_shortcut {
            args.push("--rerun-last-test".to_string());
        }
        args
    }
}

#[async_trait]
impl ActionExecutor for ScriptActionExecutor {
    async fn execute(&self, request: &CommandRequest) -> RecoveryResult<Option<String>> {
        let script = self.script_path(request.kind);
        let args = Self::args(request);
        debug!(script = %script.display(), ?args, "executing command script");

        let output = Command::new(&script).args(&args).output().await?;
        if output.status.success() {
            return Ok(None);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            format!("{} exited with {}", script.display(), output.status)
        } else {
            stderr.trim().to_string()
        };
        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn request(kind: CommandKind) -> CommandRequest {
        CommandRequest {
            kind,
            project_name: Some("App".to_string()),
            use_shortcuts: true,
            use_rerun_shortcut: true,
            use_window_names: true,
        }
    }

    fn write_script(dir: &std::path::Path, name: &str, body: &str) {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn executor(dir: &TempDir) -> ScriptActionExecutor {
        ScriptActionExecutor::new(&ScriptsConfig {
            dir: dir.path().to_path_buf(),
        })
    }

    #[test]
    fn args_follow_preference_flags() {
        let args = ScriptActionExecutor::args(&request(CommandKind::Test));
        assert_eq!(
            args,
            vec!["--project", "App", "--use-shortcuts", "--rerun-last-test"]
        );

        let mut anonymous = request(CommandKind::Build);
        anonymous.use_window_names = false;
        anonymous.use_shortcuts = false;
        assert!(ScriptActionExecutor::args(&anonymous).is_empty());
    }

    #[test]
    fn rerun_flag_only_applies_to_tests() {
        let args = ScriptActionExecutor::args(&request(CommandKind::Build));
        assert!(!args.contains(&"--rerun-last-test".to_string()));
    }

    #[tokio::test]
    async fn successful_script_reports_no_error() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "build.sh", "exit 0");

        let result = executor(&dir).execute(&request(CommandKind::Build)).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn failing_script_surfaces_stderr_verbatim() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "clean.sh", "echo 'tool said no' >&2; exit 1");

        let result = executor(&dir).execute(&request(CommandKind::Clean)).await.unwrap();
        assert_eq!(result, Some("tool said no".to_string()));
    }

    #[tokio::test]
    async fn silent_failure_reports_exit_status() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "launch.sh", "exit 3");

        let result = executor(&dir).execute(&request(CommandKind::Launch)).await.unwrap();
        let message = result.unwrap();
        assert!(message.contains("launch.sh"));
        assert!(message.contains('3'));
    }

    #[tokio::test]
    async fn missing_script_is_an_infrastructure_error() {
        let dir = TempDir::new().unwrap();
        let err = executor(&dir).execute(&request(CommandKind::Build)).await.unwrap_err();
        assert!(matches!(err, crate::domain::errors::RecoveryError::Io(_)));
    }
}
