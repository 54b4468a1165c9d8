//! Configuration model for buildmend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Corrective commands allowed per project between successful builds.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Root directory searched for per-project log containers. When unset,
    /// the event's tool home directory (or the tool's default derived-data
    /// location) is used.
    #[serde(default)]
    pub log_root: Option<PathBuf>,

    /// User preference flags consulted at decision points.
    #[serde(default)]
    pub preferences: Preferences,

    /// Artifact polling configuration.
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Background-process quiescence polling configuration.
    #[serde(default)]
    pub process_wait: ProcessWaitConfig,

    /// Action executor script configuration.
    #[serde(default)]
    pub scripts: ScriptsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_max_retries() -> u32 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            log_root: None,
            preferences: Preferences::default(),
            watcher: WatcherConfig::default(),
            process_wait: ProcessWaitConfig::default(),
            scripts: ScriptsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Read-only preference flags. Defaults mirror the desktop app's settings
/// screen: everything enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Preferences {
    /// Attempt fixes when the failure happened while running tests.
    #[serde(default = "default_true")]
    pub fix_when_running_tests: bool,

    /// Attempt fixes when the failure happened while launching the app.
    #[serde(default = "default_true")]
    pub fix_when_launching: bool,

    /// Allow the clean-then-retry recovery path.
    #[serde(default = "default_true")]
    pub allow_cleaning: bool,

    /// Allow the resolve-dependencies-then-retry recovery path.
    #[serde(default = "default_true")]
    pub allow_resolving_packages: bool,

    /// Let automation drive the tool with keyboard shortcuts.
    #[serde(default = "default_true")]
    pub allow_keyboard_shortcuts: bool,

    /// Rerun only the last test group instead of the whole suite.
    #[serde(default = "default_true")]
    pub allow_rerunning_individual_tests: bool,

    /// Address tool windows by project name when issuing commands.
    #[serde(default = "default_true")]
    pub use_window_names: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            fix_when_running_tests: true,
            fix_when_launching: true,
            allow_cleaning: true,
            allow_resolving_packages: true,
            allow_keyboard_shortcuts: true,
            allow_rerunning_individual_tests: true,
            use_window_names: true,
        }
    }
}

/// Bounded retry used while waiting for a log artifact to be flushed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WatcherConfig {
    /// Additional passes after the initial empty scan.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Pause between passes, in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

const fn default_retry_attempts() -> u32 {
    10
}

const fn default_retry_interval_ms() -> u64 {
    250
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

/// Polling parameters for waiting on background tool processes to end, plus
/// the OS process-name patterns each background work class maps to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessWaitConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Hard ceiling measured from watch start.
    #[serde(default = "default_wait_timeout_secs")]
    pub timeout_secs: u64,

    /// Process-line regexes indicating dependency resolution is running.
    #[serde(default = "default_resolve_patterns")]
    pub resolve_patterns: Vec<String>,

    /// Process-line regexes indicating a clean is running.
    #[serde(default = "default_clean_patterns")]
    pub clean_patterns: Vec<String>,
}

const fn default_poll_interval_secs() -> u64 {
    1
}

const fn default_wait_timeout_secs() -> u64 {
    10
}

fn default_resolve_patterns() -> Vec<String> {
    vec!["swift-frontend".to_string()]
}

fn default_clean_patterns() -> Vec<String> {
    vec!["swift-frontend".to_string(), "swift-driver".to_string()]
}

impl Default for ProcessWaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_wait_timeout_secs(),
            resolve_patterns: default_resolve_patterns(),
            clean_patterns: default_clean_patterns(),
        }
    }
}

/// Where the action executor finds its named command scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScriptsConfig {
    #[serde(default = "default_scripts_dir")]
    pub dir: PathBuf,
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from(".buildmend/scripts")
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            dir: default_scripts_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
