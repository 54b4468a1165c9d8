//! Console line model for the observability ring buffer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a console line should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Error,
    Dim,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Error => write!(f, "error"),
            Self::Dim => write!(f, "dim"),
        }
    }
}

/// One human-readable status line produced as a side effect of orchestration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleLine {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity: Severity,
}

impl ConsoleLine {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            severity,
        }
    }
}
