//! Bounded console ring buffer for human-readable status lines.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::models::{ConsoleLine, Severity};

/// Lines retained before the oldest is evicted.
const CONSOLE_CAPACITY: usize = 50;

/// Append-only ring of console lines, shared across event handlers.
///
/// Appends are atomic with respect to eviction: readers never observe more
/// than the capacity or a buffer mid-eviction. Every line is mirrored to
/// tracing at a level matching its severity.
#[derive(Debug)]
pub struct ConsoleSink {
    lines: Mutex<VecDeque<ConsoleLine>>,
    capacity: usize,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::with_capacity(CONSOLE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a line, evicting the oldest once over capacity.
    pub fn append(&self, message: impl Into<String>, severity: Severity) {
        let line = ConsoleLine::new(message, severity);
        match severity {
            Severity::Error => tracing::error!(console = %line.message),
            Severity::Normal => tracing::info!(console = %line.message),
            Severity::Dim => tracing::debug!(console = %line.message),
        }

        let mut lines = self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        lines.push_back(line);
        while lines.len() > self.capacity {
            lines.pop_front();
        }
    }

    /// Snapshot of the current lines, oldest first.
    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_keeps_chronological_order() {
        let sink = ConsoleSink::new();
        sink.append("first", Severity::Dim);
        sink.append("second", Severity::Normal);
        sink.append("third", Severity::Error);

        let lines = sink.lines();
        let messages: Vec<&str> = lines.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn sixty_appends_leave_last_fifty_in_order() {
        let sink = ConsoleSink::new();
        for i in 0..60 {
            sink.append(format!("line {i}"), Severity::Normal);
        }

        let lines = sink.lines();
        assert_eq!(lines.len(), 50);
        assert_eq!(lines.first().unwrap().message, "line 10");
        assert_eq!(lines.last().unwrap().message, "line 59");
        for (offset, line) in lines.iter().enumerate() {
            assert_eq!(line.message, format!("line {}", offset + 10));
        }
    }

    #[test]
    fn never_observes_more_than_capacity() {
        let sink = ConsoleSink::with_capacity(5);
        for i in 0..20 {
            sink.append(format!("line {i}"), Severity::Dim);
            assert!(sink.len() <= 5);
        }
    }
}
