//! Coordinator configuration, state snapshots, and events.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use spool_protocol::{TaskProgressResponse, TaskStatus};

/// Tuning knobs for the task coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Wall-clock delay between progress polls.
    pub poll_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
        }
    }
}

/// Last known progress of the tracked task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub current: i64,
    pub total: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl TaskSnapshot {
    /// Completion as a fraction in `[0, 1]`. Zero while `total` is unknown.
    pub fn fraction(&self) -> f64 {
        if self.total > 0 {
            self.current as f64 / self.total as f64
        } else {
            0.0
        }
    }

    pub(crate) fn from_progress(p: &TaskProgressResponse) -> Self {
        Self {
            status: p.status.clone(),
            current: p.current,
            total: p.total,
            label: p.label.clone(),
            message: p.message.clone(),
        }
    }
}

/// One log line as shown to the user.
///
/// `timestamp` is the local receipt time in milliseconds since the Unix
/// epoch; the wire format carries no timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub timestamp: i64,
}

/// Events emitted while a task is tracked.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// A new processing task was accepted by the server.
    Started { task_id: String, file_path: String },
    /// Fresh progress from a poll tick.
    Progress {
        task_id: String,
        snapshot: TaskSnapshot,
    },
    /// Log entries not seen before, in server order.
    Logs {
        task_id: String,
        entries: Vec<LogEntry>,
    },
    /// A persisted task was rehydrated, before any server contact.
    Restored {
        task_id: String,
        snapshot: TaskSnapshot,
        logs: Vec<LogEntry>,
    },
    /// The server no longer knows the task.
    NoLongerActive { task_id: String },
    /// The task reached a terminal status.
    Terminal {
        task_id: String,
        status: TaskStatus,
        error: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
    }

    #[test]
    fn snapshot_fraction() {
        let mut snapshot = TaskSnapshot {
            status: TaskStatus::Running,
            current: 40,
            total: 100,
            label: String::new(),
            message: String::new(),
        };
        assert!((snapshot.fraction() - 0.4).abs() < f64::EPSILON);

        snapshot.total = 0;
        assert_eq!(snapshot.fraction(), 0.0);
    }

    #[test]
    fn log_entry_serializes_kind_as_type() {
        let entry = LogEntry {
            kind: "warning".into(),
            message: "clipped sample".into(),
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"type\":\"warning\""));
        assert!(json.contains("\"timestamp\":1700000000000"));
    }
}
