use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Asks the server to process a file that already sits on its filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPathRequest {
    pub file_path: String,
    pub source_id: String,
    pub side_id: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Server's answer to a process-path request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPathResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub task_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Lifecycle state the server reports for a background task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "paused")]
    Paused,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl TaskStatus {
    /// True once the task can no longer make progress.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// One log line as the server reports it.
///
/// The server sends only kind and text; receipt timestamps are stamped
/// client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireLogEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// Progress report for a background task.
///
/// `logs` always carries the full history since task start; consumers track
/// how many entries they have already seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskProgressResponse {
    pub status: TaskStatus,
    #[serde(default)]
    pub current: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<WireLogEntry>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Reply from the pause, resume, and cancel endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl ControlResponse {
    /// True when the server accepted the control action.
    pub fn accepted(&self) -> bool {
        self.error.is_empty()
    }
}
