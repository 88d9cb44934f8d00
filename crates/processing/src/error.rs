use crate::store::StoreError;

/// Errors from task coordination.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task start failed: {0}")]
    StartFailed(String),

    #[error("a task is already active: {0}")]
    AlreadyActive(String),

    #[error("{action} rejected: {message}")]
    ControlFailed { action: String, message: String },

    #[error("no active task")]
    NoActiveTask,

    #[error("API error: {0}")]
    Transport(#[from] spool_protocol::ApiError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
