//! Upload error types.

/// Errors produced during a chunked upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("session start failed: {0}")]
    SessionStartFailed(String),

    #[error("chunk {chunk_index} failed after {attempts} attempt(s): {last_error}")]
    ChunkUploadFailed {
        chunk_index: i64,
        attempts: u32,
        last_error: String,
    },

    #[error("session complete failed: {0}")]
    SessionCompleteFailed(String),

    #[error("cancelled")]
    Cancelled,

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("transport error: {0}")]
    Transport(#[from] spool_protocol::ApiError),

    #[error("transfer error: {0}")]
    Transfer(#[from] spool_transfer::TransferError),
}
