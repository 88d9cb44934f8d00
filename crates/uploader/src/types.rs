//! Data types for the upload flow.

use std::time::Duration;

use spool_protocol::CompleteSessionResponse;

/// Caller-supplied settings for one upload.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Catalogued media source the capture belongs to.
    pub source_id: String,
    /// Which side of the source was captured.
    pub side_id: String,
    /// Ask the server to queue analysis once the file is stored.
    pub auto_analyze: bool,
}

/// Tuning knobs for the uploader.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Chunk size requested at session start. The server's start response
    /// carries the size that actually applies.
    pub chunk_size: usize,
    /// Attempt budget per chunk, first try included. With the default of 3
    /// a chunk is sent at most three times before the upload fails.
    pub max_attempts: u32,
    /// Fixed delay between attempts on the same chunk.
    pub retry_delay: Duration,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: spool_transfer::DEFAULT_CHUNK_SIZE,
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Event emitted during an upload.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// One more chunk was acknowledged.
    Progress {
        upload_id: String,
        file_name: String,
        uploaded_chunks: i64,
        total_chunks: i64,
        percent: f64,
    },
    /// The session was finalized server-side.
    Completed {
        upload_id: String,
        response: CompleteSessionResponse,
    },
    /// The upload stopped before completion. `upload_id` is `None` when
    /// the failure happened before the server assigned one.
    Failed {
        upload_id: Option<String>,
        error: String,
    },
}
