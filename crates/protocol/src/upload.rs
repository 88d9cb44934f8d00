use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Starts a new chunked upload session.
///
/// `chunk_size` is the size the client would like to use; the server's
/// [`StartSessionResponse`] carries the size that actually applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub filename: String,
    pub total_size: i64,
    /// Hex-encoded SHA-256 of the whole file, computed before upload.
    pub file_hash: String,
    pub source_id: String,
    pub side_id: String,
    pub chunk_size: i64,
    pub auto_analyze: bool,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Server's answer to a session start.
///
/// On success the server assigns `upload_id` and fixes `chunk_size` and
/// `total_chunks` for the whole session. On failure only `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub upload_id: String,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub total_chunks: i64,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub chunk_size: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Acknowledges one uploaded chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Result of finalizing a session.
///
/// Servers append extra fields here (stored path, analysis ticket, ...);
/// `extra` passes them through untouched for completion listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteSessionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filename: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of cancelling a session server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelSessionResponse {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}
