//! Transport-level error type shared by the HTTP client and the traits
//! that abstract over it.

/// Errors surfaced by an HTTP transport.
///
/// Lives here rather than in `spool-api-client` so that the transport
/// traits in `spool-uploader` and `spool-processing` can name it without
/// depending on a concrete HTTP stack.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, send, or read failure).
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success HTTP status.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
