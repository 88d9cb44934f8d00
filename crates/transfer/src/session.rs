use std::sync::RwLock;

use tokio_util::sync::CancellationToken;

/// Point-in-time view of a session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub upload_id: String,
    pub file_name: String,
    pub total_size: i64,
    pub chunk_size: i64,
    pub total_chunks: i64,
    pub uploaded_chunks: i64,
}

impl SessionSnapshot {
    /// Returns the upload progress as a percentage (0-100).
    pub fn percent(&self) -> f64 {
        if self.total_chunks == 0 {
            return 0.0;
        }
        self.uploaded_chunks as f64 / self.total_chunks as f64 * 100.0
    }
}

/// Tracks one active chunked upload (thread-safe).
///
/// The geometry (`chunk_size`, `total_chunks`) comes from the server's
/// start response and never changes afterwards. Cancellation is
/// cooperative: `cancel()` trips the token once, and the upload loop
/// observes it at the next chunk boundary.
pub struct UploadSession {
    inner: RwLock<SessionInner>,
    cancel: CancellationToken,
}

struct SessionInner {
    id: String,
    file_name: String,
    total_size: i64,
    chunk_size: i64,
    total_chunks: i64,
    uploaded_chunks: i64,
}

impl UploadSession {
    /// Creates a session from the server's start response.
    pub fn new(
        id: String,
        file_name: String,
        total_size: i64,
        chunk_size: i64,
        total_chunks: i64,
    ) -> Self {
        Self {
            inner: RwLock::new(SessionInner {
                id,
                file_name,
                total_size,
                chunk_size,
                total_chunks,
                uploaded_chunks: 0,
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// Records one acknowledged chunk and returns the new uploaded count.
    pub fn record_chunk(&self) -> i64 {
        let mut s = self.inner.write().unwrap();
        s.uploaded_chunks += 1;
        s.uploaded_chunks
    }

    /// Returns the session ID.
    pub fn id(&self) -> String {
        self.inner.read().unwrap().id.clone()
    }

    /// Returns the server-assigned chunk size in bytes.
    pub fn chunk_size(&self) -> i64 {
        self.inner.read().unwrap().chunk_size
    }

    /// Returns the server-assigned chunk count.
    pub fn total_chunks(&self) -> i64 {
        self.inner.read().unwrap().total_chunks
    }

    /// Returns how many chunks have been acknowledged so far.
    pub fn uploaded_chunks(&self) -> i64 {
        self.inner.read().unwrap().uploaded_chunks
    }

    /// Returns a point-in-time snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        let s = self.inner.read().unwrap();
        SessionSnapshot {
            upload_id: s.id.clone(),
            file_name: s.file_name.clone(),
            total_size: s.total_size,
            chunk_size: s.chunk_size,
            total_chunks: s.total_chunks,
            uploaded_chunks: s.uploaded_chunks,
        }
    }

    /// Requests cancellation. Idempotent; the token never resets.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns a clone of the cancellation token.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
