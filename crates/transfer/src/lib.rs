//! Chunked file reading, content hashing, and upload session tracking.

mod chunked;
mod registry;
mod session;

pub use chunked::{ChunkReader, FileChunk, hash_bytes, hash_file};
pub use registry::SessionRegistry;
pub use session::{SessionSnapshot, UploadSession};

/// Default chunk size requested at session start: 4 MiB.
///
/// The server may assign a different size; the value in its start response
/// governs the whole session.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session not found: {0}")]
    SessionNotFound(String),
}
