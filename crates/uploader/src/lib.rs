//! Chunked upload client for the studio server.
//!
//! Implements the upload half of the capture flow: hash the file, open a
//! session, stream server-sized chunks strictly in order with a bounded
//! retry budget per chunk, then finalize. The [`UploadTransport`] trait
//! keeps this crate free of any HTTP stack; `spool-api-client` provides
//! the real implementation and tests use scripted mocks.

pub mod error;
pub mod transport;
pub mod types;
pub mod uploader;

// Re-export primary types for convenience.
pub use error::UploadError;
pub use transport::UploadTransport;
pub use types::{UploadEvent, UploadOptions, UploaderConfig};
pub use uploader::ChunkedUploader;
