//! Wire contract types for the Spool studio server HTTP API.
//!
//! All request and response bodies are JSON with snake_case field names,
//! matching the server's serializer. This crate carries no transport code;
//! `spool-api-client` speaks the actual HTTP.

pub mod error;
pub mod paths;
pub mod task;
pub mod upload;

pub use error::ApiError;
pub use task::{
    ControlResponse, ProcessPathRequest, ProcessPathResponse, TaskProgressResponse, TaskStatus,
    WireLogEntry,
};
pub use upload::{
    CancelSessionResponse, ChunkAck, CompleteSessionResponse, StartSessionRequest,
    StartSessionResponse,
};
