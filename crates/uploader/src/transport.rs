//! Transport trait the uploader drives.

use std::future::Future;
use std::pin::Pin;

use spool_protocol::{
    ApiError, CancelSessionResponse, ChunkAck, CompleteSessionResponse, StartSessionRequest,
    StartSessionResponse,
};

/// Abstract connection to the server's chunked upload endpoints.
///
/// `spool-api-client` implements this on top of its HTTP client. Using a
/// trait keeps upload logic decoupled from transport and testable with
/// mocks. Methods return boxed futures so the trait stays object-safe;
/// implementations clone whatever they need before building the future.
pub trait UploadTransport: Send + Sync {
    /// Asks the server to open a session.
    fn start_session(
        &self,
        req: &StartSessionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<StartSessionResponse, ApiError>> + Send + '_>>;

    /// Sends the chunk at `index` for an active session.
    fn upload_chunk(
        &self,
        upload_id: &str,
        index: i64,
        data: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<ChunkAck, ApiError>> + Send + '_>>;

    /// Finalizes a session after its last chunk.
    fn complete_session(
        &self,
        upload_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<CompleteSessionResponse, ApiError>> + Send + '_>>;

    /// Abandons a session server-side.
    fn cancel_session(
        &self,
        upload_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<CancelSessionResponse, ApiError>> + Send + '_>>;

    /// Fetches the server's view of a session, shape unspecified.
    fn session_status(
        &self,
        upload_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ApiError>> + Send + '_>>;
}
