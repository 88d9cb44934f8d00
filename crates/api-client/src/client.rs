//! Studio server API client.
//!
//! Async HTTP client using `reqwest`. Mutating requests carry the
//! server's anti-forgery token; responses are decoded into the
//! `spool-protocol` payload types.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use spool_processing::TaskTransport;
use spool_protocol::paths::{self, CSRF_HEADER};
use spool_protocol::{
    ApiError, CancelSessionResponse, ChunkAck, CompleteSessionResponse, ControlResponse,
    ProcessPathRequest, ProcessPathResponse, StartSessionRequest, StartSessionResponse,
    TaskProgressResponse,
};
use spool_uploader::UploadTransport;

/// Client for the studio server's upload and processing endpoints.
pub struct SpoolApi {
    http: reqwest::Client,
    base_url: String,
    csrf_token: String,
}

impl SpoolApi {
    /// Creates a new client.
    ///
    /// `base_url` is the server root without a trailing slash, e.g.
    /// `http://studio.local:8014`. The anti-forgery token goes out on
    /// every mutating request; pass an empty string when the server does
    /// not enforce one.
    pub fn new(base_url: &str, csrf_token: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build().map_err(request_error)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            csrf_token: csrf_token.to_string(),
        })
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    // -----------------------------------------------------------------------
    // Chunked upload endpoints
    // -----------------------------------------------------------------------

    /// Opens a chunked upload session.
    pub async fn start_session(
        &self,
        req: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ApiError> {
        self.post_json(paths::CHUNKED_START, req).await
    }

    /// Uploads one chunk as a multipart form with a single `chunk` field.
    pub async fn upload_chunk(
        &self,
        upload_id: &str,
        index: i64,
        data: Vec<u8>,
    ) -> Result<ChunkAck, ApiError> {
        let part = reqwest::multipart::Part::bytes(data).file_name("chunk");
        let form = reqwest::multipart::Form::new().part("chunk", part);
        let req = self
            .http
            .post(self.url(&paths::chunked_chunk(upload_id, index)))
            .multipart(form);
        let resp = self.with_csrf(req).send().await.map_err(request_error)?;
        parse(resp).await
    }

    /// Finalizes a session after its last chunk.
    pub async fn complete_session(
        &self,
        upload_id: &str,
    ) -> Result<CompleteSessionResponse, ApiError> {
        self.post_empty(&paths::chunked_complete(upload_id)).await
    }

    /// Cancels a session server-side.
    pub async fn cancel_session(
        &self,
        upload_id: &str,
    ) -> Result<CancelSessionResponse, ApiError> {
        self.post_empty(&paths::chunked_cancel(upload_id)).await
    }

    /// Fetches the server's view of a session, shape unspecified.
    pub async fn session_status(&self, upload_id: &str) -> Result<serde_json::Value, ApiError> {
        let resp = self
            .http
            .get(self.url(&paths::chunked_status(upload_id)))
            .send()
            .await
            .map_err(request_error)?;
        parse(resp).await
    }

    // -----------------------------------------------------------------------
    // Processing endpoints
    // -----------------------------------------------------------------------

    /// Submits a server-side path for background processing.
    pub async fn start_processing(
        &self,
        req: &ProcessPathRequest,
    ) -> Result<ProcessPathResponse, ApiError> {
        self.post_json(paths::PROCESS_PATH, req).await
    }

    /// Fetches task progress. `None` means the server answered 404.
    pub async fn fetch_progress(
        &self,
        task_id: &str,
    ) -> Result<Option<TaskProgressResponse>, ApiError> {
        let resp = self
            .http
            .get(self.url(&paths::task_progress(task_id)))
            .send()
            .await
            .map_err(request_error)?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(task_id = %task_id, "task not known to the server");
            return Ok(None);
        }
        Ok(Some(parse(resp).await?))
    }

    /// Asks the server to pause a task.
    pub async fn pause_task(&self, task_id: &str) -> Result<ControlResponse, ApiError> {
        self.post_empty(&paths::task_pause(task_id)).await
    }

    /// Asks the server to resume a task.
    pub async fn resume_task(&self, task_id: &str) -> Result<ControlResponse, ApiError> {
        self.post_empty(&paths::task_resume(task_id)).await
    }

    /// Asks the server to cancel a task.
    pub async fn cancel_task(&self, task_id: &str) -> Result<ControlResponse, ApiError> {
        self.post_empty(&paths::task_cancel(task_id)).await
    }

    // -----------------------------------------------------------------------
    // Request plumbing
    // -----------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_csrf(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.csrf_token.is_empty() {
            req
        } else {
            req.header(CSRF_HEADER, &self.csrf_token)
        }
    }

    /// POST with a JSON body and the anti-forgery token.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.http.post(self.url(path)).json(body);
        let resp = self.with_csrf(req).send().await.map_err(request_error)?;
        parse(resp).await
    }

    /// Body-less POST with the anti-forgery token.
    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.http.post(self.url(path));
        let resp = self.with_csrf(req).send().await.map_err(request_error)?;
        parse(resp).await
    }
}

/// Decodes a JSON response, mapping non-2xx statuses to [`ApiError::Status`].
async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let body = resp.text().await.map_err(request_error)?;
    Ok(serde_json::from_str(&body)?)
}

fn request_error(e: reqwest::Error) -> ApiError {
    ApiError::Request(e.to_string())
}

// ---------------------------------------------------------------------------
// Transport seams
// ---------------------------------------------------------------------------

impl UploadTransport for SpoolApi {
    fn start_session(
        &self,
        req: &StartSessionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<StartSessionResponse, ApiError>> + Send + '_>> {
        let req = req.clone();
        Box::pin(async move { SpoolApi::start_session(self, &req).await })
    }

    fn upload_chunk(
        &self,
        upload_id: &str,
        index: i64,
        data: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<ChunkAck, ApiError>> + Send + '_>> {
        let upload_id = upload_id.to_string();
        Box::pin(async move { SpoolApi::upload_chunk(self, &upload_id, index, data).await })
    }

    fn complete_session(
        &self,
        upload_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<CompleteSessionResponse, ApiError>> + Send + '_>> {
        let upload_id = upload_id.to_string();
        Box::pin(async move { SpoolApi::complete_session(self, &upload_id).await })
    }

    fn cancel_session(
        &self,
        upload_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<CancelSessionResponse, ApiError>> + Send + '_>> {
        let upload_id = upload_id.to_string();
        Box::pin(async move { SpoolApi::cancel_session(self, &upload_id).await })
    }

    fn session_status(
        &self,
        upload_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ApiError>> + Send + '_>> {
        let upload_id = upload_id.to_string();
        Box::pin(async move { SpoolApi::session_status(self, &upload_id).await })
    }
}

impl TaskTransport for SpoolApi {
    fn start_processing(
        &self,
        req: &ProcessPathRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessPathResponse, ApiError>> + Send + '_>> {
        let req = req.clone();
        Box::pin(async move { SpoolApi::start_processing(self, &req).await })
    }

    fn fetch_progress(
        &self,
        task_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TaskProgressResponse>, ApiError>> + Send + '_>>
    {
        let task_id = task_id.to_string();
        Box::pin(async move { SpoolApi::fetch_progress(self, &task_id).await })
    }

    fn pause_task(
        &self,
        task_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ControlResponse, ApiError>> + Send + '_>> {
        let task_id = task_id.to_string();
        Box::pin(async move { SpoolApi::pause_task(self, &task_id).await })
    }

    fn resume_task(
        &self,
        task_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ControlResponse, ApiError>> + Send + '_>> {
        let task_id = task_id.to_string();
        Box::pin(async move { SpoolApi::resume_task(self, &task_id).await })
    }

    fn cancel_task(
        &self,
        task_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ControlResponse, ApiError>> + Send + '_>> {
        let task_id = task_id.to_string();
        Box::pin(async move { SpoolApi::cancel_task(self, &task_id).await })
    }
}
