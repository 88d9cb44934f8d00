//! Chunked upload driver.
//!
//! Coordinates one upload at a time per call: hash, session start, the
//! sequential chunk loop, completion. Progress is reported through an
//! event channel; failures are both emitted as events and returned so the
//! caller always observes the outcome deterministically.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use spool_protocol::{CompleteSessionResponse, StartSessionRequest};
use spool_transfer::{ChunkReader, SessionRegistry, UploadSession, hash_file};

use crate::error::UploadError;
use crate::transport::UploadTransport;
use crate::types::{UploadEvent, UploadOptions, UploaderConfig};

/// Drives chunked uploads against an [`UploadTransport`].
pub struct ChunkedUploader {
    config: UploaderConfig,
    registry: Arc<SessionRegistry>,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
}

impl Default for ChunkedUploader {
    fn default() -> Self {
        Self::new(UploaderConfig::default())
    }
}

impl ChunkedUploader {
    /// Creates a new uploader.
    pub fn new(config: UploaderConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            config,
            registry: Arc::new(SessionRegistry::new()),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns the registry of active sessions.
    pub fn sessions(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Uploads `path` in server-sized chunks.
    ///
    /// Chunks go out strictly in order, one in flight at a time, each with
    /// a bounded retry budget. On success the server's completion payload
    /// is returned and also emitted as [`UploadEvent::Completed`]; every
    /// failure path emits [`UploadEvent::Failed`] once and returns the
    /// error. The session leaves the registry on every terminal outcome.
    pub async fn upload(
        &self,
        transport: &dyn UploadTransport,
        path: &Path,
        opts: UploadOptions,
    ) -> Result<CompleteSessionResponse, UploadError> {
        let mut session_id: Option<String> = None;
        match self.run_upload(transport, path, &opts, &mut session_id).await {
            Ok((upload_id, response)) => {
                info!(upload_id = %upload_id, file = %response.filename, "upload completed");
                self.emit(UploadEvent::Completed {
                    upload_id,
                    response: response.clone(),
                })
                .await;
                Ok(response)
            }
            Err(e) => {
                let err_msg = e.to_string();
                error!(upload_id = ?session_id, error = %err_msg, "upload failed");
                self.emit(UploadEvent::Failed {
                    upload_id: session_id,
                    error: err_msg,
                })
                .await;
                Err(e)
            }
        }
    }

    /// Requests cancellation of an active upload.
    ///
    /// The session's token trips immediately and the chunk loop stops at
    /// the next boundary; already-uploaded chunks are not rolled back
    /// client-side. The server-side cancel that follows is best-effort
    /// and its failure never revokes the local cancel.
    pub async fn cancel(
        &self,
        transport: &dyn UploadTransport,
        upload_id: &str,
    ) -> Result<(), UploadError> {
        self.registry.cancel(upload_id)?;
        info!(upload_id = %upload_id, "upload cancel requested");

        let resp = transport.cancel_session(upload_id).await?;
        if !resp.success {
            warn!(upload_id = %upload_id, "server refused session cancel");
        }
        Ok(())
    }

    /// Fetches the server's view of a session. No local caching; the
    /// payload shape is whatever the server sends.
    pub async fn status(
        &self,
        transport: &dyn UploadTransport,
        upload_id: &str,
    ) -> Result<serde_json::Value, UploadError> {
        Ok(transport.session_status(upload_id).await?)
    }

    async fn run_upload(
        &self,
        transport: &dyn UploadTransport,
        path: &Path,
        opts: &UploadOptions,
        session_id: &mut Option<String>,
    ) -> Result<(String, CompleteSessionResponse), UploadError> {
        if opts.source_id.trim().is_empty() {
            return Err(UploadError::InvalidArgument(
                "source_id must not be empty".into(),
            ));
        }
        if opts.side_id.trim().is_empty() {
            return Err(UploadError::InvalidArgument(
                "side_id must not be empty".into(),
            ));
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .ok_or_else(|| {
                UploadError::InvalidArgument(format!("path has no file name: {}", path.display()))
            })?;

        // Hash before any network traffic; an unreadable file fails here.
        let (file_hash, total_size) = tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            move || -> Result<(String, i64), spool_transfer::TransferError> {
                let hash = hash_file(&path)?;
                let size = std::fs::metadata(&path)?.len() as i64;
                Ok((hash, size))
            }
        })
        .await
        .map_err(|e| UploadError::Upload(format!("task join error: {e}")))??;

        debug!(file = %file_name, total_bytes = total_size, "file hashed");

        let req = StartSessionRequest {
            filename: file_name.clone(),
            total_size,
            file_hash,
            source_id: opts.source_id.clone(),
            side_id: opts.side_id.clone(),
            chunk_size: self.config.chunk_size as i64,
            auto_analyze: opts.auto_analyze,
        };
        let start = transport.start_session(&req).await?;

        if !start.success || start.upload_id.is_empty() {
            return Err(UploadError::SessionStartFailed(error_or(
                &start.error,
                "server rejected session start",
            )));
        }
        // The server's geometry governs the loop; a non-empty file with a
        // zero chunk size has nothing the loop could do.
        if total_size > 0 && (start.chunk_size <= 0 || start.total_chunks <= 0) {
            return Err(UploadError::SessionStartFailed(format!(
                "unusable session geometry: chunk_size {}, total_chunks {}",
                start.chunk_size, start.total_chunks
            )));
        }

        let upload_id = start.upload_id.clone();
        *session_id = Some(upload_id.clone());

        let session = Arc::new(UploadSession::new(
            upload_id.clone(),
            file_name.clone(),
            total_size,
            start.chunk_size,
            start.total_chunks,
        ));
        self.registry.insert(Arc::clone(&session));

        info!(
            upload_id = %upload_id,
            file = %file_name,
            total_chunks = start.total_chunks,
            chunk_size = start.chunk_size,
            "upload session started"
        );

        let outcome = self.drive_session(transport, path, &session).await;
        self.registry.remove(&upload_id);
        let response = outcome?;

        Ok((upload_id, response))
    }

    /// Runs the chunk loop and the completion call for a registered session.
    async fn drive_session(
        &self,
        transport: &dyn UploadTransport,
        path: &Path,
        session: &Arc<UploadSession>,
    ) -> Result<CompleteSessionResponse, UploadError> {
        self.upload_chunks(transport, path, session).await?;

        let upload_id = session.id();
        let complete = transport.complete_session(&upload_id).await?;
        if !complete.success {
            return Err(UploadError::SessionCompleteFailed(error_or(
                &complete.error,
                "server rejected completion",
            )));
        }
        Ok(complete)
    }

    async fn upload_chunks(
        &self,
        transport: &dyn UploadTransport,
        path: &Path,
        session: &Arc<UploadSession>,
    ) -> Result<(), UploadError> {
        let total_chunks = session.total_chunks();
        // Zero-byte file: no chunks, straight to completion.
        if total_chunks == 0 {
            return Ok(());
        }

        let upload_id = session.id();
        let file_name = session.snapshot().file_name;
        let chunk_size = session.chunk_size() as usize;

        let mut reader = tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            move || ChunkReader::new(&path, chunk_size)
        })
        .await
        .map_err(|e| UploadError::Upload(format!("task join error: {e}")))??;

        for index in 0..total_chunks {
            if session.is_cancelled() {
                debug!(upload_id = %upload_id, chunk = index, "cancelled at chunk boundary");
                return Err(UploadError::Cancelled);
            }

            let (returned, chunk) = tokio::task::spawn_blocking(move || {
                let chunk = reader.next_chunk();
                (reader, chunk)
            })
            .await
            .map_err(|e| UploadError::Upload(format!("task join error: {e}")))?;
            reader = returned;

            let Some(chunk) = chunk? else {
                return Err(UploadError::Upload(format!(
                    "file ended early: expected {total_chunks} chunks, got {index}"
                )));
            };

            self.send_chunk_with_retry(transport, &upload_id, chunk.index, chunk.data)
                .await?;

            let uploaded = session.record_chunk();
            self.emit(UploadEvent::Progress {
                upload_id: upload_id.clone(),
                file_name: file_name.clone(),
                uploaded_chunks: uploaded,
                total_chunks,
                percent: uploaded as f64 / total_chunks as f64 * 100.0,
            })
            .await;
        }

        Ok(())
    }

    /// Sends one chunk within the attempt budget.
    ///
    /// Every try counts against `max_attempts`, the first included; the
    /// retry delay runs only between attempts. Transport failures and
    /// rejected acks are treated the same.
    async fn send_chunk_with_retry(
        &self,
        transport: &dyn UploadTransport,
        upload_id: &str,
        index: i64,
        data: Vec<u8>,
    ) -> Result<(), UploadError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.config.retry_delay).await;
            }

            match transport.upload_chunk(upload_id, index, data.clone()).await {
                Ok(ack) if ack.success => {
                    if attempt > 1 {
                        debug!(upload_id = %upload_id, chunk = index, attempt, "chunk uploaded after retry");
                    }
                    return Ok(());
                }
                Ok(ack) => {
                    last_error = error_or(&ack.error, "server rejected chunk");
                    warn!(upload_id = %upload_id, chunk = index, attempt, error = %last_error, "chunk rejected");
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(upload_id = %upload_id, chunk = index, attempt, error = %last_error, "chunk attempt failed");
                }
            }
        }

        Err(UploadError::ChunkUploadFailed {
            chunk_index: index,
            attempts: max_attempts,
            last_error,
        })
    }

    async fn emit(&self, event: UploadEvent) {
        let _ = self.events_tx.send(event).await;
    }
}

fn error_or(error: &str, fallback: &str) -> String {
    if error.is_empty() {
        fallback.to_string()
    } else {
        error.to_string()
    }
}
