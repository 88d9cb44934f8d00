//! Endpoint paths for the studio server, relative to its base URL.
//!
//! Chunk and task endpoints embed server-assigned identifiers, so those are
//! builder functions rather than constants.

/// Starts a chunked upload session.
pub const CHUNKED_START: &str = "/upload/chunked/start";

/// Starts a background processing task over a server-side path.
pub const PROCESS_PATH: &str = "/upload/process-path";

/// Header carrying the anti-forgery token on mutating requests.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Uploads one chunk of an active session.
pub fn chunked_chunk(upload_id: &str, index: i64) -> String {
    format!("/upload/chunked/{upload_id}/chunk/{index}")
}

/// Finalizes a session after its last chunk.
pub fn chunked_complete(upload_id: &str) -> String {
    format!("/upload/chunked/{upload_id}/complete")
}

/// Abandons a session server-side.
pub fn chunked_cancel(upload_id: &str) -> String {
    format!("/upload/chunked/{upload_id}/cancel")
}

/// Queries the server's view of a session.
pub fn chunked_status(upload_id: &str) -> String {
    format!("/upload/chunked/{upload_id}/status")
}

/// Polls progress of a background task.
pub fn task_progress(task_id: &str) -> String {
    format!("/upload/progress/{task_id}")
}

/// Pauses a background task.
pub fn task_pause(task_id: &str) -> String {
    format!("/upload/pause/{task_id}")
}

/// Resumes a paused background task.
pub fn task_resume(task_id: &str) -> String {
    format!("/upload/resume/{task_id}")
}

/// Cancels a background task.
pub fn task_cancel(task_id: &str) -> String {
    format!("/upload/cancel/{task_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_path_embeds_session_and_index() {
        assert_eq!(
            chunked_chunk("u-42", 7),
            "/upload/chunked/u-42/chunk/7"
        );
    }

    #[test]
    fn task_paths_embed_task_id() {
        assert_eq!(task_progress("t-1"), "/upload/progress/t-1");
        assert_eq!(task_pause("t-1"), "/upload/pause/t-1");
        assert_eq!(task_resume("t-1"), "/upload/resume/t-1");
        assert_eq!(task_cancel("t-1"), "/upload/cancel/t-1");
    }
}
