//! Transport seam for the processing endpoints.

use std::future::Future;
use std::pin::Pin;

use spool_protocol::{
    ApiError, ControlResponse, ProcessPathRequest, ProcessPathResponse, TaskProgressResponse,
};

/// HTTP operations the coordinator needs.
///
/// Implementations return boxed futures so the trait stays object safe.
/// `fetch_progress` resolves to `None` when the server answers 404; the
/// coordinator treats that as "task gone", never as an error.
pub trait TaskTransport: Send + Sync {
    fn start_processing(
        &self,
        req: &ProcessPathRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessPathResponse, ApiError>> + Send + '_>>;

    fn fetch_progress(
        &self,
        task_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TaskProgressResponse>, ApiError>> + Send + '_>>;

    fn pause_task(
        &self,
        task_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ControlResponse, ApiError>> + Send + '_>>;

    fn resume_task(
        &self,
        task_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ControlResponse, ApiError>> + Send + '_>>;

    fn cancel_task(
        &self,
        task_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<ControlResponse, ApiError>> + Send + '_>>;
}
