//! Background task coordination.
//!
//! One task at a time: submit it, poll progress on a fixed interval,
//! persist a snapshot after every tick, and rehydrate from the store
//! after a restart. Pause and resume never flip local state; the next
//! poll tick reflects whatever the server decided.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use spool_protocol::{ProcessPathRequest, TaskProgressResponse, TaskStatus};

use crate::error::TaskError;
use crate::store::{PersistedTask, TaskStore};
use crate::transport::TaskTransport;
use crate::types::{CoordinatorConfig, LogEntry, TaskEvent, TaskSnapshot};

/// In-memory state of the tracked task.
struct ActiveTask {
    task_id: String,
    file_path: String,
    source_id: String,
    side_id: String,
    logs: Vec<LogEntry>,
    last: TaskSnapshot,
    cancel: CancellationToken,
}

impl ActiveTask {
    fn to_record(&self) -> PersistedTask {
        PersistedTask {
            task_id: self.task_id.clone(),
            file_path: self.file_path.clone(),
            source_id: self.source_id.clone(),
            side_id: self.side_id.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            last_progress: self.last.clone(),
            last_logs: self.logs.clone(),
        }
    }
}

/// Tracks one long-running processing task against the studio server.
pub struct TaskCoordinator {
    config: CoordinatorConfig,
    transport: Arc<dyn TaskTransport>,
    store: Arc<dyn TaskStore>,
    state: Arc<RwLock<Option<ActiveTask>>>,
    events_tx: mpsc::Sender<TaskEvent>,
    events_rx: Option<mpsc::Receiver<TaskEvent>>,
}

impl TaskCoordinator {
    /// Creates a new coordinator.
    pub fn new(
        transport: Arc<dyn TaskTransport>,
        store: Arc<dyn TaskStore>,
        config: CoordinatorConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            config,
            transport,
            store,
            state: Arc::new(RwLock::new(None)),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TaskEvent>> {
        self.events_rx.take()
    }

    /// True while a task is tracked.
    pub fn is_active(&self) -> bool {
        self.state.read().unwrap().is_some()
    }

    /// Returns the id of the tracked task, if any.
    pub fn active_task_id(&self) -> Option<String> {
        self.state.read().unwrap().as_ref().map(|t| t.task_id.clone())
    }

    /// Last known progress of the tracked task.
    pub fn snapshot(&self) -> Option<TaskSnapshot> {
        self.state.read().unwrap().as_ref().map(|t| t.last.clone())
    }

    /// Submits a processing job and starts the poll loop.
    ///
    /// Only one task is tracked at a time. An initial snapshot is
    /// persisted right away so a crash between submission and the first
    /// poll still restores.
    pub async fn start(
        &self,
        file_path: &str,
        source_id: &str,
        side_id: &str,
    ) -> Result<String, TaskError> {
        if let Some(active) = self.active_task_id() {
            return Err(TaskError::AlreadyActive(active));
        }

        let req = ProcessPathRequest {
            file_path: file_path.to_string(),
            source_id: source_id.to_string(),
            side_id: side_id.to_string(),
        };
        let resp = self.transport.start_processing(&req).await?;
        if !resp.success || resp.task_id.is_empty() {
            return Err(TaskError::StartFailed(error_or(
                &resp.error,
                "server rejected processing request",
            )));
        }
        let task_id = resp.task_id;

        let token = CancellationToken::new();
        let task = ActiveTask {
            task_id: task_id.clone(),
            file_path: file_path.to_string(),
            source_id: source_id.to_string(),
            side_id: side_id.to_string(),
            logs: Vec::new(),
            last: TaskSnapshot {
                status: TaskStatus::Running,
                current: 0,
                total: 0,
                label: String::new(),
                message: String::new(),
            },
            cancel: token.clone(),
        };
        if let Err(e) = self.store.save(&task.to_record()) {
            warn!("failed to persist initial task snapshot: {e}");
        }
        *self.state.write().unwrap() = Some(task);

        info!(task_id = %task_id, file_path = %file_path, "processing task started");
        self.emit(TaskEvent::Started {
            task_id: task_id.clone(),
            file_path: file_path.to_string(),
        })
        .await;
        self.spawn_poll_loop(task_id.clone(), token);

        Ok(task_id)
    }

    /// Asks the server to pause the tracked task.
    ///
    /// Best effort: local status is not flipped, the next poll tick
    /// carries the server's answer. Polling continues even when the
    /// server refuses.
    pub async fn pause(&self) -> Result<(), TaskError> {
        let task_id = self.active_task_id().ok_or(TaskError::NoActiveTask)?;
        let resp = self.transport.pause_task(&task_id).await?;
        if !resp.accepted() {
            return Err(TaskError::ControlFailed {
                action: "pause".into(),
                message: error_or(&resp.error, "server rejected pause"),
            });
        }
        debug!(task_id = %task_id, "pause requested");
        Ok(())
    }

    /// Asks the server to resume a paused task. Same contract as pause.
    pub async fn resume(&self) -> Result<(), TaskError> {
        let task_id = self.active_task_id().ok_or(TaskError::NoActiveTask)?;
        let resp = self.transport.resume_task(&task_id).await?;
        if !resp.accepted() {
            return Err(TaskError::ControlFailed {
                action: "resume".into(),
                message: error_or(&resp.error, "server rejected resume"),
            });
        }
        debug!(task_id = %task_id, "resume requested");
        Ok(())
    }

    /// Cancels the tracked task server-side and stops tracking it.
    ///
    /// On acceptance the poll loop stops and the persisted snapshot is
    /// removed immediately, without waiting for a final tick.
    pub async fn cancel(&self) -> Result<(), TaskError> {
        let task_id = self.active_task_id().ok_or(TaskError::NoActiveTask)?;
        let resp = self.transport.cancel_task(&task_id).await?;
        if !resp.accepted() {
            return Err(TaskError::ControlFailed {
                action: "cancel".into(),
                message: error_or(&resp.error, "server rejected cancel"),
            });
        }

        self.stop_tracking(&task_id);
        if let Err(e) = self.store.clear() {
            warn!("failed to clear task snapshot: {e}");
        }
        info!(task_id = %task_id, "processing task cancelled");
        self.emit(TaskEvent::Terminal {
            task_id,
            status: TaskStatus::Cancelled,
            error: None,
        })
        .await;
        Ok(())
    }

    /// Stops the poll loop without touching the persisted snapshot.
    ///
    /// For shutdown: the record stays on disk so the next run can restore.
    pub fn stop(&self) {
        let mut guard = self.state.write().unwrap();
        if let Some(task) = guard.take() {
            task.cancel.cancel();
            debug!(task_id = %task.task_id, "task tracking stopped");
        }
    }

    /// Rehydrates a persisted task and resumes tracking it.
    ///
    /// Call once at startup. The stored snapshot is surfaced through
    /// [`TaskEvent::Restored`] before any server contact, then a single
    /// progress fetch decides what happens next: gone or already terminal
    /// clears the record, alive resumes polling, and a network failure
    /// resumes polling anyway on the last known state.
    ///
    /// Returns `false` when nothing was persisted.
    pub async fn restore(&self) -> Result<bool, TaskError> {
        if let Some(active) = self.active_task_id() {
            return Err(TaskError::AlreadyActive(active));
        }
        let Some(record) = self.store.load()? else {
            return Ok(false);
        };

        let token = CancellationToken::new();
        let task_id = record.task_id.clone();
        *self.state.write().unwrap() = Some(ActiveTask {
            task_id: task_id.clone(),
            file_path: record.file_path.clone(),
            source_id: record.source_id.clone(),
            side_id: record.side_id.clone(),
            logs: record.last_logs.clone(),
            last: record.last_progress.clone(),
            cancel: token.clone(),
        });

        info!(task_id = %task_id, "restored persisted task");
        self.emit(TaskEvent::Restored {
            task_id: task_id.clone(),
            snapshot: record.last_progress,
            logs: record.last_logs,
        })
        .await;

        // Single verification fetch against the server.
        match self.transport.fetch_progress(&task_id).await {
            Ok(None) => {
                self.stop_tracking(&task_id);
                if let Err(e) = self.store.clear() {
                    warn!("failed to clear task snapshot: {e}");
                }
                info!(task_id = %task_id, "task no longer known to the server");
                self.emit(TaskEvent::NoLongerActive { task_id }).await;
            }
            Ok(Some(progress)) if progress.status.is_terminal() => {
                self.stop_tracking(&task_id);
                if let Err(e) = self.store.clear() {
                    warn!("failed to clear task snapshot: {e}");
                }
                info!(task_id = %task_id, status = ?progress.status, "task finished while we were away");
                self.emit(TaskEvent::NoLongerActive { task_id }).await;
            }
            Ok(Some(progress)) => {
                apply_tick(&self.store, &self.state, &self.events_tx, &task_id, progress).await;
                self.spawn_poll_loop(task_id, token);
            }
            Err(e) => {
                // Network failure is treated as transient; keep polling.
                warn!(task_id = %task_id, "verification fetch failed, keeping snapshot: {e}");
                self.spawn_poll_loop(task_id, token);
            }
        }

        Ok(true)
    }

    fn spawn_poll_loop(&self, task_id: String, token: CancellationToken) {
        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let events = self.events_tx.clone();
        let interval = self.config.poll_interval;
        tokio::spawn(async move {
            poll_loop(transport, store, state, events, interval, task_id, token).await;
        });
    }

    fn stop_tracking(&self, task_id: &str) {
        let mut guard = self.state.write().unwrap();
        let Some(task) = guard.take() else { return };
        if task.task_id != task_id {
            *guard = Some(task);
            return;
        }
        task.cancel.cancel();
    }

    async fn emit(&self, event: TaskEvent) {
        let _ = self.events_tx.send(event).await;
    }
}

/// Polls progress until the task ends or the token trips.
///
/// Ticks never overlap: each waits out the interval, then awaits the
/// fetch before the next one is scheduled.
async fn poll_loop(
    transport: Arc<dyn TaskTransport>,
    store: Arc<dyn TaskStore>,
    state: Arc<RwLock<Option<ActiveTask>>>,
    events: mpsc::Sender<TaskEvent>,
    interval: Duration,
    task_id: String,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }

        match transport.fetch_progress(&task_id).await {
            Err(e) => {
                // Transient by contract; only a 404 or a terminal status
                // stops the loop.
                warn!(task_id = %task_id, "progress poll failed: {e}");
            }
            Ok(None) => {
                clear_task(&store, &state, &task_id);
                info!(task_id = %task_id, "task no longer known to the server");
                let _ = events.send(TaskEvent::NoLongerActive { task_id }).await;
                return;
            }
            Ok(Some(progress)) => {
                if apply_tick(&store, &state, &events, &task_id, progress).await {
                    return;
                }
            }
        }
    }
}

/// Folds one progress payload into local state.
///
/// New log entries are the suffix past the locally seen count; the
/// server's log is append-only, so position rather than content decides
/// what is new. Returns true when the status was terminal.
async fn apply_tick(
    store: &Arc<dyn TaskStore>,
    state: &Arc<RwLock<Option<ActiveTask>>>,
    events: &mpsc::Sender<TaskEvent>,
    task_id: &str,
    progress: TaskProgressResponse,
) -> bool {
    let snapshot = TaskSnapshot::from_progress(&progress);

    let (new_entries, record) = {
        let mut guard = state.write().unwrap();
        let Some(task) = guard.as_mut() else {
            return true;
        };
        if task.task_id != task_id {
            return true;
        }

        let seen = task.logs.len();
        let mut appended = Vec::new();
        if progress.logs.len() > seen {
            let now = chrono::Utc::now().timestamp_millis();
            for entry in &progress.logs[seen..] {
                appended.push(LogEntry {
                    kind: entry.kind.clone(),
                    message: entry.message.clone(),
                    timestamp: now,
                });
            }
            task.logs.extend_from_slice(&appended);
        }
        task.last = snapshot.clone();
        (appended, task.to_record())
    };

    if !new_entries.is_empty() {
        let _ = events
            .send(TaskEvent::Logs {
                task_id: task_id.to_string(),
                entries: new_entries,
            })
            .await;
    }
    let _ = events
        .send(TaskEvent::Progress {
            task_id: task_id.to_string(),
            snapshot: snapshot.clone(),
        })
        .await;

    if snapshot.status.is_terminal() {
        clear_task(store, state, task_id);
        let status = snapshot.status;
        let error = match &status {
            TaskStatus::Failed => Some(error_or(&progress.error, "processing failed")),
            TaskStatus::Cancelled => Some(error_or(&progress.error, "processing cancelled")),
            _ => None,
        };
        info!(task_id = %task_id, status = ?status, "task finished");
        let _ = events
            .send(TaskEvent::Terminal {
                task_id: task_id.to_string(),
                status,
                error,
            })
            .await;
        return true;
    }

    if let Err(e) = store.save(&record) {
        warn!("failed to persist task snapshot: {e}");
    }
    false
}

/// Drops the tracked task and its persisted record.
fn clear_task(store: &Arc<dyn TaskStore>, state: &Arc<RwLock<Option<ActiveTask>>>, task_id: &str) {
    let owned = {
        let mut guard = state.write().unwrap();
        match guard.take() {
            Some(task) if task.task_id == task_id => true,
            Some(other) => {
                *guard = Some(other);
                false
            }
            None => true,
        }
    };
    if owned {
        if let Err(e) = store.clear() {
            warn!("failed to clear task snapshot: {e}");
        }
    }
}

fn error_or(error: &str, fallback: &str) -> String {
    if error.is_empty() {
        fallback.to_string()
    } else {
        error.to_string()
    }
}
