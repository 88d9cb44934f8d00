//! Long-running task coordination for the Spool studio server.
//!
//! Submits "process this path" jobs, polls their progress on a fixed
//! interval, and persists a snapshot after every tick so a restarted
//! client can pick the task back up without losing the visible state.

pub mod coordinator;
pub mod error;
pub mod store;
pub mod transport;
pub mod types;

pub use coordinator::TaskCoordinator;
pub use error::TaskError;
pub use store::{
    default_store_path, JsonFileStore, MemoryStore, PersistedTask, StoreError, TaskStore, STORE_KEY,
};
pub use transport::TaskTransport;
pub use types::{CoordinatorConfig, LogEntry, TaskEvent, TaskSnapshot};
