//! Durable task snapshots.
//!
//! At most one record exists at a time. It is overwritten after every
//! poll tick and removed on terminal outcomes, so whatever survives a
//! restart is the last state the user actually saw.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{LogEntry, TaskSnapshot};

/// Key the task record is stored under.
pub const STORE_KEY: &str = "fileProcessingTask";

/// Errors from snapshot persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The durable snapshot of the tracked task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTask {
    pub task_id: String,
    pub file_path: String,
    pub source_id: String,
    pub side_id: String,
    /// Snapshot write time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub last_progress: TaskSnapshot,
    pub last_logs: Vec<LogEntry>,
}

/// Persistence seam for the coordinator.
///
/// Implementations must survive whatever restart the client cares about;
/// the coordinator only ever calls these three operations.
pub trait TaskStore: Send + Sync {
    fn save(&self, record: &PersistedTask) -> Result<(), StoreError>;
    fn load(&self) -> Result<Option<PersistedTask>, StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Key-value store persisted as a JSON file.
///
/// Entries are cached in memory and written back whole on every change.
/// Keys other than [`STORE_KEY`] are preserved untouched.
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    /// Creates a new store, loading existing entries from disk.
    pub fn new(path: PathBuf) -> Result<Self, StoreError> {
        let entries = load_entries(&path)?;
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Writes the current entries to disk.
    fn persist(&self) -> Result<(), StoreError> {
        let entries = self.entries.read().unwrap();
        let json = serde_json::to_string_pretty(&*entries)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        debug!("persisted {} entry(ies) to {:?}", entries.len(), self.path);
        Ok(())
    }
}

impl TaskStore for JsonFileStore {
    fn save(&self, record: &PersistedTask) -> Result<(), StoreError> {
        {
            let mut entries = self.entries.write().unwrap();
            entries.insert(STORE_KEY.to_string(), serde_json::to_value(record)?);
        }
        self.persist()
    }

    fn load(&self) -> Result<Option<PersistedTask>, StoreError> {
        let entries = self.entries.read().unwrap();
        match entries.get(STORE_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        let removed = {
            let mut entries = self.entries.write().unwrap();
            entries.remove(STORE_KEY).is_some()
        };
        if removed {
            self.persist()
        } else {
            Ok(())
        }
    }
}

/// Loads entries from a JSON file on disk.
fn load_entries(path: &Path) -> Result<Map<String, Value>, StoreError> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let data = std::fs::read_to_string(path)?;
    let entries: Map<String, Value> = serde_json::from_str(&data)?;
    debug!("loaded {} entry(ies) from {:?}", entries.len(), path);
    Ok(entries)
}

/// Returns the default store path.
pub fn default_store_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("spool").join("studio").join("processing.json"))
}

/// Returns the platform-specific config directory.
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config"))
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Store that lives and dies with the process. Also the test double.
#[derive(Default)]
pub struct MemoryStore {
    record: RwLock<Option<PersistedTask>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryStore {
    fn save(&self, record: &PersistedTask) -> Result<(), StoreError> {
        *self.record.write().unwrap() = Some(record.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedTask>, StoreError> {
        Ok(self.record.read().unwrap().clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.record.write().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spool_protocol::TaskStatus;

    fn sample_record() -> PersistedTask {
        PersistedTask {
            task_id: "task-7".into(),
            file_path: "/mnt/captures/side-a.wav".into(),
            source_id: "src-9".into(),
            side_id: "A".into(),
            timestamp: 1_700_000_000_000,
            last_progress: TaskSnapshot {
                status: TaskStatus::Running,
                current: 40,
                total: 100,
                label: "Analyzing".into(),
                message: "pass 1".into(),
            },
            last_logs: vec![LogEntry {
                kind: "info".into(),
                message: "started".into(),
                timestamp: 1_700_000_000_000,
            }],
        }
    }

    fn test_store() -> (tempfile::TempDir, JsonFileStore) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processing.json");
        let store = JsonFileStore::new(path).unwrap();
        (tmp, store)
    }

    #[test]
    fn new_store_empty() {
        let (_tmp, store) = test_store();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (_tmp, store) = test_store();
        let record = sample_record();
        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap().unwrap(), record);
    }

    #[test]
    fn clear_removes_record() {
        let (_tmp, store) = test_store();
        store.save(&sample_record()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn clear_on_empty_store_is_noop() {
        let (_tmp, store) = test_store();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn persist_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processing.json");

        {
            let store = JsonFileStore::new(path.clone()).unwrap();
            store.save(&sample_record()).unwrap();
        }

        // Reload from disk.
        let store2 = JsonFileStore::new(path).unwrap();
        let record = store2.load().unwrap().unwrap();
        assert_eq!(record.task_id, "task-7");
        assert_eq!(record.last_progress.current, 40);
        assert_eq!(record.last_logs.len(), 1);
    }

    #[test]
    fn file_layout_uses_store_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processing.json");

        let store = JsonFileStore::new(path.clone()).unwrap();
        store.save(&sample_record()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"fileProcessingTask\""));
        assert!(raw.contains("\"task_id\""));
        assert!(raw.contains("\"last_progress\""));
        assert!(raw.contains("\"last_logs\""));
    }

    #[test]
    fn foreign_keys_survive_save_and_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processing.json");
        std::fs::write(&path, r#"{"uiTheme":"dark"}"#).unwrap();

        let store = JsonFileStore::new(path.clone()).unwrap();
        store.save(&sample_record()).unwrap();
        store.clear().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("uiTheme"));
        assert!(!raw.contains("fileProcessingTask"));
    }

    #[test]
    fn load_missing_file_returns_empty() {
        let path = PathBuf::from("/tmp/nonexistent_spool_test_processing.json");
        let entries = load_entries(&path).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let record = sample_record();
        store.save(&record).unwrap();
        assert_eq!(store.load().unwrap().unwrap(), record);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
