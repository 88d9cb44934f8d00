//! Wire compatibility checks for the studio server JSON contract.
//!
//! Fixtures under `fixtures/` are request and response bodies captured from a
//! live studio server. Each test deserializes one into its Rust type,
//! serializes it back, and asserts the result matches the capture field for
//! field, so a renamed or dropped field fails here before it fails in the
//! studio.

fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde::Serialize;
    use serde::de::DeserializeOwned;
    use serde_json::{Value, json};

    use spool_processing::{PersistedTask, STORE_KEY};
    use spool_protocol::{
        CancelSessionResponse, ChunkAck, CompleteSessionResponse, ControlResponse,
        ProcessPathRequest, ProcessPathResponse, StartSessionRequest, StartSessionResponse,
        TaskProgressResponse, TaskStatus,
    };

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture(name: &str) -> Value {
        let path = fixtures_dir().join(name);
        let raw = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&raw)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a captured payload into `T`, serializes it back, and
    /// asserts nothing was renamed or lost along the way.
    fn roundtrip_test<T>(name: &str)
    where
        T: DeserializeOwned + Serialize,
    {
        let fixture = load_fixture(name);
        let typed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&typed)
            .unwrap_or_else(|e| panic!("failed to serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  server: {fixture}\n  client: {reserialized}"
        );
    }

    // --- Upload session types ---

    #[test]
    fn start_session_request_roundtrip() {
        roundtrip_test::<StartSessionRequest>("start_session_request.json");
    }

    #[test]
    fn start_session_response_roundtrip() {
        roundtrip_test::<StartSessionResponse>("start_session_response.json");
    }

    #[test]
    fn start_session_rejection_roundtrip() {
        roundtrip_test::<StartSessionResponse>("start_session_rejection.json");
    }

    #[test]
    fn chunk_ack_roundtrip() {
        roundtrip_test::<ChunkAck>("chunk_ack.json");
    }

    #[test]
    fn complete_session_response_roundtrip() {
        roundtrip_test::<CompleteSessionResponse>("complete_session_response.json");
    }

    #[test]
    fn complete_response_preserves_server_extras() {
        let typed: CompleteSessionResponse =
            serde_json::from_value(load_fixture("complete_session_response.json")).unwrap();
        assert!(typed.success);
        assert_eq!(typed.filename, "side-a.wav");
        assert_eq!(
            typed.extra.get("stored_path").and_then(Value::as_str),
            Some("/srv/spool/incoming/side-a.wav")
        );
        assert_eq!(
            typed.extra.get("duration_seconds").and_then(Value::as_i64),
            Some(312)
        );
    }

    #[test]
    fn cancel_session_response_roundtrip() {
        roundtrip_test::<CancelSessionResponse>("cancel_session_response.json");
    }

    // --- Processing task types ---

    #[test]
    fn process_path_request_roundtrip() {
        roundtrip_test::<ProcessPathRequest>("process_path_request.json");
    }

    #[test]
    fn process_path_response_roundtrip() {
        roundtrip_test::<ProcessPathResponse>("process_path_response.json");
    }

    #[test]
    fn task_progress_response_roundtrip() {
        roundtrip_test::<TaskProgressResponse>("task_progress_response.json");
    }

    #[test]
    fn control_response_roundtrip() {
        roundtrip_test::<ControlResponse>("control_response.json");
    }

    // --- Persisted state layout ---

    #[test]
    fn persisted_task_fixture_matches_store_layout() {
        let file = load_fixture("persisted_task.json");
        let entry = file
            .get(STORE_KEY)
            .unwrap_or_else(|| panic!("fixture is missing the {STORE_KEY} key"));

        let typed: PersistedTask = serde_json::from_value(entry.clone()).unwrap();
        assert_eq!(typed.task_id, "task-20260311-0007");
        assert_eq!(typed.file_path, "/mnt/captures/side-a.wav");
        assert_eq!(typed.last_progress.status, TaskStatus::Running);
        assert_eq!(typed.last_logs.len(), 1);
        assert_eq!(typed.last_logs[0].kind, "info");

        let reserialized = serde_json::to_value(&typed).unwrap();
        assert_eq!(
            *entry, reserialized,
            "persisted task layout drifted from the stored file format"
        );
    }

    // --- Tolerance for sparse payloads ---

    #[test]
    fn minimal_progress_body_fills_defaults() {
        let progress: TaskProgressResponse =
            serde_json::from_value(json!({ "status": "pending" })).unwrap();
        assert_eq!(progress.status, TaskStatus::Pending);
        assert_eq!(progress.current, 0);
        assert_eq!(progress.total, 0);
        assert!(progress.label.is_empty());
        assert!(progress.message.is_empty());
        assert!(progress.logs.is_empty());
        assert!(progress.error.is_empty());
        assert!(!progress.status.is_terminal());
    }

    #[test]
    fn status_strings_map_to_variants() {
        let cases = [
            ("pending", TaskStatus::Pending),
            ("running", TaskStatus::Running),
            ("paused", TaskStatus::Paused),
            ("completed", TaskStatus::Completed),
            ("failed", TaskStatus::Failed),
            ("cancelled", TaskStatus::Cancelled),
        ];
        for (wire, expected) in cases {
            let progress: TaskProgressResponse =
                serde_json::from_value(json!({ "status": wire })).unwrap();
            assert_eq!(progress.status, expected, "status string {wire:?}");
        }
    }

    #[test]
    fn control_error_body_is_not_accepted() {
        let rejected: ControlResponse =
            serde_json::from_value(json!({ "error": "task is not pausable" })).unwrap();
        assert!(!rejected.accepted());

        let accepted: ControlResponse =
            serde_json::from_value(json!({ "message": "Task paused" })).unwrap();
        assert!(accepted.accepted());
    }

    #[test]
    fn unknown_fields_from_newer_servers_are_tolerated() {
        let progress: TaskProgressResponse = serde_json::from_value(json!({
            "status": "running",
            "current": 12,
            "total": 40,
            "queue_position": 3,
            "worker": "analyzer-2"
        }))
        .unwrap();
        assert_eq!(progress.status, TaskStatus::Running);
        assert_eq!(progress.current, 12);
    }
}
