use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::TransferError;
use crate::session::UploadSession;

/// Table of active upload sessions, keyed by server-assigned upload ID.
///
/// A session lives here from successful session start until its terminal
/// outcome (complete, cancel, or failure), at which point the uploader
/// removes it.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<UploadSession>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session under its ID.
    pub fn insert(&self, session: Arc<UploadSession>) {
        let id = session.id();
        self.sessions.write().unwrap().insert(id, session);
    }

    /// Looks up an active session.
    pub fn get(&self, upload_id: &str) -> Option<Arc<UploadSession>> {
        self.sessions.read().unwrap().get(upload_id).cloned()
    }

    /// Removes a session, returning it if it was present.
    pub fn remove(&self, upload_id: &str) -> Option<Arc<UploadSession>> {
        self.sessions.write().unwrap().remove(upload_id)
    }

    /// Trips the cancellation token of an active session.
    ///
    /// The session stays registered; the upload loop removes it when it
    /// observes the token.
    pub fn cancel(&self, upload_id: &str) -> Result<(), TransferError> {
        match self.get(upload_id) {
            Some(session) => {
                session.cancel();
                Ok(())
            }
            None => Err(TransferError::SessionNotFound(upload_id.to_string())),
        }
    }

    /// Returns the IDs of all active sessions.
    pub fn active_ids(&self) -> Vec<String> {
        self.sessions.read().unwrap().keys().cloned().collect()
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    /// True when no session is active.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().unwrap().is_empty()
    }
}
