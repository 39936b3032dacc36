//! Registry of job sessions

use super::session::{JobSession, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Creates, looks up and removes [`JobSession`]s
///
/// Construct one per process and hand it to whoever serves requests. The
/// registry lock guards the map only; each session guards its own state.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<SessionId, Arc<JobSession>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh session in the `Created` state
    ///
    /// Nothing is started; the caller launches [`JobSession::run`] on a
    /// background task.
    pub fn create_session(&self) -> (SessionId, Arc<JobSession>) {
        let mut sessions = self.lock();

        let id = loop {
            let candidate = SessionId::from(Uuid::new_v4().to_string());
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = Arc::new(JobSession::new(id.clone()));
        sessions.insert(id.clone(), Arc::clone(&session));
        debug!("Registered session {} ({} live)", id, sessions.len());

        (id, session)
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<JobSession>> {
        self.lock().get(id).cloned()
    }

    /// Forget a session; returns whether it was registered
    ///
    /// A runner already executing keeps its own handle and runs to completion.
    pub fn delete(&self, id: &SessionId) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            debug!("Removed session {}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<JobSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
