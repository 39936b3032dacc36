//! Single background job and its lifecycle

use crate::builder::BuildOptions;
use crate::operation::{Operation, OperationResult};
use crate::request::ArchiveRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::info;

/// Opaque, process-unique session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle stage of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Created,
    Started,
    Finished,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Created => "created",
            JobStatus::Started => "started",
            JobStatus::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// Status of a job together with its result once there is one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Created,
    Started,
    Finished(OperationResult),
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Created => JobStatus::Created,
            JobState::Started => JobStatus::Started,
            JobState::Finished(_) => JobStatus::Finished,
        }
    }

    pub fn result(&self) -> Option<&OperationResult> {
        match self {
            JobState::Finished(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// `run` was called on a session that already left `Created`
    #[error("session {id} is already {status}")]
    AlreadyStarted { id: SessionId, status: JobStatus },
}

/// A tracked asynchronous archive operation
///
/// Only the runner mutates the state; pollers read consistent snapshots
/// through [`JobSession::state`]. The result is published together with the
/// `Finished` status under the same lock.
#[derive(Debug)]
pub struct JobSession {
    id: SessionId,
    state: Mutex<JobState>,
}

impl JobSession {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: Mutex::new(JobState::Created),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Snapshot of status and result
    pub fn state(&self) -> JobState {
        self.lock().clone()
    }

    pub fn status(&self) -> JobStatus {
        self.lock().status()
    }

    /// Execute `operation` for `request` and record the outcome
    ///
    /// Blocks for the duration of the operation. The lock is not held while
    /// the operation runs, so pollers observe `Started` in the meantime.
    pub fn run(
        &self,
        request: &ArchiveRequest,
        operation: Operation,
        options: &BuildOptions,
    ) -> Result<OperationResult, JobError> {
        {
            let mut state = self.lock();
            if !matches!(*state, JobState::Created) {
                return Err(JobError::AlreadyStarted {
                    id: self.id.clone(),
                    status: state.status(),
                });
            }
            *state = JobState::Started;
        }

        info!("Session {} started {}", self.id, operation);
        let result = operation.run(request, options);

        *self.lock() = JobState::Finished(result.clone());
        info!(
            "Session {} finished with {}",
            self.id, result.status_class
        );

        Ok(result)
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
