//! Shared service state and background job launching

use archivarius_core::config::Config;
use archivarius_core::jobs::{JobSession, SessionManager};
use archivarius_core::{ArchiveRequest, BuildOptions, Operation};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// State handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub build_options: BuildOptions,
    /// Admission gate for background jobs, `None` when unbounded
    pub job_gate: Option<Arc<Semaphore>>,
    /// Largest accepted request body in bytes
    pub body_limit: usize,
}

impl AppState {
    pub fn new(build_options: BuildOptions, max_concurrent_jobs: usize, body_limit: usize) -> Self {
        let job_gate = (max_concurrent_jobs > 0).then(|| Arc::new(Semaphore::new(max_concurrent_jobs)));
        Self {
            sessions: Arc::new(SessionManager::new()),
            build_options,
            job_gate,
            body_limit,
        }
    }

    pub fn from_config(config: &Config) -> archivarius_core::Result<Self> {
        Ok(Self::new(
            config.archive.build_options(),
            config.server.max_concurrent_jobs,
            config.server.max_request_body_bytes()?,
        ))
    }

    /// Run `session` in the background
    ///
    /// The job waits for a permit before it starts, so queued sessions stay
    /// `Created` until a slot frees up. The returned handle may be dropped.
    pub fn launch(
        &self,
        session: Arc<JobSession>,
        request: ArchiveRequest,
        operation: Operation,
    ) -> JoinHandle<()> {
        let gate = self.job_gate.clone();
        let options = self.build_options.clone();

        tokio::spawn(async move {
            let _permit = match gate {
                Some(gate) => match gate.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => {
                        error!("Job gate closed, session {} not started", session.id());
                        return;
                    }
                },
                None => None,
            };

            let id = session.id().clone();
            debug!("Session {} admitted", id);

            let outcome =
                tokio::task::spawn_blocking(move || session.run(&request, operation, &options))
                    .await;

            match outcome {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("Session {} not run: {}", id, e),
                Err(e) => error!("Runner for session {} failed: {}", id, e),
            }
        })
    }
}
