//! Asynchronous job tracking

pub mod manager;
pub mod session;

pub use manager::SessionManager;
pub use session::{JobError, JobSession, JobState, JobStatus, SessionId};
