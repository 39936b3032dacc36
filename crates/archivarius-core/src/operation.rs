//! The two archive operations and their classified outcome

use crate::builder::{self, BuildOptions};
use crate::error::StatusClass;
use crate::extractor;
use crate::request::ArchiveRequest;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Which pipeline a request runs through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Select files from `directory` and build `archive_name`
    Compress,
    /// Restore `archive_name` into `directory`
    Extract,
}

impl Operation {
    /// Run the operation, returning the raw error on failure
    pub fn execute(self, request: &ArchiveRequest, options: &BuildOptions) -> Result<()> {
        match self {
            Operation::Compress => builder::compress(request, options).map(|_| ()),
            Operation::Extract => extractor::extract(request).map(|_| ()),
        }
    }

    /// Run the operation and classify its outcome
    pub fn run(self, request: &ArchiveRequest, options: &BuildOptions) -> OperationResult {
        info!(
            "Running {} for {:?} <-> {:?}",
            self, request.archive_name, request.directory
        );
        match self.execute(request, options) {
            Ok(()) => OperationResult::success(),
            Err(e) => {
                warn!("{} failed: {}", self, e);
                OperationResult::failure(&e)
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Compress => f.write_str("compress"),
            Operation::Extract => f.write_str("extract"),
        }
    }
}

/// Classified outcome of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub status_class: StatusClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OperationResult {
    pub fn success() -> Self {
        Self {
            status_class: StatusClass::Success,
            message: None,
        }
    }

    pub fn failure(err: &crate::Error) -> Self {
        Self {
            status_class: err.status_class(),
            message: Some(format!("unable to process ({})", err)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_class == StatusClass::Success
    }
}
