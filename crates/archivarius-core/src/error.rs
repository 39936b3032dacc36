//! Error types for archivarius-core

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Core error types for the archivarius library
///
/// Every variant is classified as either a client or a server error, see
/// [`Error::status_class`].
#[derive(Error, Debug)]
pub enum Error {
    /// The filter is not a valid glob pattern
    #[error("malformed filter {pattern:?} ({reason})")]
    InvalidFilter { pattern: String, reason: String },

    /// Source directory or container does not exist
    #[error("input not found: {0}")]
    InputNotFound(PathBuf),

    /// Destination directory or file could not be created
    #[error("unable to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Read or write failure in the middle of an operation
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Container exists but cannot be opened
    #[error("unable to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Container is not a readable zip archive
    #[error("malformed archive {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    /// Configuration-related error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build an I/O error with a description of what was being done
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    /// Map a zip writer/reader failure that happened while doing `context`
    pub(crate) fn zip_io(context: impl Into<String>, err: zip::result::ZipError) -> Self {
        let source = match err {
            zip::result::ZipError::Io(e) => e,
            other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
        };
        Error::io(context, source)
    }

    /// Classify the error for callers that report outcomes
    pub fn status_class(&self) -> StatusClass {
        match self {
            Error::InvalidFilter { .. }
            | Error::InputNotFound(_)
            | Error::Create { .. }
            | Error::Open { .. }
            | Error::Format { .. } => StatusClass::ClientError,
            Error::Io { .. } | Error::Config(_) => StatusClass::ServerError,
        }
    }
}

/// Outcome class of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusClass {
    Success,
    ClientError,
    ServerError,
}

impl StatusClass {
    /// HTTP status code conventionally used for this class
    pub fn http_status(self) -> u16 {
        match self {
            StatusClass::Success => 200,
            StatusClass::ClientError => 400,
            StatusClass::ServerError => 500,
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusClass::Success => "success",
            StatusClass::ClientError => "client-error",
            StatusClass::ServerError => "server-error",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
