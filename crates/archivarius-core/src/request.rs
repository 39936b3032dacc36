//! Archive request descriptor shared by both operations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of files kept by a build when no limit is given
pub const DEFAULT_LIMIT: usize = 10;

/// Parameters of a compress or extract operation
///
/// Field names on the wire are `file`, `dir`, `filter` and `limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRequest {
    /// Container to create or read
    #[serde(rename = "file")]
    pub archive_name: PathBuf,
    /// Source directory for compress, destination for extract
    #[serde(rename = "dir")]
    pub directory: PathBuf,
    /// Glob matched against bare file names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Maximum number of files; 0 or absent selects the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ArchiveRequest {
    pub fn new(archive_name: impl Into<PathBuf>, directory: impl Into<PathBuf>) -> Self {
        Self {
            archive_name: archive_name.into(),
            directory: directory.into(),
            filter: None,
            limit: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter pattern, with an empty string treated as no filter
    pub fn effective_filter(&self) -> Option<&str> {
        self.filter.as_deref().filter(|f| !f.is_empty())
    }

    /// How many files a build keeps
    pub fn build_limit(&self) -> usize {
        match self.limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(n) => n as usize,
        }
    }

    /// How many files an extraction writes, `None` meaning all of them
    pub fn extract_limit(&self) -> Option<usize> {
        match self.limit {
            None | Some(0) => None,
            Some(n) => Some(n as usize),
        }
    }
}
