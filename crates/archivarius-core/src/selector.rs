//! File selection: filter, rank by size, truncate
//!
//! Only the immediate entries of the source directory take part. Files are
//! ranked by descending size with ties kept in enumeration order, so the
//! order is deterministic for a given filesystem but not across filesystems.

use crate::{Error, Result};
use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// A file chosen for the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Bare file name, also used as the stored entry name
    pub name: String,
    /// Size in bytes at enumeration time
    pub size: u64,
    /// Full path of the source file
    pub path: PathBuf,
}

/// Compiled glob matched against bare file names
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pattern: Option<Pattern>,
}

impl FileFilter {
    /// Compile a filter; `None` and the empty string match everything
    pub fn parse(filter: Option<&str>) -> Result<Self> {
        let pattern = match filter {
            None | Some("") => None,
            Some(raw) => {
                let compiled = Pattern::new(&collapse_stars(raw)).map_err(|e| {
                    Error::InvalidFilter {
                        pattern: raw.to_string(),
                        reason: e.msg.to_string(),
                    }
                })?;
                Some(compiled)
            }
        };
        Ok(Self { pattern })
    }

    /// Filter that accepts every name
    pub fn any() -> Self {
        Self::default()
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.matches(name),
            None => true,
        }
    }

    pub fn is_any(&self) -> bool {
        self.pattern.is_none()
    }
}

/// Reduce every run of `*` to a single `*`
///
/// Filters only see bare names, where `**` means the same as `*`.
fn collapse_stars(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    let mut previous = None;
    for c in raw.chars() {
        if !(c == '*' && previous == Some('*')) {
            collapsed.push(c);
        }
        previous = Some(c);
    }
    collapsed
}

/// Select up to `limit` of the largest files in `directory` matching `filter`
///
/// A `limit` of `None` or `Some(0)` keeps [`crate::DEFAULT_LIMIT`] files.
pub fn select_files<P: AsRef<Path>>(
    directory: P,
    filter: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<CandidateFile>> {
    let filter = FileFilter::parse(filter)?;
    let limit = match limit {
        None | Some(0) => crate::DEFAULT_LIMIT,
        Some(n) => n,
    };
    select_with_filter(directory.as_ref(), &filter, limit)
}

/// Selection with an already compiled filter
pub fn select_with_filter(
    directory: &Path,
    filter: &FileFilter,
    limit: usize,
) -> Result<Vec<CandidateFile>> {
    ensure_directory(directory)?;

    let mut candidates = Vec::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = entry.map_err(|e| {
            let context = format!("unable to list directory {}", directory.display());
            Error::io(context, io::Error::from(e))
        })?;

        if !entry.file_type().is_file() {
            debug!("Skipping non-file entry: {:?}", entry.path());
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !filter.matches(&name) {
            debug!("Filtered out: {}", name);
            continue;
        }

        let metadata = entry.metadata().map_err(|e| {
            let context = format!("error reading info for file {}", name);
            Error::io(context, io::Error::from(e))
        })?;

        candidates.push(CandidateFile {
            name,
            size: metadata.len(),
            path: entry.into_path(),
        });
    }

    let found = candidates.len();
    rank_and_truncate(&mut candidates, limit);

    info!(
        "Selected {} of {} matching files in {:?}",
        candidates.len(),
        found,
        directory
    );

    Ok(candidates)
}

/// Stable descending sort by size followed by truncation
pub fn rank_and_truncate(candidates: &mut Vec<CandidateFile>, limit: usize) {
    // sort_by is stable, equal sizes keep enumeration order
    candidates.sort_by(|a, b| b.size.cmp(&a.size));
    candidates.truncate(limit);
}

fn ensure_directory(directory: &Path) -> Result<()> {
    match fs::metadata(directory) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::InputNotFound(directory.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(Error::InputNotFound(directory.to_path_buf()))
        }
        Err(e) => Err(Error::io(
            format!("unable to list directory {}", directory.display()),
            e,
        )),
    }
}
