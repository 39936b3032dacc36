//! Zip archive extraction with the same filter semantics as selection

use crate::request::ArchiveRequest;
use crate::selector::FileFilter;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

/// Entry stored in a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEntry {
    /// Name as stored in the archive
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Compressed size in bytes
    pub compressed_size: u64,
    /// Unix permissions (if available)
    pub mode: Option<u32>,
    /// Whether this is a directory marker
    pub is_dir: bool,
}

/// What an extraction wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Base names of extracted files, in archive order
    pub files: Vec<String>,
    /// Base names of materialized directory markers
    pub directories: Vec<String>,
}

/// Extract the archive named by `request` into its directory
pub fn extract(request: &ArchiveRequest) -> Result<ExtractReport> {
    let filter = FileFilter::parse(request.effective_filter())?;
    extract_archive(
        &request.archive_name,
        &request.directory,
        &filter,
        request.extract_limit(),
    )
}

/// Extract entries of `source` into `destination`
///
/// Entries are taken in stored order without re-sorting, which yields the
/// largest files first for archives produced by [`crate::build_archive`].
/// Every entry lands directly in `destination` under its base name.
/// Directory markers become empty directories wherever they are stored and
/// do not count toward `limit`; `None` or `Some(0)` extracts every matching
/// file.
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    filter: &FileFilter,
    limit: Option<usize>,
) -> Result<ExtractReport> {
    let source = source.as_ref();
    let destination = destination.as_ref();
    let limit = limit.filter(|&n| n > 0);

    info!(
        "Extracting ZIP {:?} to {:?} (limit: {:?})",
        source, destination, limit
    );

    let mut archive = open_archive(source)?;

    fs::create_dir_all(destination).map_err(|e| Error::Create {
        path: destination.to_path_buf(),
        source: e,
    })?;

    let mut report = ExtractReport::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| read_error(source, e))?;

        let name = match base_name(entry.name()) {
            Some(name) => name,
            None => {
                warn!("Skipping entry without a usable name: {:?}", entry.name());
                continue;
            }
        };

        if !filter.matches(&name) {
            debug!("Filtered out: {}", name);
            continue;
        }

        let target = destination.join(&name);

        if entry.is_dir() {
            debug!("Creating directory: {:?}", target);
            fs::create_dir_all(&target).map_err(|e| Error::Create {
                path: target.clone(),
                source: e,
            })?;
            report.directories.push(name);
            continue;
        }

        if limit.is_some_and(|n| report.files.len() >= n) {
            debug!("Limit reached, skipping: {}", name);
            continue;
        }

        debug!("Extracting: {} -> {:?}", entry.name(), target);
        let mode = entry.unix_mode();
        write_entry(&mut entry, mode, &target, &name)?;
        report.files.push(name);
    }

    info!(
        "Successfully extracted {} files and {} directories",
        report.files.len(),
        report.directories.len()
    );
    Ok(report)
}

/// Inspect archive contents without extracting
pub fn list_entries<P: AsRef<Path>>(source: P) -> Result<Vec<ContainerEntry>> {
    let source = source.as_ref();
    let mut archive = open_archive(source)?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| read_error(source, e))?;
        entries.push(ContainerEntry {
            name: entry.name().to_string(),
            size: entry.size(),
            compressed_size: entry.compressed_size(),
            mode: entry.unix_mode(),
            is_dir: entry.is_dir(),
        });
    }

    Ok(entries)
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::InputNotFound(path.to_path_buf())
        } else {
            Error::Open {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    ZipArchive::new(file).map_err(|e| match e {
        ZipError::Io(source) => Error::Open {
            path: path.to_path_buf(),
            source,
        },
        other => Error::Format {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}

fn read_error(path: &Path, err: ZipError) -> Error {
    match err {
        ZipError::Io(source) => Error::io(format!("unable to read archive {}", path.display()), source),
        other => Error::Format {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

/// Last path component of a stored name, `None` for names like `..` or `/`
fn base_name(stored: &str) -> Option<String> {
    Path::new(stored.trim_end_matches('/'))
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}

fn write_entry<R: Read>(
    reader: &mut R,
    mode: Option<u32>,
    target: &Path,
    name: &str,
) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Create {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode.map_or(0o644, |m| m & 0o7777));
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut output = options.open(target).map_err(|e| Error::Create {
        path: target.to_path_buf(),
        source: e,
    })?;

    io::copy(reader, &mut output)
        .map_err(|e| Error::io(format!("unable to extract file {}", name), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("one.txt").as_deref(), Some("one.txt"));
        assert_eq!(base_name(".tmp/test/src/one.txt").as_deref(), Some("one.txt"));
        assert_eq!(base_name("inner/").as_deref(), Some("inner"));
        assert_eq!(base_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(base_name(".."), None);
        assert_eq!(base_name("/"), None);
    }

    #[test]
    fn test_missing_archive() {
        let temp_dir = TempDir::new().unwrap();
        let err = extract_archive(
            temp_dir.path().join("none.zip"),
            temp_dir.path().join("out"),
            &FileFilter::any(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InputNotFound(_)));
    }

    #[test]
    fn test_corrupt_archive() {
        let temp_dir = TempDir::new().unwrap();
        let bogus = temp_dir.path().join("bogus.zip");
        fs::write(&bogus, b"definitely not a zip file").unwrap();

        let err = extract_archive(&bogus, temp_dir.path().join("out"), &FileFilter::any(), None)
            .unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_full_paths_are_flattened() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("paths.zip");
        let mut zip = ZipWriter::new(File::create(&archive).unwrap());
        zip.start_file("deep/nested/file.txt", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"payload").unwrap();
        zip.finish().unwrap();

        let out = temp_dir.path().join("out");
        let report = extract_archive(&archive, &out, &FileFilter::any(), None).unwrap();

        assert_eq!(report.files, ["file.txt"]);
        assert_eq!(fs::read(out.join("file.txt")).unwrap(), b"payload");
    }

    #[test]
    fn test_list_entries() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("list.zip");
        let mut zip = ZipWriter::new(File::create(&archive).unwrap());
        zip.add_directory("docs/", SimpleFileOptions::default())
            .unwrap();
        zip.start_file("a.txt", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"abc").unwrap();
        zip.finish().unwrap();

        let entries = list_entries(&archive).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_dir);
        assert_eq!(entries[1].name, "a.txt");
        assert_eq!(entries[1].size, 3);
    }
}
