//! Zip archive construction from a ranked selection

use crate::request::ArchiveRequest;
use crate::selector::{select_with_filter, CandidateFile, FileFilter};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::Path;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entries at or above this size need zip64 headers
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Payload compression used for every entry of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

/// Options for archive creation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Compression method
    pub compression: Compression,
    /// Deflate level, ignored for stored entries
    pub level: Option<u32>,
}

impl BuildOptions {
    fn file_options(&self) -> SimpleFileOptions {
        match self.compression {
            Compression::Deflated => SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(self.level.map(i64::from)),
            Compression::Stored => {
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
            }
        }
    }
}

/// What a build wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Stored entry names in archive order
    pub entries: Vec<String>,
}

/// Select files as described by `request` and write them to its archive
///
/// Selection errors (bad filter, missing directory) are reported before
/// the destination is touched.
pub fn compress(request: &ArchiveRequest, options: &BuildOptions) -> Result<BuildReport> {
    let filter = FileFilter::parse(request.effective_filter())?;
    let selection = select_with_filter(&request.directory, &filter, request.build_limit())?;
    build_archive(&selection, &request.archive_name, options)
}

/// Write `selection` into a new zip archive at `destination`
///
/// Parent directories are created as needed and an existing file is
/// overwritten. Entries are stored under their bare file name, in
/// selection order. The first failing file aborts the build.
pub fn build_archive<P: AsRef<Path>>(
    selection: &[CandidateFile],
    destination: P,
    options: &BuildOptions,
) -> Result<BuildReport> {
    let destination = destination.as_ref();

    info!(
        "Packing {} files into ZIP {:?} ({:?})",
        selection.len(),
        destination,
        options.compression
    );

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::Create {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file = File::create(destination).map_err(|source| Error::Create {
        path: destination.to_path_buf(),
        source,
    })?;
    let mut zip = ZipWriter::new(file);

    let mut entries = Vec::with_capacity(selection.len());
    for candidate in selection {
        append_file(&mut zip, candidate, options)?;
        entries.push(candidate.name.clone());
    }

    zip.finish().map_err(|e| {
        Error::zip_io(
            format!("unable to finish archive {}", destination.display()),
            e,
        )
    })?;

    info!("Successfully packed ZIP archive: {:?}", destination);
    Ok(BuildReport { entries })
}

/// Append a single file as one entry
fn append_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    candidate: &CandidateFile,
    options: &BuildOptions,
) -> Result<()> {
    debug!(
        "Adding file to ZIP: {:?} as {} ({} bytes)",
        candidate.path, candidate.name, candidate.size
    );

    let mut source = File::open(&candidate.path).map_err(|e| {
        Error::io(
            format!("unable to open file {} to compress", candidate.name),
            e,
        )
    })?;
    let metadata = source
        .metadata()
        .map_err(|e| Error::io(format!("unable to stat file {}", candidate.name), e))?;

    let file_options = options
        .file_options()
        .large_file(metadata.len() >= ZIP64_THRESHOLD);

    #[cfg(unix)]
    let file_options = {
        use std::os::unix::fs::PermissionsExt;
        file_options.unix_permissions(metadata.permissions().mode())
    };

    zip.start_file(candidate.name.as_str(), file_options)
        .map_err(|e| Error::zip_io(format!("unable to add file {} to archive", candidate.name), e))?;
    io::copy(&mut source, zip)
        .map_err(|e| Error::io(format!("unable to compress file {}", candidate.name), e))?;

    Ok(())
}
