//! Archivarius - size-ranked zip archiving with tracked background jobs
//!
//! The engine selects the largest files of a directory (optionally filtered
//! by a glob), packs them into a zip container, and restores containers
//! back to disk. Both operations can run inline or as a [`jobs::JobSession`]
//! registered with a [`jobs::SessionManager`].

pub mod builder;
pub mod config;
pub mod error;
pub mod extractor;
pub mod jobs;
pub mod operation;
pub mod request;
pub mod selector;

pub use error::{Error, Result, StatusClass};

// Re-export commonly used types
pub use builder::{build_archive, compress, BuildOptions, BuildReport, Compression};
pub use extractor::{extract, extract_archive, list_entries, ContainerEntry, ExtractReport};
pub use operation::{Operation, OperationResult};
pub use request::{ArchiveRequest, DEFAULT_LIMIT};
pub use selector::{select_files, CandidateFile, FileFilter};
