//! Error types for project file I/O.
//!
//! [`ArchiveError`] is returned by every loader and writer in this crate.
//! Variants carry the path or entry name involved so the message alone is
//! enough to locate the problem.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing project files.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The file being read.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written, renamed or backed up.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// The file being written.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// An in-memory I/O error while streaming an entry.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container is corrupt or unsupported.
    #[error("invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required archive entry is absent.
    #[error("archive has no `{entry}` entry")]
    MissingEntry {
        /// The entry name that was looked up.
        entry: String,
    },

    /// An entry expected to hold text is not UTF-8.
    #[error("archive entry `{entry}` is not valid UTF-8")]
    NotUtf8 {
        /// The entry name.
        entry: String,
    },

    /// The path's extension names no known project format.
    #[error("unsupported project file {}: expected .lmsp or .json", path.display())]
    UnsupportedFormat {
        /// The offending path.
        path: PathBuf,
    },

    /// An archive output was requested without an archive to build it from.
    #[error("writing {} as an archive requires a template archive", path.display())]
    MissingTemplate {
        /// The output path.
        path: PathBuf,
    },
}
