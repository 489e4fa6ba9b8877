//! Format detection, loading and backup-on-write.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::container::ProjectArchive;
use crate::error::ArchiveError;

/// Default suffix appended to a replaced output file.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// Physical form of a project file, chosen by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectFormat {
    /// `*.lmsp`: nested zip archive.
    Archive,
    /// `*.json`: the bare project document.
    Json,
}

impl ProjectFormat {
    /// Classify `path` by extension (case-insensitive).
    ///
    /// # Errors
    /// [`ArchiveError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, ArchiveError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("lmsp") => Ok(Self::Archive),
            Some("json") => Ok(Self::Json),
            _ => Err(ArchiveError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Read the project document from either form.
///
/// # Errors
/// Fails on unknown extensions, unreadable files and malformed archives.
pub fn read_project_json(path: &Path) -> Result<String, ArchiveError> {
    match ProjectFormat::from_path(path)? {
        ProjectFormat::Archive => ProjectArchive::open(path)?.project_json(),
        ProjectFormat::Json => std::fs::read_to_string(path).map_err(|source| ArchiveError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// `path` with `suffix` appended to the file name.
#[must_use]
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Move an existing `path` aside to `path` + `suffix`.
///
/// An older backup is replaced. Returns the backup path, or `None` when
/// there was nothing to back up.
///
/// # Errors
/// [`ArchiveError::Write`] when the rename fails.
pub fn backup_existing(path: &Path, suffix: &str) -> Result<Option<PathBuf>, ArchiveError> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = backup_path(path, suffix);
    std::fs::rename(path, &backup).map_err(|source| ArchiveError::Write {
        path: backup.clone(),
        source,
    })?;
    tracing::info!(from = %path.display(), to = %backup.display(), "backed up existing output");
    Ok(Some(backup))
}

/// Write a project document to `path` in the form its extension names.
///
/// Archive output is built from `template` with `project.json` replaced.
/// The bytes are fully prepared before anything on disk changes; then an
/// existing file is moved to `path` + `backup_suffix` and the new content
/// written.
///
/// # Errors
/// Fails on unknown extensions, a missing template for archive output, or
/// any filesystem error.
pub fn write_output(
    path: &Path,
    json: &str,
    template: Option<&ProjectArchive>,
    backup_suffix: &str,
) -> Result<(), ArchiveError> {
    let bytes = match ProjectFormat::from_path(path)? {
        ProjectFormat::Json => json.as_bytes().to_vec(),
        ProjectFormat::Archive => {
            let template = template.ok_or_else(|| ArchiveError::MissingTemplate {
                path: path.to_path_buf(),
            })?;
            template.with_project_json(json)?.into_bytes()
        }
    };

    backup_existing(path, backup_suffix)?;
    std::fs::write(path, &bytes).map_err(|source| ArchiveError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote project");
    Ok(())
}
