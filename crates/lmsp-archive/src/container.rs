//! The nested LMSP container.
//!
//! ```text
//! program.lmsp (zip)
//! ├── manifest.json
//! ├── icon.svg
//! └── scratch.sb3 (zip)
//!     ├── project.json
//!     └── <asset md5>.svg|.wav ...
//! ```
//!
//! Only `project.json` is ever rewritten. Every other entry of both zip
//! levels is copied raw, so compressed bytes and metadata stay identical.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ArchiveError;

/// Outer entry holding the Scratch 3 project archive.
pub const SB3_ENTRY: &str = "scratch.sb3";
/// Inner entry holding the project document.
pub const PROJECT_ENTRY: &str = "project.json";
/// Outer entry holding the program thumbnail.
pub const ICON_ENTRY: &str = "icon.svg";

/// An LMSP file loaded into memory.
#[derive(Clone, Debug)]
pub struct ProjectArchive {
    outer: Vec<u8>,
    inner: Vec<u8>,
}

impl ProjectArchive {
    /// Read an archive from disk.
    ///
    /// # Errors
    /// Fails when the file cannot be read or lacks the inner archive.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let bytes = std::fs::read(path).map_err(|source| ArchiveError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes)
    }

    /// Parse an archive held in memory.
    ///
    /// # Errors
    /// Fails when `bytes` is not a zip or has no `scratch.sb3` entry.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        let inner = read_entry(&bytes, SB3_ENTRY)?;
        // Validate the inner level up front.
        ZipArchive::new(Cursor::new(inner.as_slice()))?;
        Ok(Self {
            outer: bytes,
            inner,
        })
    }

    /// The raw project document.
    ///
    /// # Errors
    /// Fails when `project.json` is missing or not UTF-8.
    pub fn project_json(&self) -> Result<String, ArchiveError> {
        read_text(&self.inner, PROJECT_ENTRY)
    }

    /// The program thumbnail.
    ///
    /// # Errors
    /// Fails when `icon.svg` is missing or not UTF-8.
    pub fn icon_svg(&self) -> Result<String, ArchiveError> {
        read_text(&self.outer, ICON_ENTRY)
    }

    /// A copy of this archive with `project.json` replaced.
    ///
    /// # Errors
    /// Fails when either zip level cannot be rewritten.
    pub fn with_project_json(&self, json: &str) -> Result<Self, ArchiveError> {
        let inner = replace_entry(&self.inner, PROJECT_ENTRY, json.as_bytes())?;
        let outer = replace_entry(&self.outer, SB3_ENTRY, &inner)?;
        tracing::debug!(
            outer_bytes = outer.len(),
            inner_bytes = inner.len(),
            "rebuilt project archive"
        );
        Ok(Self { outer, inner })
    }

    /// The complete outer archive.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.outer
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.outer
    }
}

fn read_entry(zip: &[u8], entry: &str) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(zip))?;
    let mut file = match archive.by_name(entry) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ArchiveError::MissingEntry {
                entry: entry.to_owned(),
            });
        }
        Err(err) => return Err(err.into()),
    };
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn read_text(zip: &[u8], entry: &str) -> Result<String, ArchiveError> {
    String::from_utf8(read_entry(zip, entry)?).map_err(|_| ArchiveError::NotUtf8 {
        entry: entry.to_owned(),
    })
}

/// Rebuild `zip` with `entry` holding `contents`, in its original position.
/// Every other entry is copied raw. A missing entry is appended.
fn replace_entry(zip: &[u8], entry: &str, contents: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(zip))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(zip.len())));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut written = false;
    for index in 0..archive.len() {
        let file = archive.by_index_raw(index)?;
        if file.name() == entry {
            drop(file);
            writer.start_file(entry, options)?;
            writer.write_all(contents)?;
            written = true;
        } else {
            writer.raw_copy_file(file)?;
        }
    }
    if !written {
        writer.start_file(entry, options)?;
        writer.write_all(contents)?;
    }
    Ok(writer.finish()?.into_inner())
}
