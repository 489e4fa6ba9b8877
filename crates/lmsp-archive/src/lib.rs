//! Project file I/O for lmsp.
//!
//! Projects come either as an LMSP archive (a zip holding `scratch.sb3`,
//! itself a zip holding `project.json`) or as a bare `project.json`. This
//! crate reads the document out of either form and writes it back, keeping
//! every other archive entry unchanged and moving a replaced output file to
//! a backup first.
//!
//! # Crate layout
//!
//! - [`container`]: the nested archive ([`ProjectArchive`]).
//! - [`file`]: format detection, loading, backup-on-write.
//! - [`error`]: the [`ArchiveError`] enum.

pub mod container;
pub mod error;
pub mod file;

pub use container::{ICON_ENTRY, PROJECT_ENTRY, ProjectArchive, SB3_ENTRY};
pub use error::ArchiveError;
pub use file::{
    DEFAULT_BACKUP_SUFFIX, ProjectFormat, backup_existing, backup_path, read_project_json,
    write_output,
};
