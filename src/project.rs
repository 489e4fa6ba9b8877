//! Loading and saving whole projects.

use std::path::Path;

use anyhow::{Context, Result};
use lmsp_archive::{ProjectArchive, ProjectFormat, write_output};
use lmsp_core::Project;

use crate::config::OutputConfig;

/// A parsed project plus the archive it came from, if any.
#[derive(Debug)]
pub struct LoadedProject {
    pub project: Project,
    /// Kept so archive output can reuse every other entry.
    pub archive: Option<ProjectArchive>,
}

/// Read and parse a `*.lmsp` or `*.json` project.
///
/// # Errors
/// Fails on unknown extensions, unreadable files and malformed documents.
pub fn load_project(path: &Path) -> Result<LoadedProject> {
    let format = ProjectFormat::from_path(path)?;
    let (json, archive) = match format {
        ProjectFormat::Archive => {
            let archive = ProjectArchive::open(path)?;
            let json = archive
                .project_json()
                .with_context(|| format!("reading project from {}", path.display()))?;
            (json, Some(archive))
        }
        ProjectFormat::Json => {
            let json = lmsp_archive::read_project_json(path)?;
            (json, None)
        }
    };
    let project = Project::from_json(&json)
        .with_context(|| format!("parsing project {}", path.display()))?;
    tracing::debug!(path = %path.display(), ?format, "loaded project");
    Ok(LoadedProject { project, archive })
}

/// Serialize `project` and write it to `path`.
///
/// `*.json` output honours `pretty_json`; archive output is built from
/// `template`. An existing file is moved to its backup first.
///
/// # Errors
/// Fails on serialization or any write error; nothing is written then.
pub fn save_project(
    path: &Path,
    project: &Project,
    template: Option<&ProjectArchive>,
    output: &OutputConfig,
) -> Result<()> {
    let pretty = output.pretty_json && ProjectFormat::from_path(path)? == ProjectFormat::Json;
    let json = project.to_json(pretty).context("serializing merged project")?;
    write_output(path, &json, template, &output.backup_suffix)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "saved project");
    Ok(())
}
