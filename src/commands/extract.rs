use std::path::Path;

use anyhow::{Context, Result};
use lmsp_archive::{ProjectArchive, read_project_json};

use super::{Accept, check_input};

/// `lmsp json`: print the raw project document.
pub fn json(file: &Path) -> Result<()> {
    check_input(file, "project", Accept::Any)?;
    let json = read_project_json(file)?;
    println!("{json}");
    Ok(())
}

/// `lmsp svg`: print the program icon of an archive.
pub fn svg(file: &Path) -> Result<()> {
    check_input(file, "project", Accept::ArchiveOnly)?;
    let svg = ProjectArchive::open(file)?
        .icon_svg()
        .with_context(|| format!("reading icon of {}", file.display()))?;
    println!("{svg}");
    Ok(())
}
