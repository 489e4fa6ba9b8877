use std::path::Path;

use anyhow::{Context, Result};
use lmsp::config::LmspConfig;
use lmsp::project::load_project;
use lmsp::select::select_matching;
use lmsp_core::ProjectInfo;
use tracing::instrument;

use super::{check_merge_paths, merge_and_save, print_selection};

/// `lmsp sync`: re-copy every stack the target shares with the source.
#[instrument(skip_all, fields(source = %source.display(), target = %target.display()))]
pub fn run(source: &Path, target: &Path, output: &Path, config: &LmspConfig) -> Result<()> {
    check_merge_paths(source, target, output)?;

    let source_project = load_project(source)?;
    let target_project = load_project(target)?;

    let source_info = ProjectInfo::new(&source_project.project)
        .with_context(|| format!("indexing stacks of {}", source.display()))?;
    let target_info = ProjectInfo::new(&target_project.project)
        .with_context(|| format!("indexing stacks of {}", target.display()))?;
    let stacks = select_matching(&source_info, &target_info)?;

    if stacks.is_empty() {
        println!("Nothing to sync: no source stack has a counterpart in the target.");
        return Ok(());
    }
    print_selection(&stacks);

    merge_and_save(&source_project, target_project, &stacks, output, config)
}
