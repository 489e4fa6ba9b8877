use std::path::Path;

use anyhow::{Context, Result};
use lmsp::config::LmspConfig;
use lmsp::project::load_project;
use lmsp::select::select_by_ids;
use lmsp_core::ProjectInfo;
use tracing::instrument;

use super::{check_merge_paths, merge_and_save, print_selection};

/// `lmsp copy`: merge the named stacks of `source` into `target`.
#[instrument(skip_all, fields(source = %source.display(), target = %target.display()))]
pub fn run(
    source: &Path,
    target: &Path,
    output: &Path,
    ids: &[String],
    config: &LmspConfig,
) -> Result<()> {
    check_merge_paths(source, target, output)?;

    let source_project = load_project(source)?;
    let target_project = load_project(target)?;

    let info = ProjectInfo::new(&source_project.project)
        .with_context(|| format!("indexing stacks of {}", source.display()))?;
    let stacks = select_by_ids(&info, ids)?;
    print_selection(&stacks);

    merge_and_save(&source_project, target_project, &stacks, output, config)
}
