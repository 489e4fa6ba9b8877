//! Command implementations for the `lmsp` binary.

pub mod copy;
pub mod extract;
pub mod list;
pub mod sync;

use std::path::Path;

use anyhow::{Context, Result, bail};
use lmsp::config::LmspConfig;
use lmsp::project::{LoadedProject, save_project};
use lmsp::report::ConsoleReporter;
use lmsp_archive::ProjectFormat;
use lmsp_core::{Stack, merge};

/// Which project formats a command argument accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Accept {
    ArchiveOnly,
    Any,
}

fn check_format(path: &Path, role: &str, accept: Accept) -> Result<()> {
    let format = ProjectFormat::from_path(path).with_context(|| format!("invalid {role} file"))?;
    if accept == Accept::ArchiveOnly && format != ProjectFormat::Archive {
        bail!(
            "{role} file {} must be an .lmsp archive\n  To fix: pass the EV3 Classroom project file",
            path.display()
        );
    }
    Ok(())
}

/// An existing project file of an accepted format.
fn check_input(path: &Path, role: &str, accept: Accept) -> Result<()> {
    check_format(path, role, accept)?;
    if !path.is_file() {
        bail!("{role} file {} does not exist", path.display());
    }
    Ok(())
}

/// Source, target and output arguments of `copy` and `sync`.
fn check_merge_paths(source: &Path, target: &Path, output: &Path) -> Result<()> {
    check_input(source, "source", Accept::Any)?;
    check_input(target, "target", Accept::ArchiveOnly)?;
    check_format(output, "output", Accept::Any)
}

/// Merge `stacks` of `source` into `target` and write the result.
///
/// Decisions are printed to stdout as they are made. Nothing is written
/// when the merge fails.
fn merge_and_save(
    source: &LoadedProject,
    target: LoadedProject,
    stacks: &[Stack],
    output: &Path,
    config: &LmspConfig,
) -> Result<()> {
    let LoadedProject {
        project: target_project,
        archive: template,
    } = target;

    let stdout = std::io::stdout();
    let mut reporter = ConsoleReporter::new(stdout.lock());
    let merged = merge(
        &source.project,
        target_project,
        stacks,
        &config.merge.options(),
        &mut reporter,
    )
    .context("merge failed; nothing was written")?;
    reporter
        .finish(&merged.summary)
        .context("writing merge report")?;

    save_project(output, &merged.project, template.as_ref(), &config.output)?;
    println!("Wrote {}", output.display());
    Ok(())
}

/// Print the stacks about to be merged.
fn print_selection(stacks: &[Stack]) {
    println!("Selected {} stack(s):", stacks.len());
    for stack in stacks {
        println!("  {stack}");
    }
}
