use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use lmsp::format::OutputFormat;
use lmsp::project::load_project;
use lmsp_core::{Project, ProjectInfo, Reference, ReferenceTracer, StackKind, Target};
use serde::Serialize;
use tracing::instrument;

use super::{Accept, check_input};

/// One block of a stack's top-level chain.
#[derive(Debug, Serialize)]
struct ChainBlock {
    id: String,
    opcode: String,
    /// Called signature, for procedure calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    calls: Option<String>,
    /// Text of the attached comment.
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

#[derive(Debug, Serialize)]
struct StackListing {
    index: usize,
    id: String,
    name: String,
    kind: StackKind,
    blocks: Vec<ChainBlock>,
    references: Vec<Reference>,
}

/// `lmsp list`: describe every stack of a project.
#[instrument(skip_all, fields(file = %file.display()))]
pub fn run(file: &Path, format: OutputFormat) -> Result<()> {
    check_input(file, "project", Accept::Any)?;
    let loaded = load_project(file)?;
    let listings = collect(&loaded.project)
        .with_context(|| format!("listing stacks of {}", file.display()))?;

    match format {
        OutputFormat::Json => println!("{}", format.serialize(&listings)?),
        OutputFormat::Text => print!("{}", render_text(&listings)),
    }
    Ok(())
}

fn collect(project: &Project) -> Result<Vec<StackListing>> {
    let info = ProjectInfo::new(project)?;
    let sprite = project.sprite()?;

    let mut listings = Vec::with_capacity(info.stacks().len());
    for stack in info.stacks() {
        let mut tracer = ReferenceTracer::new(project, false)?;
        tracer.add(&stack.id)?;
        listings.push(StackListing {
            index: stack.index,
            id: stack.id.clone(),
            name: stack.name.clone(),
            kind: stack.kind,
            blocks: chain(sprite, &stack.id),
            references: tracer.list(),
        });
    }
    Ok(listings)
}

/// The root and its `next` successors.
fn chain(sprite: &Target, root: &str) -> Vec<ChainBlock> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = Some(root);
    while let Some(id) = cursor {
        if !seen.insert(id) {
            break;
        }
        let Some(block) = sprite.block(id) else {
            break;
        };
        let comment = block
            .comment
            .as_deref()
            .and_then(|c| sprite.comments.get(c))
            .map(|c| c.text.clone());
        out.push(ChainBlock {
            id: id.to_owned(),
            opcode: block.opcode.clone(),
            calls: block
                .is_call()
                .then(|| block.proccode().map(str::to_owned))
                .flatten(),
            comment,
        });
        cursor = block.next.as_deref();
    }
    out
}

fn render_text(listings: &[StackListing]) -> String {
    let mut out = String::new();
    for listing in listings {
        let kind = match listing.kind {
            StackKind::Procedure => "procedure",
            StackKind::Plain => "stack",
        };
        if listing.name.is_empty() {
            let _ = writeln!(out, "[{}] {kind} with no name", listing.index);
        } else {
            let _ = writeln!(out, "[{}] {kind} {}", listing.index, listing.name);
        }
        for block in &listing.blocks {
            let _ = write!(out, "    [{}]", block.opcode);
            if let Some(calls) = &block.calls {
                let _ = write!(out, " -> ({calls})");
            }
            if let Some(comment) = &block.comment {
                let _ = write!(out, " // {}", comment.replace('\n', " "));
            }
            out.push('\n');
        }
        for reference in &listing.references {
            let _ = writeln!(
                out,
                "    uses {} \"{}\" ({})",
                reference.kind, reference.name, reference.count
            );
        }
        out.push('\n');
    }
    out
}
