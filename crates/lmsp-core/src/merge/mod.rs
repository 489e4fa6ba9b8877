//! Stack merge engine.
//!
//! Transplants selected source stacks, and everything they depend on, into a
//! target project:
//!
//! 1. **trace**: closure of the selected stacks over the source, following
//!    called procedures.
//! 2. **relativize**: source comments become offsets from their stack root
//!    (on a working copy; the caller's source is never touched).
//! 3. **symbols**: each referenced variable, list and broadcast is linked to
//!    a same-named target entry or copied in under a fresh id.
//! 4. **ids**: every closure block gets a fresh id.
//! 5. **replace**: incoming procedures and named stacks supersede their
//!    target counterparts, inheriting position; target call sites adopt the
//!    new argument ids.
//! 6. **rewrite**: every copied block's references go through the id map and
//!    the block is inserted, with its comment re-keyed.
//! 7. **absolutize**: relative comments are resolved against the final root
//!    positions.
//!
//! The target is taken by value. On error it is dropped, so a failed merge
//! never yields a partially merged document.

pub mod annotations;
pub mod ids;
pub mod listener;
mod replace;
mod rewrite;
mod symbols;

use indexmap::IndexMap;
use rand::Rng;
use serde::Serialize;
use tracing::instrument;

use crate::error::ProjectError;
use crate::model::{Block, Project, ProjectInfo, Stack};
use crate::trace::ReferenceTracer;

pub use ids::{DEFAULT_ID_LENGTH, DEFAULT_MAX_ID_ATTEMPTS, ID_ALPHABET, IdGenerator, IdMap};
pub use listener::{EventKind, MergeAction, MergeEvent, MergeListener, NullListener};

// ---------------------------------------------------------------------------
// Options and output
// ---------------------------------------------------------------------------

/// Tunables for one merge call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergeOptions {
    /// Length of generated ids.
    pub id_length: usize,
    /// Draws per id before giving up.
    pub max_id_attempts: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            id_length: DEFAULT_ID_LENGTH,
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }
}

/// Counts of what a merge did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Symbols reused from the target.
    pub links: usize,
    /// Symbols and stacks copied in.
    pub copies: usize,
    /// Target stacks removed.
    pub deletions: usize,
    /// Target call sites rewritten to new argument ids.
    pub remapped_calls: usize,
    pub inserted_blocks: usize,
    pub inserted_comments: usize,
}

/// The merged document plus what happened to it.
#[derive(Clone, Debug)]
pub struct MergeOutput {
    pub project: Project,
    pub summary: MergeSummary,
}

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Fans events out to the listener, the summary and the log.
struct Recorder<'l> {
    listener: &'l mut dyn MergeListener,
    summary: MergeSummary,
}

impl<'l> Recorder<'l> {
    fn new(listener: &'l mut dyn MergeListener) -> Self {
        Self {
            listener,
            summary: MergeSummary::default(),
        }
    }

    fn emit(&mut self, event: MergeEvent) {
        tracing::debug!(
            action = %event.action,
            kind = %event.kind,
            name = %event.name,
            old_id = event.old_id.as_deref(),
            new_id = event.new_id.as_deref(),
            "merge decision"
        );
        let counter = match event.action {
            MergeAction::Link => &mut self.summary.links,
            MergeAction::Copy => &mut self.summary.copies,
            MergeAction::Delete => &mut self.summary.deletions,
            MergeAction::Remap => &mut self.summary.remapped_calls,
        };
        *counter += 1;
        self.listener.on_event(&event);
    }
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

/// Merge `stacks` of `source` into `target`.
///
/// `stacks` must come from a [`ProjectInfo`] of `source`; the list is taken
/// as already validated.
///
/// # Errors
/// Any unresolved reference, malformed definition, ambiguous name match or
/// id exhaustion aborts the merge.
pub fn merge(
    source: &Project,
    target: Project,
    stacks: &[Stack],
    options: &MergeOptions,
    listener: &mut dyn MergeListener,
) -> Result<MergeOutput, ProjectError> {
    merge_with_rng(source, target, stacks, options, listener, rand::rng())
}

/// [`merge`] with an explicit id source.
///
/// # Errors
/// See [`merge`].
#[instrument(skip_all, fields(stacks = stacks.len()))]
pub fn merge_with_rng<R: Rng>(
    source: &Project,
    mut target: Project,
    stacks: &[Stack],
    options: &MergeOptions,
    listener: &mut dyn MergeListener,
    rng: R,
) -> Result<MergeOutput, ProjectError> {
    let mut tracer = ReferenceTracer::new(source, true)?;
    for stack in stacks {
        tracer.add(&stack.id)?;
    }
    let usage = tracer.into_usage();
    tracing::debug!(
        blocks = usage.blocks.len(),
        variables = usage.variables.len(),
        lists = usage.lists.len(),
        broadcasts = usage.broadcasts.len(),
        procedures = usage.procedures.len(),
        "traced closure"
    );

    let source_sprite = source.sprite()?;
    let mut working = source_sprite.clone();
    annotations::relativize(&mut working)?;

    let mut ids = IdGenerator::with_rng(target.all_ids(), options, rng);
    let mut map = IdMap::default();
    let mut recorder = Recorder::new(listener);

    {
        let (stage, sprite) = target.namespaces_mut()?;
        symbols::link_or_copy(&usage, stage, sprite, &mut ids, &mut map, &mut recorder)?;
    }

    for id in usage.blocks.keys() {
        map.insert_block(*id, ids.next_id()?);
    }

    let source_info = ProjectInfo::new(source)?;
    let target_info = ProjectInfo::new(&target)?;
    let mut incoming: IndexMap<String, Block> = usage
        .blocks
        .iter()
        .map(|(id, block)| ((*id).to_owned(), (*block).clone()))
        .collect();

    let sprite = target.sprite_mut()?;
    let replacement = replace::Replacement {
        source: source_sprite,
        source_info: &source_info,
        target_info: &target_info,
        map: &map,
    };
    replacement.apply(&mut incoming, sprite, &mut recorder)?;

    rewrite::install(incoming, &map, &working.comments, sprite, &mut ids, &mut recorder)?;
    annotations::absolutize(sprite)?;

    let summary = recorder.summary;
    tracing::info!(
        links = summary.links,
        copies = summary.copies,
        deletions = summary.deletions,
        remapped_calls = summary.remapped_calls,
        blocks = summary.inserted_blocks,
        "merge complete"
    );
    Ok(MergeOutput {
        project: target,
        summary,
    })
}
