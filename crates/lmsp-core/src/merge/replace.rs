//! Top-level replacement: incoming stacks supersede target stacks by name.
//!
//! An incoming procedure replaces the target definition with the same
//! signature; an incoming named plain stack replaces the target plain stack
//! with the same name. The replaced root's position carries over to the
//! incoming root, and the old subtree is removed along with every comment
//! attached to it.
//!
//! Redefining a procedure also rewrites every target call site to the new
//! prototype's argument ids, keeping each bound input at the same position.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::Recorder;
use super::ids::IdMap;
use super::listener::{EventKind, MergeAction, MergeEvent};
use crate::error::ProjectError;
use crate::model::{Block, BlockGraph, ProjectInfo, Stack, Target};

/// Read-only inputs for the replacement pass.
pub(super) struct Replacement<'s> {
    /// Source program namespace.
    pub source: &'s Target,
    pub source_info: &'s ProjectInfo,
    /// Target stacks as they were before any deletion.
    pub target_info: &'s ProjectInfo,
    pub map: &'s IdMap,
}

impl Replacement<'_> {
    /// Run over every incoming stack root, in closure order.
    pub(super) fn apply(
        &self,
        incoming: &mut IndexMap<String, Block>,
        sprite: &mut Target,
        recorder: &mut Recorder<'_>,
    ) -> Result<(), ProjectError> {
        let graph = BlockGraph::new(sprite);
        let roots: Vec<String> = incoming
            .iter()
            .filter(|(_, block)| block.is_stack_root())
            .map(|(id, _)| id.clone())
            .collect();

        for root in &roots {
            let is_definition = incoming.get(root).is_some_and(Block::is_definition);
            let (kind, name, existing) = if is_definition {
                let proccode = self.source_info.proccode_for_block(root).ok_or_else(|| {
                    ProjectError::UnknownBlock { id: root.clone() }
                })?;
                remap_call_sites(self.source, root, proccode, sprite, recorder)?;
                let existing = single_live(
                    self.target_info.procedures_named(proccode),
                    sprite,
                    "procedure",
                    proccode,
                )?;
                (EventKind::Procedure, proccode, existing)
            } else {
                let name = self
                    .source_info
                    .stack_by_id(root)
                    .map_or("", |stack| stack.name.as_str());
                // Unnamed stacks never match anything.
                let existing = if name.is_empty() {
                    None
                } else {
                    single_live(self.target_info.plain_stacks_named(name), sprite, "stack", name)?
                };
                (EventKind::Stack, name, existing)
            };

            if let Some(old_root) = existing {
                let (x, y) = sprite
                    .block(&old_root)
                    .map(|block| (block.x.clone(), block.y.clone()))
                    .unwrap_or_default();
                if let Some(block) = incoming.get_mut(root) {
                    block.x = x;
                    block.y = y;
                }
                let removed = delete_subtree(&graph, &old_root, sprite);
                tracing::debug!(root = %old_root, blocks = removed, "replaced target stack");
                recorder.emit(MergeEvent::new(MergeAction::Delete, kind, name).old_id(old_root));
            }

            let mut copied = MergeEvent::new(MergeAction::Copy, kind, name).old_id(root.as_str());
            if let Some(new_id) = self.map.block(root) {
                copied = copied.new_id(new_id);
            }
            recorder.emit(copied);
        }
        Ok(())
    }
}

/// The single candidate still present in the target, if any.
fn single_live(
    candidates: Vec<&Stack>,
    sprite: &Target,
    kind: &'static str,
    name: &str,
) -> Result<Option<String>, ProjectError> {
    let live: Vec<&Stack> = candidates
        .into_iter()
        .filter(|stack| sprite.blocks.contains_key(&stack.id))
        .collect();
    match live.as_slice() {
        [] => Ok(None),
        [stack] => Ok(Some(stack.id.clone())),
        several => Err(ProjectError::Ambiguous {
            kind,
            name: name.to_owned(),
            count: several.len(),
        }),
    }
}

/// Point every target call of `proccode` at the source prototype's argument
/// ids. Input keys move positionally; keys that are not argument ids stay.
fn remap_call_sites(
    source: &Target,
    definition: &str,
    proccode: &str,
    sprite: &mut Target,
    recorder: &mut Recorder<'_>,
) -> Result<(), ProjectError> {
    let prototype = source.prototype_of(definition)?;
    let (raw, new_args) = match &prototype.mutation {
        Some(mutation) => {
            let args = mutation.argument_ids().map_err(|err| {
                ProjectError::InvalidArgumentIds {
                    block: source
                        .block(definition)
                        .and_then(Block::prototype_id)
                        .unwrap_or(definition)
                        .to_owned(),
                    source: err,
                }
            })?;
            (mutation.argumentids.clone(), args)
        }
        None => (None, Vec::new()),
    };

    for (call_id, entry) in &mut sprite.blocks {
        let Some(call) = entry.as_block_mut() else {
            continue;
        };
        if !call.is_call() || call.proccode() != Some(proccode) {
            continue;
        }
        let Some(mutation) = call.mutation.as_mut() else {
            continue;
        };
        let old_args = mutation
            .argument_ids()
            .map_err(|source| ProjectError::InvalidArgumentIds {
                block: call_id.clone(),
                source,
            })?;
        mutation.argumentids.clone_from(&raw);

        let renames: HashMap<String, &String> = old_args.into_iter().zip(&new_args).collect();
        call.inputs = std::mem::take(&mut call.inputs)
            .into_iter()
            .map(|(key, input)| match renames.get(&key) {
                Some(&new_key) => (new_key.clone(), input),
                None => (key, input),
            })
            .collect();

        recorder.emit(MergeEvent::new(MergeAction::Remap, EventKind::Call, proccode).old_id(call_id.as_str()));
    }
    Ok(())
}

/// Remove `root`, its descendants and every comment attached to them.
/// Returns the number of blocks removed.
fn delete_subtree(graph: &BlockGraph, root: &str, sprite: &mut Target) -> usize {
    let doomed: HashSet<String> = graph.subtree(root).into_iter().collect();
    let attached: HashSet<String> = doomed
        .iter()
        .filter_map(|id| sprite.block(id)?.comment.clone())
        .collect();

    sprite.blocks.retain(|id, _| !doomed.contains(id));
    sprite.comments.retain(|id, comment| {
        !attached.contains(id)
            && !comment
                .block_id
                .as_ref()
                .is_some_and(|owner| doomed.contains(owner))
    });
    doomed.len()
}
