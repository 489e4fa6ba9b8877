//! Comment positions relative to their stack root.
//!
//! Comments are stored in absolute canvas coordinates. While a stack moves
//! between documents (and its root may take over a replaced stack's
//! position), attached comments are held as offsets from the root and
//! resolved back once the final root positions are known.

use crate::error::ProjectError;
use crate::model::{Block, BlockGraph, Target};

/// Turn every attached comment into an offset from its stack root.
///
/// Comments without an owning block, or whose block is not in the table,
/// stay absolute. Returns the number of comments rewritten.
///
/// # Errors
/// Fails when a parent chain is broken or cyclic.
pub fn relativize(target: &mut Target) -> Result<usize, ProjectError> {
    shift(target, |comment_relative| !comment_relative, -1.0)
}

/// Resolve every relative comment against its root's current position.
///
/// # Errors
/// Fails when a relative comment's block is gone or its parent chain is
/// broken.
pub fn absolutize(target: &mut Target) -> Result<usize, ProjectError> {
    shift(target, |comment_relative| comment_relative, 1.0)
}

fn shift(
    target: &mut Target,
    select: impl Fn(bool) -> bool,
    sign: f64,
) -> Result<usize, ProjectError> {
    let graph = BlockGraph::new(target);
    let mut offsets = Vec::new();
    for (comment_id, comment) in &target.comments {
        if !select(comment.relative) {
            continue;
        }
        let block_id = match comment.block_id.as_deref() {
            Some(id) if target.block(id).is_some() => id,
            // A relative comment always belongs to a copied block.
            Some(id) if comment.relative => {
                return Err(ProjectError::UnknownBlock { id: id.to_owned() });
            }
            _ => continue,
        };
        let root = graph.root_of(block_id)?;
        let (x, y) = target.block(root).map(Block::position).unwrap_or_default();
        offsets.push((comment_id.clone(), x * sign, y * sign));
    }

    for (comment_id, dx, dy) in &offsets {
        if let Some(comment) = target.comments.get_mut(comment_id) {
            comment.translate(*dx, *dy);
            comment.relative = sign < 0.0;
        }
    }
    Ok(offsets.len())
}
