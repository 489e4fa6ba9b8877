//! Parent → children index over a block table.
//!
//! The stored `parent` field conflates two relations: "is nested inside"
//! (an input or substack of the parent) and "follows in sequence" (the
//! parent's `next` is this block). [`BlockGraph`] builds both edges once per
//! snapshot so traversals and subtree deletion never rescan the table.
//!
//! ```text
//! hat ──next──▶ repeat ──next──▶ stop
//!                 │
//!              SUBSTACK
//!                 ▼
//!               move
//!
//! move.parent == repeat   →  Link::Nested   (repeat encloses move)
//! stop.parent == repeat   →  Link::Sequence (repeat precedes stop)
//! ```

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::block::BlockEntry;
use super::project::Target;
use crate::error::ProjectError;

/// How a child hangs off its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Link {
    /// The child sits inside one of the parent's inputs.
    Nested,
    /// The child is the parent's `next`.
    Sequence,
}

/// Arena index of the block table keyed by id.
#[derive(Clone, Debug, Default)]
pub struct BlockGraph {
    known: HashSet<String>,
    children: HashMap<String, Vec<(String, Link)>>,
    parents: HashMap<String, (String, Link)>,
}

impl BlockGraph {
    #[must_use]
    pub fn new(target: &Target) -> Self {
        Self::from_blocks(&target.blocks)
    }

    /// Build the index. Children keep block-table order.
    #[must_use]
    pub fn from_blocks(blocks: &IndexMap<String, BlockEntry>) -> Self {
        let mut graph = Self::default();
        for (id, entry) in blocks {
            graph.known.insert(id.clone());
            let Some(block) = entry.as_block() else {
                continue;
            };
            let Some(parent_id) = block.parent.as_deref() else {
                continue;
            };
            let link = match blocks.get(parent_id).and_then(BlockEntry::as_block) {
                Some(parent) if parent.next.as_deref() == Some(id.as_str()) => Link::Sequence,
                _ => Link::Nested,
            };
            graph
                .children
                .entry(parent_id.to_owned())
                .or_default()
                .push((id.clone(), link));
            graph.parents.insert(id.clone(), (parent_id.to_owned(), link));
        }
        graph
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    /// Direct children over both relations, in table order.
    pub fn children(&self, id: &str) -> impl Iterator<Item = &str> + '_ {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .map(|(child, _)| child.as_str())
    }

    /// Blocks sitting inside `id`'s inputs.
    pub fn nested_in(&self, id: &str) -> impl Iterator<Item = &str> + '_ {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .filter(|(_, link)| *link == Link::Nested)
            .map(|(child, _)| child.as_str())
    }

    /// The block after `id` in its sequence.
    #[must_use]
    pub fn followed_by(&self, id: &str) -> Option<&str> {
        self.children
            .get(id)?
            .iter()
            .find(|(_, link)| *link == Link::Sequence)
            .map(|(child, _)| child.as_str())
    }

    /// The block whose input holds `id`.
    #[must_use]
    pub fn enclosing_of(&self, id: &str) -> Option<&str> {
        match self.parents.get(id)? {
            (parent, Link::Nested) => Some(parent),
            (_, Link::Sequence) => None,
        }
    }

    /// The block before `id` in its sequence.
    #[must_use]
    pub fn preceded_by(&self, id: &str) -> Option<&str> {
        match self.parents.get(id)? {
            (parent, Link::Sequence) => Some(parent),
            (_, Link::Nested) => None,
        }
    }

    /// Walk up to the stack root.
    ///
    /// # Errors
    /// [`ProjectError::UnknownBlock`] if `id` or an ancestor is missing,
    /// [`ProjectError::ParentCycle`] if the walk never terminates.
    pub fn root_of<'g>(&'g self, id: &'g str) -> Result<&'g str, ProjectError> {
        if !self.contains(id) {
            return Err(ProjectError::UnknownBlock { id: id.to_owned() });
        }
        let mut current = id;
        for _ in 0..=self.known.len() {
            let Some(parent) = self.enclosing_of(current).or_else(|| self.preceded_by(current))
            else {
                return Ok(current);
            };
            if !self.contains(parent) {
                return Err(ProjectError::UnknownBlock {
                    id: parent.to_owned(),
                });
            }
            current = parent;
        }
        Err(ProjectError::ParentCycle { id: id.to_owned() })
    }

    /// `root` and every descendant, pre-order.
    #[must_use]
    pub fn subtree(&self, root: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id.to_owned());
            let children: Vec<&str> = self.children(id).collect();
            pending.extend(children.into_iter().rev());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blocks(value: serde_json::Value) -> IndexMap<String, BlockEntry> {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> BlockGraph {
        BlockGraph::from_blocks(&blocks(json!({
            "hat":    { "opcode": "event_whenprogramstarts", "next": "repeat", "parent": null, "topLevel": true },
            "repeat": { "opcode": "control_repeat", "next": "stop", "parent": "hat",
                        "inputs": { "SUBSTACK": [2, "move"], "TIMES": [1, [6, "4"]] } },
            "move":   { "opcode": "motion_movesteps", "next": null, "parent": "repeat" },
            "stop":   { "opcode": "control_stop", "next": null, "parent": "repeat" },
            "other":  { "opcode": "event_whenbroadcastreceived", "next": null, "parent": null, "topLevel": true },
            "loose":  [12, "x", "v1", 0, 0]
        })))
    }

    #[test]
    fn classifies_edges() {
        let g = sample();
        assert_eq!(g.followed_by("hat"), Some("repeat"));
        assert_eq!(g.followed_by("repeat"), Some("stop"));
        assert_eq!(g.nested_in("repeat").collect::<Vec<_>>(), vec!["move"]);
        assert_eq!(g.enclosing_of("move"), Some("repeat"));
        assert_eq!(g.preceded_by("move"), None);
        assert_eq!(g.preceded_by("stop"), Some("repeat"));
        assert_eq!(g.enclosing_of("stop"), None);
    }

    #[test]
    fn children_keep_table_order() {
        let g = sample();
        assert_eq!(g.children("repeat").collect::<Vec<_>>(), vec!["move", "stop"]);
        assert_eq!(g.children("other").count(), 0);
    }

    #[test]
    fn root_of_walks_both_relations() {
        let g = sample();
        assert_eq!(g.root_of("move").unwrap(), "hat");
        assert_eq!(g.root_of("stop").unwrap(), "hat");
        assert_eq!(g.root_of("hat").unwrap(), "hat");
        assert!(matches!(g.root_of("nope"), Err(ProjectError::UnknownBlock { .. })));
        assert!(g.contains("loose"));
    }

    #[test]
    fn root_of_detects_cycles() {
        let g = BlockGraph::from_blocks(&blocks(json!({
            "a": { "opcode": "x", "next": "b", "parent": "b" },
            "b": { "opcode": "y", "next": "a", "parent": "a" }
        })));
        assert!(matches!(g.root_of("a"), Err(ProjectError::ParentCycle { .. })));
    }

    #[test]
    fn root_of_reports_missing_parent() {
        let g = BlockGraph::from_blocks(&blocks(json!({
            "a": { "opcode": "x", "next": null, "parent": "gone" }
        })));
        assert!(matches!(
            g.root_of("a"),
            Err(ProjectError::UnknownBlock { id }) if id == "gone"
        ));
    }

    #[test]
    fn subtree_is_preorder() {
        let g = sample();
        assert_eq!(g.subtree("hat"), vec!["hat", "repeat", "move", "stop"]);
        assert_eq!(g.subtree("other"), vec!["other"]);
    }
}
