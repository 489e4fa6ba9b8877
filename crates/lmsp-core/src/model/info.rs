//! Derived stacks and procedure lookup.
//!
//! A stack is a maximal block subtree rooted at a top-level, non-shadow
//! block. Procedure stacks are named by their signature; plain stacks by a
//! `{name}` tag in the comment attached to the root. Indexes are 1-based in
//! block-table order and stay stable for a given document snapshot.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::project::{Project, Target};
use crate::error::ProjectError;

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StackKind {
    /// Rooted at a procedure definition ("My Block").
    Procedure,
    /// Any other top-level script.
    Plain,
}

/// One stack of a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Stack {
    /// Root block id.
    pub id: String,
    /// 1-based discovery index.
    pub index: usize,
    /// Signature for procedures, `{tag}` text for plain stacks, or empty.
    pub name: String,
    pub kind: StackKind,
}

impl Stack {
    #[must_use]
    pub fn is_procedure(&self) -> bool {
        self.kind == StackKind::Procedure
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            StackKind::Procedure => "procedure",
            StackKind::Plain => "stack",
        };
        if self.name.is_empty() {
            write!(f, "[{}] {kind} with no name", self.index)
        } else {
            write!(f, "[{}] {kind} {}", self.index, self.name)
        }
    }
}

/// Extract the stack name from comment text.
///
/// Takes the text after the first `{` up to the next brace or the end.
#[must_use]
pub fn stack_name_from_text(text: &str) -> String {
    let Some(start) = text.find('{') else {
        return String::new();
    };
    text[start + 1..]
        .split(['{', '}'])
        .next()
        .unwrap_or_default()
        .to_owned()
}

// ---------------------------------------------------------------------------
// ProjectInfo
// ---------------------------------------------------------------------------

/// Read-only index of a project's stacks, computed by one scan.
#[derive(Clone, Debug, Default)]
pub struct ProjectInfo {
    stacks: Vec<Stack>,
    block_by_proccode: HashMap<String, String>,
    proccode_by_block: HashMap<String, String>,
}

impl ProjectInfo {
    /// Scan the program namespace of `project`.
    ///
    /// # Errors
    /// Fails when the project has no sprite, a definition has no usable
    /// prototype, or a stack root points at a missing comment.
    pub fn new(project: &Project) -> Result<Self, ProjectError> {
        Self::from_target(project.sprite()?)
    }

    /// Scan one target's block table.
    ///
    /// # Errors
    /// See [`ProjectInfo::new`].
    pub fn from_target(sprite: &Target) -> Result<Self, ProjectError> {
        let mut info = Self::default();
        for (id, block) in sprite.iter_blocks() {
            if !block.is_stack_root() {
                continue;
            }
            let index = info.stacks.len() + 1;
            if block.is_definition() {
                let proccode = sprite
                    .prototype_of(id)?
                    .proccode()
                    .unwrap_or_default()
                    .to_owned();
                info.block_by_proccode
                    .entry(proccode.clone())
                    .or_insert_with(|| id.to_owned());
                info.proccode_by_block.insert(id.to_owned(), proccode.clone());
                info.stacks.push(Stack {
                    id: id.to_owned(),
                    index,
                    name: proccode,
                    kind: StackKind::Procedure,
                });
            } else {
                let name = match block.comment.as_deref() {
                    Some(comment_id) => {
                        let comment = sprite.comments.get(comment_id).ok_or_else(|| {
                            ProjectError::UnknownComment {
                                id: comment_id.to_owned(),
                                block: id.to_owned(),
                            }
                        })?;
                        stack_name_from_text(&comment.text)
                    }
                    None => String::new(),
                };
                info.stacks.push(Stack {
                    id: id.to_owned(),
                    index,
                    name,
                    kind: StackKind::Plain,
                });
            }
        }
        Ok(info)
    }

    /// Every stack, in discovery order.
    #[must_use]
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    /// Procedure stacks only.
    pub fn procedures(&self) -> impl Iterator<Item = &Stack> + '_ {
        self.stacks.iter().filter(|s| s.is_procedure())
    }

    /// Exact name matches, or prefix matches when nothing matches exactly.
    #[must_use]
    pub fn stacks_by_name(&self, name: &str) -> Vec<&Stack> {
        let exact: Vec<&Stack> = self.stacks.iter().filter(|s| s.name == name).collect();
        if !exact.is_empty() {
            return exact;
        }
        self.stacks
            .iter()
            .filter(|s| s.name.starts_with(name))
            .collect()
    }

    #[must_use]
    pub fn stack_by_index(&self, index: usize) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.index == index)
    }

    #[must_use]
    pub fn stack_by_id(&self, id: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.id == id)
    }

    /// Every procedure implementing `proccode`.
    #[must_use]
    pub fn procedures_named(&self, proccode: &str) -> Vec<&Stack> {
        self.procedures().filter(|s| s.name == proccode).collect()
    }

    /// Every plain stack whose name is exactly `name`.
    #[must_use]
    pub fn plain_stacks_named(&self, name: &str) -> Vec<&Stack> {
        self.stacks
            .iter()
            .filter(|s| s.kind == StackKind::Plain && s.name == name)
            .collect()
    }

    /// Definition block implementing a signature (first in table order).
    #[must_use]
    pub fn block_for_proccode(&self, proccode: &str) -> Option<&str> {
        self.block_by_proccode.get(proccode).map(String::as_str)
    }

    /// Signature implemented by a definition block.
    #[must_use]
    pub fn proccode_for_block(&self, block_id: &str) -> Option<&str> {
        self.proccode_by_block.get(block_id).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
