//! Reference tracer: the closure of blocks and symbols a set of stacks needs.
//!
//! Starting from one or more seed blocks, the tracer walks the children
//! relation depth-first and records every variable, list and broadcast a
//! visited block references, plus every procedure signature it calls. With
//! `follow_procedures` set, the body of each called procedure joins the
//! closure too.
//!
//! # Counting
//!
//! Symbols are keyed by id (procedures by signature) and never inserted
//! twice; repeat references bump `count`. A procedure reached only because
//! its definition was visited directly is registered with a count of zero,
//! so counts always equal the number of call blocks in the closure.
//!
//! # Termination
//!
//! Visited blocks are tracked by id, so mutually recursive procedures and
//! blocks reachable along several paths are visited exactly once.

use std::collections::HashMap;

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;

use crate::error::ProjectError;
use crate::model::{Block, BlockGraph, Project, SymbolKind, Target, Variable};

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

/// One referenced variable, list or broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolUse<'a, T> {
    /// Display name in the defining namespace.
    pub name: &'a str,
    /// The stored entry.
    pub data: &'a T,
    /// Number of references seen.
    pub count: usize,
}

/// One called procedure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcedureUse<'a> {
    /// Definition block implementing the signature.
    pub definition: &'a str,
    /// Number of call blocks seen.
    pub count: usize,
}

/// Accumulated closure, borrowed from the traced project.
///
/// Every map keeps first-reference order.
#[derive(Clone, Debug, Default)]
pub struct Usage<'a> {
    pub variables: IndexMap<&'a str, SymbolUse<'a, Variable>>,
    pub lists: IndexMap<&'a str, SymbolUse<'a, Variable>>,
    pub broadcasts: IndexMap<&'a str, SymbolUse<'a, String>>,
    /// Keyed by signature.
    pub procedures: IndexMap<&'a str, ProcedureUse<'a>>,
    /// Visited blocks in visit order.
    pub blocks: IndexMap<&'a str, &'a Block>,
}

impl Usage<'_> {
    /// Whether `id` was visited.
    #[must_use]
    pub fn contains_block(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }
}

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Procedure,
    Broadcast,
    Variable,
    List,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Procedure => "procedure",
            Self::Broadcast => "broadcast",
            Self::Variable => "variable",
            Self::List => "list",
        };
        f.write_str(s)
    }
}

/// Flattened, owned view of one traced symbol, for reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    /// Symbol id, or the definition block id for procedures.
    pub id: String,
    pub name: String,
    pub count: usize,
}

impl Reference {
    fn new(kind: ReferenceKind, id: &str, name: &str, count: usize) -> Self {
        Self {
            kind,
            id: id.to_owned(),
            name: name.to_owned(),
            count,
        }
    }
}

// ---------------------------------------------------------------------------
// ReferenceTracer
// ---------------------------------------------------------------------------

/// Depth-first closure over one project.
#[derive(Debug)]
pub struct ReferenceTracer<'a> {
    stage: &'a Target,
    sprite: &'a Target,
    graph: BlockGraph,
    /// Signature → definition block, first in table order.
    definitions: HashMap<&'a str, &'a str>,
    follow_procedures: bool,
    usage: Usage<'a>,
}

impl<'a> ReferenceTracer<'a> {
    /// Prepare a tracer over `project`.
    ///
    /// Definitions without a usable prototype are left out of the signature
    /// index; calling one of them fails later as an unknown procedure.
    ///
    /// # Errors
    /// Returns [`ProjectError::MissingTarget`] if the stage or sprite is absent.
    pub fn new(project: &'a Project, follow_procedures: bool) -> Result<Self, ProjectError> {
        let stage = project.stage()?;
        let sprite = project.sprite()?;

        let mut definitions = HashMap::new();
        for (id, block) in sprite.iter_blocks() {
            if !block.is_definition() {
                continue;
            }
            let Some(proccode) = sprite.prototype_of(id).ok().and_then(Block::proccode) else {
                continue;
            };
            definitions.entry(proccode).or_insert(id);
        }

        Ok(Self {
            stage,
            sprite,
            graph: BlockGraph::new(sprite),
            definitions,
            follow_procedures,
            usage: Usage::default(),
        })
    }

    /// Seed the closure with one root. Re-adding a visited block is a no-op.
    ///
    /// # Errors
    /// Fails when the seed or any visited reference does not resolve. The
    /// usage gathered up to the failure is kept but incomplete.
    pub fn add(&mut self, block_id: &str) -> Result<&mut Self, ProjectError> {
        let (seed, _) = self.lookup(block_id)?;
        let mut pending = vec![seed];

        while let Some(id) = pending.pop() {
            if self.usage.contains_block(id) {
                continue;
            }
            let (id, block) = self.lookup(id)?;
            self.usage.blocks.insert(id, block);

            for (kind, symbol) in block.symbol_refs() {
                self.record_symbol(kind, symbol, id)?;
            }

            let mut follow = None;
            if block.is_call() {
                let proccode = block.proccode().ok_or_else(|| ProjectError::UnknownProcedure {
                    proccode: String::new(),
                })?;
                follow = self.record_call(proccode)?;
            } else if block.is_definition() && self.follow_procedures {
                self.record_definition(id)?;
            }

            let sprite = self.sprite;
            let mut children = Vec::new();
            for child in self.graph.children(id) {
                let (child, _) = sprite
                    .blocks
                    .get_key_value(child)
                    .ok_or_else(|| ProjectError::UnknownBlock { id: child.to_owned() })?;
                children.push(child.as_str());
            }
            pending.extend(children.into_iter().rev());
            // Visited next, ahead of this block's children.
            pending.extend(follow);
        }
        Ok(self)
    }

    /// The closure gathered so far.
    #[must_use]
    pub const fn usage(&self) -> &Usage<'a> {
        &self.usage
    }

    #[must_use]
    pub fn into_usage(self) -> Usage<'a> {
        self.usage
    }

    /// Procedures, then broadcasts, variables and lists.
    #[must_use]
    pub fn list(&self) -> Vec<Reference> {
        let usage = &self.usage;
        let mut out = Vec::with_capacity(
            usage.procedures.len() + usage.broadcasts.len() + usage.variables.len() + usage.lists.len(),
        );
        for (proccode, p) in &usage.procedures {
            out.push(Reference::new(ReferenceKind::Procedure, p.definition, proccode, p.count));
        }
        for (id, u) in &usage.broadcasts {
            out.push(Reference::new(ReferenceKind::Broadcast, id, u.name, u.count));
        }
        for (id, u) in &usage.variables {
            out.push(Reference::new(ReferenceKind::Variable, id, u.name, u.count));
        }
        for (id, u) in &usage.lists {
            out.push(Reference::new(ReferenceKind::List, id, u.name, u.count));
        }
        out
    }

    // -- internals --

    fn lookup(&self, id: &str) -> Result<(&'a str, &'a Block), ProjectError> {
        let sprite = self.sprite;
        sprite
            .blocks
            .get_key_value(id)
            .and_then(|(key, entry)| Some((key.as_str(), entry.as_block()?)))
            .ok_or_else(|| ProjectError::UnknownBlock { id: id.to_owned() })
    }

    fn record_symbol(
        &mut self,
        kind: SymbolKind,
        symbol: &str,
        block: &str,
    ) -> Result<(), ProjectError> {
        let (stage, sprite) = (self.stage, self.sprite);
        let found = match kind {
            SymbolKind::Variable => {
                bump(&mut self.usage.variables, &sprite.variables, symbol, Variable::name)
            }
            SymbolKind::List => bump(&mut self.usage.lists, &sprite.lists, symbol, Variable::name),
            SymbolKind::Broadcast => {
                bump(&mut self.usage.broadcasts, &stage.broadcasts, symbol, String::as_str)
            }
        };
        if found {
            Ok(())
        } else {
            Err(ProjectError::UnknownSymbol {
                kind,
                id: symbol.to_owned(),
                block: block.to_owned(),
            })
        }
    }

    /// Count a call. Returns the definition to visit when it is new and
    /// procedures are followed.
    fn record_call(&mut self, proccode: &'a str) -> Result<Option<&'a str>, ProjectError> {
        let definition = *self
            .definitions
            .get(proccode)
            .ok_or_else(|| ProjectError::UnknownProcedure {
                proccode: proccode.to_owned(),
            })?;
        match self.usage.procedures.entry(proccode) {
            Entry::Occupied(mut used) => {
                used.get_mut().count += 1;
                Ok(None)
            }
            Entry::Vacant(slot) => {
                slot.insert(ProcedureUse { definition, count: 1 });
                Ok(self.follow_procedures.then_some(definition))
            }
        }
    }

    fn record_definition(&mut self, id: &'a str) -> Result<(), ProjectError> {
        let sprite = self.sprite;
        let proccode = sprite.prototype_of(id)?.proccode().unwrap_or_default();
        self.usage
            .procedures
            .entry(proccode)
            .or_insert(ProcedureUse {
                definition: id,
                count: 0,
            });
        Ok(())
    }
}

/// Count one reference to `id`, inserting it on first sight.
/// Returns `false` when `id` is not in `table`.
fn bump<'a, T>(
    uses: &mut IndexMap<&'a str, SymbolUse<'a, T>>,
    table: &'a IndexMap<String, T>,
    id: &str,
    name: impl Fn(&'a T) -> &'a str,
) -> bool {
    if let Some(seen) = uses.get_mut(id) {
        seen.count += 1;
        return true;
    }
    let Some((key, data)) = table.get_key_value(id) else {
        return false;
    };
    uses.insert(
        key.as_str(),
        SymbolUse {
            name: name(data),
            data,
            count: 1,
        },
    );
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
