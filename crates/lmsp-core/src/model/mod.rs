//! Project document model.
//!
//! - [`project`]: the serialized document: targets, blocks, symbols, comments.
//! - [`block`]: blocks, fields, inputs and procedure mutations.
//! - [`graph`]: parent → children index with explicit nesting/sequence edges.
//! - [`info`]: derived stacks and procedure lookup.

pub mod block;
pub mod graph;
pub mod info;
pub mod project;

use std::fmt;

use serde::Serialize;

pub use block::{Block, BlockEntry, Field, Input, Mutation, RefTarget};
pub use graph::{BlockGraph, Link};
pub use info::{ProjectInfo, Stack, StackKind};
pub use project::{Comment, Project, Target, Variable};

/// The three symbol namespaces a block can reference by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    /// Program-namespace variable.
    Variable,
    /// Program-namespace list.
    List,
    /// Global broadcast channel.
    Broadcast,
}

impl SymbolKind {
    /// Map a typed input primitive code to the namespace it references.
    ///
    /// `11` broadcast, `12` variable, `13` list; every other code is a literal.
    #[must_use]
    pub const fn from_primitive_code(code: u64) -> Option<Self> {
        match code {
            11 => Some(Self::Broadcast),
            12 => Some(Self::Variable),
            13 => Some(Self::List),
            _ => None,
        }
    }

    /// Map a field name to the namespace its second slot references.
    #[must_use]
    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "VARIABLE" => Some(Self::Variable),
            "LIST" => Some(Self::List),
            "BROADCAST_OPTION" => Some(Self::Broadcast),
            _ => None,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable => write!(f, "variable"),
            Self::List => write!(f, "list"),
            Self::Broadcast => write!(f, "broadcast"),
        }
    }
}
