//! Core domain logic for lmsp.
//!
//! Everything here is pure: no file I/O, no console output. Callers load a
//! [`Project`], pick stacks from a [`ProjectInfo`], and hand both documents
//! to [`merge`].
//!
//! # Crate layout
//!
//! - [`model`]: the project document, derived stacks and the block graph.
//! - [`trace`]: the [`ReferenceTracer`] closure walk.
//! - [`merge`]: the merge engine, id generation and merge events.
//! - [`error`]: the [`ProjectError`] enum returned by all of the above.

pub mod error;
pub mod merge;
pub mod model;
pub mod trace;

// Re-export the common entry points at the crate root:
// `use lmsp_core::{Project, ProjectInfo, merge, MergeOptions};`
pub use error::ProjectError;
pub use merge::{
    EventKind, IdGenerator, MergeAction, MergeEvent, MergeListener, MergeOptions, MergeOutput,
    MergeSummary, NullListener, merge, merge_with_rng,
};
pub use model::{
    Block, BlockEntry, BlockGraph, Comment, Field, Input, Link, Mutation, Project, ProjectInfo,
    RefTarget, Stack, StackKind, SymbolKind, Target, Variable,
};
pub use trace::{Reference, ReferenceKind, ReferenceTracer, Usage};
