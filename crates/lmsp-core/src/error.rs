//! Error types for project inspection and merge.
//!
//! [`ProjectError`] is the single error type returned by the document model,
//! the reference tracer and the merge engine. Every variant names the
//! offending id or name so a failed merge can be diagnosed from the message
//! alone.

use thiserror::Error;

use crate::model::SymbolKind;

/// Errors raised while reading or merging a project document.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The document could not be parsed as a project.
    #[error("invalid project document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document lacks the stage or sprite target.
    #[error("project has no {role} target")]
    MissingTarget {
        /// `"stage"` or `"sprite"`.
        role: &'static str,
    },

    /// A block id does not resolve in the block table.
    #[error("unknown block `{id}`")]
    UnknownBlock {
        /// The id that was looked up.
        id: String,
    },

    /// A field or input references a variable, list or broadcast that does
    /// not exist.
    #[error("block `{block}` references unknown {kind} `{id}`")]
    UnknownSymbol {
        /// Which namespace the reference points into.
        kind: SymbolKind,
        /// The unresolved symbol id.
        id: String,
        /// The block holding the reference.
        block: String,
    },

    /// A procedure call names a signature with no definition in the project.
    #[error("no definition found for procedure `{proccode}`")]
    UnknownProcedure {
        /// The signature string of the call.
        proccode: String,
    },

    /// A block points at a comment that does not exist.
    #[error("block `{block}` references unknown comment `{id}`")]
    UnknownComment {
        /// The missing comment id.
        id: String,
        /// The block holding the reference.
        block: String,
    },

    /// A procedure definition has no usable prototype.
    #[error("procedure definition `{block}` is malformed: {reason}")]
    MalformedDefinition {
        /// The definition block id.
        block: String,
        /// What is missing.
        reason: String,
    },

    /// A mutation's `argumentids` is not a JSON array of strings.
    #[error("block `{block}` has invalid argument ids: {source}")]
    InvalidArgumentIds {
        /// The call or prototype block.
        block: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A copied block points at an id outside the traced closure.
    #[error("block `{block}` references `{id}`, which is not part of the copied blocks")]
    DanglingReference {
        /// The block holding the reference.
        block: String,
        /// The unmapped id.
        id: String,
    },

    /// Following `parent` links never reaches a stack root.
    #[error("parent chain of block `{id}` contains a cycle")]
    ParentCycle {
        /// The block the walk started from.
        id: String,
    },

    /// A name-based lookup matched more than one target entry.
    #[error("{kind} `{name}` matches {count} entries in the target project")]
    Ambiguous {
        /// What was being looked up (`"variable"`, `"procedure"`, ...).
        kind: &'static str,
        /// The display name or signature.
        name: String,
        /// How many entries matched.
        count: usize,
    },

    /// The id generator ran out of attempts.
    #[error("could not generate a free id after {attempts} attempts")]
    IdSpaceExhausted {
        /// Number of candidates drawn before giving up.
        attempts: usize,
    },
}
