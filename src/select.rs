//! Stack selection.
//!
//! Turns user input into the validated stack list the merge engine expects:
//! non-empty, duplicate-free, every name resolving to exactly one stack.

use std::collections::HashSet;
use std::fmt;

use lmsp_core::{ProjectInfo, Stack, StackKind};

/// Why a selection could not be made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    /// No stack identifiers were given.
    Empty,

    /// A numeric identifier is outside `1..=count`.
    UnknownIndex {
        index: usize,
        /// Number of stacks in the project.
        count: usize,
    },

    /// A name matches no stack, exactly or by prefix.
    UnknownName { name: String },

    /// A name matches several stacks.
    AmbiguousName {
        name: String,
        /// Display form of every candidate.
        candidates: Vec<String>,
    },

    /// Several source stacks share a name that also exists in the target.
    DuplicateSource {
        name: String,
        candidates: Vec<String>,
    },

    /// A source stack's name exists more than once in the target.
    AmbiguousTarget {
        name: String,
        candidates: Vec<String>,
    },
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no stacks selected"),
            Self::UnknownIndex { index, count } => {
                write!(f, "no stack with index {index} (project has {count} stacks)")
            }
            Self::UnknownName { name } => {
                write!(f, "no stack named '{name}'\n  To fix: run 'lmsp list <file>' to see stack names")
            }
            Self::AmbiguousName { name, candidates } => {
                write!(f, "'{name}' matches several stacks:")?;
                write_candidates(f, candidates)?;
                write!(f, "\n  To fix: use the full name or the stack index")
            }
            Self::DuplicateSource { name, candidates } => {
                write!(f, "source has several stacks named '{name}':")?;
                write_candidates(f, candidates)
            }
            Self::AmbiguousTarget { name, candidates } => {
                write!(f, "target has several stacks named '{name}':")?;
                write_candidates(f, candidates)?;
                write!(f, "\n  To fix: rename or remove the duplicates in the target")
            }
        }
    }
}

fn write_candidates(f: &mut fmt::Formatter<'_>, candidates: &[String]) -> fmt::Result {
    for candidate in candidates {
        write!(f, "\n    {candidate}")?;
    }
    Ok(())
}

impl std::error::Error for SelectError {}

fn describe(stacks: &[&Stack]) -> Vec<String> {
    stacks.iter().map(ToString::to_string).collect()
}

/// Resolve identifiers against `info`.
///
/// Each identifier is a 1-based stack index or a stack name (exact, else
/// prefix). Repeated selections of the same stack are dropped; order
/// follows first mention.
///
/// # Errors
/// Empty input, an unknown index or name, or a name with several matches.
pub fn select_by_ids<S: AsRef<str>>(info: &ProjectInfo, ids: &[S]) -> Result<Vec<Stack>, SelectError> {
    if ids.is_empty() {
        return Err(SelectError::Empty);
    }
    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for id in ids {
        let id = id.as_ref();
        let stack = if let Ok(index) = id.parse::<usize>() {
            info.stack_by_index(index).ok_or(SelectError::UnknownIndex {
                index,
                count: info.stacks().len(),
            })?
        } else {
            let matches = info.stacks_by_name(id);
            match matches.as_slice() {
                [] => {
                    return Err(SelectError::UnknownName {
                        name: id.to_owned(),
                    });
                }
                [single] => *single,
                several => {
                    return Err(SelectError::AmbiguousName {
                        name: id.to_owned(),
                        candidates: describe(several),
                    });
                }
            }
        };
        if seen.insert(stack.id.clone()) {
            selected.push(stack.clone());
        }
    }
    Ok(selected)
}

/// Every source stack that has exactly one counterpart in the target.
///
/// Procedures are matched by signature against target procedures, then
/// named plain stacks against target plain stacks. Unnamed stacks and names
/// absent from the target are skipped. The result may be empty.
///
/// # Errors
/// A matched name that appears more than once on either side.
pub fn select_matching(source: &ProjectInfo, target: &ProjectInfo) -> Result<Vec<Stack>, SelectError> {
    let mut selected = Vec::new();
    for kind in [StackKind::Procedure, StackKind::Plain] {
        let mut seen = HashSet::new();
        for stack in source.stacks().iter().filter(|s| s.kind == kind) {
            if stack.name.is_empty() || !seen.insert(stack.name.as_str()) {
                continue;
            }
            let counterparts = match kind {
                StackKind::Procedure => target.procedures_named(&stack.name),
                StackKind::Plain => target.plain_stacks_named(&stack.name),
            };
            if counterparts.is_empty() {
                continue;
            }
            if counterparts.len() > 1 {
                return Err(SelectError::AmbiguousTarget {
                    name: stack.name.clone(),
                    candidates: describe(&counterparts),
                });
            }
            let twins: Vec<&Stack> = source
                .stacks()
                .iter()
                .filter(|s| s.kind == kind && s.name == stack.name)
                .collect();
            if twins.len() > 1 {
                return Err(SelectError::DuplicateSource {
                    name: stack.name.clone(),
                    candidates: describe(&twins),
                });
            }
            tracing::debug!(stack = %stack, "matched target stack");
            selected.push(stack.clone());
        }
    }
    Ok(selected)
}
