//! Merge decisions as observable events.
//!
//! The engine reports each link, copy, delete and call-site remap to a
//! [`MergeListener`]. Listeners are observational only; nothing they do
//! feeds back into the merge.

use std::fmt;

use serde::Serialize;

/// What the engine decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MergeAction {
    /// Reuse an existing target symbol with the same name.
    Link,
    /// Insert a new entry into the target.
    Copy,
    /// Remove a superseded target stack.
    Delete,
    /// Rewrite a target call site to a redefined procedure's argument ids.
    Remap,
}

impl fmt::Display for MergeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Link => "LINK",
            Self::Copy => "COPY",
            Self::Delete => "DELETE",
            Self::Remap => "REMAP",
        };
        f.write_str(s)
    }
}

/// What the decision was about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Variable,
    List,
    Broadcast,
    Procedure,
    Stack,
    Call,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Variable => "variable",
            Self::List => "list",
            Self::Broadcast => "broadcast",
            Self::Procedure => "procedure",
            Self::Stack => "stack",
            Self::Call => "call",
        };
        f.write_str(s)
    }
}

impl From<crate::model::SymbolKind> for EventKind {
    fn from(kind: crate::model::SymbolKind) -> Self {
        use crate::model::SymbolKind;
        match kind {
            SymbolKind::Variable => Self::Variable,
            SymbolKind::List => Self::List,
            SymbolKind::Broadcast => Self::Broadcast,
        }
    }
}

/// One merge decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergeEvent {
    pub action: MergeAction,
    pub kind: EventKind,
    /// Display name, signature or stack name.
    pub name: String,
    /// Id in the document the entry came from (source, or target for deletes
    /// and remaps).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_id: Option<String>,
    /// Id the entry has in the merged document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_id: Option<String>,
}

impl MergeEvent {
    #[must_use]
    pub fn new(action: MergeAction, kind: EventKind, name: impl Into<String>) -> Self {
        Self {
            action,
            kind,
            name: name.into(),
            old_id: None,
            new_id: None,
        }
    }

    #[must_use]
    pub fn old_id(mut self, id: impl Into<String>) -> Self {
        self.old_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn new_id(mut self, id: impl Into<String>) -> Self {
        self.new_id = Some(id.into());
        self
    }
}

impl fmt::Display for MergeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.action, self.kind, self.name)
    }
}

/// Receives merge decisions as they are made.
pub trait MergeListener {
    fn on_event(&mut self, event: &MergeEvent);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullListener;

impl MergeListener for NullListener {
    fn on_event(&mut self, _event: &MergeEvent) {}
}

/// Collects events, mostly for tests.
impl MergeListener for Vec<MergeEvent> {
    fn on_event(&mut self, event: &MergeEvent) {
        self.push(event.clone());
    }
}
