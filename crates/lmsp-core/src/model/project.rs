//! The project document: targets and their namespaces.
//!
//! A project holds a list of targets. The stage (`isStage: true`) is the
//! global namespace and owns broadcast channels. The first non-stage target
//! (the single sprite of an LMSP project) is the program namespace and owns
//! blocks, variables, lists and comments.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::block::{Block, BlockEntry, shift_coordinate};
use crate::error::ProjectError;

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A loaded project document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Stage first, then sprites.
    pub targets: Vec<Target>,
    /// `monitors`, `extensions`, `meta`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    /// Parse a project from its JSON text.
    ///
    /// # Errors
    /// Returns [`ProjectError::Json`] when the text is not a project document.
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize back to JSON text.
    ///
    /// # Errors
    /// Returns [`ProjectError::Json`] if serialization fails.
    pub fn to_json(&self, pretty: bool) -> Result<String, ProjectError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// The global namespace.
    ///
    /// # Errors
    /// Returns [`ProjectError::MissingTarget`] when no target is the stage.
    pub fn stage(&self) -> Result<&Target, ProjectError> {
        self.targets
            .iter()
            .find(|t| t.is_stage)
            .ok_or(ProjectError::MissingTarget { role: "stage" })
    }

    /// The program namespace.
    ///
    /// # Errors
    /// Returns [`ProjectError::MissingTarget`] when there is no sprite.
    pub fn sprite(&self) -> Result<&Target, ProjectError> {
        self.targets
            .iter()
            .find(|t| !t.is_stage)
            .ok_or(ProjectError::MissingTarget { role: "sprite" })
    }

    /// Mutable program namespace.
    ///
    /// # Errors
    /// Returns [`ProjectError::MissingTarget`] when there is no sprite.
    pub fn sprite_mut(&mut self) -> Result<&mut Target, ProjectError> {
        self.targets
            .iter_mut()
            .find(|t| !t.is_stage)
            .ok_or(ProjectError::MissingTarget { role: "sprite" })
    }

    /// Mutable stage and sprite at once.
    ///
    /// # Errors
    /// Returns [`ProjectError::MissingTarget`] when either is absent.
    pub fn namespaces_mut(&mut self) -> Result<(&mut Target, &mut Target), ProjectError> {
        let mut stage = None;
        let mut sprite = None;
        for target in &mut self.targets {
            if target.is_stage {
                if stage.is_none() {
                    stage = Some(target);
                }
            } else if sprite.is_none() {
                sprite = Some(target);
            }
        }
        match (stage, sprite) {
            (Some(stage), Some(sprite)) => Ok((stage, sprite)),
            (None, _) => Err(ProjectError::MissingTarget { role: "stage" }),
            (_, None) => Err(ProjectError::MissingTarget { role: "sprite" }),
        }
    }

    /// Every id defined anywhere in the document: blocks, variables, lists,
    /// broadcasts and comments of every target.
    pub fn all_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.targets.iter().flat_map(|t| {
            t.blocks
                .keys()
                .chain(t.variables.keys())
                .chain(t.lists.keys())
                .chain(t.broadcasts.keys())
                .chain(t.comments.keys())
                .map(String::as_str)
        })
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// A stage or sprite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "isStage", default)]
    pub is_stage: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub variables: IndexMap<String, Variable>,
    #[serde(default)]
    pub lists: IndexMap<String, Variable>,
    #[serde(default)]
    pub broadcasts: IndexMap<String, String>,
    #[serde(default)]
    pub blocks: IndexMap<String, BlockEntry>,
    #[serde(default)]
    pub comments: IndexMap<String, Comment>,
    /// Costumes, sounds, layer order, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Target {
    /// Look up a block; loose primitives are not blocks.
    #[must_use]
    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)?.as_block()
    }

    pub fn block_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.get_mut(id)?.as_block_mut()
    }

    /// All blocks in table order, skipping loose primitives.
    pub fn iter_blocks(&self) -> impl Iterator<Item = (&str, &Block)> + '_ {
        self.blocks
            .iter()
            .filter_map(|(id, entry)| Some((id.as_str(), entry.as_block()?)))
    }

    /// Resolve the prototype block of a procedure definition.
    ///
    /// # Errors
    /// Returns [`ProjectError::MalformedDefinition`] when the definition has
    /// no `custom_block` input, the prototype is missing, or it carries no
    /// signature.
    pub fn prototype_of(&self, definition_id: &str) -> Result<&Block, ProjectError> {
        let malformed = |reason: String| ProjectError::MalformedDefinition {
            block: definition_id.to_owned(),
            reason,
        };
        let definition = self.block(definition_id).ok_or_else(|| ProjectError::UnknownBlock {
            id: definition_id.to_owned(),
        })?;
        let proto_id = definition
            .prototype_id()
            .ok_or_else(|| malformed("missing custom_block input".to_owned()))?;
        let proto = self
            .block(proto_id)
            .ok_or_else(|| malformed(format!("prototype `{proto_id}` not found")))?;
        if proto.proccode().is_none() {
            return Err(malformed(format!("prototype `{proto_id}` has no proccode")));
        }
        Ok(proto)
    }
}

// ---------------------------------------------------------------------------
// Variable
// ---------------------------------------------------------------------------

/// A variable or list: `[displayName, value, ...]`.
///
/// Lists share the layout with the value slot holding an array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable(pub Vec<Value>);

impl Variable {
    #[must_use]
    pub fn new(name: &str, value: Value) -> Self {
        Self(vec![Value::String(name.to_owned()), value])
    }

    /// Display name; empty when the entry is malformed.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.first().and_then(Value::as_str).unwrap_or_default()
    }

    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.0.get(1)
    }
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// A positioned text note, optionally attached to a block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub x: Option<Number>,
    #[serde(default)]
    pub y: Option<Number>,
    #[serde(default)]
    pub text: String,
    /// Set while `x`/`y` hold an offset from the owning stack's root.
    #[serde(skip)]
    pub relative: bool,
    /// `width`, `height`, `minimized`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Comment {
    /// Shift the position by `(dx, dy)`. Missing coordinates stay missing.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x = self.x.as_ref().map(|x| shift_coordinate(x, dx));
        self.y = self.y.as_ref().map(|y| shift_coordinate(y, dy));
    }

    /// Position as floats; missing coordinates stay missing.
    #[must_use]
    pub fn position(&self) -> (Option<f64>, Option<f64>) {
        (
            self.x.as_ref().and_then(Number::as_f64),
            self.y.as_ref().and_then(Number::as_f64),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
