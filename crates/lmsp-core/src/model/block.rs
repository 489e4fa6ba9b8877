//! Blocks, fields, inputs and procedure mutations.
//!
//! The serialized layout follows the Scratch 3 project format. Keys this
//! crate does not interpret are kept in `extra` maps so a load/save round
//! trip leaves them untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::SymbolKind;

/// Opcode of the hat block wrapping a procedure body.
pub const PROCEDURE_DEFINITION: &str = "procedures_definition";
/// Opcode of the shadow block carrying a procedure's signature.
pub const PROCEDURE_PROTOTYPE: &str = "procedures_prototype";
/// Opcode of a procedure call.
pub const PROCEDURE_CALL: &str = "procedures_call";
/// Input of a definition block that points at its prototype.
pub const CUSTOM_BLOCK_INPUT: &str = "custom_block";

// ---------------------------------------------------------------------------
// BlockEntry
// ---------------------------------------------------------------------------

/// One value of the block table.
///
/// Most entries are full blocks. A reporter dropped loose on the canvas is
/// stored as a bare primitive array (`[12, "name", "id", x, y]`); those are
/// kept verbatim and never form stacks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockEntry {
    /// A regular block.
    Block(Box<Block>),
    /// A loose top-level primitive.
    Primitive(Vec<Value>),
}

impl BlockEntry {
    /// The block, if this entry is one.
    #[must_use]
    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Block(block) => Some(block),
            Self::Primitive(_) => None,
        }
    }

    /// Mutable access to the block, if this entry is one.
    pub fn as_block_mut(&mut self) -> Option<&mut Block> {
        match self {
            Self::Block(block) => Some(block),
            Self::Primitive(_) => None,
        }
    }
}

impl From<Block> for BlockEntry {
    fn from(block: Block) -> Self {
        Self::Block(Box::new(block))
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A single block.
///
/// `parent` is overloaded on disk: it names either the enclosing block or the
/// block immediately before this one in a sequence. [`BlockGraph`] splits the
/// two relations apart; this struct only mirrors the stored layout.
///
/// [`BlockGraph`]: super::BlockGraph
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Operation tag.
    pub opcode: String,
    /// Following block in a sequence.
    #[serde(default)]
    pub next: Option<String>,
    /// Enclosing or preceding block.
    #[serde(default)]
    pub parent: Option<String>,
    /// Named inputs (literal slots or nested blocks).
    #[serde(default)]
    pub inputs: IndexMap<String, Input>,
    /// Named fields (dropdown values, symbol references).
    #[serde(default)]
    pub fields: IndexMap<String, Field>,
    /// Shadow blocks are the default values behind inputs.
    #[serde(default)]
    pub shadow: bool,
    /// Whether this block sits directly on the canvas.
    #[serde(default)]
    pub top_level: bool,
    /// Canvas x; only meaningful for top-level blocks. Kept as the stored
    /// number so integral coordinates are written back without a fraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Number>,
    /// Canvas y; only meaningful for top-level blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Number>,
    /// Opcode-specific metadata (procedure signatures).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<Mutation>,
    /// Attached comment id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Keys not interpreted here.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    /// A bare block with the given opcode and no links.
    #[must_use]
    pub fn new(opcode: impl Into<String>) -> Self {
        Self {
            opcode: opcode.into(),
            next: None,
            parent: None,
            inputs: IndexMap::new(),
            fields: IndexMap::new(),
            shadow: false,
            top_level: false,
            x: None,
            y: None,
            mutation: None,
            comment: None,
            extra: Map::new(),
        }
    }

    /// A top-level, non-shadow block roots a stack.
    #[must_use]
    pub const fn is_stack_root(&self) -> bool {
        self.top_level && !self.shadow
    }

    #[must_use]
    pub fn is_definition(&self) -> bool {
        self.opcode == PROCEDURE_DEFINITION
    }

    #[must_use]
    pub fn is_prototype(&self) -> bool {
        self.opcode == PROCEDURE_PROTOTYPE
    }

    #[must_use]
    pub fn is_call(&self) -> bool {
        self.opcode == PROCEDURE_CALL
    }

    /// The signature carried by this block's mutation, if any.
    #[must_use]
    pub fn proccode(&self) -> Option<&str> {
        self.mutation.as_ref()?.proccode.as_deref()
    }

    /// For a definition block: the id of its prototype block.
    #[must_use]
    pub fn prototype_id(&self) -> Option<&str> {
        self.inputs
            .get(CUSTOM_BLOCK_INPUT)?
            .references()
            .find_map(|(target, id)| matches!(target, RefTarget::Block).then_some(id))
    }

    /// Canvas position, with missing coordinates read as zero.
    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        let read = |n: Option<&Number>| n.and_then(Number::as_f64).unwrap_or(0.0);
        (read(self.x.as_ref()), read(self.y.as_ref()))
    }

    /// Every variable, list and broadcast reference in fields and inputs.
    ///
    /// Repeated references are yielded once per occurrence.
    pub fn symbol_refs(&self) -> impl Iterator<Item = (SymbolKind, &str)> + '_ {
        let fields = self.fields.iter().filter_map(|(name, field)| {
            Some((SymbolKind::from_field_name(name)?, field.reference()?))
        });
        let inputs = self
            .inputs
            .values()
            .flat_map(Input::references)
            .filter_map(|(target, id)| match target {
                RefTarget::Symbol(kind) => Some((kind, id)),
                RefTarget::Block => None,
            });
        fields.chain(inputs)
    }
}

/// Largest magnitude below which every whole `f64` is an exact `i64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// `value + delta`. Integer coordinates stay integers while the sum is whole.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn shift_coordinate(value: &Number, delta: f64) -> Number {
    let sum = value.as_f64().unwrap_or(0.0) + delta;
    let integral = value.is_i64() || value.is_u64();
    if integral && sum.fract() == 0.0 && sum.abs() < MAX_EXACT_INTEGER {
        return Number::from(sum as i64);
    }
    Number::from_f64(sum).unwrap_or_else(|| value.clone())
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

/// Procedure metadata on call and prototype blocks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    /// Signature string: name plus `%s`/`%b` placeholders and labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proccode: Option<String>,
    /// JSON-encoded array of argument ids, in placeholder order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argumentids: Option<String>,
    /// Keys not interpreted here (`tagName`, `warp`, argument names, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Mutation {
    /// Decode `argumentids`. A missing value decodes to an empty list.
    ///
    /// # Errors
    /// Returns the JSON error when the value is not an array of strings.
    pub fn argument_ids(&self) -> Result<Vec<String>, serde_json::Error> {
        self.argumentids
            .as_deref()
            .map_or_else(|| Ok(Vec::new()), serde_json::from_str)
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// A field value: `[value]` or `[value, referencedId]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Field(pub Vec<Value>);

impl Field {
    /// The displayed value.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.0.first()
    }

    /// The referenced symbol id, when the second slot holds one.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.0.get(1)?.as_str()
    }

    /// Replace the referenced id. No-op for fields without a reference slot.
    pub fn set_reference(&mut self, id: String) {
        if let Some(slot) = self.0.get_mut(1) {
            *slot = Value::String(id);
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// What an id inside an input slot points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefTarget {
    /// A nested block (reporter, shadow, substack).
    Block,
    /// A typed primitive referencing a symbol.
    Symbol(SymbolKind),
}

/// An input: `[shadowKind, slot, obscuredShadow?]`.
///
/// Every slot after the first is `null`, a block id, or a primitive array.
/// Typed primitives `[11|12|13, name, id, ...]` reference a broadcast,
/// variable or list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Input(pub Vec<Value>);

impl Input {
    /// Every id held by this input's slots, in slot order.
    pub fn references(&self) -> impl Iterator<Item = (RefTarget, &str)> + '_ {
        self.0.iter().skip(1).filter_map(slot_reference)
    }

    /// Rewrite every id held by this input's slots.
    ///
    /// # Errors
    /// Propagates the first error returned by `remap`; slots already visited
    /// keep their new value.
    pub fn remap_ids<E>(
        &mut self,
        mut remap: impl FnMut(RefTarget, &str) -> Result<String, E>,
    ) -> Result<(), E> {
        for slot in self.0.iter_mut().skip(1) {
            match slot {
                Value::String(id) => *id = remap(RefTarget::Block, id)?,
                Value::Array(primitive) => {
                    let Some(kind) = primitive_kind(primitive) else {
                        continue;
                    };
                    if let Some(Value::String(id)) = primitive.get_mut(2) {
                        *id = remap(RefTarget::Symbol(kind), id)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn primitive_kind(primitive: &[Value]) -> Option<SymbolKind> {
    primitive
        .first()?
        .as_u64()
        .and_then(SymbolKind::from_primitive_code)
}

fn slot_reference(slot: &Value) -> Option<(RefTarget, &str)> {
    match slot {
        Value::String(id) => Some((RefTarget::Block, id)),
        Value::Array(primitive) => {
            let kind = primitive_kind(primitive)?;
            Some((RefTarget::Symbol(kind), primitive.get(2)?.as_str()?))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(value: Value) -> Block {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn deserialize_keeps_unknown_keys() {
        let b = block(json!({
            "opcode": "motion_movesteps",
            "next": null,
            "parent": "p",
            "inputs": {},
            "fields": {},
            "shadow": false,
            "topLevel": false,
            "customKey": 7
        }));
        assert_eq!(b.parent.as_deref(), Some("p"));
        assert_eq!(b.extra.get("customKey"), Some(&json!(7)));

        let back = serde_json::to_value(&b).unwrap();
        assert_eq!(back["customKey"], json!(7));
        assert_eq!(back["next"], Value::Null);
        assert!(back.get("x").is_none());
        assert!(back.get("mutation").is_none());
    }

    #[test]
    fn coordinates_keep_their_number_form() {
        let b = block(json!({ "opcode": "event_whenflagclicked", "topLevel": true, "x": 100, "y": -12.5 }));
        assert_eq!(b.position(), (100.0, -12.5));
        let text = serde_json::to_string(&b).unwrap();
        assert!(text.contains(r#""x":100,"#), "{text}");
        assert!(text.contains(r#""y":-12.5"#), "{text}");
    }

    #[test]
    fn shift_coordinate_stays_integral() {
        assert_eq!(shift_coordinate(&Number::from(100), -30.0), Number::from(70));
        assert_eq!(shift_coordinate(&Number::from(100), 0.5).as_f64(), Some(100.5));
        let float = Number::from_f64(2.5).unwrap();
        assert_eq!(shift_coordinate(&float, 0.5).as_f64(), Some(3.0));
        assert!(shift_coordinate(&float, 0.5).is_f64());
    }

    #[test]
    fn loose_primitive_entry() {
        let entry: BlockEntry = serde_json::from_value(json!([12, "x", "v1", 10, 20])).unwrap();
        assert!(entry.as_block().is_none());
        assert!(matches!(entry, BlockEntry::Primitive(ref p) if p.len() == 5));
    }

    #[test]
    fn symbol_refs_from_fields_and_inputs() {
        let b = block(json!({
            "opcode": "data_setvariableto",
            "inputs": {
                "VALUE": [3, [12, "y", "v2"], [10, "0"]],
                "MSG": [1, [11, "go", "b1"]],
                "ITEMS": [3, [13, "items", "l1"], [10, ""]],
                "NUM": [1, [4, "10"]]
            },
            "fields": {
                "VARIABLE": ["x", "v1"],
                "OTHER": ["a", "ignored"]
            }
        }));
        let refs: Vec<_> = b.symbol_refs().collect();
        assert_eq!(
            refs,
            vec![
                (SymbolKind::Variable, "v1"),
                (SymbolKind::Variable, "v2"),
                (SymbolKind::Broadcast, "b1"),
                (SymbolKind::List, "l1"),
            ]
        );
    }

    #[test]
    fn field_without_reference() {
        let f = Field(vec![json!("x"), Value::Null]);
        assert_eq!(f.reference(), None);
        let mut g = Field(vec![json!("x")]);
        g.set_reference("new".to_owned());
        assert_eq!(g.0.len(), 1);
    }

    #[test]
    fn prototype_id_from_custom_block() {
        let def = block(json!({
            "opcode": PROCEDURE_DEFINITION,
            "inputs": { "custom_block": [1, "proto"] },
            "topLevel": true
        }));
        assert_eq!(def.prototype_id(), Some("proto"));
        assert!(def.is_definition());
        assert!(def.is_stack_root());
    }

    #[test]
    fn remap_rewrites_every_slot() {
        let mut input = Input(vec![json!(3), json!("reporter"), json!("shadow")]);
        input
            .remap_ids(|_, id| Ok::<_, ()>(format!("{id}'")))
            .unwrap();
        assert_eq!(input.0, vec![json!(3), json!("reporter'"), json!("shadow'")]);

        let mut typed = Input(vec![json!(3), json!([12, "x", "v1", 5, 6]), json!([10, "0"])]);
        typed
            .remap_ids(|target, id| {
                assert_eq!(target, RefTarget::Symbol(SymbolKind::Variable));
                Ok::<_, ()>(format!("{id}'"))
            })
            .unwrap();
        assert_eq!(typed.0[1], json!([12, "x", "v1'", 5, 6]));
        assert_eq!(typed.0[2], json!([10, "0"]));
    }

    #[test]
    fn remap_stops_on_error() {
        let mut input = Input(vec![json!(1), json!("a")]);
        let err = input.remap_ids(|_, id| Err::<String, _>(id.to_owned()));
        assert_eq!(err, Err("a".to_owned()));
    }

    #[test]
    fn argument_ids_decode() {
        let m = Mutation {
            proccode: Some("move %s".to_owned()),
            argumentids: Some(r#"["a1","a2"]"#.to_owned()),
            extra: Map::new(),
        };
        assert_eq!(m.argument_ids().unwrap(), vec!["a1", "a2"]);
        assert!(Mutation::default().argument_ids().unwrap().is_empty());

        let bad = Mutation {
            argumentids: Some("not json".to_owned()),
            ..Mutation::default()
        };
        assert!(bad.argument_ids().is_err());
    }
}
