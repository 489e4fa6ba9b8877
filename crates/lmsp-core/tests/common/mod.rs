//! Shared fixture builder for lmsp-core integration tests.
//!
//! Projects are assembled as JSON and parsed through the real model, so
//! every fixture exercises the same deserialization path as a loaded file.

#![allow(dead_code)]

use std::collections::HashSet;

use lmsp_core::{BlockGraph, Project, ProjectInfo, RefTarget, Stack, SymbolKind};
use serde_json::{Map, Value, json};

/// Incrementally built two-target project (stage + one sprite).
#[derive(Default)]
pub struct ProjectBuilder {
    broadcasts: Map<String, Value>,
    variables: Map<String, Value>,
    lists: Map<String, Value>,
    blocks: Map<String, Value>,
    comments: Map<String, Value>,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(mut self, id: &str, name: &str, value: Value) -> Self {
        self.variables.insert(id.into(), json!([name, value]));
        self
    }

    pub fn list(mut self, id: &str, name: &str, items: Value) -> Self {
        self.lists.insert(id.into(), json!([name, items]));
        self
    }

    pub fn broadcast(mut self, id: &str, name: &str) -> Self {
        self.broadcasts.insert(id.into(), json!(name));
        self
    }

    /// Insert a raw block value.
    pub fn block(mut self, id: &str, value: Value) -> Self {
        self.blocks.insert(id.into(), value);
        self
    }

    /// A top-level hat block. `next` may be `None`.
    pub fn hat(self, id: &str, next: Option<&str>, x: f64, y: f64) -> Self {
        self.block(
            id,
            json!({
                "opcode": "flipperevents_whenProgramStarts",
                "next": next, "parent": null,
                "inputs": {}, "fields": {},
                "shadow": false, "topLevel": true, "x": x, "y": y
            }),
        )
    }

    /// A stack block setting `var_id` to a literal.
    pub fn set_variable(
        self,
        id: &str,
        parent: &str,
        next: Option<&str>,
        var_name: &str,
        var_id: &str,
    ) -> Self {
        self.block(
            id,
            json!({
                "opcode": "data_setvariableto",
                "next": next, "parent": parent,
                "inputs": { "VALUE": [1, [10, "0"]] },
                "fields": { "VARIABLE": [var_name, var_id] },
                "shadow": false, "topLevel": false
            }),
        )
    }

    /// A broadcast block sending `broadcast_id`.
    pub fn send(self, id: &str, parent: &str, next: Option<&str>, name: &str, broadcast_id: &str) -> Self {
        self.block(
            id,
            json!({
                "opcode": "event_broadcast",
                "next": next, "parent": parent,
                "inputs": { "BROADCAST_INPUT": [1, [11, name, broadcast_id]] },
                "fields": {},
                "shadow": false, "topLevel": false
            }),
        )
    }

    /// A procedure definition with its prototype and argument reporters.
    ///
    /// Reporter blocks are keyed `<proto>_<arg>`.
    pub fn procedure(
        mut self,
        def: &str,
        proto: &str,
        proccode: &str,
        args: &[&str],
        body: Option<&str>,
        x: f64,
        y: f64,
    ) -> Self {
        let argumentids = serde_json::to_string(args).unwrap_or_default();
        let mut proto_inputs = Map::new();
        for arg in args {
            let reporter = format!("{proto}_{arg}");
            proto_inputs.insert((*arg).into(), json!([1, reporter]));
            self.blocks.insert(
                reporter,
                json!({
                    "opcode": "argument_reporter_string_number",
                    "next": null, "parent": proto,
                    "inputs": {}, "fields": { "VALUE": [arg, null] },
                    "shadow": true, "topLevel": false
                }),
            );
        }
        self.blocks.insert(
            def.into(),
            json!({
                "opcode": "procedures_definition",
                "next": body, "parent": null,
                "inputs": { "custom_block": [1, proto] },
                "fields": {},
                "shadow": false, "topLevel": true, "x": x, "y": y
            }),
        );
        self.blocks.insert(
            proto.into(),
            json!({
                "opcode": "procedures_prototype",
                "next": null, "parent": def,
                "inputs": proto_inputs,
                "fields": {},
                "shadow": true, "topLevel": false,
                "mutation": {
                    "tagName": "mutation", "children": [],
                    "proccode": proccode, "argumentids": argumentids,
                    "warp": "false"
                }
            }),
        );
        self
    }

    /// A call block binding each argument id to a number literal.
    pub fn call(
        self,
        id: &str,
        parent: &str,
        next: Option<&str>,
        proccode: &str,
        args: &[(&str, &str)],
    ) -> Self {
        let ids: Vec<&str> = args.iter().map(|(arg, _)| *arg).collect();
        let argumentids = serde_json::to_string(&ids).unwrap_or_default();
        let inputs: Map<String, Value> = args
            .iter()
            .map(|(arg, value)| ((*arg).to_owned(), json!([1, [4, value]])))
            .collect();
        self.block(
            id,
            json!({
                "opcode": "procedures_call",
                "next": next, "parent": parent,
                "inputs": inputs, "fields": {},
                "shadow": false, "topLevel": false,
                "mutation": {
                    "tagName": "mutation", "children": [],
                    "proccode": proccode, "argumentids": argumentids,
                    "warp": "false"
                }
            }),
        )
    }

    /// Attach comment `id` to `block` at an absolute position.
    pub fn comment(mut self, id: &str, block: &str, x: f64, y: f64, text: &str) -> Self {
        self.comments.insert(
            id.into(),
            json!({
                "blockId": block, "x": x, "y": y,
                "width": 200, "height": 100, "minimized": false, "text": text
            }),
        );
        if let Some(Value::Object(b)) = self.blocks.get_mut(block) {
            b.insert("comment".into(), json!(id));
        }
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "targets": [
                {
                    "isStage": true, "name": "Stage",
                    "variables": {}, "lists": {},
                    "broadcasts": self.broadcasts,
                    "blocks": {}, "comments": {},
                    "currentCostume": 0, "costumes": [], "sounds": [], "volume": 100
                },
                {
                    "isStage": false, "name": "Hub",
                    "variables": self.variables,
                    "lists": self.lists,
                    "broadcasts": {},
                    "blocks": self.blocks,
                    "comments": self.comments,
                    "currentCostume": 0, "costumes": [], "sounds": [], "volume": 100
                }
            ],
            "monitors": [],
            "extensions": ["flipperevents"],
            "meta": { "semver": "3.0.0", "vm": "0.2.0", "agent": "" }
        })
    }

    pub fn build(&self) -> Project {
        serde_json::from_value(self.to_json()).expect("fixture should parse")
    }
}

// ---------------------------------------------------------------------------
// Lookups and integrity checks
// ---------------------------------------------------------------------------

/// The stack of `project` whose root is `id`.
pub fn stack(project: &Project, id: &str) -> Stack {
    ProjectInfo::new(project)
        .expect("info")
        .stack_by_id(id)
        .cloned()
        .unwrap_or_else(|| panic!("no stack rooted at {id}"))
}

/// Ids of blocks with `opcode` in the sprite.
pub fn blocks_with_opcode(project: &Project, opcode: &str) -> Vec<String> {
    project
        .sprite()
        .expect("sprite")
        .iter_blocks()
        .filter(|(_, b)| b.opcode == opcode)
        .map(|(id, _)| id.to_owned())
        .collect()
}

/// Every id in the document, with repeats.
pub fn all_ids(project: &Project) -> Vec<String> {
    project.all_ids().map(str::to_owned).collect()
}

/// Assert that every reference in the sprite resolves.
pub fn assert_referential_integrity(project: &Project) {
    let stage = project.stage().expect("stage");
    let sprite = project.sprite().expect("sprite");
    let graph = BlockGraph::new(sprite);

    for (id, block) in sprite.iter_blocks() {
        for link in [&block.next, &block.parent].into_iter().flatten() {
            assert!(sprite.blocks.contains_key(link), "{id}: dangling link {link}");
        }
        for (kind, symbol) in block.symbol_refs() {
            let found = match kind {
                SymbolKind::Variable => sprite.variables.contains_key(symbol),
                SymbolKind::List => sprite.lists.contains_key(symbol),
                SymbolKind::Broadcast => stage.broadcasts.contains_key(symbol),
            };
            assert!(found, "{id}: unresolved {kind} {symbol}");
        }
        for input in block.inputs.values() {
            for (target, referenced) in input.references() {
                if target == RefTarget::Block {
                    assert!(
                        sprite.blocks.contains_key(referenced),
                        "{id}: dangling input {referenced}"
                    );
                }
            }
        }
        if let Some(comment) = &block.comment {
            let c = sprite
                .comments
                .get(comment)
                .unwrap_or_else(|| panic!("{id}: missing comment {comment}"));
            assert_eq!(c.block_id.as_deref(), Some(id), "comment {comment} owner");
        }
        graph.root_of(id).expect("root reachable");
    }
}

/// Assert that no id appears twice across namespaces.
pub fn assert_unique_ids(project: &Project) {
    let ids = all_ids(project);
    let distinct: HashSet<&String> = ids.iter().collect();
    assert_eq!(ids.len(), distinct.len(), "duplicate ids in merged project");
}
