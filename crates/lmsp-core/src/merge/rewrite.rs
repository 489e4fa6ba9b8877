//! Reference rewrite and insertion of the copied blocks.

use indexmap::IndexMap;
use rand::Rng;

use super::ids::{IdGenerator, IdMap};
use super::Recorder;
use crate::error::ProjectError;
use crate::model::{Block, Comment, SymbolKind, Target};

/// Rewrite every id a copied block holds and insert it into `sprite`.
///
/// `comments` is the (relativized) source comment table; an attached
/// comment moves in under a fresh id, owned by the block's new id.
pub(super) fn install<R: Rng>(
    incoming: IndexMap<String, Block>,
    map: &IdMap,
    comments: &IndexMap<String, Comment>,
    sprite: &mut Target,
    ids: &mut IdGenerator<R>,
    recorder: &mut Recorder<'_>,
) -> Result<(), ProjectError> {
    for (old_id, mut block) in incoming {
        let new_id = map
            .block(&old_id)
            .ok_or_else(|| ProjectError::UnknownBlock { id: old_id.clone() })?
            .to_owned();

        rewrite_links(&old_id, &mut block, map)?;

        if let Some(comment_id) = block.comment.take() {
            let mut comment = comments
                .get(&comment_id)
                .cloned()
                .ok_or_else(|| ProjectError::UnknownComment {
                    id: comment_id.clone(),
                    block: old_id.clone(),
                })?;
            let fresh = ids.next_id()?;
            comment.block_id = Some(new_id.clone());
            sprite.comments.insert(fresh.clone(), comment);
            block.comment = Some(fresh);
            recorder.summary.inserted_comments += 1;
        }

        sprite.blocks.insert(new_id, block.into());
        recorder.summary.inserted_blocks += 1;
    }
    Ok(())
}

/// Map `next`, `parent`, symbol fields and every input slot.
fn rewrite_links(old_id: &str, block: &mut Block, map: &IdMap) -> Result<(), ProjectError> {
    let dangling = |id: &str| ProjectError::DanglingReference {
        block: old_id.to_owned(),
        id: id.to_owned(),
    };

    for link in [&mut block.next, &mut block.parent] {
        if let Some(id) = link.as_mut() {
            *id = map.block(id).ok_or_else(|| dangling(id))?.to_owned();
        }
    }

    for (name, field) in &mut block.fields {
        let Some(kind) = SymbolKind::from_field_name(name) else {
            continue;
        };
        let Some(id) = field.reference() else {
            continue;
        };
        let mapped = map.symbol(kind, id).ok_or_else(|| dangling(id))?.to_owned();
        field.set_reference(mapped);
    }

    for input in block.inputs.values_mut() {
        input.remap_ids(|target, id| {
            map.resolve(target, id)
                .map(str::to_owned)
                .ok_or_else(|| dangling(id))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(value: serde_json::Value) -> Block {
        serde_json::from_value(value).unwrap()
    }

    fn map() -> IdMap {
        let mut map = IdMap::default();
        map.insert_block("a", "A");
        map.insert_block("b", "B");
        map.insert_block("r", "R");
        map.insert_symbol(SymbolKind::Variable, "v1", "V1");
        map.insert_symbol(SymbolKind::Broadcast, "b1", "B1");
        map
    }

    #[test]
    fn rewrites_links_fields_and_inputs() {
        let mut b = block(json!({
            "opcode": "data_setvariableto",
            "next": "b",
            "parent": "a",
            "fields": { "VARIABLE": ["x", "v1"], "OTHER": ["keep", "v1"] },
            "inputs": {
                "VALUE": [3, "r", [11, "go", "b1"]],
                "LITERAL": [1, [10, "0"]]
            }
        }));
        rewrite_links("self", &mut b, &map()).unwrap();
        assert_eq!(b.next.as_deref(), Some("B"));
        assert_eq!(b.parent.as_deref(), Some("A"));
        assert_eq!(b.fields["VARIABLE"].reference(), Some("V1"));
        assert_eq!(b.fields["OTHER"].reference(), Some("v1"));
        assert_eq!(b.inputs["VALUE"].0, vec![json!(3), json!("R"), json!([11, "go", "B1"])]);
        assert_eq!(b.inputs["LITERAL"].0, vec![json!(1), json!([10, "0"])]);
    }

    #[test]
    fn unmapped_reference_is_dangling() {
        let mut b = block(json!({
            "opcode": "control_if",
            "next": null,
            "parent": "a",
            "inputs": { "SUBSTACK": [2, "elsewhere"] }
        }));
        assert!(matches!(
            rewrite_links("self", &mut b, &map()),
            Err(ProjectError::DanglingReference { block, id }) if block == "self" && id == "elsewhere"
        ));
    }
}
