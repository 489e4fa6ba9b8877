//! Link-or-copy for variables, lists and broadcasts.
//!
//! A referenced symbol whose display name already exists in the target is
//! linked to that entry; otherwise its data is copied in under a fresh id.
//! Matching is by name only. Two target entries sharing the name is an
//! error rather than an arbitrary pick.

use indexmap::IndexMap;
use rand::Rng;

use super::Recorder;
use super::ids::{IdGenerator, IdMap};
use super::listener::{MergeAction, MergeEvent};
use crate::error::ProjectError;
use crate::model::{SymbolKind, Target, Variable};
use crate::trace::{SymbolUse, Usage};

/// Resolve every symbol in `usage` against the target namespaces.
///
/// Variables and lists live in the sprite, broadcasts in the stage.
pub(super) fn link_or_copy<R: Rng>(
    usage: &Usage<'_>,
    stage: &mut Target,
    sprite: &mut Target,
    ids: &mut IdGenerator<R>,
    map: &mut IdMap,
    recorder: &mut Recorder<'_>,
) -> Result<(), ProjectError> {
    let mut ctx = Context { ids, map, recorder };
    ctx.resolve(
        SymbolKind::Variable,
        &usage.variables,
        &mut sprite.variables,
        Variable::name,
    )?;
    ctx.resolve(SymbolKind::List, &usage.lists, &mut sprite.lists, Variable::name)?;
    ctx.resolve(
        SymbolKind::Broadcast,
        &usage.broadcasts,
        &mut stage.broadcasts,
        String::as_str,
    )?;
    Ok(())
}

struct Context<'c, 'l, R> {
    ids: &'c mut IdGenerator<R>,
    map: &'c mut IdMap,
    recorder: &'c mut Recorder<'l>,
}

impl<R: Rng> Context<'_, '_, R> {
    fn resolve<T: Clone>(
        &mut self,
        kind: SymbolKind,
        used: &IndexMap<&str, SymbolUse<'_, T>>,
        table: &mut IndexMap<String, T>,
        name_of: impl Fn(&T) -> &str,
    ) -> Result<(), ProjectError> {
        for (source_id, symbol) in used {
            let matches: Vec<String> = table
                .iter()
                .filter(|(_, data)| name_of(data) == symbol.name)
                .map(|(id, _)| id.clone())
                .collect();

            let event = match matches.as_slice() {
                [existing] => {
                    let existing = existing.clone();
                    self.map.insert_symbol(kind, *source_id, existing.clone());
                    MergeEvent::new(MergeAction::Link, kind.into(), symbol.name)
                        .old_id(*source_id)
                        .new_id(existing)
                }
                [] => {
                    let fresh = self.ids.next_id()?;
                    table.insert(fresh.clone(), symbol.data.clone());
                    self.map.insert_symbol(kind, *source_id, fresh.clone());
                    MergeEvent::new(MergeAction::Copy, kind.into(), symbol.name)
                        .old_id(*source_id)
                        .new_id(fresh)
                }
                several => {
                    return Err(ProjectError::Ambiguous {
                        kind: kind_label(kind),
                        name: symbol.name.to_owned(),
                        count: several.len(),
                    });
                }
            };
            self.recorder.emit(event);
        }
        Ok(())
    }
}

const fn kind_label(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Variable => "variable",
        SymbolKind::List => "list",
        SymbolKind::Broadcast => "broadcast",
    }
}
