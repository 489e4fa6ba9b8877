//! Fresh identifiers and the source → target id map.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::rngs::ThreadRng;

use super::MergeOptions;
use crate::error::ProjectError;
use crate::model::{RefTarget, SymbolKind};

/// Characters a generated id is drawn from.
pub const ID_ALPHABET: &[u8] =
    b"!#$%()*+,-./0123456789:;?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[]^abcdefghijklmnopqrstuvwxyz{|}~";

/// Default generated id length.
pub const DEFAULT_ID_LENGTH: usize = 20;

/// Default number of draws per id before giving up.
pub const DEFAULT_MAX_ID_ATTEMPTS: usize = 1000;

// ---------------------------------------------------------------------------
// IdGenerator
// ---------------------------------------------------------------------------

/// Random id source that never repeats an id it has seen or minted.
///
/// One generator lives for one merge call. The reserved pool starts as every
/// id of the target document and grows with each id handed out.
#[derive(Debug)]
pub struct IdGenerator<R = ThreadRng> {
    reserved: HashSet<String>,
    length: usize,
    max_attempts: usize,
    rng: R,
}

impl IdGenerator<ThreadRng> {
    /// A generator backed by the thread-local RNG.
    #[must_use]
    pub fn new<I, S>(reserved: I, options: &MergeOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_rng(reserved, options, rand::rng())
    }
}

impl<R: Rng> IdGenerator<R> {
    #[must_use]
    pub fn with_rng<I, S>(reserved: I, options: &MergeOptions, rng: R) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
            length: options.id_length,
            max_attempts: options.max_id_attempts,
            rng,
        }
    }

    /// Add an id to the pool without minting it.
    pub fn reserve(&mut self, id: impl Into<String>) {
        self.reserved.insert(id.into());
    }

    #[must_use]
    pub fn is_reserved(&self, id: &str) -> bool {
        self.reserved.contains(id)
    }

    /// Draw ids until one is free, then reserve it.
    ///
    /// # Errors
    /// [`ProjectError::IdSpaceExhausted`] after `max_id_attempts` collisions.
    pub fn next_id(&mut self) -> Result<String, ProjectError> {
        for _ in 0..self.max_attempts {
            let candidate = self.candidate();
            if self.reserved.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }
        Err(ProjectError::IdSpaceExhausted {
            attempts: self.max_attempts,
        })
    }

    fn candidate(&mut self) -> String {
        (0..self.length)
            .map(|_| char::from(ID_ALPHABET[self.rng.random_range(0..ID_ALPHABET.len())]))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// IdMap
// ---------------------------------------------------------------------------

/// Source id → target id, kept per namespace.
#[derive(Clone, Debug, Default)]
pub struct IdMap {
    blocks: HashMap<String, String>,
    symbols: HashMap<(SymbolKind, String), String>,
}

impl IdMap {
    pub fn insert_block(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.blocks.insert(source.into(), target.into());
    }

    pub fn insert_symbol(
        &mut self,
        kind: SymbolKind,
        source: impl Into<String>,
        target: impl Into<String>,
    ) {
        self.symbols.insert((kind, source.into()), target.into());
    }

    #[must_use]
    pub fn block(&self, source: &str) -> Option<&str> {
        self.blocks.get(source).map(String::as_str)
    }

    #[must_use]
    pub fn symbol(&self, kind: SymbolKind, source: &str) -> Option<&str> {
        self.symbols
            .get(&(kind, source.to_owned()))
            .map(String::as_str)
    }

    #[must_use]
    pub fn resolve(&self, target: RefTarget, source: &str) -> Option<&str> {
        match target {
            RefTarget::Block => self.block(source),
            RefTarget::Symbol(kind) => self.symbol(kind, source),
        }
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}
