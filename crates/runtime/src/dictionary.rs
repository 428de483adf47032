//! `Dictionary`: name -> list of word definitions (spec §3, §4.6).
//!
//! Keyed not by the raw name bytes but by the *address* of the bytes'
//! canonical `SymbolHandle`, since `gale_core::symbol::SymbolPool`
//! already guarantees one stable handle per distinct byte string — two
//! lookups of the same name always produce the same key without the
//! dictionary needing its own byte-comparison hash map.

use std::collections::HashMap;

use gale_core::symbol::SymbolHandle;

use crate::error::{Error, Result};
use crate::word::WordHandle;

/// An ordered sequence of definitions registered under one name. Order is
/// registration order, used both as the display order and as the
/// tie-break for arity/shape-driven dispatch (spec §4.6).
#[derive(Default)]
pub struct WordList(Vec<WordHandle>);

impl WordList {
    pub fn iter(&self) -> impl Iterator<Item = &WordHandle> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, handle: WordHandle) {
        self.0.push(handle);
    }
}

#[derive(Default)]
pub struct Dictionary {
    entries: HashMap<usize, WordList>,
    /// Kept only so `dump_diagnostics` and tests can report a name back;
    /// the dispatch path never needs it (the `usize` key already is the
    /// canonical identity).
    names: HashMap<usize, SymbolHandle>,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn word_list(&self, symbol: SymbolHandle) -> Option<&WordList> {
        self.entries.get(&symbol.addr())
    }

    /// Append `word` to the list registered under `symbol`, creating the
    /// list if this is the symbol's first definition. Takes ownership of
    /// one reference on `symbol` (the caller's interned handle) and one
    /// on `word` — both are expected to already be ref-counted on the
    /// caller's behalf, matching spec §4.6's `define_word_va` contract
    /// ("interns/refs the symbol... refs it to balance dictionary
    /// ownership").
    pub fn append(&mut self, symbol: SymbolHandle, word: WordHandle) {
        self.names.entry(symbol.addr()).or_insert(symbol);
        self.entries.entry(symbol.addr()).or_default().push(word);
        tracing::debug!(total_defs = self.entries[&symbol.addr()].len(), "word defined");
    }
}

/// Assemble a compound word's body from `n` word handles already on the
/// stack (spec §4.6 `@DEFINE-WORD-VAn`). `targets` is given deepest-first,
/// i.e. call order, matching how the primitive catalog pops them off the
/// value stack.
pub fn define_word_va(
    dictionary: &mut Dictionary,
    symbols: &mut gale_core::symbol::SymbolPool,
    name: &[u8],
    targets: Vec<WordHandle>,
) -> Result<()> {
    if targets.is_empty() {
        return Err(Error::ValueError("@DEFINE-WORD-VAn requires at least one target word".into()));
    }
    let (symbol, _found) = symbols.get_or_put(name);
    let compound = crate::word::WordData::new_compound(targets, None);
    let handle = WordHandle::new_referenced(compound);
    dictionary.append(symbol, handle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use crate::word::WordData;

    fn noop(_rt: &mut Runtime) -> Result<()> {
        Ok(())
    }

    #[test]
    fn define_and_lookup_round_trip() {
        let mut dict = Dictionary::new();
        let mut pool = gale_core::symbol::SymbolPool::new();
        let prim = WordHandle::new_referenced(WordData::new_primitive(noop, None));
        define_word_va(&mut dict, &mut pool, b"push-one", vec![prim]).unwrap();

        let (symbol, found) = pool.get_or_put(b"push-one");
        assert!(found);
        let list = dict.word_list(symbol).expect("definition should be registered");
        assert_eq!(list.len(), 1);
        symbol.decref_and_prune_cell(gale_core::refcell::PruneMode::Slice);
    }

    #[test]
    fn multiple_definitions_coexist_in_registration_order() {
        let mut dict = Dictionary::new();
        let mut pool = gale_core::symbol::SymbolPool::new();
        let a = WordHandle::new_referenced(WordData::new_primitive(noop, None));
        let b = WordHandle::new_referenced(WordData::new_primitive(noop, None));
        define_word_va(&mut dict, &mut pool, b"dup-name", vec![a]).unwrap();
        define_word_va(&mut dict, &mut pool, b"dup-name", vec![b]).unwrap();

        let (symbol, _) = pool.get_or_put(b"dup-name");
        let list = dict.word_list(symbol).unwrap();
        assert_eq!(list.len(), 2);
        symbol.decref_and_prune_cell(gale_core::refcell::PruneMode::Slice);
    }
}
