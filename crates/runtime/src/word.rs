//! `Word`: an immutable-once-published callable (spec §3, §4.6).
//!
//! A word is flags + a 256-bit tag set + an optional signature + one of
//! three implementation kinds. Words live behind
//! `gale_core::refcell::Handle` (`WordHandle`) so dictionary entries,
//! compound bodies, and stack `Object::Word` values can all share the same
//! underlying cell the way spec §4.6 requires.

use gale_core::refcell::{Handle, PruneMode, Prunable};
use gale_core::signature::SignatureHandle;

use crate::error::{Error, Result};
use crate::object::Object;
use crate::runtime::Runtime;

/// `{hidden}` — spec §3 lists this as the word's only flag today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordFlags {
    pub hidden: bool,
}

/// A 256-bit tag set. The nucleus does not interpret tags (spec §4.6:
/// "transitive effect/capability markers; the nucleus does not interpret
/// them, only preserves them") — this is purely a carried bitset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagSet([u64; 4]);

impl TagSet {
    pub fn set(&mut self, tag: u8) {
        let (word, bit) = (tag as usize / 64, tag as usize % 64);
        self.0[word] |= 1u64 << bit;
    }

    pub fn has(&self, tag: u8) -> bool {
        let (word, bit) = (tag as usize / 64, tag as usize % 64);
        self.0[word] & (1u64 << bit) != 0
    }

    pub fn union_with(&mut self, other: &TagSet) {
        for i in 0..4 {
            self.0[i] |= other.0[i];
        }
    }
}

/// Whether a word's attached signature was written by the author
/// (`Declared`) or computed by the nucleus from the word's body
/// (`Inferred`). The nucleus does not infer signatures for compound words
/// in this implementation (inference is left to the self-hosted standard
/// library, out of scope per spec §1) — `Inferred` exists in the type so
/// the variant is representable, and is used today only for the
/// `@LIT`-built `HeapLit` words, whose `NullarySingle` signature is
/// mechanically derived from the lifted object's kind rather than
/// hand-declared at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureSource {
    Declared,
    Inferred,
}

#[derive(Clone, Copy)]
pub struct WordSignatureState {
    pub source: SignatureSource,
    pub handle: SignatureHandle,
}

/// Owned payload behind a [`WordHandle`]: a pre-built object, stored so an
/// `@LIT`-produced `HeapLit` word can re-push it each time it runs.
pub struct BoxedObject(pub Object);

impl Prunable for BoxedObject {
    const MODE: PruneMode = PruneMode::SelfManaged;
    fn prune(self) {
        self.0.deinit();
    }
}

pub type ObjectHandle = Handle<BoxedObject>;
pub type PrimitiveFn = fn(&mut Runtime) -> Result<()>;

/// The three ways a word's body can be implemented.
pub enum WordImpl {
    /// A native function pointer.
    Primitive(PrimitiveFn),
    /// An ordered list of already-published word handles, run in
    /// sequence.
    Compound(Vec<WordHandle>),
    /// A pre-built object; running this word pushes a ref-ed copy of it.
    HeapLit(ObjectHandle),
}

pub struct WordData {
    pub flags: WordFlags,
    pub tags: TagSet,
    pub signature: Option<WordSignatureState>,
    pub imp: WordImpl,
}

impl Prunable for WordData {
    const MODE: PruneMode = PruneMode::SelfManaged;

    /// Spec §4.6: "for Primitive, nothing... for HeapLit, deinit the
    /// inner object then free the object cell; for Compound, first
    /// decref-and-prune each inner word handle... then free any orphaned
    /// cells..., then free the list itself."
    ///
    /// `gale_core::refcell::Handle::decref_and_prune_cell` already fuses
    /// "decref, prune if this call killed it, free the cell if it died"
    /// into one atomic-feeling call (see its own doc comment), so the
    /// "decref pass" and "free orphaned cells pass" the spec describes
    /// separately collapse into a single loop here: each list entry's
    /// `decref_and_prune_cell` call frees that entry's cell if and only
    /// if *that* call is the one that drops it to zero, which is exactly
    /// what "duplicates must not double-free" requires — two occurrences
    /// of the same word in a compound body each hold their own counted
    /// reference (taken at list-construction time), so each occurrence's
    /// `decref_and_prune_cell` call is a distinct, independently-balanced
    /// decrement. `self.imp`'s `Vec`/`Handle` drop then frees the list
    /// storage itself.
    fn prune(self) {
        match self.imp {
            WordImpl::Primitive(_) => {}
            WordImpl::HeapLit(obj) => obj.decref_and_prune_cell(PruneMode::SelfManaged),
            WordImpl::Compound(inner) => {
                for handle in inner {
                    handle.decref_and_prune_cell(PruneMode::SelfManaged);
                }
            }
        }
    }
}

/// A stable, shareable handle to a [`WordData`].
pub type WordHandle = Handle<WordData>;

impl WordData {
    pub fn new_primitive(f: PrimitiveFn, signature: Option<WordSignatureState>) -> Self {
        WordData { flags: WordFlags::default(), tags: TagSet::default(), signature, imp: WordImpl::Primitive(f) }
    }

    pub fn new_compound(body: Vec<WordHandle>, signature: Option<WordSignatureState>) -> Self {
        WordData { flags: WordFlags::default(), tags: TagSet::default(), signature, imp: WordImpl::Compound(body) }
    }

    pub fn new_heaplit(object: ObjectHandle, signature: Option<WordSignatureState>) -> Self {
        WordData { flags: WordFlags::default(), tags: TagSet::default(), signature, imp: WordImpl::HeapLit(object) }
    }
}

/// Dispatch a word handle: `Primitive` invokes the native function,
/// `HeapLit` pushes a ref-ed copy of the stored object, `Compound`
/// executes each inner word in order (spec §4.6).
pub fn run_word(rt: &mut Runtime, handle: WordHandle) -> Result<()> {
    if handle.cell().dead() {
        return Err(Error::DeadHandle);
    }
    tracing::trace!("dispatching word");
    // Read what we need before any nested call might itself touch this
    // handle's cell (a Compound can legally contain a reference to
    // itself's sibling entries, never to itself, so this is precautionary
    // rather than load-bearing).
    match &handle.get().imp {
        WordImpl::Primitive(f) => f(rt),
        WordImpl::HeapLit(obj_handle) => {
            let obj = obj_handle.get().0;
            obj.ref_obj()?;
            rt.stack.push(obj)?;
            Ok(())
        }
        WordImpl::Compound(body) => {
            let body = body.clone();
            for inner in body {
                run_word(rt, inner)?;
            }
            Ok(())
        }
    }
}
