//! `Object`: the tagged value that actually lives on the stack (spec §3,
//! §4.2).
//!
//! Primitive variants (`Boolean`, `SignedInt`, `UnsignedInt`, `Float`) are
//! value-copied with no ownership, exactly like `gale_core`'s own
//! `Primitive` shapes. The four heap variants (`String`, `Symbol`,
//! `Opaque`, `Word`) are handles over a `gale_core::Refcell`; `Object`
//! itself is `Copy` (every heap variant is just a pointer) but copying one
//! is *not* the same thing as the spec's "copying an Object conceptually
//! refs it" — callers must call [`Object::ref_obj`] explicitly at the
//! point a second independent stack slot comes to exist, the same
//! distinction `gale_core::refcell::Handle` draws between a bare pointer
//! `Copy` and `bump_ref`.

use gale_core::refcell::{Handle, PruneMode, Prunable};
use gale_core::shape::PrimKind;
use gale_core::stack::StackElement;
use gale_core::symbol::SymbolHandle;

use crate::error::{Error, Result};
use crate::word::WordHandle;

/// Owned byte payload backing a heap-allocated string.
pub struct StringBytes(pub Box<[u8]>);

impl Prunable for StringBytes {
    const MODE: PruneMode = PruneMode::Slice;
    fn prune(self) {
        drop(self.0);
    }
}

/// Owned byte payload backing an opaque blob.
///
/// Spec §4.2 marks `Opaque`'s deinit "reserved and implementation-defined".
/// We ground the choice on `seq-runtime`'s boxed-buffer teardown pattern
/// (`Value::Map`/`Value::Variant`, `crates/runtime/src/value.rs` in the
/// teacher): an `Opaque` owns one boxed byte buffer and nothing else, so
/// `prune` is an ordinary slice drop, same as `StringBytes`.
pub struct OpaqueBytes(pub Box<[u8]>);

impl Prunable for OpaqueBytes {
    const MODE: PruneMode = PruneMode::Slice;
    fn prune(self) {
        drop(self.0);
    }
}

pub type StringHandle = Handle<StringBytes>;
pub type OpaqueHandle = Handle<OpaqueBytes>;

/// Which of the eight kinds an [`Object`] carries. Mirrors
/// `gale_core::shape::PrimKind` one-for-one; kept as a separate type so
/// object-kind mismatches report through `gale_runtime::Error` without
/// `gale-core` needing to know about `Object` at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Boolean,
    UnsignedInt,
    SignedInt,
    Float,
    String,
    Symbol,
    Opaque,
    Word,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Boolean => "Boolean",
            Kind::UnsignedInt => "UnsignedInt",
            Kind::SignedInt => "SignedInt",
            Kind::Float => "Float",
            Kind::String => "String",
            Kind::Symbol => "Symbol",
            Kind::Opaque => "Opaque",
            Kind::Word => "Word",
        }
    }

    /// The well-known `PrimKind` this object kind corresponds to, for
    /// well-known shape/signature lookups. `Opaque` has no well-known
    /// shape (spec §4.9 lists Boolean/String/Symbol/UInt/SInt/Float/Word/
    /// WordSignature only) and is not itself a first-class stack-effect
    /// shape in this nucleus.
    pub fn prim_kind(self) -> Option<PrimKind> {
        match self {
            Kind::Boolean => Some(PrimKind::Boolean),
            Kind::UnsignedInt => Some(PrimKind::UInt),
            Kind::SignedInt => Some(PrimKind::SInt),
            Kind::Float => Some(PrimKind::Float),
            Kind::String => Some(PrimKind::String),
            Kind::Symbol => Some(PrimKind::Symbol),
            Kind::Opaque => None,
            Kind::Word => Some(PrimKind::Word),
        }
    }
}

/// A stack value: eight tagged variants, four of them handles.
#[derive(Clone, Copy)]
pub enum Object {
    Boolean(bool),
    UnsignedInt(u64),
    SignedInt(i64),
    Float(f64),
    String(StringHandle),
    Symbol(SymbolHandle),
    Opaque(OpaqueHandle),
    Word(WordHandle),
}

impl Object {
    pub fn kind(&self) -> Kind {
        match self {
            Object::Boolean(_) => Kind::Boolean,
            Object::UnsignedInt(_) => Kind::UnsignedInt,
            Object::SignedInt(_) => Kind::SignedInt,
            Object::Float(_) => Kind::Float,
            Object::String(_) => Kind::String,
            Object::Symbol(_) => Kind::Symbol,
            Object::Opaque(_) => Kind::Opaque,
            Object::Word(_) => Kind::Word,
        }
    }

    /// `ref` — a no-op for primitives, `incref` for heap variants.
    pub fn ref_obj(&self) -> Result<()> {
        match self {
            Object::Boolean(_) | Object::UnsignedInt(_) | Object::SignedInt(_) | Object::Float(_) => {
                Ok(())
            }
            Object::String(h) => Ok(h.bump_ref()?),
            Object::Symbol(h) => Ok(h.bump_ref()?),
            Object::Opaque(h) => Ok(h.bump_ref()?),
            Object::Word(h) => Ok(h.bump_ref()?),
        }
    }

    /// `deinit` — for heap variants, `decref_and_prune` with the mode
    /// that matches the payload. Primitives are no-ops.
    pub fn deinit(self) {
        match self {
            Object::Boolean(_) | Object::UnsignedInt(_) | Object::SignedInt(_) | Object::Float(_) => {}
            Object::String(h) => h.decref_and_prune_cell(PruneMode::Slice),
            Object::Symbol(h) => h.decref_and_prune_cell(PruneMode::Slice),
            Object::Opaque(h) => h.decref_and_prune_cell(PruneMode::Slice),
            Object::Word(h) => h.decref_and_prune_cell(PruneMode::SelfManaged),
        }
    }

    pub fn assert_is_kind(&self, expected: Kind) -> Result<()> {
        if self.kind() == expected {
            Ok(())
        } else {
            Err(Error::TypeError { expected: expected.name(), found: self.kind().name() })
        }
    }

    pub fn assert_same_kind_as(&self, other: &Object) -> Result<()> {
        if self.kind() == other.kind() {
            Ok(())
        } else {
            Err(Error::TypeError { expected: self.kind().name(), found: other.kind().name() })
        }
    }

    /// Value equality for primitives, pointer identity for heap handles.
    /// Cross-kind comparison is a `TypeError`. Floats compare via `==`
    /// (NaN-never-equal is acceptable per spec §4.2).
    pub fn eq_obj(&self, other: &Object) -> Result<bool> {
        self.assert_same_kind_as(other)?;
        Ok(match (self, other) {
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::UnsignedInt(a), Object::UnsignedInt(b)) => a == b,
            (Object::SignedInt(a), Object::SignedInt(b)) => a == b,
            (Object::Float(a), Object::Float(b)) => a == b,
            (Object::String(a), Object::String(b)) => a.addr() == b.addr(),
            (Object::Symbol(a), Object::Symbol(b)) => a.addr() == b.addr(),
            (Object::Opaque(a), Object::Opaque(b)) => a.addr() == b.addr(),
            (Object::Word(a), Object::Word(b)) => a.addr() == b.addr(),
            _ => unreachable!("assert_same_kind_as already ruled out cross-kind pairs"),
        })
    }
}

impl StackElement for Object {
    /// `dup`'s ref-then-copy: incref-ing a dead handle here would mean a
    /// value still reachable on the stack had already been torn down,
    /// which is a programmer-error invariant violation, hence the
    /// `expect` rather than propagating the error.
    fn duplicate(&self) -> Self {
        self.ref_obj().expect("duplicated a stack object whose backing cell was already dead");
        *self
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Boolean(b) => write!(f, "{b}"),
            Object::UnsignedInt(n) => write!(f, "{n}/u"),
            Object::SignedInt(n) => write!(f, "{n}/i"),
            Object::Float(n) => write!(f, "{n}"),
            Object::String(h) => write!(f, "{:?}", String::from_utf8_lossy(&h.get().0)),
            Object::Symbol(h) => write!(f, ":{}", String::from_utf8_lossy(&h.get().0)),
            Object::Opaque(h) => write!(f, "<opaque {} bytes>", h.get().0.len()),
            Object::Word(_) => write!(f, "<word>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_eq_is_by_value() {
        let a = Object::UnsignedInt(7);
        let b = Object::UnsignedInt(7);
        assert!(a.eq_obj(&b).unwrap());
        let c = Object::UnsignedInt(8);
        assert!(!a.eq_obj(&c).unwrap());
    }

    #[test]
    fn cross_kind_eq_is_type_error() {
        let a = Object::Boolean(true);
        let b = Object::UnsignedInt(1);
        assert!(matches!(a.eq_obj(&b), Err(Error::TypeError { .. })));
    }

    #[test]
    fn heap_eq_is_by_pointer() {
        let h1 = StringHandle::new_referenced(StringBytes(b"hi".to_vec().into_boxed_slice()));
        let h2 = StringHandle::new_referenced(StringBytes(b"hi".to_vec().into_boxed_slice()));
        let a = Object::String(h1);
        let b = Object::String(h2);
        assert!(!a.eq_obj(&b).unwrap(), "same bytes, different cells: not equal");
        let b_again = Object::String(h1);
        assert!(a.eq_obj(&b_again).unwrap());
        a.deinit();
        b.deinit();
    }

    #[test]
    fn duplicate_bumps_refcount_for_heap_variants() {
        let h = StringHandle::new_referenced(StringBytes(b"x".to_vec().into_boxed_slice()));
        let obj = Object::String(h);
        let copy = obj.duplicate();
        assert_eq!(h.cell().strong_count(), 2);
        obj.deinit();
        copy.deinit();
    }
}
