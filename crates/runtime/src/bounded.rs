//! Bounded-shape support (supplemental feature, see `SPEC_FULL.md`).
//!
//! Spec §4.4 requires that "a bounded shape advertises a runtime
//! `in-bounds?` word with signature `( Unbounded -> Boolean )`" but does
//! not specify how a bound is parameterized or dispatched. `gale_core`'s
//! `Shape` only tracks *whether* a primitive is bounded, not the bound
//! itself (bounds are a runtime-layer concern, not a leaf-layer one). We
//! ground the minimal, honest implementation of this on the teacher's
//! habit of exposing one dedicated primitive per runtime capability
//! (`crates/runtime/src/arithmetic.rs`'s `patch_seq_*` functions): each
//! bounded shape gets its own hand-written `in-bounds?` primitive,
//! registered in the dictionary under `<name>/in-bounds?`, rather than a
//! generic closure-capturing mechanism (which would require
//! `WordImpl::Primitive` to stop being a bare function pointer, a change
//! with no grounding in the source corpus).
//!
//! One concrete instance ships with the nucleus: `SmallUInt`, a `UInt`
//! refinement to the range `0..=255`, registered at `Runtime::new`.

use gale_core::shape::{Boundedness, PrimKind, Shape, ShapeContents};

use crate::error::{Error, Result};
use crate::object::{Kind, Object};
use crate::runtime::Runtime;
use crate::word::{WordData, WordHandle, WordSignatureState};

pub struct BoundedRegistry {
    small_uint: Option<Shape>,
}

impl BoundedRegistry {
    pub fn new() -> Self {
        BoundedRegistry { small_uint: None }
    }

    pub fn small_uint_shape(&self) -> &Shape {
        self.small_uint.as_ref().expect("install_small_uint runs during Runtime::new")
    }
}

impl Default for BoundedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn small_uint_in_bounds(rt: &mut Runtime) -> Result<()> {
    let obj = rt.stack.pop()?;
    obj.assert_is_kind(Kind::UnsignedInt)?;
    let Object::UnsignedInt(n) = obj else { unreachable!("assert_is_kind just confirmed this") };
    rt.stack.push(Object::Boolean(n <= 255))?;
    Ok(())
}

/// Build the `SmallUInt` bounded shape and register its `in-bounds?`
/// primitive under `SmallUInt/in-bounds?`.
pub fn install_small_uint(rt: &mut Runtime) {
    let shape = Shape::new(ShapeContents::Primitive { bounded: Boundedness::Bounded, kind: PrimKind::UInt });
    rt.bounded.small_uint = Some(shape.clone());

    let sig = rt.signatures.intern(gale_core::signature::WordSignature::PurelyAdditive {
        expects: vec![rt.well_known.shape(PrimKind::UInt).clone()],
        gives: vec![rt.well_known.shape(PrimKind::Boolean).clone()],
    });
    let word = WordData::new_primitive(
        small_uint_in_bounds,
        Some(WordSignatureState { source: crate::word::SignatureSource::Declared, handle: sig }),
    );
    let handle: WordHandle = gale_core::refcell::Handle::new_referenced(word);
    let (symbol, _) = rt.symbols.get_or_put(b"SmallUInt/in-bounds?");
    rt.dictionary.append(symbol, handle);
}
