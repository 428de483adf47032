//! Well-known entities: one primitive shape and one `NullarySingle`
//! signature per kind, built once at `Runtime` init (spec §4.9).

use std::collections::HashMap;

use gale_core::shape::{Boundedness, PrimKind, Shape, ShapeContents};
use gale_core::signature::{SignatureHandle, WordSignature, WordSignaturePool};

const ALL_KINDS: [PrimKind; 8] = [
    PrimKind::Boolean,
    PrimKind::String,
    PrimKind::Symbol,
    PrimKind::UInt,
    PrimKind::SInt,
    PrimKind::Float,
    PrimKind::Word,
    PrimKind::WordSignature,
];

pub struct WellKnown {
    shapes: HashMap<PrimKind, Shape>,
    nullary_single: HashMap<PrimKind, SignatureHandle>,
}

impl WellKnown {
    pub fn new(signatures: &mut WordSignaturePool) -> Self {
        let mut shapes = HashMap::new();
        let mut nullary_single = HashMap::new();
        for kind in ALL_KINDS {
            let shape = Shape::new(ShapeContents::Primitive { bounded: Boundedness::Unbounded, kind });
            let sig = signatures.intern(WordSignature::nullary_single(shape.clone()));
            shapes.insert(kind, shape);
            nullary_single.insert(kind, sig);
        }
        tracing::debug!(count = ALL_KINDS.len(), "well-known entities initialized");
        WellKnown { shapes, nullary_single }
    }

    pub fn shape(&self, kind: PrimKind) -> &Shape {
        self.shapes.get(&kind).expect("every PrimKind has a well-known shape")
    }

    pub fn nullary_single(&self, kind: PrimKind) -> SignatureHandle {
        *self
            .nullary_single
            .get(&kind)
            .expect("every PrimKind has a well-known NullarySingle signature")
    }
}
