//! Shapes: structural type descriptors, evolution (nominal newtypes), and
//! the `compatible_with` predicate (spec §3, §4.4).

use std::cell::Cell;
use std::rc::Rc;

use crate::symbol::{SymbolHandle, SymbolPool};

/// The eight primitive kinds the nucleus's well-known entities cover
/// (spec §4.9). `Word` and `WordSignature` are themselves first-class
/// stack values, hence they get primitive kinds of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimKind {
    Boolean,
    String,
    Symbol,
    UInt,
    SInt,
    Float,
    Word,
    WordSignature,
}

/// Whether a primitive shape is the full unbounded domain of its kind or
/// a refinement of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundedness {
    Unbounded,
    Bounded,
}

/// The tagged content of a [`Shape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeContents {
    /// No values inhabit this shape (e.g. the `->` side of a
    /// `NullaryTerminal`/`ConsumingTerminal` signature).
    Empty,
    Primitive { bounded: Boundedness, kind: PrimKind },
    /// A generic placeholder (`@1`, `@2`, ...), resolved by the signature
    /// layer rather than here.
    CatchAll(u8),
}

/// A member-word contract: a shape may require that satisfying types
/// supply a word of a given name and signature. Spec §3 lists this as
/// part of `Shape`'s data but its *compatibility* algorithm (§4.4) never
/// consults it — it is carried for future structural-interface use, not
/// checked today.
#[derive(Clone)]
pub struct MemberWordContract {
    pub name: SymbolHandle,
    pub signature: crate::signature::SignatureHandle,
}

struct ShapeData {
    name: Option<SymbolHandle>,
    member_words: Option<Vec<MemberWordContract>>,
    contents: ShapeContents,
    evolved_from: Option<Shape>,
    evolution_id: u32,
    evolutions_spawned: Cell<u32>,
}

/// A structural type descriptor.
///
/// Cheap to clone (an `Rc` bump): shapes are immutable once built, except
/// for the `evolutions_spawned` counter, which is the one piece of state
/// that legitimately changes after construction (each call to
/// [`Shape::evolve`] hands out the next id and advances it). That counter
/// lives in a `Cell` rather than behind an atomic because shapes are
/// nucleus-owned, single-threaded data (spec §5) — there is no
/// `Refcell`-style manual reference counting here because shapes are
/// never individually freed mid-`Runtime`; they live exactly as long as
/// the `Runtime` that created them, as spec §3 states outright.
#[derive(Clone)]
pub struct Shape(Rc<ShapeData>);

impl Shape {
    pub fn new(contents: ShapeContents) -> Self {
        Shape(Rc::new(ShapeData {
            name: None,
            member_words: None,
            contents,
            evolved_from: None,
            evolution_id: 0,
            evolutions_spawned: Cell::new(0),
        }))
    }

    /// Attach a name. Only meaningful immediately after construction,
    /// before the shape has been cloned anywhere else (panics otherwise,
    /// since a `Shape` is meant to be immutable once shared).
    pub fn with_name(mut self, name: SymbolHandle) -> Self {
        Rc::get_mut(&mut self.0)
            .expect("Shape::with_name called after the shape was shared")
            .name = Some(name);
        self
    }

    /// Attach member-word contracts. Same single-owner caveat as
    /// [`Shape::with_name`].
    pub fn with_member_words(mut self, words: Vec<MemberWordContract>) -> Self {
        Rc::get_mut(&mut self.0)
            .expect("Shape::with_member_words called after the shape was shared")
            .member_words = Some(words);
        self
    }

    pub fn contents(&self) -> &ShapeContents {
        &self.0.contents
    }

    pub fn evolved_from(&self) -> Option<&Shape> {
        self.0.evolved_from.as_ref()
    }

    pub fn evolution_id(&self) -> u32 {
        self.0.evolution_id
    }

    pub fn member_words(&self) -> Option<&[MemberWordContract]> {
        self.0.member_words.as_deref()
    }

    /// Identity used to compare evolution parents: two `Shape`s are the
    /// "same base" iff they point at the same `Rc` allocation.
    fn ptr_eq(a: &Shape, b: &Shape) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Spawn a nominal newtype over this shape: same contents and member
    /// words, a pointer back to `self`, and the next id in `self`'s
    /// monotonic evolution counter.
    pub fn evolve(&self) -> Shape {
        let id = self.0.evolutions_spawned.get();
        self.0.evolutions_spawned.set(id + 1);
        tracing::trace!(evolution_id = id, "spawning shape evolution");
        Shape(Rc::new(ShapeData {
            name: None,
            member_words: self.0.member_words.clone(),
            contents: self.0.contents.clone(),
            evolved_from: Some(self.clone()),
            evolution_id: id,
            evolutions_spawned: Cell::new(0),
        }))
    }

    /// Number of evolutions spawned from this shape so far.
    pub fn evolutions_spawned(&self) -> u32 {
        self.0.evolutions_spawned.get()
    }

    /// This shape's name, interning a fresh `"<anonymous shape>"` symbol
    /// if it has none. The caller owns the returned handle's reference
    /// and must `decref` it when done (spec §4.4: "callers must decref
    /// the returned symbol").
    pub fn name(&self, pool: &mut SymbolPool) -> SymbolHandle {
        if let Some(name) = self.0.name {
            name.bump_ref().expect("shape name handle was pruned while shape still live");
            return name;
        }
        pool.get_or_put(b"<anonymous shape>").0
    }

    /// Structural equality: contents, evolution parent, and evolution id
    /// must all match (spec §3).
    pub fn structurally_eq(&self, other: &Shape) -> bool {
        self.0.contents == other.0.contents
            && self.0.evolution_id == other.0.evolution_id
            && match (&self.0.evolved_from, &other.0.evolved_from) {
                (None, None) => true,
                (Some(a), Some(b)) => Shape::ptr_eq(a, b),
                _ => false,
            }
    }

    /// Can `other` satisfy `self` (`self` is the expectation, `other` is
    /// what is actually on the stack)? Implements the five-step algorithm
    /// of spec §4.4.
    ///
    /// One ordering ambiguity in the prose is resolved here and recorded
    /// in `DESIGN.md`: step 1 ("tags differ -> Incomparable") and step 4
    /// ("CatchAll vs anything else -> Indeterminate") cannot both be read
    /// literally, since a CatchAll vs a Primitive already differ in tag.
    /// We give CatchAll priority — a CatchAll on either side is always
    /// resolved by steps 3/4 first, before the strict tag-equality check
    /// of step 1 is applied to the remaining (Empty, Primitive) cases.
    pub fn compatible_with(&self, other: &Shape) -> Result<ShapeCompat, ShapeReason> {
        if let (ShapeContents::CatchAll(a), ShapeContents::CatchAll(b)) =
            (&self.0.contents, &other.0.contents)
        {
            return Ok(if a == b { ShapeCompat::Compatible } else { ShapeCompat::Indeterminate });
        }
        if matches!(self.0.contents, ShapeContents::CatchAll(_))
            || matches!(other.0.contents, ShapeContents::CatchAll(_))
        {
            return Ok(ShapeCompat::Indeterminate);
        }

        match (&self.0.contents, &other.0.contents) {
            (ShapeContents::Empty, ShapeContents::Empty) => Ok(ShapeCompat::Compatible),
            (
                ShapeContents::Primitive { bounded: sb, kind: sk },
                ShapeContents::Primitive { bounded: ob, kind: ok },
            ) => {
                self.check_evolution(other)?;
                primitive_compatible(*sb, *sk, *ob, *ok)
            }
            _ => Err(ShapeReason::Incomparable),
        }
    }

    fn check_evolution(&self, other: &Shape) -> Result<(), ShapeReason> {
        match (&self.0.evolved_from, &other.0.evolved_from) {
            (None, None) => Ok(()),
            (Some(a), Some(b)) => {
                if !Shape::ptr_eq(a, b) {
                    Err(ShapeReason::DisparateEvolutionBases)
                } else if self.0.evolution_id != other.0.evolution_id {
                    Err(ShapeReason::DisparateEvolutions)
                } else {
                    Ok(())
                }
            }
            _ => Err(ShapeReason::DisparateEvolutionBases),
        }
    }
}

fn primitive_compatible(
    self_bounded: Boundedness,
    self_kind: PrimKind,
    other_bounded: Boundedness,
    other_kind: PrimKind,
) -> Result<ShapeCompat, ShapeReason> {
    if self_kind != other_kind {
        return Err(ShapeReason::DisparateUnderlyingPrimitives);
    }
    match self_bounded {
        // Expecting the full unbounded domain: an unbounded value of the
        // same kind matches exactly; a bounded one is a subset, so it
        // trivially matches too.
        Boundedness::Unbounded => Ok(ShapeCompat::Compatible),
        // Expecting a refinement: nothing short of a runtime `in-bounds?`
        // check can confirm an arbitrary value of the same kind actually
        // falls in range, whether `other` itself is bounded or not.
        Boundedness::Bounded => {
            let _ = other_bounded;
            Ok(ShapeCompat::Indeterminate)
        }
    }
}

/// Outcome of [`Shape::compatible_with`] when the shapes are comparable
/// at all (vs. `Err(ShapeReason::Incomparable)` etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeCompat {
    Compatible,
    /// Statically undecidable; a catch-all resolution or a runtime
    /// `in-bounds?` check is needed before the signature layer can
    /// commit to an answer.
    Indeterminate,
}

/// Why two shapes failed to be comparable/compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeReason {
    Incomparable,
    DisparateEvolutionBases,
    DisparateEvolutions,
    DisparateUnderlyingPrimitives,
}

impl std::fmt::Display for ShapeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeReason::Incomparable => write!(f, "incomparable shape tags"),
            ShapeReason::DisparateEvolutionBases => {
                write!(f, "shapes evolved from different bases")
            }
            ShapeReason::DisparateEvolutions => {
                write!(f, "shapes are different evolutions of the same base")
            }
            ShapeReason::DisparateUnderlyingPrimitives => {
                write!(f, "different underlying primitive kinds")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbounded(kind: PrimKind) -> Shape {
        Shape::new(ShapeContents::Primitive { bounded: Boundedness::Unbounded, kind })
    }

    fn bounded(kind: PrimKind) -> Shape {
        Shape::new(ShapeContents::Primitive { bounded: Boundedness::Bounded, kind })
    }

    #[test]
    fn same_unbounded_kind_is_compatible() {
        let a = unbounded(PrimKind::Boolean);
        let b = unbounded(PrimKind::Boolean);
        assert_eq!(a.compatible_with(&b), Ok(ShapeCompat::Compatible));
    }

    #[test]
    fn different_kinds_are_disparate() {
        let a = unbounded(PrimKind::Boolean);
        let b = unbounded(PrimKind::UInt);
        assert_eq!(a.compatible_with(&b), Err(ShapeReason::DisparateUnderlyingPrimitives));
    }

    #[test]
    fn unbounded_expectation_accepts_bounded_value() {
        let expect = unbounded(PrimKind::UInt);
        let have = bounded(PrimKind::UInt);
        assert_eq!(expect.compatible_with(&have), Ok(ShapeCompat::Compatible));
    }

    #[test]
    fn bounded_expectation_is_indeterminate() {
        let expect = bounded(PrimKind::UInt);
        let have = unbounded(PrimKind::UInt);
        assert_eq!(expect.compatible_with(&have), Ok(ShapeCompat::Indeterminate));
    }

    #[test]
    fn catchall_same_id_is_compatible() {
        let a = Shape::new(ShapeContents::CatchAll(1));
        let b = Shape::new(ShapeContents::CatchAll(1));
        assert_eq!(a.compatible_with(&b), Ok(ShapeCompat::Compatible));
    }

    #[test]
    fn catchall_different_id_is_indeterminate() {
        let a = Shape::new(ShapeContents::CatchAll(1));
        let b = Shape::new(ShapeContents::CatchAll(2));
        assert_eq!(a.compatible_with(&b), Ok(ShapeCompat::Indeterminate));
    }

    #[test]
    fn catchall_against_primitive_is_indeterminate() {
        let a = Shape::new(ShapeContents::CatchAll(1));
        let b = unbounded(PrimKind::Boolean);
        assert_eq!(a.compatible_with(&b), Ok(ShapeCompat::Indeterminate));
        assert_eq!(b.compatible_with(&a), Ok(ShapeCompat::Indeterminate));
    }

    #[test]
    fn evolutions_of_same_parent_are_distinguishable() {
        let base = unbounded(PrimKind::UInt);
        let e0 = base.evolve();
        let e1 = base.evolve();
        assert_eq!(e0.evolution_id(), 0);
        assert_eq!(e1.evolution_id(), 1);
        assert_eq!(e0.compatible_with(&e1), Err(ShapeReason::DisparateEvolutions));
        assert_eq!(e0.compatible_with(&e0.clone()), Ok(ShapeCompat::Compatible));
    }

    #[test]
    fn evolution_vs_unevolved_base_is_disparate() {
        let base = unbounded(PrimKind::UInt);
        let e0 = base.evolve();
        assert_eq!(base.compatible_with(&e0), Err(ShapeReason::DisparateEvolutionBases));
    }
}
