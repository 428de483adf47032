//! Word signatures: the seven-variant stack-effect contract attached to
//! every word, and the `compatible_with`/`detect_incompatibilities`
//! algorithm that decides whether one signature can stand in for another
//! (spec §4.5).

use std::collections::HashMap;

use crate::refcell::{Handle, PruneMode, Prunable};
use crate::shape::{Shape, ShapeCompat, ShapeContents, ShapeReason};

/// How many per-side incompatible-shape indices get recorded before a
/// [`SignatureIncompatReason::UnderlyingShapesIncompatible`] truncates.
pub const MAX_CATCHALL_REPORT: usize = 5;

/// A word's declared stack effect. Shape lists are ordered left-to-right
/// matching stack-notation order, so index 0 is the deepest/leftmost
/// shape.
#[derive(Clone)]
pub enum WordSignature {
    /// Touches the stack in ways its signature does not describe (e.g.
    /// the private-space byte-setter).
    SideEffectary,
    /// Pushes `gives`, consumes nothing.
    Nullary(Vec<Shape>),
    /// Like `Nullary` but never returns.
    NullaryTerminal,
    /// Consumes `expects`, pushes nothing.
    PurelyConsuming(Vec<Shape>),
    /// Like `PurelyConsuming` but never returns.
    ConsumingTerminal(Vec<Shape>),
    /// Consumes `expects`, then pushes `gives` on top of what remains.
    PurelyAdditive { expects: Vec<Shape>, gives: Vec<Shape> },
    /// Consumes `before` and replaces it with `after`; unlike
    /// `PurelyAdditive`, net stack depth may shrink or grow.
    Mutative { before: Vec<Shape>, after: Vec<Shape> },
}

impl WordSignature {
    /// The signature of a well-known-entity word that pushes exactly one
    /// shape and consumes nothing. Every primitive kind gets one of these
    /// at `Runtime` init (spec §4.9).
    pub fn nullary_single(shape: Shape) -> Self {
        WordSignature::Nullary(vec![shape])
    }

    /// Structural equality, used by [`WordSignaturePool`] to dedup.
    pub fn structurally_eq(&self, other: &WordSignature) -> bool {
        fn shapes_eq(a: &[Shape], b: &[Shape]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structurally_eq(y))
        }
        match (self, other) {
            (WordSignature::SideEffectary, WordSignature::SideEffectary) => true,
            (WordSignature::Nullary(a), WordSignature::Nullary(b)) => shapes_eq(a, b),
            (WordSignature::NullaryTerminal, WordSignature::NullaryTerminal) => true,
            (WordSignature::PurelyConsuming(a), WordSignature::PurelyConsuming(b)) => {
                shapes_eq(a, b)
            }
            (WordSignature::ConsumingTerminal(a), WordSignature::ConsumingTerminal(b)) => {
                shapes_eq(a, b)
            }
            (
                WordSignature::PurelyAdditive { expects: ae, gives: ag },
                WordSignature::PurelyAdditive { expects: be, gives: bg },
            ) => shapes_eq(ae, be) && shapes_eq(ag, bg),
            (
                WordSignature::Mutative { before: ab, after: aa },
                WordSignature::Mutative { before: bb, after: ba },
            ) => shapes_eq(ab, bb) && shapes_eq(aa, ba),
            _ => false,
        }
    }

    /// Can `other` (the signature actually attached to the word being
    /// dispatched) stand in for `self` (the signature a call site
    /// declared/expects)?
    ///
    /// `NullaryTerminal`/`ConsumingTerminal` are compatible with same-tag
    /// terminals regardless of what would otherwise be their (nonexistent)
    /// right side, per spec §4.5's "treat the missing right side as
    /// anything" rule — there is nothing to compare, so the tag match
    /// alone is sufficient.
    pub fn compatible_with(
        &self,
        other: &WordSignature,
    ) -> Result<SignatureCompat, SignatureIncompatReason> {
        match (self, other) {
            (WordSignature::SideEffectary, WordSignature::SideEffectary) => {
                Ok(SignatureCompat::Compatible)
            }
            (WordSignature::NullaryTerminal, WordSignature::NullaryTerminal) => {
                Ok(SignatureCompat::Compatible)
            }
            (WordSignature::Nullary(a), WordSignature::Nullary(b)) => {
                let mut resolutions = HashMap::new();
                let right = check_side(a, b, &mut resolutions)?;
                finish(None, Some(right))
            }
            (WordSignature::PurelyConsuming(a), WordSignature::PurelyConsuming(b)) => {
                let mut resolutions = HashMap::new();
                let left = check_side(a, b, &mut resolutions)?;
                finish(Some(left), None)
            }
            (WordSignature::ConsumingTerminal(a), WordSignature::ConsumingTerminal(b)) => {
                let mut resolutions = HashMap::new();
                let left = check_side(a, b, &mut resolutions)?;
                finish(Some(left), None)
            }
            (
                WordSignature::PurelyAdditive { expects: ae, gives: ag },
                WordSignature::PurelyAdditive { expects: be, gives: bg },
            ) => {
                let mut resolutions = HashMap::new();
                let left = check_side(ae, be, &mut resolutions)?;
                let right = check_side(ag, bg, &mut resolutions)?;
                finish(Some(left), Some(right))
            }
            (
                WordSignature::Mutative { before: ab, after: aa },
                WordSignature::Mutative { before: bb, after: ba },
            ) => {
                let mut resolutions = HashMap::new();
                let left = check_side(ab, bb, &mut resolutions)?;
                let right = check_side(aa, ba, &mut resolutions)?;
                finish(Some(left), Some(right))
            }
            _ => Err(SignatureIncompatReason::Incomparable),
        }
    }
}

/// One side's outcome from [`check_side`]: either a shape-count mismatch
/// (the two lists could not even be walked pairwise) or the (possibly
/// empty) list of per-index element failures.
enum SideCheck {
    CountMismatch(ShapeCountMismatch),
    Failures(Vec<(usize, ShapeReason)>),
}

/// Walk one shape list pairwise, recording up to `MAX_CATCHALL_REPORT`
/// failing indices and folding any catch-all resolutions discovered along
/// the way into `resolutions`. A disagreement between two *different*
/// already-resolved candidates for the same catch-all id aborts the whole
/// comparison immediately — it is a structural conflict, not a per-index
/// failure to accumulate.
fn check_side(
    expected: &[Shape],
    provided: &[Shape],
    resolutions: &mut HashMap<u8, Shape>,
) -> Result<SideCheck, SignatureIncompatReason> {
    if expected.len() != provided.len() {
        return Ok(SideCheck::CountMismatch(ShapeCountMismatch {
            expected: expected.len(),
            found: provided.len(),
        }));
    }
    let mut failures = Vec::new();
    for (i, (e, p)) in expected.iter().zip(provided.iter()).enumerate() {
        match e.compatible_with(p) {
            Ok(ShapeCompat::Compatible) => {}
            Ok(ShapeCompat::Indeterminate) => match e.contents() {
                ShapeContents::CatchAll(id) => match resolutions.get(id) {
                    Some(existing) if !existing.structurally_eq(p) => {
                        return Err(SignatureIncompatReason::CatchAllMultipleResolutionCandidates(
                            *id,
                        ));
                    }
                    Some(_) => {}
                    None => {
                        resolutions.insert(*id, p.clone());
                    }
                },
                // The expected side is concrete (or `Empty`); an
                // `Indeterminate` verdict here comes either from a
                // provided-side catch-all (shape step 4) or from a
                // bounded refinement of the same underlying kind (shape
                // step 5). A concrete expectation has nothing to
                // unify an unresolved generic against, so that case is a
                // genuine incompatibility (spec Testable Property 4: a
                // concrete `( Boolean -> )` expectation must reject a
                // `( @1 -> )` provider, even though the reverse is
                // compatible). A same-kind bounded/unbounded pairing with
                // no catch-all involved legitimately defers to a runtime
                // `in-bounds?` check and is left unrecorded here.
                _ => {
                    if matches!(p.contents(), ShapeContents::CatchAll(_))
                        && failures.len() < MAX_CATCHALL_REPORT
                    {
                        failures.push((i, ShapeReason::Incomparable));
                    }
                }
            },
            Err(reason) => {
                if failures.len() < MAX_CATCHALL_REPORT {
                    failures.push((i, reason));
                }
            }
        }
    }
    Ok(SideCheck::Failures(failures))
}

fn finish(
    left: Option<SideCheck>,
    right: Option<SideCheck>,
) -> Result<SignatureCompat, SignatureIncompatReason> {
    let left_count = match &left {
        Some(SideCheck::CountMismatch(m)) => Some(*m),
        _ => None,
    };
    let right_count = match &right {
        Some(SideCheck::CountMismatch(m)) => Some(*m),
        _ => None,
    };
    if left_count.is_some() || right_count.is_some() {
        return Err(SignatureIncompatReason::DisparateShapeCount { left: left_count, right: right_count });
    }

    let left = match left {
        Some(SideCheck::Failures(v)) if !v.is_empty() => Some(v),
        _ => None,
    };
    let right = match right {
        Some(SideCheck::Failures(v)) if !v.is_empty() => Some(v),
        _ => None,
    };
    if left.is_some() || right.is_some() {
        Err(SignatureIncompatReason::UnderlyingShapesIncompatible { left, right })
    } else {
        Ok(SignatureCompat::Compatible)
    }
}

/// Outcome of a successful [`WordSignature::compatible_with`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCompat {
    Compatible,
}

/// Why two signatures failed to be comparable/compatible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureIncompatReason {
    /// The two signatures are different families (tags), or are the same
    /// family but in a shape not handled above (terminal vs. non-terminal
    /// of the same base family, say).
    Incomparable,
    /// Which side(s) of the signature disagreed in element count. `left`
    /// is the expects/before list, `right` is the gives/after list — a
    /// front-end can recover which half of the stack-notation mismatched
    /// from whichever field is `Some`.
    DisparateShapeCount {
        left: Option<ShapeCountMismatch>,
        right: Option<ShapeCountMismatch>,
    },
    UnderlyingShapesIncompatible {
        left: Option<Vec<(usize, ShapeReason)>>,
        right: Option<Vec<(usize, ShapeReason)>>,
    },
    CatchAllMultipleResolutionCandidates(u8),
}

/// How many shapes were expected versus provided on one side of a
/// signature comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeCountMismatch {
    pub expected: usize,
    pub found: usize,
}

impl std::fmt::Display for SignatureIncompatReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureIncompatReason::Incomparable => write!(f, "incomparable signature families"),
            SignatureIncompatReason::DisparateShapeCount { left, right } => {
                write!(f, "disparate shape count (left={left:?}, right={right:?})")
            }
            SignatureIncompatReason::UnderlyingShapesIncompatible { left, right } => {
                write!(f, "underlying shapes incompatible (left={left:?}, right={right:?})")
            }
            SignatureIncompatReason::CatchAllMultipleResolutionCandidates(id) => {
                write!(f, "catch-all @{id} would have to resolve to two distinct shapes")
            }
        }
    }
}

impl Prunable for WordSignature {
    const MODE: PruneMode = PruneMode::Owned;
    fn prune(self) {}
}

/// A stable handle to a pooled [`WordSignature`].
pub type SignatureHandle = Handle<WordSignature>;

/// Deduplicating set of signatures: each unique signature is stored
/// exactly once, and callers receive a handle usable for pointer-equality
/// checks (spec §3).
#[derive(Default)]
pub struct WordSignaturePool {
    entries: Vec<SignatureHandle>,
}

impl WordSignaturePool {
    pub fn new() -> Self {
        WordSignaturePool { entries: Vec::new() }
    }

    /// Intern `sig`, returning the existing handle if a structurally
    /// identical signature is already pooled.
    pub fn intern(&mut self, sig: WordSignature) -> SignatureHandle {
        if let Some(existing) = self.entries.iter().find(|h| h.get().structurally_eq(&sig)) {
            existing.bump_ref().expect("pooled signature handle was pruned while still pooled");
            return *existing;
        }
        let handle = Handle::new_referenced(sig);
        self.entries.push(handle);
        handle
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
