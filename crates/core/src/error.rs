//! Error taxonomy for the `gale-core` layer.
//!
//! Follows the hand-rolled style used throughout the source corpus
//! (`SerializeError` in the teacher's runtime crate): a plain `Debug`-derived
//! enum, a manual `Display` impl with one arm per variant, and a manual
//! `std::error::Error` impl. No `thiserror` — the corpus reaches for it only
//! when a crate's error surface is large and heavily `#[from]`-chained,
//! which this one is not.

/// Result alias used throughout `gale-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong below the word/dictionary layer.
///
/// Internal invariant violations (a `Refcell` whose count and payload
/// disagree, a stack chunk whose linkage is broken) are not represented
/// here — those are bugs, and are reported via `panic!`/`assert!` per
/// spec §7 ("Internal invariant violations... panic, because continuing
/// would corrupt memory").
#[derive(Debug)]
pub enum Error {
    /// `Refcell::incref` called on a cell whose count has already reached
    /// zero (value already torn down).
    ExhaustedRefcell,

    /// `Refcell::try_destroy` called on a cell that still has more than
    /// one outstanding reference — destroying it now would leave the
    /// other reference dangling, so this is refused rather than forced.
    AttemptedDestructionOfPopulous,

    /// An operation expected one `Kind` of object and found another.
    TypeError { expected: &'static str, found: &'static str },

    /// A value was structurally valid but out of the expected range
    /// (e.g. a private-space address past the end of the array).
    ValueError(String),

    /// Popped/peeked fewer objects than the stack currently holds.
    Underflow,

    /// Reserved for chunk-internal misuse; the public API never returns
    /// this on its own (see spec §4.3) but it is part of the taxonomy so
    /// `gale-runtime` can match on a single `gale_core::Error` type.
    Overflow,

    /// A single stack operation tried to allocate a second successor
    /// chunk before the first was consumed.
    RefuseToGrowMultipleStacks,

    /// A public `Stack` method was called while the stack's "current"
    /// pointer was not at the terminal (most-recently-pushed-to) chunk.
    YouAlmostCertainlyDidNotMeanToUseThisNonTerminalStack,

    /// Shape-level incompatibility, surfaced with the reason computed by
    /// `Shape::compatible_with`.
    ShapeIncompatible(crate::shape::ShapeReason),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ExhaustedRefcell => {
                write!(f, "incref on a Refcell whose strong count already reached zero")
            }
            Error::AttemptedDestructionOfPopulous => {
                write!(f, "attempted to destroy a Refcell that still has other outstanding references")
            }
            Error::TypeError { expected, found } => {
                write!(f, "type error: expected {expected}, found {found}")
            }
            Error::ValueError(msg) => write!(f, "value error: {msg}"),
            Error::Underflow => write!(f, "stack underflow"),
            Error::Overflow => write!(f, "stack overflow"),
            Error::RefuseToGrowMultipleStacks => write!(
                f,
                "refusing to allocate more than one successor chunk in a single operation"
            ),
            Error::YouAlmostCertainlyDidNotMeanToUseThisNonTerminalStack => write!(
                f,
                "attempted a public stack operation on a non-terminal chunk"
            ),
            Error::ShapeIncompatible(reason) => write!(f, "shape incompatible: {reason}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ShapeIncompatible(_) => None,
            _ => None,
        }
    }
}

impl From<crate::shape::ShapeReason> for Error {
    fn from(e: crate::shape::ShapeReason) -> Self {
        Error::ShapeIncompatible(e)
    }
}
