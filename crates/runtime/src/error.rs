//! Error taxonomy for the `gale-runtime` layer (spec §7).
//!
//! Same hand-rolled shape as `gale_core::Error`: a `Debug`-derived enum, a
//! manual `Display`, and a manual `std::error::Error`. `gale_runtime::Error`
//! wraps `gale_core::Error` via `From` rather than duplicating the leaf
//! variants, so a `?` inside `gale-runtime` on a `gale_core::Result` just
//! works.

use std::fmt;

/// Result alias used throughout `gale-runtime`.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Everything from the leaf layer: refcell exhaustion, stack
    /// under/overflow, shape incompatibility, etc.
    Core(gale_core::Error),

    /// An operation expected one object `Kind` and found another.
    TypeError { expected: &'static str, found: &'static str },

    /// A value was structurally valid but out of the expected range (a
    /// private-space address past the end of the array, an arity outside
    /// 1..=5 for `@DEFINE-WORD-VAn`).
    ValueError(String),

    /// Parser errors (spec §4.7).
    EmptyWord,
    InvalidWordName,
    UnknownSlashedSuffix,

    /// A handle's cell had already died (`dead() == true`) by the time it
    /// was dispatched — spec §4.6's "a null value behind the handle is
    /// `EmptyWord`" extended to the general case of any dead handle
    /// reached through dispatch.
    DeadHandle,

    /// Signature incompatibility detected before dispatch.
    SignatureIncompatible(gale_core::SignatureIncompatReason),

    /// A primitive or dictionary path that is deliberately unimplemented
    /// (spec §4.8 marks `Simple`/`Ref` dispatch's exact tiebreak rule as
    /// an open question; this is reserved for primitives this nucleus
    /// does not provide, not for that resolved tiebreak).
    Unimplemented(&'static str),

    /// `@DEFINE-WORD-VAn`/dictionary lookup named a symbol with no
    /// registered definitions at all.
    NoSuchWord,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Core(e) => write!(f, "{e}"),
            Error::TypeError { expected, found } => {
                write!(f, "type error: expected {expected}, found {found}")
            }
            Error::ValueError(msg) => write!(f, "value error: {msg}"),
            Error::EmptyWord => write!(f, "empty word token"),
            Error::InvalidWordName => write!(f, "invalid word name"),
            Error::UnknownSlashedSuffix => write!(f, "unknown slashed numeric suffix"),
            Error::DeadHandle => write!(f, "dispatched a handle whose cell was already dead"),
            Error::SignatureIncompatible(reason) => {
                write!(f, "signature incompatible: {reason}")
            }
            Error::Unimplemented(what) => write!(f, "unimplemented: {what}"),
            Error::NoSuchWord => write!(f, "no word registered under that symbol"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Core(e) => Some(e),
            _ => None,
        }
    }
}

impl From<gale_core::Error> for Error {
    fn from(e: gale_core::Error) -> Self {
        Error::Core(e)
    }
}

impl From<gale_core::SignatureIncompatReason> for Error {
    fn from(e: gale_core::SignatureIncompatReason) -> Self {
        Error::SignatureIncompatible(e)
    }
}
