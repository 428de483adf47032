//! Gale Core: reference-counted cells, a chunked value stack, and shape
//! (structural type) primitives for the Gale nucleus.
//!
//! This crate is the leaf layer — it knows nothing about words,
//! dictionaries, or parsing (those live in `gale-runtime`). What it
//! provides is everything a reference-counted, concatenative stack
//! machine needs underneath that:
//!
//! - [`refcell`]: `Refcell<T>`, a manually-refcounted cell distinct from
//!   `std::rc::Rc` because the nucleus's ownership discipline calls for
//!   explicit `incref`/`decref` rather than automatic `Clone`/`Drop`.
//! - [`stack`]: `Stack<T>`, the chunked, doubly-linked-list value stack,
//!   generic over any element implementing [`stack::StackElement`].
//!   `gale-runtime`'s `Object` is the concrete element type used in
//!   practice; keeping `Stack` generic here keeps the chunk/growth
//!   machinery independent of what a "value" actually is, the same way
//!   the source corpus keeps a raw tagged-stack layout in its core crate
//!   and commits to a concrete `Value` enum only in the runtime crate.
//! - [`shape`]: structural type descriptors (`Shape`) and their
//!   compatibility algorithm, including evolution (nominal newtypes) and
//!   bounded refinements.
//! - [`error`]: the error taxonomy shared by every module above.

pub mod error;
pub mod refcell;
pub mod shape;
pub mod signature;
pub mod stack;
pub mod symbol;

#[cfg(any(test, feature = "leak-check"))]
pub mod test_support;

pub use error::{Error, Result};
pub use refcell::{Handle, PruneMode, Prunable, Refcell};
pub use shape::{PrimKind, Shape, ShapeCompat, ShapeReason};
pub use signature::{
    ShapeCountMismatch, SignatureCompat, SignatureIncompatReason, WordSignature, WordSignaturePool,
    MAX_CATCHALL_REPORT,
};
pub use stack::{Stack, StackElement, DEFAULT_STACK_CHUNK_SIZE};
pub use symbol::{SymbolHandle, SymbolPool};
