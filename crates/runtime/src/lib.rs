//! Gale Runtime: the dictionary, parser, evaluator, and primitive word
//! catalog built on top of `gale-core`.
//!
//! This crate owns everything `gale-core` deliberately does not: what a
//! stack value actually looks like ([`object::Object`]), what a callable
//! word is ([`word::WordData`]), how names resolve to words
//! ([`dictionary::Dictionary`]), how source text becomes tokens
//! ([`parser::parse_word`]), and the evaluator that ties all of it
//! together ([`runtime::Runtime`]).
//!
//! - [`runtime`]: `Runtime`, owner of the stack, dictionary, pools, and
//!   private space; drives `eval`.
//! - [`object`]: `Object`, the eight-variant tagged stack value.
//! - [`word`]: `WordData`/`WordHandle`, the three implementation kinds
//!   (Primitive, Compound, HeapLit), and `run_word` dispatch.
//! - [`dictionary`]: name -> word-list resolution.
//! - [`parser`]: single-token classification (`ParsedWord`).
//! - [`private_space`]: the interpreter-mode byte array.
//! - [`well_known`]: the one shape + one `NullarySingle` signature built
//!   per primitive kind at `Runtime` init.
//! - [`bounded`]: the `SmallUInt` bounded-shape example and its
//!   `in-bounds?` primitive.
//! - [`primitives`]: the minimum-viable primitive word catalog.
//! - [`diagnostics`]: read-only introspection dump.
//! - [`error`]: the error taxonomy, wrapping `gale_core::Error`.

pub mod bounded;
pub mod dictionary;
pub mod diagnostics;
pub mod error;
pub mod object;
pub mod parser;
pub mod private_space;
pub mod primitives;
pub mod runtime;
pub mod well_known;
pub mod word;

pub use dictionary::{Dictionary, WordList};
pub use error::{Error, Result};
pub use object::{Kind, Object, OpaqueHandle, StringHandle};
pub use parser::ParsedWord;
pub use private_space::{InterpreterMode, PrivateSpace, PRIVATE_SPACE_SIZE};
pub use runtime::Runtime;
pub use well_known::WellKnown;
pub use word::{run_word, SignatureSource, WordData, WordFlags, WordHandle, WordImpl, WordSignatureState};
