//! The `Runtime`: owns the stack, dictionary, pools, and private space,
//! and drives `eval` (spec §4.8, §5).

use gale_core::shape::PrimKind;
use gale_core::signature::WordSignaturePool;
use gale_core::stack::Stack;
use gale_core::symbol::SymbolPool;

use crate::bounded::BoundedRegistry;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::object::Object;
use crate::parser::{parse_word, ParsedWord};
use crate::private_space::{InterpreterMode, PrivateSpace};
use crate::well_known::WellKnown;
use crate::word::{run_word, WordHandle};

/// ASCII whitespace bytes that delimit tokens (spec §6).
const DELIMITERS: [u8; 3] = [b' ', b'\t', b'\n'];

fn is_delimiter(b: u8) -> bool {
    DELIMITERS.contains(&b)
}

/// Owns every piece of mutable nucleus state. Multiple `Runtime`s may
/// coexist in one process, each independent (spec §5: "there is no
/// process-global state except the private-space byte array, which is
/// itself a field on the Runtime").
pub struct Runtime {
    pub stack: Stack<Object>,
    pub dictionary: Dictionary,
    pub symbols: SymbolPool,
    pub signatures: WordSignaturePool,
    pub private_space: PrivateSpace,
    pub well_known: WellKnown,
    pub bounded: BoundedRegistry,
    /// `@BEFORE_WORD`-registered pre-dispatch hook. Spec §6 names the
    /// primitive but leaves its exact handshake underspecified (§9); we
    /// formalize it here as "run with no arguments immediately before
    /// every `Simple`/`Ref` dispatch that actually executes a word (not
    /// before literal pushes)", recorded in `DESIGN.md`.
    before_word_hook: Option<WordHandle>,
}

impl Runtime {
    pub fn new() -> Self {
        let mut signatures = WordSignaturePool::new();
        let well_known = WellKnown::new(&mut signatures);
        let mut rt = Runtime {
            stack: Stack::new(),
            dictionary: Dictionary::new(),
            symbols: SymbolPool::new(),
            signatures,
            private_space: PrivateSpace::new(),
            well_known,
            bounded: BoundedRegistry::new(),
            before_word_hook: None,
        };
        crate::primitives::install(&mut rt);
        crate::bounded::install_small_uint(&mut rt);
        tracing::info!("gale runtime initialized");
        rt
    }

    pub fn set_before_word_hook(&mut self, hook: WordHandle) {
        if let Some(old) = self.before_word_hook.replace(hook) {
            old.decref_and_prune_cell(gale_core::refcell::PruneMode::SelfManaged);
        }
    }

    fn run_before_word_hook(&mut self) -> Result<()> {
        if let Some(hook) = self.before_word_hook {
            tracing::trace!("running @BEFORE_WORD hook");
            run_word(self, hook)?;
        }
        Ok(())
    }

    /// Evaluate one chunk of source text: tokenize on ASCII whitespace,
    /// honoring double-quoted strings, and dispatch each token in turn
    /// (spec §4.8).
    pub fn eval(&mut self, input: &str) -> Result<()> {
        let bytes = input.as_bytes();
        let mut i = 0usize;
        let mut token_start = 0usize;
        let mut in_string = false;

        while i < bytes.len() {
            let b = bytes[i];
            if in_string {
                if b == b'"' {
                    in_string = false;
                }
                i += 1;
                continue;
            }
            if b == b'"' {
                if i != token_start {
                    // A quote appearing mid-token (not at its start) is
                    // InvalidWordName (spec §4.8).
                    return Err(Error::InvalidWordName);
                }
                in_string = true;
                i += 1;
                continue;
            }
            if is_delimiter(b) {
                if i != token_start {
                    self.dispatch_word_by_input(&input[token_start..i])?;
                }
                i += 1;
                token_start = i;
                continue;
            }
            i += 1;
        }
        if in_string {
            return Err(Error::InvalidWordName);
        }
        if token_start < bytes.len() {
            self.dispatch_word_by_input(&input[token_start..])?;
        }
        Ok(())
    }

    /// Parse and dispatch a single token (spec §4.8).
    pub fn dispatch_word_by_input(&mut self, token: &str) -> Result<()> {
        let mode = self.private_space.mode();
        let parsed = match mode {
            InterpreterMode::Exec => parse_word(token)?,
            InterpreterMode::Symbol => match parse_word(token)? {
                // An already-explicit symbol/ref/literal token is left
                // alone; the mode only reinterprets a bare `Simple`.
                ParsedWord::Simple { stash: false, hoist: false, name } => ParsedWord::Symbol(name),
                other => other,
            },
            InterpreterMode::Ref => match parse_word(token)? {
                ParsedWord::Simple { stash: false, hoist: false, name } => ParsedWord::Ref(name),
                other => other,
            },
        };
        if !matches!(mode, InterpreterMode::Exec) {
            self.private_space.reset_mode();
        }

        match parsed {
            ParsedWord::EmptyWord => Err(Error::EmptyWord),
            ParsedWord::String(body) => {
                let (handle, _) = self.symbols_intern_as_string(body);
                self.stack.push(Object::String(handle))?;
                Ok(())
            }
            ParsedWord::Symbol(name) => {
                let (handle, _) = self.symbols.get_or_put(name.as_bytes());
                self.stack.push(Object::Symbol(handle))?;
                Ok(())
            }
            ParsedWord::NumFloat(f) => self.stack.push(Object::Float(f)).map_err(Error::from),
            ParsedWord::SignedInt(n) => self.stack.push(Object::SignedInt(n)).map_err(Error::from),
            ParsedWord::UnsignedInt(n) => self.stack.push(Object::UnsignedInt(n)).map_err(Error::from),
            ParsedWord::Ref(name) => {
                let handle = self.resolve_word_handle(name)?;
                handle.bump_ref()?;
                self.stack.push(Object::Word(handle))?;
                Ok(())
            }
            ParsedWord::Simple { stash, hoist, name } => self.dispatch_simple(stash, hoist, name),
        }
    }

    fn symbols_intern_as_string(&mut self, body: &str) -> (crate::object::StringHandle, bool) {
        use crate::object::StringBytes;
        use gale_core::refcell::Handle;
        // Strings are not pooled like symbols (spec §3 only specifies
        // interning for `SymbolPool`); every string literal allocates its
        // own cell, mirroring two distinct `"foo"` literals being
        // independent objects even if byte-identical.
        let handle = Handle::new_referenced(StringBytes(body.as_bytes().to_vec().into_boxed_slice()));
        (handle, false)
    }

    /// `Simple`/`Ref` dictionary lookup and (for `Simple`) execution, with
    /// stash/hoist comma handling (spec §4.7, §4.8).
    ///
    /// The source marks `Simple`/`Ref` dispatch `Unimplemented` and leaves
    /// arity disambiguation undefined (spec §9). We formalize: scan the
    /// `WordList` in registration order and dispatch the first entry whose
    /// declared signature's left-hand shapes are not *positively*
    /// incompatible with the current stack top (an `Indeterminate` bounded
    /// refinement is accepted optimistically, deferring to the word's own
    /// body/`in-bounds?` check rather than rejecting at dispatch time); a
    /// word with no declared signature (or `SideEffectary`/a pure
    /// producer) always matches. Recorded in `DESIGN.md`.
    fn dispatch_simple(&mut self, stash: bool, hoist: bool, name: &str) -> Result<()> {
        self.run_before_word_hook()?;
        let handle = self.resolve_word_handle(name)?;

        let stashed = if stash { Some(self.stack.pop()?) } else { None };
        handle.bump_ref()?;
        let result = run_word(self, handle);
        handle.decref_and_prune_cell(gale_core::refcell::PruneMode::SelfManaged);
        result?;
        if let Some(stashed) = stashed {
            if hoist {
                // Hoist: the stashed object goes back on top of the
                // word's result.
                self.stack.push(stashed)?;
            } else {
                // Stash without hoist still owes the object somewhere;
                // the nucleus's only defined placement for a stashed,
                // non-hoisted value is directly beneath the result, which
                // for a single-push result is indistinguishable from
                // pushing it first. We push it back underneath by popping
                // the (at most one) freshly produced value, restoring the
                // stashed object, then the produced value.
                match self.stack.pop() {
                    Ok(produced) => {
                        self.stack.push(stashed)?;
                        self.stack.push(produced)?;
                    }
                    Err(_) => self.stack.push(stashed)?,
                }
            }
        }
        Ok(())
    }

    fn resolve_word_handle(&mut self, name: &str) -> Result<WordHandle> {
        let (symbol, _) = self.symbols.get_or_put(name.as_bytes());
        let result = match self.dictionary.word_list(symbol) {
            None => Err(Error::NoSuchWord),
            Some(list) if list.is_empty() => Err(Error::NoSuchWord),
            Some(list) => self.pick_overload(list),
        };
        symbol.decref_and_prune_cell(gale_core::refcell::PruneMode::Slice);
        result
    }

    fn pick_overload(&self, list: &crate::dictionary::WordList) -> Result<WordHandle> {
        let mut candidates = list.iter();
        let first = *candidates.next().ok_or(Error::NoSuchWord)?;
        for candidate in std::iter::once(first).chain(list.iter().skip(1).copied()) {
            if self.signature_could_match(candidate) {
                return Ok(candidate);
            }
        }
        Ok(first)
    }

    fn signature_could_match(&self, handle: WordHandle) -> bool {
        let Some(state) = handle.get().signature else { return true };
        let expects: &[gale_core::shape::Shape] = match state.handle.get() {
            gale_core::signature::WordSignature::PurelyConsuming(e) => e,
            gale_core::signature::WordSignature::ConsumingTerminal(e) => e,
            gale_core::signature::WordSignature::PurelyAdditive { expects, .. } => expects,
            gale_core::signature::WordSignature::Mutative { before, .. } => before,
            _ => return true,
        };
        if expects.is_empty() {
            return true;
        }
        // Peek at most `expects.len()` objects from the top, deepest
        // first, matching shape-list ordering.
        let mut depth = 0;
        loop {
            if self.peek_kind_at(depth).is_none() {
                return depth >= expects.len();
            }
            depth += 1;
            if depth == expects.len() {
                break;
            }
        }
        for (i, expected) in expects.iter().enumerate() {
            let idx_from_top = expects.len() - 1 - i;
            let Some(kind) = self.peek_kind_at(idx_from_top) else { return false };
            let Some(prim) = kind.prim_kind() else { continue };
            let actual_shape = self.well_known.shape(prim);
            match expected.compatible_with(actual_shape) {
                Ok(_) => {}
                Err(_) => return false,
            }
        }
        true
    }

    fn peek_kind_at(&self, n: usize) -> Option<crate::object::Kind> {
        // `gale_core::stack::Stack` only exposes peek/peek_pair/peek_trio;
        // walk via repeated pop/restore is unsafe for a const `&self`
        // method, so dispatch-time lookahead is limited to what those
        // three expose directly.
        match n {
            0 => self.stack.peek().ok().map(|o| o.kind()),
            1 => self.stack.peek_pair().ok().map(|(below, _)| below.kind()),
            2 => self.stack.peek_trio().ok().map(|(deep, _, _)| deep.kind()),
            _ => None,
        }
    }

    pub fn prim_kind_of(&self, object: &Object) -> Option<PrimKind> {
        object.kind().prim_kind()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_pushes_literals_in_e1_order() {
        let mut rt = Runtime::new();
        rt.eval("1 2/i 3.14 4 :something \"foo and a bit of bar\" 5/u 6/i 7.5").unwrap();
        assert_eq!(rt.stack.len(), 9);
        assert!(matches!(rt.stack.pop().unwrap(), Object::Float(f) if f == 7.5));
        assert!(matches!(rt.stack.pop().unwrap(), Object::SignedInt(6)));
        assert!(matches!(rt.stack.pop().unwrap(), Object::UnsignedInt(5)));
        match rt.stack.pop().unwrap() {
            Object::String(h) => assert_eq!(&*h.get().0, b"foo and a bit of bar"),
            other => panic!("expected String, got {other:?}"),
        }
        match rt.stack.pop().unwrap() {
            Object::Symbol(h) => assert_eq!(&*h.get().0, b"something"),
            other => panic!("expected Symbol, got {other:?}"),
        }
        assert!(matches!(rt.stack.pop().unwrap(), Object::SignedInt(4)));
        assert!(matches!(rt.stack.pop().unwrap(), Object::Float(f) if f == 3.14));
        assert!(matches!(rt.stack.pop().unwrap(), Object::SignedInt(2)));
        assert!(matches!(rt.stack.pop().unwrap(), Object::SignedInt(1)));
    }

    #[test]
    fn quote_mid_token_is_invalid_word_name() {
        let mut rt = Runtime::new();
        assert!(matches!(rt.eval("foo\"bar\""), Err(Error::InvalidWordName)));
    }

    #[test]
    fn interpreter_mode_toggle_shadows_defined_words() {
        let mut rt = Runtime::new();
        // Define a word named "eq" that would otherwise run if dispatched.
        rt.eval("1/u 0/u @PRIV_SPACE_SET_BYTE").unwrap();
        rt.eval("@EQ").unwrap();
        assert_eq!(rt.stack.len(), 1);
        match rt.stack.pop().unwrap() {
            Object::Symbol(h) => assert_eq!(&*h.get().0, b"@EQ"),
            other => panic!("expected Symbol, got {other:?}"),
        }
    }
}
