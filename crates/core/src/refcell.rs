//! A manually-refcounted cell.
//!
//! This is deliberately not `std::rc::Rc`: the nucleus's ownership
//! discipline (spec §4.1) requires explicit `incref`/`decref` calls at each
//! point a handle is copied onto the stack or dropped off it, and requires
//! that the *moment* the count reaches zero be externally observable (the
//! caller decides whether and how to tear the payload down, which
//! `Rc::drop` does not expose). Counting is atomic so a future
//! coarse-grained-parallel evaluator (spec §5, explicitly deferred) would
//! not need to change this layer, even though only one evaluator touches a
//! `Refcell` at a time today.

use std::sync::atomic::{AtomicU16, Ordering};

use crate::error::{Error, Result};

/// How a payload is torn down once its `Refcell` dies.
///
/// Spec §4.1 derives this statically from the payload type ("single-owned
/// pointer, slice, owned struct with an allocator-taking destructor, owned
/// struct with a self-managed destructor"). We make that literal: every
/// `T` stored in a `Refcell<T>` implements [`Prunable`], which fixes its
/// `PruneMode` at the type level, so calling `decref_and_prune` with the
/// wrong mode for a given `T` cannot compile-time-silently happen — the
/// mode you pass is asserted against `T::MODE` and a mismatch is a
/// programmer error (panic), not a recoverable `Result`.
///
/// We do not thread an explicit `allocator` argument through `prune`
/// (unlike the literal spec signature `decref_and_prune(mode, allocator)`):
/// Rust's global allocator is implicit in `Box`/`Vec`/`String` drop glue,
/// so there is nothing for a caller-supplied allocator to do that `Drop`
/// does not already do. See `DESIGN.md` for this decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneMode {
    /// A single heap-owned value, freed by ordinary `Drop`.
    Owned,
    /// An owned byte/element slice, freed by ordinary `Drop`.
    Slice,
    /// A struct whose teardown needs to recurse into other `Refcell`
    /// handles it owns (e.g. a compound word's inner word list) before
    /// its own storage is freed.
    SelfManaged,
}

/// A type that can live inside a [`Refcell`].
pub trait Prunable {
    /// The static prune mode for this payload kind.
    const MODE: PruneMode;

    /// Tear the payload down. For `Owned`/`Slice` payloads this can simply
    /// be `drop(self)`; `SelfManaged` payloads recurse into owned handles
    /// first.
    fn prune(self);
}

/// A manually-refcounted cell around an owned payload.
///
/// Invariant: `value.is_none() <=> strong_count == 0`. The cell itself may
/// be embedded in another struct or placed behind a `Box`/`Arc` by the
/// caller; `Refcell` does not assume its own storage location.
pub struct Refcell<T: Prunable> {
    strong_count: AtomicU16,
    value: Option<T>,
}

impl<T: Prunable> Refcell<T> {
    /// Construct a cell with no references yet (`strong_count == 0`).
    ///
    /// This is the constructor used when a value is about to be handed to
    /// exactly one caller who will immediately `incref` it (e.g. interning
    /// a brand-new symbol before returning its handle).
    pub fn init(value: T) -> Self {
        Refcell {
            strong_count: AtomicU16::new(0),
            value: Some(value),
        }
    }

    /// Construct a cell already holding one reference (`strong_count ==
    /// 1`). Reserved for tests and interning helpers that want to skip the
    /// separate `incref` call.
    pub fn init_referenced(value: T) -> Self {
        Refcell {
            strong_count: AtomicU16::new(1),
            value: Some(value),
        }
    }

    /// Current strong count. Exposed for diagnostics and tests, not for
    /// control flow — callers should rely on `incref`/`decref` return
    /// values instead of racing to read this first.
    pub fn strong_count(&self) -> u16 {
        self.strong_count.load(Ordering::Relaxed)
    }

    /// Borrow the payload. Panics if the cell is already dead; a dead
    /// cell should never be reachable (its last owner should have dropped
    /// the handle along with decrementing the count).
    pub fn get(&self) -> &T {
        self.value
            .as_ref()
            .expect("Refcell::get on a dead cell (strong_count reached zero)")
    }

    /// Increment the strong count.
    ///
    /// Fails with [`Error::ExhaustedRefcell`] if the payload is already
    /// gone — incrementing a dead cell would resurrect a dangling handle.
    pub fn incref(&self) -> Result<()> {
        if self.value.is_none() {
            return Err(Error::ExhaustedRefcell);
        }
        self.strong_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Decrement the strong count.
    ///
    /// Uses release ordering on the decrement itself (earlier writes to
    /// the payload by this owner must be visible to whichever thread
    /// drives the count to zero) and, on the transition to zero, an
    /// acquire fence before nulling the payload (so that any writes by
    /// concurrent decrementers that raced to see count==1 are visible
    /// here). Returns `true` if the cell is still live after the
    /// decrement, `false` if this call just killed it.
    ///
    /// # Panics
    /// If the count is already zero (decrementing past zero is a
    /// programmer error, not a recoverable condition).
    pub fn decref(&mut self) -> bool {
        let prev = self.strong_count.fetch_sub(1, Ordering::Release);
        assert!(prev > 0, "decref on a Refcell whose strong_count was already zero");
        if prev == 1 {
            std::sync::atomic::fence(Ordering::Acquire);
            self.value = None;
            false
        } else {
            true
        }
    }

    /// Decrement the strong count and, if this call just killed the cell,
    /// prune the payload immediately.
    ///
    /// `mode` must equal `T::MODE`; passing the wrong mode for a given `T`
    /// is a programmer error and panics rather than silently mistearing
    /// down the payload.
    pub fn decref_and_prune(&mut self, mode: PruneMode) -> bool {
        assert_eq!(
            mode,
            T::MODE,
            "decref_and_prune called with the wrong PruneMode for this payload type"
        );
        let prev = self.strong_count.fetch_sub(1, Ordering::Release);
        assert!(
            prev > 0,
            "decref_and_prune on a Refcell whose strong_count was already zero"
        );
        if prev == 1 {
            std::sync::atomic::fence(Ordering::Acquire);
            if let Some(value) = self.value.take() {
                value.prune();
            }
            false
        } else {
            true
        }
    }

    /// Tear the payload down immediately, refusing if any reference
    /// besides the caller's own is still outstanding.
    ///
    /// Unlike `decref_and_prune`, which always removes exactly one
    /// reference and only prunes once that was the last one, this demands
    /// sole ownership up front — spec §7's `AttemptedDestructionOfPopulous`.
    pub fn try_destroy(&mut self, mode: PruneMode) -> Result<()> {
        assert_eq!(
            mode,
            T::MODE,
            "try_destroy called with the wrong PruneMode for this payload type"
        );
        if self.strong_count() > 1 {
            return Err(Error::AttemptedDestructionOfPopulous);
        }
        self.decref_and_prune(mode);
        Ok(())
    }

    /// Reports whether the cell is dead (`count == 0 && value.is_none()`).
    ///
    /// # Panics
    /// If the count and the payload disagree — that is a broken
    /// invariant, not a normal outcome.
    pub fn dead(&self) -> bool {
        let count_dead = self.strong_count() == 0;
        let value_dead = self.value.is_none();
        assert_eq!(
            count_dead, value_dead,
            "Refcell invariant violated: strong_count and payload presence disagree"
        );
        count_dead
    }
}

/// A pointer-sized handle to a heap-allocated [`Refcell`].
///
/// `Object`'s heap variants (String, Symbol, Opaque, Word) need several
/// independent stack slots to alias the *same* cell and each
/// independently call `incref`/`decref` on it — an owned `Refcell<T>`
/// embedded by value cannot be shared that way without re-introducing
/// `Rc`'s own (redundant, and differently-timed) counting on top of ours.
/// So, matching the source corpus's own habit of reaching for raw
/// pointers at exactly this kind of FFI/shared-ownership seam (see e.g.
/// `Box::into_raw`/`Arc::into_raw` throughout `crates/runtime/src/stack.rs`
/// in the teacher), a `Handle<T>` is a raw pointer to a heap-boxed
/// `Refcell<T>`. It is `Copy`: copying a handle is a bare pointer copy and
/// never by itself changes the refcount — only [`Handle::bump_ref`] does
/// that, mirroring the "copying an `Object` conceptually *ref*s it" rule
/// from spec §3 being something call sites opt into explicitly rather
/// than something that happens on every `Clone`.
pub struct Handle<T: Prunable> {
    ptr: *mut Refcell<T>,
}

impl<T: Prunable> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: Prunable> Copy for Handle<T> {}

impl<T: Prunable> Handle<T> {
    /// Allocate a fresh cell with `strong_count == 0` ("no gale-side
    /// references yet") and return a handle to it.
    pub fn new(value: T) -> Self {
        let boxed = Box::new(Refcell::init(value));
        Handle { ptr: Box::into_raw(boxed) }
    }

    /// Allocate a fresh cell already carrying one reference.
    pub fn new_referenced(value: T) -> Self {
        let boxed = Box::new(Refcell::init_referenced(value));
        Handle { ptr: Box::into_raw(boxed) }
    }

    /// Borrow the underlying cell.
    ///
    /// # Safety
    /// The handle must not have outlived the point at which its cell's
    /// storage was freed by `decref_and_prune_cell`. The nucleus upholds
    /// this by never reading a handle after the operation that dropped
    /// its last reference.
    pub fn cell(&self) -> &Refcell<T> {
        unsafe { &*self.ptr }
    }

    fn cell_mut(&self) -> &mut Refcell<T> {
        unsafe { &mut *self.ptr }
    }

    /// Borrow the payload directly.
    pub fn get(&self) -> &T {
        self.cell().get()
    }

    /// Increment the strong count.
    pub fn bump_ref(&self) -> Result<()> {
        self.cell().incref()
    }

    /// Raw pointer identity, for `Object::eq`'s pointer-equality rule on
    /// heap variants.
    pub fn addr(&self) -> usize {
        self.ptr as usize
    }

    /// Decrement the strong count, prune the payload if this call killed
    /// the cell, and — only then — free the cell's own heap storage.
    ///
    /// This is the literal `decref_and_prune` from spec §4.1 plus the
    /// "optionally frees the cell itself" clause: freeing the cell is a
    /// separately directed action because the *cell* may still be
    /// embedded in, e.g., a `WordList` slot that another structure owns;
    /// `Handle` always owns its cell uniquely once constructed via `new`,
    /// so for `Handle` the two actions always happen together.
    pub fn decref_and_prune_cell(&self, mode: PruneMode) {
        let still_alive = self.cell_mut().decref_and_prune(mode);
        if !still_alive {
            unsafe {
                drop(Box::from_raw(self.ptr));
            }
        }
    }

    /// Tear down both the payload and the cell's own heap storage
    /// immediately, refusing with [`Error::AttemptedDestructionOfPopulous`]
    /// if another reference is still outstanding.
    pub fn try_destroy_cell(&self, mode: PruneMode) -> Result<()> {
        self.cell_mut().try_destroy(mode)?;
        unsafe {
            drop(Box::from_raw(self.ptr));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owned(Vec<u8>);
    impl Prunable for Owned {
        const MODE: PruneMode = PruneMode::Owned;
        fn prune(self) {
            drop(self.0);
        }
    }

    #[test]
    fn init_starts_at_zero() {
        let cell = Refcell::init(Owned(vec![1, 2, 3]));
        assert_eq!(cell.strong_count(), 0);
        assert!(!cell.dead()); // value present, count zero is a valid transient state pre-incref
    }

    #[test]
    fn incref_decref_round_trip() {
        let mut cell = Refcell::init_referenced(Owned(vec![9]));
        cell.incref().unwrap();
        assert_eq!(cell.strong_count(), 2);
        assert!(cell.decref());
        assert_eq!(cell.strong_count(), 1);
        assert!(!cell.decref());
        assert!(cell.dead());
    }

    #[test]
    fn incref_on_dead_cell_is_exhausted() {
        let mut cell = Refcell::init_referenced(Owned(vec![]));
        cell.decref();
        assert!(cell.dead());
        assert!(matches!(cell.incref(), Err(Error::ExhaustedRefcell)));
    }

    #[test]
    fn decref_and_prune_runs_teardown_on_death() {
        let mut cell = Refcell::init_referenced(Owned(vec![1, 2, 3]));
        assert!(!cell.decref_and_prune(PruneMode::Owned));
        assert!(cell.dead());
    }

    #[test]
    #[should_panic(expected = "wrong PruneMode")]
    fn decref_and_prune_rejects_mismatched_mode() {
        let mut cell = Refcell::init_referenced(Owned(vec![]));
        cell.decref_and_prune(PruneMode::Slice);
    }

    #[test]
    #[should_panic(expected = "already zero")]
    fn decref_past_zero_panics() {
        let mut cell = Refcell::init(Owned(vec![]));
        cell.decref();
    }

    #[test]
    fn try_destroy_refuses_a_populous_cell() {
        let mut cell = Refcell::init_referenced(Owned(vec![1]));
        cell.incref().unwrap();
        assert_eq!(cell.strong_count(), 2);
        assert!(matches!(
            cell.try_destroy(PruneMode::Owned),
            Err(Error::AttemptedDestructionOfPopulous)
        ));
        assert_eq!(cell.strong_count(), 2);
    }

    #[test]
    fn try_destroy_succeeds_on_sole_ownership() {
        let mut cell = Refcell::init_referenced(Owned(vec![1]));
        assert!(cell.try_destroy(PruneMode::Owned).is_ok());
        assert!(cell.dead());
    }

    #[test]
    fn handle_try_destroy_cell_refuses_while_populous() {
        let h1 = Handle::new_referenced(Owned(vec![1, 2, 3]));
        h1.bump_ref().unwrap();
        let h2 = h1;

        assert!(matches!(
            h1.try_destroy_cell(PruneMode::Owned),
            Err(Error::AttemptedDestructionOfPopulous)
        ));
        assert_eq!(h2.cell().strong_count(), 2);
        h1.decref_and_prune_cell(PruneMode::Owned);
        h2.decref_and_prune_cell(PruneMode::Owned);
    }

    #[test]
    fn handle_shares_one_cell_across_copies() {
        let h1 = Handle::new_referenced(Owned(vec![1, 2, 3]));
        let h2 = h1; // Copy — bare pointer copy, no refcount change
        assert_eq!(h1.addr(), h2.addr());
        assert_eq!(h1.cell().strong_count(), 1);

        h2.bump_ref().unwrap();
        assert_eq!(h1.cell().strong_count(), 2);

        h1.decref_and_prune_cell(PruneMode::Owned);
        assert_eq!(h2.cell().strong_count(), 1);
        h2.decref_and_prune_cell(PruneMode::Owned);
        // Both references are gone; the cell's storage has been freed.
        // (Reading through the handle again would be a use-after-free,
        // so the test stops here rather than calling h1.cell() again.)
    }
}
