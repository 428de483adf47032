//! The chunked value stack (spec §4.3).
//!
//! A `Stack<T>` is a doubly-linked list of fixed-capacity chunks. Only one
//! chunk is ever "current": pushes fill it until it is full, then a single
//! successor chunk is allocated and becomes current; pops that empty the
//! current chunk transparently cross back to the predecessor and free the
//! emptied chunk. Chunk linkage is a hand-rolled intrusive list of raw
//! pointers rather than `Box<Chunk<T>>` trees, matching the source
//! corpus's own habit (`crates/runtime/src/stack.rs`, `son.rs`) of reaching
//! for raw pointers at exactly this kind of self-referential-structure
//! seam that safe ownership types cannot express directly.

use crate::error::{Error, Result};

/// Default chunk capacity (spec §4.3, "default 2048").
pub const DEFAULT_STACK_CHUNK_SIZE: usize = 2048;

/// An element a [`Stack`] can hold.
///
/// `Stack` itself is agnostic to how (or whether) its elements are
/// reference-counted; it only needs to know how to make a second
/// independent copy of a value that is about to appear twice on the
/// stack at once (`dup`, `2dupshuf`). For `gale-runtime`'s `Object`,
/// `duplicate` clones the enum and bumps whatever `Handle` ref count
/// backs a heap variant; for a plain-old-data test element it is a
/// no-op clone.
pub trait StackElement: Sized {
    fn duplicate(&self) -> Self;
}

struct Chunk<T> {
    slots: Vec<Option<T>>,
    /// Count of live (filled) slots; slots `< next_idx` are filled.
    next_idx: usize,
    prev: *mut Chunk<T>,
    next: *mut Chunk<T>,
}

impl<T> Chunk<T> {
    fn boxed(capacity: usize, prev: *mut Chunk<T>) -> Box<Chunk<T>> {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Box::new(Chunk { slots, next_idx: 0, prev, next: std::ptr::null_mut() })
    }
}

/// A chunked, cross-linked stack of `T`.
pub struct Stack<T: StackElement> {
    capacity: usize,
    /// Bottom-most chunk; retained so `Drop` and diagnostics can walk the
    /// whole chain without depending on `current`'s position.
    bottom: *mut Chunk<T>,
    current: *mut Chunk<T>,
}

impl<T: StackElement> Stack<T> {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_STACK_CHUNK_SIZE)
    }

    pub fn with_chunk_size(capacity: usize) -> Self {
        assert!(capacity >= 1, "stack chunk size must be at least 1");
        let chunk = Box::into_raw(Chunk::boxed(capacity, std::ptr::null_mut()));
        Stack { capacity, bottom: chunk, current: chunk }
    }

    /// The terminal-stack guard: public operations refuse to run unless
    /// `current` really is the terminal (most-recently-grown) chunk. In
    /// this implementation `current` is always kept terminal by
    /// construction, so this can only ever observe a consistent state; it
    /// exists so the invariant has somewhere to be asserted, matching the
    /// `*_no_really_even_on_inner_stacks` escape hatches spec §4.3
    /// reserves for the stack's own internal use.
    fn assert_terminal(&self) -> Result<()> {
        let is_terminal = unsafe { (*self.current).next.is_null() };
        if is_terminal {
            Ok(())
        } else {
            Err(Error::YouAlmostCertainlyDidNotMeanToUseThisNonTerminalStack)
        }
    }

    /// Number of objects currently on the stack (all chunks combined).
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut chunk = self.bottom;
        unsafe {
            while !chunk.is_null() {
                count += (*chunk).next_idx;
                chunk = (*chunk).next;
            }
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of chunks currently linked, bottom to top. Diagnostics-only;
    /// no public operation depends on this beyond reporting.
    pub fn chunk_count(&self) -> usize {
        let mut count = 0;
        let mut chunk = self.bottom;
        unsafe {
            while !chunk.is_null() {
                count += 1;
                chunk = (*chunk).next;
            }
        }
        count
    }

    fn push_internal(&mut self, obj: T, grown_already: &mut bool) -> Result<()> {
        unsafe {
            if (*self.current).next_idx == self.capacity {
                if *grown_already {
                    return Err(Error::RefuseToGrowMultipleStacks);
                }
                let new_chunk = Box::into_raw(Chunk::boxed(self.capacity, self.current));
                (*self.current).next = new_chunk;
                self.current = new_chunk;
                *grown_already = true;
            }
            let cur = &mut *self.current;
            cur.slots[cur.next_idx] = Some(obj);
            cur.next_idx += 1;
        }
        Ok(())
    }

    /// Place `obj` on top of the stack. Ownership of `obj` moves onto the
    /// stack; Rust's move semantics already express the "single owner
    /// transfer" that a manual incref would otherwise be needed for, so
    /// unlike `dup`/`2dupshuf` this does not call [`StackElement::duplicate`].
    pub fn push(&mut self, obj: T) -> Result<()> {
        self.assert_terminal()?;
        let mut grown = false;
        self.push_internal(obj, &mut grown)
    }

    fn pop_internal(&mut self) -> Result<T> {
        unsafe {
            loop {
                if (*self.current).next_idx > 0 {
                    let cur = &mut *self.current;
                    cur.next_idx -= 1;
                    let val =
                        cur.slots[cur.next_idx].take().expect("slot marked filled but empty");
                    return Ok(val);
                }
                let prev = (*self.current).prev;
                if prev.is_null() {
                    return Err(Error::Underflow);
                }
                (*prev).next = std::ptr::null_mut();
                drop(Box::from_raw(self.current));
                self.current = prev;
            }
        }
    }

    /// Remove and return the top object.
    pub fn pop(&mut self) -> Result<T> {
        self.assert_terminal()?;
        self.pop_internal()
    }

    /// Pop and discard the top object.
    pub fn drop_top(&mut self) -> Result<()> {
        self.pop().map(|_| ())
    }

    /// Pop `n` objects, or none at all. On underflow partway through, the
    /// objects already popped are pushed back in their original order
    /// before the error is returned, so a failed `pop_pair`/`pop_trio`
    /// leaves the stack exactly as it found it (spec Testable Property 2).
    fn pop_multiple(&mut self, n: usize) -> Result<Vec<T>> {
        let mut popped = Vec::with_capacity(n);
        for _ in 0..n {
            match self.pop_internal() {
                Ok(v) => popped.push(v),
                Err(e) => {
                    let mut grown = false;
                    for v in popped.into_iter().rev() {
                        self.push_internal(v, &mut grown)
                            .expect("restoring objects popped earlier in this call must not fail");
                    }
                    return Err(e);
                }
            }
        }
        popped.reverse();
        Ok(popped)
    }

    /// Pop the top two objects as `(second_from_top, top)`.
    pub fn pop_pair(&mut self) -> Result<(T, T)> {
        self.assert_terminal()?;
        let mut v = self.pop_multiple(2)?;
        let top = v.pop().unwrap();
        let below = v.pop().unwrap();
        Ok((below, top))
    }

    /// Pop the top three objects as `(deepest, middle, top)`.
    pub fn pop_trio(&mut self) -> Result<(T, T, T)> {
        self.assert_terminal()?;
        let mut v = self.pop_multiple(3)?;
        let top = v.pop().unwrap();
        let mid = v.pop().unwrap();
        let deep = v.pop().unwrap();
        Ok((deep, mid, top))
    }

    /// # Safety / lifetime note
    /// `n == 0` is the top, `n == 1` the next one down, and so on.
    fn peek_nth(&self, n: usize) -> Result<&T> {
        let mut chunk = self.current;
        let mut remaining = n;
        unsafe {
            loop {
                if chunk.is_null() {
                    return Err(Error::Underflow);
                }
                let c = &*chunk;
                if remaining < c.next_idx {
                    let idx = c.next_idx - 1 - remaining;
                    return Ok(c.slots[idx].as_ref().expect("slot marked filled but empty"));
                }
                remaining -= c.next_idx;
                chunk = c.prev;
            }
        }
    }

    /// Borrow the top object. The reference is invalidated by the next
    /// mutating operation (spec §4.3).
    pub fn peek(&self) -> Result<&T> {
        self.assert_terminal()?;
        self.peek_nth(0)
    }

    /// Borrow the top two objects as `(second_from_top, top)`.
    pub fn peek_pair(&self) -> Result<(&T, &T)> {
        self.assert_terminal()?;
        Ok((self.peek_nth(1)?, self.peek_nth(0)?))
    }

    /// Borrow the top three objects as `(deepest, middle, top)`.
    pub fn peek_trio(&self) -> Result<(&T, &T, &T)> {
        self.assert_terminal()?;
        Ok((self.peek_nth(2)?, self.peek_nth(1)?, self.peek_nth(0)?))
    }

    /// Re-ref and push the current top (spec §4.3).
    pub fn dup(&mut self) -> Result<()> {
        self.assert_terminal()?;
        let copy = self.peek()?.duplicate();
        self.push(copy)
    }

    /// With top `[.., a, b]`, produce `[.., a, b, a, b]`.
    pub fn dup2_shuffle(&mut self) -> Result<()> {
        self.assert_terminal()?;
        let (a, b) = self.peek_pair()?;
        let (a, b) = (a.duplicate(), b.duplicate());
        self.push(a)?;
        self.push(b)
    }

    /// Exchange the top two objects, crossing a chunk boundary if needed.
    pub fn swap(&mut self) -> Result<()> {
        self.assert_terminal()?;
        let (below, top) = self.pop_pair()?;
        self.push(top)?;
        self.push(below)
    }
}

impl<T: StackElement + std::fmt::Debug> Stack<T> {
    /// A human-readable bottom-to-top dump for diagnostics, in the spirit
    /// of the source corpus's SIGQUIT stack dump.
    pub fn dump(&self) -> String {
        let mut out = String::from("[");
        let mut chunk = self.bottom;
        let mut first = true;
        unsafe {
            while !chunk.is_null() {
                let c = &*chunk;
                for slot in &c.slots[..c.next_idx] {
                    if !first {
                        out.push_str(", ");
                    }
                    first = false;
                    out.push_str(&format!("{:?}", slot.as_ref().unwrap()));
                }
                chunk = c.next;
            }
        }
        out.push(']');
        out
    }
}

impl<T: StackElement> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: StackElement> Drop for Stack<T> {
    fn drop(&mut self) {
        let mut chunk = self.bottom;
        unsafe {
            while !chunk.is_null() {
                let next = (*chunk).next;
                drop(Box::from_raw(chunk));
                chunk = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Tagged(i64);

    impl StackElement for Tagged {
        fn duplicate(&self) -> Self {
            self.clone()
        }
    }

    #[test]
    fn push_pop_round_trip() {
        let mut s: Stack<Tagged> = Stack::with_chunk_size(4);
        s.push(Tagged(1)).unwrap();
        s.push(Tagged(2)).unwrap();
        assert_eq!(s.pop().unwrap(), Tagged(2));
        assert_eq!(s.pop().unwrap(), Tagged(1));
        assert!(matches!(s.pop(), Err(Error::Underflow)));
    }

    #[test]
    fn grows_across_chunk_boundary() {
        let mut s: Stack<Tagged> = Stack::with_chunk_size(2);
        s.push(Tagged(1)).unwrap();
        s.push(Tagged(2)).unwrap();
        s.push(Tagged(3)).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.pop().unwrap(), Tagged(3));
        assert_eq!(s.pop().unwrap(), Tagged(2));
        assert_eq!(s.pop().unwrap(), Tagged(1));
        assert!(s.is_empty());
    }

    #[test]
    fn pop_pair_is_atomic_on_underflow() {
        let mut s: Stack<Tagged> = Stack::with_chunk_size(4);
        s.push(Tagged(1)).unwrap();
        assert!(matches!(s.pop_pair(), Err(Error::Underflow)));
        // The single item pushed earlier must still be there.
        assert_eq!(s.pop().unwrap(), Tagged(1));
    }

    #[test]
    fn dup_pushes_an_independent_copy() {
        let mut s: Stack<Tagged> = Stack::with_chunk_size(4);
        s.push(Tagged(7)).unwrap();
        s.dup().unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.pop().unwrap(), Tagged(7));
        assert_eq!(s.pop().unwrap(), Tagged(7));
    }

    #[test]
    fn dup2_shuffle_matches_spec_example() {
        let mut s: Stack<Tagged> = Stack::with_chunk_size(8);
        s.push(Tagged(1)).unwrap(); // a
        s.push(Tagged(2)).unwrap(); // b
        s.dup2_shuffle().unwrap();
        assert_eq!(s.dump(), "[Tagged(1), Tagged(2), Tagged(1), Tagged(2)]");
    }

    #[test]
    fn swap_exchanges_top_two() {
        let mut s: Stack<Tagged> = Stack::with_chunk_size(4);
        s.push(Tagged(1)).unwrap();
        s.push(Tagged(2)).unwrap();
        s.swap().unwrap();
        assert_eq!(s.pop().unwrap(), Tagged(1));
        assert_eq!(s.pop().unwrap(), Tagged(2));
    }

    #[test]
    fn swap_spans_chunk_boundary() {
        let mut s: Stack<Tagged> = Stack::with_chunk_size(2);
        s.push(Tagged(1)).unwrap();
        s.push(Tagged(2)).unwrap();
        s.push(Tagged(3)).unwrap(); // forces a second chunk
        s.swap().unwrap();
        assert_eq!(s.pop().unwrap(), Tagged(2));
        assert_eq!(s.pop().unwrap(), Tagged(3));
        assert_eq!(s.pop().unwrap(), Tagged(1));
    }

    #[test]
    fn chunk_count_grows_and_reports() {
        let mut s: Stack<Tagged> = Stack::with_chunk_size(2);
        assert_eq!(s.chunk_count(), 1);
        s.push(Tagged(1)).unwrap();
        s.push(Tagged(2)).unwrap();
        s.push(Tagged(3)).unwrap();
        assert_eq!(s.chunk_count(), 2);
    }

    #[test]
    fn refuses_multi_chunk_growth_in_a_single_call() {
        let mut s: Stack<Tagged> = Stack::with_chunk_size(1);
        s.push(Tagged(1)).unwrap();
        // pop_pair with chunk size 1 would, on restore, need to push two
        // items into a one-slot chunk — exercised indirectly by confirming
        // pop_pair still fails cleanly with Underflow rather than growing
        // past the single-successor-per-call budget.
        assert!(matches!(s.pop_pair(), Err(Error::Underflow)));
    }
}
