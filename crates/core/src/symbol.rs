//! Interning pool for symbol/identifier byte strings.
//!
//! Grounded on the same "intern once, hand out stable handles" shape as
//! the teacher's `SeqString` (`crates/runtime/src/seqstring.rs`), but
//! specialized to spec §3's `SymbolPool`: `lookup(bytes) -> (handle,
//! found?)`, where the handle is a [`crate::refcell::Handle`] over an
//! owned byte buffer so ordinary `Object` refcounting rules apply to
//! symbols exactly as they do to strings.

use std::collections::HashMap;

use crate::refcell::{Handle, PruneMode, Prunable};

/// Owned byte payload backing an interned symbol.
pub struct SymbolBytes(pub Box<[u8]>);

impl Prunable for SymbolBytes {
    const MODE: PruneMode = PruneMode::Slice;
    fn prune(self) {
        drop(self.0);
    }
}

/// A stable handle to an interned symbol's bytes.
pub type SymbolHandle = Handle<SymbolBytes>;

/// Deduplicating intern table: raw bytes -> [`SymbolHandle`].
///
/// First insert allocates and copies the bytes; subsequent lookups of the
/// same bytes return the same handle, satisfying spec Testable Property 6
/// (intern stability).
#[derive(Default)]
pub struct SymbolPool {
    table: HashMap<Box<[u8]>, SymbolHandle>,
}

impl SymbolPool {
    pub fn new() -> Self {
        SymbolPool { table: HashMap::new() }
    }

    /// Look up `bytes`, interning them if this is the first time they've
    /// been seen. Returns the handle and whether it was already present.
    ///
    /// The returned handle carries one reference already counted in on
    /// behalf of the caller (mirrors `init_referenced`/the convention that
    /// every handle escaping the pool into `Object` land starts owned by
    /// its first holder); callers that only want to compare bytes without
    /// retaining the symbol should `decref` it once they are done.
    pub fn get_or_put(&mut self, bytes: &[u8]) -> (SymbolHandle, bool) {
        if let Some(handle) = self.table.get(bytes) {
            handle.bump_ref().expect("interned symbol handle was pruned while still pooled");
            return (*handle, true);
        }
        let owned: Box<[u8]> = bytes.into();
        let handle = Handle::new_referenced(SymbolBytes(owned.clone()));
        self.table.insert(owned, handle);
        (handle, false)
    }

    /// Number of distinct symbols currently interned.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_lookup_returns_same_handle() {
        let mut pool = SymbolPool::new();
        let (h1, found1) = pool.get_or_put(b"foo");
        assert!(!found1);
        let (h2, found2) = pool.get_or_put(b"foo");
        assert!(found2);
        assert_eq!(h1.addr(), h2.addr());
        assert_eq!(h1.cell().strong_count(), 2);
    }

    #[test]
    fn distinct_bytes_get_distinct_handles() {
        let mut pool = SymbolPool::new();
        let (h1, _) = pool.get_or_put(b"foo");
        let (h2, _) = pool.get_or_put(b"bar");
        assert_ne!(h1.addr(), h2.addr());
        assert_eq!(pool.len(), 2);
    }
}
