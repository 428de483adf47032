//! Test-only leak-detection allocator.
//!
//! Grounded on the atomic-counter idea in the teacher's
//! `crates/runtime/src/memory_stats.rs` (which tracks live strand counts),
//! simplified here to a single-threaded outstanding-byte counter wrapping
//! `std::alloc::System`. Tests that exercise `Refcell`/`Handle` teardown
//! paths can assert the counter returns to zero after a scenario runs,
//! catching a forgotten `decref_and_prune_cell` the way a leak sanitizer
//! would.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicIsize, Ordering};

static OUTSTANDING_BYTES: AtomicIsize = AtomicIsize::new(0);

/// A `GlobalAlloc` wrapper that tracks net outstanding allocation size.
///
/// Not installed as `#[global_allocator]` by this crate's own test
/// binary by default, since `gale-core`'s unit tests run fine without it.
/// Gated behind the `leak-check` feature so `gale-runtime`'s integration
/// tests can depend on this crate with that feature enabled, install this
/// type as their own `#[global_allocator]`, and assert
/// [`outstanding_bytes`] returns to zero after a `Runtime` is dropped.
pub struct LeakCheckAllocator;

unsafe impl GlobalAlloc for LeakCheckAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        OUTSTANDING_BYTES.fetch_add(layout.size() as isize, Ordering::Relaxed);
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        OUTSTANDING_BYTES.fetch_sub(layout.size() as isize, Ordering::Relaxed);
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        OUTSTANDING_BYTES.fetch_add(new_size as isize - layout.size() as isize, Ordering::Relaxed);
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

/// Net bytes currently outstanding through [`LeakCheckAllocator`].
pub fn outstanding_bytes() -> isize {
    OUTSTANDING_BYTES.load(Ordering::Relaxed)
}
