//! Installs `gale_core::test_support::LeakCheckAllocator` as this binary's
//! global allocator and asserts that a balanced `Handle` acquire/release
//! cycle returns the outstanding-byte counter to its starting point —
//! spec Testable Property 1 ("nothing is leaked") made mechanical rather
//! than inferred from stack length alone.

#[global_allocator]
static ALLOC: gale_core::test_support::LeakCheckAllocator = gale_core::test_support::LeakCheckAllocator;

use gale_core::refcell::{Handle, PruneMode, Prunable};
use gale_core::test_support::outstanding_bytes;

struct Payload(Box<[u8; 1024]>);

impl Prunable for Payload {
    const MODE: PruneMode = PruneMode::Owned;
    fn prune(self) {
        drop(self.0);
    }
}

#[test]
fn decref_and_prune_returns_outstanding_bytes_to_baseline() {
    let before = outstanding_bytes();

    let handle = Handle::new_referenced(Payload(Box::new([0u8; 1024])));
    assert!(
        outstanding_bytes() > before,
        "allocating the payload should have grown the outstanding-byte count"
    );

    handle.decref_and_prune_cell(PruneMode::Owned);
    assert_eq!(
        outstanding_bytes(),
        before,
        "decref_and_prune_cell should free both the payload and the cell's own heap storage"
    );
}

#[test]
fn a_live_second_reference_keeps_the_payload_allocated() {
    let before = outstanding_bytes();

    let h1 = Handle::new_referenced(Payload(Box::new([0u8; 1024])));
    h1.bump_ref().unwrap();
    let h2 = h1;

    h1.decref_and_prune_cell(PruneMode::Owned);
    assert!(
        outstanding_bytes() > before,
        "one live reference should still hold the payload allocated"
    );

    h2.decref_and_prune_cell(PruneMode::Owned);
    assert_eq!(outstanding_bytes(), before);
}
