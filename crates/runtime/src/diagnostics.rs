//! Read-only introspection dump (supplemental feature, see `SPEC_FULL.md`).
//!
//! Grounded on the teacher's SIGQUIT-triggered scheduler dump
//! (`crates/runtime/src/diagnostics.rs`): a single human-readable string a
//! caller can print, with no background thread or signal handler attached
//! (there is no scheduler here to hook one into).

use crate::runtime::Runtime;

impl Runtime {
    /// Dictionary size, symbol/signature pool sizes, and current stack
    /// depth/chunk count, formatted for a log line or REPL `.status`
    /// command in some future front-end.
    pub fn dump_diagnostics(&self) -> String {
        format!(
            "gale runtime diagnostics:\n  dictionary entries: {}\n  interned symbols: {}\n  pooled signatures: {}\n  stack depth: {}\n  stack chunks: {}",
            self.dictionary.len(),
            self.symbols.len(),
            self.signatures.len(),
            self.stack.len(),
            self.stack.chunk_count(),
        )
    }
}
