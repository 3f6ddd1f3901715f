//! Ledger write guard
//!
//! The ledger file is shared by every connection. Appends and rewrites
//! must not interleave: a rewrite that reads the file before an append and
//! writes it back after would drop the appended URL.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// Exclusive access to the ledger store for writers
///
/// Cloning shares the same guard. Readers do not take it.
#[derive(Clone, Debug, Default)]
pub struct LedgerGuard {
    inner: Arc<Mutex<()>>,
}

impl LedgerGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until no other writer holds the ledger
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.inner.lock()
    }
}
