//! Outbound Ports (Driven Ports)
//!
//! The exact-match ledger the service depends on. The dispatcher only ever
//! sees this trait, so the flat file can be swapped for another store.

use crate::error::LedgerError;

/// Result of removing a URL from the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// At least one entry matched and was dropped
    Removed(usize),
    /// The store was readable but held no matching entry
    NotFound,
    /// The store could not be opened for reading or writing
    StorageUnavailable,
}

/// Exact-match list of inserted URLs (Driven Port)
///
/// Implementations do no locking of their own.
pub trait UrlLedger: Send {
    /// Exact match against the entries loaded most recently
    fn contains(&self, url: &str) -> bool;

    /// Re-read the backing store, replacing all in-memory entries
    ///
    /// A missing or unreadable store yields an empty ledger.
    fn reload(&mut self);

    /// Record a URL at the end of the store
    fn append(&mut self, url: &str) -> Result<(), LedgerError>;

    /// Drop every entry equal to `url` and rewrite the store
    fn remove(&mut self, url: &str) -> RemoveOutcome;

    /// Number of in-memory entries, duplicates included
    fn len(&self) -> usize;

    /// Whether no entries are loaded
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
