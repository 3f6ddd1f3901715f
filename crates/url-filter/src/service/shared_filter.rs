//! Shared Bloom filter guard
//!
//! One filter instance is shared by every connection worker. All reads and
//! writes go through a single mutex so no worker ever observes a partially
//! updated bit array.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::adapters::FilterStore;
use crate::domain::BloomFilter;
use crate::error::StoreError;

/// Reference-counted filter behind its exclusive-access guard
///
/// Cloning shares the same filter.
#[derive(Clone, Debug)]
pub struct SharedFilter {
    inner: Arc<Mutex<BloomFilter>>,
}

impl SharedFilter {
    pub fn new(filter: BloomFilter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(filter)),
        }
    }

    /// Acquire exclusive access to the filter
    pub fn lock(&self) -> MutexGuard<'_, BloomFilter> {
        self.inner.lock()
    }

    /// Persist the filter while holding the guard
    pub fn checkpoint(&self, store: &FilterStore) -> Result<(), StoreError> {
        let filter = self.lock();
        store.persist(&filter)
    }
}
