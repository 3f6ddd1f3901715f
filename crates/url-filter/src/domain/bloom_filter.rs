//! Core Bloom filter implementation
//!
//! INVARIANTS:
//! - Every `add` and `possibly_contains` indexes via `hash(url) mod size`
//!   for every configured hash function.
//! - The bit array length always equals `size`.
//! - No false negatives: after `add(url)`, `possibly_contains(url)` is true.
//!
//! A filter with zero hash functions records nothing and answers every
//! lookup with `true` (vacuous truth), which keeps the no-false-negative
//! guarantee.

use bitvec::prelude::*;

use super::hash_functions::HashFunction;
use super::parameters::{calculate_fpr, fill_ratio_fpr};
use crate::error::FilterError;

/// Size used when a filter has to be rebuilt from nothing
pub const DEFAULT_FILTER_SIZE: usize = 256;

/// Bloom filter over URLs
///
/// A space-efficient probabilistic set. False positives are possible,
/// false negatives are not.
#[derive(Clone, Debug)]
pub struct BloomFilter {
    /// Bit array, most significant bit first within each byte
    pub(crate) bits: BitVec<u8, Msb0>,
    /// Hash functions, applied in order
    pub(crate) hash_functions: Vec<HashFunction>,
    /// Number of `add` calls since construction or the last load
    pub(crate) insertions: usize,
}

impl BloomFilter {
    /// Create an empty filter of `size` bits
    pub fn new(size: usize, hash_functions: Vec<HashFunction>) -> Result<Self, FilterError> {
        if size == 0 {
            return Err(FilterError::InvalidSize);
        }
        Ok(Self {
            bits: bitvec![u8, Msb0; 0; size],
            hash_functions,
            insertions: 0,
        })
    }

    /// Create an empty filter of [`DEFAULT_FILTER_SIZE`] bits
    pub fn empty_default(hash_functions: Vec<HashFunction>) -> Self {
        Self {
            bits: bitvec![u8, Msb0; 0; DEFAULT_FILTER_SIZE],
            hash_functions,
            insertions: 0,
        }
    }

    /// Insert a URL
    ///
    /// No validation of the URL format happens at this layer.
    pub fn add(&mut self, url: &str) {
        let size = self.size();
        for hash in &self.hash_functions {
            self.bits.set(hash.index(url, size), true);
        }
        self.insertions += 1;
    }

    /// Test if a URL might have been added
    ///
    /// Returns:
    /// - `false` if the URL was certainly never added
    /// - `true` if it maybe was (could be a false positive)
    pub fn possibly_contains(&self, url: &str) -> bool {
        let size = self.size();
        self.hash_functions
            .iter()
            .all(|hash| self.bits[hash.index(url, size)])
    }

    /// Filter size in bits
    pub fn size(&self) -> usize {
        self.bits.len()
    }

    /// The configured hash functions
    pub fn hash_functions(&self) -> &[HashFunction] {
        &self.hash_functions
    }

    /// Number of bits currently set
    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }

    /// Number of `add` calls since construction or the last load
    pub fn insertions(&self) -> usize {
        self.insertions
    }

    /// Expected false positive rate after `n` insertions
    ///
    /// Formula: FPR = (1 - e^(-kn/m))^k
    pub fn expected_fpr(&self, n: usize) -> f64 {
        calculate_fpr(self.size(), n, self.hash_functions.len())
    }

    /// False positive rate estimated from the current fill ratio
    pub fn estimated_fpr(&self) -> f64 {
        fill_ratio_fpr(self.size(), self.bits_set(), self.hash_functions.len())
    }

    /// Bit values in index order
    pub fn bit_values(&self) -> Vec<bool> {
        self.bits.iter().by_vals().collect()
    }

    /// Reset all bits to 0
    pub fn clear(&mut self) {
        self.bits.fill(false);
        self.insertions = 0;
    }
}
