//! # URL Filter
//!
//! Membership filtering for URLs: a Bloom filter backed by an exact-match
//! ledger so "maybe present" answers can be confirmed or refuted.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure filter logic, no file or socket I/O
//!   - `BloomFilter`: Bit array plus an ordered list of hash functions
//!   - `HashFunction`: Closed set of hashing strategies
//!   - `FilterCodec`: The packed and byte-per-bit persistence layouts
//!   - `FilterSpec`: Size and hash composition, parsed from a config line
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `UrlLedger`: Driven port for the exact-match store
//!
//! - **Adapters Layer** (`adapters/`): Flat files
//!   - `FileLedger`: One URL per line
//!   - `FilterStore`: Persisted filter state
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `SharedFilter`: The filter behind its mutex
//!   - `LedgerGuard`: Serializes ledger appends and rewrites
//!   - `MembershipChecker`: Three-valued presence answer
//!   - `CommandDispatcher`: Applies POST/GET/DELETE
//!
//! ## Invariants
//!
//! - No false negatives: after `add(url)`, `possibly_contains(url)` is true
//! - Bits are never cleared by a removal; only the ledger forgets a URL
//!
//! ## Usage Example
//!
//! ```
//! use url_filter::{BloomFilter, HashFunction};
//!
//! let mut filter = BloomFilter::new(1024, vec![HashFunction::Baseline, HashFunction::Salted])?;
//! filter.add("http://www.example.com");
//!
//! assert!(filter.possibly_contains("http://www.example.com"));
//! # Ok::<(), url_filter::FilterError>(())
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod validation;

// Re-exports for convenience
pub use adapters::{FileLedger, FilterStore, PersistPolicy, RestoreOutcome};
pub use domain::{BloomFilter, FilterCodec, FilterSpec, HashFunction, HashKind};
pub use error::{CodecError, ConfigError, FilterError, LedgerError, StoreError};
pub use ports::{RemoveOutcome, UrlLedger};
pub use service::{
    Command, CommandDispatcher, LedgerGuard, MembershipChecker, Presence, Reply, SharedFilter,
};
pub use validation::{accept_any, is_valid_url, UrlValidator};
