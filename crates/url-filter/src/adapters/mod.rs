//! Adapters Layer (Driven Adapters)
//!
//! Flat-file implementations behind the service:
//!
//! - `FileLedger` - exact-match URL list, one URL per line
//! - `FilterStore` - persisted Bloom filter state

pub mod file_ledger;
pub mod state_file;

pub use file_ledger::FileLedger;
pub use state_file::{FilterStore, PersistPolicy, RestoreOutcome};
