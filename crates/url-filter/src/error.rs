//! Error types for the URL filter subsystem

use std::io;
use thiserror::Error;

/// Errors raised while constructing or configuring a Bloom filter
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Filter size must be positive")]
    InvalidSize,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the binary filter codecs
///
/// Every variant means the load was aborted. What happened to the in-memory
/// filter depends on the codec: the byte-per-bit codec resets it, the packed
/// codec leaves it untouched.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to read filter size: {0}")]
    UnreadableSize(#[source] io::Error),

    #[error("Stored filter size is zero")]
    ZeroSize,

    #[error("Stored filter size {stored} does not match in-memory size {expected}")]
    SizeMismatch { stored: u64, expected: usize },

    #[error("Truncated bit array: expected {expected} bits, recovered {recovered}")]
    Truncated { expected: usize, recovered: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors from parsing a filter configuration line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Expected 2 to 4 fields, got {0}")]
    FieldCount(usize),

    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),

    #[error("Filter size {size} out of range 1..={max}")]
    SizeOutOfRange { size: usize, max: usize },

    #[error("At least one hash function is required")]
    NoHashFunctions,

    #[error("Unknown hash function: {0:?}")]
    UnknownHash(String),

    #[error("Unknown filter codec: {0:?}")]
    UnknownCodec(String),

    #[error("Unknown persistence policy: {0:?}")]
    UnknownPolicy(String),
}

/// Errors from the URL ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Errors from the filter state file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("State file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("State file corrupted: {0}")]
    Corrupted(#[from] CodecError),
}
