//! Domain Layer - Pure filter logic
//!
//! This layer contains:
//! - Core Bloom filter implementation
//! - Hash functions
//! - Binary persistence codecs
//! - False positive estimates
//! - Configuration
//!
//! RULES:
//! - No file or socket I/O (codecs work on `Read`/`Write`)
//! - No async code

pub mod bloom_filter;
pub mod codec;
pub mod config;
pub mod hash_functions;
pub mod parameters;

pub use bloom_filter::{BloomFilter, DEFAULT_FILTER_SIZE};
pub use codec::FilterCodec;
pub use config::{FilterSpec, MAX_FILTER_SIZE};
pub use hash_functions::{HashFunction, HashKind};
pub use parameters::{calculate_fpr, fill_ratio_fpr};
