//! Hash functions for the Bloom filter
//!
//! A closed set of hashing strategies, picked by tag at configuration time.
//! Every strategy is deterministic across runs and platforms, which the
//! persisted filter state depends on.

use std::fmt;
use std::hash::Hasher;
use std::io::Cursor;
use std::str::FromStr;

use siphasher::sip::SipHasher13;

use crate::error::ConfigError;

/// Suffix appended to the input by the salted variant
const SALT: &[u8] = b"#salted";

/// A hashing strategy used to derive one bit index per insertion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashFunction {
    /// SipHash-1-3 with fixed zero keys
    Baseline,
    /// Baseline hash over the input followed by a fixed salt
    Salted,
    /// Lower 64 bits of MurmurHash3 x64/128
    Murmur3 { seed: u32 },
}

impl HashFunction {
    /// Hash a string to an unsigned integer
    pub fn hash(&self, input: &str) -> u64 {
        match self {
            HashFunction::Baseline => sip_hash(&[input.as_bytes()]),
            HashFunction::Salted => sip_hash(&[input.as_bytes(), SALT]),
            HashFunction::Murmur3 { seed } => murmur_hash(input.as_bytes(), *seed),
        }
    }

    /// Bit index for `input` in a filter of `size` bits
    ///
    /// `size` must be positive.
    pub fn index(&self, input: &str, size: usize) -> usize {
        (self.hash(input) % size as u64) as usize
    }

    /// The configuration tag of this strategy
    pub fn kind(&self) -> HashKind {
        match self {
            HashFunction::Baseline => HashKind::Baseline,
            HashFunction::Salted => HashKind::Salted,
            HashFunction::Murmur3 { .. } => HashKind::Murmur3,
        }
    }
}

fn sip_hash(parts: &[&[u8]]) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    for part in parts {
        hasher.write(part);
    }
    hasher.finish()
}

fn murmur_hash(element: &[u8], seed: u32) -> u64 {
    let mut cursor = Cursor::new(element);
    // Reading from an in-memory cursor cannot fail
    let hash = murmur3::murmur3_x64_128(&mut cursor, seed).unwrap_or(0);
    hash as u64
}

/// Tag naming a hashing strategy in configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashKind {
    Baseline,
    Salted,
    Murmur3,
}

impl HashKind {
    /// Instantiate the `ordinal`-th function of this kind
    ///
    /// Only murmur3 uses the ordinal (as its seed); repeated baseline or
    /// salted functions are identical.
    pub fn instantiate(self, ordinal: u32) -> HashFunction {
        match self {
            HashKind::Baseline => HashFunction::Baseline,
            HashKind::Salted => HashFunction::Salted,
            HashKind::Murmur3 => HashFunction::Murmur3 { seed: ordinal },
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashKind::Baseline => "baseline",
            HashKind::Salted => "salted",
            HashKind::Murmur3 => "murmur3",
        };
        f.write_str(name)
    }
}

impl FromStr for HashKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baseline" | "std" => Ok(HashKind::Baseline),
            "salted" | "double" => Ok(HashKind::Salted),
            "murmur3" | "murmur" => Ok(HashKind::Murmur3),
            _ => Err(ConfigError::UnknownHash(s.to_string())),
        }
    }
}
