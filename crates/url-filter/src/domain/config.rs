//! Filter configuration and validation
//!
//! A filter is described by its size and the composition of its hash
//! functions. The same description arrives either as startup arguments or,
//! in per-connection mode, as the first line of a connection:
//!
//! ```text
//! <size> <baseline-count> [<salted-count>] [<murmur3-count>]
//! ```
//!
//! # Example
//!
//! ```
//! use url_filter::domain::FilterSpec;
//!
//! let spec: FilterSpec = "8 1".parse().unwrap();
//! let filter = spec.build().unwrap();
//! assert_eq!(filter.size(), 8);
//! ```

use std::fmt;
use std::str::FromStr;

use super::bloom_filter::BloomFilter;
use super::hash_functions::{HashFunction, HashKind};
use crate::error::{ConfigError, FilterError};

/// Upper bound on the filter size in bits
pub const MAX_FILTER_SIZE: usize = 1_000_000;

/// Order in which counts on a configuration line map to hash kinds
const COMPOSITION_ORDER: [HashKind; 3] = [HashKind::Baseline, HashKind::Salted, HashKind::Murmur3];

/// Size and hash composition of a filter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterSpec {
    /// Bit array size (m)
    pub size: usize,
    /// How many functions of each kind, in application order
    pub composition: Vec<(HashKind, u32)>,
}

impl FilterSpec {
    /// Create a validated spec
    pub fn new(size: usize, composition: Vec<(HashKind, u32)>) -> Result<Self, ConfigError> {
        let spec = Self { size, composition };
        spec.validate()?;
        Ok(spec)
    }

    /// Check size bounds and that at least one hash function is configured
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 || self.size > MAX_FILTER_SIZE {
            return Err(ConfigError::SizeOutOfRange {
                size: self.size,
                max: MAX_FILTER_SIZE,
            });
        }
        if self.hash_count() == 0 {
            return Err(ConfigError::NoHashFunctions);
        }
        Ok(())
    }

    /// Total number of hash functions (k)
    pub fn hash_count(&self) -> usize {
        self.composition.iter().map(|(_, n)| *n as usize).sum()
    }

    /// Expand the composition into the ordered hash function list
    pub fn hash_functions(&self) -> Vec<HashFunction> {
        self.composition
            .iter()
            .flat_map(|(kind, count)| (0..*count).map(move |i| kind.instantiate(i)))
            .collect()
    }

    /// Build an empty filter from this spec
    pub fn build(&self) -> Result<BloomFilter, FilterError> {
        self.validate()?;
        BloomFilter::new(self.size, self.hash_functions())
    }
}

fn parse_number<T: FromStr>(token: &str) -> Result<T, ConfigError> {
    token
        .parse()
        .map_err(|_| ConfigError::InvalidNumber(token.to_string()))
}

impl FromStr for FilterSpec {
    type Err = ConfigError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 || tokens.len() > 1 + COMPOSITION_ORDER.len() {
            return Err(ConfigError::FieldCount(tokens.len()));
        }

        let size: usize = parse_number(tokens[0])?;
        let composition = tokens[1..]
            .iter()
            .zip(COMPOSITION_ORDER)
            .map(|(token, kind)| Ok((kind, parse_number::<u32>(token)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Self::new(size, composition)
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits", self.size)?;
        for (kind, count) in &self.composition {
            write!(f, ", {}x{}", count, kind)?;
        }
        Ok(())
    }
}
