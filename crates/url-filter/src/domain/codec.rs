//! Binary persistence codecs for the Bloom filter
//!
//! Two layouts exist for the same structure. Both start with the filter size
//! as a little-endian `u64`:
//!
//! - **byte-per-bit**: `[size][size bytes, each 0x00 or 0x01]`. Loading
//!   resizes the filter to the stored size. Any failure resets the filter to
//!   an empty [`DEFAULT_FILTER_SIZE`](super::DEFAULT_FILTER_SIZE) filter.
//! - **packed**: `[size][ceil(size/8) bytes, MSB first, zero-padded tail]`.
//!   Loading requires the stored size to equal the in-memory size. Any failure
//!   leaves the in-memory bits untouched.
//!
//! Hash functions are never persisted; the byte-per-bit loader takes them
//! from the caller.

use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

use bitvec::prelude::*;

use super::bloom_filter::BloomFilter;
use super::hash_functions::HashFunction;
use crate::error::{CodecError, ConfigError};

/// Width of the size header in bytes
pub const SIZE_HEADER_LEN: usize = 8;

/// Persistence layout used by a deployment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterCodec {
    /// 8 bits per byte, preserve-on-failure loads
    #[default]
    Packed,
    /// One byte per bit, destructive-reset loads
    BytePerBit,
}

impl fmt::Display for FilterCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterCodec::Packed => f.write_str("packed"),
            FilterCodec::BytePerBit => f.write_str("byte-per-bit"),
        }
    }
}

impl FromStr for FilterCodec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "packed" => Ok(FilterCodec::Packed),
            "byte-per-bit" | "bytes" => Ok(FilterCodec::BytePerBit),
            other => Err(ConfigError::UnknownCodec(other.to_string())),
        }
    }
}

fn write_size<W: Write>(writer: &mut W, size: usize) -> io::Result<()> {
    writer.write_all(&(size as u64).to_le_bytes())
}

fn read_size<R: Read>(reader: &mut R) -> Result<u64, CodecError> {
    let mut header = [0u8; SIZE_HEADER_LEN];
    reader
        .read_exact(&mut header)
        .map_err(CodecError::UnreadableSize)?;
    Ok(u64::from_le_bytes(header))
}

/// Read at most `len` bytes; never allocates more than the input holds
fn read_payload<R: Read>(reader: R, len: u64) -> Result<Vec<u8>, CodecError> {
    let mut payload = Vec::new();
    reader.take(len).read_to_end(&mut payload)?;
    Ok(payload)
}

impl BloomFilter {
    /// Write the filter in the byte-per-bit layout
    pub fn save_byte_per_bit<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write_size(&mut writer, self.size())?;
        let payload: Vec<u8> = self.bits.iter().by_vals().map(u8::from).collect();
        writer.write_all(&payload)?;
        writer.flush()
    }

    /// Load the byte-per-bit layout, adopting the stored size
    ///
    /// On any failure the filter is reinitialized to an empty
    /// [`DEFAULT_FILTER_SIZE`](super::DEFAULT_FILTER_SIZE) filter. `hash_functions` replaces the current
    /// list in both cases.
    pub fn load_byte_per_bit<R: Read>(
        &mut self,
        reader: R,
        hash_functions: Vec<HashFunction>,
    ) -> Result<(), CodecError> {
        match decode_byte_per_bit(reader) {
            Ok(bits) => {
                self.bits = bits;
                self.hash_functions = hash_functions;
                self.insertions = 0;
                Ok(())
            }
            Err(e) => {
                *self = BloomFilter::empty_default(hash_functions);
                Err(e)
            }
        }
    }

    /// Write the filter in the packed layout
    pub fn save_packed<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write_size(&mut writer, self.size())?;
        let mut packed = self.bits.clone();
        packed.set_uninitialized(false);
        writer.write_all(packed.as_raw_slice())?;
        writer.flush()
    }

    /// Load the packed layout into a filter of the same size
    ///
    /// The bit array is replaced only when the whole payload was recovered.
    pub fn load_packed<R: Read>(&mut self, mut reader: R) -> Result<(), CodecError> {
        let stored = read_size(&mut reader)?;
        if stored == 0 {
            return Err(CodecError::ZeroSize);
        }
        if stored != self.size() as u64 {
            return Err(CodecError::SizeMismatch {
                stored,
                expected: self.size(),
            });
        }

        let byte_len = self.size().div_ceil(8);
        let payload = read_payload(reader, byte_len as u64)?;
        if payload.len() < byte_len {
            return Err(CodecError::Truncated {
                expected: self.size(),
                recovered: payload.len() * 8,
            });
        }

        let mut bits = BitVec::<u8, Msb0>::from_vec(payload);
        bits.truncate(self.size());
        self.bits = bits;
        self.insertions = 0;
        Ok(())
    }
}

fn decode_byte_per_bit<R: Read>(mut reader: R) -> Result<BitVec<u8, Msb0>, CodecError> {
    let size = read_size(&mut reader)?;
    if size == 0 {
        return Err(CodecError::ZeroSize);
    }

    let payload = read_payload(reader, size)?;
    if (payload.len() as u64) < size {
        return Err(CodecError::Truncated {
            expected: usize::try_from(size).unwrap_or(usize::MAX),
            recovered: payload.len(),
        });
    }

    Ok(payload.into_iter().map(|byte| byte != 0).collect())
}
