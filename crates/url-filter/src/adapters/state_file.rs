//! Filter state file
//!
//! Persists the shared Bloom filter with the deployment's codec. Writes go
//! to a sibling temporary file that is then renamed into place.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::domain::{BloomFilter, FilterCodec};
use crate::error::{ConfigError, StoreError};

/// When the filter is written to disk
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PersistPolicy {
    /// After every insertion, while the filter guard is held
    #[default]
    EveryInsert,
    /// Once, when the server shuts down
    OnShutdown,
    /// Never; the state file is only read at startup
    Never,
}

impl fmt::Display for PersistPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistPolicy::EveryInsert => f.write_str("every-insert"),
            PersistPolicy::OnShutdown => f.write_str("on-shutdown"),
            PersistPolicy::Never => f.write_str("never"),
        }
    }
}

impl FromStr for PersistPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "every-insert" => Ok(PersistPolicy::EveryInsert),
            "on-shutdown" => Ok(PersistPolicy::OnShutdown),
            "never" => Ok(PersistPolicy::Never),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// What `restore` found on disk
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No state file; the filter was left as constructed
    Missing,
    /// The filter now holds the persisted bits
    Restored,
}

/// Location and layout of the persisted filter
#[derive(Clone, Debug)]
pub struct FilterStore {
    path: PathBuf,
    codec: FilterCodec,
}

impl FilterStore {
    pub fn new(path: impl Into<PathBuf>, codec: FilterCodec) -> Self {
        Self {
            path: path.into(),
            codec,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codec(&self) -> FilterCodec {
        self.codec
    }

    /// Load persisted state into `filter`
    ///
    /// On a corrupted file the filter is left in the state the codec's
    /// failure policy dictates: reset to the default empty filter for
    /// byte-per-bit, untouched for packed.
    pub fn restore(&self, filter: &mut BloomFilter) -> Result<RestoreOutcome, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No filter state file, starting empty");
                return Ok(RestoreOutcome::Missing);
            }
            Err(e) => return Err(e.into()),
        };
        let reader = BufReader::new(file);

        match self.codec {
            FilterCodec::Packed => filter.load_packed(reader)?,
            FilterCodec::BytePerBit => {
                let hash_functions = filter.hash_functions().to_vec();
                filter.load_byte_per_bit(reader, hash_functions)?
            }
        }

        info!(
            path = %self.path.display(),
            codec = %self.codec,
            size = filter.size(),
            bits_set = filter.bits_set(),
            "Restored filter state"
        );
        Ok(RestoreOutcome::Restored)
    }

    /// Write `filter` to the state file
    pub fn persist(&self, filter: &BloomFilter) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.tmp_path();
        {
            let writer = BufWriter::new(File::create(&tmp_path)?);
            match self.codec {
                FilterCodec::Packed => filter.save_packed(writer)?,
                FilterCodec::BytePerBit => filter.save_byte_per_bit(writer)?,
            }
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), bits_set = filter.bits_set(), "Persisted filter state");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
