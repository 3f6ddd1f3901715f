//! # Server Configuration
//!
//! Startup arguments and the validated configuration built from them.
//!
//! ```text
//! filter-server <IP> <PORT> <SIZE> <BASELINE> [<SALTED>] [<MURMUR3>] [OPTIONS]
//! ```

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use url_filter::domain::HashKind;
use url_filter::validation::{accept_any, is_valid_url, UrlValidator};
use url_filter::{ConfigError, FilterCodec, FilterSpec, PersistPolicy};

/// Where each connection's filter comes from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FilterMode {
    /// One filter built at startup and shared by every connection
    #[default]
    Shared,
    /// Each connection sends a configuration line first and gets a private filter
    PerConnection,
}

/// Validated server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,
    /// Size and hash composition of the shared filter
    pub filter: FilterSpec,
    /// Filter state file
    pub state_file: PathBuf,
    /// Exact-match ledger file
    pub ledger_path: PathBuf,
    /// Layout of the state file
    pub codec: FilterCodec,
    /// When the shared filter is written to disk
    pub persist: PersistPolicy,
    /// Shared or per-connection filters
    pub mode: FilterMode,
    /// Close the connection after any malformed request
    pub strict: bool,
    /// Check applied to every command target
    pub validator: UrlValidator,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 5555)),
            filter: FilterSpec {
                size: 1024,
                composition: vec![(HashKind::Baseline, 1), (HashKind::Salted, 1)],
            },
            state_file: PathBuf::from("data/bloom_state.bin"),
            ledger_path: PathBuf::from("data/urls.txt"),
            codec: FilterCodec::Packed,
            persist: PersistPolicy::EveryInsert,
            mode: FilterMode::Shared,
            strict: false,
            validator: is_valid_url,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.filter.validate()
    }
}

/// Lowest port a server may listen on
pub const MIN_PORT: u16 = 1025;

/// URL filter server
#[derive(Parser, Debug)]
#[command(name = "filter-server")]
#[command(about = "Bloom filter URL membership server over a line-oriented TCP protocol")]
pub struct CliArgs {
    /// IPv4 address to listen on
    pub ip: Ipv4Addr,

    /// TCP port (1025-65535)
    #[arg(value_parser = clap::value_parser!(u16).range(MIN_PORT as i64..))]
    pub port: u16,

    /// Bloom filter size in bits (1-1000000)
    pub size: usize,

    /// Number of baseline hash functions
    pub baseline: u32,

    /// Number of salted hash functions
    pub salted: Option<u32>,

    /// Number of murmur3 hash functions
    pub murmur3: Option<u32>,

    /// Filter state file
    #[arg(long, default_value = "data/bloom_state.bin")]
    pub state_file: PathBuf,

    /// Exact-match ledger file
    #[arg(long, default_value = "data/urls.txt")]
    pub ledger: PathBuf,

    /// State file layout: packed or byte-per-bit
    #[arg(long, default_value = "packed")]
    pub codec: FilterCodec,

    /// When to write the filter: every-insert, on-shutdown or never
    #[arg(long, default_value = "every-insert")]
    pub persist: PersistPolicy,

    /// Filter mode
    #[arg(long, value_enum, default_value_t = FilterMode::Shared)]
    pub mode: FilterMode,

    /// Close a connection after any malformed request
    #[arg(long)]
    pub strict: bool,

    /// Accept any non-empty target instead of requiring an http(s) URL
    #[arg(long)]
    pub permissive_urls: bool,
}

impl CliArgs {
    /// Validate the arguments into a [`ServerConfig`]
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut composition = vec![(HashKind::Baseline, self.baseline)];
        if let Some(salted) = self.salted {
            composition.push((HashKind::Salted, salted));
        }
        if let Some(murmur3) = self.murmur3 {
            composition.push((HashKind::Murmur3, murmur3));
        }

        Ok(ServerConfig {
            listen_addr: SocketAddr::V4(SocketAddrV4::new(self.ip, self.port)),
            filter: FilterSpec::new(self.size, composition)?,
            state_file: self.state_file,
            ledger_path: self.ledger,
            codec: self.codec,
            persist: self.persist,
            mode: self.mode,
            strict: self.strict,
            validator: if self.permissive_urls {
                accept_any
            } else {
                is_valid_url
            },
        })
    }
}
