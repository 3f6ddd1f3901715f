//! Error types for the filter server

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use url_filter::{ConfigError, FilterError};

/// Startup and runtime errors of the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Invalid filter configuration: {0}")]
    Filter(#[from] FilterError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors while reading a request line
#[derive(Debug, Error)]
pub enum LineError {
    #[error("Line exceeds {max} bytes without a newline")]
    TooLong { max: usize },

    #[error("Read failed: {0}")]
    Io(#[from] io::Error),
}

/// Reasons a request line is malformed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Empty request line")]
    Empty,

    #[error("Expected 2 fields, got {0}")]
    FieldCount(usize),

    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),
}
