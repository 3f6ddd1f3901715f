//! # URL Filter Server
//!
//! TCP front end for the `url-filter` subsystem. Clients send one command
//! per line and get one status reply per command:
//!
//! ```text
//! POST http://www.example.com     ->  201 Created
//! GET http://www.example.com      ->  200 Ok, blank line, true true
//! DELETE http://www.example.com   ->  204 No Content
//! DELETE http://www.example.com   ->  404 Not Found
//! ```
//!
//! ## Modules
//!
//! - `config` - CLI arguments and the validated [`ServerConfig`]
//! - `server` - listener, restore on startup, checkpoint on shutdown
//! - `connection` - per-connection worker
//! - `protocol` - request parsing and reply rendering
//! - `line_buffer` - bounded per-connection receive buffer
//! - `metrics` - server counters

pub mod config;
pub mod connection;
pub mod error;
pub mod line_buffer;
pub mod metrics;
pub mod protocol;
pub mod server;

pub use config::{CliArgs, FilterMode, ServerConfig};
pub use error::{LineError, ProtocolError, ServerError};
pub use metrics::{MetricsSnapshot, ServerMetrics};
pub use server::CommandServer;
