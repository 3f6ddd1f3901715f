//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driven Ports (outbound) - the exact-match URL ledger

pub mod outbound;

pub use outbound::{RemoveOutcome, UrlLedger};
