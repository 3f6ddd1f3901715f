//! Service Layer
//!
//! Orchestrates the domain and the adapters:
//! - `SharedFilter` - the filter behind its exclusive-access guard
//! - `LedgerGuard` - serializes writers of the shared ledger store
//! - `MembershipChecker` - filter first, ledger on a possible hit
//! - `CommandDispatcher` - one per connection, maps commands to replies

pub mod dispatcher;
pub mod ledger_guard;
pub mod membership;
pub mod shared_filter;

pub use dispatcher::{Command, CommandDispatcher, Reply};
pub use ledger_guard::LedgerGuard;
pub use membership::{MembershipChecker, Presence};
pub use shared_filter::SharedFilter;
