//! Command dispatcher
//!
//! Turns parsed commands into state changes and outcomes. This is the only
//! place where filter, ledger and persistence results meet; the server just
//! renders the returned [`Reply`].

use tracing::{debug, warn};

use super::ledger_guard::LedgerGuard;
use super::membership::{MembershipChecker, Presence};
use super::shared_filter::SharedFilter;
use crate::adapters::{FilterStore, PersistPolicy};
use crate::ports::{RemoveOutcome, UrlLedger};
use crate::validation::UrlValidator;

/// A well-formed request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Insert a URL
    Post(String),
    /// Query a URL
    Get(String),
    /// Remove a URL from the ledger
    Delete(String),
}

impl Command {
    pub fn url(&self) -> &str {
        match self {
            Command::Post(url) | Command::Get(url) | Command::Delete(url) => url,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Post(_) => "POST",
            Command::Get(_) => "GET",
            Command::Delete(_) => "DELETE",
        }
    }
}

/// Outcome of a dispatched command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    /// URL inserted. `persist_failed` is set when the state write failed;
    /// the in-memory insertion stands regardless.
    Created { persist_failed: bool },
    /// Membership answer
    Presence(Presence),
    /// URL removed from the ledger
    NoContent,
    /// Nothing to remove, or the ledger store is unavailable
    NotFound,
    /// Target failed validation, or the request was malformed
    BadRequest,
}

/// Per-connection dispatcher
///
/// Owns its own ledger instance; shares the filter with every other
/// connection through the guard. Dispatchers writing to the same ledger
/// store must share one [`LedgerGuard`].
pub struct CommandDispatcher<L: UrlLedger> {
    filter: SharedFilter,
    ledger: L,
    ledger_guard: LedgerGuard,
    validator: UrlValidator,
    store: Option<FilterStore>,
    policy: PersistPolicy,
}

impl<L: UrlLedger> CommandDispatcher<L> {
    pub fn new(filter: SharedFilter, ledger: L, validator: UrlValidator) -> Self {
        Self {
            filter,
            ledger,
            ledger_guard: LedgerGuard::new(),
            validator,
            store: None,
            policy: PersistPolicy::Never,
        }
    }

    /// Persist filter state through `store` according to `policy`
    pub fn with_persistence(mut self, store: FilterStore, policy: PersistPolicy) -> Self {
        self.store = Some(store);
        self.policy = policy;
        self
    }

    /// Serialize ledger writes with every dispatcher holding `guard`
    pub fn with_ledger_guard(mut self, guard: LedgerGuard) -> Self {
        self.ledger_guard = guard;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn dispatch(&mut self, command: &Command) -> Reply {
        let url = command.url();
        if !(self.validator)(url) {
            debug!(command = command.name(), url = %url, "Rejected invalid URL");
            return Reply::BadRequest;
        }

        match command {
            Command::Post(url) => self.post(url),
            Command::Get(url) => self.get(url),
            Command::Delete(url) => self.delete(url),
        }
    }

    fn post(&mut self, url: &str) -> Reply {
        let mut filter = self.filter.lock();
        filter.add(url);

        {
            let _writer = self.ledger_guard.lock();
            if let Err(e) = self.ledger.append(url) {
                warn!(url = %url, error = %e, "Failed to record URL in ledger");
            }
        }

        let mut persist_failed = false;
        if self.policy == PersistPolicy::EveryInsert {
            if let Some(store) = &self.store {
                if let Err(e) = store.persist(&filter) {
                    warn!(path = %store.path().display(), error = %e, "Failed to persist filter state");
                    persist_failed = true;
                }
            }
        }

        Reply::Created { persist_failed }
    }

    fn get(&mut self, url: &str) -> Reply {
        let filter = self.filter.lock();
        Reply::Presence(MembershipChecker::check(url, &filter, &mut self.ledger))
    }

    fn delete(&mut self, url: &str) -> Reply {
        let outcome = {
            let _writer = self.ledger_guard.lock();
            self.ledger.remove(url)
        };
        match outcome {
            RemoveOutcome::Removed(_) => Reply::NoContent,
            RemoveOutcome::NotFound => Reply::NotFound,
            RemoveOutcome::StorageUnavailable => {
                warn!(url = %url, "Ledger unavailable, answering not found");
                Reply::NotFound
            }
        }
    }
}
