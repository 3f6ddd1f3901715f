//! Three-valued membership check
//!
//! The Bloom filter answers first; only a possible hit is disambiguated
//! against the exact-match ledger, re-read from its store so writers that
//! update it out of band are seen.

use crate::domain::BloomFilter;
use crate::ports::UrlLedger;

/// Answer to a membership query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    /// The filter has no record of the URL
    Absent,
    /// The filter may hold it and the ledger confirms it
    Confirmed,
    /// The filter may hold it but the ledger does not (false positive, or
    /// a URL since removed)
    Unconfirmed,
}

/// Combines the filter and the ledger into a [`Presence`]
pub struct MembershipChecker;

impl MembershipChecker {
    pub fn check<L: UrlLedger + ?Sized>(url: &str, filter: &BloomFilter, ledger: &mut L) -> Presence {
        if !filter.possibly_contains(url) {
            return Presence::Absent;
        }

        ledger.reload();
        if ledger.contains(url) {
            Presence::Confirmed
        } else {
            Presence::Unconfirmed
        }
    }
}
