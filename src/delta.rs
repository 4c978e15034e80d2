//! delta.rs: diff of the latest catalog fetch against the previous snapshot.

use std::collections::HashSet;

use crate::ingest::types::OfferRecord;

/// Identity keys of every offer known after the last completed cycle.
pub type Snapshot = HashSet<String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    /// Offers whose key was not in the previous snapshot, in fetch order.
    pub added: Vec<OfferRecord>,
    /// Keys of everything in the latest fetch; replaces the previous snapshot.
    pub snapshot: Snapshot,
}

/// Pure: the caller threads `Delta::snapshot` back in as `previous` next time.
/// Offers that disappeared produce nothing. A key repeated inside `latest` is
/// added once.
pub fn compute_delta(latest: &[OfferRecord], previous: &Snapshot) -> Delta {
    let mut snapshot = Snapshot::with_capacity(latest.len());
    let mut added = Vec::new();
    for offer in latest {
        let key = offer.identity_key();
        let first_seen = snapshot.insert(key.clone());
        if first_seen && !previous.contains(&key) {
            added.push(offer.clone());
        }
    }
    Delta { added, snapshot }
}
