//! Deduplication ledger of already ingested documents.
//!
//! The ledger is the set of source identifiers present in the record table.
//! It is rebuilt from the table at the start of a run and only grows.

mod store;

pub use store::RecordStore;

use std::collections::HashSet;

/// Source identifiers already captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    known: HashSet<String>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from known identifiers.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, source_id: &str) -> bool {
        self.known.contains(source_id)
    }

    /// Record an identifier; returns `false` if it was already known.
    pub fn insert(&mut self, source_id: impl Into<String>) -> bool {
        self.known.insert(source_id.into())
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Known identifiers, in no particular order.
    pub fn ids(&self) -> &HashSet<String> {
        &self.known
    }

    /// Candidates not yet in the ledger, see [`filter_new`].
    pub fn filter_new<'a, S: AsRef<str>>(&self, candidates: &'a [S]) -> Vec<&'a str> {
        filter_new(candidates, &self.known)
    }
}

/// Candidates absent from `known`, in input order.
///
/// Matching is exact and case-sensitive with no URL or path normalization.
/// Repeated candidates all pass when unknown; use [`dedup_candidates`] first
/// if the candidate list itself may contain duplicates.
pub fn filter_new<'a, S: AsRef<str>>(candidates: &'a [S], known: &HashSet<String>) -> Vec<&'a str> {
    candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|candidate| !known.contains(*candidate))
        .collect()
}

/// Drop repeated candidates, keeping the first occurrence of each.
pub fn dedup_candidates<S: AsRef<str>>(candidates: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|candidate| seen.insert(*candidate))
        .collect()
}
