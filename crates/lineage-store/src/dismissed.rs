//! The dismissed-pair set: person pairs confirmed as non-duplicates.
//!
//! Pairs are unordered -- `(a, b)` and `(b, a)` are the same dismissal.
//! The set persists independently of either person's version and
//! survives unrelated edits to either person.

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock};

use lineage_types::PersonId;
use uuid::Uuid;

/// The in-memory dismissed-pair set.
#[derive(Debug, Default)]
pub struct DismissedPairs {
    inner: RwLock<BTreeSet<(Uuid, Uuid)>>,
}

/// Normalize an unordered pair to a canonical ordering.
fn normalize(a: PersonId, b: PersonId) -> (Uuid, Uuid) {
    let (a, b) = (a.into_inner(), b.into_inner());
    if a <= b { (a, b) } else { (b, a) }
}

impl DismissedPairs {
    /// Create a new empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pair as dismissed. Returns `false` if the pair was
    /// already recorded.
    pub fn insert(&self, a: PersonId, b: PersonId) -> bool {
        let mut pairs = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        pairs.insert(normalize(a, b))
    }

    /// Whether the pair has been dismissed, in either order.
    pub fn contains(&self, a: PersonId, b: PersonId) -> bool {
        let pairs = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        pairs.contains(&normalize(a, b))
    }

    /// All dismissed pairs, in canonical order.
    pub fn list(&self) -> Vec<(PersonId, PersonId)> {
        let pairs = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        pairs
            .iter()
            .map(|&(a, b)| (PersonId::from(a), PersonId::from(b)))
            .collect()
    }

    /// Number of dismissed pairs.
    pub fn len(&self) -> usize {
        let pairs = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        pairs.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
