//! Named snapshots: bookmarks into the global event ordering.
//!
//! A snapshot copies no data. It records a name, an optional
//! description, and the global position current at creation time; the
//! diff engine later replays the events between two positions. Deleting
//! a snapshot never touches events.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use lineage_types::{Snapshot, SnapshotId};

use crate::error::StoreError;

/// The in-memory snapshot store.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: RwLock<BTreeMap<SnapshotId, Snapshot>>,
}

impl SnapshotStore {
    /// Create a new empty snapshot store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new snapshot at the given position.
    ///
    /// Input validation (name bounds) happens in the command layer; the
    /// store assigns the ID and creation timestamp. The position is
    /// fixed here and never changes afterwards.
    pub fn create(&self, name: String, description: Option<String>, position: u64) -> Snapshot {
        let snapshot = Snapshot {
            id: SnapshotId::new(),
            name,
            description,
            position,
            created_at: Utc::now(),
        };

        let mut snapshots = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        snapshots.insert(snapshot.id, snapshot.clone());

        tracing::debug!(id = %snapshot.id, position, "created snapshot");
        snapshot
    }

    /// Fetch a snapshot by ID.
    pub fn get(&self, id: SnapshotId) -> Option<Snapshot> {
        let snapshots = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        snapshots.get(&id).cloned()
    }

    /// All snapshots, newest first by position, then by creation time.
    pub fn list(&self) -> Vec<Snapshot> {
        let snapshots = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<Snapshot> = snapshots.values().cloned().collect();
        all.sort_by(|a, b| {
            b.position
                .cmp(&a.position)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        all
    }

    /// Delete a snapshot. Fails with [`StoreError::SnapshotNotFound`]
    /// if it does not exist; never affects events.
    pub fn delete(&self, id: SnapshotId) -> Result<(), StoreError> {
        let mut snapshots = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if snapshots.remove(&id).is_none() {
            return Err(StoreError::SnapshotNotFound(id));
        }
        tracing::debug!(id = %id, "deleted snapshot");
        Ok(())
    }
}
