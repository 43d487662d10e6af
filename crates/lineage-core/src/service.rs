//! The [`Core`] service: one handle bundling every store with the
//! configured limits.
//!
//! All operations take `&self`; the stores are internally synchronized,
//! so a `Core` can be shared across threads directly or behind an `Arc`.
//! Every successful command appends to the event store and projects the
//! committed events into the read model before returning. Append and
//! projection happen under one commit lock, so events reach the read
//! model in commit order and a reader never observes a row older than
//! an already-acknowledged write.

use std::sync::{Mutex, PoisonError};

use lineage_store::{
    AppendBatch, AppendOutcome, DismissedPairs, EventStore, ReadModelStore, SnapshotStore,
};
use lineage_types::RecordedEvent;

use crate::config::Limits;
use crate::error::CoreError;
use crate::projection;

/// The genealogy core: event log, read model, snapshots, dismissed
/// pairs, and the command surface built on top of them.
#[derive(Debug, Default)]
pub struct Core {
    pub(crate) events: EventStore,
    pub(crate) read: ReadModelStore,
    pub(crate) snapshots: SnapshotStore,
    pub(crate) dismissed: DismissedPairs,
    pub(crate) limits: Limits,
    /// Serializes append + projection so no commit can project before
    /// an earlier commit on the same aggregate has.
    commit_lock: Mutex<()>,
}

impl Core {
    /// Create an empty core with the given limits.
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// The configured limits.
    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The global position of the most recently committed event.
    pub fn current_position(&self) -> u64 {
        self.events.current_position()
    }

    /// Clear the read model and rebuild it by replaying the event log
    /// from position 0.
    pub fn rebuild(&self) {
        let _commit = self.commit_lock.lock().unwrap_or_else(PoisonError::into_inner);
        projection::rebuild(&self.events, &self.read);
    }

    /// Append one batch and synchronously project its events.
    ///
    /// Both steps run under the commit lock: without it, a later append
    /// could project before an earlier one and regress the read-model
    /// row below its aggregate's version.
    pub(crate) fn commit(&self, batch: AppendBatch) -> Result<AppendOutcome, CoreError> {
        let _commit = self.commit_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = self.events.append(batch)?;
        projection::project(&self.read, &outcome.events);
        Ok(outcome)
    }

    /// Append several batches atomically and synchronously project the
    /// committed events, under the same commit lock as [`commit`](Self::commit).
    /// Used by the merge engine only.
    pub(crate) fn commit_all(
        &self,
        batches: Vec<AppendBatch>,
    ) -> Result<Vec<RecordedEvent>, CoreError> {
        let _commit = self.commit_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let events = self.events.append_all(batches)?;
        projection::project(&self.read, &events);
        Ok(events)
    }
}
