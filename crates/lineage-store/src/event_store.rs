//! The append-only event log with optimistic concurrency.
//!
//! Events are the source of truth. Each aggregate has its own stream,
//! ordered by `aggregate_version`; a single global position counter,
//! assigned exactly once per committed event under the write lock,
//! provides the total order used by snapshots and history.
//!
//! # Concurrency
//!
//! All state lives behind one [`RwLock`] with short critical sections.
//! [`append`](EventStore::append) performs compare-and-swap on the
//! aggregate's expected version inside the write lock, so of several
//! simultaneous appends against the same aggregate with the same
//! expected version exactly one succeeds; the rest observe a
//! [`StoreError::VersionConflict`]. The store never auto-retries.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use lineage_types::{EntityType, EventPayload, RecordedEvent};
use uuid::Uuid;

use crate::error::StoreError;

/// One aggregate's contribution to an append: the stream to write to,
/// the caller's believed version, a display label for history feeds,
/// and the payloads to commit.
#[derive(Debug, Clone)]
pub struct AppendBatch {
    /// The kind of aggregate.
    pub entity_type: EntityType,
    /// The aggregate's ID.
    pub aggregate_id: Uuid,
    /// The version the caller believes is current (0 for new aggregates).
    pub expected_version: u64,
    /// Display name of the entity at commit time.
    pub label: String,
    /// The events to commit, in order.
    pub payloads: Vec<EventPayload>,
}

/// Result of a successful single-aggregate append.
#[derive(Debug, Clone)]
pub struct AppendOutcome {
    /// The aggregate's version after the append.
    pub new_version: u64,
    /// The committed events, with versions and positions assigned.
    pub events: Vec<RecordedEvent>,
}

/// In-memory state guarded by the store lock.
#[derive(Debug, Default)]
struct LogInner {
    /// All committed events in global-position order.
    log: Vec<RecordedEvent>,
    /// Current version per aggregate. Entries are kept after logical
    /// deletion so version numbers are never reused.
    versions: HashMap<(EntityType, Uuid), u64>,
    /// The position assigned to the most recently committed event.
    last_position: u64,
}

impl LogInner {
    /// Current version of an aggregate (0 if it has no events).
    fn version_of(&self, entity_type: EntityType, id: Uuid) -> u64 {
        self.versions.get(&(entity_type, id)).copied().unwrap_or(0)
    }

    /// Validate one batch against the given version view without
    /// committing anything.
    fn validate(
        &self,
        batch: &AppendBatch,
        view: &HashMap<(EntityType, Uuid), u64>,
    ) -> Result<(), StoreError> {
        if batch.payloads.is_empty() {
            return Err(StoreError::EmptyAppend);
        }

        for payload in &batch.payloads {
            if payload.entity_type() != batch.entity_type {
                return Err(StoreError::TypeMismatch {
                    expected: batch.entity_type,
                    actual: payload.entity_type(),
                });
            }
        }

        let current = view
            .get(&(batch.entity_type, batch.aggregate_id))
            .copied()
            .unwrap_or_else(|| self.version_of(batch.entity_type, batch.aggregate_id));
        if current != batch.expected_version {
            return Err(StoreError::VersionConflict {
                entity_type: batch.entity_type,
                id: batch.aggregate_id,
                expected: batch.expected_version,
                current,
            });
        }

        Ok(())
    }

    /// Commit one validated batch, assigning versions and positions.
    fn commit(&mut self, batch: AppendBatch) -> AppendOutcome {
        let mut version = self.version_of(batch.entity_type, batch.aggregate_id);
        let recorded_at = Utc::now();
        let mut events = Vec::with_capacity(batch.payloads.len());

        for payload in batch.payloads {
            version = version.saturating_add(1);
            self.last_position = self.last_position.saturating_add(1);

            let event = RecordedEvent {
                entity_type: batch.entity_type,
                aggregate_id: batch.aggregate_id,
                aggregate_version: version,
                global_position: self.last_position,
                label: batch.label.clone(),
                payload,
                recorded_at,
            };
            self.log.push(event.clone());
            events.push(event);
        }

        self.versions
            .insert((batch.entity_type, batch.aggregate_id), version);

        AppendOutcome {
            new_version: version,
            events,
        }
    }
}

/// The in-memory event store.
///
/// A durable backend must honor the same contracts: per-aggregate
/// version compare-and-swap, consecutive global positions, and
/// all-or-nothing multi-aggregate commits via
/// [`append_all`](EventStore::append_all).
#[derive(Debug, Default)]
pub struct EventStore {
    inner: RwLock<LogInner>,
}

impl EventStore {
    /// Create a new empty event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append events to one aggregate's stream.
    ///
    /// Fails with [`StoreError::VersionConflict`] if the aggregate's
    /// current version differs from `expected_version`; in that case
    /// nothing is committed. On success every payload receives a
    /// consecutive `aggregate_version` and a consecutive
    /// `global_position`, and the aggregate's version advances by the
    /// number of payloads.
    pub fn append(&self, batch: AppendBatch) -> Result<AppendOutcome, StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        inner.validate(&batch, &HashMap::new())?;
        let outcome = inner.commit(batch);

        tracing::debug!(
            count = outcome.events.len(),
            new_version = outcome.new_version,
            position = inner.last_position,
            "appended events"
        );
        Ok(outcome)
    }

    /// Append to several aggregates as one atomic unit.
    ///
    /// This is the single ordered commit phase used by cross-aggregate
    /// operations (the merge engine): every batch's expected version is
    /// validated first, then all batches commit, all under one critical
    /// section. If any validation fails, no aggregate is touched.
    ///
    /// Batches targeting the same aggregate compose: the second batch's
    /// expected version must account for the first batch's events.
    pub fn append_all(&self, batches: Vec<AppendBatch>) -> Result<Vec<RecordedEvent>, StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        // Phase 1: validate everything against a prospective version view.
        let mut view: HashMap<(EntityType, Uuid), u64> = HashMap::new();
        for batch in &batches {
            inner.validate(batch, &view)?;
            let key = (batch.entity_type, batch.aggregate_id);
            let current = view
                .get(&key)
                .copied()
                .unwrap_or_else(|| inner.version_of(batch.entity_type, batch.aggregate_id));
            let payload_count = u64::try_from(batch.payloads.len()).unwrap_or(u64::MAX);
            view.insert(key, current.saturating_add(payload_count));
        }

        // Phase 2: commit in order. Nothing below can fail.
        let mut events = Vec::new();
        let batch_count = batches.len();
        for batch in batches {
            let outcome = inner.commit(batch);
            events.extend(outcome.events);
        }

        tracing::debug!(
            batches = batch_count,
            count = events.len(),
            position = inner.last_position,
            "appended multi-aggregate commit"
        );
        Ok(events)
    }

    /// Load all events of one aggregate, in version order.
    ///
    /// Fails with [`StoreError::NotFound`] if the aggregate has no
    /// events at all.
    pub fn load(&self, entity_type: EntityType, id: Uuid) -> Result<Vec<RecordedEvent>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let events: Vec<RecordedEvent> = inner
            .log
            .iter()
            .filter(|event| event.entity_type == entity_type && event.aggregate_id == id)
            .cloned()
            .collect();

        if events.is_empty() {
            return Err(StoreError::NotFound { entity_type, id });
        }
        Ok(events)
    }

    /// Load every event with `after < global_position <= up_to`, in
    /// global order.
    ///
    /// The lower bound is exclusive and the upper bound inclusive, so a
    /// snapshot at position P contains exactly the events of
    /// `load_range(0, P)` and two snapshots P1 < P2 differ by
    /// `load_range(P1, P2)`.
    pub fn load_range(&self, after: u64, up_to: u64) -> Vec<RecordedEvent> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .log
            .iter()
            .filter(|event| event.global_position > after && event.global_position <= up_to)
            .cloned()
            .collect()
    }

    /// Load the entire log, in global order. Used for full read-model
    /// rebuilds.
    pub fn replay_all(&self) -> Vec<RecordedEvent> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.log.clone()
    }

    /// The global position of the most recently committed event
    /// (0 when the log is empty). Used to stamp new snapshots.
    pub fn current_position(&self) -> u64 {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.last_position
    }

    /// The current version of an aggregate, or `None` if it was never
    /// observed in any event.
    pub fn version_of(&self, entity_type: EntityType, id: Uuid) -> Option<u64> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.versions.get(&(entity_type, id)).copied()
    }

    /// Total number of committed events.
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.log.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use lineage_types::{PersonEvent, SourceEvent};

    use super::*;

    fn source_created(title: &str) -> EventPayload {
        EventPayload::Source(SourceEvent::Created {
            title: title.to_owned(),
            author: None,
            publication: None,
            repository: None,
            notes: None,
        })
    }

    fn source_deleted() -> EventPayload {
        EventPayload::Source(SourceEvent::Deleted)
    }

    fn batch(id: Uuid, expected: u64, payloads: Vec<EventPayload>) -> AppendBatch {
        AppendBatch {
            entity_type: EntityType::Source,
            aggregate_id: id,
            expected_version: expected,
            label: "Parish register".to_owned(),
            payloads,
        }
    }

    #[test]
    fn versions_and_positions_are_consecutive() {
        let store = EventStore::new();
        let id = Uuid::now_v7();

        let outcome = store
            .append(batch(id, 0, vec![source_created("a"), source_deleted()]))
            .ok();

        assert_eq!(outcome.as_ref().map(|o| o.new_version), Some(2));
        let events = outcome.map(|o| o.events).unwrap_or_default();
        let versions: Vec<u64> = events.iter().map(|e| e.aggregate_version).collect();
        assert_eq!(versions, vec![1, 2]);
        let positions: Vec<u64> = events.iter().map(|e| e.global_position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(store.current_position(), 2);
    }

    #[test]
    fn stale_expected_version_commits_nothing() {
        let store = EventStore::new();
        let id = Uuid::now_v7();

        let _ = store.append(batch(id, 0, vec![source_created("a")]));
        let result = store.append(batch(id, 0, vec![source_deleted()]));

        assert!(matches!(
            result,
            Err(StoreError::VersionConflict {
                expected: 0,
                current: 1,
                ..
            })
        ));
        assert_eq!(store.len(), 1);
        assert_eq!(store.version_of(EntityType::Source, id), Some(1));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let store = EventStore::new();
        let result = store.append(batch(Uuid::now_v7(), 0, Vec::new()));
        assert!(matches!(result, Err(StoreError::EmptyAppend)));
    }

    #[test]
    fn mismatched_payload_type_is_rejected() {
        let store = EventStore::new();
        let result = store.append(batch(
            Uuid::now_v7(),
            0,
            vec![EventPayload::Person(PersonEvent::Deleted)],
        ));
        assert!(matches!(result, Err(StoreError::TypeMismatch { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn load_unknown_aggregate_is_not_found() {
        let store = EventStore::new();
        let result = store.load(EntityType::Source, Uuid::now_v7());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn load_range_is_exclusive_inclusive() {
        let store = EventStore::new();
        for _ in 0..4 {
            let _ = store.append(batch(Uuid::now_v7(), 0, vec![source_created("x")]));
        }

        // Positions 1..=4 exist. (1, 3] must be exactly {2, 3}.
        let positions: Vec<u64> = store
            .load_range(1, 3)
            .iter()
            .map(|e| e.global_position)
            .collect();
        assert_eq!(positions, vec![2, 3]);

        // Lower bound exclusive: (4, 4] is empty.
        assert!(store.load_range(4, 4).is_empty());
        // Upper bound inclusive: (0, 1] is exactly the first event.
        assert_eq!(store.load_range(0, 1).len(), 1);
    }

    #[test]
    fn append_all_validates_every_batch_before_committing() {
        let store = EventStore::new();
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let _ = store.append(batch(a, 0, vec![source_created("a")]));

        // Second batch carries a stale version; the first must not commit.
        let result = store.append_all(vec![
            batch(a, 1, vec![source_deleted()]),
            batch(b, 7, vec![source_created("b")]),
        ]);

        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
        assert_eq!(store.len(), 1);
        assert_eq!(store.version_of(EntityType::Source, a), Some(1));
        assert_eq!(store.version_of(EntityType::Source, b), None);
    }

    #[test]
    fn append_all_composes_batches_on_the_same_aggregate() {
        let store = EventStore::new();
        let id = Uuid::now_v7();

        let events = store
            .append_all(vec![
                batch(id, 0, vec![source_created("a")]),
                batch(id, 1, vec![source_deleted()]),
            ])
            .unwrap_or_default();

        assert_eq!(events.len(), 2);
        assert_eq!(store.version_of(EntityType::Source, id), Some(2));
    }

    #[test]
    fn versions_survive_logical_deletion() {
        let store = EventStore::new();
        let id = Uuid::now_v7();

        let _ = store.append(batch(id, 0, vec![source_created("a")]));
        let _ = store.append(batch(id, 1, vec![source_deleted()]));

        // The stream continues at version 2; it never resets.
        assert_eq!(store.version_of(EntityType::Source, id), Some(2));
        let result = store.append(batch(id, 0, vec![source_created("again")]));
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    }
}
