//! Error types for the storage layer.

use lineage_types::{EntityType, SnapshotId};
use uuid::Uuid;

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No events exist for the requested aggregate.
    #[error("{entity_type} {id} not found")]
    NotFound {
        /// The kind of aggregate.
        entity_type: EntityType,
        /// The aggregate's ID.
        id: Uuid,
    },

    /// The supplied expected version does not match the aggregate's
    /// current version. Nothing was committed; the caller must re-read
    /// current state and resubmit.
    #[error("version conflict on {entity_type} {id}: expected {expected}, current {current}")]
    VersionConflict {
        /// The kind of aggregate.
        entity_type: EntityType,
        /// The aggregate's ID.
        id: Uuid,
        /// The version the caller believed was current.
        expected: u64,
        /// The actual current version.
        current: u64,
    },

    /// An append was attempted with zero events.
    #[error("cannot append an empty event batch")]
    EmptyAppend,

    /// A payload's entity type does not match the batch it was
    /// submitted under.
    #[error("payload for {actual} submitted under a {expected} batch")]
    TypeMismatch {
        /// The entity type of the batch.
        expected: EntityType,
        /// The entity type of the offending payload.
        actual: EntityType,
    },

    /// The requested snapshot does not exist.
    #[error("snapshot {0} not found")]
    SnapshotNotFound(SnapshotId),
}
