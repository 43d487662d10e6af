//! Error taxonomy for the command layer.
//!
//! Every operation fails with exactly one [`CoreError`] variant, and
//! callers dispatch on [`CoreError::kind`] rather than string matching.
//! Storage errors convert via `From` so the `?` operator carries them
//! across the layer boundary.

use core::fmt;

use lineage_store::StoreError;
use lineage_types::EntityType;
use uuid::Uuid;

/// Coarse classification of a [`CoreError`], for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The referenced entity does not exist.
    NotFound,
    /// The supplied expected version is stale.
    ConcurrencyConflict,
    /// The request itself is malformed.
    Validation,
    /// The request is well-formed but the current state forbids it.
    ConflictState,
    /// An invariant the core relies on was broken.
    Internal,
}

impl ErrorKind {
    /// Stable snake_case name for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::ConcurrencyConflict => "concurrency_conflict",
            Self::Validation => "validation",
            Self::ConflictState => "conflict_state",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the command layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The referenced entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// What kind of thing was looked up (entity type or "snapshot").
        kind: String,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// The supplied expected version does not match the aggregate's
    /// current version. Nothing was committed.
    #[error("version conflict on {entity_type} {id}: expected {expected}, current {current}")]
    ConcurrencyConflict {
        /// The kind of aggregate.
        entity_type: EntityType,
        /// The aggregate's ID.
        id: Uuid,
        /// The version the caller believed was current.
        expected: u64,
        /// The actual current version.
        current: u64,
    },

    /// The request itself is malformed (bad field, bad filter, bad
    /// timestamp, oversized batch).
    #[error("{0}")]
    Validation(String),

    /// The request is well-formed but the current state forbids it
    /// (e.g. deleting a source that still has citations).
    #[error("{0}")]
    ConflictState(String),

    /// An invariant the core relies on was broken; not a caller error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The coarse classification of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            Self::Validation(_) => ErrorKind::Validation,
            Self::ConflictState(_) => ErrorKind::ConflictState,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Not-found error for a typed entity.
    pub fn not_found(entity_type: EntityType, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Validation error with a caller-facing message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Conflict-state error with a caller-facing message.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::ConflictState(message.into())
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity_type, id } => Self::not_found(entity_type, id),
            StoreError::VersionConflict {
                entity_type,
                id,
                expected,
                current,
            } => Self::ConcurrencyConflict {
                entity_type,
                id,
                expected,
                current,
            },
            StoreError::SnapshotNotFound(id) => Self::NotFound {
                kind: "snapshot".to_owned(),
                id: id.to_string(),
            },
            // These indicate a bug in the command layer, not caller input.
            other @ (StoreError::EmptyAppend | StoreError::TypeMismatch { .. }) => {
                Self::Internal(other.to_string())
            }
        }
    }
}
