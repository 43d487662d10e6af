//! Storage layer for the Lineage genealogy core.
//!
//! The event store is the source of truth: an append-only,
//! per-aggregate-ordered log with a single global ordering and
//! optimistic concurrency on append. The read model store holds
//! materialized current-state rows updated synchronously as events
//! commit. Snapshots are named bookmarks into the global ordering, and
//! the dismissed-pair set records confirmed non-duplicates.
//!
//! All stores here are in-memory reference implementations; a durable
//! backend must honor the same contracts (version compare-and-swap,
//! consecutive global positions, all-or-nothing multi-aggregate
//! commits).
//!
//! # Modules
//!
//! - [`event_store`] -- Append-only event log with optimistic concurrency
//! - [`read_model`] -- Materialized per-entity projection tables
//! - [`snapshot_store`] -- Named position bookmarks
//! - [`dismissed`] -- Unordered person pairs marked "not duplicates"
//! - [`error`] -- Shared error types

pub mod dismissed;
pub mod error;
pub mod event_store;
pub mod read_model;
pub mod snapshot_store;

// Re-export primary types for convenience.
pub use dismissed::DismissedPairs;
pub use error::StoreError;
pub use event_store::{AppendBatch, AppendOutcome, EventStore};
pub use read_model::ReadModelStore;
pub use snapshot_store::SnapshotStore;
