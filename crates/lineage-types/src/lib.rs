//! Shared type definitions for the Lineage genealogy core.
//!
//! This crate is the single source of truth for all types used across the
//! Lineage workspace: identifiers, entity rows, event payloads, command
//! inputs, and derived result types.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all aggregate identifiers
//! - [`enums`] -- Enumeration types (entity kinds, change actions, gender)
//! - [`entities`] -- Read-model rows, snapshots, diffs, merge results
//! - [`events`] -- Event payloads and the recorded-event envelope
//! - [`requests`] -- Creation payloads, update patches, filters
//! - [`patch`] -- Tri-state field patch for partial updates
//! - [`page`] -- Offset pagination envelope

pub mod entities;
pub mod enums;
pub mod events;
pub mod ids;
pub mod page;
pub mod patch;
pub mod requests;

// Re-export all public types at crate root for convenience.
pub use entities::{
    BatchItem, BatchReport, ChangeEntry, Citation, Family, FieldDiff, HistoryEntry, Media,
    MediaLink, MergeOutcome, MergeSummary, Person, PersonName, Snapshot, SnapshotComparison,
    Source,
};
pub use enums::{ChangeAction, EntityType, FieldSource, Gender, UnknownEntityType};
pub use events::{
    CitationEvent, EventPayload, FamilyEvent, MediaEvent, PersonEvent, RecordedEvent, SourceEvent,
};
pub use ids::{CitationId, FamilyId, MediaId, PersonId, SnapshotId, SourceId};
pub use page::Page;
pub use patch::Patch;
pub use requests::{
    CitationFilter, CitationPatch, DismissRequest, FamilyFilter, FamilyPatch,
    MediaFilter, MediaPatch, MergeRequest, NewCitation, NewFamily, NewMedia, NewPerson, NewSource,
    PersonFilter, PersonPatch, SourceFilter, SourcePatch,
};
