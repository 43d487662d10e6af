//! Read-model rows and derived result types.
//!
//! Each entity struct here is the denormalized current-state projection of
//! one aggregate, carrying the same `version` as its event stream so that
//! callers can echo it back for optimistic concurrency. Rows are built by
//! folding events (`lineage-core::state`) and never hand-edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{ChangeAction, EntityType, Gender};
use crate::ids::{CitationId, FamilyId, MediaId, PersonId, SnapshotId, SourceId};

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// One recorded name of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    /// Given (first) name, possibly several words.
    pub given: String,
    /// Surname / family name.
    pub surname: String,
    /// Whether this is the person's primary display name.
    ///
    /// Exactly one name per person is primary.
    pub primary: bool,
}

impl PersonName {
    /// Render as `"Given Surname"`, trimming whatever half is empty.
    pub fn display(&self) -> String {
        let display = format!("{} {}", self.given, self.surname);
        display.trim().to_owned()
    }
}

/// Current state of a person aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Aggregate identifier.
    pub id: PersonId,
    /// Current aggregate version (count of committed events).
    pub version: u64,
    /// All recorded names; exactly one is primary.
    pub names: Vec<PersonName>,
    /// Recorded gender.
    pub gender: Gender,
    /// Birth date as written in the sources (free-form, often fuzzy).
    pub birth_date: Option<String>,
    /// Birth place as written in the sources.
    pub birth_place: Option<String>,
    /// Death date as written in the sources.
    pub death_date: Option<String>,
    /// Death place as written in the sources.
    pub death_place: Option<String>,
    /// Recorded occupation.
    pub occupation: Option<String>,
    /// Free-form research notes.
    pub notes: Option<String>,
}

impl Person {
    /// Human-meaningful display name: the primary name, or the first
    /// recorded name if the primary flag is missing after a bad import.
    pub fn display_name(&self) -> String {
        self.names
            .iter()
            .find(|name| name.primary)
            .or_else(|| self.names.first())
            .map(PersonName::display)
            .unwrap_or_else(|| "(unnamed)".to_owned())
    }
}

// ---------------------------------------------------------------------------
// Family
// ---------------------------------------------------------------------------

/// Current state of a family aggregate: a partner pair and their children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Family {
    /// Aggregate identifier.
    pub id: FamilyId,
    /// Current aggregate version.
    pub version: u64,
    /// Partners (spouses); at most two.
    pub partners: Vec<PersonId>,
    /// Children, in recorded order.
    pub children: Vec<PersonId>,
    /// Marriage date as written in the sources.
    pub marriage_date: Option<String>,
    /// Marriage place as written in the sources.
    pub marriage_place: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl Family {
    /// Whether the given person appears as partner or child.
    pub fn has_member(&self, person: PersonId) -> bool {
        self.partners.contains(&person) || self.children.contains(&person)
    }
}

// ---------------------------------------------------------------------------
// Source / Citation / Media
// ---------------------------------------------------------------------------

/// Current state of a documentary source aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Aggregate identifier.
    pub id: SourceId,
    /// Current aggregate version.
    pub version: u64,
    /// Title of the source (required, non-empty).
    pub title: String,
    /// Author or compiler.
    pub author: Option<String>,
    /// Publication details (publisher, year, volume).
    pub publication: Option<String>,
    /// Repository holding the source (archive, library).
    pub repository: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Current state of a citation aggregate, linking a person to a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Aggregate identifier.
    pub id: CitationId,
    /// Current aggregate version.
    pub version: u64,
    /// The cited source.
    pub source_id: SourceId,
    /// The person this citation supports.
    pub person_id: PersonId,
    /// Where in the source (page, entry number, image frame).
    pub detail: Option<String>,
    /// Evidence quality, 0 (unreliable) to 3 (primary evidence).
    pub quality: u8,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// A link from a media object to some entity it depicts or documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaLink {
    /// The kind of linked entity.
    pub entity_type: EntityType,
    /// The linked entity's aggregate ID.
    pub entity_id: Uuid,
}

/// Current state of a media aggregate (photo, scan, document).
///
/// Binary content and thumbnails live outside this core; only the
/// descriptive record is event-sourced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Aggregate identifier.
    pub id: MediaId,
    /// Current aggregate version.
    pub version: u64,
    /// Stored file name.
    pub file_name: String,
    /// MIME type of the stored file.
    pub mime_type: String,
    /// Display title.
    pub title: Option<String>,
    /// Longer description.
    pub description: Option<String>,
    /// Entities this media object is attached to.
    pub links: Vec<MediaLink>,
}

impl Media {
    /// Human-meaningful label: the title if set, otherwise the file name.
    pub fn display_name(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.file_name.clone())
    }
}

// ---------------------------------------------------------------------------
// Snapshots and diffs
// ---------------------------------------------------------------------------

/// A named bookmark into the global event ordering.
///
/// A snapshot copies no data; it only marks a position. Its `position`
/// is fixed at creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot identifier.
    pub id: SnapshotId,
    /// User-chosen name (required, bounded length).
    pub name: String,
    /// Optional description (bounded length).
    pub description: Option<String>,
    /// The global position this snapshot marks: every event with
    /// `global_position <= position` is "inside" the snapshot.
    pub position: u64,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
}

/// A before/after change to one field of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// Field name as serialized on the entity row.
    pub field: String,
    /// Value before the compared range (absent if the field was unset).
    pub before: Option<serde_json::Value>,
    /// Value after the compared range.
    pub after: Option<serde_json::Value>,
}

/// Everything that happened to one entity between two snapshot positions,
/// reduced to a single entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// The kind of entity that changed.
    pub entity_type: EntityType,
    /// The entity's aggregate ID.
    pub entity_id: Uuid,
    /// Display name of the entity at its last change in the range.
    pub entity_name: String,
    /// Net action over the range.
    pub action: ChangeAction,
    /// Wall-clock time of the entity's last change in the range.
    pub timestamp: DateTime<Utc>,
    /// Per-field before/after diffs (only for `Updated` entries).
    pub field_diffs: Vec<FieldDiff>,
}

/// Result of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotComparison {
    /// One entry per changed entity, ordered by ascending global position
    /// of the entity's first change in the range.
    pub entries: Vec<ChangeEntry>,
    /// Total changed entities across all pages.
    pub total_count: usize,
    /// Whether more entries exist past this page.
    pub has_more: bool,
    /// Whether the first snapshot argument was the chronologically
    /// earlier of the two.
    pub older_first: bool,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One entry in a change-history feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Global position of the underlying event (unique, totally ordered).
    pub position: u64,
    /// Wall-clock time of the underlying event.
    pub timestamp: DateTime<Utc>,
    /// The kind of entity that changed.
    pub entity_type: EntityType,
    /// The entity's aggregate ID.
    pub entity_id: Uuid,
    /// Display name of the entity at the time of the change.
    pub entity_name: String,
    /// What happened.
    pub action: ChangeAction,
}

// ---------------------------------------------------------------------------
// Merge results
// ---------------------------------------------------------------------------

/// Human-readable summary of one completed person merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Display name of the merged-away person.
    pub merged_name: String,
    /// Number of survivor fields that changed value.
    pub fields_changed: usize,
    /// Number of family aggregates re-pointed to the survivor.
    pub families_repointed: usize,
    /// Number of citations transferred to the survivor.
    pub citations_transferred: usize,
}

/// The full result of a successful merge: updated survivor plus summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// The survivor row after all merge events were applied.
    pub survivor: Person,
    /// Counters describing what the merge did.
    pub summary: MergeSummary,
}

/// Per-item outcome inside a batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItem<T> {
    /// The item was applied.
    Succeeded {
        /// The item's result value.
        value: T,
    },
    /// The item was rejected; other items are unaffected.
    Failed {
        /// Human-readable error description.
        error: String,
    },
}

impl<T> BatchItem<T> {
    /// Whether this item succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Order-preserving response for a batch operation.
///
/// Batch calls are explicitly not transactions: each item is isolated,
/// and one item's failure neither blocks nor undoes another's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport<T> {
    /// Number of items in the request.
    pub total: usize,
    /// Number of items that succeeded.
    pub successful: usize,
    /// Number of items that failed.
    pub failed: usize,
    /// Per-item results, in request order.
    pub results: Vec<BatchItem<T>>,
}

impl<T> BatchReport<T> {
    /// Collect per-item results into a report.
    pub fn collect(results: Vec<BatchItem<T>>) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|item| item.is_success()).count();

        Self {
            total,
            successful,
            failed: total.saturating_sub(successful),
            results,
        }
    }
}
