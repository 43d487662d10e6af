//! Event payloads and the recorded-event envelope.
//!
//! Events are the source of truth. Every state change produces an
//! immutable [`RecordedEvent`] appended to the event store; aggregate
//! state and every read-model row are folds over these payloads. Payload
//! `kind()` strings are stable once persisted and must never change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{MediaLink, PersonName};
use crate::enums::{ChangeAction, EntityType, Gender};
use crate::ids::{PersonId, SourceId};
use crate::requests::{CitationPatch, FamilyPatch, MediaPatch, PersonPatch, SourcePatch};

// ---------------------------------------------------------------------------
// Recorded event envelope
// ---------------------------------------------------------------------------

/// One committed event, as stored in the event log.
///
/// `aggregate_version` orders events within one aggregate's stream;
/// `global_position` is the single total order across all aggregates,
/// assigned atomically at commit. Both start at 1. `label` is the
/// entity's display name at commit time, stamped by the command layer
/// so that history feeds never have to re-fold state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// The kind of aggregate this event belongs to.
    pub entity_type: EntityType,
    /// The aggregate's ID.
    pub aggregate_id: Uuid,
    /// 1-based position within the aggregate's own stream.
    pub aggregate_version: u64,
    /// 1-based position in the global ordering.
    pub global_position: u64,
    /// Display name of the entity at commit time.
    pub label: String,
    /// The state change itself.
    pub payload: EventPayload,
    /// Wall-clock commit time.
    pub recorded_at: DateTime<Utc>,
}

impl RecordedEvent {
    /// The net action this single event represents.
    pub const fn action(&self) -> ChangeAction {
        if self.payload.is_initial() {
            ChangeAction::Created
        } else if self.payload.is_terminal() {
            ChangeAction::Deleted
        } else {
            ChangeAction::Updated
        }
    }
}

/// A state change to exactly one aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum EventPayload {
    /// A change to a person aggregate.
    Person(PersonEvent),
    /// A change to a family aggregate.
    Family(FamilyEvent),
    /// A change to a source aggregate.
    Source(SourceEvent),
    /// A change to a citation aggregate.
    Citation(CitationEvent),
    /// A change to a media aggregate.
    Media(MediaEvent),
}

impl EventPayload {
    /// The entity type this payload applies to.
    pub const fn entity_type(&self) -> EntityType {
        match self {
            Self::Person(_) => EntityType::Person,
            Self::Family(_) => EntityType::Family,
            Self::Source(_) => EntityType::Source,
            Self::Citation(_) => EntityType::Citation,
            Self::Media(_) => EntityType::Media,
        }
    }

    /// Stable snake_case name of the concrete event kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Person(event) => event.kind(),
            Self::Family(event) => event.kind(),
            Self::Source(event) => event.kind(),
            Self::Citation(event) => event.kind(),
            Self::Media(event) => event.kind(),
        }
    }

    /// Whether this payload brings its aggregate into existence.
    pub const fn is_initial(&self) -> bool {
        matches!(
            self,
            Self::Person(PersonEvent::Created { .. })
                | Self::Family(FamilyEvent::Created { .. })
                | Self::Source(SourceEvent::Created { .. })
                | Self::Citation(CitationEvent::Created { .. })
                | Self::Media(MediaEvent::Created { .. })
        )
    }

    /// Whether this payload logically deletes its aggregate.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Person(PersonEvent::Deleted | PersonEvent::Merged { .. })
                | Self::Family(FamilyEvent::Deleted)
                | Self::Source(SourceEvent::Deleted)
                | Self::Citation(CitationEvent::Deleted)
                | Self::Media(MediaEvent::Deleted)
        )
    }
}

// ---------------------------------------------------------------------------
// Person events
// ---------------------------------------------------------------------------

/// State changes to a person aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersonEvent {
    /// The person record was created.
    Created {
        /// Initial names; exactly one is primary.
        names: Vec<PersonName>,
        /// Initial gender.
        gender: Gender,
        /// Initial birth date.
        birth_date: Option<String>,
        /// Initial birth place.
        birth_place: Option<String>,
        /// Initial death date.
        death_date: Option<String>,
        /// Initial death place.
        death_place: Option<String>,
        /// Initial occupation.
        occupation: Option<String>,
        /// Initial notes.
        notes: Option<String>,
    },
    /// Scalar fields were partially updated.
    Updated {
        /// The tri-state patch that was applied.
        patch: PersonPatch,
    },
    /// An alternate (or primary) name was added.
    NameAdded {
        /// The added name.
        name: PersonName,
    },
    /// A name was removed by its index in the name list.
    NameRemoved {
        /// Index into the name list at the time of the event.
        index: usize,
    },
    /// The person was merged into another person and is now deleted.
    Merged {
        /// The surviving person.
        survivor: PersonId,
    },
    /// The person record was deleted outright.
    Deleted,
}

impl PersonEvent {
    /// Stable snake_case name of this event kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "person_created",
            Self::Updated { .. } => "person_updated",
            Self::NameAdded { .. } => "person_name_added",
            Self::NameRemoved { .. } => "person_name_removed",
            Self::Merged { .. } => "person_merged",
            Self::Deleted => "person_deleted",
        }
    }
}

// ---------------------------------------------------------------------------
// Family events
// ---------------------------------------------------------------------------

/// State changes to a family aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FamilyEvent {
    /// The family was created.
    Created {
        /// Initial partners (at most two).
        partners: Vec<PersonId>,
        /// Initial children.
        children: Vec<PersonId>,
        /// Initial marriage date.
        marriage_date: Option<String>,
        /// Initial marriage place.
        marriage_place: Option<String>,
        /// Initial notes.
        notes: Option<String>,
    },
    /// Scalar fields were partially updated.
    Updated {
        /// The tri-state patch that was applied.
        patch: FamilyPatch,
    },
    /// A child was added.
    ChildAdded {
        /// The added child.
        child: PersonId,
    },
    /// A child was removed.
    ChildRemoved {
        /// The removed child.
        child: PersonId,
    },
    /// Every membership of `from` (partner or child) was re-pointed to
    /// `to`. Emitted by the merge engine.
    MemberReplaced {
        /// The merged-away person.
        from: PersonId,
        /// The surviving person.
        to: PersonId,
    },
    /// The family was deleted.
    Deleted,
}

impl FamilyEvent {
    /// Stable snake_case name of this event kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "family_created",
            Self::Updated { .. } => "family_updated",
            Self::ChildAdded { .. } => "family_child_added",
            Self::ChildRemoved { .. } => "family_child_removed",
            Self::MemberReplaced { .. } => "family_member_replaced",
            Self::Deleted => "family_deleted",
        }
    }
}

// ---------------------------------------------------------------------------
// Source / Citation / Media events
// ---------------------------------------------------------------------------

/// State changes to a source aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceEvent {
    /// The source was created.
    Created {
        /// Title (required, non-empty).
        title: String,
        /// Author or compiler.
        author: Option<String>,
        /// Publication details.
        publication: Option<String>,
        /// Holding repository.
        repository: Option<String>,
        /// Initial notes.
        notes: Option<String>,
    },
    /// Fields were partially updated.
    Updated {
        /// The tri-state patch that was applied.
        patch: SourcePatch,
    },
    /// The source was deleted.
    Deleted,
}

impl SourceEvent {
    /// Stable snake_case name of this event kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "source_created",
            Self::Updated { .. } => "source_updated",
            Self::Deleted => "source_deleted",
        }
    }
}

/// State changes to a citation aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CitationEvent {
    /// The citation was created.
    Created {
        /// The cited source.
        source_id: SourceId,
        /// The person the citation supports.
        person_id: PersonId,
        /// Location within the source.
        detail: Option<String>,
        /// Evidence quality, 0..=3.
        quality: u8,
        /// Initial notes.
        notes: Option<String>,
    },
    /// Fields were partially updated.
    Updated {
        /// The tri-state patch that was applied.
        patch: CitationPatch,
    },
    /// The citation changed owner. Emitted by the merge engine when the
    /// cited person is merged away.
    OwnerReassigned {
        /// Previous owner (the merged-away person).
        from: PersonId,
        /// New owner (the survivor).
        to: PersonId,
    },
    /// The citation was deleted.
    Deleted,
}

impl CitationEvent {
    /// Stable snake_case name of this event kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "citation_created",
            Self::Updated { .. } => "citation_updated",
            Self::OwnerReassigned { .. } => "citation_owner_reassigned",
            Self::Deleted => "citation_deleted",
        }
    }
}

/// State changes to a media aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaEvent {
    /// The media record was created.
    Created {
        /// Stored file name.
        file_name: String,
        /// MIME type.
        mime_type: String,
        /// Display title.
        title: Option<String>,
        /// Longer description.
        description: Option<String>,
        /// Entities this media is attached to.
        links: Vec<MediaLink>,
    },
    /// Fields were partially updated.
    Updated {
        /// The tri-state patch that was applied.
        patch: MediaPatch,
    },
    /// The media record was deleted.
    Deleted,
}

impl MediaEvent {
    /// Stable snake_case name of this event kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "media_created",
            Self::Updated { .. } => "media_updated",
            Self::Deleted => "media_deleted",
        }
    }
}
