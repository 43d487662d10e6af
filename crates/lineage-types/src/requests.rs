//! Command inputs: creation payloads, tri-state update patches, list
//! filters, and merge/dismiss requests.
//!
//! Patches use [`Patch`] for optional fields (absent / set / clear) and
//! plain `Option` for required fields (absent / set -- clearing a
//! required field is a validation error, so the state never arises).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{MediaLink, PersonName};
use crate::enums::{FieldSource, Gender};
use crate::ids::{PersonId, SourceId};
use crate::patch::Patch;

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// Payload for creating a person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    /// Initial names; at least one, exactly one primary.
    pub names: Vec<PersonName>,
    /// Recorded gender.
    #[serde(default)]
    pub gender: Gender,
    /// Birth date as written in the sources.
    #[serde(default)]
    pub birth_date: Option<String>,
    /// Birth place.
    #[serde(default)]
    pub birth_place: Option<String>,
    /// Death date.
    #[serde(default)]
    pub death_date: Option<String>,
    /// Death place.
    #[serde(default)]
    pub death_place: Option<String>,
    /// Occupation.
    #[serde(default)]
    pub occupation: Option<String>,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for a person's scalar fields. Names are changed via
/// the dedicated add/remove name operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonPatch {
    /// New gender, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// Birth date patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub birth_date: Patch<String>,
    /// Birth place patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub birth_place: Patch<String>,
    /// Death date patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub death_date: Patch<String>,
    /// Death place patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub death_place: Patch<String>,
    /// Occupation patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub occupation: Patch<String>,
    /// Notes patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub notes: Patch<String>,
}

// ---------------------------------------------------------------------------
// Family
// ---------------------------------------------------------------------------

/// Payload for creating a family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFamily {
    /// Partners (at most two); all must exist.
    pub partners: Vec<PersonId>,
    /// Children; all must exist.
    #[serde(default)]
    pub children: Vec<PersonId>,
    /// Marriage date.
    #[serde(default)]
    pub marriage_date: Option<String>,
    /// Marriage place.
    #[serde(default)]
    pub marriage_place: Option<String>,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for a family's scalar fields. Membership changes go
/// through the dedicated child operations or the merge engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyPatch {
    /// Marriage date patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub marriage_date: Patch<String>,
    /// Marriage place patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub marriage_place: Patch<String>,
    /// Notes patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub notes: Patch<String>,
}

// ---------------------------------------------------------------------------
// Source / Citation / Media
// ---------------------------------------------------------------------------

/// Payload for creating a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSource {
    /// Title (required, non-empty).
    pub title: String,
    /// Author or compiler.
    #[serde(default)]
    pub author: Option<String>,
    /// Publication details.
    #[serde(default)]
    pub publication: Option<String>,
    /// Holding repository.
    #[serde(default)]
    pub repository: Option<String>,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePatch {
    /// New title, if present (required field -- cannot be cleared).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Author patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub author: Patch<String>,
    /// Publication patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub publication: Patch<String>,
    /// Repository patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub repository: Patch<String>,
    /// Notes patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub notes: Patch<String>,
}

/// Payload for creating a citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCitation {
    /// The cited source; must exist.
    pub source_id: SourceId,
    /// The person the citation supports; must exist.
    pub person_id: PersonId,
    /// Location within the source.
    #[serde(default)]
    pub detail: Option<String>,
    /// Evidence quality, 0..=3.
    #[serde(default)]
    pub quality: u8,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for a citation. Ownership changes only through the
/// merge engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationPatch {
    /// Re-point to a different source, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<SourceId>,
    /// Detail patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub detail: Patch<String>,
    /// New quality, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    /// Notes patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub notes: Patch<String>,
}

/// Payload for creating a media record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedia {
    /// Stored file name (required, non-empty).
    pub file_name: String,
    /// MIME type (required, non-empty).
    pub mime_type: String,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Entities this media is attached to; all must exist.
    #[serde(default)]
    pub links: Vec<MediaLink>,
}

/// Partial update for a media record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPatch {
    /// New file name, if present (required field -- cannot be cleared).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// New MIME type, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Title patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub title: Patch<String>,
    /// Description patch.
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub description: Patch<String>,
    /// Replace the full link list, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<MediaLink>>,
}

// ---------------------------------------------------------------------------
// List filters
// ---------------------------------------------------------------------------

/// Filter criteria for listing persons. All criteria are conjunctive;
/// string matches are case-insensitive substring matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFilter {
    /// Match against any recorded surname.
    #[serde(default)]
    pub surname: Option<String>,
    /// Match against any recorded given name.
    #[serde(default)]
    pub given: Option<String>,
    /// Match against birth or death place.
    #[serde(default)]
    pub place: Option<String>,
}

/// Filter criteria for listing families.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyFilter {
    /// Only families where this person is partner or child.
    #[serde(default)]
    pub member: Option<PersonId>,
    /// Match against the marriage place.
    #[serde(default)]
    pub place: Option<String>,
}

/// Filter criteria for listing sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFilter {
    /// Match against the title.
    #[serde(default)]
    pub title: Option<String>,
    /// Match against the author.
    #[serde(default)]
    pub author: Option<String>,
}

/// Filter criteria for listing citations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationFilter {
    /// Only citations of this source.
    #[serde(default)]
    pub source_id: Option<SourceId>,
    /// Only citations owned by this person.
    #[serde(default)]
    pub person_id: Option<PersonId>,
}

/// Filter criteria for listing media records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFilter {
    /// Only media linked to this entity.
    #[serde(default)]
    pub linked_to: Option<MediaLink>,
    /// Match against the MIME type prefix (e.g. `"image/"`).
    #[serde(default)]
    pub mime_prefix: Option<String>,
}

// ---------------------------------------------------------------------------
// Merge and dismissal
// ---------------------------------------------------------------------------

/// One person-merge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// The person who survives the merge.
    pub survivor_id: PersonId,
    /// Caller's believed version of the survivor.
    pub survivor_version: u64,
    /// The person who is merged away and deleted.
    pub merged_id: PersonId,
    /// Caller's believed version of the merged person.
    pub merged_version: u64,
    /// Per-field resolution; fields without an entry keep the
    /// survivor's value.
    #[serde(default)]
    pub field_resolution: BTreeMap<String, FieldSource>,
}

/// One not-a-duplicate dismissal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissRequest {
    /// First person of the pair.
    pub person_a: PersonId,
    /// Second person of the pair.
    pub person_b: PersonId,
}
