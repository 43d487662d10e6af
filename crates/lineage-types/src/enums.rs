//! Enumeration types shared across the Lineage workspace.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Entity types
// ---------------------------------------------------------------------------

/// The kind of aggregate an event or read-model row belongs to.
///
/// Every aggregate in the system is one of these five kinds. The string
/// forms (`"person"`, `"family"`, ...) are the stable names used in event
/// payloads and history filters; they must not change once persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A person record.
    Person,
    /// A family unit linking partners and children.
    Family,
    /// A documentary source (book, register, census, ...).
    Source,
    /// A citation linking a person to a source.
    Citation,
    /// A media object (photo, scan, document).
    Media,
}

impl EntityType {
    /// All entity types, in a fixed order.
    pub const ALL: [Self; 5] = [
        Self::Person,
        Self::Family,
        Self::Source,
        Self::Citation,
        Self::Media,
    ];

    /// The stable lowercase name for this entity type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Family => "family",
            Self::Source => "source",
            Self::Citation => "citation",
            Self::Media => "media",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown entity type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntityType(pub String);

impl fmt::Display for UnknownEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity type: {}", self.0)
    }
}

impl core::error::Error for UnknownEntityType {}

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "person" => Ok(Self::Person),
            "family" => Ok(Self::Family),
            "source" => Ok(Self::Source),
            "citation" => Ok(Self::Citation),
            "media" => Ok(Self::Media),
            other => Err(UnknownEntityType(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Change actions
// ---------------------------------------------------------------------------

/// The nature of a change reported by history feeds and snapshot diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// The aggregate came into existence.
    Created,
    /// The aggregate was modified.
    Updated,
    /// The aggregate was logically deleted (including merged-away persons).
    Deleted,
}

impl ChangeAction {
    /// The stable lowercase name for this action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Person attributes
// ---------------------------------------------------------------------------

/// Recorded gender of a person.
///
/// Genealogical records are frequently silent on this, so `Unknown` is the
/// default rather than an absence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Recorded as male.
    Male,
    /// Recorded as female.
    Female,
    /// Not recorded or not determinable from the sources.
    #[default]
    Unknown,
}

// ---------------------------------------------------------------------------
// Merge field resolution
// ---------------------------------------------------------------------------

/// Which side of a person merge supplies a field's value.
///
/// The merge engine defaults to `Survivor` for any field without an
/// explicit resolution entry (default-preserve policy).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Keep the survivor's value (the default).
    #[default]
    Survivor,
    /// Take the merged-away person's value.
    Merged,
}
