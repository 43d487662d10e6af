//! Per-entity command services.
//!
//! Each submodule extends [`Core`](crate::service::Core) with the
//! create / update / delete surface for one entity, plus its reads.
//! Updates take the caller's expected version and a tri-state patch;
//! the store's compare-and-swap turns stale versions into
//! `ConcurrencyConflict`. Every successful command projects its events
//! into the read model before returning the updated row.

pub mod citations;
pub mod families;
pub mod media;
pub mod persons;
pub mod sources;

use lineage_types::{EntityType, PersonName};
use uuid::Uuid;

use crate::error::CoreError;
use crate::service::Core;

/// Reject an empty or whitespace-only required string field.
fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Validate a person's name list: at least one name, exactly one
/// primary, and no name that is blank on both halves.
fn validate_names(names: &[PersonName]) -> Result<(), CoreError> {
    if names.is_empty() {
        return Err(CoreError::validation("a person needs at least one name"));
    }
    let primaries = names.iter().filter(|name| name.primary).count();
    if primaries != 1 {
        return Err(CoreError::validation(
            "exactly one name must be marked primary",
        ));
    }
    for name in names {
        if name.given.trim().is_empty() && name.surname.trim().is_empty() {
            return Err(CoreError::validation(
                "a name needs a given name or a surname",
            ));
        }
    }
    Ok(())
}

impl Core {
    /// Whether an entity of the given type currently exists in the read
    /// model. Used to validate cross-entity references (media links).
    pub(crate) fn entity_exists(&self, entity_type: EntityType, id: Uuid) -> bool {
        match entity_type {
            EntityType::Person => self.read.get_person(id.into()).is_some(),
            EntityType::Family => self.read.get_family(id.into()).is_some(),
            EntityType::Source => self.read.get_source(id.into()).is_some(),
            EntityType::Citation => self.read.get_citation(id.into()).is_some(),
            EntityType::Media => self.read.get_media(id.into()).is_some(),
        }
    }

    /// Validate a batch call's item count against the configured cap.
    pub(crate) fn check_batch_size(&self, len: usize) -> Result<(), CoreError> {
        if len == 0 {
            return Err(CoreError::validation("batch must not be empty"));
        }
        if len > self.limits.max_batch {
            return Err(CoreError::validation(format!(
                "batch has {len} items, maximum is {}",
                self.limits.max_batch
            )));
        }
        Ok(())
    }
}
