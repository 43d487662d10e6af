//! Person commands: create, update, delete, and name operations.

use lineage_store::AppendBatch;
use lineage_types::{
    EntityType, EventPayload, NewPerson, Page, Person, PersonEvent, PersonFilter, PersonId,
    PersonName, PersonPatch,
};

use super::validate_names;
use crate::error::CoreError;
use crate::service::Core;

/// Display name of a person derived from a raw name list, before any
/// row exists to ask.
fn primary_display(names: &[PersonName]) -> String {
    names
        .iter()
        .find(|name| name.primary)
        .or_else(|| names.first())
        .map(PersonName::display)
        .unwrap_or_else(|| "(unnamed)".to_owned())
}

impl Core {
    /// Create a person. The name list must be non-empty with exactly
    /// one primary name.
    pub fn create_person(&self, input: NewPerson) -> Result<Person, CoreError> {
        validate_names(&input.names)?;
        let label = primary_display(&input.names);
        let id = PersonId::new();

        let NewPerson {
            names,
            gender,
            birth_date,
            birth_place,
            death_date,
            death_place,
            occupation,
            notes,
        } = input;
        self.commit(AppendBatch {
            entity_type: EntityType::Person,
            aggregate_id: id.into_inner(),
            expected_version: 0,
            label,
            payloads: vec![EventPayload::Person(PersonEvent::Created {
                names,
                gender,
                birth_date,
                birth_place,
                death_date,
                death_place,
                occupation,
                notes,
            })],
        })?;
        self.projected_person(id)
    }

    /// Fetch a person row.
    pub fn get_person(&self, id: PersonId) -> Result<Person, CoreError> {
        self.read
            .get_person(id)
            .ok_or_else(|| CoreError::not_found(EntityType::Person, id))
    }

    /// List persons matching the filter, paginated.
    pub fn list_persons(
        &self,
        filter: &PersonFilter,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Page<Person> {
        let (limit, offset) = self.limits.page_bounds(limit, offset);
        self.read.list_persons(filter, limit, offset)
    }

    /// Apply a tri-state patch to a person's scalar fields.
    pub fn update_person(
        &self,
        id: PersonId,
        expected_version: u64,
        patch: PersonPatch,
    ) -> Result<Person, CoreError> {
        let person = self.get_person(id)?;
        if patch == PersonPatch::default() {
            return Err(CoreError::validation("update patch contains no changes"));
        }

        self.commit(AppendBatch {
            entity_type: EntityType::Person,
            aggregate_id: id.into_inner(),
            expected_version,
            label: person.display_name(),
            payloads: vec![EventPayload::Person(PersonEvent::Updated { patch })],
        })?;
        self.projected_person(id)
    }

    /// Add a name. A primary name demotes every existing name.
    pub fn add_person_name(
        &self,
        id: PersonId,
        expected_version: u64,
        name: PersonName,
    ) -> Result<Person, CoreError> {
        let person = self.get_person(id)?;
        if name.given.trim().is_empty() && name.surname.trim().is_empty() {
            return Err(CoreError::validation(
                "a name needs a given name or a surname",
            ));
        }

        self.commit(AppendBatch {
            entity_type: EntityType::Person,
            aggregate_id: id.into_inner(),
            expected_version,
            label: person.display_name(),
            payloads: vec![EventPayload::Person(PersonEvent::NameAdded { name })],
        })?;
        self.projected_person(id)
    }

    /// Remove a name by its index in the current name list.
    ///
    /// The sole name and the primary name cannot be removed
    /// (`ConflictState`); an out-of-range index is `Validation`.
    pub fn remove_person_name(
        &self,
        id: PersonId,
        expected_version: u64,
        index: usize,
    ) -> Result<Person, CoreError> {
        let person = self.get_person(id)?;
        let Some(name) = person.names.get(index) else {
            return Err(CoreError::validation(format!(
                "name index {index} is out of range"
            )));
        };
        if person.names.len() == 1 {
            return Err(CoreError::conflict("cannot remove a person's only name"));
        }
        if name.primary {
            return Err(CoreError::conflict(
                "cannot remove the primary name; make another name primary first",
            ));
        }

        self.commit(AppendBatch {
            entity_type: EntityType::Person,
            aggregate_id: id.into_inner(),
            expected_version,
            label: person.display_name(),
            payloads: vec![EventPayload::Person(PersonEvent::NameRemoved { index })],
        })?;
        self.projected_person(id)
    }

    /// Delete a person.
    ///
    /// Blocked (`ConflictState`) while the person is still a partner or
    /// child in any family; remove those memberships first.
    pub fn delete_person(&self, id: PersonId, expected_version: u64) -> Result<(), CoreError> {
        let person = self.get_person(id)?;
        let families = self.read.families_of(id);
        if !families.is_empty() {
            return Err(CoreError::conflict(format!(
                "person is still a member of {} family unit(s)",
                families.len()
            )));
        }

        self.commit(AppendBatch {
            entity_type: EntityType::Person,
            aggregate_id: id.into_inner(),
            expected_version,
            label: person.display_name(),
            payloads: vec![EventPayload::Person(PersonEvent::Deleted)],
        })?;
        Ok(())
    }

    /// A person row immediately after a commit that must have produced
    /// one. Absence means the projection and the log disagree.
    fn projected_person(&self, id: PersonId) -> Result<Person, CoreError> {
        self.read
            .get_person(id)
            .ok_or_else(|| CoreError::Internal(format!("person {id} missing after projection")))
    }
}
