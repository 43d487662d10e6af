//! Family commands: create, update, delete, and child membership.

use std::collections::BTreeSet;

use lineage_store::AppendBatch;
use lineage_types::{
    EntityType, EventPayload, Family, FamilyEvent, FamilyFilter, FamilyId, FamilyPatch, NewFamily,
    Page, PersonId,
};

use crate::error::CoreError;
use crate::service::Core;

impl Core {
    /// Create a family. Partners are capped at two and every referenced
    /// person must exist.
    pub fn create_family(&self, input: NewFamily) -> Result<Family, CoreError> {
        if input.partners.len() > 2 {
            return Err(CoreError::validation("a family has at most two partners"));
        }
        let mut seen = BTreeSet::new();
        for member in input.partners.iter().chain(&input.children) {
            if !seen.insert(*member) {
                return Err(CoreError::validation(format!(
                    "person {member} appears twice in the family"
                )));
            }
            self.get_person(*member)?;
        }

        let id = FamilyId::new();
        let label = self.partner_label(&input.partners);
        let NewFamily {
            partners,
            children,
            marriage_date,
            marriage_place,
            notes,
        } = input;
        self.commit(AppendBatch {
            entity_type: EntityType::Family,
            aggregate_id: id.into_inner(),
            expected_version: 0,
            label,
            payloads: vec![EventPayload::Family(FamilyEvent::Created {
                partners,
                children,
                marriage_date,
                marriage_place,
                notes,
            })],
        })?;
        self.projected_family(id)
    }

    /// Fetch a family row.
    pub fn get_family(&self, id: FamilyId) -> Result<Family, CoreError> {
        self.read
            .get_family(id)
            .ok_or_else(|| CoreError::not_found(EntityType::Family, id))
    }

    /// List families matching the filter, paginated.
    pub fn list_families(
        &self,
        filter: &FamilyFilter,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Page<Family> {
        let (limit, offset) = self.limits.page_bounds(limit, offset);
        self.read.list_families(filter, limit, offset)
    }

    /// Apply a tri-state patch to a family's scalar fields.
    pub fn update_family(
        &self,
        id: FamilyId,
        expected_version: u64,
        patch: FamilyPatch,
    ) -> Result<Family, CoreError> {
        let family = self.get_family(id)?;
        if patch == FamilyPatch::default() {
            return Err(CoreError::validation("update patch contains no changes"));
        }

        self.commit(AppendBatch {
            entity_type: EntityType::Family,
            aggregate_id: id.into_inner(),
            expected_version,
            label: self.family_label(&family),
            payloads: vec![EventPayload::Family(FamilyEvent::Updated { patch })],
        })?;
        self.projected_family(id)
    }

    /// Add a child to the family. The person must exist and must not
    /// already be a member.
    pub fn add_child(
        &self,
        id: FamilyId,
        expected_version: u64,
        child: PersonId,
    ) -> Result<Family, CoreError> {
        let family = self.get_family(id)?;
        self.get_person(child)?;
        if family.has_member(child) {
            return Err(CoreError::validation(
                "person is already a member of this family",
            ));
        }

        self.commit(AppendBatch {
            entity_type: EntityType::Family,
            aggregate_id: id.into_inner(),
            expected_version,
            label: self.family_label(&family),
            payloads: vec![EventPayload::Family(FamilyEvent::ChildAdded { child })],
        })?;
        self.projected_family(id)
    }

    /// Remove a child from the family.
    pub fn remove_child(
        &self,
        id: FamilyId,
        expected_version: u64,
        child: PersonId,
    ) -> Result<Family, CoreError> {
        let family = self.get_family(id)?;
        if !family.children.contains(&child) {
            return Err(CoreError::validation(
                "person is not a child of this family",
            ));
        }

        self.commit(AppendBatch {
            entity_type: EntityType::Family,
            aggregate_id: id.into_inner(),
            expected_version,
            label: self.family_label(&family),
            payloads: vec![EventPayload::Family(FamilyEvent::ChildRemoved { child })],
        })?;
        self.projected_family(id)
    }

    /// Delete a family. Blocked (`ConflictState`) while it still has
    /// children; remove them first.
    pub fn delete_family(&self, id: FamilyId, expected_version: u64) -> Result<(), CoreError> {
        let family = self.get_family(id)?;
        if !family.children.is_empty() {
            return Err(CoreError::conflict(format!(
                "family still has {} child(ren)",
                family.children.len()
            )));
        }

        self.commit(AppendBatch {
            entity_type: EntityType::Family,
            aggregate_id: id.into_inner(),
            expected_version,
            label: self.family_label(&family),
            payloads: vec![EventPayload::Family(FamilyEvent::Deleted)],
        })?;
        Ok(())
    }

    /// Display label for a family: its partners' names.
    pub(crate) fn family_label(&self, family: &Family) -> String {
        self.partner_label(&family.partners)
    }

    fn partner_label(&self, partners: &[PersonId]) -> String {
        let names: Vec<String> = partners
            .iter()
            .filter_map(|id| self.read.get_person(*id))
            .map(|person| person.display_name())
            .collect();
        if names.is_empty() {
            "(family)".to_owned()
        } else {
            names.join(" & ")
        }
    }

    fn projected_family(&self, id: FamilyId) -> Result<Family, CoreError> {
        self.read
            .get_family(id)
            .ok_or_else(|| CoreError::Internal(format!("family {id} missing after projection")))
    }
}
