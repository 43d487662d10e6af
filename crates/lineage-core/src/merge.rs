//! The person-merge engine and duplicate dismissal.
//!
//! A merge collapses two person records that describe the same real
//! individual. The survivor absorbs the merged person's field values
//! (per the caller's resolution), alternate names, family memberships,
//! and citations; the merged aggregate receives a terminal `Merged`
//! event. Everything commits through one atomic multi-aggregate append,
//! so a concurrent edit to any participant fails the whole merge with
//! no partial effect.

use lineage_store::AppendBatch;
use lineage_types::{
    BatchItem, BatchReport, Citation, CitationEvent, DismissRequest, EntityType, EventPayload,
    FamilyEvent, FieldSource, MergeOutcome, MergeRequest, MergeSummary, Patch, Person, PersonEvent,
    PersonId, PersonName, PersonPatch,
};

use crate::error::CoreError;
use crate::service::Core;

/// Person fields a merge resolution may name.
const MERGEABLE_FIELDS: [&str; 7] = [
    "gender",
    "birth_date",
    "birth_place",
    "death_date",
    "death_place",
    "occupation",
    "notes",
];

/// Take the merged person's value for one string field. Returns 1 when
/// the survivor's value actually changes.
fn take_field(slot: &mut Patch<String>, survivor: &Option<String>, merged: &Option<String>) -> usize {
    if survivor == merged {
        return 0;
    }
    *slot = merged
        .as_ref()
        .map_or(Patch::Clear, |value| Patch::Set(value.clone()));
    1
}

/// Resolve the survivor's field patch from the caller's per-field
/// choices. Fields without an entry (or resolved to the survivor) keep
/// the survivor's value.
fn resolve_fields(
    request: &MergeRequest,
    survivor: &Person,
    merged: &Person,
) -> Result<(PersonPatch, usize), CoreError> {
    let mut patch = PersonPatch::default();
    let mut changed = 0usize;

    for (field, source) in &request.field_resolution {
        if !MERGEABLE_FIELDS.contains(&field.as_str()) {
            return Err(CoreError::validation(format!(
                "unknown merge field: {field}"
            )));
        }
        if *source != FieldSource::Merged {
            continue;
        }
        let delta = match field.as_str() {
            "gender" => {
                if survivor.gender == merged.gender {
                    0
                } else {
                    patch.gender = Some(merged.gender);
                    1
                }
            }
            "birth_date" => take_field(&mut patch.birth_date, &survivor.birth_date, &merged.birth_date),
            "birth_place" => {
                take_field(&mut patch.birth_place, &survivor.birth_place, &merged.birth_place)
            }
            "death_date" => take_field(&mut patch.death_date, &survivor.death_date, &merged.death_date),
            "death_place" => {
                take_field(&mut patch.death_place, &survivor.death_place, &merged.death_place)
            }
            "occupation" => take_field(&mut patch.occupation, &survivor.occupation, &merged.occupation),
            _ => take_field(&mut patch.notes, &survivor.notes, &merged.notes),
        };
        changed = changed.saturating_add(delta);
    }

    Ok((patch, changed))
}

/// Names of the merged person that the survivor does not already carry,
/// demoted to alternates.
fn carried_names(survivor: &Person, merged: &Person) -> Vec<PersonName> {
    merged
        .names
        .iter()
        .filter(|name| {
            !survivor
                .names
                .iter()
                .any(|own| own.given == name.given && own.surname == name.surname)
        })
        .map(|name| PersonName {
            given: name.given.clone(),
            surname: name.surname.clone(),
            primary: false,
        })
        .collect()
}

impl Core {
    /// Merge one person into another.
    ///
    /// Both versions are validated up front and again inside the atomic
    /// commit; a stale version anywhere fails the whole merge with
    /// `ConcurrencyConflict` and no partial effect.
    pub fn merge_persons(&self, request: MergeRequest) -> Result<MergeOutcome, CoreError> {
        if request.survivor_id == request.merged_id {
            return Err(CoreError::validation("cannot merge a person with itself"));
        }
        let survivor = self.get_person(request.survivor_id)?;
        let merged = self.get_person(request.merged_id)?;
        check_version(&survivor, request.survivor_version)?;
        check_version(&merged, request.merged_version)?;

        let (patch, fields_changed) = resolve_fields(&request, &survivor, &merged)?;
        let names = carried_names(&survivor, &merged);

        // The survivor always receives an update event, even when the
        // resolution changes nothing, so its expected version is part of
        // the atomic commit.
        let mut survivor_payloads = vec![EventPayload::Person(PersonEvent::Updated { patch })];
        survivor_payloads.extend(
            names
                .into_iter()
                .map(|name| EventPayload::Person(PersonEvent::NameAdded { name })),
        );

        let mut batches = vec![AppendBatch {
            entity_type: EntityType::Person,
            aggregate_id: survivor.id.into_inner(),
            expected_version: request.survivor_version,
            label: survivor.display_name(),
            payloads: survivor_payloads,
        }];

        let families = self.read.families_of(merged.id);
        for family in &families {
            batches.push(AppendBatch {
                entity_type: EntityType::Family,
                aggregate_id: family.id.into_inner(),
                expected_version: family.version,
                label: self.family_label(family),
                payloads: vec![EventPayload::Family(FamilyEvent::MemberReplaced {
                    from: merged.id,
                    to: survivor.id,
                })],
            });
        }

        let citations = self.read.citations_owned_by(merged.id);
        for citation in &citations {
            let relabeled = Citation {
                person_id: survivor.id,
                ..citation.clone()
            };
            batches.push(AppendBatch {
                entity_type: EntityType::Citation,
                aggregate_id: citation.id.into_inner(),
                expected_version: citation.version,
                label: self.citation_label(&relabeled),
                payloads: vec![EventPayload::Citation(CitationEvent::OwnerReassigned {
                    from: merged.id,
                    to: survivor.id,
                })],
            });
        }

        batches.push(AppendBatch {
            entity_type: EntityType::Person,
            aggregate_id: merged.id.into_inner(),
            expected_version: request.merged_version,
            label: merged.display_name(),
            payloads: vec![EventPayload::Person(PersonEvent::Merged {
                survivor: survivor.id,
            })],
        });

        self.commit_all(batches)?;

        let summary = MergeSummary {
            merged_name: merged.display_name(),
            fields_changed,
            families_repointed: families.len(),
            citations_transferred: citations.len(),
        };
        tracing::info!(
            survivor = %survivor.id,
            merged = %merged.id,
            fields = summary.fields_changed,
            families = summary.families_repointed,
            citations = summary.citations_transferred,
            "merged persons"
        );

        let survivor = self.read.get_person(request.survivor_id).ok_or_else(|| {
            CoreError::Internal(format!(
                "survivor {} missing after merge projection",
                request.survivor_id
            ))
        })?;
        Ok(MergeOutcome { survivor, summary })
    }

    /// Execute several merges independently; one item's failure neither
    /// blocks nor undoes another's.
    pub fn batch_merge(
        &self,
        requests: Vec<MergeRequest>,
    ) -> Result<BatchReport<MergeOutcome>, CoreError> {
        self.check_batch_size(requests.len())?;
        let results = requests
            .into_iter()
            .map(|request| match self.merge_persons(request) {
                Ok(outcome) => BatchItem::Succeeded { value: outcome },
                Err(err) => BatchItem::Failed {
                    error: err.to_string(),
                },
            })
            .collect();
        Ok(BatchReport::collect(results))
    }

    /// Record that two persons were reviewed and are not duplicates.
    /// Returns `false` if the pair was already dismissed.
    pub fn dismiss_duplicate(&self, request: DismissRequest) -> Result<bool, CoreError> {
        if request.person_a == request.person_b {
            return Err(CoreError::validation(
                "cannot dismiss a person against itself",
            ));
        }
        self.get_person(request.person_a)?;
        self.get_person(request.person_b)?;
        Ok(self.dismissed.insert(request.person_a, request.person_b))
    }

    /// Dismiss several pairs independently, one result per item.
    pub fn batch_dismiss(
        &self,
        requests: Vec<DismissRequest>,
    ) -> Result<BatchReport<bool>, CoreError> {
        self.check_batch_size(requests.len())?;
        let results = requests
            .into_iter()
            .map(|request| match self.dismiss_duplicate(request) {
                Ok(inserted) => BatchItem::Succeeded { value: inserted },
                Err(err) => BatchItem::Failed {
                    error: err.to_string(),
                },
            })
            .collect();
        Ok(BatchReport::collect(results))
    }

    /// Whether the pair was dismissed, in either order.
    pub fn is_dismissed(&self, a: PersonId, b: PersonId) -> bool {
        self.dismissed.contains(a, b)
    }

    /// All dismissed pairs.
    pub fn list_dismissed(&self) -> Vec<(PersonId, PersonId)> {
        self.dismissed.list()
    }
}

/// Compare a read-model row's version against the caller's belief.
fn check_version(person: &Person, expected: u64) -> Result<(), CoreError> {
    if person.version != expected {
        return Err(CoreError::ConcurrencyConflict {
            entity_type: EntityType::Person,
            id: person.id.into_inner(),
            expected,
            current: person.version,
        });
    }
    Ok(())
}
