//! Integration tests for the merge engine and duplicate dismissal.

// Tests use expect/unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeMap;

use lineage_core::{Core, ErrorKind, Limits};
use lineage_types::{
    BatchItem, DismissRequest, FieldSource, MergeRequest, NewCitation, NewFamily, NewPerson,
    NewSource, Patch, PersonId, PersonName, PersonPatch,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn core() -> Core {
    Core::new(Limits::default())
}

fn new_person(given: &str, surname: &str) -> NewPerson {
    NewPerson {
        names: vec![PersonName {
            given: given.to_owned(),
            surname: surname.to_owned(),
            primary: true,
        }],
        ..NewPerson::default()
    }
}

fn merge_request(
    survivor: (PersonId, u64),
    merged: (PersonId, u64),
    fields: &[(&str, FieldSource)],
) -> MergeRequest {
    let field_resolution: BTreeMap<String, FieldSource> = fields
        .iter()
        .map(|(field, source)| ((*field).to_owned(), *source))
        .collect();
    MergeRequest {
        survivor_id: survivor.0,
        survivor_version: survivor.1,
        merged_id: merged.0,
        merged_version: merged.1,
        field_resolution,
    }
}

#[test]
fn merge_takes_the_merged_birth_date_when_resolved() {
    init_tracing();
    let core = core();
    let x = core.create_person(new_person("X", "Doe")).expect("x");
    let y = core
        .create_person(NewPerson {
            birth_date: Some("1850".to_owned()),
            ..new_person("Y", "Doe")
        })
        .expect("y");

    let outcome = core
        .merge_persons(merge_request(
            (x.id, 1),
            (y.id, 1),
            &[("birth_date", FieldSource::Merged)],
        ))
        .expect("merge");

    assert_eq!(outcome.survivor.birth_date.as_deref(), Some("1850"));
    assert_eq!(outcome.summary.fields_changed, 1);
    assert_eq!(outcome.summary.merged_name, "Y Doe");

    // The merged person is gone from the read model.
    assert_eq!(
        core.get_person(y.id).err().map(|e| e.kind()),
        Some(ErrorKind::NotFound)
    );
}

#[test]
fn default_preserve_keeps_survivor_values() {
    let core = core();
    let x = core
        .create_person(NewPerson {
            birth_date: Some("1851".to_owned()),
            ..new_person("X", "Doe")
        })
        .expect("x");
    let y = core
        .create_person(NewPerson {
            birth_date: Some("1850".to_owned()),
            occupation: Some("farmer".to_owned()),
            ..new_person("X", "Doe")
        })
        .expect("y");

    // No resolution entries at all: every field stays the survivor's.
    let outcome = core
        .merge_persons(merge_request((x.id, 1), (y.id, 1), &[]))
        .expect("merge");
    assert_eq!(outcome.survivor.birth_date.as_deref(), Some("1851"));
    assert_eq!(outcome.survivor.occupation, None);
    assert_eq!(outcome.summary.fields_changed, 0);
}

#[test]
fn merge_carries_differing_names_as_alternates() {
    let core = core();
    let x = core.create_person(new_person("John", "Smith")).expect("x");
    let y = core.create_person(new_person("Johann", "Schmidt")).expect("y");

    let outcome = core
        .merge_persons(merge_request((x.id, 1), (y.id, 1), &[]))
        .expect("merge");

    assert_eq!(outcome.survivor.names.len(), 2);
    assert_eq!(outcome.survivor.display_name(), "John Smith");
    assert!(
        outcome
            .survivor
            .names
            .iter()
            .any(|n| n.given == "Johann" && !n.primary)
    );
}

#[test]
fn merge_repoints_families_and_transfers_citations() {
    init_tracing();
    let core = core();
    let survivor = core.create_person(new_person("X", "Doe")).expect("x");
    let merged = core.create_person(new_person("Y", "Doe")).expect("y");
    let spouse = core.create_person(new_person("Z", "Roe")).expect("z");

    let family = core
        .create_family(NewFamily {
            partners: vec![merged.id, spouse.id],
            ..NewFamily::default()
        })
        .expect("family");

    let source = core
        .create_source(NewSource {
            title: "Census".to_owned(),
            ..NewSource::default()
        })
        .expect("source");
    let citation = core
        .create_citation(NewCitation {
            source_id: source.id,
            person_id: merged.id,
            detail: None,
            quality: 2,
            notes: None,
        })
        .expect("citation");

    let outcome = core
        .merge_persons(merge_request((survivor.id, 1), (merged.id, 1), &[]))
        .expect("merge");

    assert_eq!(outcome.summary.families_repointed, 1);
    assert_eq!(outcome.summary.citations_transferred, 1);

    let family = core.get_family(family.id).expect("family row");
    assert!(family.partners.contains(&survivor.id));
    assert!(!family.partners.contains(&merged.id));

    let citation = core.get_citation(citation.id).expect("citation row");
    assert_eq!(citation.person_id, survivor.id);
}

#[test]
fn merging_two_children_of_one_family_dedups_the_membership() {
    let core = core();
    let survivor = core.create_person(new_person("X", "Doe")).expect("x");
    let merged = core.create_person(new_person("Y", "Doe")).expect("y");
    let parent = core.create_person(new_person("P", "Doe")).expect("p");

    let family = core
        .create_family(NewFamily {
            partners: vec![parent.id],
            children: vec![survivor.id, merged.id],
            ..NewFamily::default()
        })
        .expect("family");

    let _ = core
        .merge_persons(merge_request((survivor.id, 1), (merged.id, 1), &[]))
        .expect("merge");

    let family = core.get_family(family.id).expect("row");
    assert_eq!(family.children, vec![survivor.id]);
}

#[test]
fn stale_versions_fail_the_whole_merge_with_no_partial_effect() {
    let core = core();
    let survivor = core.create_person(new_person("X", "Doe")).expect("x");
    let merged = core.create_person(new_person("Y", "Doe")).expect("y");
    let spouse = core.create_person(new_person("Z", "Roe")).expect("z");
    let family = core
        .create_family(NewFamily {
            partners: vec![merged.id, spouse.id],
            ..NewFamily::default()
        })
        .expect("family");

    // The caller's view of the merged person is stale.
    let result = core.merge_persons(merge_request((survivor.id, 1), (merged.id, 7), &[]));
    assert_eq!(
        result.err().map(|e| e.kind()),
        Some(ErrorKind::ConcurrencyConflict)
    );

    // Nothing moved: both persons intact, the family untouched.
    assert_eq!(core.get_person(survivor.id).map(|p| p.version).ok(), Some(1));
    assert_eq!(core.get_person(merged.id).map(|p| p.version).ok(), Some(1));
    let family = core.get_family(family.id).expect("row");
    assert_eq!(family.version, 1);
    assert!(family.partners.contains(&merged.id));
}

#[test]
fn self_merge_is_rejected() {
    let core = core();
    let person = core.create_person(new_person("X", "Doe")).expect("x");
    let result = core.merge_persons(merge_request((person.id, 1), (person.id, 1), &[]));
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Validation));
}

#[test]
fn batch_merge_isolates_item_failures() {
    let core = core();
    let a = core.create_person(new_person("A", "Doe")).expect("a");
    let b = core.create_person(new_person("B", "Doe")).expect("b");
    let c = core.create_person(new_person("C", "Doe")).expect("c");

    let report = core
        .batch_merge(vec![
            merge_request((a.id, 1), (b.id, 1), &[]),
            // Self-merge: fails without blocking the first item.
            merge_request((c.id, 1), (c.id, 1), &[]),
        ])
        .expect("batch");

    assert_eq!(report.total, 2);
    assert_eq!(report.successful, 1);
    assert_eq!(report.failed, 1);
    assert!(report.results.first().is_some_and(BatchItem::is_success));
    assert!(report.results.get(1).is_some_and(|item| !item.is_success()));
}

#[test]
fn batch_size_bounds_are_enforced() {
    let core = core();
    assert_eq!(
        core.batch_merge(Vec::new()).err().map(|e| e.kind()),
        Some(ErrorKind::Validation)
    );

    let person = core.create_person(new_person("A", "Doe")).expect("a");
    let oversized: Vec<MergeRequest> = (0..101)
        .map(|_| merge_request((person.id, 1), (person.id, 1), &[]))
        .collect();
    assert_eq!(
        core.batch_merge(oversized).err().map(|e| e.kind()),
        Some(ErrorKind::Validation)
    );
}

// ---------------------------------------------------------------------------
// Dismissals
// ---------------------------------------------------------------------------

#[test]
fn dismissed_pairs_are_unordered_and_survive_edits() {
    let core = core();
    let a = core.create_person(new_person("A", "Doe")).expect("a");
    let b = core.create_person(new_person("B", "Doe")).expect("b");

    let inserted = core
        .dismiss_duplicate(DismissRequest {
            person_a: a.id,
            person_b: b.id,
        })
        .expect("dismiss");
    assert!(inserted);
    assert!(core.is_dismissed(b.id, a.id));

    // Re-dismissing in the other order is the same pair.
    let again = core
        .dismiss_duplicate(DismissRequest {
            person_a: b.id,
            person_b: a.id,
        })
        .expect("dismiss again");
    assert!(!again);

    // An unrelated edit to either person leaves the dismissal in place.
    let _ = core
        .update_person(
            a.id,
            1,
            PersonPatch {
                notes: Patch::Set("checked 1900 census".to_owned()),
                ..PersonPatch::default()
            },
        )
        .expect("edit");
    assert!(core.is_dismissed(a.id, b.id));
    assert_eq!(core.list_dismissed().len(), 1);
}

#[test]
fn dismissal_validates_its_pair() {
    let core = core();
    let a = core.create_person(new_person("A", "Doe")).expect("a");

    let self_pair = core.dismiss_duplicate(DismissRequest {
        person_a: a.id,
        person_b: a.id,
    });
    assert_eq!(
        self_pair.err().map(|e| e.kind()),
        Some(ErrorKind::Validation)
    );

    let ghost = core.dismiss_duplicate(DismissRequest {
        person_a: a.id,
        person_b: PersonId::new(),
    });
    assert_eq!(ghost.err().map(|e| e.kind()), Some(ErrorKind::NotFound));
}

#[test]
fn batch_dismiss_reports_per_item() {
    let core = core();
    let a = core.create_person(new_person("A", "Doe")).expect("a");
    let b = core.create_person(new_person("B", "Doe")).expect("b");

    let report = core
        .batch_dismiss(vec![
            DismissRequest {
                person_a: a.id,
                person_b: b.id,
            },
            DismissRequest {
                person_a: a.id,
                person_b: a.id,
            },
        ])
        .expect("batch");
    assert_eq!(report.successful, 1);
    assert_eq!(report.failed, 1);
}
