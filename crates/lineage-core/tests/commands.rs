//! Integration tests for the per-entity command surface.

// Tests use expect/unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use lineage_core::{Core, CoreError, ErrorKind, Limits};
use lineage_types::{
    CitationFilter, EntityType, FamilyPatch, Gender, MediaLink, NewCitation, NewFamily, NewMedia,
    NewPerson, NewSource, Patch, PersonFilter, PersonName, PersonPatch, SourcePatch,
};

fn core() -> Core {
    Core::new(Limits::default())
}

fn name(given: &str, primary: bool) -> PersonName {
    PersonName {
        given: given.to_owned(),
        surname: "Doe".to_owned(),
        primary,
    }
}

fn new_person(given: &str) -> NewPerson {
    NewPerson {
        names: vec![name(given, true)],
        ..NewPerson::default()
    }
}

fn new_source(title: &str) -> NewSource {
    NewSource {
        title: title.to_owned(),
        ..NewSource::default()
    }
}

// ---------------------------------------------------------------------------
// Persons
// ---------------------------------------------------------------------------

#[test]
fn create_person_returns_a_version_one_row() {
    let core = core();
    let person = core
        .create_person(NewPerson {
            gender: Gender::Male,
            birth_date: Some("1850-03-01".to_owned()),
            ..new_person("John")
        })
        .expect("create person");

    assert_eq!(person.version, 1);
    assert_eq!(person.display_name(), "John Doe");
    assert_eq!(person.birth_date.as_deref(), Some("1850-03-01"));
    assert_eq!(core.get_person(person.id).map(|p| p.id).ok(), Some(person.id));
}

#[test]
fn person_creation_requires_exactly_one_primary_name() {
    let core = core();

    let none = core.create_person(NewPerson {
        names: vec![name("John", false)],
        ..NewPerson::default()
    });
    assert_eq!(none.err().map(|e| e.kind()), Some(ErrorKind::Validation));

    let two = core.create_person(NewPerson {
        names: vec![name("John", true), name("Jack", true)],
        ..NewPerson::default()
    });
    assert_eq!(two.err().map(|e| e.kind()), Some(ErrorKind::Validation));

    let zero = core.create_person(NewPerson::default());
    assert_eq!(zero.err().map(|e| e.kind()), Some(ErrorKind::Validation));
}

#[test]
fn stale_update_conflicts_and_changes_nothing() {
    let core = core();
    let person = core.create_person(new_person("John")).expect("create");

    let updated = core
        .update_person(
            person.id,
            1,
            PersonPatch {
                occupation: Patch::Set("farmer".to_owned()),
                ..PersonPatch::default()
            },
        )
        .expect("first update");
    assert_eq!(updated.version, 2);

    // A second writer still believing version 1 must lose.
    let stale = core.update_person(
        person.id,
        1,
        PersonPatch {
            occupation: Patch::Set("miller".to_owned()),
            ..PersonPatch::default()
        },
    );
    assert_eq!(
        stale.err().map(|e| e.kind()),
        Some(ErrorKind::ConcurrencyConflict)
    );
    let current = core.get_person(person.id).expect("row");
    assert_eq!(current.occupation.as_deref(), Some("farmer"));
    assert_eq!(current.version, 2);
}

#[test]
fn clear_patch_removes_a_field() {
    let core = core();
    let person = core
        .create_person(NewPerson {
            birth_date: Some("1850".to_owned()),
            ..new_person("John")
        })
        .expect("create");

    let updated = core
        .update_person(
            person.id,
            1,
            PersonPatch {
                birth_date: Patch::Clear,
                ..PersonPatch::default()
            },
        )
        .expect("update");
    assert_eq!(updated.birth_date, None);
}

#[test]
fn empty_patch_is_rejected() {
    let core = core();
    let person = core.create_person(new_person("John")).expect("create");
    let result = core.update_person(person.id, 1, PersonPatch::default());
    assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::Validation));
}

#[test]
fn adding_a_primary_name_demotes_the_old_one() {
    let core = core();
    let person = core.create_person(new_person("John")).expect("create");

    let updated = core
        .add_person_name(person.id, 1, name("Johann", true))
        .expect("add name");
    assert_eq!(updated.names.len(), 2);
    assert_eq!(updated.names.iter().filter(|n| n.primary).count(), 1);
    assert_eq!(updated.display_name(), "Johann Doe");
}

#[test]
fn name_removal_guards_sole_and_primary_names() {
    let core = core();
    let person = core.create_person(new_person("John")).expect("create");

    let sole = core.remove_person_name(person.id, 1, 0);
    assert_eq!(sole.err().map(|e| e.kind()), Some(ErrorKind::ConflictState));

    let person = core
        .add_person_name(person.id, 1, name("Johann", false))
        .expect("add name");

    let primary = core.remove_person_name(person.id, 2, 0);
    assert_eq!(
        primary.err().map(|e| e.kind()),
        Some(ErrorKind::ConflictState)
    );

    let out_of_range = core.remove_person_name(person.id, 2, 9);
    assert_eq!(
        out_of_range.err().map(|e| e.kind()),
        Some(ErrorKind::Validation)
    );

    let removed = core.remove_person_name(person.id, 2, 1).expect("remove");
    assert_eq!(removed.names.len(), 1);
}

#[test]
fn person_deletion_is_blocked_while_in_a_family() {
    let core = core();
    let partner_a = core.create_person(new_person("John")).expect("a");
    let partner_b = core.create_person(new_person("Jane")).expect("b");
    let family = core
        .create_family(NewFamily {
            partners: vec![partner_a.id, partner_b.id],
            ..NewFamily::default()
        })
        .expect("family");

    let blocked = core.delete_person(partner_a.id, 1);
    assert_eq!(
        blocked.err().map(|e| e.kind()),
        Some(ErrorKind::ConflictState)
    );

    core.delete_family(family.id, 1).expect("delete family");
    core.delete_person(partner_a.id, 1).expect("delete person");
    assert_eq!(
        core.get_person(partner_a.id).err().map(|e| e.kind()),
        Some(ErrorKind::NotFound)
    );
}

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

#[test]
fn family_members_must_exist_and_partners_are_capped() {
    let core = core();
    let a = core.create_person(new_person("A")).expect("a");
    let b = core.create_person(new_person("B")).expect("b");
    let c = core.create_person(new_person("C")).expect("c");

    let three = core.create_family(NewFamily {
        partners: vec![a.id, b.id, c.id],
        ..NewFamily::default()
    });
    assert_eq!(three.err().map(|e| e.kind()), Some(ErrorKind::Validation));

    let ghost = core.create_family(NewFamily {
        partners: vec![lineage_types::PersonId::new()],
        ..NewFamily::default()
    });
    assert_eq!(ghost.err().map(|e| e.kind()), Some(ErrorKind::NotFound));

    let twice = core.create_family(NewFamily {
        partners: vec![a.id],
        children: vec![a.id],
        ..NewFamily::default()
    });
    assert_eq!(twice.err().map(|e| e.kind()), Some(ErrorKind::Validation));
}

#[test]
fn child_membership_lifecycle() {
    let core = core();
    let parent = core.create_person(new_person("Parent")).expect("parent");
    let child = core.create_person(new_person("Child")).expect("child");
    let family = core
        .create_family(NewFamily {
            partners: vec![parent.id],
            ..NewFamily::default()
        })
        .expect("family");

    let family = core.add_child(family.id, 1, child.id).expect("add child");
    assert_eq!(family.children, vec![child.id]);

    let again = core.add_child(family.id, 2, child.id);
    assert_eq!(again.err().map(|e| e.kind()), Some(ErrorKind::Validation));

    // A family with children cannot be deleted.
    let blocked = core.delete_family(family.id, 2);
    assert_eq!(
        blocked.err().map(|e| e.kind()),
        Some(ErrorKind::ConflictState)
    );

    let family = core
        .remove_child(family.id, 2, child.id)
        .expect("remove child");
    assert!(family.children.is_empty());
    core.delete_family(family.id, 3).expect("delete");
}

#[test]
fn family_scalar_updates_use_the_tri_state_patch() {
    let core = core();
    let a = core.create_person(new_person("A")).expect("a");
    let family = core
        .create_family(NewFamily {
            partners: vec![a.id],
            marriage_place: Some("Boston".to_owned()),
            ..NewFamily::default()
        })
        .expect("family");

    let updated = core
        .update_family(
            family.id,
            1,
            FamilyPatch {
                marriage_date: Patch::Set("1875".to_owned()),
                marriage_place: Patch::Clear,
                ..FamilyPatch::default()
            },
        )
        .expect("update");
    assert_eq!(updated.marriage_date.as_deref(), Some("1875"));
    assert_eq!(updated.marriage_place, None);
}

// ---------------------------------------------------------------------------
// Sources and citations
// ---------------------------------------------------------------------------

#[test]
fn source_title_is_required_and_cannot_be_blanked() {
    let core = core();
    let empty = core.create_source(new_source("   "));
    assert_eq!(empty.err().map(|e| e.kind()), Some(ErrorKind::Validation));

    let source = core.create_source(new_source("Census of 1900")).expect("create");
    let blanked = core.update_source(
        source.id,
        1,
        SourcePatch {
            title: Some(String::new()),
            ..SourcePatch::default()
        },
    );
    assert_eq!(blanked.err().map(|e| e.kind()), Some(ErrorKind::Validation));
}

#[test]
fn source_deletion_is_blocked_while_cited() {
    let core = core();
    let person = core.create_person(new_person("John")).expect("person");
    let source = core.create_source(new_source("Census")).expect("source");
    let citation = core
        .create_citation(NewCitation {
            source_id: source.id,
            person_id: person.id,
            detail: Some("p. 12".to_owned()),
            quality: 3,
            notes: None,
        })
        .expect("citation");

    let blocked = core.delete_source(source.id, 1);
    assert_eq!(
        blocked.err().map(|e| e.kind()),
        Some(ErrorKind::ConflictState)
    );

    core.delete_citation(citation.id, 1).expect("delete citation");
    core.delete_source(source.id, 1).expect("delete source");
}

#[test]
fn citations_validate_quality_and_references() {
    let core = core();
    let person = core.create_person(new_person("John")).expect("person");
    let source = core.create_source(new_source("Census")).expect("source");

    let too_high = core.create_citation(NewCitation {
        source_id: source.id,
        person_id: person.id,
        detail: None,
        quality: 4,
        notes: None,
    });
    assert_eq!(too_high.err().map(|e| e.kind()), Some(ErrorKind::Validation));

    let ghost_source = core.create_citation(NewCitation {
        source_id: lineage_types::SourceId::new(),
        person_id: person.id,
        detail: None,
        quality: 1,
        notes: None,
    });
    assert_eq!(
        ghost_source.err().map(|e| e.kind()),
        Some(ErrorKind::NotFound)
    );

    let citation = core
        .create_citation(NewCitation {
            source_id: source.id,
            person_id: person.id,
            detail: None,
            quality: 2,
            notes: None,
        })
        .expect("create");
    let filter = CitationFilter {
        person_id: Some(person.id),
        ..CitationFilter::default()
    };
    let page = core.list_citations(&filter, None, None);
    assert_eq!(page.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![citation.id]);
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[test]
fn media_links_must_reference_existing_entities() {
    let core = core();
    let person = core.create_person(new_person("John")).expect("person");

    let dangling = core.create_media(NewMedia {
        file_name: "portrait.jpg".to_owned(),
        mime_type: "image/jpeg".to_owned(),
        links: vec![MediaLink {
            entity_type: EntityType::Person,
            entity_id: uuid::Uuid::now_v7(),
        }],
        ..NewMedia::default()
    });
    assert_eq!(dangling.err().map(|e| e.kind()), Some(ErrorKind::NotFound));

    let media = core
        .create_media(NewMedia {
            file_name: "portrait.jpg".to_owned(),
            mime_type: "image/jpeg".to_owned(),
            title: Some("Portrait of John".to_owned()),
            links: vec![MediaLink {
                entity_type: EntityType::Person,
                entity_id: person.id.into_inner(),
            }],
            ..NewMedia::default()
        })
        .expect("create media");
    assert_eq!(media.display_name(), "Portrait of John");
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[test]
fn listing_clamps_and_paginates() {
    let core = core();
    for i in 0..5 {
        let _ = core.create_person(new_person(&format!("P{i}")));
    }

    let page = core.list_persons(&PersonFilter::default(), Some(2), Some(2));
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert!(page.has_more);

    // Limit 0 is clamped up to 1 rather than returning nothing forever.
    let clamped = core.list_persons(&PersonFilter::default(), Some(0), None);
    assert_eq!(clamped.items.len(), 1);
}

#[test]
fn internal_errors_never_leak_from_normal_flows() {
    // Guard against accidentally classifying caller mistakes as internal.
    let core = core();
    let missing = core.get_person(lineage_types::PersonId::new());
    assert!(matches!(missing, Err(CoreError::NotFound { .. })));
}

// ---------------------------------------------------------------------------
// Projection consistency under concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_retried_updates_keep_the_read_model_in_lockstep() {
    let core = std::sync::Arc::new(core());
    let person = core.create_person(new_person("John")).expect("create");

    // Eight writers race on the same person, each following the retry
    // protocol: read the current version, submit, resubmit on conflict.
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let core = std::sync::Arc::clone(&core);
            let id = person.id;
            std::thread::spawn(move || {
                loop {
                    let current = core.get_person(id).expect("row");
                    let result = core.update_person(
                        id,
                        current.version,
                        PersonPatch {
                            occupation: Patch::Set(format!("job {i}")),
                            ..PersonPatch::default()
                        },
                    );
                    match result {
                        Ok(_) => break,
                        Err(err) if err.kind() == ErrorKind::ConcurrencyConflict => {}
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }

    // Every writer committed exactly one update; the projected row must
    // carry the final version, never one an earlier projection regressed.
    let row = core.get_person(person.id).expect("row");
    assert_eq!(row.version, 9);
    let history = core
        .entity_history(EntityType::Person, &person.id.to_string(), None, None)
        .expect("history");
    assert_eq!(history.total, 9);

    // And it must equal a fresh fold of the event log.
    core.rebuild();
    assert_eq!(core.get_person(person.id).ok(), Some(row));
}
