//! Integration tests for the history service and read-model rebuild.

// Tests use expect/unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use lineage_core::{Core, ErrorKind, HistoryQuery, Limits};
use lineage_types::{
    ChangeAction, EntityType, NewPerson, NewSource, Patch, PersonFilter, PersonName, PersonPatch,
    SourceFilter,
};

fn core() -> Core {
    Core::new(Limits::default())
}

fn new_person(given: &str) -> NewPerson {
    NewPerson {
        names: vec![PersonName {
            given: given.to_owned(),
            surname: "Doe".to_owned(),
            primary: true,
        }],
        ..NewPerson::default()
    }
}

#[test]
fn global_history_is_newest_first_with_display_names() {
    let core = core();
    let person = core.create_person(new_person("John")).expect("person");
    let _ = core
        .update_person(
            person.id,
            1,
            PersonPatch {
                occupation: Patch::Set("farmer".to_owned()),
                ..PersonPatch::default()
            },
        )
        .expect("update");

    let page = core
        .global_history(&HistoryQuery::default(), None, None)
        .expect("history");
    assert_eq!(page.total, 2);

    let positions: Vec<u64> = page.items.iter().map(|entry| entry.position).collect();
    assert_eq!(positions, vec![2, 1]);
    assert!(page.items.iter().all(|entry| entry.entity_name == "John Doe"));
    assert_eq!(
        page.items.first().map(|entry| entry.action),
        Some(ChangeAction::Updated)
    );
}

#[test]
fn global_history_filters_by_entity_type() {
    let core = core();
    let _ = core.create_person(new_person("John")).expect("person");
    let _ = core
        .create_source(NewSource {
            title: "Census".to_owned(),
            ..NewSource::default()
        })
        .expect("source");

    let query = HistoryQuery {
        entity_type: Some("source".to_owned()),
        ..HistoryQuery::default()
    };
    let page = core.global_history(&query, None, None).expect("history");
    assert_eq!(page.total, 1);
    assert_eq!(
        page.items.first().map(|entry| entry.entity_type),
        Some(EntityType::Source)
    );
}

#[test]
fn global_history_validates_its_filters() {
    let core = core();

    let bad_type = core.global_history(
        &HistoryQuery {
            entity_type: Some("planet".to_owned()),
            ..HistoryQuery::default()
        },
        None,
        None,
    );
    assert_eq!(bad_type.err().map(|e| e.kind()), Some(ErrorKind::Validation));

    let bad_time = core.global_history(
        &HistoryQuery {
            from: Some("yesterday".to_owned()),
            ..HistoryQuery::default()
        },
        None,
        None,
    );
    assert_eq!(bad_time.err().map(|e| e.kind()), Some(ErrorKind::Validation));

    let inverted = core.global_history(
        &HistoryQuery {
            from: Some("2026-01-02T00:00:00Z".to_owned()),
            to: Some("2026-01-01T00:00:00Z".to_owned()),
            ..HistoryQuery::default()
        },
        None,
        None,
    );
    assert_eq!(inverted.err().map(|e| e.kind()), Some(ErrorKind::Validation));
}

#[test]
fn global_history_honors_time_bounds() {
    let core = core();
    let _ = core.create_person(new_person("John")).expect("person");

    let past = HistoryQuery {
        from: Some("2000-01-01T00:00:00Z".to_owned()),
        ..HistoryQuery::default()
    };
    assert_eq!(core.global_history(&past, None, None).map(|p| p.total).ok(), Some(1));

    let future = HistoryQuery {
        from: Some("2100-01-01T00:00:00Z".to_owned()),
        ..HistoryQuery::default()
    };
    assert_eq!(
        core.global_history(&future, None, None).map(|p| p.total).ok(),
        Some(0)
    );
}

#[test]
fn entity_history_covers_the_whole_lifecycle() {
    let core = core();
    let person = core.create_person(new_person("John")).expect("person");
    let _ = core
        .update_person(
            person.id,
            1,
            PersonPatch {
                notes: Patch::Set("seen in 1900 census".to_owned()),
                ..PersonPatch::default()
            },
        )
        .expect("update");
    core.delete_person(person.id, 2).expect("delete");

    // The row is gone, but its history remains readable.
    let page = core
        .entity_history(EntityType::Person, &person.id.to_string(), None, None)
        .expect("history");
    assert_eq!(page.total, 3);

    let actions: Vec<ChangeAction> = page.items.iter().map(|entry| entry.action).collect();
    assert_eq!(
        actions,
        vec![
            ChangeAction::Deleted,
            ChangeAction::Updated,
            ChangeAction::Created
        ]
    );
    assert!(page.items.iter().all(|entry| entry.entity_name == "John Doe"));
}

#[test]
fn entity_history_distinguishes_bad_ids_from_unknown_ids() {
    let core = core();

    let malformed = core.entity_history(EntityType::Person, "not-a-uuid", None, None);
    assert_eq!(
        malformed.err().map(|e| e.kind()),
        Some(ErrorKind::Validation)
    );

    let unknown = core.entity_history(
        EntityType::Person,
        &uuid::Uuid::now_v7().to_string(),
        None,
        None,
    );
    assert_eq!(unknown.err().map(|e| e.kind()), Some(ErrorKind::NotFound));
}

#[test]
fn history_pagination_reports_has_more() {
    let core = core();
    let person = core.create_person(new_person("John")).expect("person");
    for version in 1..=4 {
        let _ = core
            .update_person(
                person.id,
                version,
                PersonPatch {
                    notes: Patch::Set(format!("note {version}")),
                    ..PersonPatch::default()
                },
            )
            .expect("update");
    }

    let page = core
        .entity_history(EntityType::Person, &person.id.to_string(), Some(2), Some(2))
        .expect("history");
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert!(page.has_more);
}

// ---------------------------------------------------------------------------
// Rebuild
// ---------------------------------------------------------------------------

#[test]
fn rebuild_from_zero_reproduces_the_live_read_model() {
    let core = core();
    let john = core.create_person(new_person("John")).expect("john");
    let jane = core.create_person(new_person("Jane")).expect("jane");
    let _ = core
        .update_person(
            john.id,
            1,
            PersonPatch {
                occupation: Patch::Set("farmer".to_owned()),
                ..PersonPatch::default()
            },
        )
        .expect("update");
    core.delete_person(jane.id, 1).expect("delete");
    let _ = core
        .create_source(NewSource {
            title: "Census".to_owned(),
            author: Some("State archive".to_owned()),
            ..NewSource::default()
        })
        .expect("source");

    let persons_before = core.list_persons(&PersonFilter::default(), Some(100), None);
    let sources_before = core.list_sources(&SourceFilter::default(), Some(100), None);

    core.rebuild();

    let persons_after = core.list_persons(&PersonFilter::default(), Some(100), None);
    let sources_after = core.list_sources(&SourceFilter::default(), Some(100), None);
    assert_eq!(persons_before, persons_after);
    assert_eq!(sources_before, sources_after);
    assert_eq!(persons_after.total, 1);
}
