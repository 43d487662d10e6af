//! Pure fold functions: aggregate state as a function of its events.
//!
//! Every consumer of aggregate state derives rows through these same
//! folds -- command handlers, the synchronous projector, full rebuilds,
//! and the snapshot diff engine -- so replaying the log from position 0
//! reproduces the live read model exactly.
//!
//! Each fold takes the row as it stood before the event (`None` if the
//! aggregate did not exist) and returns the row afterwards (`None` once
//! it is logically deleted). Events of a different entity type leave
//! the state untouched.

use std::collections::BTreeSet;

use lineage_types::{
    Citation, CitationEvent, CitationId, EntityType, EventPayload, Family, FamilyEvent, FamilyId,
    Media, MediaEvent, MediaId, Person, PersonEvent, PersonId, RecordedEvent, Source, SourceEvent,
    SourceId,
};

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// Apply one event to a person row.
pub fn apply_person(state: Option<Person>, event: &RecordedEvent) -> Option<Person> {
    let EventPayload::Person(payload) = &event.payload else {
        return state;
    };

    match payload {
        PersonEvent::Created {
            names,
            gender,
            birth_date,
            birth_place,
            death_date,
            death_place,
            occupation,
            notes,
        } => Some(Person {
            id: PersonId::from(event.aggregate_id),
            version: event.aggregate_version,
            names: names.clone(),
            gender: *gender,
            birth_date: birth_date.clone(),
            birth_place: birth_place.clone(),
            death_date: death_date.clone(),
            death_place: death_place.clone(),
            occupation: occupation.clone(),
            notes: notes.clone(),
        }),
        PersonEvent::Updated { patch } => state.map(|mut person| {
            if let Some(gender) = patch.gender {
                person.gender = gender;
            }
            patch.birth_date.apply(&mut person.birth_date);
            patch.birth_place.apply(&mut person.birth_place);
            patch.death_date.apply(&mut person.death_date);
            patch.death_place.apply(&mut person.death_place);
            patch.occupation.apply(&mut person.occupation);
            patch.notes.apply(&mut person.notes);
            person.version = event.aggregate_version;
            person
        }),
        PersonEvent::NameAdded { name } => state.map(|mut person| {
            // A new primary name demotes every existing name.
            if name.primary {
                for existing in &mut person.names {
                    existing.primary = false;
                }
            }
            person.names.push(name.clone());
            person.version = event.aggregate_version;
            person
        }),
        PersonEvent::NameRemoved { index } => state.map(|mut person| {
            if *index < person.names.len() {
                person.names.remove(*index);
            }
            person.version = event.aggregate_version;
            person
        }),
        PersonEvent::Merged { .. } | PersonEvent::Deleted => None,
    }
}

// ---------------------------------------------------------------------------
// Family
// ---------------------------------------------------------------------------

/// Remove duplicate members while preserving first-occurrence order.
/// A merge can re-point two memberships onto the same person.
fn dedup_members(members: &mut Vec<PersonId>) {
    let mut seen = BTreeSet::new();
    members.retain(|member| seen.insert(*member));
}

/// Apply one event to a family row.
pub fn apply_family(state: Option<Family>, event: &RecordedEvent) -> Option<Family> {
    let EventPayload::Family(payload) = &event.payload else {
        return state;
    };

    match payload {
        FamilyEvent::Created {
            partners,
            children,
            marriage_date,
            marriage_place,
            notes,
        } => Some(Family {
            id: FamilyId::from(event.aggregate_id),
            version: event.aggregate_version,
            partners: partners.clone(),
            children: children.clone(),
            marriage_date: marriage_date.clone(),
            marriage_place: marriage_place.clone(),
            notes: notes.clone(),
        }),
        FamilyEvent::Updated { patch } => state.map(|mut family| {
            patch.marriage_date.apply(&mut family.marriage_date);
            patch.marriage_place.apply(&mut family.marriage_place);
            patch.notes.apply(&mut family.notes);
            family.version = event.aggregate_version;
            family
        }),
        FamilyEvent::ChildAdded { child } => state.map(|mut family| {
            if !family.children.contains(child) {
                family.children.push(*child);
            }
            family.version = event.aggregate_version;
            family
        }),
        FamilyEvent::ChildRemoved { child } => state.map(|mut family| {
            family.children.retain(|member| member != child);
            family.version = event.aggregate_version;
            family
        }),
        FamilyEvent::MemberReplaced { from, to } => state.map(|mut family| {
            for partner in &mut family.partners {
                if partner == from {
                    *partner = *to;
                }
            }
            for child in &mut family.children {
                if child == from {
                    *child = *to;
                }
            }
            dedup_members(&mut family.partners);
            dedup_members(&mut family.children);
            family.version = event.aggregate_version;
            family
        }),
        FamilyEvent::Deleted => None,
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Apply one event to a source row.
pub fn apply_source(state: Option<Source>, event: &RecordedEvent) -> Option<Source> {
    let EventPayload::Source(payload) = &event.payload else {
        return state;
    };

    match payload {
        SourceEvent::Created {
            title,
            author,
            publication,
            repository,
            notes,
        } => Some(Source {
            id: SourceId::from(event.aggregate_id),
            version: event.aggregate_version,
            title: title.clone(),
            author: author.clone(),
            publication: publication.clone(),
            repository: repository.clone(),
            notes: notes.clone(),
        }),
        SourceEvent::Updated { patch } => state.map(|mut source| {
            if let Some(title) = &patch.title {
                source.title.clone_from(title);
            }
            patch.author.apply(&mut source.author);
            patch.publication.apply(&mut source.publication);
            patch.repository.apply(&mut source.repository);
            patch.notes.apply(&mut source.notes);
            source.version = event.aggregate_version;
            source
        }),
        SourceEvent::Deleted => None,
    }
}

// ---------------------------------------------------------------------------
// Citation
// ---------------------------------------------------------------------------

/// Apply one event to a citation row.
pub fn apply_citation(state: Option<Citation>, event: &RecordedEvent) -> Option<Citation> {
    let EventPayload::Citation(payload) = &event.payload else {
        return state;
    };

    match payload {
        CitationEvent::Created {
            source_id,
            person_id,
            detail,
            quality,
            notes,
        } => Some(Citation {
            id: CitationId::from(event.aggregate_id),
            version: event.aggregate_version,
            source_id: *source_id,
            person_id: *person_id,
            detail: detail.clone(),
            quality: *quality,
            notes: notes.clone(),
        }),
        CitationEvent::Updated { patch } => state.map(|mut citation| {
            if let Some(source_id) = patch.source_id {
                citation.source_id = source_id;
            }
            if let Some(quality) = patch.quality {
                citation.quality = quality;
            }
            patch.detail.apply(&mut citation.detail);
            patch.notes.apply(&mut citation.notes);
            citation.version = event.aggregate_version;
            citation
        }),
        CitationEvent::OwnerReassigned { to, .. } => state.map(|mut citation| {
            citation.person_id = *to;
            citation.version = event.aggregate_version;
            citation
        }),
        CitationEvent::Deleted => None,
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// Apply one event to a media row.
pub fn apply_media(state: Option<Media>, event: &RecordedEvent) -> Option<Media> {
    let EventPayload::Media(payload) = &event.payload else {
        return state;
    };

    match payload {
        MediaEvent::Created {
            file_name,
            mime_type,
            title,
            description,
            links,
        } => Some(Media {
            id: MediaId::from(event.aggregate_id),
            version: event.aggregate_version,
            file_name: file_name.clone(),
            mime_type: mime_type.clone(),
            title: title.clone(),
            description: description.clone(),
            links: links.clone(),
        }),
        MediaEvent::Updated { patch } => state.map(|mut media| {
            if let Some(file_name) = &patch.file_name {
                media.file_name.clone_from(file_name);
            }
            if let Some(mime_type) = &patch.mime_type {
                media.mime_type.clone_from(mime_type);
            }
            if let Some(links) = &patch.links {
                media.links.clone_from(links);
            }
            patch.title.apply(&mut media.title);
            patch.description.apply(&mut media.description);
            media.version = event.aggregate_version;
            media
        }),
        MediaEvent::Deleted => None,
    }
}

// ---------------------------------------------------------------------------
// Whole-stream folds
// ---------------------------------------------------------------------------

/// Fold a person's event stream into its current row.
pub fn fold_person<'a, I>(events: I) -> Option<Person>
where
    I: IntoIterator<Item = &'a RecordedEvent>,
{
    events.into_iter().fold(None, apply_person)
}

/// Fold a family's event stream into its current row.
pub fn fold_family<'a, I>(events: I) -> Option<Family>
where
    I: IntoIterator<Item = &'a RecordedEvent>,
{
    events.into_iter().fold(None, apply_family)
}

/// Fold a source's event stream into its current row.
pub fn fold_source<'a, I>(events: I) -> Option<Source>
where
    I: IntoIterator<Item = &'a RecordedEvent>,
{
    events.into_iter().fold(None, apply_source)
}

/// Fold a citation's event stream into its current row.
pub fn fold_citation<'a, I>(events: I) -> Option<Citation>
where
    I: IntoIterator<Item = &'a RecordedEvent>,
{
    events.into_iter().fold(None, apply_citation)
}

/// Fold a media record's event stream into its current row.
pub fn fold_media<'a, I>(events: I) -> Option<Media>
where
    I: IntoIterator<Item = &'a RecordedEvent>,
{
    events.into_iter().fold(None, apply_media)
}

/// Fold a stream of any entity type into a JSON object of its row.
///
/// Feeds the snapshot diff engine, which compares rows field by field
/// without caring about the concrete entity struct.
pub fn fold_row<'a, I>(entity_type: EntityType, events: I) -> Option<serde_json::Value>
where
    I: IntoIterator<Item = &'a RecordedEvent>,
{
    let value = match entity_type {
        EntityType::Person => serde_json::to_value(fold_person(events)?),
        EntityType::Family => serde_json::to_value(fold_family(events)?),
        EntityType::Source => serde_json::to_value(fold_source(events)?),
        EntityType::Citation => serde_json::to_value(fold_citation(events)?),
        EntityType::Media => serde_json::to_value(fold_media(events)?),
    };
    value.ok()
}
