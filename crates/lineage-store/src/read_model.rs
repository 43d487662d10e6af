//! Materialized current-state projections of every aggregate.
//!
//! Rows here are query-optimized copies of aggregate state, keyed by
//! typed ID and carrying the same `version` as the aggregate's event
//! stream. The projector in `lineage-core` keeps them in lockstep with
//! event commits (synchronous projection -- no eventual-consistency
//! window), and can rebuild all tables from scratch by replaying the
//! event log from position 0.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use lineage_types::{
    Citation, CitationFilter, CitationId, Family, FamilyFilter, FamilyId, Media, MediaFilter,
    MediaId, Page, Person, PersonFilter, PersonId, Source, SourceFilter, SourceId,
};

/// Case-insensitive substring match helper for filter criteria.
fn matches_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// All read-model tables, guarded by one lock.
#[derive(Debug, Default)]
struct Tables {
    persons: BTreeMap<PersonId, Person>,
    families: BTreeMap<FamilyId, Family>,
    sources: BTreeMap<SourceId, Source>,
    citations: BTreeMap<CitationId, Citation>,
    media: BTreeMap<MediaId, Media>,
}

/// The in-memory read model store.
///
/// Rows are inserted, replaced, and removed by the projector only;
/// command handlers read them to validate preconditions and to return
/// up-to-date entities to callers.
#[derive(Debug, Default)]
pub struct ReadModelStore {
    inner: RwLock<Tables>,
}

impl ReadModelStore {
    /// Create a new empty read model store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every row from every table. Used before a full rebuild.
    pub fn clear(&self) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *tables = Tables::default();
    }

    // -------------------------------------------------------------------
    // Persons
    // -------------------------------------------------------------------

    /// Fetch a person row by ID.
    pub fn get_person(&self, id: PersonId) -> Option<Person> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tables.persons.get(&id).cloned()
    }

    /// Insert or replace a person row.
    pub fn put_person(&self, person: Person) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tables.persons.insert(person.id, person);
    }

    /// Remove a person row (e.g. after deletion or merge). The
    /// aggregate's events remain in the event store.
    pub fn remove_person(&self, id: PersonId) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tables.persons.remove(&id);
    }

    /// List persons matching the filter, ordered by ID (creation order
    /// for UUID v7), with total count.
    pub fn list_persons(&self, filter: &PersonFilter, limit: usize, offset: usize) -> Page<Person> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let matching: Vec<Person> = tables
            .persons
            .values()
            .filter(|person| {
                let surname_ok = filter.surname.as_deref().is_none_or(|wanted| {
                    person
                        .names
                        .iter()
                        .any(|name| matches_ci(&name.surname, wanted))
                });
                let given_ok = filter.given.as_deref().is_none_or(|wanted| {
                    person
                        .names
                        .iter()
                        .any(|name| matches_ci(&name.given, wanted))
                });
                let place_ok = filter.place.as_deref().is_none_or(|wanted| {
                    person
                        .birth_place
                        .as_deref()
                        .is_some_and(|place| matches_ci(place, wanted))
                        || person
                            .death_place
                            .as_deref()
                            .is_some_and(|place| matches_ci(place, wanted))
                });
                surname_ok && given_ok && place_ok
            })
            .cloned()
            .collect();

        Page::slice(matching, limit, offset)
    }

    // -------------------------------------------------------------------
    // Families
    // -------------------------------------------------------------------

    /// Fetch a family row by ID.
    pub fn get_family(&self, id: FamilyId) -> Option<Family> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tables.families.get(&id).cloned()
    }

    /// Insert or replace a family row.
    pub fn put_family(&self, family: Family) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tables.families.insert(family.id, family);
    }

    /// Remove a family row.
    pub fn remove_family(&self, id: FamilyId) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tables.families.remove(&id);
    }

    /// List families matching the filter, ordered by ID.
    pub fn list_families(&self, filter: &FamilyFilter, limit: usize, offset: usize) -> Page<Family> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let matching: Vec<Family> = tables
            .families
            .values()
            .filter(|family| {
                let member_ok = filter.member.is_none_or(|person| family.has_member(person));
                let place_ok = filter.place.as_deref().is_none_or(|wanted| {
                    family
                        .marriage_place
                        .as_deref()
                        .is_some_and(|place| matches_ci(place, wanted))
                });
                member_ok && place_ok
            })
            .cloned()
            .collect();

        Page::slice(matching, limit, offset)
    }

    /// Every family in which the given person appears as partner or
    /// child. Consumed by the merge engine and deletion preconditions.
    pub fn families_of(&self, person: PersonId) -> Vec<Family> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .families
            .values()
            .filter(|family| family.has_member(person))
            .cloned()
            .collect()
    }

    // -------------------------------------------------------------------
    // Sources
    // -------------------------------------------------------------------

    /// Fetch a source row by ID.
    pub fn get_source(&self, id: SourceId) -> Option<Source> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tables.sources.get(&id).cloned()
    }

    /// Insert or replace a source row.
    pub fn put_source(&self, source: Source) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tables.sources.insert(source.id, source);
    }

    /// Remove a source row.
    pub fn remove_source(&self, id: SourceId) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tables.sources.remove(&id);
    }

    /// List sources matching the filter, ordered by ID.
    pub fn list_sources(&self, filter: &SourceFilter, limit: usize, offset: usize) -> Page<Source> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let matching: Vec<Source> = tables
            .sources
            .values()
            .filter(|source| {
                let title_ok = filter
                    .title
                    .as_deref()
                    .is_none_or(|wanted| matches_ci(&source.title, wanted));
                let author_ok = filter.author.as_deref().is_none_or(|wanted| {
                    source
                        .author
                        .as_deref()
                        .is_some_and(|author| matches_ci(author, wanted))
                });
                title_ok && author_ok
            })
            .cloned()
            .collect();

        Page::slice(matching, limit, offset)
    }

    // -------------------------------------------------------------------
    // Citations
    // -------------------------------------------------------------------

    /// Fetch a citation row by ID.
    pub fn get_citation(&self, id: CitationId) -> Option<Citation> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tables.citations.get(&id).cloned()
    }

    /// Insert or replace a citation row.
    pub fn put_citation(&self, citation: Citation) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tables.citations.insert(citation.id, citation);
    }

    /// Remove a citation row.
    pub fn remove_citation(&self, id: CitationId) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tables.citations.remove(&id);
    }

    /// List citations matching the filter, ordered by ID.
    pub fn list_citations(
        &self,
        filter: &CitationFilter,
        limit: usize,
        offset: usize,
    ) -> Page<Citation> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let matching: Vec<Citation> = tables
            .citations
            .values()
            .filter(|citation| {
                filter.source_id.is_none_or(|source| citation.source_id == source)
                    && filter.person_id.is_none_or(|person| citation.person_id == person)
            })
            .cloned()
            .collect();

        Page::slice(matching, limit, offset)
    }

    /// Every citation owned by the given person. Consumed by the merge
    /// engine when transferring evidence to the survivor.
    pub fn citations_owned_by(&self, person: PersonId) -> Vec<Citation> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .citations
            .values()
            .filter(|citation| citation.person_id == person)
            .cloned()
            .collect()
    }

    /// Every citation of the given source. Consumed by the
    /// delete-source precondition.
    pub fn citations_for_source(&self, source: SourceId) -> Vec<Citation> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .citations
            .values()
            .filter(|citation| citation.source_id == source)
            .cloned()
            .collect()
    }

    // -------------------------------------------------------------------
    // Media
    // -------------------------------------------------------------------

    /// Fetch a media row by ID.
    pub fn get_media(&self, id: MediaId) -> Option<Media> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tables.media.get(&id).cloned()
    }

    /// Insert or replace a media row.
    pub fn put_media(&self, media: Media) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tables.media.insert(media.id, media);
    }

    /// Remove a media row.
    pub fn remove_media(&self, id: MediaId) {
        let mut tables = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        tables.media.remove(&id);
    }

    /// List media records matching the filter, ordered by ID.
    pub fn list_media(&self, filter: &MediaFilter, limit: usize, offset: usize) -> Page<Media> {
        let tables = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let matching: Vec<Media> = tables
            .media
            .values()
            .filter(|media| {
                let link_ok = filter.linked_to.is_none_or(|wanted| {
                    media.links.iter().any(|link| {
                        link.entity_type == wanted.entity_type
                            && link.entity_id == wanted.entity_id
                    })
                });
                let mime_ok = filter
                    .mime_prefix
                    .as_deref()
                    .is_none_or(|prefix| media.mime_type.starts_with(prefix));
                link_ok && mime_ok
            })
            .cloned()
            .collect();

        Page::slice(matching, limit, offset)
    }
}
