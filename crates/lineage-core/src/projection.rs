//! Synchronous read-model projection.
//!
//! Committed events are folded into the read model inside the same
//! command call that produced them; callers never observe a window in
//! which the log and the tables disagree. The same code path serves
//! full rebuilds, which replay the log from position 0 into cleared
//! tables.

use lineage_store::{EventStore, ReadModelStore};
use lineage_types::{CitationId, EntityType, FamilyId, MediaId, PersonId, RecordedEvent, SourceId};

use crate::state;

/// Project committed events into the read model, in order.
pub fn project(read: &ReadModelStore, events: &[RecordedEvent]) {
    for event in events {
        match event.entity_type {
            EntityType::Person => {
                let id = PersonId::from(event.aggregate_id);
                match state::apply_person(read.get_person(id), event) {
                    Some(row) => read.put_person(row),
                    None => read.remove_person(id),
                }
            }
            EntityType::Family => {
                let id = FamilyId::from(event.aggregate_id);
                match state::apply_family(read.get_family(id), event) {
                    Some(row) => read.put_family(row),
                    None => read.remove_family(id),
                }
            }
            EntityType::Source => {
                let id = SourceId::from(event.aggregate_id);
                match state::apply_source(read.get_source(id), event) {
                    Some(row) => read.put_source(row),
                    None => read.remove_source(id),
                }
            }
            EntityType::Citation => {
                let id = CitationId::from(event.aggregate_id);
                match state::apply_citation(read.get_citation(id), event) {
                    Some(row) => read.put_citation(row),
                    None => read.remove_citation(id),
                }
            }
            EntityType::Media => {
                let id = MediaId::from(event.aggregate_id);
                match state::apply_media(read.get_media(id), event) {
                    Some(row) => read.put_media(row),
                    None => read.remove_media(id),
                }
            }
        }
    }
}

/// Clear every table and replay the whole log from position 0.
pub fn rebuild(events: &EventStore, read: &ReadModelStore) {
    read.clear();
    let log = events.replay_all();
    project(read, &log);
    tracing::info!(events = log.len(), "rebuilt read model from the event log");
}
