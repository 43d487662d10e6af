//! Change-history feeds over the event log.
//!
//! Entries carry the display name stamped on each event at commit time,
//! so rendering a feed never requires re-folding aggregate state.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use lineage_types::{EntityType, HistoryEntry, Page, RecordedEvent};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::CoreError;
use crate::service::Core;

/// Filter criteria for the global history feed. All fields optional;
/// raw strings are validated, not silently ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryQuery {
    /// Only events of this entity type (stable lowercase name).
    #[serde(default)]
    pub entity_type: Option<String>,
    /// Only events at or after this RFC 3339 timestamp.
    #[serde(default)]
    pub from: Option<String>,
    /// Only events at or before this RFC 3339 timestamp.
    #[serde(default)]
    pub to: Option<String>,
}

fn parse_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, CoreError> {
    raw.map(|value| {
        DateTime::parse_from_rfc3339(value)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|err| {
                CoreError::validation(format!("invalid RFC 3339 timestamp {value:?}: {err}"))
            })
    })
    .transpose()
}

fn to_entry(event: &RecordedEvent) -> HistoryEntry {
    HistoryEntry {
        position: event.global_position,
        timestamp: event.recorded_at,
        entity_type: event.entity_type,
        entity_id: event.aggregate_id,
        entity_name: event.label.clone(),
        action: event.action(),
    }
}

impl Core {
    /// The global change feed, newest first by global position.
    pub fn global_history(
        &self,
        query: &HistoryQuery,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Page<HistoryEntry>, CoreError> {
        let entity_type = query
            .entity_type
            .as_deref()
            .map(EntityType::from_str)
            .transpose()
            .map_err(|err| CoreError::validation(err.to_string()))?;
        let from = parse_timestamp(query.from.as_deref())?;
        let to = parse_timestamp(query.to.as_deref())?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(CoreError::validation("history range starts after it ends"));
            }
        }

        let (limit, offset) = self.limits.page_bounds(limit, offset);
        let mut matching: Vec<HistoryEntry> = self
            .events
            .replay_all()
            .iter()
            .filter(|event| {
                entity_type.is_none_or(|wanted| event.entity_type == wanted)
                    && from.is_none_or(|from| event.recorded_at >= from)
                    && to.is_none_or(|to| event.recorded_at <= to)
            })
            .map(to_entry)
            .collect();
        matching.reverse();

        Ok(Page::slice(matching, limit, offset))
    }

    /// One aggregate's change feed, newest first.
    ///
    /// The ID arrives as a raw string: a malformed UUID is the caller's
    /// mistake (`Validation`), a well-formed but never-observed one is
    /// `NotFound`.
    pub fn entity_history(
        &self,
        entity_type: EntityType,
        raw_id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Page<HistoryEntry>, CoreError> {
        let id = Uuid::parse_str(raw_id)
            .map_err(|err| CoreError::validation(format!("malformed id {raw_id:?}: {err}")))?;

        let (limit, offset) = self.limits.page_bounds(limit, offset);
        let mut entries: Vec<HistoryEntry> =
            self.events.load(entity_type, id)?.iter().map(to_entry).collect();
        entries.reverse();

        Ok(Page::slice(entries, limit, offset))
    }
}
