//! Named snapshots and the diff engine that compares them.
//!
//! A snapshot is a bookmark into the global event ordering; comparing
//! two snapshots replays the events strictly after the earlier position
//! and up to the later one, then reduces everything that happened to
//! each aggregate into a single change entry with per-field diffs.

use std::collections::BTreeSet;
use std::collections::HashMap;

use lineage_types::{
    ChangeAction, ChangeEntry, EntityType, FieldDiff, RecordedEvent, Snapshot, SnapshotComparison,
    SnapshotId,
};
use serde_json::Value;
use uuid::Uuid;

use crate::error::CoreError;
use crate::service::Core;
use crate::state;

/// Treat JSON `null` the same as an absent field when diffing rows.
fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|value| !value.is_null()).cloned()
}

/// Field-by-field diff of two serialized rows. Identity and version are
/// bookkeeping, not content, and never appear in a diff.
fn diff_fields(before: &Value, after: &Value) -> Vec<FieldDiff> {
    let (Some(before), Some(after)) = (before.as_object(), after.as_object()) else {
        return Vec::new();
    };

    let fields: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    let mut diffs = Vec::new();
    for field in fields {
        if field == "id" || field == "version" {
            continue;
        }
        let old = non_null(before.get(field));
        let new = non_null(after.get(field));
        if old != new {
            diffs.push(FieldDiff {
                field: field.clone(),
                before: old,
                after: new,
            });
        }
    }
    diffs
}

impl Core {
    /// Create a named snapshot at the current global position.
    pub fn create_snapshot(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Snapshot, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::validation("snapshot name must not be empty"));
        }
        if name.chars().count() > self.limits.snapshot_name_max {
            return Err(CoreError::validation(format!(
                "snapshot name exceeds {} characters",
                self.limits.snapshot_name_max
            )));
        }
        if let Some(description) = description {
            if description.chars().count() > self.limits.snapshot_description_max {
                return Err(CoreError::validation(format!(
                    "snapshot description exceeds {} characters",
                    self.limits.snapshot_description_max
                )));
            }
        }

        Ok(self.snapshots.create(
            name.to_owned(),
            description.map(str::to_owned),
            self.events.current_position(),
        ))
    }

    /// All snapshots, newest first.
    pub fn list_snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.list()
    }

    /// Fetch a snapshot.
    pub fn get_snapshot(&self, id: SnapshotId) -> Result<Snapshot, CoreError> {
        self.snapshots.get(id).ok_or_else(|| CoreError::NotFound {
            kind: "snapshot".to_owned(),
            id: id.to_string(),
        })
    }

    /// Delete a snapshot. Events are never touched.
    pub fn delete_snapshot(&self, id: SnapshotId) -> Result<(), CoreError> {
        self.snapshots.delete(id)?;
        Ok(())
    }

    /// Compare two snapshots, reducing every aggregate that changed
    /// between them to one entry.
    ///
    /// Entries are ordered by the global position of each aggregate's
    /// first change in the range and paginated; `older_first` reports
    /// whether the first argument was the chronologically earlier one.
    pub fn compare_snapshots(
        &self,
        first: SnapshotId,
        second: SnapshotId,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<SnapshotComparison, CoreError> {
        let a = self.get_snapshot(first)?;
        let b = self.get_snapshot(second)?;
        let older_first = a.position <= b.position;
        let (min, max) = if older_first {
            (a.position, b.position)
        } else {
            (b.position, a.position)
        };

        let range = self.events.load_range(min, max);

        // Group the range per aggregate, preserving first-change order.
        let mut order: Vec<(EntityType, Uuid)> = Vec::new();
        let mut groups: HashMap<(EntityType, Uuid), Vec<&RecordedEvent>> = HashMap::new();
        for event in &range {
            let key = (event.entity_type, event.aggregate_id);
            if !groups.contains_key(&key) {
                order.push(key);
            }
            groups.entry(key).or_default().push(event);
        }

        let mut entries = Vec::new();
        for key in order {
            let Some(changes) = groups.get(&key) else {
                continue;
            };
            let Some(last) = changes.last() else {
                continue;
            };

            let (entity_type, entity_id) = key;
            let stream = self.events.load(entity_type, entity_id)?;
            let before = state::fold_row(
                entity_type,
                stream.iter().filter(|event| event.global_position <= min),
            );
            let after = state::fold_row(
                entity_type,
                stream.iter().filter(|event| event.global_position <= max),
            );

            let (action, field_diffs) = match (&before, &after) {
                (None, Some(_)) => (ChangeAction::Created, Vec::new()),
                (Some(before), Some(after)) => (ChangeAction::Updated, diff_fields(before, after)),
                // Deleted in range, including created-and-deleted
                // entirely inside it.
                (Some(_) | None, None) => (ChangeAction::Deleted, Vec::new()),
            };

            entries.push(ChangeEntry {
                entity_type,
                entity_id,
                entity_name: last.label.clone(),
                action,
                timestamp: last.recorded_at,
                field_diffs,
            });
        }

        let (limit, offset) = self.limits.page_bounds(limit, offset);
        let total_count = entries.len();
        let page: Vec<ChangeEntry> = entries.into_iter().skip(offset).take(limit).collect();
        let has_more = offset.saturating_add(page.len()) < total_count;

        Ok(SnapshotComparison {
            entries: page,
            total_count,
            has_more,
            older_first,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_skips_id_and_version_and_null_noise() {
        let before = serde_json::json!({
            "id": "a", "version": 1, "title": "Old", "notes": null
        });
        let after = serde_json::json!({
            "id": "a", "version": 2, "title": "New", "notes": null
        });

        let diffs = diff_fields(&before, &after);
        assert_eq!(diffs.len(), 1);
        assert_eq!(
            diffs.first().map(|d| d.field.clone()),
            Some("title".to_owned())
        );
    }

    #[test]
    fn cleared_field_diffs_to_absent_after() {
        let before = serde_json::json!({"notes": "kept"});
        let after = serde_json::json!({"notes": null});

        let diffs = diff_fields(&before, &after);
        assert_eq!(
            diffs.first().map(|d| (d.before.clone(), d.after.clone())),
            Some((Some(serde_json::json!("kept")), None))
        );
    }
}
