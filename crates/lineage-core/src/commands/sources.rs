//! Source commands.

use lineage_store::AppendBatch;
use lineage_types::{
    EntityType, EventPayload, NewSource, Page, Source, SourceEvent, SourceFilter, SourceId,
    SourcePatch,
};

use super::require_non_empty;
use crate::error::CoreError;
use crate::service::Core;

impl Core {
    /// Create a source. The title is required.
    pub fn create_source(&self, input: NewSource) -> Result<Source, CoreError> {
        require_non_empty("title", &input.title)?;

        let id = SourceId::new();
        let NewSource {
            title,
            author,
            publication,
            repository,
            notes,
        } = input;
        self.commit(AppendBatch {
            entity_type: EntityType::Source,
            aggregate_id: id.into_inner(),
            expected_version: 0,
            label: title.clone(),
            payloads: vec![EventPayload::Source(SourceEvent::Created {
                title,
                author,
                publication,
                repository,
                notes,
            })],
        })?;
        self.projected_source(id)
    }

    /// Fetch a source row.
    pub fn get_source(&self, id: SourceId) -> Result<Source, CoreError> {
        self.read
            .get_source(id)
            .ok_or_else(|| CoreError::not_found(EntityType::Source, id))
    }

    /// List sources matching the filter, paginated.
    pub fn list_sources(
        &self,
        filter: &SourceFilter,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Page<Source> {
        let (limit, offset) = self.limits.page_bounds(limit, offset);
        self.read.list_sources(filter, limit, offset)
    }

    /// Apply a patch to a source. The title can be replaced but never
    /// cleared.
    pub fn update_source(
        &self,
        id: SourceId,
        expected_version: u64,
        patch: SourcePatch,
    ) -> Result<Source, CoreError> {
        let source = self.get_source(id)?;
        if patch == SourcePatch::default() {
            return Err(CoreError::validation("update patch contains no changes"));
        }
        if let Some(title) = &patch.title {
            require_non_empty("title", title)?;
        }

        let label = patch.title.clone().unwrap_or(source.title);
        self.commit(AppendBatch {
            entity_type: EntityType::Source,
            aggregate_id: id.into_inner(),
            expected_version,
            label,
            payloads: vec![EventPayload::Source(SourceEvent::Updated { patch })],
        })?;
        self.projected_source(id)
    }

    /// Delete a source. Blocked (`ConflictState`) while citations still
    /// reference it.
    pub fn delete_source(&self, id: SourceId, expected_version: u64) -> Result<(), CoreError> {
        let source = self.get_source(id)?;
        let citations = self.read.citations_for_source(id);
        if !citations.is_empty() {
            return Err(CoreError::conflict(format!(
                "source is still referenced by {} citation(s)",
                citations.len()
            )));
        }

        self.commit(AppendBatch {
            entity_type: EntityType::Source,
            aggregate_id: id.into_inner(),
            expected_version,
            label: source.title,
            payloads: vec![EventPayload::Source(SourceEvent::Deleted)],
        })?;
        Ok(())
    }

    fn projected_source(&self, id: SourceId) -> Result<Source, CoreError> {
        self.read
            .get_source(id)
            .ok_or_else(|| CoreError::Internal(format!("source {id} missing after projection")))
    }
}
