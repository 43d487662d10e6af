//! Citation commands.

use lineage_store::AppendBatch;
use lineage_types::{
    Citation, CitationEvent, CitationFilter, CitationId, CitationPatch, EntityType, EventPayload,
    NewCitation, Page,
};

use crate::error::CoreError;
use crate::service::Core;

/// Highest allowed evidence quality (0 = unreliable, 3 = primary).
const MAX_QUALITY: u8 = 3;

impl Core {
    /// Create a citation linking a person to a source. Both must exist
    /// and quality is capped at 3.
    pub fn create_citation(&self, input: NewCitation) -> Result<Citation, CoreError> {
        if input.quality > MAX_QUALITY {
            return Err(CoreError::validation(format!(
                "quality {} exceeds the maximum of {MAX_QUALITY}",
                input.quality
            )));
        }
        let person = self.get_person(input.person_id)?;
        let source = self.get_source(input.source_id)?;

        let id = CitationId::new();
        let label = format!("{}: {}", person.display_name(), source.title);
        let NewCitation {
            source_id,
            person_id,
            detail,
            quality,
            notes,
        } = input;
        self.commit(AppendBatch {
            entity_type: EntityType::Citation,
            aggregate_id: id.into_inner(),
            expected_version: 0,
            label,
            payloads: vec![EventPayload::Citation(CitationEvent::Created {
                source_id,
                person_id,
                detail,
                quality,
                notes,
            })],
        })?;
        self.projected_citation(id)
    }

    /// Fetch a citation row.
    pub fn get_citation(&self, id: CitationId) -> Result<Citation, CoreError> {
        self.read
            .get_citation(id)
            .ok_or_else(|| CoreError::not_found(EntityType::Citation, id))
    }

    /// List citations matching the filter, paginated.
    pub fn list_citations(
        &self,
        filter: &CitationFilter,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Page<Citation> {
        let (limit, offset) = self.limits.page_bounds(limit, offset);
        self.read.list_citations(filter, limit, offset)
    }

    /// Apply a patch to a citation. A new source must exist; ownership
    /// changes only through the merge engine.
    pub fn update_citation(
        &self,
        id: CitationId,
        expected_version: u64,
        patch: CitationPatch,
    ) -> Result<Citation, CoreError> {
        let citation = self.get_citation(id)?;
        if patch == CitationPatch::default() {
            return Err(CoreError::validation("update patch contains no changes"));
        }
        if let Some(quality) = patch.quality {
            if quality > MAX_QUALITY {
                return Err(CoreError::validation(format!(
                    "quality {quality} exceeds the maximum of {MAX_QUALITY}"
                )));
            }
        }
        if let Some(source_id) = patch.source_id {
            self.get_source(source_id)?;
        }

        let label = self.citation_label(&citation);
        self.commit(AppendBatch {
            entity_type: EntityType::Citation,
            aggregate_id: id.into_inner(),
            expected_version,
            label,
            payloads: vec![EventPayload::Citation(CitationEvent::Updated { patch })],
        })?;
        self.projected_citation(id)
    }

    /// Delete a citation.
    pub fn delete_citation(&self, id: CitationId, expected_version: u64) -> Result<(), CoreError> {
        let citation = self.get_citation(id)?;

        let label = self.citation_label(&citation);
        self.commit(AppendBatch {
            entity_type: EntityType::Citation,
            aggregate_id: id.into_inner(),
            expected_version,
            label,
            payloads: vec![EventPayload::Citation(CitationEvent::Deleted)],
        })?;
        Ok(())
    }

    /// Display label for a citation: owner and cited source.
    pub(crate) fn citation_label(&self, citation: &Citation) -> String {
        let person = self
            .read
            .get_person(citation.person_id)
            .map_or_else(|| citation.person_id.to_string(), |p| p.display_name());
        let source = self
            .read
            .get_source(citation.source_id)
            .map_or_else(|| citation.source_id.to_string(), |s| s.title);
        format!("{person}: {source}")
    }

    fn projected_citation(&self, id: CitationId) -> Result<Citation, CoreError> {
        self.read
            .get_citation(id)
            .ok_or_else(|| CoreError::Internal(format!("citation {id} missing after projection")))
    }
}
