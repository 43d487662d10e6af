//! Media commands. Binary content lives outside the core; only the
//! descriptive record and its entity links are managed here.

use lineage_store::AppendBatch;
use lineage_types::{
    EntityType, EventPayload, Media, MediaEvent, MediaFilter, MediaId, MediaLink, MediaPatch,
    NewMedia, Page,
};

use super::require_non_empty;
use crate::error::CoreError;
use crate::service::Core;

impl Core {
    /// Create a media record. File name and MIME type are required and
    /// every link target must exist.
    pub fn create_media(&self, input: NewMedia) -> Result<Media, CoreError> {
        require_non_empty("file_name", &input.file_name)?;
        require_non_empty("mime_type", &input.mime_type)?;
        self.check_links(&input.links)?;

        let id = MediaId::new();
        let label = input
            .title
            .clone()
            .unwrap_or_else(|| input.file_name.clone());
        let NewMedia {
            file_name,
            mime_type,
            title,
            description,
            links,
        } = input;
        self.commit(AppendBatch {
            entity_type: EntityType::Media,
            aggregate_id: id.into_inner(),
            expected_version: 0,
            label,
            payloads: vec![EventPayload::Media(MediaEvent::Created {
                file_name,
                mime_type,
                title,
                description,
                links,
            })],
        })?;
        self.projected_media(id)
    }

    /// Fetch a media row.
    pub fn get_media(&self, id: MediaId) -> Result<Media, CoreError> {
        self.read
            .get_media(id)
            .ok_or_else(|| CoreError::not_found(EntityType::Media, id))
    }

    /// List media records matching the filter, paginated.
    pub fn list_media(
        &self,
        filter: &MediaFilter,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Page<Media> {
        let (limit, offset) = self.limits.page_bounds(limit, offset);
        self.read.list_media(filter, limit, offset)
    }

    /// Apply a patch to a media record. A replacement link list must
    /// reference existing entities only.
    pub fn update_media(
        &self,
        id: MediaId,
        expected_version: u64,
        patch: MediaPatch,
    ) -> Result<Media, CoreError> {
        let media = self.get_media(id)?;
        if patch == MediaPatch::default() {
            return Err(CoreError::validation("update patch contains no changes"));
        }
        if let Some(file_name) = &patch.file_name {
            require_non_empty("file_name", file_name)?;
        }
        if let Some(mime_type) = &patch.mime_type {
            require_non_empty("mime_type", mime_type)?;
        }
        if let Some(links) = &patch.links {
            self.check_links(links)?;
        }

        self.commit(AppendBatch {
            entity_type: EntityType::Media,
            aggregate_id: id.into_inner(),
            expected_version,
            label: media.display_name(),
            payloads: vec![EventPayload::Media(MediaEvent::Updated { patch })],
        })?;
        self.projected_media(id)
    }

    /// Delete a media record.
    pub fn delete_media(&self, id: MediaId, expected_version: u64) -> Result<(), CoreError> {
        let media = self.get_media(id)?;

        self.commit(AppendBatch {
            entity_type: EntityType::Media,
            aggregate_id: id.into_inner(),
            expected_version,
            label: media.display_name(),
            payloads: vec![EventPayload::Media(MediaEvent::Deleted)],
        })?;
        Ok(())
    }

    /// Every media link must point at an entity that currently exists.
    fn check_links(&self, links: &[MediaLink]) -> Result<(), CoreError> {
        for link in links {
            if !self.entity_exists(link.entity_type, link.entity_id) {
                return Err(CoreError::not_found(link.entity_type, link.entity_id));
            }
        }
        Ok(())
    }

    fn projected_media(&self, id: MediaId) -> Result<Media, CoreError> {
        self.read
            .get_media(id)
            .ok_or_else(|| CoreError::Internal(format!("media {id} missing after projection")))
    }
}
