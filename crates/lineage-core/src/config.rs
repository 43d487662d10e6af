//! Tunable limits for the command layer.

use serde::Deserialize;

/// Every tunable bound in one place. Deserializable so an embedding
/// application can override individual fields from its own config file;
/// absent fields keep their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of items in one batch merge / batch dismiss call.
    pub max_batch: usize,
    /// Maximum length of a snapshot name, in characters.
    pub snapshot_name_max: usize,
    /// Maximum length of a snapshot description, in characters.
    pub snapshot_description_max: usize,
    /// Page size used when the caller does not supply a limit.
    pub default_page_size: usize,
    /// Hard cap on any requested page size.
    pub max_page_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_batch: 100,
            snapshot_name_max: 120,
            snapshot_description_max: 500,
            default_page_size: 50,
            max_page_size: 200,
        }
    }
}

impl Limits {
    /// Resolve caller-supplied pagination into effective `(limit, offset)`.
    ///
    /// A missing limit uses the default page size; any limit is clamped
    /// to `1..=max_page_size`. A missing offset is 0.
    pub fn page_bounds(&self, limit: Option<usize>, offset: Option<usize>) -> (usize, usize) {
        let limit = limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);
        (limit, offset.unwrap_or(0))
    }
}
