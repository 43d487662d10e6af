//! Offset-based pagination envelope for list and history queries.

use serde::{Deserialize, Serialize};

/// One page of a larger result set, with total-count metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items on this page, already ordered.
    pub items: Vec<T>,
    /// Total number of matching items across all pages.
    pub total: usize,
    /// The limit this page was computed with.
    pub limit: usize,
    /// The offset this page was computed with.
    pub offset: usize,
    /// Whether more items exist past this page.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Build a page by slicing an already-ordered, already-filtered vector.
    pub fn slice(all: Vec<T>, limit: usize, offset: usize) -> Self {
        let total = all.len();
        let items: Vec<T> = all.into_iter().skip(offset).take(limit).collect();
        let has_more = offset.saturating_add(items.len()) < total;

        Self {
            items,
            total,
            limit,
            offset,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_reports_totals_and_has_more() {
        let page = Page::slice((0..10).collect::<Vec<u32>>(), 3, 0);
        assert_eq!(page.items, vec![0, 1, 2]);
        assert_eq!(page.total, 10);
        assert!(page.has_more);
    }

    #[test]
    fn last_page_has_no_more() {
        let page = Page::slice((0..10).collect::<Vec<u32>>(), 5, 5);
        assert_eq!(page.items, vec![5, 6, 7, 8, 9]);
        assert!(!page.has_more);
    }

    #[test]
    fn offset_past_end_is_empty() {
        let page = Page::slice(vec![1, 2, 3], 10, 50);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert!(!page.has_more);
    }
}
