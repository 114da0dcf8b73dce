//! Pagination state shared by list views and the table

use serde::{Deserialize, Serialize};

/// Page sizes offered by the page-size selector
pub const PAGE_SIZE_OPTIONS: [usize; 5] = [5, 10, 20, 50, 100];

/// Totals reported by a paginated list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_items: usize,
    pub total_pages: usize,
}

/// Position within a paginated collection
///
/// Invariants after construction: `current_page >= 1`, `items_per_page > 0`,
/// `total_pages >= 1`, and `current_page <= total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub current_page: usize,
    pub items_per_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl PaginationState {
    /// Fresh state before the first fetch
    pub fn new(items_per_page: usize) -> Self {
        Self {
            current_page: 1,
            items_per_page: items_per_page.max(1),
            total_pages: 1,
            total_items: 0,
        }
    }

    /// State for an in-memory collection of `total_items` rows
    pub fn for_items(total_items: usize, items_per_page: usize) -> Self {
        let items_per_page = items_per_page.max(1);
        Self {
            current_page: 1,
            items_per_page,
            total_pages: total_items.div_ceil(items_per_page).max(1),
            total_items,
        }
    }

    /// State after fetching `current_page` of a server-paginated collection
    pub fn from_meta(meta: PageMeta, current_page: usize, items_per_page: usize) -> Self {
        Self {
            current_page,
            ..Self::new(items_per_page)
        }
        .with_totals(meta.total_items, meta.total_pages)
    }

    /// Adopt server-reported totals, keeping the requested page in range
    pub fn with_totals(mut self, total_items: usize, total_pages: usize) -> Self {
        self.total_items = total_items;
        self.total_pages = total_pages.max(1);
        self.clamp()
    }

    /// Force `current_page` into `1..=total_pages`
    pub fn clamp(mut self) -> Self {
        self.total_pages = self.total_pages.max(1);
        self.items_per_page = self.items_per_page.max(1);
        self.current_page = self.current_page.clamp(1, self.total_pages);
        self
    }

    /// Move to `page`; returns false if the page is out of range or unchanged
    pub fn go_to(&mut self, page: usize) -> bool {
        if page == 0 || page > self.total_pages || page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    /// Change page size and return to the first page
    pub fn resize(&mut self, items_per_page: usize) {
        self.items_per_page = items_per_page.max(1);
        self.current_page = 1;
    }

    /// Zero-based index range of the current page within `total_items`
    pub fn window(&self) -> std::ops::Range<usize> {
        let start = (self.current_page - 1) * self.items_per_page;
        let end = (start + self.items_per_page).min(self.total_items);
        start.min(end)..end
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_items_page_count() {
        let state = PaginationState::for_items(12, 5);
        assert_eq!(state.total_pages, 3);
        assert_eq!(state.window(), 0..5);

        let empty = PaginationState::for_items(0, 5);
        assert_eq!(empty.total_pages, 1);
        assert_eq!(empty.window(), 0..0);
    }

    #[test]
    fn test_windows() {
        let mut state = PaginationState::for_items(12, 5);
        assert!(state.go_to(2));
        assert_eq!(state.window(), 5..10);
        assert!(state.go_to(3));
        assert_eq!(state.window(), 10..12);
        assert!(!state.go_to(4));
        assert!(!state.go_to(0));
        assert!(!state.go_to(3));
    }

    #[test]
    fn test_with_totals_clamps_current_page() {
        let mut state = PaginationState::new(10);
        state.current_page = 7;
        let state = state.with_totals(25, 3);
        assert_eq!(state.current_page, 3);
        assert_eq!(state.total_items, 25);

        let state = PaginationState::new(10).with_totals(0, 0);
        assert_eq!(state.total_pages, 1);
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn test_resize_resets_page() {
        let mut state = PaginationState::for_items(40, 10);
        state.go_to(3);
        state.resize(20);
        assert_eq!(state.current_page, 1);
        assert_eq!(state.items_per_page, 20);
    }

    #[test]
    fn test_from_meta() {
        let meta: PageMeta = serde_json::from_str(r#"{"totalItems": 42, "totalPages": 5}"#).unwrap();
        let state = PaginationState::from_meta(meta, 2, 10);
        assert_eq!(state.current_page, 2);
        assert_eq!(state.total_pages, 5);
        assert_eq!(state.total_items, 42);

        let past_end = PaginationState::from_meta(meta, 9, 10);
        assert_eq!(past_end.current_page, 5);
    }
}
