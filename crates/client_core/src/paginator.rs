use serde::Serialize;
use shared::protocol::Pagination;

pub const DEFAULT_WINDOW_SIZE: u32 = 5;

/// Page numbers to show around `current_page`.
///
/// The run is contiguous, ascending and `min(window_size, total_pages)` long.
/// It is centred on `current_page` where possible and shifted left so it never
/// passes `total_pages`. An out-of-range `current_page` is clamped into
/// `1..=total_pages` first.
pub fn compute_window(current_page: u32, total_pages: u32, window_size: u32) -> Vec<u32> {
    if total_pages == 0 || window_size == 0 {
        return Vec::new();
    }

    let current = current_page.clamp(1, total_pages);
    let mut start = current.saturating_sub(window_size / 2).max(1);
    if start.saturating_add(window_size - 1) > total_pages {
        start = total_pages
            .saturating_sub(window_size)
            .saturating_add(1)
            .max(1);
    }
    let end = start.saturating_add(window_size - 1).min(total_pages);

    (start..=end).collect()
}

/// Pagination position of a loaded list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageState {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_items: 0,
        }
    }
}

impl PageState {
    /// Builds the state for a completed fetch of `requested_page`.
    ///
    /// The requested page wins over whatever the server echoes back, and is
    /// clamped so `current_page <= total_pages` always holds.
    pub fn from_response(requested_page: u32, pagination: Option<Pagination>) -> Self {
        let pagination = pagination.unwrap_or_default();
        let total_pages = pagination.total_pages.max(1);
        Self {
            current_page: requested_page.clamp(1, total_pages),
            total_pages,
            total_items: pagination.total_items,
        }
    }

    pub fn contains(&self, page: u32) -> bool {
        (1..=self.total_pages).contains(&page)
    }

    pub fn window(&self, window_size: u32) -> Vec<u32> {
        compute_window(self.current_page, self.total_pages, window_size)
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn previous(&self) -> Option<u32> {
        self.has_previous().then(|| self.current_page - 1)
    }

    pub fn next(&self) -> Option<u32> {
        self.has_next().then(|| self.current_page + 1)
    }
}

#[cfg(test)]
#[path = "tests/paginator_tests.rs"]
mod tests;
