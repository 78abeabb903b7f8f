//! Pagination envelope for listing operations.

use serde::Serialize;

/// One page of a listing, with offset-based cursor metadata.
///
/// `has_more` is a heuristic: it is true exactly when the page came back
/// full, so a final page whose size equals the limit still reports
/// `has_more = true`. Callers must read it as "there may be more", never
/// as an exact boundary. Offset pages are also not stable under
/// concurrent inserts; a page can skip or repeat rows.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// The requested page size.
    pub limit: u64,
    /// The requested offset.
    pub offset: u64,
    /// Whether another page may exist.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Wrap a fetched page of items in the envelope.
    #[must_use]
    pub fn new(items: Vec<T>, limit: u64, offset: u64) -> Self {
        let has_more = !items.is_empty() && items.len() as u64 == limit;
        Self {
            items,
            limit,
            offset,
            has_more,
        }
    }

    /// Map the items of this page, keeping the envelope metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            limit: self.limit,
            offset: self.offset,
            has_more: self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_page_has_more() {
        let page = Page::new(vec![1, 2], 2, 0);
        assert!(page.has_more);
    }

    #[test]
    fn test_short_page_has_no_more() {
        let page = Page::new(vec![1], 2, 4);
        assert!(!page.has_more);
        assert_eq!(page.offset, 4);
    }

    #[test]
    fn test_empty_page_has_no_more() {
        let page: Page<i32> = Page::new(vec![], 0, 0);
        assert!(!page.has_more);
    }

    #[test]
    fn test_map_keeps_envelope() {
        let page = Page::new(vec![1, 2], 2, 6).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.limit, 2);
        assert_eq!(page.offset, 6);
        assert!(page.has_more);
    }
}
