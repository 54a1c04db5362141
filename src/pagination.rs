//! Page-number pagination over ordered result sequences
//!
//! Pages are numbered from 1. The page size is clamped into
//! `[1, max_page_size]` and a page past the end is simply empty.

use serde::Serialize;

/// One page of an ordered sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Length of the whole sequence
    pub total_count: usize,
    /// Page number actually served (0 is served as 1)
    pub page: usize,
    /// Page size after clamping
    pub page_size: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Number of non-empty pages
    pub fn num_pages(&self) -> usize {
        self.total_count.div_ceil(self.page_size)
    }

    /// Page number to link as "next", if any
    pub fn next_page(&self) -> Option<usize> {
        self.has_next.then(|| self.page + 1)
    }

    /// Page number to link as "previous", if any
    ///
    /// From past the end this points back at the last non-empty page.
    pub fn previous_page(&self) -> Option<usize> {
        self.has_previous.then(|| (self.page - 1).min(self.num_pages()))
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// Cut page `page_number` of `page_size` items out of `sequence`
///
/// The sequence is traversed exactly once: items before the page are
/// skipped, items after it are only counted.
pub fn paginate<I>(
    sequence: I,
    page_number: usize,
    page_size: usize,
    max_page_size: usize,
) -> Page<I::Item>
where
    I: IntoIterator,
{
    let page_size = page_size.clamp(1, max_page_size.max(1));
    let page = page_number.max(1);
    let start = (page - 1).saturating_mul(page_size);
    let end = start.saturating_add(page_size);

    let mut items = Vec::with_capacity(page_size.min(64));
    let mut total_count = 0;
    for item in sequence {
        if total_count >= start && total_count < end {
            items.push(item);
        }
        total_count += 1;
    }

    Page {
        items,
        total_count,
        page,
        page_size,
        has_next: end < total_count,
        has_previous: page > 1 && total_count > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_first_middle_last_pages() {
        let first = paginate(1..=10, 1, 4, 200);
        assert_eq!(first.items, vec![1, 2, 3, 4]);
        assert_eq!(first.total_count, 10);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let middle = paginate(1..=10, 2, 4, 200);
        assert_eq!(middle.items, vec![5, 6, 7, 8]);
        assert!(middle.has_next && middle.has_previous);

        let last = paginate(1..=10, 3, 4, 200);
        assert_eq!(last.items, vec![9, 10]);
        assert!(!last.has_next);
        assert!(last.has_previous);
        assert_eq!(last.num_pages(), 3);
    }

    #[test]
    fn test_exact_multiple_has_no_next() {
        let page = paginate(1..=8, 2, 4, 200);
        assert_eq!(page.items, vec![5, 6, 7, 8]);
        assert!(!page.has_next);
    }

    #[test]
    fn test_page_size_is_clamped() {
        let page = paginate(1..=500, 1, 1000, 200);
        assert_eq!(page.page_size, 200);
        assert_eq!(page.items.len(), 200);

        let page = paginate(1..=5, 2, 0, 200);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.items, vec![2]);
    }

    #[test]
    fn test_page_zero_is_first_page() {
        let page = paginate(1..=3, 0, 2, 200);
        assert_eq!(page.page, 1);
        assert_eq!(page.items, vec![1, 2]);
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let page = paginate(1..=10, 7, 4, 200);
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 10);
        assert!(!page.has_next);
        assert!(page.has_previous);
        assert_eq!(page.previous_page(), Some(3));
        assert_eq!(page.next_page(), None);

        let huge = paginate(1..=10, usize::MAX, 4, 200);
        assert!(huge.items.is_empty());
        assert!(!huge.has_next);
    }

    #[test]
    fn test_empty_sequence() {
        let page = paginate(Vec::<u64>::new(), 1, 50, 200);
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 0);
        assert!(!page.has_next && !page.has_previous);

        let page = paginate(Vec::<u64>::new(), 3, 50, 200);
        assert!(!page.has_previous);
    }

    #[test]
    fn test_single_traversal() {
        let pulled = Cell::new(0usize);
        let sequence = (1..=25).inspect(|_| pulled.set(pulled.get() + 1));

        let page = paginate(sequence, 2, 10, 200);
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(pulled.get(), 25);
    }

    #[test]
    fn test_concatenated_pages_reproduce_sequence() {
        let sequence: Vec<u64> = (1..=137).map(|i| i * 3).collect();

        for page_size in [1, 7, 50, 137, 200] {
            let mut collected = Vec::new();
            let mut page_number = 1;
            loop {
                let page = paginate(sequence.iter().copied(), page_number, page_size, 200);
                collected.extend(page.items);
                if !page.has_next {
                    break;
                }
                page_number += 1;
            }
            assert_eq!(collected, sequence, "page size {}", page_size);
        }
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = paginate(1..=5, 2, 2, 200).map(|i| i.to_string());
        assert_eq!(page.items, vec!["3".to_string(), "4".to_string()]);
        assert_eq!(page.total_count, 5);
        assert!(page.has_next && page.has_previous);
    }
}
