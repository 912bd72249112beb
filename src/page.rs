use serde::Serialize;

use crate::error::{Result, StoreError};

/// Pagination envelope returned by enumeration and search. Derived
/// fields are always recomputed from `(total_items, page_number,
/// page_size)`; callers never set them directly.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub page_number: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page: Option<u64>,
    pub previous_page: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: u64, page_number: u64, page_size: u64) -> Page<T> {
        let total_pages = if total_items > 0 {
            total_items.div_ceil(page_size)
        } else {
            0
        };
        let has_next = page_number < total_pages;
        let has_previous = page_number > 1;
        Page {
            items,
            total_items,
            page_number,
            page_size,
            total_pages,
            has_next,
            has_previous,
            next_page: has_next.then(|| page_number + 1),
            previous_page: has_previous.then(|| page_number - 1),
        }
    }
}

/// Slices one page out of a fully materialized, already ordered list.
/// `page_number > total_pages` is an error whenever the list is
/// non-empty.
pub(crate) fn paginate<T>(all: Vec<T>, page_number: u64, page_size: u64) -> Result<Page<T>> {
    let total_items = all.len() as u64;
    let total_pages = if total_items > 0 {
        total_items.div_ceil(page_size)
    } else {
        0
    };
    if total_items > 0 && page_number > total_pages {
        return Err(StoreError::PageOutOfRange {
            page_number,
            total_pages,
        });
    }
    let start = page_number.saturating_sub(1).saturating_mul(page_size) as usize;
    let items: Vec<T> = all
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect();
    Ok(Page::new(items, total_items, page_number, page_size))
}
