/// Return the 1-based `page` of `items`, `page_size` items per page.
///
/// The window `[(page-1)*size, page*size)` is clamped to the slice; pages
/// past the end (and page 0) are empty rather than an error.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `count` items. Zero items means zero pages,
/// in which case no pagination control is shown.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}
