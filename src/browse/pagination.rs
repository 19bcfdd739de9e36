use crate::constants::PAGINATION_WINDOW;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Which navigation buttons are usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNav {
    pub first: bool,
    pub prev: bool,
    pub next: bool,
    pub last: bool,
}

/// Page strip around `current`: first and last page always, the window on
/// each side, and an ellipsis over every gap.
pub fn page_items(current: u32, total_pages: u32) -> Vec<PageItem> {
    let total_pages = total_pages.max(1);
    let current = current.clamp(1, total_pages);

    let left = current.saturating_sub(PAGINATION_WINDOW).max(2);
    let right = (current + PAGINATION_WINDOW).min(total_pages - 1);

    let mut items = vec![PageItem::Page(1)];
    if left > 2 {
        items.push(PageItem::Ellipsis);
    }
    for page in left..=right {
        items.push(PageItem::Page(page));
    }
    if right < total_pages - 1 {
        items.push(PageItem::Ellipsis);
    }
    if total_pages > 1 {
        items.push(PageItem::Page(total_pages));
    }
    items
}

pub fn page_nav(current: u32, total_pages: u32) -> PageNav {
    let total_pages = total_pages.max(1);
    let at_start = current <= 1;
    let at_end = current >= total_pages;
    PageNav {
        first: !at_start,
        prev: !at_start,
        next: !at_end,
        last: !at_end,
    }
}
