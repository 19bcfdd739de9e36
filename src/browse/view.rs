use std::cmp::Ordering;
use std::collections::HashMap;

use super::FilterState;
use crate::constants::TAG_SUGGESTION_LIMIT;
use crate::models::{Gallery, GalleryList, LocalSort};
use crate::utils::format::format_count;

fn sort_key(gallery: &Gallery, sort: LocalSort) -> f64 {
    match sort {
        LocalSort::FavCount => gallery.fav_count.unwrap_or(0) as f64,
        LocalSort::Rating => gallery.rating.unwrap_or(0.0),
        LocalSort::CommentCount => gallery.comment_count.unwrap_or(0) as f64,
        LocalSort::PostedAt => gallery
            .posted_at
            .map(|t| t.timestamp_millis() as f64)
            .unwrap_or(0.0),
    }
}

/// Apply `min_rating` and the local sort to one fetched page. Missing values
/// count as zero. Ties keep the service order.
pub fn apply_local_view(items: &[Gallery], min_rating: f64, sort: LocalSort) -> Vec<&Gallery> {
    let mut shown: Vec<&Gallery> = items
        .iter()
        .filter(|g| min_rating <= 0.0 || g.rating.unwrap_or(0.0) >= min_rating)
        .collect();

    shown.sort_by(|a, b| {
        sort_key(b, sort)
            .partial_cmp(&sort_key(a, sort))
            .unwrap_or(Ordering::Equal)
    });
    shown
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSuggestion {
    pub tag: String,
    pub count: usize,
}

/// Most frequent `namespace:value` tags among `items`, ties in lexicographic
/// order, at most `TAG_SUGGESTION_LIMIT` entries.
pub fn tag_suggestions(items: &[&Gallery]) -> Vec<TagSuggestion> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for gallery in items {
        for (ns, value) in gallery.tag_pairs() {
            *freq.entry(format!("{}:{}", ns, value)).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<TagSuggestion> = freq
        .into_iter()
        .map(|(tag, count)| TagSuggestion { tag, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    ranked.truncate(TAG_SUGGESTION_LIMIT);
    ranked
}

/// What the gallery page shows for the current filters.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub items: Vec<&'a Gallery>,
    /// Items on the fetched page before the rating filter.
    pub fetched: usize,
    pub total: i64,
    pub page: u32,
    pub pages: u32,
    pub rating_filter_active: bool,
}

impl<'a> PageView<'a> {
    pub fn new(list: &'a GalleryList, filters: &FilterState) -> Self {
        Self {
            items: apply_local_view(&list.items, filters.min_rating(), filters.sort()),
            fetched: list.items.len(),
            total: list.total,
            page: filters.page(),
            pages: list.pages.max(1),
            rating_filter_active: filters.min_rating() > 0.0,
        }
    }

    pub fn suggestions(&self) -> Vec<TagSuggestion> {
        tag_suggestions(&self.items)
    }

    /// `1,234 results · page 2 / 13`, plus the shown count while a rating
    /// filter hides part of the page.
    pub fn results_summary(&self) -> String {
        let mut line = format!(
            "{} results · page {} / {}",
            format_count(self.total),
            self.page,
            self.pages
        );
        if self.rating_filter_active {
            line.push_str(&format!(" · showing {}", self.items.len()));
        }
        line
    }
}
