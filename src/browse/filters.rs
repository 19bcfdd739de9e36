use crate::constants::{MAX_RATING, RATING_CYCLE};
use crate::models::{Category, GalleryQuery, LocalSort, ServerSort};

/// Trim a tag search and fold the full-width colon into `:`.
/// Returns `None` when nothing is left.
pub fn normalize_tag(input: &str) -> Option<String> {
    let normalized = input.replace('：', ":");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Step `current` through the rating cycle. Values outside the cycle restart it.
pub fn next_rating(current: f64) -> f64 {
    let next = RATING_CYCLE
        .iter()
        .position(|step| *step == current)
        .map_or(0, |idx| (idx + 1) % RATING_CYCLE.len());
    RATING_CYCLE[next]
}

fn clamp_rating(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    ((value.clamp(0.0, MAX_RATING)) * 2.0).round() / 2.0
}

/// Filter and pagination selection of the gallery browser.
///
/// Server-side fields (`category`, `tag`, `min_fav`, `language`) reset the
/// page to 1 when they change and their setters return `true`. `sort` and
/// `min_rating` only reshape the page already fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    category: Option<Category>,
    tag: Option<String>,
    tag_draft: String,
    min_fav: Option<u64>,
    language: Option<String>,
    min_rating: f64,
    sort: LocalSort,
    page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            category: None,
            tag: None,
            tag_draft: String::new(),
            min_fav: None,
            language: None,
            min_rating: 0.0,
            sort: LocalSort::default(),
            page: 1,
        }
    }
}

impl FilterState {
    pub fn with_sort(sort: LocalSort) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Text currently in the tag input, committed or not.
    pub fn tag_draft(&self) -> &str {
        &self.tag_draft
    }

    pub fn min_fav(&self) -> Option<u64> {
        self.min_fav
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn min_rating(&self) -> f64 {
        self.min_rating
    }

    pub fn sort(&self) -> LocalSort {
        self.sort
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    fn server_changed(&mut self, changed: bool) -> bool {
        if changed {
            self.page = 1;
        }
        changed
    }

    pub fn set_category(&mut self, category: Option<Category>) -> bool {
        let changed = self.category != category;
        self.category = category;
        self.server_changed(changed)
    }

    pub fn set_tag_draft(&mut self, text: &str) {
        self.tag_draft = text.to_string();
    }

    /// Commit the draft (blur or Enter). An empty draft clears the tag filter.
    pub fn commit_tag(&mut self) -> bool {
        let tag = normalize_tag(&self.tag_draft);
        self.tag_draft = tag.clone().unwrap_or_default();
        let changed = self.tag != tag;
        self.tag = tag;
        self.server_changed(changed)
    }

    /// Pick an entry from the suggestion list.
    pub fn select_suggestion(&mut self, suggestion: &str) -> bool {
        self.set_tag_draft(suggestion);
        self.commit_tag()
    }

    /// Search by a tag clicked on a gallery. Empty tags are ignored.
    pub fn search_tag(&mut self, namespace: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            return false;
        }
        let tag = if namespace.trim().is_empty() {
            value.to_string()
        } else {
            format!("{}:{}", namespace.trim(), value.trim())
        };
        self.select_suggestion(&tag)
    }

    /// Zero means no minimum.
    pub fn set_min_fav(&mut self, min_fav: Option<u64>) -> bool {
        let min_fav = min_fav.filter(|v| *v > 0);
        let changed = self.min_fav != min_fav;
        self.min_fav = min_fav;
        self.server_changed(changed)
    }

    pub fn set_language(&mut self, language: Option<&str>) -> bool {
        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        let changed = self.language != language;
        self.language = language;
        self.server_changed(changed)
    }

    pub fn set_sort(&mut self, sort: LocalSort) {
        self.sort = sort;
    }

    /// Clamped to `0..=5` in half-point steps.
    pub fn set_min_rating(&mut self, rating: f64) {
        self.min_rating = clamp_rating(rating);
    }

    pub fn cycle_min_rating(&mut self) -> f64 {
        self.min_rating = next_rating(self.min_rating);
        self.min_rating
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Drop every filter but keep the local sort.
    pub fn clear(&mut self) -> bool {
        let cleared = Self::with_sort(self.sort);
        let changed = self.category.is_some()
            || self.tag.is_some()
            || self.min_fav.is_some()
            || self.language.is_some();
        *self = cleared;
        changed
    }

    pub fn query(&self, page_size: u32) -> GalleryQuery {
        GalleryQuery {
            page: self.page,
            page_size,
            sort: ServerSort::GidDesc,
            category: self.category,
            tag: self.tag.clone(),
            min_fav: self.min_fav,
            language: self.language.clone(),
        }
    }

    /// Identity of the server request this state maps to. Two states with the
    /// same key show the same fetched page.
    pub fn query_key(&self, page_size: u32) -> String {
        self.query(page_size).to_query_string()
    }
}
