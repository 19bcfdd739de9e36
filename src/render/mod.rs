//! Plain-text views of galleries, stats and the task dashboard.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::admin::{DashboardSnapshot, ProgressView, TaskRow, LOAD_FAILED_MESSAGE};
use crate::browse::{page_items, page_nav, PageItem, PageView};
use crate::constants::GALLERY_SITE_URL;
use crate::models::{Gallery, QueueStage, Stats, SyncTask, ThumbQueueStats};
use crate::translation::TagTranslationCache;
use crate::utils::datetime::format_datetime;
use crate::utils::format::{format_count, format_optional_count, truncate};

const CARD_TITLE_WIDTH: usize = 48;
const LIST_TITLE_WIDTH: usize = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        }
    }
}

/// Page of the gallery on the source site.
pub fn gallery_link(gallery: &Gallery) -> String {
    format!("{}/g/{}/{}/", GALLERY_SITE_URL, gallery.gid, gallery.token)
}

fn rating_label(gallery: &Gallery) -> String {
    match gallery.rating {
        Some(rating) => format!("★{:.1}", rating),
        None => "★—".to_string(),
    }
}

fn date_label(gallery: &Gallery) -> String {
    gallery
        .posted_at
        .as_ref()
        .map(format_datetime)
        .unwrap_or_else(|| "—".to_string())
}

fn stats_line(gallery: &Gallery) -> String {
    format!(
        "{}  ♥{}  💬{}  {}p  {}",
        rating_label(gallery),
        format_optional_count(gallery.fav_count),
        format_optional_count(gallery.comment_count),
        format_optional_count(gallery.pages),
        date_label(gallery)
    )
}

/// Compact grid entry: title and counters.
pub fn render_card(gallery: &Gallery) -> String {
    format!(
        "#{} [{}] {}\n    {}",
        gallery.gid,
        gallery.category.as_deref().unwrap_or("?"),
        truncate(gallery.display_title(), CARD_TITLE_WIDTH),
        stats_line(gallery)
    )
}

fn tag_label(namespace: &str, value: &str, translations: Option<&TagTranslationCache>) -> String {
    match translations.and_then(|cache| cache.translate(value)) {
        Some(translated) if translated != value => {
            format!("{}:{} ({})", namespace, value, translated)
        }
        _ => format!("{}:{}", namespace, value),
    }
}

/// List entry: card details plus link and tags, translated when a loaded
/// dictionary is passed.
pub fn render_list_row(gallery: &Gallery, translations: Option<&TagTranslationCache>) -> String {
    let mut out = format!(
        "#{} [{}] {}\n    {}\n    {}",
        gallery.gid,
        gallery.category.as_deref().unwrap_or("?"),
        truncate(gallery.display_title(), LIST_TITLE_WIDTH),
        stats_line(gallery),
        gallery_link(gallery)
    );

    let tags: Vec<String> = gallery
        .tag_pairs()
        .map(|(ns, value)| tag_label(ns, value, translations))
        .collect();
    if !tags.is_empty() {
        let _ = write!(out, "\n    {}", tags.join("  "));
    }
    out
}

pub fn render_pagination(current: u32, total_pages: u32) -> String {
    let nav = page_nav(current, total_pages);
    let mark = |enabled: bool, label: &str| {
        if enabled {
            label.to_string()
        } else {
            " ".repeat(label.chars().count())
        }
    };

    let pages: Vec<String> = page_items(current, total_pages)
        .into_iter()
        .map(|item| match item {
            PageItem::Page(page) if page == current => format!("[{}]", page),
            PageItem::Page(page) => page.to_string(),
            PageItem::Ellipsis => "…".to_string(),
        })
        .collect();

    format!(
        "{} {} {} {} {}",
        mark(nav.first, "«"),
        mark(nav.prev, "‹"),
        pages.join(" "),
        mark(nav.next, "›"),
        mark(nav.last, "»")
    )
}

pub fn render_gallery_page(
    view: &PageView<'_>,
    mode: ViewMode,
    translations: Option<&TagTranslationCache>,
) -> String {
    let mut out = view.results_summary();
    out.push('\n');

    if view.items.is_empty() {
        out.push_str("\nNo galleries match the current filters.\n");
    }
    for gallery in &view.items {
        out.push('\n');
        match mode {
            ViewMode::Grid => out.push_str(&render_card(gallery)),
            ViewMode::List => out.push_str(&render_list_row(gallery, translations)),
        }
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&render_pagination(view.page, view.pages));
    out
}

pub fn render_gallery_detail(gallery: &Gallery, thumbnail_url: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", gallery.display_title());
    if let (Some(title), Some(jpn)) = (&gallery.title, &gallery.title_jpn) {
        if title != jpn {
            let _ = writeln!(out, "{}", jpn);
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "gid        {}", gallery.gid);
    let _ = writeln!(out, "category   {}", gallery.category.as_deref().unwrap_or("—"));
    let _ = writeln!(out, "uploader   {}", gallery.uploader.as_deref().unwrap_or("—"));
    let _ = writeln!(out, "language   {}", gallery.language.as_deref().unwrap_or("—"));
    let _ = writeln!(out, "posted     {}", date_label(gallery));
    let _ = writeln!(out, "stats      {}", stats_line(gallery));
    let _ = writeln!(out, "link       {}", gallery_link(gallery));
    if let Some(url) = thumbnail_url.filter(|_| gallery.has_thumbnail()) {
        let _ = writeln!(out, "thumbnail  {}", url);
    }

    if !gallery.tags.is_empty() {
        let _ = writeln!(out);
        for (ns, values) in &gallery.tags {
            let _ = writeln!(out, "{:>10}: {}", ns, values.join(", "));
        }
    }
    out
}

pub fn render_stats(stats: &Stats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Galleries: {}", format_count(stats.total_galleries));
    let synced = stats
        .last_synced_at
        .as_ref()
        .map(format_datetime)
        .unwrap_or_else(|| "never".to_string());
    let _ = writeln!(out, "Last sync: {}", synced);

    if !stats.by_category.is_empty() {
        let _ = writeln!(out);
        for (category, count) in &stats.by_category {
            let _ = writeln!(out, "  {:<12} {:>10}", category, format_count(*count));
        }
    }

    if !stats.queue_status.is_empty() {
        let _ = writeln!(out);
        for (job, state) in &stats.queue_status {
            let last_run = state
                .last_run_at
                .as_ref()
                .map(format_datetime)
                .unwrap_or_else(|| "—".to_string());
            let _ = writeln!(
                out,
                "  {:<12} {:<10} {}",
                job,
                state.state.as_deref().unwrap_or("—"),
                last_run
            );
        }
    }
    out
}

/// Queue stages in pipeline order: `Waiting 3 → Pending 12 → ...`.
pub fn render_queue(queue: &ThumbQueueStats) -> String {
    QueueStage::FLOW
        .iter()
        .map(|stage| format!("{} {}", stage.label(), format_count(queue.count(*stage))))
        .collect::<Vec<_>>()
        .join(" → ")
}

const PROGRESS_BAR_WIDTH: usize = 10;

fn progress_bar(progress: &ProgressView) -> String {
    let filled = (progress.clamped_percent() / 100.0 * PROGRESS_BAR_WIDTH as f64).floor() as usize;
    let filled = filled.min(PROGRESS_BAR_WIDTH);
    format!(
        "[{}{}]",
        "#".repeat(filled),
        ".".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

fn progress_cell(progress: &ProgressView) -> String {
    format!(
        "{} {} {:>8}",
        progress.counts_label(),
        progress_bar(progress),
        progress.percent_label()
    )
}

fn render_row(row: &TaskRow) -> String {
    let mut actions: Vec<&str> = Vec::new();
    if row.actions.start {
        actions.push("start");
    }
    if row.actions.stop {
        actions.push("stop");
    }
    if row.actions.delete {
        actions.push("delete");
    }
    let actions = match row.pending {
        Some(action) => format!("{}…", action),
        None if actions.is_empty() => "—".to_string(),
        None => actions.join("/"),
    };

    let mut line = format!(
        "{:>4}  {:<20} {:<12} {:<36} {:<9} {:<28} {}",
        row.task.id,
        truncate(&row.task.name, 20),
        row.task.task_type.to_string(),
        truncate(&row.category, 36),
        row.status.as_str(),
        progress_cell(&row.progress),
        actions
    );
    if let Some(message) = &row.task.error_message {
        let _ = write!(line, "\n      ! {}", message);
    }
    line
}

pub fn render_dashboard(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();

    if let Some(banner) = &snapshot.banner {
        let _ = writeln!(out, "error: {}", banner);
    }
    if snapshot.load_failed {
        let _ = writeln!(out, "error: {}", LOAD_FAILED_MESSAGE);
    }

    let refresh = if snapshot.polling {
        "auto refresh on"
    } else if snapshot.auto_refresh {
        "auto refresh paused"
    } else {
        "auto refresh off"
    };
    let _ = writeln!(out, "Thumbnail queue: {}  ({})", render_queue(&snapshot.queue), refresh);
    let _ = writeln!(out);

    if !snapshot.loaded {
        let _ = writeln!(out, "Loading tasks…");
        return out;
    }
    if snapshot.rows.is_empty() {
        let _ = writeln!(out, "No sync tasks yet. Create one with `stash tasks create`.");
        return out;
    }

    for row in &snapshot.rows {
        let _ = writeln!(out, "{}", render_row(row));
    }
    out
}

pub fn render_task(task: &SyncTask) -> String {
    let row = TaskRow {
        task: task.clone(),
        status: crate::admin::DisplayStatus::of(task),
        category: crate::admin::format_task_category(task),
        progress: ProgressView::of(task),
        actions: crate::admin::ActionAvailability::of(task, false),
        pending: None,
    };
    let mut out = render_row(&row);
    let _ = write!(out, "\n      config: {}", task.config.to_wire());
    out
}
