use once_cell::sync::Lazy;
use std::path::PathBuf;

pub static DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("STASH_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".stash"))
});

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| DATA_DIR.join("config.yaml"));
pub static THUMBNAILS_DIR: Lazy<PathBuf> = Lazy::new(|| DATA_DIR.join("thumbnails"));

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_GALLERY_PREFIX: &str = "/v1";
pub const DEFAULT_ADMIN_PREFIX: &str = "/api/v1/admin";
pub const DEFAULT_USER_AGENT: &str = "stash-console/0.1";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 5;

/// Upper bound on the tag suggestion list offered by the filter panel.
pub const TAG_SUGGESTION_LIMIT: usize = 50;

/// Steps visited by the min-rating toggle, wrapping back to "any".
pub const RATING_CYCLE: [f64; 4] = [0.0, 3.5, 4.0, 4.5];

pub const MAX_RATING: f64 = 5.0;

/// Pages shown on each side of the current page in the pagination strip.
pub const PAGINATION_WINDOW: u32 = 2;

pub const GALLERY_SITE_URL: &str = "https://exhentai.org";

pub const TAG_TRANSLATION_URL: &str = "https://raw.githubusercontent.com/scooderic/exhentai-tags-chinese-translation/refs/heads/master/dist/ehtags-cn.json";

/// Separator between alternative translations in the tag dictionary.
pub const TRANSLATION_TERM_SEPARATOR: char = '；';

pub const DEFAULT_INCREMENTAL_SCAN_WINDOW: u64 = 10_000;
pub const DEFAULT_RATING_DIFF_THRESHOLD: f64 = 0.5;
