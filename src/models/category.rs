use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category label used by incremental tasks that span several categories.
pub const MIXED_CATEGORY: &str = "Mixed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Misc,
    Doujinshi,
    Manga,
    ArtistCg,
    GameCg,
    ImageSet,
    Cosplay,
    AsianPorn,
    NonH,
    Western,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Misc,
        Category::Doujinshi,
        Category::Manga,
        Category::ArtistCg,
        Category::GameCg,
        Category::ImageSet,
        Category::Cosplay,
        Category::AsianPorn,
        Category::NonH,
        Category::Western,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Misc => "Misc",
            Category::Doujinshi => "Doujinshi",
            Category::Manga => "Manga",
            Category::ArtistCg => "Artist CG",
            Category::GameCg => "Game CG",
            Category::ImageSet => "Image Set",
            Category::Cosplay => "Cosplay",
            Category::AsianPorn => "Asian Porn",
            Category::NonH => "Non-H",
            Category::Western => "Western",
        }
    }

    /// Default selection for a new incremental task.
    pub fn incremental_defaults() -> Vec<Category> {
        vec![Category::Doujinshi, Category::Manga, Category::Cosplay]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Case-insensitive, matching how the service compares categories.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown category '{}'", needle))
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

/// Category column of a sync task: a single category for full scans, or
/// `Mixed` for incremental tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskCategory {
    Single(Category),
    Mixed,
    /// Anything the service stored that this client does not recognise.
    Other(String),
}

impl From<String> for TaskCategory {
    fn from(value: String) -> Self {
        if value == MIXED_CATEGORY {
            return TaskCategory::Mixed;
        }
        match value.parse::<Category>() {
            Ok(category) => TaskCategory::Single(category),
            Err(_) => TaskCategory::Other(value),
        }
    }
}

impl From<TaskCategory> for String {
    fn from(value: TaskCategory) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskCategory::Single(category) => f.write_str(category.as_str()),
            TaskCategory::Mixed => f.write_str(MIXED_CATEGORY),
            TaskCategory::Other(raw) => f.write_str(raw),
        }
    }
}
