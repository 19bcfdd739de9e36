use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Category;
use crate::utils::datetime::deserialize_optional;

/// Tags grouped by namespace (`artist`, `language`, ...), values in server order.
pub type TagMap = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gallery {
    pub gid: i64,
    pub token: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_jpn: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub pages: Option<i64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub fav_count: Option<i64>,
    #[serde(default)]
    pub comment_count: Option<i64>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: TagMap,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<TagMap, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TagMap>::deserialize(deserializer)?.unwrap_or_default())
}

impl Gallery {
    pub fn category_kind(&self) -> Option<Category> {
        self.category.as_deref().and_then(|c| c.parse().ok())
    }

    pub fn has_thumbnail(&self) -> bool {
        self.thumb.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.title_jpn.as_deref())
            .unwrap_or("(untitled)")
    }

    /// `(namespace, value)` pairs in namespace order, skipping empty values.
    pub fn tag_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().flat_map(|(ns, values)| {
            values
                .iter()
                .filter(|v| !v.is_empty())
                .map(move |v| (ns.as_str(), v.as_str()))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryList {
    pub items: Vec<Gallery>,
    pub total: i64,
    #[serde(default = "default_page")]
    pub page: u32,
    pub size: u32,
    /// Total number of pages, computed by the service from the unfiltered total.
    pub pages: u32,
}

fn default_page() -> u32 {
    1
}

/// Ordering requested from the service. The console always asks for
/// `gid_desc` and reorders the fetched page locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerSort {
    #[default]
    GidDesc,
    GidAsc,
    FavCount,
    Rating,
    PostedAt,
}

/// Ordering applied to the items of the current page only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalSort {
    #[default]
    FavCount,
    Rating,
    CommentCount,
    PostedAt,
}

impl LocalSort {
    pub const ALL: [LocalSort; 4] = [
        LocalSort::FavCount,
        LocalSort::Rating,
        LocalSort::CommentCount,
        LocalSort::PostedAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocalSort::FavCount => "fav_count",
            LocalSort::Rating => "rating",
            LocalSort::CommentCount => "comment_count",
            LocalSort::PostedAt => "posted_at",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LocalSort::FavCount => "Fav",
            LocalSort::Rating => "Rating",
            LocalSort::CommentCount => "Comments",
            LocalSort::PostedAt => "Date",
        }
    }
}

impl fmt::Display for LocalSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocalSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocalSort::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s.trim())
            .ok_or_else(|| format!("unknown sort '{}'", s))
    }
}

/// Query parameters of `GET /v1/galleries`, serialized in wire order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort: ServerSort,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_fav: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl GalleryQuery {
    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }
}
