use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::utils::datetime::deserialize_optional;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub last_run_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub total_galleries: i64,
    #[serde(default)]
    pub by_category: IndexMap<String, i64>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub queue_status: IndexMap<String, JobState>,
}
