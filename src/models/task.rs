use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use super::{Category, TaskCategory};
use crate::constants::{DEFAULT_INCREMENTAL_SCAN_WINDOW, DEFAULT_RATING_DIFF_THRESHOLD};
use crate::utils::datetime::deserialize_optional;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Full,
    Incremental,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Full => write!(f, "full"),
            TaskType::Incremental => write!(f, "incremental"),
        }
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "full" => Ok(TaskType::Full),
            "incremental" => Ok(TaskType::Incremental),
            other => Err(format!("unknown task type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Stopped,
    Completed,
    Error,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Stopped => write!(f, "stopped"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullScanConfig {
    #[serde(default)]
    pub start_gid: Option<i64>,
}

/// Incremental task settings. The service changed this schema once, so each
/// shape is kept as its own version instead of a bag of optional fields.
#[derive(Debug, Clone, PartialEq)]
pub enum IncrementalConfig {
    /// Schema v2: rescan the newest `scan_window` galleries of `categories`.
    Windowed {
        categories: Vec<Category>,
        scan_window: u64,
        rating_diff_threshold: f64,
    },
    /// Schema v1: bounded by a detail-page quota over a gid window.
    Legacy {
        detail_quota: u64,
        gid_window: u64,
        rating_diff_threshold: f64,
    },
}

impl IncrementalConfig {
    pub fn schema_version(&self) -> u8 {
        match self {
            IncrementalConfig::Legacy { .. } => 1,
            IncrementalConfig::Windowed { .. } => 2,
        }
    }

    pub fn rating_diff_threshold(&self) -> f64 {
        match self {
            IncrementalConfig::Windowed {
                rating_diff_threshold,
                ..
            }
            | IncrementalConfig::Legacy {
                rating_diff_threshold,
                ..
            } => *rating_diff_threshold,
        }
    }
}

impl Default for IncrementalConfig {
    fn default() -> Self {
        IncrementalConfig::Windowed {
            categories: Category::incremental_defaults(),
            scan_window: DEFAULT_INCREMENTAL_SCAN_WINDOW,
            rating_diff_threshold: DEFAULT_RATING_DIFF_THRESHOLD,
        }
    }
}

/// Task configuration, tagged by the task's `type` column.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskConfig {
    Full(FullScanConfig),
    Incremental(IncrementalConfig),
    /// A config the client cannot interpret, kept verbatim.
    Unrecognized(Value),
}

impl TaskConfig {
    pub fn default_for(task_type: TaskType) -> Self {
        match task_type {
            TaskType::Full => TaskConfig::Full(FullScanConfig { start_gid: None }),
            TaskType::Incremental => TaskConfig::Incremental(IncrementalConfig::default()),
        }
    }

    /// Interpret a raw config object in the light of the task type. Keys the
    /// service adds for itself (such as `inline_set`) are ignored.
    pub fn from_wire(task_type: TaskType, raw: Value) -> Self {
        let parsed = match task_type {
            TaskType::Full => parse_full(&raw),
            TaskType::Incremental => parse_incremental(&raw),
        };
        parsed.unwrap_or(TaskConfig::Unrecognized(raw))
    }

    pub fn to_wire(&self) -> Value {
        match self {
            TaskConfig::Full(cfg) => json!({ "start_gid": cfg.start_gid }),
            TaskConfig::Incremental(IncrementalConfig::Windowed {
                categories,
                scan_window,
                rating_diff_threshold,
            }) => json!({
                "categories": categories,
                "scan_window": scan_window,
                "rating_diff_threshold": rating_diff_threshold,
            }),
            TaskConfig::Incremental(IncrementalConfig::Legacy {
                detail_quota,
                gid_window,
                rating_diff_threshold,
            }) => json!({
                "detail_quota": detail_quota,
                "gid_window": gid_window,
                "rating_diff_threshold": rating_diff_threshold,
            }),
            TaskConfig::Unrecognized(raw) => raw.clone(),
        }
    }

    pub fn scan_window(&self) -> Option<u64> {
        match self {
            TaskConfig::Incremental(IncrementalConfig::Windowed { scan_window, .. }) => {
                Some(*scan_window)
            }
            TaskConfig::Incremental(IncrementalConfig::Legacy { gid_window, .. }) => {
                Some(*gid_window)
            }
            _ => None,
        }
    }

    pub fn categories(&self) -> &[Category] {
        match self {
            TaskConfig::Incremental(IncrementalConfig::Windowed { categories, .. }) => categories,
            _ => &[],
        }
    }
}

impl Serialize for TaskConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

fn parse_full(raw: &Value) -> Option<TaskConfig> {
    let obj = raw.as_object()?;
    let start_gid = match obj.get("start_gid") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_i64()?),
    };
    Some(TaskConfig::Full(FullScanConfig { start_gid }))
}

fn parse_incremental(raw: &Value) -> Option<TaskConfig> {
    let obj = raw.as_object()?;
    let threshold = obj
        .get("rating_diff_threshold")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_RATING_DIFF_THRESHOLD);

    if let Some(categories) = obj.get("categories") {
        let categories = categories
            .as_array()?
            .iter()
            .map(|c| c.as_str().and_then(|s| s.parse::<Category>().ok()))
            .collect::<Option<Vec<_>>>()?;
        let scan_window = obj
            .get("scan_window")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_INCREMENTAL_SCAN_WINDOW);
        return Some(TaskConfig::Incremental(IncrementalConfig::Windowed {
            categories,
            scan_window,
            rating_diff_threshold: threshold,
        }));
    }

    if obj.contains_key("detail_quota") || obj.contains_key("gid_window") {
        return Some(TaskConfig::Incremental(IncrementalConfig::Legacy {
            detail_quota: obj.get("detail_quota").and_then(Value::as_u64).unwrap_or(0),
            gid_window: obj.get("gid_window").and_then(Value::as_u64).unwrap_or(0),
            rating_diff_threshold: threshold,
        }));
    }

    None
}

/// Progress counters maintained by the service. Which ones are present
/// depends on the task type; unknown counters are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_gid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_gid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_gid: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanned_count: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw task row as the service sends it; `config` is only meaningful
/// together with `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SyncTaskWire {
    id: i64,
    name: String,
    #[serde(rename = "type")]
    task_type: TaskType,
    category: TaskCategory,
    status: TaskStatus,
    desired_status: TaskStatus,
    #[serde(default)]
    config: Value,
    #[serde(default)]
    state: Option<TaskState>,
    #[serde(default)]
    progress_pct: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional")]
    last_run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SyncTaskWire", into = "SyncTaskWire")]
pub struct SyncTask {
    pub id: i64,
    pub name: String,
    pub task_type: TaskType,
    pub category: TaskCategory,
    pub status: TaskStatus,
    pub desired_status: TaskStatus,
    pub config: TaskConfig,
    pub state: TaskState,
    pub progress_pct: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl From<SyncTaskWire> for SyncTask {
    fn from(wire: SyncTaskWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            task_type: wire.task_type,
            category: wire.category,
            status: wire.status,
            desired_status: wire.desired_status,
            config: TaskConfig::from_wire(wire.task_type, wire.config),
            state: wire.state.unwrap_or_default(),
            progress_pct: wire.progress_pct.unwrap_or(0.0),
            created_at: wire.created_at,
            updated_at: wire.updated_at,
            last_run_at: wire.last_run_at,
            error_message: wire.error_message,
        }
    }
}

impl From<SyncTask> for SyncTaskWire {
    fn from(task: SyncTask) -> Self {
        Self {
            id: task.id,
            name: task.name,
            task_type: task.task_type,
            category: task.category,
            status: task.status,
            desired_status: task.desired_status,
            config: task.config.to_wire(),
            state: Some(task.state),
            progress_pct: Some(task.progress_pct),
            created_at: task.created_at,
            updated_at: task.updated_at,
            last_run_at: task.last_run_at,
            error_message: task.error_message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTaskRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub category: TaskCategory,
    pub config: TaskConfig,
}

/// Partial update. The service merges `config` into the stored object, so
/// only the keys to change need to be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.config.as_ref().map_or(true, Map::is_empty)
    }
}
