use std::fmt;

use crate::models::{SyncTask, TaskStatus, TaskType, MIXED_CATEGORY};
use crate::utils::format::format_optional_count;

/// True while the scheduler has not yet caught up with a start or stop
/// request.
pub fn is_transitioning(task: &SyncTask) -> bool {
    matches!(
        (task.status, task.desired_status),
        (TaskStatus::Stopped, TaskStatus::Running) | (TaskStatus::Running, TaskStatus::Stopped)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Starting,
    Stopping,
    Running,
    Stopped,
    Completed,
    Error,
}

impl DisplayStatus {
    pub fn of(task: &SyncTask) -> Self {
        match (task.status, task.desired_status) {
            (TaskStatus::Stopped, TaskStatus::Running) => DisplayStatus::Starting,
            (TaskStatus::Running, TaskStatus::Stopped) => DisplayStatus::Stopping,
            (TaskStatus::Running, _) => DisplayStatus::Running,
            (TaskStatus::Stopped, _) => DisplayStatus::Stopped,
            (TaskStatus::Completed, _) => DisplayStatus::Completed,
            (TaskStatus::Error, _) => DisplayStatus::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStatus::Starting => "starting",
            DisplayStatus::Stopping => "stopping",
            DisplayStatus::Running => "running",
            DisplayStatus::Stopped => "stopped",
            DisplayStatus::Completed => "completed",
            DisplayStatus::Error => "error",
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskAction {
    Start,
    Stop,
    Delete,
}

impl TaskAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::Start => "start",
            TaskAction::Stop => "stop",
            TaskAction::Delete => "delete",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which lifecycle actions a task row offers. `busy` is set while a request
/// for that task is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionAvailability {
    pub start: bool,
    pub stop: bool,
    pub delete: bool,
}

impl ActionAvailability {
    pub fn of(task: &SyncTask, busy: bool) -> Self {
        let idle = !busy && !is_transitioning(task);
        Self {
            start: idle
                && task.status != TaskStatus::Running
                && task.status != TaskStatus::Completed,
            stop: idle && task.status == TaskStatus::Running,
            delete: idle
                && task.status != TaskStatus::Running
                && task.desired_status != TaskStatus::Running,
        }
    }

    pub fn allows(&self, action: TaskAction) -> bool {
        match action {
            TaskAction::Start => self.start,
            TaskAction::Stop => self.stop,
            TaskAction::Delete => self.delete,
        }
    }
}

/// `Cosplay` for full scans, `Mixed(2): Manga, Cosplay` for incremental ones.
pub fn format_task_category(task: &SyncTask) -> String {
    if task.task_type != TaskType::Incremental {
        return task.category.to_string();
    }

    let categories = task.config.categories();
    if categories.is_empty() {
        return format!("{}(0)", MIXED_CATEGORY);
    }
    let names: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
    format!("{}({}): {}", MIXED_CATEGORY, names.len(), names.join(", "))
}

/// Progress cell of a task row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub current: Option<i64>,
    pub total: Option<i64>,
    pub percent: f64,
}

impl ProgressView {
    pub fn of(task: &SyncTask) -> Self {
        let (current, total) = match task.task_type {
            TaskType::Incremental => (
                task.state.scanned_count,
                task.config.scan_window().map(|w| w as i64),
            ),
            TaskType::Full => (task.state.db_count, task.state.total_count),
        };
        Self {
            current,
            total,
            percent: task.progress_pct,
        }
    }

    pub fn clamped_percent(&self) -> f64 {
        if self.percent.is_nan() {
            return 0.0;
        }
        self.percent.clamp(0.0, 100.0)
    }

    /// Clamped percent with three decimals below 1 %, one above.
    pub fn percent_label(&self) -> String {
        let percent = self.clamped_percent();
        if percent < 1.0 {
            format!("{:.3}%", percent)
        } else {
            format!("{:.1}%", percent)
        }
    }

    pub fn counts_label(&self) -> String {
        format!(
            "{} / {}",
            format_optional_count(self.current),
            format_optional_count(self.total)
        )
    }
}
