use crate::error::{ClientError, ClientResult};
use crate::models::{
    Category, CreateTaskRequest, IncrementalConfig, SyncTask, TaskCategory, TaskConfig, TaskType,
};

const DEFAULT_FULL_CATEGORY: Category = Category::Cosplay;

/// Create-task form. Submitting validates locally; nothing reaches the
/// service unless `validate` succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    name: String,
    task_type: TaskType,
    category: TaskCategory,
    config: TaskConfig,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            task_type: TaskType::Full,
            category: TaskCategory::Single(DEFAULT_FULL_CATEGORY),
            config: TaskConfig::default_for(TaskType::Full),
        }
    }
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn category(&self) -> &TaskCategory {
        &self.category
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Switching type resets the config to that type's defaults. Incremental
    /// tasks are always `Mixed`; a full scan keeps its category when it is a
    /// fixed one.
    pub fn set_type(&mut self, task_type: TaskType) {
        self.category = match task_type {
            TaskType::Incremental => TaskCategory::Mixed,
            TaskType::Full => match &self.category {
                TaskCategory::Single(category) => TaskCategory::Single(*category),
                _ => TaskCategory::Single(DEFAULT_FULL_CATEGORY),
            },
        };
        self.task_type = task_type;
        self.config = TaskConfig::default_for(task_type);
    }

    /// Only meaningful for full scans.
    pub fn set_category(&mut self, category: Category) {
        if self.task_type == TaskType::Full {
            self.category = TaskCategory::Single(category);
        }
    }

    pub fn set_start_gid(&mut self, start_gid: Option<i64>) {
        if let TaskConfig::Full(cfg) = &mut self.config {
            cfg.start_gid = start_gid;
        }
    }

    /// Add or remove a category of an incremental task.
    pub fn toggle_category(&mut self, category: Category) {
        if let TaskConfig::Incremental(IncrementalConfig::Windowed { categories, .. }) =
            &mut self.config
        {
            if let Some(pos) = categories.iter().position(|c| *c == category) {
                categories.remove(pos);
            } else {
                categories.push(category);
            }
        }
    }

    pub fn set_scan_window(&mut self, window: u64) {
        if let TaskConfig::Incremental(IncrementalConfig::Windowed { scan_window, .. }) =
            &mut self.config
        {
            *scan_window = window;
        }
    }

    pub fn set_rating_diff_threshold(&mut self, threshold: f64) {
        if let TaskConfig::Incremental(IncrementalConfig::Windowed {
            rating_diff_threshold,
            ..
        }) = &mut self.config
        {
            *rating_diff_threshold = threshold;
        }
    }

    /// Check the form against the current task list and build the request.
    pub fn validate(&self, existing: &[SyncTask]) -> ClientResult<CreateTaskRequest> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation(
                "Task name must not be empty".to_string(),
            ));
        }

        if self.task_type == TaskType::Incremental {
            if existing.iter().any(|t| t.task_type == TaskType::Incremental) {
                return Err(ClientError::Validation(
                    "Only one incremental task may exist".to_string(),
                ));
            }
            if self.config.categories().is_empty() {
                return Err(ClientError::Validation(
                    "Select at least one category for an incremental task".to_string(),
                ));
            }
        }

        Ok(CreateTaskRequest {
            name: name.to_string(),
            task_type: self.task_type,
            category: self.category.clone(),
            config: self.config.clone(),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FullScanConfig, TaskStatus};
    use crate::test_utils::sample_task;

    #[test]
    fn test_empty_name_rejected() {
        let mut form = TaskForm::new();
        form.set_name("   ");
        let err = form.validate(&[]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_full_request_trims_name() {
        let mut form = TaskForm::new();
        form.set_name("  backfill ");
        form.set_category(Category::Western);
        form.set_start_gid(Some(2_900_000));

        let request = form.validate(&[]).unwrap();
        assert_eq!(request.name, "backfill");
        assert_eq!(request.category, TaskCategory::Single(Category::Western));
        assert_eq!(
            request.config,
            TaskConfig::Full(FullScanConfig {
                start_gid: Some(2_900_000)
            })
        );
    }

    #[test]
    fn test_type_switch_resets_config_and_category() {
        let mut form = TaskForm::new();
        form.set_category(Category::Manga);
        form.set_start_gid(Some(5));

        form.set_type(TaskType::Incremental);
        assert_eq!(form.category(), &TaskCategory::Mixed);
        assert_eq!(form.config(), &TaskConfig::default_for(TaskType::Incremental));

        form.set_type(TaskType::Full);
        assert_eq!(form.category(), &TaskCategory::Single(Category::Cosplay));
        assert_eq!(form.config(), &TaskConfig::default_for(TaskType::Full));
    }

    #[test]
    fn test_full_type_keeps_fixed_category() {
        let mut form = TaskForm::new();
        form.set_category(Category::GameCg);
        form.set_type(TaskType::Full);
        assert_eq!(form.category(), &TaskCategory::Single(Category::GameCg));
    }

    #[test]
    fn test_toggle_categories() {
        let mut form = TaskForm::new();
        form.set_type(TaskType::Incremental);
        form.toggle_category(Category::Manga);
        form.toggle_category(Category::Western);

        assert_eq!(
            form.config().categories(),
            &[Category::Doujinshi, Category::Cosplay, Category::Western]
        );
    }

    #[test]
    fn test_incremental_needs_a_category() {
        let mut form = TaskForm::new();
        form.set_name("inc");
        form.set_type(TaskType::Incremental);
        for category in Category::incremental_defaults() {
            form.toggle_category(category);
        }

        let err = form.validate(&[]).unwrap_err();
        assert!(err.user_message().contains("at least one category"));
    }

    #[test]
    fn test_second_incremental_rejected() {
        let existing = vec![sample_task(
            1,
            "inc",
            TaskType::Incremental,
            TaskStatus::Completed,
            TaskStatus::Stopped,
        )];
        let mut form = TaskForm::new();
        form.set_name("inc-2");
        form.set_type(TaskType::Incremental);

        let err = form.validate(&existing).unwrap_err();
        assert!(err.user_message().contains("Only one incremental task"));

        form.set_type(TaskType::Full);
        assert!(form.validate(&existing).is_ok());
    }

    #[test]
    fn test_incremental_settings_are_sent() {
        let mut form = TaskForm::new();
        form.set_name("inc");
        form.set_type(TaskType::Incremental);
        form.set_scan_window(2_000);
        form.set_rating_diff_threshold(0.25);

        let request = form.validate(&[]).unwrap();
        assert_eq!(request.category, TaskCategory::Mixed);
        assert_eq!(request.config.scan_window(), Some(2_000));
        match request.config {
            TaskConfig::Incremental(cfg) => assert_eq!(cfg.rating_diff_threshold(), 0.25),
            other => panic!("unexpected config {:?}", other),
        }
    }
}
