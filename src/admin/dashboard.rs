use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use super::{
    format_task_category, ActionAvailability, DisplayStatus, ProgressView, TaskAction, TaskForm,
};
use crate::api::AdminApi;
use crate::error::{ClientError, ClientResult};
use crate::models::{SyncTask, ThumbQueueStats};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load dashboard data, check the service connection";

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Create {
        form: TaskForm,
        error: Option<String>,
    },
    /// Deleting asks for the task name to be typed back.
    Delete {
        task_id: i64,
        task_name: String,
        confirmation: String,
    },
}

impl Dialog {
    pub fn delete_confirmed(&self) -> bool {
        match self {
            Dialog::Delete {
                task_name,
                confirmation,
                ..
            } => confirmation.trim() == task_name,
            Dialog::Create { .. } => false,
        }
    }
}

#[derive(Debug, Default)]
struct DashboardState {
    tasks: Vec<SyncTask>,
    queue: ThumbQueueStats,
    loaded: bool,
    load_failed: bool,
    pending: HashMap<i64, TaskAction>,
    dialog: Option<Dialog>,
    auto_refresh: bool,
    banner: Option<String>,
}

impl DashboardState {
    /// Replace the cached task with the same id. Unknown ids are ignored.
    fn upsert(&mut self, task: SyncTask) {
        if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *slot = task;
        }
    }

    fn remove(&mut self, task_id: i64) {
        self.tasks.retain(|t| t.id != task_id);
    }
}

/// One rendered row of the task table.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub task: SyncTask,
    pub status: DisplayStatus,
    pub category: String,
    pub progress: ProgressView,
    pub actions: ActionAvailability,
    pub pending: Option<TaskAction>,
}

/// Point-in-time copy of the dashboard for rendering.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub rows: Vec<TaskRow>,
    pub queue: ThumbQueueStats,
    pub loaded: bool,
    pub load_failed: bool,
    pub auto_refresh: bool,
    pub polling: bool,
    pub banner: Option<String>,
    pub dialog: Option<Dialog>,
}

/// Task dashboard shared between user actions and the background poller.
///
/// Both writers replace cached tasks by id. The lock is never held across a
/// request.
#[derive(Clone)]
pub struct TaskDashboard {
    api: Arc<dyn AdminApi>,
    state: Arc<RwLock<DashboardState>>,
}

impl TaskDashboard {
    pub fn new(api: Arc<dyn AdminApi>, auto_refresh: bool) -> Self {
        let state = DashboardState {
            auto_refresh,
            ..DashboardState::default()
        };
        Self {
            api,
            state: Arc::new(RwLock::new(state)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, DashboardState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DashboardState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refetch tasks and queue counters. Returns false if either failed.
    pub async fn refresh(&self) -> bool {
        let (tasks, queue) = tokio::join!(self.api.list_tasks(), self.api.thumb_queue_stats());

        let mut state = self.write();
        let mut ok = true;
        match tasks {
            Ok(tasks) => {
                state.tasks = tasks;
                state.loaded = true;
            }
            Err(e) => {
                warn!("Failed to load tasks: {}", e);
                ok = false;
            }
        }
        match queue {
            Ok(queue) => state.queue = queue,
            Err(e) => {
                warn!("Failed to load thumbnail queue stats: {}", e);
                ok = false;
            }
        }
        state.load_failed = !ok;
        ok
    }

    /// Polling runs only while auto refresh is on and no dialog is open.
    pub fn should_poll(&self) -> bool {
        let state = self.read();
        state.auto_refresh && state.dialog.is_none()
    }

    pub fn set_auto_refresh(&self, enabled: bool) {
        self.write().auto_refresh = enabled;
    }

    pub fn toggle_auto_refresh(&self) -> bool {
        let mut state = self.write();
        state.auto_refresh = !state.auto_refresh;
        state.auto_refresh
    }

    pub fn tasks(&self) -> Vec<SyncTask> {
        self.read().tasks.clone()
    }

    pub fn banner(&self) -> Option<String> {
        self.read().banner.clone()
    }

    pub fn dismiss_banner(&self) {
        self.write().banner = None;
    }

    pub fn dialog(&self) -> Option<Dialog> {
        self.read().dialog.clone()
    }

    pub fn open_create(&self) {
        self.write().dialog = Some(Dialog::Create {
            form: TaskForm::new(),
            error: None,
        });
    }

    /// Edit the open create form. Returns false when no create dialog is open.
    pub fn update_form(&self, edit: impl FnOnce(&mut TaskForm)) -> bool {
        match &mut self.write().dialog {
            Some(Dialog::Create { form, .. }) => {
                edit(form);
                true
            }
            _ => false,
        }
    }

    /// Open the delete dialog for a cached task.
    pub fn open_delete(&self, task_id: i64) -> bool {
        let mut state = self.write();
        let Some(task) = state.tasks.iter().find(|t| t.id == task_id) else {
            return false;
        };
        let task_name = task.name.clone();
        state.dialog = Some(Dialog::Delete {
            task_id,
            task_name,
            confirmation: String::new(),
        });
        true
    }

    pub fn set_delete_confirmation(&self, text: &str) {
        if let Some(Dialog::Delete { confirmation, .. }) = &mut self.write().dialog {
            *confirmation = text.to_string();
        }
    }

    pub fn close_dialog(&self) {
        self.write().dialog = None;
    }

    /// Validate and submit the create dialog. On success the dialog closes
    /// and the list is refetched; on failure the error stays in the dialog.
    pub async fn submit_create(&self) -> ClientResult<SyncTask> {
        let request = {
            let mut state = self.write();
            let tasks = state.tasks.clone();
            let Some(Dialog::Create { form, error }) = &mut state.dialog else {
                return Err(ClientError::Validation("No create dialog is open".to_string()));
            };
            *error = None;
            match form.validate(&tasks) {
                Ok(request) => request,
                Err(e) => {
                    *error = Some(e.user_message());
                    return Err(e);
                }
            }
        };

        match self.api.create_task(&request).await {
            Ok(task) => {
                info!("Created task {} ({})", task.name, task.id);
                self.close_dialog();
                self.refresh().await;
                Ok(task)
            }
            Err(e) => {
                if let Some(Dialog::Create { error, .. }) = &mut self.write().dialog {
                    *error = Some(e.user_message());
                }
                Err(e)
            }
        }
    }

    /// Delete the task of the open delete dialog once its name was typed back.
    pub async fn confirm_delete(&self) -> ClientResult<()> {
        let task_id = match self.dialog() {
            Some(dialog @ Dialog::Delete { .. }) if !dialog.delete_confirmed() => {
                return Err(ClientError::Validation(
                    "Type the task name to confirm deletion".to_string(),
                ));
            }
            Some(Dialog::Delete { task_id, .. }) => task_id,
            _ => {
                return Err(ClientError::Validation("No delete dialog is open".to_string()));
            }
        };

        self.run_action(task_id, TaskAction::Delete).await?;
        self.close_dialog();
        Ok(())
    }

    /// Run a lifecycle action: mark the row busy, call the service, patch
    /// the cache with the returned task, then refetch. Failures go to the
    /// banner.
    pub async fn run_action(&self, task_id: i64, action: TaskAction) -> ClientResult<()> {
        {
            let mut state = self.write();
            state.banner = None;
            if state.pending.contains_key(&task_id) {
                return Err(ClientError::Conflict(format!(
                    "A request for task {} is already in flight",
                    task_id
                )));
            }
            if let Some(task) = state.tasks.iter().find(|t| t.id == task_id) {
                if !ActionAvailability::of(task, false).allows(action) {
                    let message = format!(
                        "Cannot {} task '{}' while it is {}",
                        action,
                        task.name,
                        DisplayStatus::of(task)
                    );
                    state.banner = Some(message.clone());
                    return Err(ClientError::Conflict(message));
                }
            }
            state.pending.insert(task_id, action);
        }

        let result = match action {
            TaskAction::Start => self.api.start_task(task_id).await,
            TaskAction::Stop => self.api.stop_task(task_id).await,
            TaskAction::Delete => self.api.delete_task(task_id).await.map(|_| None),
        };

        let outcome = match result {
            Ok(updated) => {
                {
                    let mut state = self.write();
                    if let Some(task) = updated {
                        state.upsert(task);
                    }
                    if action == TaskAction::Delete {
                        state.remove(task_id);
                    }
                }
                debug!("Task {} {} accepted", task_id, action);
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                warn!("Task {} {} failed: {}", task_id, action, e);
                self.write().banner = Some(e.user_message());
                Err(e)
            }
        };

        self.write().pending.remove(&task_id);
        outcome
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let state = self.read();
        let rows = state
            .tasks
            .iter()
            .map(|task| {
                let pending = state.pending.get(&task.id).copied();
                TaskRow {
                    task: task.clone(),
                    status: DisplayStatus::of(task),
                    category: format_task_category(task),
                    progress: ProgressView::of(task),
                    actions: ActionAvailability::of(task, pending.is_some()),
                    pending,
                }
            })
            .collect();

        DashboardSnapshot {
            rows,
            queue: state.queue,
            loaded: state.loaded,
            load_failed: state.load_failed,
            auto_refresh: state.auto_refresh,
            polling: state.auto_refresh && state.dialog.is_none(),
            banner: state.banner.clone(),
            dialog: state.dialog.clone(),
        }
    }
}
