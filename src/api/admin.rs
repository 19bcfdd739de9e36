use async_trait::async_trait;

use super::{AdminApi, ApiClient};
use crate::error::ClientResult;
use crate::models::{CreateTaskRequest, SyncTask, ThumbQueueStats, UpdateTaskRequest};

impl ApiClient {
    fn task_url(&self, task_id: i64, action: Option<&str>) -> String {
        match action {
            Some(action) => self.admin_url(&format!("/tasks/{}/{}", task_id, action)),
            None => self.admin_url(&format!("/tasks/{}", task_id)),
        }
    }

    async fn lifecycle(&self, task_id: i64, action: &str) -> ClientResult<Option<SyncTask>> {
        let request = self.client().post(self.task_url(task_id, Some(action)));
        self.send_optional_json(request).await
    }
}

#[async_trait]
impl AdminApi for ApiClient {
    async fn list_tasks(&self) -> ClientResult<Vec<SyncTask>> {
        let request = self.client().get(self.admin_url("/tasks"));
        Ok(self.send_optional_json(request).await?.unwrap_or_default())
    }

    async fn get_task(&self, task_id: i64) -> ClientResult<SyncTask> {
        let request = self.client().get(self.task_url(task_id, None));
        self.send_json(request).await
    }

    async fn create_task(&self, payload: &CreateTaskRequest) -> ClientResult<SyncTask> {
        let request = self.client().post(self.admin_url("/tasks")).json(payload);
        self.send_json(request).await
    }

    async fn patch_task(&self, task_id: i64, patch: &UpdateTaskRequest) -> ClientResult<SyncTask> {
        let request = self
            .client()
            .patch(self.task_url(task_id, None))
            .json(patch);
        self.send_json(request).await
    }

    async fn start_task(&self, task_id: i64) -> ClientResult<Option<SyncTask>> {
        self.lifecycle(task_id, "start").await
    }

    async fn stop_task(&self, task_id: i64) -> ClientResult<Option<SyncTask>> {
        self.lifecycle(task_id, "stop").await
    }

    async fn delete_task(&self, task_id: i64) -> ClientResult<()> {
        let request = self
            .client()
            .delete(self.task_url(task_id, None))
            .query(&[("confirm", "true")]);
        self.send(request).await?;
        Ok(())
    }

    async fn thumb_queue_stats(&self) -> ClientResult<ThumbQueueStats> {
        let request = self.client().get(self.admin_url("/thumb-queue/stats"));
        self.send_json(request).await
    }
}
