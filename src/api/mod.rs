mod admin;
mod galleries;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use crate::logging::{log_error, log_exchange};
use crate::models::{
    CreateTaskRequest, Gallery, GalleryList, GalleryQuery, Stats, SyncTask, ThumbQueueStats,
    UpdateTaskRequest,
};

/// Read side of the service: listings, stats and thumbnails.
#[async_trait]
pub trait GalleryApi: Send + Sync {
    async fn list_galleries(&self, query: &GalleryQuery) -> ClientResult<GalleryList>;

    async fn get_gallery(&self, gid: i64) -> ClientResult<Gallery>;

    async fn stats(&self) -> ClientResult<Stats>;

    async fn thumbnail(&self, gid: i64) -> ClientResult<Thumbnail>;
}

/// Sync task administration and thumbnail queue counters.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn list_tasks(&self) -> ClientResult<Vec<SyncTask>>;

    async fn get_task(&self, task_id: i64) -> ClientResult<SyncTask>;

    async fn create_task(&self, payload: &CreateTaskRequest) -> ClientResult<SyncTask>;

    async fn patch_task(&self, task_id: i64, patch: &UpdateTaskRequest) -> ClientResult<SyncTask>;

    /// Request a start. `None` when the service answers `204 No Content`.
    async fn start_task(&self, task_id: i64) -> ClientResult<Option<SyncTask>>;

    /// Request a stop. `None` when the service answers `204 No Content`.
    async fn stop_task(&self, task_id: i64) -> ClientResult<Option<SyncTask>>;

    /// Deletes the task. The service answers `204 No Content`.
    async fn delete_task(&self, task_id: i64) -> ClientResult<()>;

    async fn thumb_queue_stats(&self) -> ClientResult<ThumbQueueStats>;
}

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub gid: i64,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Thumbnail {
    /// File extension for the payload, derived from its content type.
    pub fn extension(&self) -> &'static str {
        let essence = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .unwrap_or("");

        match mime_guess::get_mime_extensions_str(essence) {
            Some(exts) if exts.contains(&"jpg") => "jpg",
            Some(exts) if !exts.is_empty() => exts[0],
            _ => "jpg",
        }
    }

    pub async fn save_to(&self, dir: &Path) -> ClientResult<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}.{}", self.gid, self.extension()));
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

/// HTTP client for the gallery service and its admin API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    gallery_prefix: Arc<str>,
    admin_prefix: Arc<str>,
}

fn normalize_prefix(prefix: &str) -> Arc<str> {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        Arc::from(trimmed)
    } else {
        Arc::from(format!("/{}", trimmed))
    }
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a client around an existing reqwest client.
    pub fn with_client(client: Client, config: &ApiConfig) -> Self {
        let base_url = config.base_url.trim().trim_end_matches('/');
        Self {
            client,
            base_url: Arc::from(base_url),
            gallery_prefix: normalize_prefix(&config.gallery_prefix),
            admin_prefix: normalize_prefix(&config.admin_prefix),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn gallery_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.gallery_prefix, path)
    }

    pub(crate) fn admin_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.admin_prefix, path)
    }

    /// Thumbnail location for a gallery, as served by the gallery API.
    pub fn thumbnail_url(&self, gid: i64) -> String {
        self.gallery_url(&format!("/thumbs/{}", gid))
    }

    /// Execute a request. Any non-2xx answer becomes `ClientError::Api`
    /// carrying the body text.
    pub(crate) async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        let request = request.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let start = Instant::now();
        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                log_error(&format!("{} {}", method, path), &e);
                return Err(e.into());
            }
        };
        let status = response.status();
        log_exchange(&method, &path, status.as_u16(), start.elapsed());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &body));
        }

        Ok(response)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ClientResult<T> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Like `send_json`, but a `204` or an empty body yields `None`.
    pub(crate) async fn send_optional_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ClientResult<Option<T>> {
        let response = self.send(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }
}
