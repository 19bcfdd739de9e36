#![cfg(test)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::{AdminApi, ApiClient};
use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    Category, CreateTaskRequest, Gallery, SyncTask, TagMap, TaskCategory, TaskConfig, TaskState,
    TaskStatus, TaskType, ThumbQueueStats, UpdateTaskRequest,
};

/// Fake JPEG payload served for every gallery with a thumbnail.
pub const THUMB_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

/// Contents of the mock service.
#[derive(Debug, Clone, Default)]
pub struct MockState {
    pub galleries: Vec<Gallery>,
    pub tasks: Vec<SyncTask>,
    pub queue: ThumbQueueStats,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
}

struct Shared {
    state: Mutex<MockState>,
    requests: Mutex<Vec<RecordedRequest>>,
    fail_next: Mutex<Option<(u16, String)>>,
}

type SharedState = Arc<Shared>;

pub struct MockServer {
    pub base_url: String,
    shared: SharedState,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            ..ApiConfig::default()
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.api_config()).expect("Failed to build API client")
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.requests.lock().unwrap().clone()
    }

    /// Requests whose path starts with `prefix`.
    /// Answer the next request with `status` and `body` instead of routing it.
    pub fn fail_next(&self, status: u16, body: &str) {
        *self.shared.fail_next.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn tasks(&self) -> Vec<SyncTask> {
        self.shared.state.lock().unwrap().tasks.clone()
    }

    /// Simulate the scheduler catching up with (or drifting from) the
    /// desired status.
    pub fn set_task_status(&self, task_id: i64, status: TaskStatus) {
        let mut state = self.shared.state.lock().unwrap();
        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == task_id) {
            task.status = status;
        }
    }

    pub fn set_queue(&self, queue: ThumbQueueStats) {
        self.shared.state.lock().unwrap().queue = queue;
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve the mock REST service on an ephemeral localhost port.
pub async fn spawn_mock_service(state: MockState) -> MockServer {
    let shared = Arc::new(Shared {
        state: Mutex::new(state),
        requests: Mutex::new(Vec::new()),
        fail_next: Mutex::new(None),
    });

    let app = mock_router(shared.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock service");
    let addr = listener.local_addr().expect("Failed to read local address");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    MockServer {
        base_url: format!("http://{}", addr),
        shared,
        handle,
    }
}

fn mock_router(shared: SharedState) -> Router {
    let gallery_routes = Router::new()
        .route("/galleries", get(list_galleries))
        .route("/galleries/:gid", get(get_gallery))
        .route("/stats", get(get_stats))
        .route("/thumbs/:gid", get(get_thumb));

    let admin_routes = Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).patch(patch_task).delete(delete_task),
        )
        .route("/tasks/:id/start", post(start_task))
        .route("/tasks/:id/stop", post(stop_task))
        .route("/thumb-queue/stats", get(queue_stats));

    Router::new()
        .nest("/v1", gallery_routes)
        .nest("/api/v1/admin", admin_routes)
        .layer(middleware::from_fn_with_state(shared.clone(), record_request))
        .with_state(shared)
}

/// Records every request and applies a pending injected failure.
async fn record_request(State(shared): State<SharedState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();
    let payload = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice::<Value>(&bytes).ok()
    };

    shared.requests.lock().unwrap().push(RecordedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        body: payload,
    });

    let injected = shared.fail_next.lock().unwrap().take();
    if let Some((status, text)) = injected {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, text).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<u32>,
    page_size: Option<u32>,
    sort: Option<String>,
    category: Option<String>,
    tag: Option<String>,
    min_fav: Option<i64>,
    language: Option<String>,
}

fn matches_tag(gallery: &Gallery, tag: &str) -> bool {
    let tag = tag.replace('：', ":");
    match tag.split_once(':') {
        Some((ns, value)) => gallery
            .tags
            .get(ns.trim())
            .is_some_and(|values| values.iter().any(|v| v == value.trim())),
        None => gallery
            .tags
            .values()
            .any(|values| values.iter().any(|v| v == tag.trim())),
    }
}

async fn list_galleries(
    State(shared): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Response {
    let state = shared.state.lock().unwrap();
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(24).max(1);

    let mut matching: Vec<&Gallery> = state
        .galleries
        .iter()
        .filter(|g| {
            params.category.as_deref().map_or(true, |c| {
                g.category
                    .as_deref()
                    .is_some_and(|gc| gc.eq_ignore_ascii_case(c))
            })
        })
        .filter(|g| params.tag.as_deref().map_or(true, |t| matches_tag(g, t)))
        .filter(|g| {
            params
                .min_fav
                .map_or(true, |min| g.fav_count.unwrap_or(0) >= min)
        })
        .filter(|g| {
            params
                .language
                .as_deref()
                .map_or(true, |l| g.language.as_deref() == Some(l))
        })
        .collect();

    match params.sort.as_deref() {
        Some("gid_asc") => matching.sort_by_key(|g| g.gid),
        _ => matching.sort_by_key(|g| std::cmp::Reverse(g.gid)),
    }

    let total = matching.len();
    let pages = total.div_ceil(page_size as usize);
    let items: Vec<&Gallery> = matching
        .into_iter()
        .skip((page as usize - 1) * page_size as usize)
        .take(page_size as usize)
        .collect();

    Json(json!({
        "items": items,
        "total": total,
        "page": page,
        "size": page_size,
        "pages": pages,
    }))
    .into_response()
}

async fn get_gallery(State(shared): State<SharedState>, Path(gid): Path<i64>) -> Response {
    let state = shared.state.lock().unwrap();
    match state.galleries.iter().find(|g| g.gid == gid) {
        Some(gallery) => Json(gallery).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Gallery not found"),
    }
}

async fn get_stats(State(shared): State<SharedState>) -> Response {
    let state = shared.state.lock().unwrap();
    let mut by_category: IndexMap<String, i64> = IndexMap::new();
    for gallery in &state.galleries {
        if let Some(category) = &gallery.category {
            *by_category.entry(category.clone()).or_insert(0) += 1;
        }
    }

    Json(json!({
        "total_galleries": state.galleries.len(),
        "by_category": by_category,
        "last_synced_at": null,
        "queue_status": {},
    }))
    .into_response()
}

async fn get_thumb(State(shared): State<SharedState>, Path(gid): Path<i64>) -> Response {
    let state = shared.state.lock().unwrap();
    match state.galleries.iter().find(|g| g.gid == gid) {
        Some(gallery) if gallery.has_thumbnail() => {
            ([(header::CONTENT_TYPE, "image/jpeg")], THUMB_BYTES).into_response()
        }
        _ => detail(StatusCode::NOT_FOUND, "Thumbnail not found"),
    }
}

async fn list_tasks(State(shared): State<SharedState>) -> Response {
    let state = shared.state.lock().unwrap();
    Json(&state.tasks).into_response()
}

async fn get_task(State(shared): State<SharedState>, Path(id): Path<i64>) -> Response {
    let state = shared.state.lock().unwrap();
    match state.tasks.iter().find(|t| t.id == id) {
        Some(task) => Json(task).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Task not found"),
    }
}

async fn create_task(State(shared): State<SharedState>, Json(payload): Json<Value>) -> Response {
    let name = payload["name"].as_str().unwrap_or("").trim().to_string();
    let task_type = match payload["type"].as_str().and_then(|t| t.parse::<TaskType>().ok()) {
        Some(task_type) => task_type,
        None => return detail(StatusCode::UNPROCESSABLE_ENTITY, "Invalid task type"),
    };
    if name.is_empty() {
        return detail(StatusCode::UNPROCESSABLE_ENTITY, "Task name is required");
    }

    let mut state = shared.state.lock().unwrap();
    if state.tasks.iter().any(|t| t.name == name) {
        return detail(StatusCode::CONFLICT, "Task name already exists");
    }
    if task_type == TaskType::Incremental
        && state.tasks.iter().any(|t| t.task_type == TaskType::Incremental)
    {
        return detail(StatusCode::CONFLICT, "Only one incremental task is allowed");
    }

    let category = match task_type {
        TaskType::Incremental => TaskCategory::Mixed,
        TaskType::Full => TaskCategory::from(payload["category"].as_str().unwrap_or("").to_string()),
    };
    let config = TaskConfig::from_wire(task_type, payload["config"].clone());
    let id = state.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;

    let mut task = sample_task(id, &name, task_type, TaskStatus::Stopped, TaskStatus::Stopped);
    task.category = category;
    task.config = config;
    task.state = TaskState::default();
    task.progress_pct = 0.0;
    state.tasks.push(task.clone());

    (StatusCode::CREATED, Json(task)).into_response()
}

async fn patch_task(
    State(shared): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Response {
    let mut state = shared.state.lock().unwrap();

    if let Some(name) = payload["name"].as_str() {
        if state.tasks.iter().any(|t| t.id != id && t.name == name) {
            return detail(StatusCode::CONFLICT, "Task name already exists");
        }
    }

    let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
        return detail(StatusCode::NOT_FOUND, "Task not found");
    };

    if let Some(name) = payload["name"].as_str() {
        task.name = name.to_string();
    }
    if let Some(patch) = payload["config"].as_object() {
        let mut merged: Map<String, Value> = task.config.to_wire().as_object().cloned().unwrap_or_default();
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        task.config = TaskConfig::from_wire(task.task_type, Value::Object(merged));
    }

    Json(task.clone()).into_response()
}

async fn start_task(State(shared): State<SharedState>, Path(id): Path<i64>) -> Response {
    let mut state = shared.state.lock().unwrap();
    let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
        return detail(StatusCode::NOT_FOUND, "Task not found");
    };

    if task.status == TaskStatus::Completed {
        return detail(StatusCode::CONFLICT, "Task already completed");
    }
    if task.desired_status == TaskStatus::Running {
        return Json(task.clone()).into_response();
    }
    if task.status == TaskStatus::Running {
        return detail(StatusCode::CONFLICT, "Task is stopping");
    }

    task.desired_status = TaskStatus::Running;
    Json(task.clone()).into_response()
}

async fn stop_task(State(shared): State<SharedState>, Path(id): Path<i64>) -> Response {
    let mut state = shared.state.lock().unwrap();
    let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
        return detail(StatusCode::NOT_FOUND, "Task not found");
    };

    if task.desired_status == TaskStatus::Stopped {
        return Json(task.clone()).into_response();
    }
    if task.status != TaskStatus::Running {
        return detail(StatusCode::CONFLICT, "Task is starting");
    }

    task.desired_status = TaskStatus::Stopped;
    Json(task.clone()).into_response()
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    #[serde(default)]
    confirm: bool,
}

async fn delete_task(
    State(shared): State<SharedState>,
    Path(id): Path<i64>,
    Query(params): Query<DeleteParams>,
) -> Response {
    if !params.confirm {
        return detail(StatusCode::BAD_REQUEST, "Deletion requires confirm=true");
    }

    let mut state = shared.state.lock().unwrap();
    let Some(index) = state.tasks.iter().position(|t| t.id == id) else {
        return detail(StatusCode::NOT_FOUND, "Task not found");
    };

    let task = &state.tasks[index];
    if task.status == TaskStatus::Running || task.desired_status == TaskStatus::Running {
        return detail(StatusCode::CONFLICT, "Stop the task before deleting it");
    }

    state.tasks.remove(index);
    StatusCode::NO_CONTENT.into_response()
}

async fn queue_stats(State(shared): State<SharedState>) -> Response {
    let state = shared.state.lock().unwrap();
    Json(state.queue).into_response()
}

/// Test fixture: a gallery with a thumbnail and the given tags.
pub fn sample_gallery(
    gid: i64,
    category: &str,
    rating: f64,
    fav_count: i64,
    tags: &[(&str, &str)],
) -> Gallery {
    let mut tag_map = TagMap::new();
    for (ns, value) in tags {
        tag_map
            .entry(ns.to_string())
            .or_default()
            .push(value.to_string());
    }
    let language = tag_map
        .get("language")
        .and_then(|values| values.first())
        .cloned();

    Gallery {
        gid,
        token: format!("{:010x}", gid * 7919),
        category: Some(category.to_string()),
        title: Some(format!("Gallery {}", gid)),
        title_jpn: None,
        uploader: Some("uploader".to_string()),
        posted_at: Utc.timestamp_opt(1_700_000_000 + gid * 3600, 0).single(),
        language,
        pages: Some(24),
        rating: Some(rating),
        fav_count: Some(fav_count),
        comment_count: Some(gid % 7),
        thumb: Some(format!("thumbs/{}.jpg", gid)),
        tags: tag_map,
        last_synced_at: None,
        is_active: true,
    }
}

/// Test fixture: a task with type-default config and some progress.
pub fn sample_task(
    id: i64,
    name: &str,
    task_type: TaskType,
    status: TaskStatus,
    desired_status: TaskStatus,
) -> SyncTask {
    let (category, state) = match task_type {
        TaskType::Full => (
            TaskCategory::Single(Category::Cosplay),
            TaskState {
                total_count: Some(1_000),
                db_count: Some(250),
                ..TaskState::default()
            },
        ),
        TaskType::Incremental => (
            TaskCategory::Mixed,
            TaskState {
                scanned_count: Some(2_500),
                ..TaskState::default()
            },
        ),
    };

    SyncTask {
        id,
        name: name.to_string(),
        task_type,
        category,
        status,
        desired_status,
        config: TaskConfig::default_for(task_type),
        state,
        progress_pct: 25.0,
        created_at: Utc.timestamp_opt(1_700_000_000, 0).single(),
        updated_at: None,
        last_run_at: None,
        error_message: None,
    }
}

/// In-memory `AdminApi` for tests that need a paused clock.
#[derive(Default)]
pub struct FakeAdminApi {
    tasks: Mutex<Vec<SyncTask>>,
    queue: Mutex<ThumbQueueStats>,
    fail_next: Mutex<Option<(u16, String)>>,
    delay: Mutex<Option<Duration>>,
    list_calls: AtomicUsize,
    calls: Mutex<Vec<String>>,
    no_content: AtomicBool,
}

impl FakeAdminApi {
    pub fn with_tasks(tasks: Vec<SyncTask>) -> Self {
        let api = Self::default();
        *api.tasks.lock().unwrap() = tasks;
        api
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Names of the calls made so far, e.g. `start:3`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_next(&self, status: u16, body: &str) {
        *self.fail_next.lock().unwrap() = Some((status, body.to_string()));
    }

    /// Make every call sleep first, so callers can observe in-flight state.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn set_queue(&self, queue: ThumbQueueStats) {
        *self.queue.lock().unwrap() = queue;
    }

    pub fn set_tasks(&self, tasks: Vec<SyncTask>) {
        *self.tasks.lock().unwrap() = tasks;
    }

    /// Answer start and stop like a `204 No Content`: applied, no task body.
    pub fn set_no_content(&self, enabled: bool) {
        self.no_content.store(enabled, Ordering::SeqCst);
    }

    fn lifecycle_reply(&self, task: SyncTask) -> Option<SyncTask> {
        (!self.no_content.load(Ordering::SeqCst)).then_some(task)
    }

    async fn enter(&self, call: String) -> ClientResult<()> {
        self.calls.lock().unwrap().push(call);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_next.lock().unwrap().take() {
            Some((status, body)) => Err(ClientError::from_response(status, &body)),
            None => Ok(()),
        }
    }

    fn update(&self, task_id: i64, f: impl FnOnce(&mut SyncTask)) -> ClientResult<SyncTask> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| ClientError::from_response(404, "Task not found"))?;
        f(task);
        Ok(task.clone())
    }
}

#[async_trait]
impl AdminApi for FakeAdminApi {
    async fn list_tasks(&self) -> ClientResult<Vec<SyncTask>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.enter("list".to_string()).await?;
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn get_task(&self, task_id: i64) -> ClientResult<SyncTask> {
        self.enter(format!("get:{}", task_id)).await?;
        self.update(task_id, |_| {})
    }

    async fn create_task(&self, payload: &CreateTaskRequest) -> ClientResult<SyncTask> {
        self.enter(format!("create:{}", payload.name)).await?;
        let mut tasks = self.tasks.lock().unwrap();
        let id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let mut task = sample_task(
            id,
            &payload.name,
            payload.task_type,
            TaskStatus::Stopped,
            TaskStatus::Stopped,
        );
        task.category = payload.category.clone();
        task.config = payload.config.clone();
        tasks.push(task.clone());
        Ok(task)
    }

    async fn patch_task(&self, task_id: i64, patch: &UpdateTaskRequest) -> ClientResult<SyncTask> {
        self.enter(format!("patch:{}", task_id)).await?;
        self.update(task_id, |task| {
            if let Some(name) = &patch.name {
                task.name = name.clone();
            }
        })
    }

    async fn start_task(&self, task_id: i64) -> ClientResult<Option<SyncTask>> {
        self.enter(format!("start:{}", task_id)).await?;
        let task = self.update(task_id, |task| task.desired_status = TaskStatus::Running)?;
        Ok(self.lifecycle_reply(task))
    }

    async fn stop_task(&self, task_id: i64) -> ClientResult<Option<SyncTask>> {
        self.enter(format!("stop:{}", task_id)).await?;
        let task = self.update(task_id, |task| task.desired_status = TaskStatus::Stopped)?;
        Ok(self.lifecycle_reply(task))
    }

    async fn delete_task(&self, task_id: i64) -> ClientResult<()> {
        self.enter(format!("delete:{}", task_id)).await?;
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        if tasks.len() == before {
            return Err(ClientError::from_response(404, "Task not found"));
        }
        Ok(())
    }

    async fn thumb_queue_stats(&self) -> ClientResult<ThumbQueueStats> {
        self.enter("queue".to_string()).await?;
        Ok(*self.queue.lock().unwrap())
    }
}
