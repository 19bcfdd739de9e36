//! Tag translation dictionary.
//!
//! The dictionary is a JSON array of `{"k": "english value", "v": "译名；别名"}`
//! entries. It is fetched at most once per cache: concurrent callers share the
//! in-flight request, and a failed load may be retried.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::TranslationConfig;
use crate::constants::TRANSLATION_TERM_SEPARATOR;
use crate::error::{ClientError, ClientResult};

pub type Dictionary = HashMap<String, String>;

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationEntry {
    #[serde(default)]
    pub k: Option<String>,
    #[serde(default)]
    pub v: Option<String>,
}

/// Where the dictionary comes from.
#[async_trait]
pub trait TranslationSource: Send + Sync {
    async fn fetch(&self) -> ClientResult<Vec<TranslationEntry>>;
}

pub struct HttpTranslationSource {
    client: Client,
    url: String,
}

impl HttpTranslationSource {
    pub fn new(config: &TranslationConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl TranslationSource for HttpTranslationSource {
    async fn fetch(&self) -> ClientResult<Vec<TranslationEntry>> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_response(status.as_u16(), &body));
        }
        Ok(response.json().await?)
    }
}

/// Entries without a key are skipped; a missing value maps the key to itself.
pub fn build_dictionary(entries: Vec<TranslationEntry>) -> Dictionary {
    entries
        .into_iter()
        .filter_map(|entry| {
            let key = entry.k.filter(|k| !k.is_empty())?;
            let value = entry.v.unwrap_or_else(|| key.clone());
            Some((key, value))
        })
        .collect()
}

/// First term of a `；`-separated translation, or the raw text if that term
/// is blank.
pub fn first_term(raw: &str) -> &str {
    let term = raw
        .split(TRANSLATION_TERM_SEPARATOR)
        .next()
        .unwrap_or("")
        .trim();
    if term.is_empty() {
        raw
    } else {
        term
    }
}

type LoadFuture = Shared<BoxFuture<'static, Result<Arc<Dictionary>, String>>>;

enum LoadState {
    Uninitialized,
    Loading(LoadFuture),
    Ready(Arc<Dictionary>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Uninitialized,
    Loading,
    Ready,
    /// The last load failed; the next `load` retries.
    Failed(String),
}

pub struct TagTranslationCache {
    source: Arc<dyn TranslationSource>,
    state: Mutex<LoadState>,
}

impl TagTranslationCache {
    pub fn new(source: Arc<dyn TranslationSource>) -> Self {
        Self {
            source,
            state: Mutex::new(LoadState::Uninitialized),
        }
    }

    pub fn status(&self) -> CacheStatus {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            LoadState::Uninitialized => CacheStatus::Uninitialized,
            LoadState::Loading(_) => CacheStatus::Loading,
            LoadState::Ready(_) => CacheStatus::Ready,
            LoadState::Failed(reason) => CacheStatus::Failed(reason.clone()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == CacheStatus::Ready
    }

    /// Load the dictionary, joining a load already in flight.
    pub async fn load(&self) -> ClientResult<Arc<Dictionary>> {
        let pending = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match &*state {
                LoadState::Ready(dict) => return Ok(dict.clone()),
                LoadState::Loading(pending) => pending.clone(),
                LoadState::Uninitialized | LoadState::Failed(_) => {
                    let source = self.source.clone();
                    let pending = async move {
                        source
                            .fetch()
                            .await
                            .map(|entries| Arc::new(build_dictionary(entries)))
                            .map_err(|e| e.user_message())
                    }
                    .boxed()
                    .shared();
                    *state = LoadState::Loading(pending.clone());
                    pending
                }
            }
        };

        let result = pending.await;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &result {
            Ok(dict) => {
                if !matches!(&*state, LoadState::Ready(_)) {
                    info!("Loaded {} tag translations", dict.len());
                    *state = LoadState::Ready(dict.clone());
                }
            }
            Err(reason) => {
                if matches!(&*state, LoadState::Loading(_)) {
                    warn!("Failed to load tag translations: {}", reason);
                    *state = LoadState::Failed(reason.clone());
                }
            }
        }
        result.map_err(ClientError::Translation)
    }

    /// Translation of a tag value, if the dictionary is loaded and knows it.
    pub fn translate(&self, value: &str) -> Option<String> {
        if value.is_empty() {
            return None;
        }
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            LoadState::Ready(dict) => dict
                .get(value)
                .filter(|raw| !raw.is_empty())
                .map(|raw| first_term(raw).to_string()),
            _ => None,
        }
    }
}
