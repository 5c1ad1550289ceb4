use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use modelcanvas_graph::{GraphModel, Relationship};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PersistenceError;

/// Persistence for the canvas model.
///
/// The canvas core only ever talks to the backend through this trait, so the
/// in-memory, file and HTTP stores are interchangeable.
#[async_trait]
pub trait DataModelStore: Send + Sync {
    /// `None` when nothing has been persisted yet.
    async fn load(&self) -> Result<Option<GraphModel>, PersistenceError>;
    async fn save(&self, model: &GraphModel) -> Result<(), PersistenceError>;
    /// Relationships suggested by the backend. An error means "nothing to import".
    async fn infer_relationships(&self) -> Result<Vec<Relationship>, PersistenceError>;
}

// ── In-memory ──

#[derive(Default)]
pub struct MemoryStore {
    model: Mutex<Option<GraphModel>>,
    saves: Mutex<Vec<GraphModel>>,
    inferred: Mutex<Vec<Relationship>>,
    failing_saves: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: GraphModel) -> Self {
        Self {
            model: Mutex::new(Some(model)),
            ..Self::default()
        }
    }

    pub fn with_inferred(self, relationships: Vec<Relationship>) -> Self {
        *self.inferred.lock() = relationships;
        self
    }

    /// Every save sleeps this long before completing.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The next `count` saves fail with [`PersistenceError::Rejected`].
    pub fn fail_next_saves(&self, count: usize) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }

    pub fn current(&self) -> Option<GraphModel> {
        self.model.lock().clone()
    }

    /// Every successfully saved model, oldest first.
    pub fn saves(&self) -> Vec<GraphModel> {
        self.saves.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().len()
    }
}

#[async_trait]
impl DataModelStore for MemoryStore {
    async fn load(&self) -> Result<Option<GraphModel>, PersistenceError> {
        Ok(self.current())
    }

    async fn save(&self, model: &GraphModel) -> Result<(), PersistenceError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let failing = self
            .failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
        if failing.is_ok() {
            return Err(PersistenceError::Rejected("scripted save failure".to_string()));
        }
        *self.model.lock() = Some(model.clone());
        self.saves.lock().push(model.clone());
        Ok(())
    }

    async fn infer_relationships(&self) -> Result<Vec<Relationship>, PersistenceError> {
        Ok(self.inferred.lock().clone())
    }
}

// ── Files ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// YAML for `.yaml`/`.yml`, JSON for everything else.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }

    fn decode<T: DeserializeOwned>(self, text: &str) -> Result<T, PersistenceError> {
        Ok(match self {
            Self::Json => serde_json::from_str(text)?,
            Self::Yaml => serde_yaml::from_str(text)?,
        })
    }

    fn encode<T: Serialize>(self, value: &T) -> Result<String, PersistenceError> {
        Ok(match self {
            Self::Json => serde_json::to_string_pretty(value)?,
            Self::Yaml => serde_yaml::to_string(value)?,
        })
    }
}

/// Model stored in a single JSON or YAML file, with an optional sidecar file
/// listing inferred relationships.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    format: FileFormat,
    relationships: Option<PathBuf>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            format: FileFormat::from_path(&path),
            path,
            relationships: None,
        }
    }

    pub fn with_relationships(mut self, path: impl Into<PathBuf>) -> Self {
        self.relationships = Some(path.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, PersistenceError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(PersistenceError::io(path, err)),
    }
}

#[async_trait]
impl DataModelStore for FileStore {
    async fn load(&self) -> Result<Option<GraphModel>, PersistenceError> {
        match read_optional(&self.path).await? {
            Some(text) => self.format.decode(&text).map(Some),
            None => {
                debug!(path = %self.path.display(), "no model file yet");
                Ok(None)
            }
        }
    }

    async fn save(&self, model: &GraphModel) -> Result<(), PersistenceError> {
        let text = self.format.encode(model)?;
        // Write next to the target and rename so readers never see a partial file.
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, text)
            .await
            .map_err(|err| PersistenceError::io(&staging, err))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|err| PersistenceError::io(&self.path, err))?;
        info!(path = %self.path.display(), entities = model.entities.len(), "model written");
        Ok(())
    }

    async fn infer_relationships(&self) -> Result<Vec<Relationship>, PersistenceError> {
        let Some(path) = self.relationships.as_deref() else {
            return Ok(Vec::new());
        };
        match read_optional(path).await? {
            Some(text) => FileFormat::from_path(path).decode(&text),
            None => Ok(Vec::new()),
        }
    }
}

// ── HTTP ──

#[derive(Deserialize)]
#[serde(untagged)]
enum InferResponse {
    Wrapped { relationships: Vec<Relationship> },
    Bare(Vec<Relationship>),
}

/// JSON client for the modeling backend.
#[derive(Clone)]
pub struct HttpStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PersistenceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(PersistenceError::Status { status, body })
}

#[async_trait]
impl DataModelStore for HttpStore {
    async fn load(&self) -> Result<Option<GraphModel>, PersistenceError> {
        let response = self.client.get(self.url("/api/state")).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let model = check_status(response).await?.json().await?;
        Ok(Some(model))
    }

    async fn save(&self, model: &GraphModel) -> Result<(), PersistenceError> {
        let response = self
            .client
            .post(self.url("/api/state"))
            .json(model)
            .send()
            .await?;
        check_status(response).await?;
        info!(url = %self.base_url, entities = model.entities.len(), "model saved to backend");
        Ok(())
    }

    async fn infer_relationships(&self) -> Result<Vec<Relationship>, PersistenceError> {
        let response = self
            .client
            .post(self.url("/api/infer-relationships"))
            .send()
            .await?;
        let inferred: InferResponse = check_status(response).await?.json().await?;
        Ok(match inferred {
            InferResponse::Wrapped { relationships } | InferResponse::Bare(relationships) => {
                relationships
            }
        })
    }
}
