use std::sync::Arc;
use std::time::Duration;

use modelcanvas_graph::{model_from_graph, Edge, GraphModel, Node};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::debounce::Debouncer;
use crate::error::PersistenceError;
use crate::store::DataModelStore;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    pub debounce_ms: u64,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self { debounce_ms: 400 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Queued,
    Saving,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    /// Canonical serialization used to detect no-op saves.
    pub key: String,
    pub model: GraphModel,
}

/// Bookkeeping for the save pipeline. Each slot holds a serialized model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveState {
    pub last_persisted: Option<String>,
    pub queued: Option<PendingSave>,
    pub in_flight: Option<String>,
}

impl SaveState {
    fn knows(&self, key: &str) -> bool {
        self.last_persisted.as_deref() == Some(key)
            || self.in_flight.as_deref() == Some(key)
            || self.queued.as_ref().is_some_and(|queued| queued.key == key)
    }
}

struct Shared {
    store: Arc<dyn DataModelStore>,
    state: Mutex<SaveState>,
    persist_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    /// Writes the queued model, then keeps going while newer ones arrive.
    /// Only one caller at a time gets past the persist lock.
    async fn dispatch(&self) -> Result<(), PersistenceError> {
        let _guard = self.persist_lock.lock().await;
        loop {
            let pending = {
                let mut state = self.state.lock();
                let Some(pending) = state.queued.take() else {
                    return Ok(());
                };
                if state.last_persisted.as_deref() == Some(pending.key.as_str()) {
                    debug!("queued model already persisted");
                    continue;
                }
                state.in_flight = Some(pending.key.clone());
                pending
            };

            let result = self.store.save(&pending.model).await;

            let mut state = self.state.lock();
            state.in_flight = None;
            match result {
                Ok(()) => {
                    info!(
                        entities = pending.model.entities.len(),
                        relationships = pending.model.relationships.len(),
                        "model persisted"
                    );
                    state.last_persisted = Some(pending.key);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn serialize(model: &GraphModel) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(model)?)
}

/// Debounced, coalescing writer of the canvas model.
pub struct AutoSaveService {
    shared: Arc<Shared>,
    debouncer: Debouncer,
}

impl AutoSaveService {
    pub fn new(store: Arc<dyn DataModelStore>, config: &AutoSaveConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                state: Mutex::new(SaveState::default()),
                persist_lock: tokio::sync::Mutex::new(()),
            }),
            debouncer: Debouncer::new(Duration::from_millis(config.debounce_ms)),
        }
    }

    /// Queues the graph for a write after the debounce delay. Failures of the
    /// eventual write are logged and dropped.
    pub fn save(&self, nodes: &[Node], edges: &[Edge]) {
        let model = model_from_graph(nodes, edges);
        let key = match serialize(&model) {
            Ok(key) => key,
            Err(err) => {
                warn!(error = %err, "auto-save skipped, model could not be serialized");
                return;
            }
        };

        {
            let mut state = self.shared.state.lock();
            if state.knows(&key) {
                debug!("auto-save skipped, model unchanged");
                return;
            }
            state.queued = Some(PendingSave { key, model });
        }

        let shared = Arc::clone(&self.shared);
        self.debouncer.schedule(move || async move {
            // Detached so a later reschedule cannot abort a write in progress.
            tokio::spawn(async move {
                if let Err(err) = shared.dispatch().await {
                    warn!(error = %err, transient = err.is_transient(), "auto-save failed");
                }
            });
        });
    }

    /// Writes the graph right away and reports the outcome.
    pub async fn save_now(&self, nodes: &[Node], edges: &[Edge]) -> Result<(), PersistenceError> {
        self.debouncer.cancel();
        let model = model_from_graph(nodes, edges);
        let key = serialize(&model)?;
        self.shared.state.lock().queued = Some(PendingSave { key, model });
        self.shared.dispatch().await
    }

    /// Makes sure the graph is durably written before returning, waiting for
    /// any in-flight write first.
    pub async fn flush_sync(&self, nodes: &[Node], edges: &[Edge]) -> Result<(), PersistenceError> {
        self.debouncer.cancel();
        let model = model_from_graph(nodes, edges);
        let key = serialize(&model)?;
        {
            let mut state = self.shared.state.lock();
            if state.in_flight.is_none() && state.last_persisted.as_deref() == Some(key.as_str()) {
                state.queued = None;
                return Ok(());
            }
            state.queued = Some(PendingSave { key, model });
        }
        self.shared.dispatch().await
    }

    pub fn has_unsaved_changes(&self, nodes: &[Node], edges: &[Edge]) -> bool {
        let Ok(key) = serialize(&model_from_graph(nodes, edges)) else {
            return true;
        };
        let state = self.shared.state.lock();
        match state.in_flight.as_deref() {
            Some(in_flight) => in_flight != key,
            None => state.last_persisted.as_deref() != Some(key.as_str()),
        }
    }

    /// Records the graph as already persisted, e.g. right after loading it.
    pub fn mark_persisted(&self, nodes: &[Node], edges: &[Edge]) {
        match serialize(&model_from_graph(nodes, edges)) {
            Ok(key) => self.shared.state.lock().last_persisted = Some(key),
            Err(err) => warn!(error = %err, "could not record persisted baseline"),
        }
    }

    pub fn state(&self) -> SaveStatus {
        let state = self.shared.state.lock();
        if state.in_flight.is_some() {
            SaveStatus::Saving
        } else if state.queued.is_some() {
            SaveStatus::Queued
        } else {
            SaveStatus::Idle
        }
    }

    pub fn save_state(&self) -> SaveState {
        self.shared.state.lock().clone()
    }
}
