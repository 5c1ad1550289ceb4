use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use anyhow::{bail, Context, Result};
use modelcanvas_graph::{
    apply_filters, apply_folder_groups, graph_from_model, merge, model_from_graph, EntityType,
    GraphModel, GraphState, GraphStore, Node, NodeFilter, Point, SubscriptionId,
};
use modelcanvas_layout::{
    apply_size_updates, calculate_group_sizes, route_all, smart_position_avoiding_overlap,
    EdgeRoute, LayoutEngine,
};
use modelcanvas_sync::{
    AutoSaveService, DataModelStore, FileStore, HistoryManager, HttpStore,
};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::CanvasConfig;

/// Picks the backend for a model location: an `http(s)://` base URL talks to
/// the modeling service, anything else is a JSON or YAML file.
pub fn open_backend(location: &str, relationships: Option<&Path>) -> Arc<dyn DataModelStore> {
    if location.starts_with("http://") || location.starts_with("https://") {
        return Arc::new(HttpStore::new(location));
    }
    let store = FileStore::new(location);
    match relationships {
        Some(path) => Arc::new(store.with_relationships(path)),
        None => Arc::new(store),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub entities: usize,
    pub groups: usize,
    pub edges: usize,
    pub links: usize,
}

/// One editing session over a persisted model.
///
/// Every store change is fed to the history and the auto-save service, so
/// callers only edit the graph.
pub struct Session {
    config: CanvasConfig,
    backend: Arc<dyn DataModelStore>,
    graph: Arc<GraphStore>,
    history: Arc<HistoryManager>,
    autosave: Arc<AutoSaveService>,
    /// Set while a view-only change (filtering) is written to the store.
    view_change: Arc<AtomicBool>,
    subscription: SubscriptionId,
}

impl Session {
    pub async fn open(backend: Arc<dyn DataModelStore>, config: CanvasConfig) -> Result<Self> {
        let model = backend
            .load()
            .await
            .context("failed to load the model")?
            .unwrap_or_default();
        Self::from_model(&model, backend, config)
    }

    /// Starts a session from an already loaded model. Writes go to `backend`.
    pub fn from_model(
        model: &GraphModel,
        backend: Arc<dyn DataModelStore>,
        config: CanvasConfig,
    ) -> Result<Self> {
        let (nodes, edges) = graph_from_model(model).context("model is not usable")?;
        let nodes = apply_folder_groups(&nodes, &config.sizing.frame);
        let nodes = apply_size_updates(&nodes, &calculate_group_sizes(&nodes, &config.sizing));

        let graph = Arc::new(GraphStore::new(nodes, edges));
        let history = Arc::new(HistoryManager::new(Arc::clone(&graph), &config.history));
        history.init();
        let autosave = Arc::new(AutoSaveService::new(Arc::clone(&backend), &config.autosave));
        let state = graph.snapshot();
        autosave.mark_persisted(state.nodes(), state.edges());

        let history_hook: Weak<HistoryManager> = Arc::downgrade(&history);
        let autosave_hook: Weak<AutoSaveService> = Arc::downgrade(&autosave);
        let view_change = Arc::new(AtomicBool::new(false));
        let view_hook = Arc::clone(&view_change);
        let subscription = graph.subscribe(move |state, change| {
            debug!(?change, "graph changed");
            if view_hook.load(Ordering::SeqCst) {
                return;
            }
            if let Some(history) = history_hook.upgrade() {
                history.push();
            }
            if let Some(autosave) = autosave_hook.upgrade() {
                autosave.save(state.nodes(), state.edges());
            }
        });

        info!(
            entities = model.entities.len(),
            relationships = model.relationships.len(),
            "session opened"
        );
        Ok(Self {
            config,
            backend,
            graph,
            history,
            autosave,
            view_change,
            subscription,
        })
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn graph(&self) -> GraphState {
        self.graph.snapshot()
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn autosave(&self) -> &AutoSaveService {
        &self.autosave
    }

    pub fn model(&self) -> GraphModel {
        let state = self.graph.snapshot();
        model_from_graph(state.nodes(), state.edges())
    }

    pub fn report(&self) -> SessionReport {
        let state = self.graph.snapshot();
        SessionReport {
            entities: state.nodes().iter().filter(|node| node.is_entity()).count(),
            groups: state.nodes().iter().filter(|node| node.is_group()).count(),
            edges: state.edges().len(),
            links: state.edges().iter().map(|edge| edge.models.len().max(1)).sum(),
        }
    }

    pub fn auto_layout(&self) {
        let engine = LayoutEngine::layered(self.config.layout.clone(), self.config.sizing.clone());
        let state = self.graph.snapshot();
        self.graph
            .set_nodes(engine.layout(state.nodes(), state.edges()));
    }

    /// Adds an entity at a smart position for its role.
    pub fn add_entity(&self, id: &str, role: EntityType, rng: &mut impl Rng) -> Result<Point> {
        let state = self.graph.snapshot();
        if state.node(id).is_some() {
            bail!("an entity named `{id}` already exists");
        }
        let position =
            smart_position_avoiding_overlap(state.nodes(), role, &self.config.placement, rng);
        self.graph.update_nodes(|nodes| {
            nodes.push(Node::entity(id, position).with_entity_type(role));
        });
        info!(id, ?role, x = position.x, y = position.y, "entity placed");
        Ok(position)
    }

    /// Merges the backend's inferred relationships into the graph. Returns
    /// how many were merged; inference failures count as nothing to import.
    pub async fn import_relationships(&self) -> usize {
        let inferred = match self.backend.infer_relationships().await {
            Ok(inferred) => inferred,
            Err(err) => {
                warn!(error = %err, "relationship inference failed");
                return 0;
            }
        };

        let state = self.graph.snapshot();
        let mut edges = state.edges().to_vec();
        let mut merged = 0;
        for relationship in &inferred {
            let known = |id: &str| state.node(id).is_some_and(|node| node.is_entity());
            if !known(&relationship.source) || !known(&relationship.target) {
                debug!(
                    source = %relationship.source,
                    target = %relationship.target,
                    "skipping inferred relationship to an unknown entity"
                );
                continue;
            }
            edges = merge(&edges, relationship);
            merged += 1;
        }

        if edges.as_slice() != state.edges() {
            self.graph.set_edges(edges);
        }
        info!(inferred = inferred.len(), merged, "relationships imported");
        merged
    }

    pub fn delete(&self, ids: &[&str]) {
        self.graph.delete_nodes(ids);
    }

    /// Rebuilds groups from entity folders and re-sizes them.
    pub fn regroup(&self) {
        let state = self.graph.snapshot();
        let nodes = apply_folder_groups(state.nodes(), &self.config.sizing.frame);
        let updates = calculate_group_sizes(&nodes, &self.config.sizing);
        self.graph.set_nodes(apply_size_updates(&nodes, &updates));
    }

    /// Changes which nodes are shown. This is neither an undo step nor a save.
    pub fn set_filter(&self, filter: &NodeFilter) {
        let state = self.graph.snapshot();
        self.view_change.store(true, Ordering::SeqCst);
        self.graph.set_nodes(apply_filters(state.nodes(), filter));
        self.view_change.store(false, Ordering::SeqCst);
    }

    pub fn routes(&self) -> Vec<EdgeRoute> {
        let state = self.graph.snapshot();
        route_all(state.edges(), state.nodes(), &self.config.routing)
    }

    pub fn undo(&self) -> bool {
        self.history.undo()
    }

    pub fn redo(&self) -> bool {
        self.history.redo()
    }

    /// Stops reacting to changes and writes anything not yet persisted.
    pub async fn close(self) -> Result<()> {
        self.graph.unsubscribe(self.subscription);
        let state = self.graph.snapshot();
        self.autosave
            .flush_sync(state.nodes(), state.edges())
            .await
            .context("failed to save the model")?;
        info!("session closed");
        Ok(())
    }
}
