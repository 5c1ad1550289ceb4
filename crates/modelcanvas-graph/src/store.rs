use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::model::{absolute_position, Edge, Node};

/// Immutable view of the graph at one revision.
///
/// Both collections sit behind `Arc`s, so cloning a state is cheap and two
/// states can be compared by identity to tell which collection changed.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    nodes: Arc<Vec<Node>>,
    edges: Arc<Vec<Edge>>,
}

impl GraphState {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            nodes: Arc::new(nodes),
            edges: Arc::new(edges),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn same_nodes(&self, other: &GraphState) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes)
    }

    pub fn same_edges(&self, other: &GraphState) -> bool {
        Arc::ptr_eq(&self.edges, &other.edges)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Nodes,
    Edges,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&GraphState, StoreChange) + Send + Sync>;

/// Canonical in-memory graph shared by the editing components.
///
/// Every write replaces a whole collection; nothing hands out a mutable
/// reference into the stored vectors. Listeners run synchronously after each
/// write, outside of any store lock, so they may read the store again.
#[derive(Default)]
pub struct GraphStore {
    state: RwLock<GraphState>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
    revision: AtomicU64,
}

impl GraphStore {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            state: RwLock::new(GraphState::new(nodes, edges)),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> GraphState {
        self.state.read().clone()
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn set_nodes(&self, nodes: Vec<Node>) {
        let next = {
            let mut state = self.state.write();
            state.nodes = Arc::new(nodes);
            state.clone()
        };
        self.notify(&next, StoreChange::Nodes);
    }

    pub fn set_edges(&self, edges: Vec<Edge>) {
        let next = {
            let mut state = self.state.write();
            state.edges = Arc::new(edges);
            state.clone()
        };
        self.notify(&next, StoreChange::Edges);
    }

    pub fn replace(&self, nodes: Vec<Node>, edges: Vec<Edge>) {
        let next = GraphState::new(nodes, edges);
        *self.state.write() = next.clone();
        self.notify(&next, StoreChange::All);
    }

    /// Copy-on-write edit of the node list.
    pub fn update_nodes(&self, edit: impl FnOnce(&mut Vec<Node>)) {
        let next = {
            let mut state = self.state.write();
            let mut nodes = state.nodes.as_ref().clone();
            edit(&mut nodes);
            state.nodes = Arc::new(nodes);
            state.clone()
        };
        self.notify(&next, StoreChange::Nodes);
    }

    /// Copy-on-write edit of the edge list.
    pub fn update_edges(&self, edit: impl FnOnce(&mut Vec<Edge>)) {
        let next = {
            let mut state = self.state.write();
            let mut edges = state.edges.as_ref().clone();
            edit(&mut edges);
            state.edges = Arc::new(edges);
            state.clone()
        };
        self.notify(&next, StoreChange::Edges);
    }

    /// Deletes nodes and everything that cannot outlive them.
    pub fn delete_nodes(&self, ids: &[&str]) {
        let current = self.snapshot();
        let (nodes, edges) = cascade_delete(current.nodes(), current.edges(), ids);
        self.replace(nodes, edges);
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&GraphState, StoreChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().retain(|(existing, _)| *existing != id);
    }

    fn notify(&self, state: &GraphState, change: StoreChange) {
        self.revision.fetch_add(1, Ordering::SeqCst);
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(state, change);
        }
    }
}

/// Removes `ids` from the graph.
///
/// Edges touching a removed node go with it. Children of a removed group are
/// moved to the top level at their absolute position, and groups left without
/// children are dropped.
pub fn cascade_delete(nodes: &[Node], edges: &[Edge], ids: &[&str]) -> (Vec<Node>, Vec<Edge>) {
    let mut removed: HashSet<String> = ids.iter().map(|id| id.to_string()).collect();

    let mut kept: Vec<Node> = nodes
        .iter()
        .filter(|node| !removed.contains(node.id.as_str()))
        .map(|node| {
            let orphaned = node
                .parent_id
                .as_deref()
                .is_some_and(|parent| removed.contains(parent));
            if orphaned {
                let mut node = node.clone();
                node.position = absolute_position(&node, nodes);
                node.parent_id = None;
                node
            } else {
                node.clone()
            }
        })
        .collect();

    let empty_groups: Vec<String> = kept
        .iter()
        .filter(|node| node.is_group())
        .filter(|group| {
            !kept
                .iter()
                .any(|child| child.parent_id.as_deref() == Some(group.id.as_str()))
        })
        .map(|group| group.id.clone())
        .collect();
    kept.retain(|node| !empty_groups.contains(&node.id));
    removed.extend(empty_groups);

    let edges = edges
        .iter()
        .filter(|edge| {
            !removed.contains(&edge.source) && !removed.contains(&edge.target)
        })
        .cloned()
        .collect();
    (kept, edges)
}
