use std::collections::VecDeque;

use crate::model::{Edge, Node};
use crate::store::GraphState;

pub const DEFAULT_MAX_HISTORY: usize = 50;

/// A deep copy of the graph at one point in time.
///
/// Only document state is kept: `hidden`, `measured` and `dragging` belong to
/// the view and are cleared on capture.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistorySnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl HistorySnapshot {
    pub fn capture(state: &GraphState) -> Self {
        let nodes = state
            .nodes()
            .iter()
            .map(|node| Node {
                hidden: false,
                measured: None,
                dragging: false,
                ..node.clone()
            })
            .collect();
        Self {
            nodes,
            edges: state.edges().to_vec(),
        }
    }

    /// The graph to write back for this entry. Nodes still on the canvas keep
    /// their live visibility and measured size; nothing comes back dragging.
    pub fn restore(self, live: &GraphState) -> (Vec<Node>, Vec<Edge>) {
        let nodes = self
            .nodes
            .into_iter()
            .map(|node| match live.node(&node.id) {
                Some(current) => Node {
                    hidden: current.hidden,
                    measured: current.measured,
                    ..node
                },
                None => node,
            })
            .collect();
        (nodes, self.edges)
    }
}

/// Bounded linear undo history.
///
/// `cursor` always points at the entry matching the live graph. Pushing while
/// the cursor is behind the tail discards the redo branch.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: VecDeque<HistorySnapshot>,
    cursor: usize,
    max_entries: usize,
}

impl HistoryStack {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            max_entries: max_entries.max(1),
        }
    }

    /// Drops all history and starts again from `initial`.
    pub fn reset(&mut self, initial: HistorySnapshot) {
        self.entries.clear();
        self.entries.push_back(initial);
        self.cursor = 0;
    }

    /// Records a new entry after the cursor, even when it matches the
    /// current one.
    pub fn push(&mut self, snapshot: HistorySnapshot) {
        if self.entries.is_empty() {
            self.reset(snapshot);
            return;
        }

        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(snapshot);
        if self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Moves one entry back and returns a copy of it.
    pub fn undo(&mut self) -> Option<HistorySnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Moves one entry forward and returns a copy of it.
    pub fn redo(&mut self) -> Option<HistorySnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.entries.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
