use std::sync::Arc;
use std::time::Duration;

use modelcanvas_graph::{GraphStore, HistorySnapshot, HistoryStack, DEFAULT_MAX_HISTORY};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;

use crate::debounce::Debouncer;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_entries: usize,
    /// Quiet period after the last edit before a snapshot is recorded.
    pub debounce_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_HISTORY,
            debounce_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Idle,
    /// An undo or redo is writing a recorded snapshot back into the store.
    Replaying,
}

struct Shared {
    store: Arc<GraphStore>,
    stack: Mutex<HistoryStack>,
    mode: Mutex<HistoryMode>,
}

impl Shared {
    fn record(&self) {
        if *self.mode.lock() == HistoryMode::Replaying {
            return;
        }
        let snapshot = HistorySnapshot::capture(&self.store.snapshot());
        let mut stack = self.stack.lock();
        stack.push(snapshot);
        debug!(entries = stack.len(), cursor = stack.cursor(), "history snapshot recorded");
    }

    fn replay(&self, snapshot: HistorySnapshot) {
        let (nodes, edges) = snapshot.restore(&self.store.snapshot());
        *self.mode.lock() = HistoryMode::Replaying;
        self.store.replace(nodes, edges);
        *self.mode.lock() = HistoryMode::Idle;
    }
}

/// Debounced undo/redo over a [`GraphStore`].
///
/// Edits call [`push`](Self::push) as often as they like; one snapshot of the
/// latest store state is recorded per quiet window. Writes made by undo and
/// redo never record themselves.
pub struct HistoryManager {
    shared: Arc<Shared>,
    debouncer: Debouncer,
}

impl HistoryManager {
    pub fn new(store: Arc<GraphStore>, config: &HistoryConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                stack: Mutex::new(HistoryStack::new(config.max_entries)),
                mode: Mutex::new(HistoryMode::Idle),
            }),
            debouncer: Debouncer::new(Duration::from_millis(config.debounce_ms)),
        }
    }

    /// Seeds the history with the current store state as its only entry.
    pub fn init(&self) {
        self.debouncer.cancel();
        let snapshot = HistorySnapshot::capture(&self.shared.store.snapshot());
        self.shared.stack.lock().reset(snapshot);
    }

    pub fn push(&self) {
        if self.mode() == HistoryMode::Replaying {
            debug!("history push ignored during replay");
            return;
        }
        let shared = Arc::clone(&self.shared);
        self.debouncer.schedule(move || {
            shared.record();
            std::future::ready(())
        });
    }

    /// Records a pending push right away instead of waiting for the window.
    pub fn flush(&self) {
        if self.debouncer.cancel() {
            self.shared.record();
        }
    }

    pub fn undo(&self) -> bool {
        self.flush();
        let entry = self.shared.stack.lock().undo();
        match entry {
            Some(snapshot) => {
                self.shared.replay(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&self) -> bool {
        self.flush();
        let entry = self.shared.stack.lock().redo();
        match entry {
            Some(snapshot) => {
                self.shared.replay(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.shared.stack.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.shared.stack.lock().can_redo()
    }

    pub fn len(&self) -> usize {
        self.shared.stack.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.stack.lock().is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.shared.stack.lock().cursor()
    }

    pub fn mode(&self) -> HistoryMode {
        *self.shared.mode.lock()
    }

    pub fn has_pending_push(&self) -> bool {
        self.debouncer.is_pending()
    }
}
