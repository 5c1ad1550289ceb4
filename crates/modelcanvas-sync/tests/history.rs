use std::sync::Arc;
use std::time::Duration;

use modelcanvas_graph::{GraphStore, Node, Point};
use modelcanvas_sync::{HistoryConfig, HistoryManager, HistoryMode};
use tokio::time::sleep;

fn setup() -> (Arc<GraphStore>, Arc<HistoryManager>) {
    let store = Arc::new(GraphStore::new(
        vec![Node::entity("orders", Point::new(0.0, 0.0))],
        Vec::new(),
    ));
    let history = Arc::new(HistoryManager::new(Arc::clone(&store), &HistoryConfig::default()));
    history.init();
    (store, history)
}

fn move_orders(store: &GraphStore, x: f64) {
    store.update_nodes(|nodes| nodes[0].position = Point::new(x, 0.0));
}

fn orders_x(store: &GraphStore) -> f64 {
    store.snapshot().node("orders").unwrap().position.x
}

#[tokio::test(start_paused = true)]
async fn init_seeds_a_single_entry() {
    let (_, history) = setup();
    assert_eq!(history.len(), 1);
    assert_eq!(history.cursor(), 0);
    assert!(!history.can_undo());
    assert!(!history.can_redo());
    assert!(!history.undo());
}

#[tokio::test(start_paused = true)]
async fn pushes_within_the_window_coalesce() {
    let (store, history) = setup();
    for step in 1..=5 {
        move_orders(&store, f64::from(step) * 10.0);
        history.push();
        sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(history.len(), 1, "window still open");

    sleep(Duration::from_millis(400)).await;
    assert_eq!(history.len(), 2);

    assert!(history.undo());
    assert_eq!(orders_x(&store), 0.0);
    assert!(history.redo());
    assert_eq!(orders_x(&store), 50.0);
}

#[tokio::test(start_paused = true)]
async fn undo_and_redo_round_trip() {
    let (store, history) = setup();
    for step in 1..=3 {
        move_orders(&store, f64::from(step));
        history.push();
        sleep(Duration::from_millis(500)).await;
    }
    assert_eq!(history.len(), 4);

    while history.undo() {}
    assert_eq!(orders_x(&store), 0.0);
    while history.redo() {}
    assert_eq!(orders_x(&store), 3.0);
    assert!(!history.can_redo());
}

#[tokio::test(start_paused = true)]
async fn new_edit_after_undo_invalidates_redo() {
    let (store, history) = setup();
    move_orders(&store, 1.0);
    history.push();
    sleep(Duration::from_millis(500)).await;

    history.undo();
    assert!(history.can_redo());

    move_orders(&store, 7.0);
    history.push();
    sleep(Duration::from_millis(500)).await;

    assert!(!history.can_redo());
    assert_eq!(history.len(), 2);
    history.undo();
    assert_eq!(orders_x(&store), 0.0);
}

#[tokio::test(start_paused = true)]
async fn undo_flushes_a_pending_push() {
    let (store, history) = setup();
    move_orders(&store, 42.0);
    history.push();
    assert!(history.has_pending_push());

    assert!(history.undo());
    assert_eq!(orders_x(&store), 0.0);
    assert!(history.redo());
    assert_eq!(orders_x(&store), 42.0);
}

#[tokio::test(start_paused = true)]
async fn replayed_states_are_not_recorded() {
    let (store, history) = setup();
    let listener = Arc::clone(&history);
    store.subscribe(move |_, _| listener.push());

    move_orders(&store, 5.0);
    sleep(Duration::from_millis(500)).await;
    assert_eq!(history.len(), 2);

    assert!(history.undo());
    assert_eq!(history.mode(), HistoryMode::Idle);
    sleep(Duration::from_millis(500)).await;

    assert_eq!(history.len(), 2);
    assert!(history.can_redo());
}

#[tokio::test(start_paused = true)]
async fn oldest_entries_are_evicted() {
    let store = Arc::new(GraphStore::new(
        vec![Node::entity("orders", Point::new(0.0, 0.0))],
        Vec::new(),
    ));
    let config = HistoryConfig {
        max_entries: 3,
        debounce_ms: 10,
    };
    let history = HistoryManager::new(Arc::clone(&store), &config);
    history.init();
    for step in 1..=5 {
        move_orders(&store, f64::from(step));
        history.push();
        sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(history.len(), 3);
    assert_eq!(history.cursor(), 2);
    while history.undo() {}
    assert_eq!(orders_x(&store), 3.0);
}

#[tokio::test(start_paused = true)]
async fn undo_never_restores_a_drag_in_progress() {
    let (store, history) = setup();
    store.update_nodes(|nodes| {
        nodes[0].position = Point::new(30.0, 0.0);
        nodes[0].dragging = true;
    });
    history.push();
    sleep(Duration::from_millis(500)).await;

    store.update_nodes(|nodes| {
        nodes[0].position = Point::new(60.0, 0.0);
        nodes[0].dragging = false;
    });
    history.push();
    sleep(Duration::from_millis(500)).await;
    assert_eq!(history.len(), 3);

    assert!(history.undo());
    let state = store.snapshot();
    let orders = state.node("orders").unwrap();
    assert_eq!(orders.position.x, 30.0);
    assert!(!orders.dragging);
}
