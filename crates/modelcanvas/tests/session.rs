use std::sync::Arc;
use std::time::Duration;

use modelcanvas::{CanvasConfig, Session};
use modelcanvas_graph::{EntityRecord, EntityType, GraphModel, NodeFilter, Point, Relationship};
use modelcanvas_sync::MemoryStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::sleep;

fn sales_model() -> GraphModel {
    let mut orders = EntityRecord::new("orders", Point::new(200.0, 200.0));
    orders.folder = Some("sales".to_string());
    orders.entity_type = Some(EntityType::Fact);
    let mut refunds = EntityRecord::new("refunds", Point::new(600.0, 200.0));
    refunds.folder = Some("sales".to_string());
    GraphModel {
        entities: vec![
            orders,
            refunds,
            EntityRecord::new("customers", Point::new(200.0, 700.0)),
        ],
        relationships: vec![Relationship::new("orders", "customers").with_fields("customer_id", "id")],
        ..GraphModel::default()
    }
}

async fn open(store: &Arc<MemoryStore>) -> Session {
    Session::open(store.clone(), CanvasConfig::default()).await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn opening_derives_groups_without_writing() {
    let store = Arc::new(MemoryStore::with_model(sales_model()));
    let session = open(&store).await;

    let report = session.report();
    assert_eq!(report.entities, 3);
    assert_eq!(report.groups, 1);
    assert_eq!(report.edges, 1);

    let state = session.graph();
    let group = state.node("group:sales").unwrap();
    assert!(group.width.is_some());
    assert_eq!(session.model(), sales_model());

    sleep(Duration::from_secs(2)).await;
    assert_eq!(store.save_count(), 0);
    session.close().await.unwrap();
    assert_eq!(store.save_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn placing_an_entity_is_saved_and_undoable() {
    let store = Arc::new(MemoryStore::new());
    let session = open(&store).await;

    let position = session
        .add_entity("orders", EntityType::Fact, &mut StdRng::seed_from_u64(1))
        .unwrap();
    assert!((position.x - 400.0).abs() <= 100.0);
    assert!(session
        .add_entity("orders", EntityType::Fact, &mut StdRng::seed_from_u64(1))
        .is_err());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(store.save_count(), 1);
    assert_eq!(session.history().len(), 2);

    assert!(session.undo());
    assert!(session.graph().node("orders").is_none());
    assert!(session.redo());
    assert!(session.graph().node("orders").is_some());
    session.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn close_flushes_pending_edits() {
    let store = Arc::new(MemoryStore::new());
    let session = open(&store).await;
    session
        .add_entity("calendar", EntityType::Dimension, &mut StdRng::seed_from_u64(2))
        .unwrap();

    session.close().await.unwrap();
    assert_eq!(store.save_count(), 1);
    assert_eq!(store.current().unwrap().entities[0].id, "calendar");
}

#[tokio::test(start_paused = true)]
async fn import_merges_known_relationships_only() {
    let inferred = vec![
        Relationship::new("refunds", "orders").with_fields("order_id", "id"),
        Relationship::new("orders", "customers").with_fields("customer_id", "id"),
        Relationship::new("orders", "ghosts").with_fields("ghost_id", "id"),
    ];
    let store = Arc::new(MemoryStore::with_model(sales_model()).with_inferred(inferred));
    let session = open(&store).await;

    assert_eq!(session.import_relationships().await, 2);
    assert_eq!(session.report().edges, 2);
    session.close().await.unwrap();

    let saved = store.current().unwrap();
    assert_eq!(saved.relationships.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn auto_layout_keeps_every_entity_and_persists() {
    let store = Arc::new(MemoryStore::with_model(sales_model()));
    let session = open(&store).await;
    session.auto_layout();

    let routes = session.routes();
    assert_eq!(routes.len(), 1);
    assert!(routes[0].path.starts_with('M'));

    session.close().await.unwrap();
    let saved = store.current().unwrap();
    assert_eq!(saved.entities.len(), 3);
    assert_ne!(saved, sales_model());
}

#[tokio::test(start_paused = true)]
async fn deleting_a_grouped_entity_drops_its_empty_group() {
    let mut model = sales_model();
    model.entities.remove(1);
    let store = Arc::new(MemoryStore::with_model(model));
    let session = open(&store).await;
    assert_eq!(session.report().groups, 1);

    session.delete(&["orders"]);
    let report = session.report();
    assert_eq!(report.groups, 0);
    assert_eq!(report.edges, 0);
    session.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn filtering_is_not_an_edit() {
    let store = Arc::new(MemoryStore::with_model(sales_model()));
    let session = open(&store).await;

    session.set_filter(&NodeFilter {
        search: Some("orders".to_string()),
        ..NodeFilter::default()
    });
    assert!(session.graph().node("customers").unwrap().hidden);
    assert!(!session.history().has_pending_push());

    sleep(Duration::from_secs(1)).await;
    assert_eq!(session.history().len(), 1);
    assert!(!session.history().can_undo());
    session.close().await.unwrap();
    assert_eq!(store.save_count(), 0);
}
