use modelcanvas_graph::{Edge, Node, Point};
use modelcanvas_layout::{
    layout_layered, Direction, GroupSizingConfig, LayoutBackend, LayoutEngine, LayoutError,
    LayoutInput, LayoutRequest, LayoutStyle, PlacedNode,
};

fn request(ids: &[&str], edges: &[(&str, &str)]) -> LayoutRequest {
    LayoutRequest {
        nodes: ids
            .iter()
            .map(|id| LayoutInput {
                id: id.to_string(),
                width: 100.0,
                height: 50.0,
            })
            .collect(),
        edges: edges
            .iter()
            .map(|(s, t)| (s.to_string(), t.to_string()))
            .collect(),
    }
}

fn find<'a>(placed: &'a [PlacedNode], id: &str) -> &'a PlacedNode {
    placed.iter().find(|node| node.id == id).unwrap()
}

#[test]
fn layouts_simple_chain_tb() {
    let placed = layout_layered(
        &request(&["a", "b", "c"], &[("a", "b"), ("b", "c")]),
        &LayoutStyle::default(),
    )
    .unwrap();

    let (a, b, c) = (find(&placed, "a"), find(&placed, "b"), find(&placed, "c"));
    assert!(a.y < b.y && b.y < c.y);
    assert_eq!((a.layer, b.layer, c.layer), (0, 1, 2));
}

#[test]
fn layouts_every_direction() {
    let req = request(&["a", "b"], &[("a", "b")]);
    let run = |direction| {
        let style = LayoutStyle {
            direction,
            ..LayoutStyle::default()
        };
        let placed = layout_layered(&req, &style).unwrap();
        (find(&placed, "a").clone(), find(&placed, "b").clone())
    };

    let (a, b) = run(Direction::LR);
    assert!(a.x < b.x);
    let (a, b) = run(Direction::RL);
    assert!(a.x > b.x);
    let (a, b) = run(Direction::BT);
    assert!(a.y > b.y);
}

#[test]
fn siblings_share_a_layer_without_overlapping() {
    let style = LayoutStyle::default();
    let placed = layout_layered(
        &request(&["fact", "left", "right"], &[("fact", "left"), ("fact", "right")]),
        &style,
    )
    .unwrap();

    let left = find(&placed, "left");
    let right = find(&placed, "right");
    assert_eq!(left.layer, right.layer);
    assert!((left.x - right.x).abs() >= 100.0 + style.node_gap);
}

#[test]
fn cycles_and_self_loops_still_lay_out() {
    let placed = layout_layered(
        &request(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a"), ("b", "b")]),
        &LayoutStyle::default(),
    )
    .unwrap();
    assert_eq!(placed.len(), 3);
    assert!(placed.iter().all(|node| node.x.is_finite() && node.y.is_finite()));
}

#[test]
fn unknown_edge_endpoint_is_an_error() {
    let err = layout_layered(&request(&["a"], &[("a", "ghost")]), &LayoutStyle::default())
        .unwrap_err();
    assert_eq!(err, LayoutError::UnknownNode("ghost".to_string()));
}

fn grouped_graph() -> (Vec<Node>, Vec<Edge>) {
    let nodes = vec![
        Node::group("group:sales", Point::new(500.0, 500.0)),
        Node::entity("orders", Point::new(10.0, 900.0)).with_parent("group:sales"),
        Node::entity("refunds", Point::new(700.0, 20.0)).with_parent("group:sales"),
    ];
    let edges = vec![Edge::new("orders", "refunds"), Edge::new("orders", "orders")];
    (nodes, edges)
}

#[test]
fn engine_reframes_groups_around_laid_out_children() {
    let (nodes, edges) = grouped_graph();
    let engine = LayoutEngine::default();
    let laid_out = engine.layout(&nodes, &edges);

    let group = &laid_out[0];
    assert_eq!(group.position, Point::new(-40.0, -80.0));
    assert_eq!(group.width, Some(360.0));
    assert_eq!(group.height, Some(480.0));

    assert_eq!(laid_out[1].position, Point::new(40.0, 80.0));
    assert_eq!(laid_out[2].position, Point::new(40.0, 320.0));
    assert_eq!(laid_out[2].parent_id.as_deref(), Some("group:sales"));
}

#[test]
fn headless_engine_returns_input_unchanged() {
    let (nodes, edges) = grouped_graph();
    let engine = LayoutEngine::headless();
    assert!(!engine.has_backend());
    assert_eq!(engine.layout(&nodes, &edges), nodes);
}

struct FailingBackend;

impl LayoutBackend for FailingBackend {
    fn compute(&self, _request: &LayoutRequest) -> Result<Vec<PlacedNode>, LayoutError> {
        Err(LayoutError::Backend("worker crashed".to_string()))
    }
}

#[test]
fn backend_failure_is_a_no_op() {
    let (nodes, edges) = grouped_graph();
    let engine = LayoutEngine::new(FailingBackend, GroupSizingConfig::default());
    assert_eq!(engine.layout(&nodes, &edges), nodes);
}
