use modelcanvas_graph::{Edge, LabelOffset, Node, Point, Rect, Size};
use modelcanvas_layout::{
    assign_lanes, connection_sides, label_position, marker_points, orthogonal_path,
    parallel_offset, route_all, route_edge, self_loop_connection, RoutingConfig, Side,
};
use proptest::prelude::*;

fn rect(x: f64, y: f64) -> Rect {
    Rect::new(Point::new(x, y), Size::new(100.0, 50.0))
}

#[test]
fn parallel_offsets_alternate_around_zero() {
    let offsets: Vec<f64> = (0..7).map(|i| parallel_offset(i, 10.0)).collect();
    assert_eq!(offsets, vec![0.0, 10.0, -10.0, 20.0, -20.0, 30.0, -30.0]);
}

proptest! {
    #[test]
    fn parallel_offsets_are_distinct(count in 1usize..40, spacing in 1.0f64..50.0) {
        let mut offsets: Vec<f64> = (0..count).map(|i| parallel_offset(i, spacing)).collect();
        offsets.sort_by(|a, b| a.partial_cmp(b).unwrap());
        offsets.dedup();
        prop_assert_eq!(offsets.len(), count);
    }
}

#[test]
fn sides_follow_the_dominant_axis() {
    let conn = connection_sides(&rect(0.0, 0.0), &rect(400.0, 50.0));
    assert_eq!((conn.source_side, conn.target_side), (Side::Right, Side::Left));
    assert_eq!(conn.source, Point::new(100.0, 25.0));
    assert_eq!(conn.target, Point::new(400.0, 75.0));

    let conn = connection_sides(&rect(0.0, 400.0), &rect(0.0, 0.0));
    assert_eq!((conn.source_side, conn.target_side), (Side::Top, Side::Bottom));

    let tie = connection_sides(&rect(0.0, 0.0), &rect(-200.0, 200.0));
    assert_eq!((tie.source_side, tie.target_side), (Side::Left, Side::Right));
}

#[test]
fn self_loops_use_the_right_side() {
    let conn = self_loop_connection(&rect(0.0, 0.0), 20.0);
    assert_eq!(conn.source_side, Side::Right);
    assert_eq!(conn.target_side, Side::Right);
    assert_eq!(conn.source, Point::new(100.0, 5.0));
    assert_eq!(conn.target, Point::new(100.0, 45.0));
}

#[test]
fn orthogonal_path_steps_through_the_midpoint() {
    let points = orthogonal_path(
        Point::new(100.0, 25.0),
        Side::Right,
        Point::new(400.0, 75.0),
        0.0,
        None,
    );
    assert_eq!(
        points,
        vec![
            Point::new(100.0, 25.0),
            Point::new(250.0, 25.0),
            Point::new(250.0, 75.0),
            Point::new(400.0, 75.0),
        ]
    );
    assert_eq!(label_position(&points), Point::new(250.0, 50.0));
}

#[test]
fn label_offset_moves_the_bend() {
    let points = orthogonal_path(
        Point::new(100.0, 25.0),
        Side::Right,
        Point::new(400.0, 75.0),
        0.0,
        Some(LabelOffset { dx: 30.0, dy: 999.0 }),
    );
    assert_eq!(points[1], Point::new(280.0, 25.0));
    assert_eq!(points[2], Point::new(280.0, 75.0));
}

#[test]
fn vertical_routes_bend_on_a_horizontal_axis() {
    let points = orthogonal_path(
        Point::new(50.0, 50.0),
        Side::Bottom,
        Point::new(250.0, 350.0),
        10.0,
        Some(LabelOffset { dx: 999.0, dy: -20.0 }),
    );
    assert_eq!(
        points,
        vec![
            Point::new(60.0, 50.0),
            Point::new(60.0, 190.0),
            Point::new(260.0, 190.0),
            Point::new(260.0, 350.0),
        ]
    );
}

#[test]
fn straight_routes_collapse_duplicate_points() {
    let points = orthogonal_path(
        Point::new(0.0, 0.0),
        Side::Bottom,
        Point::new(0.0, 100.0),
        0.0,
        None,
    );
    assert_eq!(points, vec![Point::new(0.0, 0.0), Point::new(0.0, 100.0)]);
}

#[test]
fn marker_points_back_along_the_last_segment() {
    let marker = marker_points(&[Point::new(0.0, 0.0), Point::new(100.0, 0.0)], 10.0);
    assert_eq!(marker.tip, Point::new(100.0, 0.0));
    assert_eq!(marker.left, Point::new(90.0, 5.0));
    assert_eq!(marker.right, Point::new(90.0, -5.0));
}

#[test]
fn lanes_count_edges_per_unordered_pair() {
    let edges = vec![
        Edge::new("a", "b"),
        Edge::new("b", "a"),
        Edge::new("a", "c"),
        Edge::new("a", "b"),
    ];
    assert_eq!(assign_lanes(&edges), vec![0, 1, 0, 2]);
}

#[test]
fn parallel_routes_do_not_coincide() {
    let nodes = vec![
        Node::entity("a", Point::new(0.0, 0.0)).with_size(100.0, 50.0),
        Node::entity("b", Point::new(400.0, 0.0)).with_size(100.0, 50.0),
    ];
    let edges = vec![Edge::new("a", "b"), Edge::new("b", "a")];
    let routes = route_all(&edges, &nodes, &RoutingConfig::default());

    assert_eq!(routes.len(), 2);
    assert_ne!(routes[0].points, routes[1].points);
    assert!(routes[0].path.starts_with("M 100 25"));
}

#[test]
fn routes_grouped_nodes_at_absolute_positions() {
    let nodes = vec![
        Node::group("group:sales", Point::new(1000.0, 0.0)),
        Node::entity("a", Point::new(40.0, 80.0))
            .with_parent("group:sales")
            .with_size(100.0, 50.0),
        Node::entity("b", Point::new(0.0, 80.0)).with_size(100.0, 50.0),
    ];
    let route = route_edge(&Edge::new("b", "a"), &nodes, 0, &RoutingConfig::default()).unwrap();
    assert_eq!(route.connection.target, Point::new(1040.0, 105.0));
    assert_eq!(route.marker.tip, route.connection.target);
}

#[test]
fn self_loop_route_is_a_curve() {
    let nodes = vec![Node::entity("a", Point::new(0.0, 0.0)).with_size(100.0, 50.0)];
    let route = route_edge(&Edge::new("a", "a"), &nodes, 0, &RoutingConfig::default()).unwrap();
    assert!(route.path.contains(" C "));
    assert!(route.label.x > 100.0);
    assert!(route_edge(&Edge::new("a", "ghost"), &nodes, 0, &RoutingConfig::default()).is_none());
}
