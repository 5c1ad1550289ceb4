use modelcanvas_graph::{Node, Point, Size};
use modelcanvas_layout::{
    apply_size_updates, calculate_group_sizes, effective_size, GroupSizingConfig, SizeUpdate,
    ViewMode,
};

fn group_with_children() -> Vec<Node> {
    vec![
        Node::group("group:sales", Point::new(0.0, 0.0)),
        Node::entity("orders", Point::new(40.0, 80.0))
            .with_parent("group:sales")
            .with_size(260.0, 140.0),
        Node::entity("refunds", Point::new(40.0, 100.0))
            .with_parent("group:sales")
            .with_size(100.0, 60.0),
    ]
}

#[test]
fn sizes_group_to_children_plus_padding() {
    let updates = calculate_group_sizes(&group_with_children(), &GroupSizingConfig::default());
    assert_eq!(
        updates,
        vec![SizeUpdate {
            id: "group:sales".to_string(),
            size: Size::new(340.0, 260.0),
        }]
    );
}

#[test]
fn sizing_is_deterministic() {
    let config = GroupSizingConfig::default();
    let nodes = group_with_children();
    assert_eq!(
        calculate_group_sizes(&nodes, &config),
        calculate_group_sizes(&nodes, &config)
    );
}

#[test]
fn small_differences_are_ignored() {
    let mut nodes = group_with_children();
    nodes[0] = nodes[0].clone().with_size(339.0, 261.5);
    assert!(calculate_group_sizes(&nodes, &GroupSizingConfig::default()).is_empty());

    nodes[0] = nodes[0].clone().with_size(330.0, 260.0);
    assert_eq!(calculate_group_sizes(&nodes, &GroupSizingConfig::default()).len(), 1);
}

#[test]
fn clamps_to_minimum_size() {
    let nodes = vec![
        Node::group("group:tiny", Point::new(0.0, 0.0)),
        Node::entity("a", Point::new(0.0, 0.0))
            .with_parent("group:tiny")
            .with_size(20.0, 20.0),
    ];
    let updates = calculate_group_sizes(&nodes, &GroupSizingConfig::default());
    assert_eq!(updates[0].size, Size::new(200.0, 150.0));
}

#[test]
fn skips_manual_groups_hidden_children_and_drags() {
    let config = GroupSizingConfig::default();

    let mut manual = group_with_children();
    manual[0].manually_resized = true;
    assert!(calculate_group_sizes(&manual, &config).is_empty());

    let mut hidden = group_with_children();
    hidden[1].hidden = true;
    hidden[2].hidden = true;
    assert!(calculate_group_sizes(&hidden, &config).is_empty());

    let mut dragging = group_with_children();
    dragging.push(Node::group("group:other", Point::new(900.0, 0.0)));
    dragging[1].dragging = true;
    assert!(calculate_group_sizes(&dragging, &config).is_empty());
}

#[test]
fn effective_size_prefers_plausible_measurements() {
    let config = GroupSizingConfig::default();
    let mut node = Node::entity("orders", Point::default()).with_size(200.0, 100.0);

    node.measured = Some(Size::new(210.0, 180.0));
    assert_eq!(effective_size(&node, &config), Size::new(210.0, 180.0));

    node.measured = Some(Size::new(210.0, 4.0));
    assert_eq!(effective_size(&node, &config), Size::new(200.0, 100.0));

    let bare = Node::entity("bare", Point::default());
    assert_eq!(effective_size(&bare, &config), Size::new(280.0, 120.0));

    let detailed = GroupSizingConfig {
        view_mode: ViewMode::Detailed,
        ..GroupSizingConfig::default()
    };
    assert_eq!(effective_size(&bare, &detailed), Size::new(280.0, 280.0));

    let mut collapsed = bare.clone();
    collapsed.collapsed = true;
    assert_eq!(effective_size(&collapsed, &detailed).height, 48.0);
}

#[test]
fn apply_updates_returns_new_nodes() {
    let nodes = group_with_children();
    let updates = calculate_group_sizes(&nodes, &GroupSizingConfig::default());
    let sized = apply_size_updates(&nodes, &updates);

    assert_eq!(sized[0].declared_size(), Some(Size::new(340.0, 260.0)));
    assert_eq!(nodes[0].declared_size(), None);
    assert!(calculate_group_sizes(&sized, &GroupSizingConfig::default()).is_empty());
}
