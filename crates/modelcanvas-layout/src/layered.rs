use std::collections::{HashMap, VecDeque};

use serde::Deserialize;

use crate::engine::{LayoutBackend, LayoutRequest, PlacedNode};
use crate::error::LayoutError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Direction {
    #[default]
    TB,
    BT,
    LR,
    RL,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutStyle {
    pub direction: Direction,
    /// Space between neighbours in the same layer.
    pub node_gap: f64,
    /// Space between consecutive layers.
    pub layer_gap: f64,
    pub crossing_passes: usize,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            direction: Direction::TB,
            node_gap: 60.0,
            layer_gap: 120.0,
            crossing_passes: 6,
        }
    }
}

/// Layered (Sugiyama-style) layout: cycle breaking, longest-path layering,
/// dummy nodes for long edges, barycentric crossing reduction, then
/// coordinate assignment.
#[derive(Debug, Clone, Default)]
pub struct LayeredLayout {
    pub style: LayoutStyle,
}

impl LayeredLayout {
    pub fn new(style: LayoutStyle) -> Self {
        Self { style }
    }
}

impl LayoutBackend for LayeredLayout {
    fn compute(&self, request: &LayoutRequest) -> Result<Vec<PlacedNode>, LayoutError> {
        layout_layered(request, &self.style)
    }
}

#[derive(Debug, Clone)]
struct WorkNode {
    width: f64,
    height: f64,
    layer: usize,
    order: usize,
    x: f64,
    y: f64,
}

#[derive(Debug, Clone)]
struct EdgeMeta {
    from: usize,
    to: usize,
    reversed: bool,
}

#[derive(Debug, Clone)]
struct UnitEdge {
    from: usize,
    to: usize,
}

pub fn layout_layered(
    request: &LayoutRequest,
    style: &LayoutStyle,
) -> Result<Vec<PlacedNode>, LayoutError> {
    let mut nodes = Vec::with_capacity(request.nodes.len());
    let mut node_index = HashMap::new();
    for node in &request.nodes {
        if !node.width.is_finite() || !node.height.is_finite() {
            return Err(LayoutError::InvalidSize(node.id.clone()));
        }
        node_index.insert(node.id.as_str(), nodes.len());
        nodes.push(WorkNode {
            width: node.width,
            height: node.height,
            layer: 0,
            order: 0,
            x: 0.0,
            y: 0.0,
        });
    }
    let real_count = nodes.len();

    let mut edges = Vec::with_capacity(request.edges.len());
    for (source, target) in &request.edges {
        let from = *node_index
            .get(source.as_str())
            .ok_or_else(|| LayoutError::UnknownNode(source.clone()))?;
        let to = *node_index
            .get(target.as_str())
            .ok_or_else(|| LayoutError::UnknownNode(target.clone()))?;
        if from != to {
            edges.push(EdgeMeta {
                from,
                to,
                reversed: false,
            });
        }
    }

    make_acyclic(&mut edges, nodes.len());
    assign_layers(&mut nodes, &edges);
    let unit_edges = insert_dummy_nodes(&mut nodes, &edges);
    let mut layers = build_layers(&mut nodes);
    reduce_crossings(&mut nodes, &mut layers, &unit_edges, style.crossing_passes);
    assign_coordinates(&mut nodes, &layers, style);

    let (width, height) = compute_graph_extent(&nodes);
    mirror_coordinates(&mut nodes, style.direction, width, height);

    Ok(request
        .nodes
        .iter()
        .zip(nodes.iter().take(real_count))
        .map(|(input, node)| PlacedNode {
            id: input.id.clone(),
            x: node.x,
            y: node.y,
            layer: node.layer,
            order: node.order,
        })
        .collect())
}

fn make_acyclic(edges: &mut [EdgeMeta], node_count: usize) {
    let mut adjacency = vec![Vec::new(); node_count];
    for (idx, edge) in edges.iter().enumerate() {
        adjacency[edge.from].push(idx);
    }

    let mut state = vec![0u8; node_count];
    for node in 0..node_count {
        if state[node] == 0 {
            dfs_cycle_break(node, &adjacency, edges, &mut state);
        }
    }

    for edge in edges.iter_mut() {
        if edge.reversed {
            std::mem::swap(&mut edge.from, &mut edge.to);
        }
    }
}

fn dfs_cycle_break(
    node: usize,
    adjacency: &[Vec<usize>],
    edges: &mut [EdgeMeta],
    state: &mut [u8],
) {
    state[node] = 1;
    for &edge_idx in &adjacency[node] {
        let to = edges[edge_idx].to;
        match state[to] {
            0 => dfs_cycle_break(to, adjacency, edges, state),
            1 => edges[edge_idx].reversed = true,
            _ => {}
        }
    }
    state[node] = 2;
}

fn assign_layers(nodes: &mut [WorkNode], edges: &[EdgeMeta]) {
    let node_count = nodes.len();
    let mut indegree = vec![0usize; node_count];
    let mut outgoing = vec![Vec::new(); node_count];

    for edge in edges {
        outgoing[edge.from].push(edge.to);
        indegree[edge.to] += 1;
    }

    let mut queue: VecDeque<usize> = (0..node_count).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(node_count);
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &next in &outgoing[node] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    for &node in &order {
        let current = nodes[node].layer;
        for &next in &outgoing[node] {
            nodes[next].layer = nodes[next].layer.max(current + 1);
        }
    }
}

fn insert_dummy_nodes(nodes: &mut Vec<WorkNode>, edges: &[EdgeMeta]) -> Vec<UnitEdge> {
    let mut unit_edges = Vec::new();

    for edge in edges {
        let from_layer = nodes[edge.from].layer;
        let to_layer = nodes[edge.to].layer;
        if to_layer <= from_layer + 1 {
            unit_edges.push(UnitEdge {
                from: edge.from,
                to: edge.to,
            });
            continue;
        }

        let mut prev = edge.from;
        for layer in (from_layer + 1)..to_layer {
            let dummy_idx = nodes.len();
            nodes.push(WorkNode {
                width: 1.0,
                height: 1.0,
                layer,
                order: 0,
                x: 0.0,
                y: 0.0,
            });
            unit_edges.push(UnitEdge {
                from: prev,
                to: dummy_idx,
            });
            prev = dummy_idx;
        }
        unit_edges.push(UnitEdge {
            from: prev,
            to: edge.to,
        });
    }

    unit_edges
}

fn build_layers(nodes: &mut [WorkNode]) -> Vec<Vec<usize>> {
    let max_layer = nodes.iter().map(|node| node.layer).max().unwrap_or(0);
    let mut layers = vec![Vec::new(); max_layer + 1];
    for (idx, node) in nodes.iter().enumerate() {
        layers[node.layer].push(idx);
    }
    for layer in &mut layers {
        for (order, &node_idx) in layer.iter().enumerate() {
            nodes[node_idx].order = order;
        }
    }
    layers
}

fn reduce_crossings(
    nodes: &mut [WorkNode],
    layers: &mut [Vec<usize>],
    unit_edges: &[UnitEdge],
    passes: usize,
) {
    let mut down_neighbors = vec![Vec::new(); nodes.len()];
    let mut up_neighbors = vec![Vec::new(); nodes.len()];
    for edge in unit_edges {
        if nodes[edge.to].layer == nodes[edge.from].layer + 1 {
            down_neighbors[edge.from].push(edge.to);
            up_neighbors[edge.to].push(edge.from);
        }
    }

    for pass in 0..passes {
        if pass % 2 == 0 {
            for layer in 1..layers.len() {
                reorder_layer(nodes, layers, layer, &up_neighbors);
            }
        } else {
            for layer in (0..layers.len().saturating_sub(1)).rev() {
                reorder_layer(nodes, layers, layer, &down_neighbors);
            }
        }
    }
}

fn reorder_layer(
    nodes: &mut [WorkNode],
    layers: &mut [Vec<usize>],
    layer_index: usize,
    neighbor_lists: &[Vec<usize>],
) {
    let mut scored: Vec<(usize, f64)> = layers[layer_index]
        .iter()
        .map(|&node_idx| {
            let neighbors = &neighbor_lists[node_idx];
            if neighbors.is_empty() {
                return (node_idx, nodes[node_idx].order as f64);
            }
            let sum: usize = neighbors.iter().map(|&n| nodes[n].order).sum();
            (node_idx, sum as f64 / neighbors.len() as f64)
        })
        .collect();

    scored.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| nodes[a.0].order.cmp(&nodes[b.0].order))
    });

    layers[layer_index] = scored.iter().map(|(idx, _)| *idx).collect();
    for (order, &node_idx) in layers[layer_index].iter().enumerate() {
        nodes[node_idx].order = order;
    }
}

fn assign_coordinates(nodes: &mut [WorkNode], layers: &[Vec<usize>], style: &LayoutStyle) {
    let horizontal = matches!(style.direction, Direction::LR | Direction::RL);

    // Extent of each layer along its own axis, used to center layers on the widest one.
    let extents: Vec<f64> = layers
        .iter()
        .map(|layer| {
            let span: f64 = layer
                .iter()
                .map(|&idx| {
                    if horizontal {
                        nodes[idx].height
                    } else {
                        nodes[idx].width
                    }
                })
                .sum();
            span + style.node_gap * layer.len().saturating_sub(1) as f64
        })
        .collect();
    let widest = extents.iter().copied().fold(0.0f64, f64::max);

    let mut depth = 0.0f64;
    for (layer, extent) in layers.iter().zip(&extents) {
        let thickness = layer
            .iter()
            .map(|&idx| {
                if horizontal {
                    nodes[idx].width
                } else {
                    nodes[idx].height
                }
            })
            .fold(0.0f64, f64::max);

        let mut cursor = (widest - extent) / 2.0;
        for &node_idx in layer {
            let node = &mut nodes[node_idx];
            if horizontal {
                node.x = depth + thickness / 2.0;
                node.y = cursor + node.height / 2.0;
                cursor += node.height + style.node_gap;
            } else {
                node.x = cursor + node.width / 2.0;
                node.y = depth + thickness / 2.0;
                cursor += node.width + style.node_gap;
            }
        }
        depth += thickness + style.layer_gap;
    }
}

fn compute_graph_extent(nodes: &[WorkNode]) -> (f64, f64) {
    let mut max_x = 0.0f64;
    let mut max_y = 0.0f64;
    for node in nodes {
        max_x = max_x.max(node.x + node.width / 2.0);
        max_y = max_y.max(node.y + node.height / 2.0);
    }
    (max_x, max_y)
}

fn mirror_coordinates(nodes: &mut [WorkNode], direction: Direction, width: f64, height: f64) {
    match direction {
        Direction::TB | Direction::LR => {}
        Direction::BT => {
            for node in nodes {
                node.y = height - node.y;
            }
        }
        Direction::RL => {
            for node in nodes {
                node.x = width - node.x;
            }
        }
    }
}
