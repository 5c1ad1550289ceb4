use std::collections::{HashMap, HashSet};

use modelcanvas_graph::{absolute_position, Edge, Node, Point};
use tracing::{info, warn};

use crate::error::LayoutError;
use crate::layered::{LayeredLayout, LayoutStyle};
use crate::sizing::{apply_size_updates, calculate_group_sizes, effective_size, GroupSizingConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutInput {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutRequest {
    pub nodes: Vec<LayoutInput>,
    /// `(source, target)` pairs. Every endpoint must name an entry in `nodes`.
    pub edges: Vec<(String, String)>,
}

/// A node placed by a backend. `x`/`y` are the node's center.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub layer: usize,
    pub order: usize,
}

pub trait LayoutBackend: Send + Sync {
    fn compute(&self, request: &LayoutRequest) -> Result<Vec<PlacedNode>, LayoutError>;
}

/// Whole-graph auto layout over entity nodes, with groups re-framed around
/// their children afterwards.
pub struct LayoutEngine {
    backend: Option<Box<dyn LayoutBackend>>,
    sizing: GroupSizingConfig,
}

impl LayoutEngine {
    pub fn new(backend: impl LayoutBackend + 'static, sizing: GroupSizingConfig) -> Self {
        Self {
            backend: Some(Box::new(backend)),
            sizing,
        }
    }

    pub fn layered(style: LayoutStyle, sizing: GroupSizingConfig) -> Self {
        Self::new(LayeredLayout::new(style), sizing)
    }

    /// An engine without a backend. `layout` hands back its input untouched.
    pub fn headless() -> Self {
        Self {
            backend: None,
            sizing: GroupSizingConfig::default(),
        }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn layout(&self, nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
        let Some(backend) = self.backend.as_deref() else {
            return nodes.to_vec();
        };

        let request = self.build_request(nodes, edges);
        if request.nodes.is_empty() {
            return nodes.to_vec();
        }

        let placed = match backend.compute(&request) {
            Ok(placed) => placed,
            Err(err) => {
                warn!(error = %err, "auto layout failed, keeping current positions");
                return nodes.to_vec();
            }
        };

        let centers: HashMap<&str, Point> = placed
            .iter()
            .map(|node| (node.id.as_str(), Point::new(node.x, node.y)))
            .collect();

        // Absolute top-left corner of every entity after layout.
        let mut entity_positions: HashMap<&str, Point> = HashMap::new();
        for node in nodes.iter().filter(|node| node.is_entity()) {
            let position = match centers.get(node.id.as_str()) {
                Some(center) => {
                    let size = effective_size(node, &self.sizing);
                    Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0)
                }
                None => absolute_position(node, nodes),
            };
            entity_positions.insert(node.id.as_str(), position);
        }

        let mut group_origins: HashMap<&str, Point> = HashMap::new();
        for group in nodes.iter().filter(|node| node.is_group()) {
            let top_left = nodes
                .iter()
                .filter(|node| node.parent_id.as_deref() == Some(group.id.as_str()))
                .filter_map(|child| entity_positions.get(child.id.as_str()))
                .fold(None, |acc: Option<Point>, point| {
                    Some(match acc {
                        Some(acc) => Point::new(acc.x.min(point.x), acc.y.min(point.y)),
                        None => *point,
                    })
                });
            let origin = match top_left {
                Some(top_left) => self.sizing.frame.origin_for(top_left),
                None => group.position,
            };
            group_origins.insert(group.id.as_str(), origin);
        }

        let laid_out: Vec<Node> = nodes
            .iter()
            .map(|node| {
                let mut node = node.clone();
                if node.is_group() {
                    if let Some(origin) = group_origins.get(node.id.as_str()) {
                        node.position = *origin;
                    }
                    return node;
                }
                if let Some(absolute) = entity_positions.get(node.id.as_str()) {
                    node.position = match node
                        .parent_id
                        .as_deref()
                        .and_then(|parent| group_origins.get(parent))
                    {
                        Some(origin) => Point::new(absolute.x - origin.x, absolute.y - origin.y),
                        None => *absolute,
                    };
                }
                node
            })
            .collect();

        let updates = calculate_group_sizes(&laid_out, &self.sizing);
        info!(
            entities = request.nodes.len(),
            edges = request.edges.len(),
            resized_groups = updates.len(),
            "auto layout applied"
        );
        apply_size_updates(&laid_out, &updates)
    }

    fn build_request(&self, nodes: &[Node], edges: &[Edge]) -> LayoutRequest {
        let entity_ids: HashSet<&str> = nodes
            .iter()
            .filter(|node| node.is_entity())
            .map(|node| node.id.as_str())
            .collect();

        LayoutRequest {
            nodes: nodes
                .iter()
                .filter(|node| node.is_entity())
                .map(|node| {
                    let size = effective_size(node, &self.sizing);
                    LayoutInput {
                        id: node.id.clone(),
                        width: size.width,
                        height: size.height,
                    }
                })
                .collect(),
            edges: edges
                .iter()
                .filter(|edge| !edge.is_self_loop())
                .filter(|edge| {
                    entity_ids.contains(edge.source.as_str())
                        && entity_ids.contains(edge.target.as_str())
                })
                .map(|edge| (edge.source.clone(), edge.target.clone()))
                .collect(),
        }
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::layered(LayoutStyle::default(), GroupSizingConfig::default())
    }
}
