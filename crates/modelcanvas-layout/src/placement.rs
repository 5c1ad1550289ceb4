use std::f64::consts::TAU;

use modelcanvas_graph::{absolute_position, EntityType, Node, Point};
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

/// Tunables for placing a newly created entity on the canvas.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Used as the graph center when the canvas has no entities yet.
    pub default_center: Point,
    /// Facts land within this distance of the center on each axis.
    pub fact_offset: f64,
    pub min_radius: f64,
    pub radius_span: f64,
    pub unclassified_origin: Point,
    pub unclassified_window: f64,
    pub max_attempts: usize,
    pub min_separation: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            default_center: Point::new(400.0, 300.0),
            fact_offset: 100.0,
            min_radius: 300.0,
            radius_span: 200.0,
            unclassified_origin: Point::new(100.0, 100.0),
            unclassified_window: 50.0,
            max_attempts: 10,
            min_separation: 150.0,
        }
    }
}

/// Midpoint of the bounding box of all entity positions. Groups do not count.
pub fn graph_center(nodes: &[Node], config: &PlacementConfig) -> Point {
    let mut entities = nodes
        .iter()
        .filter(|node| node.is_entity())
        .map(|node| absolute_position(node, nodes))
        .peekable();
    if entities.peek().is_none() {
        return config.default_center;
    }

    let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
    for point in entities {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
}

/// Star-schema placement: facts near the middle, dimensions on a ring around
/// it, unclassified entities in a fixed corner.
pub fn smart_position(
    nodes: &[Node],
    role: EntityType,
    config: &PlacementConfig,
    rng: &mut impl Rng,
) -> Point {
    match role {
        EntityType::Fact => {
            let center = graph_center(nodes, config);
            let offset = config.fact_offset.max(0.0);
            center.offset(
                rng.gen_range(-offset..=offset),
                rng.gen_range(-offset..=offset),
            )
        }
        EntityType::Dimension => {
            let center = graph_center(nodes, config);
            let angle = rng.gen_range(0.0..TAU);
            let min_radius = config.min_radius.max(0.0);
            let radius = rng.gen_range(min_radius..=min_radius + config.radius_span.max(0.0));
            center.offset(radius * angle.cos(), radius * angle.sin())
        }
        EntityType::Unclassified => {
            let window = config.unclassified_window.max(0.0);
            config
                .unclassified_origin
                .offset(rng.gen_range(0.0..=window), rng.gen_range(0.0..=window))
        }
    }
}

/// Retries [`smart_position`] until the candidate keeps `min_separation` from
/// every entity. Gives back the last candidate when every attempt collides.
pub fn smart_position_avoiding_overlap(
    nodes: &[Node],
    role: EntityType,
    config: &PlacementConfig,
    rng: &mut impl Rng,
) -> Point {
    let occupied: Vec<Point> = nodes
        .iter()
        .filter(|node| node.is_entity())
        .map(|node| absolute_position(node, nodes))
        .collect();

    let attempts = config.max_attempts.max(1);
    let mut candidate = smart_position(nodes, role, config, rng);
    for attempt in 1..=attempts {
        if occupied
            .iter()
            .all(|point| point.distance(candidate) > config.min_separation)
        {
            return candidate;
        }
        if attempt == attempts {
            break;
        }
        candidate = smart_position(nodes, role, config, rng);
    }

    debug!(?role, attempts, "no overlap-free position found, using last candidate");
    candidate
}
