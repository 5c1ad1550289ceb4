use std::collections::HashMap;
use std::fmt::Write as _;

use modelcanvas_graph::{absolute_position, Edge, LabelOffset, Node, Point, Rect, Size};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Distance between parallel edges joining the same pair of nodes.
    pub parallel_spacing: f64,
    /// Vertical distance of each self-loop end from the side's midpoint.
    pub self_loop_margin: f64,
    pub self_loop_radius: f64,
    pub marker_size: f64,
    /// Fallback size for nodes that were never measured or sized.
    pub node_size: Size,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            parallel_spacing: 16.0,
            self_loop_margin: 20.0,
            self_loop_radius: 60.0,
            marker_size: 10.0,
            node_size: Size::new(280.0, 120.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    /// Unit vector pointing away from the node through this side.
    fn outward(self) -> (f64, f64) {
        match self {
            Side::Left => (-1.0, 0.0),
            Side::Right => (1.0, 0.0),
            Side::Top => (0.0, -1.0),
            Side::Bottom => (0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub source_side: Side,
    pub target_side: Side,
    pub source: Point,
    pub target: Point,
}

/// Arrowhead triangle at the end of a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub tip: Point,
    pub left: Point,
    pub right: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRoute {
    pub edge_id: String,
    pub connection: Connection,
    /// Polyline of the route. Self-loops list their curve's control points.
    pub points: Vec<Point>,
    pub path: String,
    pub label: Point,
    pub marker: Marker,
}

pub fn anchor_point(rect: &Rect, side: Side) -> Point {
    let center = rect.center();
    match side {
        Side::Left => Point::new(rect.x, center.y),
        Side::Right => Point::new(rect.right(), center.y),
        Side::Top => Point::new(center.x, rect.y),
        Side::Bottom => Point::new(center.x, rect.bottom()),
    }
}

/// Picks the facing sides of two distinct nodes. Ties go horizontal.
pub fn connection_sides(source: &Rect, target: &Rect) -> Connection {
    let from = source.center();
    let to = target.center();
    let dx = to.x - from.x;
    let dy = to.y - from.y;

    let (source_side, target_side) = if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            (Side::Right, Side::Left)
        } else {
            (Side::Left, Side::Right)
        }
    } else if dy >= 0.0 {
        (Side::Bottom, Side::Top)
    } else {
        (Side::Top, Side::Bottom)
    };

    Connection {
        source_side,
        target_side,
        source: anchor_point(source, source_side),
        target: anchor_point(target, target_side),
    }
}

/// Both ends of a self-relationship sit on the right side, `margin` above and
/// below its midpoint.
pub fn self_loop_connection(rect: &Rect, margin: f64) -> Connection {
    let anchor = anchor_point(rect, Side::Right);
    Connection {
        source_side: Side::Right,
        target_side: Side::Right,
        source: anchor.offset(0.0, -margin),
        target: anchor.offset(0.0, margin),
    }
}

/// `0, +s, -s, +2s, -2s, ...` for the n-th edge between the same two nodes.
pub fn parallel_offset(index: usize, spacing: f64) -> f64 {
    if index == 0 {
        return 0.0;
    }
    let step = index.div_ceil(2) as f64 * spacing;
    if index % 2 == 1 { step } else { -step }
}

/// Lane index of every edge among the edges sharing its unordered endpoint
/// pair, in edge order.
pub fn assign_lanes(edges: &[Edge]) -> Vec<usize> {
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
    edges
        .iter()
        .map(|edge| {
            let key = if edge.source <= edge.target {
                (edge.source.as_str(), edge.target.as_str())
            } else {
                (edge.target.as_str(), edge.source.as_str())
            };
            let lane = seen.entry(key).or_insert(0);
            let current = *lane;
            *lane += 1;
            current
        })
        .collect()
}

/// Step route between two anchors: exit, travel along the bend axis, enter.
///
/// [`connection_sides`] always pairs opposite sides, so the route has a
/// single bend axis halfway between the anchors, which turns into a straight
/// line when the anchors are aligned. The axis follows `source_side`.
///
/// The whole route is displaced perpendicular to the exit direction by
/// `lane_offset`. The bend axis moves by the component of `label_offset` that
/// runs along it, so a dragged label pulls its segment with it.
pub fn orthogonal_path(
    source: Point,
    source_side: Side,
    target: Point,
    lane_offset: f64,
    label_offset: Option<LabelOffset>,
) -> Vec<Point> {
    let offset = label_offset.unwrap_or_default();
    let mut points = Vec::with_capacity(4);

    if source_side.is_horizontal() {
        let start = source.offset(0.0, lane_offset);
        let end = target.offset(0.0, lane_offset);
        let bend_x = (start.x + end.x) / 2.0 + offset.dx + lane_offset;
        push_point(&mut points, start);
        push_point(&mut points, Point::new(bend_x, start.y));
        push_point(&mut points, Point::new(bend_x, end.y));
        push_point(&mut points, end);
    } else {
        let start = source.offset(lane_offset, 0.0);
        let end = target.offset(lane_offset, 0.0);
        let bend_y = (start.y + end.y) / 2.0 + offset.dy + lane_offset;
        push_point(&mut points, start);
        push_point(&mut points, Point::new(start.x, bend_y));
        push_point(&mut points, Point::new(end.x, bend_y));
        push_point(&mut points, end);
    }

    points
}

/// Control points of the cubic curve leaving `start` and returning to `end`
/// through `side`.
pub fn self_loop_points(start: Point, end: Point, side: Side, radius: f64) -> [Point; 4] {
    let (ox, oy) = side.outward();
    [
        start,
        start.offset(ox * radius, oy * radius),
        end.offset(ox * radius, oy * radius),
        end,
    ]
}

pub fn self_loop_path(start: Point, end: Point, side: Side, radius: f64) -> String {
    let [p0, p1, p2, p3] = self_loop_points(start, end, side, radius);
    format!(
        "M {} {} C {} {}, {} {}, {} {}",
        p0.x, p0.y, p1.x, p1.y, p2.x, p2.y, p3.x, p3.y
    )
}

pub fn polyline_path(points: &[Point]) -> String {
    let mut path = String::new();
    for (idx, point) in points.iter().enumerate() {
        let command = if idx == 0 { "M" } else { " L" };
        let _ = write!(path, "{command} {} {}", point.x, point.y);
    }
    path
}

/// Point halfway along the polyline's length.
pub fn label_position(points: &[Point]) -> Point {
    let Some(first) = points.first() else {
        return Point::default();
    };
    let total: f64 = points.windows(2).map(|pair| pair[0].distance(pair[1])).sum();
    let mut remaining = total / 2.0;
    for pair in points.windows(2) {
        let length = pair[0].distance(pair[1]);
        if length > 0.0 && remaining <= length {
            let t = remaining / length;
            return Point::new(
                pair[0].x + (pair[1].x - pair[0].x) * t,
                pair[0].y + (pair[1].y - pair[0].y) * t,
            );
        }
        remaining -= length;
    }
    *first
}

/// Arrowhead at the route's last point, aligned with its final segment.
pub fn marker_points(points: &[Point], size: f64) -> Marker {
    let tip = points.last().copied().unwrap_or_default();
    let before = points
        .iter()
        .rev()
        .skip(1)
        .find(|point| point.distance(tip) > f64::EPSILON)
        .copied()
        .unwrap_or(tip);

    let length = before.distance(tip);
    let (ux, uy) = if length > 0.0 {
        ((tip.x - before.x) / length, (tip.y - before.y) / length)
    } else {
        (1.0, 0.0)
    };
    let base = Point::new(tip.x - ux * size, tip.y - uy * size);
    let half = size / 2.0;
    Marker {
        tip,
        left: Point::new(base.x - uy * half, base.y + ux * half),
        right: Point::new(base.x + uy * half, base.y - ux * half),
    }
}

pub fn node_rect(node: &Node, nodes: &[Node], config: &RoutingConfig) -> Rect {
    let size = node
        .measured
        .or_else(|| node.declared_size())
        .unwrap_or(config.node_size);
    Rect::new(absolute_position(node, nodes), size)
}

/// Full route for one edge, or `None` when an endpoint is missing.
pub fn route_edge(
    edge: &Edge,
    nodes: &[Node],
    lane: usize,
    config: &RoutingConfig,
) -> Option<EdgeRoute> {
    let source = nodes.iter().find(|node| node.id == edge.source)?;
    let target = nodes.iter().find(|node| node.id == edge.target)?;
    let source_rect = node_rect(source, nodes, config);
    let offset = edge.label_offset.unwrap_or_default();

    if edge.is_self_loop() {
        let radius = config.self_loop_radius + parallel_offset(lane, config.parallel_spacing).abs();
        let connection = self_loop_connection(&source_rect, config.self_loop_margin);
        let curve = self_loop_points(
            connection.source,
            connection.target,
            connection.source_side,
            radius,
        );
        // Midpoint of the cubic curve.
        let apex = Point::new(
            (curve[0].x + 3.0 * curve[1].x + 3.0 * curve[2].x + curve[3].x) / 8.0,
            (curve[0].y + 3.0 * curve[1].y + 3.0 * curve[2].y + curve[3].y) / 8.0,
        );
        return Some(EdgeRoute {
            edge_id: edge.id.clone(),
            connection,
            path: self_loop_path(
                connection.source,
                connection.target,
                connection.source_side,
                radius,
            ),
            label: apex.offset(offset.dx, offset.dy),
            marker: marker_points(&curve, config.marker_size),
            points: curve.to_vec(),
        });
    }

    let target_rect = node_rect(target, nodes, config);
    let connection = connection_sides(&source_rect, &target_rect);
    let points = orthogonal_path(
        connection.source,
        connection.source_side,
        connection.target,
        parallel_offset(lane, config.parallel_spacing),
        edge.label_offset,
    );

    // The bend already absorbed the along-axis part of the offset.
    let label = if connection.source_side.is_horizontal() {
        label_position(&points).offset(0.0, offset.dy)
    } else {
        label_position(&points).offset(offset.dx, 0.0)
    };

    Some(EdgeRoute {
        edge_id: edge.id.clone(),
        connection,
        path: polyline_path(&points),
        label,
        marker: marker_points(&points, config.marker_size),
        points,
    })
}

/// Routes every edge whose endpoints are present, assigning parallel lanes.
pub fn route_all(edges: &[Edge], nodes: &[Node], config: &RoutingConfig) -> Vec<EdgeRoute> {
    let lanes = assign_lanes(edges);
    edges
        .iter()
        .zip(lanes)
        .filter_map(|(edge, lane)| route_edge(edge, nodes, lane, config))
        .collect()
}

fn push_point(points: &mut Vec<Point>, point: Point) {
    if let Some(last) = points.last() {
        if (last.x - point.x).abs() < 0.01 && (last.y - point.y).abs() < 0.01 {
            return;
        }
    }
    points.push(point);
}
