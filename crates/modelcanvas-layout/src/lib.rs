mod engine;
mod error;
mod layered;
mod placement;
mod routing;
mod sizing;

pub use engine::{LayoutBackend, LayoutEngine, LayoutInput, LayoutRequest, PlacedNode};
pub use error::LayoutError;
pub use layered::{layout_layered, Direction, LayeredLayout, LayoutStyle};
pub use placement::{graph_center, smart_position, smart_position_avoiding_overlap, PlacementConfig};
pub use routing::{
    anchor_point, assign_lanes, connection_sides, label_position, marker_points, node_rect,
    orthogonal_path, parallel_offset, polyline_path, route_all, route_edge, self_loop_connection,
    self_loop_path, self_loop_points, Connection, EdgeRoute, Marker, RoutingConfig, Side,
};
pub use sizing::{
    apply_size_updates, calculate_group_sizes, effective_size, GroupSizingConfig, SizeUpdate,
    ViewMode,
};
