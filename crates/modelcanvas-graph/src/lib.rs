mod aggregate;
mod error;
mod filter;
mod grouping;
mod history;
mod model;
mod persist;
mod store;

pub use aggregate::{aggregate, disaggregate, merge};
pub use error::ModelError;
pub use filter::{apply_filters, NodeFilter};
pub use grouping::{apply_folder_groups, group_id, GroupFrame, GROUP_ID_PREFIX};
pub use history::{HistorySnapshot, HistoryStack, DEFAULT_MAX_HISTORY};
pub use model::{
    absolute_position, edge_id, Edge, EntityData, EntityType, LabelOffset, ModelLink, Node,
    NodeKind, Point, Rect, RelationshipType, Size,
};
pub use persist::{
    graph_from_model, model_from_graph, validate_model, EntityRecord, GraphModel, Relationship,
    MODEL_VERSION,
};
pub use store::{cascade_delete, GraphState, GraphStore, StoreChange, SubscriptionId};
