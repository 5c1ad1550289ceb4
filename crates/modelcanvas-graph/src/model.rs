use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in canvas coordinates, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Entity,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Fact,
    Dimension,
    #[default]
    Unclassified,
}

/// Metadata attached to a node that the canvas carries but does not interpret.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityData {
    pub label: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub folder: Option<String>,
    /// Persisted fields this version does not know about, written back verbatim.
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// Absolute for top-level nodes, relative to the parent origin otherwise.
    pub position: Point,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub collapsed: bool,
    pub parent_id: Option<String>,
    pub entity_type: Option<EntityType>,
    pub manually_resized: bool,
    pub hidden: bool,
    /// Size reported by the rendering surface. Never persisted.
    pub measured: Option<Size>,
    /// Set by the rendering surface while the node is being dragged. Never persisted.
    pub dragging: bool,
    pub data: EntityData,
}

impl Node {
    pub fn entity(id: impl Into<String>, position: Point) -> Self {
        let id = id.into();
        Self {
            data: EntityData {
                label: id.clone(),
                ..EntityData::default()
            },
            id,
            kind: NodeKind::Entity,
            position,
            width: None,
            height: None,
            collapsed: false,
            parent_id: None,
            entity_type: None,
            manually_resized: false,
            hidden: false,
            measured: None,
            dragging: false,
        }
    }

    pub fn group(id: impl Into<String>, position: Point) -> Self {
        Self {
            kind: NodeKind::Group,
            ..Self::entity(id, position)
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.data.folder = Some(folder.into());
        self
    }

    pub fn is_entity(&self) -> bool {
        self.kind == NodeKind::Entity
    }

    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    pub fn role(&self) -> EntityType {
        self.entity_type.unwrap_or_default()
    }

    pub fn declared_size(&self) -> Option<Size> {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Some(Size::new(width, height)),
            _ => None,
        }
    }
}

/// Resolves a node's canvas position, adding its parent's origin when it is grouped.
pub fn absolute_position(node: &Node, nodes: &[Node]) -> Point {
    let Some(parent_id) = node.parent_id.as_deref() else {
        return node.position;
    };
    match nodes.iter().find(|candidate| candidate.id == parent_id) {
        Some(parent) => {
            let origin = absolute_position(parent, nodes);
            node.position.offset(origin.x, origin.y)
        }
        None => node.position,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    OneToMany,
    #[default]
    ManyToOne,
    OneToOne,
    ManyToMany,
}

/// One stored relationship record underlying a canvas edge.
///
/// A link keeps its record's own direction and attributes, so an edge drawn
/// `orders -> customers` can carry a `customers -> orders` record unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelLink {
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    pub kind: RelationshipType,
    pub label_offset: Option<LabelOffset>,
    pub source_field: Option<String>,
    pub target_field: Option<String>,
    pub source_model_ref: Option<String>,
    pub target_model_ref: Option<String>,
    pub source_model_version: Option<String>,
    pub target_model_version: Option<String>,
    /// Position of the record in the document it was loaded from.
    pub record_index: Option<usize>,
}

impl ModelLink {
    /// Same record content, wherever it came from.
    pub fn same_record(&self, other: &ModelLink) -> bool {
        self.source == other.source
            && self.target == other.target
            && self.label == other.label
            && self.kind == other.kind
            && self.label_offset == other.label_offset
            && self.source_field == other.source_field
            && self.target_field == other.target_field
            && self.source_model_ref == other.source_model_ref
            && self.target_model_ref == other.target_model_ref
            && self.source_model_version == other.source_model_version
            && self.target_model_version == other.target_model_version
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelOffset {
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    pub kind: RelationshipType,
    pub models: Vec<ModelLink>,
    pub label_offset: Option<LabelOffset>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: edge_id(&source, &target),
            source,
            target,
            label: None,
            kind: RelationshipType::default(),
            models: Vec::new(),
            label_offset: None,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

pub fn edge_id(source: &str, target: &str) -> String {
    format!("{source}--{target}")
}
