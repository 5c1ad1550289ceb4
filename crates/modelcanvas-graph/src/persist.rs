use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::aggregate::{aggregate, disaggregate};
use crate::error::ModelError;
use crate::model::{
    absolute_position, Edge, EntityData, EntityType, LabelOffset, ModelLink, Node, Point,
    RelationshipType,
};

pub const MODEL_VERSION: u32 = 1;

/// The document exchanged with the schema backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Default for GraphModel {
    fn default() -> Self {
        Self {
            version: MODEL_VERSION,
            entities: Vec::new(),
            relationships: Vec::new(),
        }
    }
}

fn default_version() -> u32 {
    MODEL_VERSION
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_height: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityRecord {
    pub fn new(id: impl Into<String>, position: Point) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            description: None,
            position,
            width: None,
            panel_height: None,
            collapsed: false,
            tags: Vec::new(),
            entity_type: None,
            folder: None,
            extra: Map::new(),
        }
    }
}

/// A raw relationship record: one field-level link between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: RelationshipType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_model_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_model_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_offset: Option<LabelOffset>,
}

impl Relationship {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
            kind: RelationshipType::default(),
            source_field: None,
            target_field: None,
            source_model_ref: None,
            target_model_ref: None,
            source_model_version: None,
            target_model_version: None,
            label_offset: None,
        }
    }

    pub fn with_fields(mut self, source_field: &str, target_field: &str) -> Self {
        self.source_field = Some(source_field.to_string());
        self.target_field = Some(target_field.to_string());
        self
    }

    /// The record as an edge link, not tied to any document position.
    pub fn link(&self) -> ModelLink {
        ModelLink {
            source: self.source.clone(),
            target: self.target.clone(),
            label: self.label.clone(),
            kind: self.kind,
            label_offset: self.label_offset,
            source_field: self.source_field.clone(),
            target_field: self.target_field.clone(),
            source_model_ref: self.source_model_ref.clone(),
            target_model_ref: self.target_model_ref.clone(),
            source_model_version: self.source_model_version.clone(),
            target_model_version: self.target_model_version.clone(),
            record_index: None,
        }
    }

    pub(crate) fn from_link(link: &ModelLink) -> Self {
        Self {
            source: link.source.clone(),
            target: link.target.clone(),
            label: link.label.clone(),
            kind: link.kind,
            source_field: link.source_field.clone(),
            target_field: link.target_field.clone(),
            source_model_ref: link.source_model_ref.clone(),
            target_model_ref: link.target_model_ref.clone(),
            source_model_version: link.source_model_version.clone(),
            target_model_version: link.target_model_version.clone(),
            label_offset: link.label_offset,
        }
    }

    /// A bare record for an edge drawn on the canvas without any stored link.
    pub(crate) fn from_edge(edge: &Edge) -> Self {
        Self {
            label: edge.label.clone(),
            kind: edge.kind,
            label_offset: edge.label_offset,
            ..Self::new(edge.source.clone(), edge.target.clone())
        }
    }
}

/// Checks a model without converting it, returning every problem found.
pub fn validate_model(model: &GraphModel) -> Vec<ModelError> {
    let mut issues = Vec::new();
    if model.version > MODEL_VERSION {
        issues.push(ModelError::UnsupportedVersion {
            found: model.version,
            supported: MODEL_VERSION,
        });
    }

    let mut ids = HashSet::new();
    for entity in &model.entities {
        if !ids.insert(entity.id.as_str()) {
            issues.push(ModelError::DuplicateEntity(entity.id.clone()));
        }
    }

    for relationship in &model.relationships {
        for endpoint in [&relationship.source, &relationship.target] {
            if !ids.contains(endpoint.as_str()) {
                issues.push(ModelError::DanglingRelationship {
                    from: relationship.source.clone(),
                    to: relationship.target.clone(),
                    missing: endpoint.clone(),
                });
                break;
            }
        }
    }
    issues
}

/// Builds ungrouped entity nodes (absolute positions) and aggregated edges.
///
/// Duplicate ids and unsupported versions are errors. Relationships pointing at
/// entities that are not on the canvas are dropped with a warning, since the
/// backend may know about models the canvas does not show.
pub fn graph_from_model(model: &GraphModel) -> Result<(Vec<Node>, Vec<Edge>), ModelError> {
    if model.version > MODEL_VERSION {
        return Err(ModelError::UnsupportedVersion {
            found: model.version,
            supported: MODEL_VERSION,
        });
    }

    let mut ids = HashSet::new();
    let mut nodes = Vec::with_capacity(model.entities.len());
    for record in &model.entities {
        if !ids.insert(record.id.clone()) {
            return Err(ModelError::DuplicateEntity(record.id.clone()));
        }
        nodes.push(node_from_record(record));
    }

    let relationships: Vec<Relationship> = model
        .relationships
        .iter()
        .filter(|relationship| {
            let known = ids.contains(&relationship.source) && ids.contains(&relationship.target);
            if !known {
                warn!(
                    source = %relationship.source,
                    target = %relationship.target,
                    "dropping relationship to an entity that is not on the canvas"
                );
            }
            known
        })
        .cloned()
        .collect();

    Ok((nodes, aggregate(&relationships)))
}

fn node_from_record(record: &EntityRecord) -> Node {
    let mut node = Node::entity(record.id.clone(), record.position);
    node.width = record.width;
    node.height = record.panel_height;
    node.collapsed = record.collapsed;
    node.entity_type = record.entity_type;
    node.data = EntityData {
        label: record.label.clone(),
        description: record.description.clone(),
        tags: record.tags.clone(),
        folder: record.folder.clone(),
        extra: record.extra.clone(),
    };
    node
}

/// Produces the persisted document for a graph. Groups and volatile node state
/// (`hidden`, `measured`, `dragging`) are not written.
pub fn model_from_graph(nodes: &[Node], edges: &[Edge]) -> GraphModel {
    let entities = nodes
        .iter()
        .filter(|node| node.is_entity())
        .map(|node| EntityRecord {
            id: node.id.clone(),
            label: node.data.label.clone(),
            description: node.data.description.clone(),
            position: absolute_position(node, nodes),
            width: node.width,
            panel_height: node.height,
            collapsed: node.collapsed,
            tags: node.data.tags.clone(),
            entity_type: node.entity_type,
            folder: node.data.folder.clone(),
            extra: node.data.extra.clone(),
        })
        .collect();

    GraphModel {
        version: MODEL_VERSION,
        entities,
        relationships: disaggregate(edges),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_default_fields_when_serializing() {
        let record = EntityRecord::new("orders", Point::new(10.0, 20.0));
        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert!(object.contains_key("id"));
        assert!(object.contains_key("label"));
        assert!(object.contains_key("position"));
    }

    #[test]
    fn keeps_unknown_entity_fields() {
        let json = r#"{"id":"orders","label":"Orders","position":{"x":1.0,"y":2.0},"owner":"finance"}"#;
        let record: EntityRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.extra.get("owner"), Some(&Value::from("finance")));
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["owner"], Value::from("finance"));
    }
}
