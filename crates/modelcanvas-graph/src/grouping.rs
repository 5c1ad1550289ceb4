use std::collections::HashMap;

use serde::Deserialize;

use crate::model::{absolute_position, Node, Point};

pub const GROUP_ID_PREFIX: &str = "group:";

/// Insets between a group's border and its children.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroupFrame {
    pub padding: f64,
    /// Extra space above the children reserved for the group title.
    pub header_height: f64,
}

impl Default for GroupFrame {
    fn default() -> Self {
        Self {
            padding: 40.0,
            header_height: 40.0,
        }
    }
}

impl GroupFrame {
    /// Where a group's origin goes so that a child at `top_left` sits just
    /// inside the frame.
    pub fn origin_for(&self, top_left: Point) -> Point {
        Point::new(
            top_left.x - self.padding,
            top_left.y - self.padding - self.header_height,
        )
    }
}

pub fn group_id(folder: &str) -> String {
    format!("{GROUP_ID_PREFIX}{folder}")
}

/// Rebuilds group nodes from the entities' `folder` metadata.
///
/// One group exists per distinct folder, in first-seen order, ahead of all
/// entities so parents always precede their children. Existing groups keep
/// their position, size and manual-resize flag; new groups are framed around
/// their children. Entities without a folder end up ungrouped at their
/// absolute position.
pub fn apply_folder_groups(nodes: &[Node], frame: &GroupFrame) -> Vec<Node> {
    let existing: HashMap<&str, &Node> = nodes
        .iter()
        .filter(|node| node.is_group())
        .map(|node| (node.id.as_str(), node))
        .collect();

    let mut entities: Vec<(Node, Point)> = nodes
        .iter()
        .filter(|node| node.is_entity())
        .map(|node| (node.clone(), absolute_position(node, nodes)))
        .collect();

    let mut folders: Vec<&str> = Vec::new();
    for (entity, _) in &entities {
        if let Some(folder) = entity.data.folder.as_deref() {
            if !folders.contains(&folder) {
                folders.push(folder);
            }
        }
    }

    let mut groups = Vec::with_capacity(folders.len());
    let mut origins: HashMap<String, Point> = HashMap::new();
    for folder in folders {
        let id = group_id(folder);
        let group = match existing.get(id.as_str()) {
            Some(current) => (*current).clone(),
            None => {
                let top_left = entities
                    .iter()
                    .filter(|(entity, _)| entity.data.folder.as_deref() == Some(folder))
                    .fold(Point::new(f64::MAX, f64::MAX), |acc, (_, absolute)| {
                        Point::new(acc.x.min(absolute.x), acc.y.min(absolute.y))
                    });
                let mut group = Node::group(id.clone(), frame.origin_for(top_left));
                group.data.label = folder.to_string();
                group
            }
        };
        origins.insert(id, group.position);
        groups.push(group);
    }

    for (entity, absolute) in &mut entities {
        match entity.data.folder.as_deref().map(group_id) {
            Some(parent) => {
                let origin = origins[&parent];
                entity.position = Point::new(absolute.x - origin.x, absolute.y - origin.y);
                entity.parent_id = Some(parent);
            }
            None => {
                entity.position = *absolute;
                entity.parent_id = None;
            }
        }
    }

    groups.extend(entities.into_iter().map(|(entity, _)| entity));
    groups
}
