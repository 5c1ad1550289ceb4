use crate::model::{EntityType, Node};

/// Visibility constraints chosen in the canvas toolbar. Empty fields do not
/// constrain anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeFilter {
    /// An entity stays visible when it carries any of these tags.
    pub tags: Vec<String>,
    pub entity_types: Vec<EntityType>,
    /// Case-insensitive substring of the id or label.
    pub search: Option<String>,
}

impl NodeFilter {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
            && self.entity_types.is_empty()
            && self.search.as_deref().is_none_or(str::is_empty)
    }

    pub fn matches(&self, node: &Node) -> bool {
        if !self.tags.is_empty() && !node.data.tags.iter().any(|tag| self.tags.contains(tag)) {
            return false;
        }
        if !self.entity_types.is_empty() && !self.entity_types.contains(&node.role()) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                node.id.to_lowercase().contains(&needle)
                    || node.data.label.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// Recomputes `hidden` on every node. A group is hidden when none of its
/// children are visible.
pub fn apply_filters(nodes: &[Node], filter: &NodeFilter) -> Vec<Node> {
    let mut filtered: Vec<Node> = nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();
            if node.is_entity() {
                node.hidden = !filter.matches(&node);
            }
            node
        })
        .collect();

    let visible_parents: Vec<String> = filtered
        .iter()
        .filter(|node| node.is_entity() && !node.hidden)
        .filter_map(|node| node.parent_id.clone())
        .collect();
    for group in filtered.iter_mut().filter(|node| node.is_group()) {
        group.hidden = !visible_parents.contains(&group.id);
    }
    filtered
}
