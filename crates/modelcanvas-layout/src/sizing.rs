use modelcanvas_graph::{GroupFrame, Node, Size};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Simple,
    /// Entities render their column list, so unmeasured ones are assumed taller.
    Detailed,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GroupSizingConfig {
    pub frame: GroupFrame,
    pub min_width: f64,
    pub min_height: f64,
    /// Differences at or below this many pixels do not produce an update.
    pub size_threshold: f64,
    /// Measured heights below this are treated as a rendering glitch and ignored.
    pub min_plausible_height: f64,
    pub view_mode: ViewMode,
    pub default_width: f64,
    pub default_height: f64,
    pub detailed_extra_height: f64,
    pub collapsed_height: f64,
}

impl Default for GroupSizingConfig {
    fn default() -> Self {
        Self {
            frame: GroupFrame::default(),
            min_width: 200.0,
            min_height: 150.0,
            size_threshold: 2.0,
            min_plausible_height: 50.0,
            view_mode: ViewMode::Simple,
            default_width: 280.0,
            default_height: 120.0,
            detailed_extra_height: 160.0,
            collapsed_height: 48.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeUpdate {
    pub id: String,
    pub size: Size,
}

/// Size used for a node when computing bounds: the rendered measurement when
/// it is plausible, then the declared size, then view-mode defaults.
pub fn effective_size(node: &Node, config: &GroupSizingConfig) -> Size {
    if let Some(measured) = node.measured {
        if measured.height >= config.min_plausible_height {
            return measured;
        }
    }

    let width = node.width.unwrap_or(config.default_width);
    let height = if node.collapsed {
        config.collapsed_height
    } else {
        node.height.unwrap_or_else(|| match config.view_mode {
            ViewMode::Simple => config.default_height,
            ViewMode::Detailed => config.default_height + config.detailed_extra_height,
        })
    };
    Size::new(width, height)
}

pub fn calculate_group_sizes(nodes: &[Node], config: &GroupSizingConfig) -> Vec<SizeUpdate> {
    if nodes.iter().any(|node| node.dragging) {
        return Vec::new();
    }

    let mut updates = Vec::new();
    for group in nodes.iter().filter(|node| node.is_group()) {
        if group.manually_resized {
            continue;
        }

        let mut max_right = f64::MIN;
        let mut max_bottom = f64::MIN;
        let mut visible_children = 0usize;
        for child in nodes
            .iter()
            .filter(|node| !node.hidden && node.parent_id.as_deref() == Some(group.id.as_str()))
        {
            let size = effective_size(child, config);
            max_right = max_right.max(child.position.x + size.width);
            max_bottom = max_bottom.max(child.position.y + size.height);
            visible_children += 1;
        }
        if visible_children == 0 {
            continue;
        }

        let size = Size::new(
            (max_right + config.frame.padding).max(config.min_width),
            (max_bottom + config.frame.padding).max(config.min_height),
        );
        let changed = match group.declared_size() {
            Some(current) => {
                (current.width - size.width).abs() > config.size_threshold
                    || (current.height - size.height).abs() > config.size_threshold
            }
            None => true,
        };
        if changed {
            updates.push(SizeUpdate {
                id: group.id.clone(),
                size,
            });
        }
    }

    updates
}

pub fn apply_size_updates(nodes: &[Node], updates: &[SizeUpdate]) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();
            if let Some(update) = updates.iter().find(|update| update.id == node.id) {
                node.width = Some(update.size.width);
                node.height = Some(update.size.height);
            }
            node
        })
        .collect()
}
