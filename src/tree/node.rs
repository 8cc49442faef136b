//! Tree of logical layers and groups supplied by the host.

use serde::{Deserialize, Serialize};

use crate::style::ConfigError;

fn default_checked() -> bool {
    true
}

/// Position of a node: child indices walked from the root list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path of the `index`-th root node.
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path of the `index`-th child of this node.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Paths of all strict ancestors, outermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> + '_ {
        (1..self.0.len()).map(move |len| NodePath(self.0[..len].to_vec()))
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

/// A leaf: one toggleable logical layer.
///
/// `is_checked` is what the user wants; `is_active` is whether the layer
/// may currently be drawn. It is rendered only when both hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalLayer {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub is_checked: bool,
    #[serde(default)]
    pub is_active: bool,
}

impl LogicalLayer {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            is_checked: false,
            is_active: false,
        }
    }
}

/// A group of nested groups and/or leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerGroup {
    pub label: String,
    pub children: Vec<LayerNode>,
    #[serde(default = "default_checked")]
    pub is_checked: bool,
    #[serde(default)]
    pub is_active: bool,
}

impl LayerGroup {
    /// Creates an empty, checked group.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
            is_checked: true,
            is_active: false,
        }
    }

    /// Appends a child, returning the group for chaining.
    pub fn with(mut self, child: impl Into<LayerNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn unchecked(mut self) -> Self {
        self.is_checked = false;
        self
    }
}

/// A node of the visibility tree.
///
/// Deserialized untagged: objects with `children` are groups, objects with
/// an `id` are leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerNode {
    Group(LayerGroup),
    Layer(LogicalLayer),
}

impl LayerNode {
    pub fn label(&self) -> &str {
        match self {
            LayerNode::Group(group) => &group.label,
            LayerNode::Layer(layer) => &layer.label,
        }
    }

    pub fn is_checked(&self) -> bool {
        match self {
            LayerNode::Group(group) => group.is_checked,
            LayerNode::Layer(layer) => layer.is_checked,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            LayerNode::Group(group) => group.is_active,
            LayerNode::Layer(layer) => layer.is_active,
        }
    }

    pub fn set_checked(&mut self, checked: bool) {
        match self {
            LayerNode::Group(group) => group.is_checked = checked,
            LayerNode::Layer(layer) => layer.is_checked = checked,
        }
    }

    pub fn set_active(&mut self, active: bool) {
        match self {
            LayerNode::Group(group) => group.is_active = active,
            LayerNode::Layer(layer) => layer.is_active = active,
        }
    }

    /// Children of a group; empty for leaves.
    pub fn children(&self) -> &[LayerNode] {
        match self {
            LayerNode::Group(group) => &group.children,
            LayerNode::Layer(_) => &[],
        }
    }

    /// The logical id of a leaf.
    pub fn logical_id(&self) -> Option<&str> {
        match self {
            LayerNode::Group(_) => None,
            LayerNode::Layer(layer) => Some(&layer.id),
        }
    }

    /// Only checked and active nodes are drawn.
    pub fn is_rendered(&self) -> bool {
        self.is_checked() && self.is_active()
    }
}

impl From<LayerGroup> for LayerNode {
    fn from(group: LayerGroup) -> Self {
        LayerNode::Group(group)
    }
}

impl From<LogicalLayer> for LayerNode {
    fn from(layer: LogicalLayer) -> Self {
        LayerNode::Layer(layer)
    }
}

/// The host-supplied forest of layer groups and leaves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerTree {
    roots: Vec<LayerNode>,
}

impl LayerTree {
    pub fn new(roots: Vec<LayerNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[LayerNode] {
        &self.roots
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            format: "JSON",
            message: e.to_string(),
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            format: "YAML",
            message: e.to_string(),
        })
    }

    pub fn node(&self, path: &NodePath) -> Option<&LayerNode> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.roots.get(*first)?;
        for index in rest {
            node = node.children().get(*index)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut LayerNode> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for index in rest {
            node = match node {
                LayerNode::Group(group) => group.children.get_mut(*index)?,
                LayerNode::Layer(_) => return None,
            };
        }
        Some(node)
    }

    /// Visits every node depth-first, parents before children.
    pub fn walk(&self, mut visit: impl FnMut(&NodePath, &LayerNode)) {
        fn go(path: NodePath, node: &LayerNode, visit: &mut dyn FnMut(&NodePath, &LayerNode)) {
            visit(&path, node);
            for (index, child) in node.children().iter().enumerate() {
                go(path.child(index), child, visit);
            }
        }
        for (index, root) in self.roots.iter().enumerate() {
            go(NodePath::root(index), root, &mut visit);
        }
    }

    /// Paths and logical ids of every leaf, depth-first.
    pub fn leaves(&self) -> Vec<(NodePath, String)> {
        let mut leaves = Vec::new();
        self.walk(|path, node| {
            if let Some(id) = node.logical_id() {
                leaves.push((path.clone(), id.to_string()));
            }
        });
        leaves
    }

    /// Paths of every leaf showing `logical_id`.
    pub fn find_layer(&self, logical_id: &str) -> Vec<NodePath> {
        self.leaves()
            .into_iter()
            .filter(|(_, id)| id == logical_id)
            .map(|(path, _)| path)
            .collect()
    }
}
