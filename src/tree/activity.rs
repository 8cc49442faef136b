//! Zoom-derived activity of every node, computed without touching the tree.
//!
//! Activity is computed in two passes:
//!
//! 1. **Bottom-up**: a leaf is zoom-active when its zoom envelope contains
//!    the current zoom; a group is zoom-active when any child is. Groups with
//!    no children are never active.
//! 2. **Top-down gating**: a node is effectively active only if it is
//!    zoom-active and every ancestor is both checked and effectively active.
//!
//! Both results are returned so cascades can consult a leaf's own zoom
//! eligibility independently of its ancestors.

use std::collections::HashMap;

use super::node::{LayerNode, LayerTree, NodePath};
use crate::model::ZoomEnvelope;

/// Activity of every node of a tree at one zoom level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Activity {
    zoom_active: HashMap<NodePath, bool>,
    effective: HashMap<NodePath, bool>,
}

impl Activity {
    /// Whether the node's own zoom range (or a descendant's, for groups)
    /// contains the zoom, ignoring ancestors.
    pub fn is_zoom_active(&self, path: &NodePath) -> bool {
        self.zoom_active.get(path).copied().unwrap_or(false)
    }

    /// Whether the node is active once ancestor gating is applied.
    pub fn is_active(&self, path: &NodePath) -> bool {
        self.effective.get(path).copied().unwrap_or(false)
    }

    /// Effective activity of every node.
    pub fn iter(&self) -> impl Iterator<Item = (&NodePath, bool)> {
        self.effective.iter().map(|(path, active)| (path, *active))
    }
}

/// Computes the activity of every node of `tree` at `zoom`.
///
/// `envelope_of` maps a logical id to its zoom envelope; `None` marks a
/// logical layer without concrete layers, which is never active.
pub fn compute_activity<F>(tree: &LayerTree, zoom: f64, envelope_of: F) -> Activity
where
    F: Fn(&str) -> Option<ZoomEnvelope>,
{
    let mut activity = Activity::default();
    for (index, root) in tree.roots().iter().enumerate() {
        let path = NodePath::root(index);
        zoom_pass(root, &path, zoom, &envelope_of, &mut activity.zoom_active);
        gating_pass(root, &path, true, &mut activity);
    }
    activity
}

fn zoom_pass<F>(
    node: &LayerNode,
    path: &NodePath,
    zoom: f64,
    envelope_of: &F,
    out: &mut HashMap<NodePath, bool>,
) -> bool
where
    F: Fn(&str) -> Option<ZoomEnvelope>,
{
    let active = match node {
        LayerNode::Layer(layer) => {
            envelope_of(&layer.id).is_some_and(|envelope| envelope.contains(zoom))
        }
        LayerNode::Group(group) => {
            let mut any = false;
            for (index, child) in group.children.iter().enumerate() {
                // visit every child so each gets an entry
                any |= zoom_pass(child, &path.child(index), zoom, envelope_of, out);
            }
            any
        }
    };
    out.insert(path.clone(), active);
    active
}

fn gating_pass(node: &LayerNode, path: &NodePath, open: bool, activity: &mut Activity) {
    let active = open && activity.is_zoom_active(path);
    activity.effective.insert(path.clone(), active);

    let child_open = active && node.is_checked();
    for (index, child) in node.children().iter().enumerate() {
        gating_pass(child, &path.child(index), child_open, activity);
    }
}
