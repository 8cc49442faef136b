//! Effect of toggling one node on the leaves beneath it.
//!
//! The cascade is asymmetric:
//!
//! - **Unchecking** a group hides every descendant leaf but leaves each
//!   leaf's own `is_checked` flag alone.
//! - **Checking** a group shows only leaves that were already checked and
//!   are zoom-active, under nested groups that are themselves checked. A
//!   leaf the user unchecked earlier stays hidden.
//!
//! Re-enabling a parent therefore restores the previous child selection
//! instead of resetting it.

use super::activity::Activity;
use super::node::{LayerNode, LayerTree, NodePath};

/// Rendered visibility planned for one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafVisibility {
    pub path: NodePath,
    pub logical_id: String,
    pub visible: bool,
}

/// What toggling a node changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    /// The toggled node.
    pub path: NodePath,
    /// Its new `is_checked` value; no other node's flag changes.
    pub checked: bool,
    /// Visibility of every affected leaf, depth-first.
    pub leaves: Vec<LeafVisibility>,
}

/// Plans the effect of setting `path`'s checked flag to `checked`.
///
/// `activity` must describe the tree before the toggle. Returns `None` if
/// `path` does not exist. Toggling a group without children yields a plan
/// with no leaves.
pub fn compute_cascade(
    tree: &LayerTree,
    path: &NodePath,
    checked: bool,
    activity: &Activity,
) -> Option<CascadePlan> {
    let node = tree.node(path)?;

    let ancestors_open = path.ancestors().all(|ancestor| {
        tree.node(&ancestor).is_some_and(LayerNode::is_checked) && activity.is_active(&ancestor)
    });

    let mut leaves = Vec::new();
    match node {
        LayerNode::Layer(layer) => leaves.push(LeafVisibility {
            path: path.clone(),
            logical_id: layer.id.clone(),
            visible: ancestors_open && checked && activity.is_zoom_active(path),
        }),
        LayerNode::Group(group) => {
            let open = ancestors_open && checked;
            for (index, child) in group.children.iter().enumerate() {
                plan_descendants(child, &path.child(index), open, activity, &mut leaves);
            }
        }
    }

    Some(CascadePlan {
        path: path.clone(),
        checked,
        leaves,
    })
}

fn plan_descendants(
    node: &LayerNode,
    path: &NodePath,
    open: bool,
    activity: &Activity,
    leaves: &mut Vec<LeafVisibility>,
) {
    match node {
        LayerNode::Layer(layer) => leaves.push(LeafVisibility {
            path: path.clone(),
            logical_id: layer.id.clone(),
            visible: open && layer.is_checked && activity.is_zoom_active(path),
        }),
        LayerNode::Group(group) => {
            let open = open && group.is_checked;
            for (index, child) in group.children.iter().enumerate() {
                plan_descendants(child, &path.child(index), open, activity, leaves);
            }
        }
    }
}
