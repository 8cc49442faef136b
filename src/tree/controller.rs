//! The visibility tree controller.
//!
//! The controller owns the host's [`LayerTree`] for the life of a map
//! session and keeps three things in step:
//!
//! - the tree's `is_checked` / `is_active` flags,
//! - the renderer's layout visibility of the concrete layers behind each leaf,
//! - the events reported to the host.
//!
//! All state changes are planned by the pure functions in
//! [`activity`](super::activity) and [`cascade`](super::cascade) and applied
//! here afterwards. Renderer writes go through
//! [`StyleManager::apply_visibility`], which skips flags that already hold,
//! so repeating a recomputation with unchanged inputs writes nothing.

use tracing::{debug, warn};

use super::activity::{compute_activity, Activity};
use super::cascade::{compute_cascade, LeafVisibility};
use super::node::{LayerNode, LayerTree, NodePath};
use crate::event::{MapEvent, NodeRef, ToggleNotification};
use crate::renderer::MapRenderer;
use crate::style::StyleManager;

/// Keeps a layer tree, the renderer and the host in sync.
///
/// # Example
///
/// ```rust
/// use mapstyle::{
///     HeadlessMap, LayerGroup, LayerTree, LogicalLayer, MapConfig, NodePath, StyleManager,
///     VisibilityTreeController,
/// };
///
/// let mut manager = StyleManager::new();
/// let document = manager
///     .build_style(&MapConfig::new("/").usage("fireHydrants"))
///     .unwrap();
/// let mut map = HeadlessMap::at_zoom(&document, 16.0);
///
/// let tree = LayerTree::new(vec![LayerGroup::new("Safety")
///     .with(LogicalLayer::new("fireHydrants", "Fire hydrants"))
///     .into()]);
/// let mut controller = VisibilityTreeController::new(tree);
/// controller.initialize(&manager, &mut map);
/// assert!(map.is_visible("fire-hydrants"));
///
/// controller.toggle(&NodePath::root(0), false, &manager, &mut map);
/// assert!(!map.is_visible("fire-hydrants"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct VisibilityTreeController {
    tree: LayerTree,
    zoom: f64,
    events: Vec<MapEvent>,
}

impl VisibilityTreeController {
    /// Takes ownership of the host-supplied tree. Call
    /// [`initialize`](Self::initialize) once the renderer has loaded the style.
    pub fn new(tree: LayerTree) -> Self {
        Self {
            tree,
            zoom: 0.0,
            events: Vec::new(),
        }
    }

    pub fn tree(&self) -> &LayerTree {
        &self.tree
    }

    pub fn node(&self, path: &NodePath) -> Option<&LayerNode> {
        self.tree.node(path)
    }

    /// Zoom level of the last recomputation.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Takes all events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    /// Seeds the tree from the renderer and style, then syncs the renderer.
    ///
    /// A leaf starts checked when the renderer reports all of its current
    /// theme's layers visible. Group checked flags keep the host's values.
    pub fn initialize<R: MapRenderer + ?Sized>(
        &mut self,
        manager: &StyleManager,
        renderer: &mut R,
    ) {
        for (path, logical_id) in self.tree.leaves() {
            let visible = manager.reports_visible(&*renderer, &logical_id);
            if let Some(node) = self.tree.node_mut(&path) {
                node.set_checked(visible);
            }
        }
        self.resync(manager, renderer);
    }

    /// Recomputes activity for the renderer's current zoom and writes
    /// visibility for every leaf. Returns the number of renderer writes.
    pub fn handle_zoom<R: MapRenderer + ?Sized>(
        &mut self,
        manager: &StyleManager,
        renderer: &mut R,
    ) -> usize {
        self.resync(manager, renderer)
    }

    /// Recomputes activity and rewrites every leaf's visibility.
    ///
    /// Needed after anything that changes which concrete layers back a
    /// leaf, such as a theme switch. Returns the number of renderer writes.
    pub fn resync<R: MapRenderer + ?Sized>(
        &mut self,
        manager: &StyleManager,
        renderer: &mut R,
    ) -> usize {
        self.zoom = renderer.zoom();
        self.recompute(manager);

        let leaves: Vec<LeafVisibility> = self
            .tree
            .leaves()
            .into_iter()
            .map(|(path, logical_id)| {
                let visible = self.tree.node(&path).is_some_and(LayerNode::is_rendered);
                LeafVisibility {
                    path,
                    logical_id,
                    visible,
                }
            })
            .collect();
        let writes = self.write_leaves(&leaves, manager, renderer);
        debug!(zoom = self.zoom, writes, "recomputed layer tree");
        writes
    }

    /// Applies a user toggle of the node at `path`.
    ///
    /// Leaves only change their own visibility. Groups cascade to their
    /// descendants: see [`compute_cascade`] for the rules. Returns `false`
    /// (and logs) if `path` does not exist.
    pub fn toggle<R: MapRenderer + ?Sized>(
        &mut self,
        path: &NodePath,
        checked: bool,
        manager: &StyleManager,
        renderer: &mut R,
    ) -> bool {
        let activity = self.activity(manager);
        let Some(plan) = compute_cascade(&self.tree, path, checked, &activity) else {
            warn!(%path, "toggle of a node not in the layer tree");
            return false;
        };

        let Some(node) = self.tree.node_mut(&plan.path) else {
            return false;
        };
        node.set_checked(plan.checked);
        let is_group = matches!(node, LayerNode::Group(_));
        let notification = ToggleNotification {
            checked,
            node: NodeRef {
                path: plan.path.clone(),
                label: node.label().to_string(),
                logical_id: node.logical_id().map(str::to_string),
            },
        };

        if is_group {
            // gating of the descendants changed with the group's flag
            let activity = self.activity(manager);
            self.apply_activity(&activity);
        }
        self.write_leaves(&plan.leaves, manager, renderer);
        self.events.push(MapEvent::Toggled(notification));
        true
    }

    /// Toggles every leaf showing `logical_id`. Returns `false` if none exists.
    pub fn toggle_layer<R: MapRenderer + ?Sized>(
        &mut self,
        logical_id: &str,
        checked: bool,
        manager: &StyleManager,
        renderer: &mut R,
    ) -> bool {
        let paths = self.tree.find_layer(logical_id);
        if paths.is_empty() {
            warn!(logical_id, "toggle of a logical layer not in the layer tree");
            return false;
        }
        for path in &paths {
            self.toggle(path, checked, manager, &mut *renderer);
        }
        true
    }

    /// Sets the checked flag of leaves on the host's behalf, without
    /// emitting toggle notifications. Returns the number of renderer writes.
    pub fn set_layers_checked<R, S>(
        &mut self,
        logical_ids: &[S],
        checked: bool,
        manager: &StyleManager,
        renderer: &mut R,
    ) -> usize
    where
        R: MapRenderer + ?Sized,
        S: AsRef<str>,
    {
        let mut leaves = Vec::new();
        for logical_id in logical_ids {
            let logical_id = logical_id.as_ref();
            let paths = self.tree.find_layer(logical_id);
            if paths.is_empty() {
                warn!(logical_id, "logical layer not in the layer tree");
            }
            for path in paths {
                if let Some(node) = self.tree.node_mut(&path) {
                    node.set_checked(checked);
                    leaves.push(LeafVisibility {
                        logical_id: logical_id.to_string(),
                        visible: node.is_rendered(),
                        path,
                    });
                }
            }
        }
        self.write_leaves(&leaves, manager, renderer)
    }

    fn activity(&self, manager: &StyleManager) -> Activity {
        compute_activity(&self.tree, self.zoom, |logical_id| {
            manager.zoom_envelope(logical_id)
        })
    }

    fn recompute(&mut self, manager: &StyleManager) {
        let activity = self.activity(manager);
        self.apply_activity(&activity);
    }

    fn apply_activity(&mut self, activity: &Activity) {
        for (path, active) in activity.iter() {
            if let Some(node) = self.tree.node_mut(path) {
                node.set_active(active);
            }
        }
    }

    /// Writes visibility per logical id and reports ids whose rendering changed.
    ///
    /// Leaves sharing a logical id share its concrete layers, which are shown
    /// when any of those leaves is rendered. `leaves` is merged with the
    /// tree's other leaves of the same id so each id is written once.
    fn write_leaves<R: MapRenderer + ?Sized>(
        &mut self,
        leaves: &[LeafVisibility],
        manager: &StyleManager,
        renderer: &mut R,
    ) -> usize {
        let mut merged: Vec<(&str, bool)> = Vec::new();
        for leaf in leaves {
            match merged.iter_mut().find(|(id, _)| *id == leaf.logical_id) {
                Some((_, visible)) => *visible |= leaf.visible,
                None => merged.push((leaf.logical_id.as_str(), leaf.visible)),
            }
        }
        for (path, logical_id) in self.tree.leaves() {
            if leaves.iter().any(|leaf| leaf.path == path) {
                continue;
            }
            if let Some((_, visible)) = merged.iter_mut().find(|(id, _)| *id == logical_id) {
                *visible |= self.tree.node(&path).is_some_and(LayerNode::is_rendered);
            }
        }

        let mut writes = 0;
        let mut shown = Vec::new();
        let mut hidden = Vec::new();
        for (logical_id, visible) in merged {
            // already reported when activity was computed
            if manager.themes(logical_id).is_none() {
                continue;
            }
            let changed = manager.apply_visibility(&mut *renderer, &[logical_id], visible);
            if changed == 0 {
                continue;
            }
            writes += changed;
            let bucket = if visible { &mut shown } else { &mut hidden };
            bucket.push(logical_id.to_string());
        }

        if !shown.is_empty() {
            self.events.push(MapEvent::LayerVisibilityChange {
                display: true,
                logical_ids: shown,
            });
        }
        if !hidden.is_empty() {
            self.events.push(MapEvent::LayerVisibilityChange {
                display: false,
                logical_ids: hidden,
            });
        }
        writes
    }
}
