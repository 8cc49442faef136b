//! Visibility tree: the host's groups and logical layers, and the
//! controller that keeps them in sync with the renderer.
//!
//! This module provides:
//!
//! - [`LayerTree`], [`LayerGroup`], [`LogicalLayer`]: the host-supplied tree
//! - [`compute_activity`]: zoom eligibility with ancestor gating
//! - [`compute_cascade`]: the effect of a toggle on the leaves below it
//! - [`VisibilityTreeController`]: applies both and writes to the renderer
//!
//! Every node carries two flags. `is_checked` records what the user wants;
//! `is_active` records whether the node may be drawn at the current zoom
//! under its ancestors. Only nodes with both set are rendered, so zooming
//! out of a layer's range and back never loses the user's choice.

mod activity;
mod cascade;
mod controller;
mod node;

pub use activity::{compute_activity, Activity};
pub use cascade::{compute_cascade, CascadePlan, LeafVisibility};
pub use controller::VisibilityTreeController;
pub use node::{LayerGroup, LayerNode, LayerTree, LogicalLayer, NodePath};
