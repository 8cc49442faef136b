//! Events emitted to the host.

use serde::Serialize;

use crate::tree::NodePath;

/// The node a toggle notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRef {
    pub path: NodePath,
    pub label: String,
    /// Set for leaves only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_id: Option<String>,
}

/// A leaf or group control changed its checked state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleNotification {
    pub checked: bool,
    pub node: NodeRef,
}

/// Something the host may want to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MapEvent {
    /// Logical layers became visible (`display`) or hidden on the renderer.
    LayerVisibilityChange {
        display: bool,
        #[serde(rename = "logicalIds")]
        logical_ids: Vec<String>,
    },
    /// A user toggle was applied.
    Toggled(ToggleNotification),
}
