//! The rendering engine as seen by this crate.
//!
//! The engine itself lives outside this crate; [`MapRenderer`] is the narrow
//! surface the visibility machinery needs from it. [`HeadlessMap`] is an
//! in-memory implementation for servers, tests and tooling that need the
//! visibility state without drawing anything.

use std::collections::HashMap;

use tracing::warn;

use crate::model::Visibility;
use crate::style::StyleDocument;

/// Layout-visibility and zoom access to a loaded style.
pub trait MapRenderer {
    /// Writes the `visibility` layout flag of one concrete layer.
    fn set_layer_visibility(&mut self, concrete_id: &str, visibility: Visibility);

    /// Reads the `visibility` layout flag, or `None` if the layer is unknown.
    fn layer_visibility(&self, concrete_id: &str) -> Option<Visibility>;

    /// Current zoom level.
    fn zoom(&self) -> f64;
}

/// A renderer that only tracks layer visibility and zoom.
#[derive(Debug, Clone, Default)]
pub struct HeadlessMap {
    visibility: HashMap<String, Visibility>,
    zoom: f64,
    writes: usize,
}

impl HeadlessMap {
    /// Loads the layer visibility flags of `document`.
    pub fn load(document: &StyleDocument) -> Self {
        Self {
            visibility: document
                .layers
                .iter()
                .map(|layer| (layer.id.clone(), layer.visibility()))
                .collect(),
            zoom: 0.0,
            writes: 0,
        }
    }

    /// Loads `document` and starts at `zoom`.
    pub fn at_zoom(document: &StyleDocument, zoom: f64) -> Self {
        let mut map = Self::load(document);
        map.zoom = zoom;
        map
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    /// Number of visibility writes applied since loading.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Returns `true` if the layer exists and is visible.
    pub fn is_visible(&self, concrete_id: &str) -> bool {
        self.visibility
            .get(concrete_id)
            .is_some_and(|visibility| visibility.is_visible())
    }
}

impl MapRenderer for HeadlessMap {
    fn set_layer_visibility(&mut self, concrete_id: &str, visibility: Visibility) {
        match self.visibility.get_mut(concrete_id) {
            Some(current) => {
                *current = visibility;
                self.writes += 1;
            }
            None => warn!(concrete_id, "visibility write for a layer not in the style"),
        }
    }

    fn layer_visibility(&self, concrete_id: &str) -> Option<Visibility> {
        self.visibility.get(concrete_id).copied()
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }
}
