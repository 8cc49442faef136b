//! The style document handed to the rendering engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ConcreteLayer, SourceDescriptor};

/// Version of the renderer's style schema this crate emits.
pub const STYLE_VERSION: u8 = 8;

/// Path appended to the base URL to form the glyph URL template.
pub const GLYPHS_PATH: &str = "fonts/{fontstack}/{range}.pbf";

/// The complete declarative style: sources plus concrete layers.
///
/// The document is loaded by the renderer wholesale, so its serialized
/// shape follows the renderer's schema key for key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDocument {
    pub version: u8,
    pub sources: BTreeMap<String, SourceDescriptor>,
    pub layers: Vec<ConcreteLayer>,
    pub glyphs: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<String>,
}

impl StyleDocument {
    /// Creates an empty document whose glyph and sprite URLs hang off `base_url`.
    pub fn new(base_url: &str, sprite_name: Option<&str>) -> Self {
        Self {
            version: STYLE_VERSION,
            sources: BTreeMap::new(),
            layers: Vec::new(),
            glyphs: format!("{}{}", base_url, GLYPHS_PATH),
            sprite: sprite_name.map(|name| format!("{}{}", base_url, name)),
        }
    }

    /// Looks up a concrete layer by id.
    pub fn layer(&self, id: &str) -> Option<&ConcreteLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Ids of every concrete layer, in drawing order.
    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|layer| layer.id.as_str())
    }

    /// Serializes the document into a JSON value for the renderer.
    ///
    /// # Errors
    ///
    /// Fails if a host-supplied paint, layout or filter value cannot be
    /// represented as JSON.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn to_json_string_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
