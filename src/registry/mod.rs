//! Registries of named sources and logical layer definitions.
//!
//! A [`StyleRegistry`] maps names to [`SourceDescriptor`]s and to
//! [`LayerDefinition`]s. The crate ships one process-wide default registry
//! ([`StyleRegistry::defaults`]); hosts supply a second, custom registry that
//! shadows it name by name.
//!
//! # Flat vs. themed definitions
//!
//! A logical layer is registered either as a flat list of concrete layers or
//! as an explicit list of themes. The distinction is made by the caller at
//! registration time through the [`LayerDefinition`] variant, never by
//! inspecting the shape of the data:
//!
//! ```rust
//! use mapstyle::{ConcreteLayer, LayerDefinition, ThemeDefinition};
//!
//! let flat = LayerDefinition::Flat(vec![ConcreteLayer::new("hydrants", "circle")]);
//! let themed = LayerDefinition::Themed(vec![
//!     ThemeDefinition::new("default", "Default")
//!         .layer(ConcreteLayer::new("permits-fill", "fill")),
//!     ThemeDefinition::new("yellow", "Yellow")
//!         .layer(ConcreteLayer::new("permits-yellow-fill", "fill")),
//! ]);
//!
//! assert_eq!(flat.themes("hydrants")[0].theme_id, "default");
//! assert_eq!(themed.themes("permits").len(), 2);
//! ```

mod defaults;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::model::{ConcreteLayer, SourceDescriptor, Theme, DEFAULT_THEME_ID, DEFAULT_THEME_NAME};

/// One explicitly declared theme of a logical layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDefinition {
    pub theme_id: String,
    pub name: String,
    pub layers: Vec<ConcreteLayer>,
}

impl ThemeDefinition {
    pub fn new(theme_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            theme_id: theme_id.into(),
            name: name.into(),
            layers: Vec::new(),
        }
    }

    /// Appends a concrete layer, returning the definition for chaining.
    pub fn layer(mut self, layer: ConcreteLayer) -> Self {
        self.layers.push(layer);
        self
    }
}

/// How a logical layer is registered.
///
/// Serialized externally tagged: `{"flat": [...]}` or `{"themed": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerDefinition {
    /// A plain concrete-layer list, wrapped in an implicit `default` theme.
    Flat(Vec<ConcreteLayer>),
    /// Explicit alternate concrete-layer sets.
    Themed(Vec<ThemeDefinition>),
}

impl LayerDefinition {
    /// Normalizes the definition into the theme list of `logical_id`.
    pub fn themes(&self, logical_id: &str) -> Vec<Theme> {
        match self {
            LayerDefinition::Flat(layers) => vec![Theme {
                theme_id: DEFAULT_THEME_ID.to_string(),
                name: DEFAULT_THEME_NAME.to_string(),
                logical_id: logical_id.to_string(),
                layers: layers.clone(),
            }],
            LayerDefinition::Themed(themes) => themes
                .iter()
                .map(|theme| Theme {
                    theme_id: theme.theme_id.clone(),
                    name: theme.name.clone(),
                    logical_id: logical_id.to_string(),
                    layers: theme.layers.clone(),
                })
                .collect(),
        }
    }
}

/// Named sources and logical layer definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleRegistry {
    sources: BTreeMap<String, SourceDescriptor>,
    layers: BTreeMap<String, LayerDefinition>,
}

static DEFAULT_REGISTRY: Lazy<StyleRegistry> = Lazy::new(defaults::build);

impl StyleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the built-in default registry.
    ///
    /// The registry is built once per process and never mutated; use
    /// [`StyleRegistry::for_session`] to obtain a per-session copy.
    pub fn defaults() -> &'static StyleRegistry {
        &DEFAULT_REGISTRY
    }

    /// Deep-clones the default registry and points its relative source
    /// URLs at `base_url`.
    pub fn for_session(base_url: &str) -> StyleRegistry {
        Self::defaults().with_base_url(base_url)
    }

    /// Returns a deep copy whose relative source URLs point at `base_url`.
    pub fn with_base_url(&self, base_url: &str) -> StyleRegistry {
        StyleRegistry {
            sources: self
                .sources
                .iter()
                .map(|(name, source)| (name.clone(), source.with_base_url(base_url)))
                .collect(),
            layers: self.layers.clone(),
        }
    }

    /// Builds a registry from already collected maps.
    pub fn from_parts(
        sources: BTreeMap<String, SourceDescriptor>,
        layers: BTreeMap<String, LayerDefinition>,
    ) -> Self {
        Self { sources, layers }
    }

    /// Adds a named source, returning the registry for chaining.
    pub fn add_source(mut self, name: impl Into<String>, source: SourceDescriptor) -> Self {
        self.sources.insert(name.into(), source);
        self
    }

    /// Adds a named logical layer definition, returning the registry for chaining.
    pub fn add_layers(mut self, name: impl Into<String>, definition: LayerDefinition) -> Self {
        self.layers.insert(name.into(), definition);
        self
    }

    pub fn source(&self, name: &str) -> Option<&SourceDescriptor> {
        self.sources.get(name)
    }

    pub fn layers(&self, name: &str) -> Option<&LayerDefinition> {
        self.layers.get(name)
    }

    pub fn has_source(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn has_layers(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    /// Names of all registered logical layers.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(|name| name.as_str())
    }
}
