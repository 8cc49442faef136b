//! Resolution of logical layer usages into document sources and layers.
//!
//! # Resolution rules
//!
//! 1. **Custom first**: a custom source or layer definition shadows the
//!    default of the same name. Sources and layers are resolved
//!    independently, so a custom layer may use a default source and the
//!    other way round.
//! 2. **All themes emitted**: every theme of a used logical layer goes into
//!    the document. Layers of themes other than the current one are forced
//!    to `visibility: none`, which turns a theme switch into a flag rewrite
//!    instead of a document reload.
//! 3. **Sources on demand**: only sources referenced by admitted layers are
//!    added, each exactly once.
//!
//! Unknown logical layers and undeclared sources are fatal
//! [`ConfigError`]s; an unknown requested theme only logs a warning and
//! falls back to the default theme.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use super::error::ConfigError;
use crate::config::Usage;
use crate::model::{ConcreteLayer, SourceDescriptor, Theme, Visibility, DEFAULT_THEME_ID};
use crate::registry::{LayerDefinition, StyleRegistry};

/// Output of [`StyleResolver::resolve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Sources required by the admitted layers.
    pub sources: BTreeMap<String, SourceDescriptor>,
    /// Concrete layers in drawing order.
    pub layers: Vec<ConcreteLayer>,
    /// Every theme of every used logical layer.
    pub themes: HashMap<String, Vec<Theme>>,
    /// Current theme id per logical layer.
    pub current: HashMap<String, String>,
    /// Used logical layer ids in usage order.
    pub logical_ids: Vec<String>,
}

/// Resolves usages against a custom registry and a session copy of the defaults.
#[derive(Debug, Clone)]
pub struct StyleResolver {
    defaults: StyleRegistry,
    custom: StyleRegistry,
    /// Concrete layer id -> logical layer id, for managed layers only.
    reverse_index: HashMap<String, String>,
}

impl StyleResolver {
    /// Creates a resolver over the given default registry.
    pub fn new(defaults: StyleRegistry) -> Self {
        Self {
            defaults,
            custom: StyleRegistry::new(),
            reverse_index: HashMap::new(),
        }
    }

    /// Creates a resolver over a fresh session copy of the built-in defaults.
    pub fn for_session(base_url: &str) -> Self {
        Self::new(StyleRegistry::for_session(base_url))
    }

    /// Looks up a source, custom registry first.
    pub fn source(&self, name: &str) -> Option<&SourceDescriptor> {
        self.custom
            .source(name)
            .or_else(|| self.defaults.source(name))
    }

    /// Looks up a logical layer definition, custom registry first.
    pub fn definition(&self, name: &str) -> Option<&LayerDefinition> {
        self.custom
            .layers(name)
            .or_else(|| self.defaults.layers(name))
    }

    /// Returns the logical layer owning `concrete_id`.
    ///
    /// Returns `None` for ids that belong to unmanaged content such as base
    /// layers, or that were never admitted.
    pub fn logical_id_of(&self, concrete_id: &str) -> Option<&str> {
        self.reverse_index.get(concrete_id).map(|id| id.as_str())
    }

    /// Resolves `usages` into document sources, layers and the theme index.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnresolvedLogicalLayer`] if a usage is registered nowhere
    /// - [`ConfigError::EmptyLayerDefinition`] if a definition has no themes
    /// - [`ConfigError::DanglingSourceReference`] if a layer names an undeclared source
    /// - [`ConfigError::DuplicateLayerId`] if two layers share an id
    ///
    /// On error the resolver keeps the state of its last successful resolution.
    pub fn resolve(
        &mut self,
        usages: &[Usage],
        custom_sources: &BTreeMap<String, SourceDescriptor>,
        custom_layers: &BTreeMap<String, LayerDefinition>,
    ) -> Result<Resolution, ConfigError> {
        let custom = StyleRegistry::from_parts(custom_sources.clone(), custom_layers.clone());
        let previous = std::mem::replace(&mut self.custom, custom);
        match self.assemble(usages) {
            Ok((resolution, reverse_index)) => {
                self.reverse_index = reverse_index;
                Ok(resolution)
            }
            Err(err) => {
                self.custom = previous;
                Err(err)
            }
        }
    }

    /// Builds the resolution and its reverse index without committing either.
    fn assemble(
        &self,
        usages: &[Usage],
    ) -> Result<(Resolution, HashMap<String, String>), ConfigError> {
        let mut resolution = Resolution::default();
        let mut reverse_index = HashMap::new();
        let mut admitted = HashSet::new();

        for usage in usages {
            let name = usage.name();
            if resolution.themes.contains_key(name) {
                warn!(logical_id = name, "logical layer used more than once; ignoring repeat");
                continue;
            }

            let themes = self
                .definition(name)
                .ok_or_else(|| ConfigError::UnresolvedLogicalLayer {
                    name: name.to_string(),
                })?
                .themes(name);
            if themes.is_empty() {
                return Err(ConfigError::EmptyLayerDefinition {
                    name: name.to_string(),
                });
            }

            let current = select_current_theme(name, &themes, usage.theme());
            for theme in &themes {
                let shown = usage.visible() && theme.theme_id == current;
                for layer in &theme.layers {
                    self.admit(layer, &mut resolution.sources, &mut admitted)?;
                    let mut layer = layer.clone();
                    if !shown {
                        layer.set_visibility(Visibility::None);
                    }
                    reverse_index.insert(layer.id.clone(), name.to_string());
                    resolution.layers.push(layer);
                }
            }

            resolution.current.insert(name.to_string(), current);
            resolution.themes.insert(name.to_string(), themes);
            resolution.logical_ids.push(name.to_string());
        }

        debug!(
            logical_layers = resolution.logical_ids.len(),
            layers = resolution.layers.len(),
            sources = resolution.sources.len(),
            "resolved style usages"
        );
        Ok((resolution, reverse_index))
    }

    /// Validates unmanaged base layers and places them beneath every
    /// managed layer of `resolution`.
    ///
    /// # Errors
    ///
    /// Same source and id checks as [`StyleResolver::resolve`].
    pub fn admit_base_layers(
        &self,
        resolution: &mut Resolution,
        base_layers: &[ConcreteLayer],
    ) -> Result<(), ConfigError> {
        let mut admitted: HashSet<String> =
            resolution.layers.iter().map(|layer| layer.id.clone()).collect();
        for layer in base_layers {
            self.admit(layer, &mut resolution.sources, &mut admitted)?;
        }
        resolution.layers.splice(0..0, base_layers.iter().cloned());
        Ok(())
    }

    /// Checks a layer's source and id, adding its source on first use.
    fn admit(
        &self,
        layer: &ConcreteLayer,
        sources: &mut BTreeMap<String, SourceDescriptor>,
        admitted: &mut HashSet<String>,
    ) -> Result<(), ConfigError> {
        if !admitted.insert(layer.id.clone()) {
            return Err(ConfigError::DuplicateLayerId {
                layer: layer.id.clone(),
            });
        }

        // Layers without a source (background, sky) need no declaration.
        let Some(source_name) = layer.source.as_deref() else {
            return Ok(());
        };
        if sources.contains_key(source_name) {
            return Ok(());
        }
        let source = self
            .source(source_name)
            .ok_or_else(|| ConfigError::DanglingSourceReference {
                source_name: source_name.to_string(),
                layer: layer.id.clone(),
            })?;
        sources.insert(source_name.to_string(), source.clone());
        Ok(())
    }
}

/// Picks the requested theme if it exists, else `default`, else the first.
fn select_current_theme(logical_id: &str, themes: &[Theme], requested: Option<&str>) -> String {
    if let Some(requested) = requested {
        if themes.iter().any(|theme| theme.theme_id == requested) {
            return requested.to_string();
        }
        warn!(
            logical_id,
            theme_id = requested,
            "requested theme not found; falling back to default theme"
        );
    }
    themes
        .iter()
        .find(|theme| theme.theme_id == DEFAULT_THEME_ID)
        .or_else(|| themes.first())
        .map(|theme| theme.theme_id.clone())
        .unwrap_or_else(|| DEFAULT_THEME_ID.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ThemeDefinition;

    fn resolver() -> StyleResolver {
        StyleResolver::for_session("https://maps.example/")
    }

    fn no_sources() -> BTreeMap<String, SourceDescriptor> {
        BTreeMap::new()
    }

    fn no_layers() -> BTreeMap<String, LayerDefinition> {
        BTreeMap::new()
    }

    fn visible_ids(resolution: &Resolution) -> Vec<&str> {
        resolution
            .layers
            .iter()
            .filter(|layer| layer.visibility().is_visible())
            .map(|layer| layer.id.as_str())
            .collect()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn test_flat_usage_emits_visible_layers() {
        let mut resolver = resolver();
        let resolution = resolver
            .resolve(&[Usage::from("streetTrees")], &no_sources(), &no_layers())
            .unwrap();

        assert_eq!(
            visible_ids(&resolution),
            vec!["street-trees", "street-trees-label"]
        );
        assert_eq!(resolution.current["streetTrees"], "default");
        assert_eq!(resolution.sources.len(), 1);
        assert!(resolution.sources.contains_key("street-trees"));
    }

    #[test]
    fn test_theme_exclusivity() {
        let mut resolver = resolver();
        let resolution = resolver
            .resolve(
                &[Usage::themed("permits", "yellow")],
                &no_sources(),
                &no_layers(),
            )
            .unwrap();

        let all: Vec<&str> = resolution.layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(
            all,
            vec![
                "permits-fill",
                "permits-outline",
                "permits-yellow-fill",
                "permits-yellow-outline"
            ]
        );
        assert_eq!(
            visible_ids(&resolution),
            vec!["permits-yellow-fill", "permits-yellow-outline"]
        );
        assert_eq!(resolution.current["permits"], "yellow");
        // shared source added once
        assert_eq!(resolution.sources.len(), 1);
    }

    #[test]
    fn test_unknown_theme_falls_back_to_default() {
        let mut resolver = resolver();
        let resolution = resolver
            .resolve(
                &[Usage::themed("permits", "purple")],
                &no_sources(),
                &no_layers(),
            )
            .unwrap();
        assert_eq!(resolution.current["permits"], "default");
        assert_eq!(
            visible_ids(&resolution),
            vec!["permits-fill", "permits-outline"]
        );
    }

    #[test]
    fn test_themed_without_default_uses_first() {
        let mut layers = no_layers();
        layers.insert(
            "zones".to_string(),
            LayerDefinition::Themed(vec![
                ThemeDefinition::new("day", "Day")
                    .layer(ConcreteLayer::new("zones-day", "fill").source("permits")),
                ThemeDefinition::new("night", "Night")
                    .layer(ConcreteLayer::new("zones-night", "fill").source("permits")),
            ]),
        );
        let mut resolver = resolver();
        let resolution = resolver
            .resolve(&[Usage::from("zones")], &no_sources(), &layers)
            .unwrap();
        assert_eq!(resolution.current["zones"], "day");
        assert_eq!(visible_ids(&resolution), vec!["zones-day"]);
    }

    #[test]
    fn test_hidden_usage_hides_every_theme() {
        let mut resolver = resolver();
        let resolution = resolver
            .resolve(&[Usage::hidden("permits")], &no_sources(), &no_layers())
            .unwrap();
        assert!(visible_ids(&resolution).is_empty());
        assert_eq!(resolution.layers.len(), 4);
    }

    #[test]
    fn test_repeated_usage_is_ignored() {
        let mut resolver = resolver();
        let resolution = resolver
            .resolve(
                &[Usage::from("fireHydrants"), Usage::from("fireHydrants")],
                &no_sources(),
                &no_layers(),
            )
            .unwrap();
        assert_eq!(resolution.layers.len(), 1);
        assert_eq!(resolution.logical_ids, vec!["fireHydrants".to_string()]);
    }

    // =========================================================================
    // Precedence
    // =========================================================================

    #[test]
    fn test_custom_layers_shadow_defaults() {
        let mut layers = no_layers();
        layers.insert(
            "streetTrees".to_string(),
            LayerDefinition::Flat(vec![
                ConcreteLayer::new("my-trees", "circle").source("street-trees")
            ]),
        );
        let mut resolver = resolver();
        let resolution = resolver
            .resolve(&[Usage::from("streetTrees")], &no_sources(), &layers)
            .unwrap();

        let ids: Vec<&str> = resolution.layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["my-trees"]);
    }

    #[test]
    fn test_custom_source_shadows_default() {
        let mut sources = no_sources();
        sources.insert(
            "street-trees".to_string(),
            SourceDescriptor::new("vector").url("https://city.example/trees.json"),
        );
        let mut resolver = resolver();
        let resolution = resolver
            .resolve(&[Usage::from("streetTrees")], &sources, &no_layers())
            .unwrap();
        assert_eq!(
            resolution.sources["street-trees"].url.as_deref(),
            Some("https://city.example/trees.json")
        );
    }

    #[test]
    fn test_default_sources_get_base_url() {
        let mut resolver = resolver();
        let resolution = resolver
            .resolve(&[Usage::from("permits")], &no_sources(), &no_layers())
            .unwrap();
        let tiles = resolution.sources["permits"].tiles.as_ref().unwrap();
        assert!(tiles[0].starts_with("https://maps.example/tiles/permits/"));
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_unresolved_logical_layer() {
        let mut resolver = resolver();
        let err = resolver
            .resolve(&[Usage::from("bikeLanes")], &no_sources(), &no_layers())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnresolvedLogicalLayer {
                name: "bikeLanes".to_string()
            }
        );
    }

    #[test]
    fn test_dangling_source_reference() {
        let mut layers = no_layers();
        layers.insert(
            "broken".to_string(),
            LayerDefinition::Flat(vec![ConcreteLayer::new("broken-fill", "fill").source("foo")]),
        );
        let mut resolver = resolver();
        let err = resolver
            .resolve(&[Usage::from("broken")], &no_sources(), &layers)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DanglingSourceReference {
                source_name: "foo".to_string(),
                layer: "broken-fill".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_layer_id() {
        let mut layers = no_layers();
        layers.insert(
            "copy".to_string(),
            LayerDefinition::Flat(vec![ConcreteLayer::new("fire-hydrants", "circle")
                .source("fire-hydrants")]),
        );
        let mut resolver = resolver();
        let err = resolver
            .resolve(
                &[Usage::from("fireHydrants"), Usage::from("copy")],
                &no_sources(),
                &layers,
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateLayerId { .. }));
    }

    #[test]
    fn test_empty_definition() {
        let mut layers = no_layers();
        layers.insert("nothing".to_string(), LayerDefinition::Themed(Vec::new()));
        let mut resolver = resolver();
        let err = resolver
            .resolve(&[Usage::from("nothing")], &no_sources(), &layers)
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyLayerDefinition { .. }));
    }

    // =========================================================================
    // Reverse index and base layers
    // =========================================================================

    #[test]
    fn test_logical_id_of() {
        let mut resolver = resolver();
        let mut resolution = resolver
            .resolve(
                &[Usage::from("streetTrees"), Usage::themed("permits", "yellow")],
                &no_sources(),
                &no_layers(),
            )
            .unwrap();
        resolver
            .admit_base_layers(
                &mut resolution,
                &[ConcreteLayer::new("background", "background")],
            )
            .unwrap();

        assert_eq!(resolver.logical_id_of("permits-fill"), Some("permits"));
        assert_eq!(resolver.logical_id_of("street-trees-label"), Some("streetTrees"));
        assert_eq!(resolver.logical_id_of("background"), None);
        assert_eq!(resolution.layers[0].id, "background");
    }

    #[test]
    fn test_failed_resolve_keeps_previous_state() {
        let mut resolver = resolver();
        let parks = BTreeMap::from([(
            "parks".to_string(),
            LayerDefinition::Flat(vec![ConcreteLayer::new("parks-fill", "fill").source("permits")]),
        )]);
        resolver
            .resolve(&[Usage::from("parks")], &no_sources(), &parks)
            .unwrap();

        let broken = BTreeMap::from([(
            "broken".to_string(),
            LayerDefinition::Flat(vec![ConcreteLayer::new("broken-line", "line").source("foo")]),
        )]);
        let err = resolver
            .resolve(
                &[Usage::from("streetTrees"), Usage::from("broken")],
                &no_sources(),
                &broken,
            )
            .unwrap_err();

        assert!(matches!(err, ConfigError::DanglingSourceReference { .. }));
        assert_eq!(resolver.logical_id_of("parks-fill"), Some("parks"));
        assert_eq!(resolver.logical_id_of("street-trees"), None);
        assert!(resolver.definition("parks").is_some());
        assert!(resolver.definition("broken").is_none());
    }

    #[test]
    fn test_base_layer_with_dangling_source() {
        let mut resolver = resolver();
        let mut resolution = resolver
            .resolve(&[], &no_sources(), &no_layers())
            .unwrap();
        let err = resolver
            .admit_base_layers(
                &mut resolution,
                &[ConcreteLayer::new("roads", "line").source("osm")],
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::DanglingSourceReference { .. }));
    }
}
