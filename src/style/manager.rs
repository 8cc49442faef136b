//! Per-session style orchestration.
//!
//! The [`StyleManager`] owns the session's [`StyleResolver`] and the theme
//! bookkeeping that outlives document assembly: which themes each logical
//! layer has, which one is current, and how logical ids map to the concrete
//! ids the renderer understands.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::document::StyleDocument;
use super::error::ConfigError;
use super::resolver::StyleResolver;
use crate::config::MapConfig;
use crate::model::{Theme, Visibility, ZoomEnvelope};
use crate::registry::StyleRegistry;
use crate::renderer::MapRenderer;

/// Builds the style document and answers logical-layer questions about it.
///
/// # Example
///
/// ```rust
/// use mapstyle::{MapConfig, StyleManager, Usage};
///
/// let config = MapConfig::new("https://maps.example/")
///     .usage("streetTrees")
///     .usage(Usage::themed("permits", "yellow"));
///
/// let mut manager = StyleManager::new();
/// let document = manager.build_style(&config).unwrap();
///
/// assert!(document.layer("permits-yellow-fill").is_some());
/// assert_eq!(
///     manager.concrete_ids_for_current_theme(&["permits"]),
///     vec!["permits-yellow-fill", "permits-yellow-outline"]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct StyleManager {
    /// Defaults replacing the built-in registry, if any.
    defaults: Option<StyleRegistry>,
    resolver: Option<StyleResolver>,
    themes: HashMap<String, Vec<Theme>>,
    current: HashMap<String, String>,
    logical_ids: Vec<String>,
}

impl StyleManager {
    /// Creates a manager over the built-in default registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager over a replacement default registry.
    pub fn with_defaults(defaults: StyleRegistry) -> Self {
        Self {
            defaults: Some(defaults),
            ..Self::default()
        }
    }

    /// Resolves `config` into a style document and records the theme index.
    ///
    /// The default registry is cloned for this session before the base URL
    /// is applied to it. Calling this again replaces all previous state.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unresolved logical layers, dangling
    /// source references and duplicate layer ids.
    pub fn build_style(&mut self, config: &MapConfig) -> Result<StyleDocument, ConfigError> {
        let defaults = match &self.defaults {
            Some(defaults) => defaults.with_base_url(&config.base_url),
            None => StyleRegistry::for_session(&config.base_url),
        };
        let mut resolver = StyleResolver::new(defaults);
        let mut resolution =
            resolver.resolve(&config.usages, &config.custom_sources, &config.custom_layers)?;
        resolver.admit_base_layers(&mut resolution, &config.base_layers)?;

        let mut document = StyleDocument::new(&config.base_url, config.sprite_name.as_deref());
        document.sources = resolution.sources;
        document.layers = resolution.layers;

        self.themes = resolution.themes;
        self.current = resolution.current;
        self.logical_ids = resolution.logical_ids;
        self.resolver = Some(resolver);

        debug!(
            layers = document.layers.len(),
            sources = document.sources.len(),
            "built style document"
        );
        Ok(document)
    }

    /// Logical layer ids of the built style, in usage order.
    pub fn logical_ids(&self) -> &[String] {
        &self.logical_ids
    }

    /// Every theme of `logical_id`.
    pub fn themes(&self, logical_id: &str) -> Option<&[Theme]> {
        self.themes.get(logical_id).map(|themes| themes.as_slice())
    }

    /// The current theme of `logical_id`.
    pub fn current_theme(&self, logical_id: &str) -> Option<&Theme> {
        let current = self.current.get(logical_id)?;
        self.themes
            .get(logical_id)?
            .iter()
            .find(|theme| &theme.theme_id == current)
    }

    /// Returns the logical layer owning a concrete layer, if managed.
    pub fn logical_id_of(&self, concrete_id: &str) -> Option<&str> {
        self.resolver.as_ref()?.logical_id_of(concrete_id)
    }

    /// Concrete ids of the current theme of each logical id, in input order.
    ///
    /// Unknown logical ids are logged and contribute nothing.
    pub fn concrete_ids_for_current_theme<S: AsRef<str>>(&self, logical_ids: &[S]) -> Vec<String> {
        let mut ids = Vec::new();
        for logical_id in logical_ids {
            let logical_id = logical_id.as_ref();
            match self.current_theme(logical_id) {
                Some(theme) => ids.extend(theme.layer_ids().map(str::to_string)),
                None => warn!(logical_id, "no themes registered for logical layer"),
            }
        }
        ids
    }

    /// Concrete ids of every theme of each logical id, in input order.
    ///
    /// Used when hiding a logical layer completely, so that layers of
    /// non-current themes are hidden too.
    pub fn concrete_ids_across_all_themes<S: AsRef<str>>(&self, logical_ids: &[S]) -> Vec<String> {
        let mut ids = Vec::new();
        for logical_id in logical_ids {
            let logical_id = logical_id.as_ref();
            match self.themes.get(logical_id) {
                Some(themes) => ids.extend(
                    themes
                        .iter()
                        .flat_map(|theme| theme.layer_ids().map(str::to_string)),
                ),
                None => warn!(logical_id, "no themes registered for logical layer"),
            }
        }
        ids
    }

    /// Makes `theme_id` the current theme of `logical_id`.
    ///
    /// This is bookkeeping only: the renderer is not touched until the
    /// caller writes visibility again. Returns `false` (and logs) if the
    /// logical layer or theme is unknown.
    pub fn set_current_theme(&mut self, logical_id: &str, theme_id: &str) -> bool {
        let known = self
            .themes
            .get(logical_id)
            .is_some_and(|themes| themes.iter().any(|theme| theme.theme_id == theme_id));
        if !known {
            warn!(logical_id, theme_id, "theme not found for logical layer");
            return false;
        }
        self.current
            .insert(logical_id.to_string(), theme_id.to_string());
        true
    }

    /// Zoom range over which the current theme of `logical_id` can draw.
    ///
    /// Returns `None` (and logs) if the logical layer has no concrete layers.
    pub fn zoom_envelope(&self, logical_id: &str) -> Option<ZoomEnvelope> {
        let envelope = self
            .current_theme(logical_id)
            .and_then(|theme| ZoomEnvelope::covering(&theme.layers));
        if envelope.is_none() {
            warn!(logical_id, "logical layer has no concrete layers");
        }
        envelope
    }

    /// Returns `true` if the renderer reports every current-theme layer of
    /// `logical_id` as visible. A logical layer without layers is never visible.
    pub fn reports_visible<R: MapRenderer + ?Sized>(&self, renderer: &R, logical_id: &str) -> bool {
        let ids = self.concrete_ids_for_current_theme(&[logical_id]);
        !ids.is_empty()
            && ids
                .iter()
                .all(|id| renderer.layer_visibility(id) == Some(Visibility::Visible))
    }

    /// Writes the visibility of logical layers to the renderer.
    ///
    /// Showing makes the current theme visible and every other theme
    /// hidden; hiding hides all themes. Only flags that differ from what
    /// the renderer reports are written. Returns the number of writes.
    pub fn apply_visibility<R, S>(
        &self,
        renderer: &mut R,
        logical_ids: &[S],
        display: bool,
    ) -> usize
    where
        R: MapRenderer + ?Sized,
        S: AsRef<str>,
    {
        let all = self.concrete_ids_across_all_themes(logical_ids);
        let shown = if display {
            self.concrete_ids_for_current_theme(logical_ids)
        } else {
            Vec::new()
        };

        let mut writes = 0;
        for id in all.iter().filter(|id| !shown.contains(id)) {
            writes += write_if_changed(&mut *renderer, id, Visibility::None);
        }
        for id in &shown {
            writes += write_if_changed(&mut *renderer, id, Visibility::Visible);
        }
        writes
    }
}

fn write_if_changed<R: MapRenderer + ?Sized>(
    renderer: &mut R,
    id: &str,
    visibility: Visibility,
) -> usize {
    match renderer.layer_visibility(id) {
        Some(current) if current != visibility => {
            renderer.set_layer_visibility(id, visibility);
            1
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Usage;
    use crate::model::ConcreteLayer;
    use crate::registry::{LayerDefinition, ThemeDefinition};
    use crate::renderer::HeadlessMap;

    fn built(config: MapConfig) -> (StyleManager, StyleDocument) {
        let mut manager = StyleManager::new();
        let document = manager.build_style(&config).unwrap();
        (manager, document)
    }

    /// A logical layer with two themes of two layers each.
    fn two_by_two() -> MapConfig {
        MapConfig::new("/")
            .custom_source("x", crate::model::SourceDescriptor::new("geojson"))
            .custom_layers(
                "x",
                LayerDefinition::Themed(vec![
                    ThemeDefinition::new("default", "Default")
                        .layer(ConcreteLayer::new("x-a", "fill").source("x"))
                        .layer(ConcreteLayer::new("x-b", "line").source("x")),
                    ThemeDefinition::new("alt", "Alt")
                        .layer(ConcreteLayer::new("x-alt-a", "fill").source("x"))
                        .layer(ConcreteLayer::new("x-alt-b", "line").source("x")),
                ]),
            )
            .usage("x")
    }

    #[test]
    fn test_build_style_urls() {
        let (_, document) = built(
            MapConfig::new("https://maps.example/")
                .sprite("planning")
                .usage("streetTrees"),
        );
        assert_eq!(document.version, 8);
        assert_eq!(
            document.glyphs,
            "https://maps.example/fonts/{fontstack}/{range}.pbf"
        );
        assert_eq!(
            document.sprite.as_deref(),
            Some("https://maps.example/planning")
        );
    }

    #[test]
    fn test_build_style_propagates_config_error() {
        let mut manager = StyleManager::new();
        let err = manager
            .build_style(&MapConfig::new("/").usage("nowhere"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedLogicalLayer { .. }));
    }

    #[test]
    fn test_with_defaults_replaces_builtin() {
        let defaults = StyleRegistry::new()
            .add_source("s", crate::model::SourceDescriptor::vector(["t/{z}.pbf"]))
            .add_layers(
                "only",
                LayerDefinition::Flat(vec![ConcreteLayer::new("only-1", "fill").source("s")]),
            );
        let mut manager = StyleManager::with_defaults(defaults);
        let document = manager
            .build_style(&MapConfig::new("https://h/").usage("only"))
            .unwrap();
        assert_eq!(
            document.sources["s"].tiles.as_ref().unwrap()[0],
            "https://h/t/{z}.pbf"
        );
        assert!(manager
            .build_style(&MapConfig::new("/").usage("streetTrees"))
            .is_err());
    }

    // =========================================================================
    // Id lookups
    // =========================================================================

    #[test]
    fn test_current_theme_ids_preserve_input_order() {
        let (manager, _) = built(
            MapConfig::new("/")
                .usage("streetTrees")
                .usage(Usage::themed("permits", "yellow")),
        );
        let ids = manager.concrete_ids_for_current_theme(&["permits", "streetTrees"]);
        assert_eq!(
            ids,
            vec![
                "permits-yellow-fill",
                "permits-yellow-outline",
                "street-trees",
                "street-trees-label"
            ]
        );
    }

    #[test]
    fn test_unknown_logical_id_yields_nothing() {
        let (manager, _) = built(MapConfig::new("/").usage("streetTrees"));
        assert!(manager.concrete_ids_for_current_theme(&["ghost"]).is_empty());
        assert!(manager.concrete_ids_across_all_themes(&["ghost"]).is_empty());
        assert!(manager.zoom_envelope("ghost").is_none());
    }

    #[test]
    fn test_across_all_themes() {
        let (manager, _) = built(two_by_two());
        assert_eq!(
            manager.concrete_ids_across_all_themes(&["x"]),
            vec!["x-a", "x-b", "x-alt-a", "x-alt-b"]
        );
    }

    #[test]
    fn test_set_current_theme_is_bookkeeping_only() {
        let (mut manager, document) = built(two_by_two());
        let map = HeadlessMap::load(&document);

        assert!(manager.set_current_theme("x", "alt"));
        assert_eq!(manager.current_theme("x").unwrap().theme_id, "alt");
        assert_eq!(map.writes(), 0);
        assert!(map.is_visible("x-a"));

        assert!(!manager.set_current_theme("x", "missing"));
        assert!(!manager.set_current_theme("ghost", "alt"));
        assert_eq!(manager.current_theme("x").unwrap().theme_id, "alt");
    }

    #[test]
    fn test_logical_id_of() {
        let (manager, _) = built(two_by_two());
        assert_eq!(manager.logical_id_of("x-alt-b"), Some("x"));
        assert_eq!(manager.logical_id_of("nope"), None);
        assert_eq!(StyleManager::new().logical_id_of("x-a"), None);
    }

    // =========================================================================
    // Zoom envelope
    // =========================================================================

    #[test]
    fn test_zoom_envelope_single_bounded_layer() {
        let config = MapConfig::new("/")
            .custom_source("s", crate::model::SourceDescriptor::new("geojson"))
            .custom_layers(
                "z",
                LayerDefinition::Flat(vec![ConcreteLayer::new("z-1", "fill")
                    .source("s")
                    .minzoom(10.0)
                    .maxzoom(16.0)]),
            )
            .usage("z");
        let (manager, _) = built(config);
        let envelope = manager.zoom_envelope("z").unwrap();

        assert!(envelope.contains(12.0));
        assert!(!envelope.contains(9.0));
        assert!(!envelope.contains(17.0));
    }

    #[test]
    fn test_zoom_envelope_follows_current_theme() {
        let config = MapConfig::new("/")
            .custom_source("s", crate::model::SourceDescriptor::new("geojson"))
            .custom_layers(
                "z",
                LayerDefinition::Themed(vec![
                    ThemeDefinition::new("default", "Default")
                        .layer(ConcreteLayer::new("z-near", "fill").source("s").minzoom(14.0)),
                    ThemeDefinition::new("far", "Far")
                        .layer(ConcreteLayer::new("z-far", "fill").source("s").maxzoom(14.0)),
                ]),
            )
            .usage("z");
        let (mut manager, _) = built(config);

        assert_eq!(
            manager.zoom_envelope("z"),
            Some(ZoomEnvelope::new(Some(14.0), None))
        );
        manager.set_current_theme("z", "far");
        assert_eq!(
            manager.zoom_envelope("z"),
            Some(ZoomEnvelope::new(None, Some(14.0)))
        );
    }

    // =========================================================================
    // Visibility writes
    // =========================================================================

    #[test]
    fn test_hide_uses_all_themes() {
        let (manager, document) = built(two_by_two());
        let mut map = HeadlessMap::load(&document);
        // simulate a stale non-current layer left visible
        map.set_layer_visibility("x-alt-a", Visibility::Visible);

        manager.apply_visibility(&mut map, &["x"], false);
        for id in ["x-a", "x-b", "x-alt-a", "x-alt-b"] {
            assert!(!map.is_visible(id), "{} should be hidden", id);
        }
    }

    #[test]
    fn test_show_after_theme_switch() {
        let (mut manager, document) = built(two_by_two());
        let mut map = HeadlessMap::load(&document);

        manager.set_current_theme("x", "alt");
        let writes = manager.apply_visibility(&mut map, &["x"], true);

        assert_eq!(writes, 4);
        assert!(!map.is_visible("x-a"));
        assert!(!map.is_visible("x-b"));
        assert!(map.is_visible("x-alt-a"));
        assert!(map.is_visible("x-alt-b"));
        assert!(manager.reports_visible(&map, "x"));
    }

    #[test]
    fn test_apply_visibility_skips_unchanged_flags() {
        let (manager, document) = built(two_by_two());
        let mut map = HeadlessMap::load(&document);

        assert_eq!(manager.apply_visibility(&mut map, &["x"], true), 0);
        assert_eq!(manager.apply_visibility(&mut map, &["x"], false), 2);
        assert_eq!(manager.apply_visibility(&mut map, &["x"], false), 0);
        assert!(!manager.reports_visible(&map, "x"));
    }
}
