//! Shared data model: concrete layers, sources, themes and zoom envelopes.
//!
//! These types mirror the declarative schema consumed by the rendering
//! engine. Field names serialize with the renderer's own key names
//! (`type`, `source-layer`, `minzoom`, ...) so a [`StyleDocument`] can be
//! handed over wholesale.
//!
//! [`StyleDocument`]: crate::StyleDocument

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Theme id given to the implicit theme wrapping a flat layer list.
pub const DEFAULT_THEME_ID: &str = "default";

/// Display name of the implicit default theme.
pub const DEFAULT_THEME_NAME: &str = "Default";

/// Layout visibility flag of a concrete layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    None,
}

impl Visibility {
    /// Returns `true` for [`Visibility::Visible`].
    pub fn is_visible(self) -> bool {
        matches!(self, Visibility::Visible)
    }

    /// Returns the renderer's string for this flag.
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }
}

impl From<bool> for Visibility {
    fn from(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::None
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data source declaration (vector tiles, GeoJSON, raster, ...).
///
/// Only the fields this crate inspects are typed; everything else the host
/// declares is carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SourceDescriptor {
    /// Creates a source of the given renderer type with no location yet.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            url: None,
            tiles: None,
            minzoom: None,
            maxzoom: None,
            attribution: None,
            extra: Map::new(),
        }
    }

    /// Creates a vector tile source from tile URL templates.
    pub fn vector<I, S>(tiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("vector").tiles(tiles)
    }

    /// Sets the tile URL templates.
    pub fn tiles<I, S>(mut self, tiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tiles = Some(tiles.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the TileJSON url.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the zoom levels the source has data for.
    pub fn zoom_levels(mut self, minzoom: f64, maxzoom: f64) -> Self {
        self.minzoom = Some(minzoom);
        self.maxzoom = Some(maxzoom);
        self
    }

    /// Sets an arbitrary extra property (e.g. `data` for GeoJSON sources).
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Returns a copy whose relative `url` and `tiles` entries are prefixed
    /// with `base_url`. Absolute URLs (anything with a scheme) are kept.
    pub fn with_base_url(&self, base_url: &str) -> Self {
        let mut source = self.clone();
        if let Some(url) = source.url.as_mut() {
            *url = prefix_relative(base_url, url);
        }
        if let Some(tiles) = source.tiles.as_mut() {
            for tile in tiles.iter_mut() {
                *tile = prefix_relative(base_url, tile);
            }
        }
        source
    }
}

fn prefix_relative(base_url: &str, url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("{}{}", base_url, url)
    }
}

/// One declarative paint/layout descriptor bound to a single source.
///
/// Layers are opaque to this crate except for their id, source reference,
/// zoom bounds and the `visibility` layout property.
///
/// # Example
///
/// ```rust
/// use mapstyle::ConcreteLayer;
/// use serde_json::json;
///
/// let layer = ConcreteLayer::new("street-trees", "circle")
///     .source("street-trees")
///     .source_layer("trees")
///     .minzoom(14.0)
///     .paint("circle-color", json!("#2e7d32"));
///
/// assert!(layer.visibility().is_visible());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcreteLayer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(
        rename = "source-layer",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub layout: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub paint: Map<String, Value>,
}

impl ConcreteLayer {
    /// Creates a layer with the given id and renderer type (`fill`, `line`, ...).
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            source: None,
            source_layer: None,
            minzoom: None,
            maxzoom: None,
            filter: None,
            layout: Map::new(),
            paint: Map::new(),
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    pub fn minzoom(mut self, zoom: f64) -> Self {
        self.minzoom = Some(zoom);
        self
    }

    pub fn maxzoom(mut self, zoom: f64) -> Self {
        self.maxzoom = Some(zoom);
        self
    }

    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn paint(mut self, key: impl Into<String>, value: Value) -> Self {
        self.paint.insert(key.into(), value);
        self
    }

    pub fn layout(mut self, key: impl Into<String>, value: Value) -> Self {
        self.layout.insert(key.into(), value);
        self
    }

    /// Reads the `visibility` layout property. Absent means visible.
    pub fn visibility(&self) -> Visibility {
        match self.layout.get("visibility").and_then(Value::as_str) {
            Some("none") => Visibility::None,
            _ => Visibility::Visible,
        }
    }

    /// Overwrites the `visibility` layout property.
    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.layout
            .insert("visibility".to_string(), Value::from(visibility.as_str()));
    }
}

/// Zoom range over which a logical layer can be drawn.
///
/// A `None` side is unbounded. The lower bound is inclusive and the upper
/// bound exclusive, matching how the renderer treats `minzoom`/`maxzoom`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoomEnvelope {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ZoomEnvelope {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    /// An envelope unbounded on both sides.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Returns `true` if `zoom` lies within the envelope.
    pub fn contains(&self, zoom: f64) -> bool {
        self.min.map_or(true, |min| zoom >= min) && self.max.map_or(true, |max| zoom < max)
    }

    /// Computes the envelope covering every layer in `layers`.
    ///
    /// If any layer omits a bound, that side of the envelope is unbounded.
    /// Otherwise the widest span is returned. Returns `None` when `layers`
    /// is empty.
    pub fn covering<'a, I>(layers: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a ConcreteLayer>,
    {
        let mut layers = layers.into_iter();
        let first = layers.next()?;
        let mut envelope = Self::new(first.minzoom, first.maxzoom);
        for layer in layers {
            envelope.min = match (envelope.min, layer.minzoom) {
                (Some(a), Some(b)) => Some(a.min(b)),
                _ => None,
            };
            envelope.max = match (envelope.max, layer.maxzoom) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            };
        }
        Some(envelope)
    }
}

/// An alternate concrete-layer set for one logical layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub theme_id: String,
    pub name: String,
    pub logical_id: String,
    pub layers: Vec<ConcreteLayer>,
}

impl Theme {
    /// Ids of this theme's concrete layers, in document order.
    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|layer| layer.id.as_str())
    }

    /// Returns `true` for the implicit or explicit `default` theme.
    pub fn is_default(&self) -> bool {
        self.theme_id == DEFAULT_THEME_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_visibility_from_bool() {
        assert_eq!(Visibility::from(true), Visibility::Visible);
        assert_eq!(Visibility::from(false), Visibility::None);
        assert_eq!(Visibility::None.to_string(), "none");
    }

    #[test]
    fn test_layer_visibility_defaults_to_visible() {
        let mut layer = ConcreteLayer::new("a", "fill");
        assert_eq!(layer.visibility(), Visibility::Visible);

        layer.set_visibility(Visibility::None);
        assert_eq!(layer.visibility(), Visibility::None);
        assert_eq!(layer.layout["visibility"], json!("none"));
    }

    #[test]
    fn test_layer_serializes_with_renderer_keys() {
        let layer = ConcreteLayer::new("permits-fill", "fill")
            .source("permits")
            .source_layer("permits")
            .minzoom(10.0);

        let value = serde_json::to_value(&layer).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "permits-fill",
                "type": "fill",
                "source": "permits",
                "source-layer": "permits",
                "minzoom": 10.0
            })
        );
    }

    #[test]
    fn test_source_base_url_only_prefixes_relative() {
        let source = SourceDescriptor::vector(["tiles/{z}/{x}/{y}.pbf", "https://cdn/{z}.pbf"])
            .url("tiles.json");
        let rebased = source.with_base_url("https://maps.example/");

        assert_eq!(rebased.url.as_deref(), Some("https://maps.example/tiles.json"));
        assert_eq!(
            rebased.tiles.unwrap(),
            vec![
                "https://maps.example/tiles/{z}/{x}/{y}.pbf".to_string(),
                "https://cdn/{z}.pbf".to_string()
            ]
        );
        // original untouched
        assert_eq!(source.url.as_deref(), Some("tiles.json"));
    }

    #[test]
    fn test_source_extra_fields_round_trip() {
        let value = json!({
            "type": "geojson",
            "data": {"type": "FeatureCollection", "features": []}
        });
        let source: SourceDescriptor = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(source.kind, "geojson");
        assert!(source.extra.contains_key("data"));
        assert_eq!(serde_json::to_value(&source).unwrap(), value);
    }

    // =========================================================================
    // ZoomEnvelope
    // =========================================================================

    #[test]
    fn test_envelope_contains_bounds() {
        let envelope = ZoomEnvelope::new(Some(10.0), Some(16.0));
        assert!(envelope.contains(12.0));
        assert!(envelope.contains(10.0));
        assert!(!envelope.contains(9.0));
        assert!(!envelope.contains(17.0));
        assert!(!envelope.contains(16.0));
    }

    #[test]
    fn test_envelope_covering_widest_span() {
        let layers = [
            ConcreteLayer::new("a", "fill").minzoom(10.0).maxzoom(14.0),
            ConcreteLayer::new("b", "line").minzoom(12.0).maxzoom(18.0),
        ];
        let envelope = ZoomEnvelope::covering(&layers).unwrap();
        assert_eq!(envelope, ZoomEnvelope::new(Some(10.0), Some(18.0)));
    }

    #[test]
    fn test_envelope_covering_unbounded_side() {
        let layers = [
            ConcreteLayer::new("a", "fill").minzoom(10.0).maxzoom(16.0),
            ConcreteLayer::new("b", "line").minzoom(12.0),
        ];
        let envelope = ZoomEnvelope::covering(&layers).unwrap();
        assert_eq!(envelope.min, Some(10.0));
        assert_eq!(envelope.max, None);
        assert!(envelope.contains(22.0));
    }

    #[test]
    fn test_envelope_covering_empty() {
        let layers: Vec<ConcreteLayer> = Vec::new();
        assert!(ZoomEnvelope::covering(&layers).is_none());
    }
}
