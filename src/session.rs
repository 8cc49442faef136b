//! One map's engine instance: style manager, tree controller and renderer.

use tracing::warn;

use crate::config::MapConfig;
use crate::event::MapEvent;
use crate::renderer::MapRenderer;
use crate::style::{ConfigError, StyleDocument, StyleManager};
use crate::tree::{LayerTree, NodePath, VisibilityTreeController};

/// Owns everything one map needs. Hosts with several maps open one
/// session per map; nothing is shared between sessions.
///
/// # Example
///
/// ```rust
/// use mapstyle::{HeadlessMap, LayerTree, LogicalLayer, MapConfig, MapSession, Usage};
///
/// let config = MapConfig::new("https://maps.example/")
///     .usage("streetTrees")
///     .usage(Usage::themed("permits", "yellow"));
/// let tree = LayerTree::new(vec![
///     LogicalLayer::new("streetTrees", "Street trees").into(),
///     LogicalLayer::new("permits", "Permits").into(),
/// ]);
///
/// let mut session =
///     MapSession::open(&config, tree, |doc| HeadlessMap::at_zoom(doc, 15.0)).unwrap();
/// assert!(session.renderer().is_visible("permits-yellow-fill"));
///
/// session.switch_theme("permits", "default");
/// assert!(session.renderer().is_visible("permits-fill"));
/// assert!(!session.renderer().is_visible("permits-yellow-fill"));
/// ```
#[derive(Debug)]
pub struct MapSession<R: MapRenderer> {
    manager: StyleManager,
    controller: VisibilityTreeController,
    renderer: R,
    document: StyleDocument,
}

impl<R: MapRenderer> MapSession<R> {
    /// Builds the style for `config`, hands it to `load` to create the
    /// renderer, and seeds the tree from the loaded renderer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] before `load` is called if the
    /// configuration cannot be resolved.
    pub fn open<F>(config: &MapConfig, tree: LayerTree, load: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&StyleDocument) -> R,
    {
        Self::with_manager(StyleManager::new(), config, tree, load)
    }

    /// Like [`open`](Self::open), with a preconfigured manager.
    pub fn with_manager<F>(
        mut manager: StyleManager,
        config: &MapConfig,
        tree: LayerTree,
        load: F,
    ) -> Result<Self, ConfigError>
    where
        F: FnOnce(&StyleDocument) -> R,
    {
        let document = manager.build_style(config)?;
        let mut renderer = load(&document);
        let mut controller = VisibilityTreeController::new(tree);
        controller.initialize(&manager, &mut renderer);
        Ok(Self {
            manager,
            controller,
            renderer,
            document,
        })
    }

    /// The document the renderer was loaded with.
    pub fn document(&self) -> &StyleDocument {
        &self.document
    }

    pub fn manager(&self) -> &StyleManager {
        &self.manager
    }

    pub fn controller(&self) -> &VisibilityTreeController {
        &self.controller
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable renderer access, e.g. to move the camera before
    /// [`handle_zoom`](Self::handle_zoom).
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Zoom-change handler. Returns the number of renderer writes.
    pub fn handle_zoom(&mut self) -> usize {
        self.controller
            .handle_zoom(&self.manager, &mut self.renderer)
    }

    /// User toggle of a tree node.
    pub fn toggle(&mut self, path: &NodePath, checked: bool) -> bool {
        self.controller
            .toggle(path, checked, &self.manager, &mut self.renderer)
    }

    /// User toggle of every leaf showing `logical_id`.
    pub fn toggle_layer(&mut self, logical_id: &str, checked: bool) -> bool {
        self.controller
            .toggle_layer(logical_id, checked, &self.manager, &mut self.renderer)
    }

    /// Host-driven show/hide of logical layers.
    pub fn set_layers_visible<S: AsRef<str>>(&mut self, logical_ids: &[S], display: bool) -> usize {
        self.controller
            .set_layers_checked(logical_ids, display, &self.manager, &mut self.renderer)
    }

    /// Makes `theme_id` current for `logical_id` and rewrites visibility.
    ///
    /// Returns `false` (and changes nothing) if the theme is unknown.
    pub fn switch_theme(&mut self, logical_id: &str, theme_id: &str) -> bool {
        if !self.manager.set_current_theme(logical_id, theme_id) {
            return false;
        }
        self.controller.resync(&self.manager, &mut self.renderer);
        true
    }

    /// Logical layer owning a concrete layer id reported by the renderer
    /// (for example from a click); `None` for base content.
    pub fn logical_id_at(&self, concrete_id: &str) -> Option<&str> {
        let logical_id = self.manager.logical_id_of(concrete_id);
        if logical_id.is_none() && self.document.layer(concrete_id).is_none() {
            warn!(concrete_id, "concrete layer not in the style document");
        }
        logical_id
    }

    /// Takes all events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        self.controller.drain_events()
    }
}
