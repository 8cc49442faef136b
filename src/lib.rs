//! # Mapstyle - Logical Layers for Vector Maps
//!
//! `mapstyle` turns a declarative configuration of named *logical layers*
//! (fire hydrants, permits, street trees, ...) into a style document for a
//! vector-map renderer, and keeps a tree of layer toggles in sync with the
//! renderer as the user clicks and zooms.
//!
//! ## Concepts
//!
//! - **Logical layer**: a toggle handle independent of how it is drawn
//! - **Concrete layer**: one paint/layout descriptor in the style document
//! - **Theme**: an alternate concrete-layer set for the same logical layer;
//!   exactly one is current at a time
//! - **Checked / active**: what the user wants shown vs. what may be drawn
//!   at the current zoom. A layer is rendered only when both hold.
//!
//! ## Quick Start
//!
//! ```rust
//! use mapstyle::{HeadlessMap, LayerGroup, LayerTree, LogicalLayer, MapConfig, MapSession, Usage};
//!
//! let config = MapConfig::new("https://maps.example/")
//!     .sprite("planning")
//!     .usage("streetTrees")
//!     .usage(Usage::themed("permits", "yellow"));
//!
//! let tree = LayerTree::new(vec![LayerGroup::new("City")
//!     .with(LogicalLayer::new("streetTrees", "Street trees"))
//!     .with(LogicalLayer::new("permits", "Permits"))
//!     .into()]);
//!
//! let mut session =
//!     MapSession::open(&config, tree, |document| HeadlessMap::at_zoom(document, 13.0)).unwrap();
//!
//! // Trees start at zoom 14: checked, but not drawn yet.
//! assert!(!session.renderer().is_visible("street-trees"));
//!
//! session.renderer_mut().set_zoom(15.0);
//! session.handle_zoom();
//! assert!(session.renderer().is_visible("street-trees"));
//! ```
//!
//! ## Configuration errors
//!
//! Unknown logical layers and layers referencing undeclared sources are
//! reported as [`ConfigError`]s while the style is built, before anything
//! reaches the renderer. Softer problems (an unknown theme, a logical layer
//! with no concrete layers) are logged through `tracing` and leave the rest
//! of the map working.

pub mod config;
pub mod event;
pub mod model;
pub mod registry;
pub mod renderer;
pub mod session;
pub mod style;
pub mod tree;

pub use config::{MapConfig, Usage, UsageEntry};
pub use event::{MapEvent, NodeRef, ToggleNotification};
pub use model::{
    ConcreteLayer, SourceDescriptor, Theme, Visibility, ZoomEnvelope, DEFAULT_THEME_ID,
    DEFAULT_THEME_NAME,
};
pub use registry::{LayerDefinition, StyleRegistry, ThemeDefinition};
pub use renderer::{HeadlessMap, MapRenderer};
pub use session::MapSession;
pub use style::{ConfigError, Resolution, StyleDocument, StyleManager, StyleResolver};
pub use tree::{
    compute_activity, compute_cascade, Activity, CascadePlan, LayerGroup, LayerNode, LayerTree,
    LeafVisibility, LogicalLayer, NodePath, VisibilityTreeController,
};
