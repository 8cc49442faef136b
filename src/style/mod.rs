//! Style resolution and management.
//!
//! This module provides the style-building primitives:
//!
//! - [`StyleResolver`]: merges custom and default registries into document parts
//! - [`StyleManager`]: owns the resolver and the per-logical theme bookkeeping
//! - [`StyleDocument`]: the artifact loaded by the renderer
//! - [`ConfigError`]: fatal configuration errors

mod document;
mod error;
mod manager;
mod resolver;

pub use document::{StyleDocument, GLYPHS_PATH, STYLE_VERSION};
pub use error::ConfigError;
pub use manager::StyleManager;
pub use resolver::{Resolution, StyleResolver};
