//! Configuration errors raised while building a style.

use thiserror::Error;

/// Error returned when a map configuration cannot be turned into a style.
///
/// All variants are deterministic configuration mistakes: they are raised
/// before the renderer loads anything and retrying cannot fix them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A usage names a logical layer found in neither the custom nor the
    /// default registry.
    #[error("logical layer '{name}' is not registered in custom or default layers")]
    UnresolvedLogicalLayer { name: String },

    /// A concrete layer references a source declared nowhere.
    #[error("layer '{layer}' references undeclared source '{source_name}'")]
    DanglingSourceReference { source_name: String, layer: String },

    /// Two admitted concrete layers share the same id.
    #[error("concrete layer id '{layer}' is declared more than once")]
    DuplicateLayerId { layer: String },

    /// A logical layer definition contains no themes.
    #[error("logical layer '{name}' declares no themes")]
    EmptyLayerDefinition { name: String },

    /// Configuration text could not be deserialized.
    #[error("invalid {format} configuration: {message}")]
    Parse { format: &'static str, message: String },

    /// A configuration file could not be read.
    #[error("failed to read configuration '{path}': {message}")]
    Io { path: String, message: String },
}
