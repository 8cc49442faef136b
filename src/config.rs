//! Host configuration of a map session.
//!
//! A [`MapConfig`] lists which logical layers the map uses (and in which
//! theme), plus any custom sources and layer definitions that shadow the
//! defaults. It can be built fluently or deserialized from JSON or YAML:
//!
//! ```rust
//! use mapstyle::{MapConfig, Usage};
//!
//! let config = MapConfig::from_yaml_str(r#"
//! baseUrl: "https://maps.example/"
//! spriteName: "planning"
//! usages:
//!   - streetTrees
//!   - name: permits
//!     theme: yellow
//! "#).unwrap();
//!
//! assert_eq!(config.usages[1].theme(), Some("yellow"));
//! assert_eq!(config.usages[0], Usage::from("streetTrees"));
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{ConcreteLayer, SourceDescriptor};
use crate::registry::LayerDefinition;
use crate::style::ConfigError;

fn default_visible() -> bool {
    true
}

/// A usage entry with an explicit theme and/or initial visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

/// One logical layer the map uses: either a bare name or a detailed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Usage {
    Name(String),
    Detailed(UsageEntry),
}

impl Usage {
    /// Creates a usage requesting a specific theme.
    pub fn themed(name: impl Into<String>, theme: impl Into<String>) -> Self {
        Usage::Detailed(UsageEntry {
            name: name.into(),
            theme: Some(theme.into()),
            visible: true,
        })
    }

    /// Creates a usage whose layers start hidden.
    pub fn hidden(name: impl Into<String>) -> Self {
        Usage::Detailed(UsageEntry {
            name: name.into(),
            theme: None,
            visible: false,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Usage::Name(name) => name,
            Usage::Detailed(entry) => &entry.name,
        }
    }

    /// The requested theme, if any.
    pub fn theme(&self) -> Option<&str> {
        match self {
            Usage::Name(_) => None,
            Usage::Detailed(entry) => entry.theme.as_deref(),
        }
    }

    pub fn visible(&self) -> bool {
        match self {
            Usage::Name(_) => true,
            Usage::Detailed(entry) => entry.visible,
        }
    }
}

impl From<&str> for Usage {
    fn from(name: &str) -> Self {
        Usage::Name(name.to_string())
    }
}

impl From<String> for Usage {
    fn from(name: String) -> Self {
        Usage::Name(name)
    }
}

/// Everything the host supplies to build one map's style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapConfig {
    pub usages: Vec<Usage>,
    pub custom_sources: BTreeMap<String, SourceDescriptor>,
    pub custom_layers: BTreeMap<String, LayerDefinition>,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite_name: Option<String>,
    /// Unmanaged layers (basemap, labels) drawn beneath every logical layer.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub base_layers: Vec<ConcreteLayer>,
}

impl MapConfig {
    /// Creates an empty configuration rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Appends a usage, returning the configuration for chaining.
    pub fn usage(mut self, usage: impl Into<Usage>) -> Self {
        self.usages.push(usage.into());
        self
    }

    pub fn sprite(mut self, sprite_name: impl Into<String>) -> Self {
        self.sprite_name = Some(sprite_name.into());
        self
    }

    /// Registers a custom source, shadowing any default of the same name.
    pub fn custom_source(mut self, name: impl Into<String>, source: SourceDescriptor) -> Self {
        self.custom_sources.insert(name.into(), source);
        self
    }

    /// Registers a custom layer definition, shadowing any default of the same name.
    pub fn custom_layers(mut self, name: impl Into<String>, definition: LayerDefinition) -> Self {
        self.custom_layers.insert(name.into(), definition);
        self
    }

    pub fn base_layer(mut self, layer: ConcreteLayer) -> Self {
        self.base_layers.push(layer);
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            format: "JSON",
            message: e.to_string(),
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            format: "YAML",
            message: e.to_string(),
        })
    }

    /// Loads a configuration file, choosing the format by extension
    /// (`.json`, `.yaml` or `.yml`).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(ConfigError::Parse {
                format: "unknown",
                message: format!(
                    "unsupported configuration extension {:?} for '{}'",
                    other.unwrap_or(""),
                    path.display()
                ),
            }),
        }
    }
}
