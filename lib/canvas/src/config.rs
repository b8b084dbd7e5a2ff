//! Editor configuration.
//!
//! Loaded via the `config` crate from an optional file plus environment
//! variables prefixed with `AGENT_FACTORY`, using `__` as the nesting
//! separator (`AGENT_FACTORY__CANVAS__GRID_SIZE=10`). Every field has a
//! default, so an empty environment yields a working configuration.

use crate::error::CanvasError;
use agent_factory_core::Size;
use agent_factory_workflow::{CompatibilityTable, CompatiblePair};
use rootcause::Report;
use serde::Deserialize;
use std::path::Path;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AGENT_FACTORY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FactoryConfig {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub ports: PortsConfig,
}

/// Canvas geometry and interaction settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CanvasConfig {
    /// Smallest width a node can be resized to.
    #[serde(default = "default_min_node_width")]
    pub min_node_width: f64,

    /// Smallest height a node can be resized to.
    #[serde(default = "default_min_node_height")]
    pub min_node_height: f64,

    /// Grid spacing used when snapping is on.
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,

    /// Whether committed drag positions snap to the grid.
    #[serde(default)]
    pub snap_to_grid: bool,

    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
}

fn default_min_node_width() -> f64 {
    Size::MIN_NODE.width
}

fn default_min_node_height() -> f64 {
    Size::MIN_NODE.height
}

fn default_grid_size() -> f64 {
    20.0
}

fn default_min_zoom() -> f64 {
    0.25
}

fn default_max_zoom() -> f64 {
    2.0
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_node_width: default_min_node_width(),
            min_node_height: default_min_node_height(),
            grid_size: default_grid_size(),
            snap_to_grid: false,
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
        }
    }
}

impl CanvasConfig {
    #[must_use]
    pub fn min_node_size(&self) -> Size {
        Size::new(self.min_node_width, self.min_node_height)
    }
}

/// Port typing settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PortsConfig {
    /// Cross-type pairs allowed on top of the builtin ones.
    #[serde(default)]
    pub compatible_pairs: Vec<CompatiblePair>,
}

impl PortsConfig {
    #[must_use]
    pub fn compatibility_table(&self) -> CompatibilityTable {
        CompatibilityTable::with_pairs(self.compatible_pairs.iter().copied())
    }
}

impl FactoryConfig {
    /// Loads configuration from environment variables only.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Config`] if a variable cannot be parsed or the
    /// result is inconsistent.
    pub fn from_env() -> Result<Self, Report<CanvasError>> {
        Self::load(None)
    }

    /// Loads configuration from `path` (if given), overridden by environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Config`] if the file is missing or malformed, a
    /// variable cannot be parsed, or the result is inconsistent.
    pub fn load(path: Option<&Path>) -> Result<Self, Report<CanvasError>> {
        Self::load_with(path, environment())
    }

    fn load_with(
        path: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, Report<CanvasError>> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let loaded: Self = builder
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| CanvasError::Config {
                details: e.to_string(),
            })?;
        loaded.validate()?;
        tracing::debug!(
            grid_size = loaded.canvas.grid_size,
            snap_to_grid = loaded.canvas.snap_to_grid,
            extra_pairs = loaded.ports.compatible_pairs.len(),
            "loaded configuration"
        );
        Ok(loaded)
    }

    fn validate(&self) -> Result<(), Report<CanvasError>> {
        let canvas = &self.canvas;
        let problem = if canvas.min_node_width <= 0.0 || canvas.min_node_height <= 0.0 {
            Some("minimum node size must be positive")
        } else if canvas.min_zoom <= 0.0 || canvas.min_zoom > canvas.max_zoom {
            Some("zoom limits must satisfy 0 < min_zoom <= max_zoom")
        } else if canvas.grid_size < 0.0 {
            Some("grid_size must not be negative")
        } else {
            None
        };
        match problem {
            Some(details) => Err(CanvasError::Config {
                details: details.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
