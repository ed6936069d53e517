//! # Engine Configuration
//!
//! Settings for the scene graph, frame assembly and the run loop, grouped
//! under [`EngineConfig`]. Every struct has sensible defaults, `with_*`
//! builder methods and a `validate()` check. Files load as TOML or RON
//! through the [`Config`] trait.
//!
//! ```toml
//! name = "demo"
//! log_level = "debug"
//! tick_rate_hz = 50
//! max_ticks_per_frame = 5
//!
//! [scene]
//! recycle_threshold = 0
//!
//! [render]
//! max_lights = 3
//! max_instances = 1024
//! packet_capacity = 256
//! culler = { front = { radius = 100.0 } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ecs::entity::MAX_SLOTS;

pub use crate::config::{Config, ConfigError};

/// Culler attached to the 3D scene when it is created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CullerConfig {
    /// Draw everything that is not explicitly culled
    #[default]
    None,
    /// Keep a sphere pushed out ahead of the camera
    Front {
        /// Keep radius
        radius: f32,
    },
    /// Keep everything within a distance of the camera
    Radius {
        /// Keep radius
        radius: f32,
    },
}

/// # Scene Configuration
///
/// Entity identity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Disposed slots wait until more than this many are free before reuse
    pub recycle_threshold: usize,
    /// Upper bound on live entities
    pub max_entities: u32,
}

impl SceneConfig {
    /// Create a scene configuration with defaults
    pub fn new() -> Self {
        Self {
            recycle_threshold: 0,
            max_entities: MAX_SLOTS,
        }
    }

    /// Set the recycle threshold
    pub fn with_recycle_threshold(mut self, threshold: usize) -> Self {
        self.recycle_threshold = threshold;
        self
    }

    /// Set the live entity limit
    pub fn with_max_entities(mut self, max_entities: u32) -> Self {
        self.max_entities = max_entities;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_entities == 0 {
            return Err("Max entities must be at least 1".to_string());
        }
        if self.max_entities > MAX_SLOTS {
            return Err(format!("Max entities cannot exceed {MAX_SLOTS}"));
        }
        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Render Configuration
///
/// Limits used while assembling frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Lights passed to a pass; extra lights are dropped
    pub max_lights: usize,
    /// Largest instance count a single packet may draw
    pub max_instances: u32,
    /// Packets preallocated per pass
    pub packet_capacity: usize,
    /// Culler for the 3D scene
    pub culler: CullerConfig,
}

impl RenderConfig {
    /// Create a render configuration with defaults
    pub fn new() -> Self {
        Self {
            max_lights: 3,
            max_instances: 1024,
            packet_capacity: 256,
            culler: CullerConfig::None,
        }
    }

    /// Set the light limit
    pub fn with_max_lights(mut self, max_lights: usize) -> Self {
        self.max_lights = max_lights;
        self
    }

    /// Set the per-packet instance limit
    pub fn with_max_instances(mut self, max_instances: u32) -> Self {
        self.max_instances = max_instances;
        self
    }

    /// Set the initial packet pool size
    pub fn with_packet_capacity(mut self, capacity: usize) -> Self {
        self.packet_capacity = capacity;
        self
    }

    /// Set the 3D scene culler
    pub fn with_culler(mut self, culler: CullerConfig) -> Self {
        self.culler = culler;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_instances == 0 {
            return Err("Max instances must be at least 1".to_string());
        }
        match self.culler {
            CullerConfig::Front { radius } | CullerConfig::Radius { radius }
                if !radius.is_finite() || radius < 0.0 =>
            {
                Err(format!("Culler radius must be a non-negative number, got {radius}"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Engine Configuration
///
/// Top-level configuration for the engine and its run loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Application name, used in log output
    pub name: String,
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Simulation ticks per second
    pub tick_rate_hz: u32,
    /// Most ticks run to catch up in a single frame
    pub max_ticks_per_frame: u32,
    /// Scene graph settings
    pub scene: SceneConfig,
    /// Frame assembly settings
    pub render: RenderConfig,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            name: "scene_core application".to_string(),
            log_level: "info".to_string(),
            tick_rate_hz: 50,
            max_ticks_per_frame: 5,
            scene: SceneConfig::default(),
            render: RenderConfig::default(),
        }
    }

    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Set application name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set simulation rate
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz;
        self
    }

    /// Set scene settings
    pub fn with_scene(mut self, scene: SceneConfig) -> Self {
        self.scene = scene;
        self
    }

    /// Set render settings
    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Length of one simulation tick
    pub fn tick_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate_hz == 0 {
            return Err("Tick rate must be at least 1 Hz".to_string());
        }
        if self.max_ticks_per_frame == 0 {
            return Err("Max ticks per frame must be at least 1".to_string());
        }
        self.scene.validate()?;
        self.render.validate()?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}
