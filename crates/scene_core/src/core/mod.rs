//! # Core Engine Module
//!
//! Shared configuration types used by every subsystem.
//!
//! ## Organization
//!
//! - **Config**: Engine, scene and render settings with file loading

pub mod config;

// Re-export commonly used config types
pub use config::{
    CullerConfig,
    EngineConfig,
    RenderConfig,
    SceneConfig,
    Config,
    ConfigError,
};
