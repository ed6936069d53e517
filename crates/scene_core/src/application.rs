//! Application trait and lifecycle management

use crate::core::config::ConfigError;
use crate::engine::{Engine, EngineError};
use crate::render::ModelError;
use crate::scene::SceneError;
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive the engine. Every callback receives the
/// engine explicitly; there is no global engine to reach for.
pub trait Application {
    /// Initialize the application
    ///
    /// Called once after the engine is created. Set up scenes, entities and
    /// models here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called once per fixed simulation tick.
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Tick length in seconds
    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError>;

    /// Cleanup the application
    ///
    /// Called once when the run loop exits, before the engine disposes
    /// its scenes.
    fn cleanup(&mut self, engine: &mut Engine);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Scene setup error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Invalid model description
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
