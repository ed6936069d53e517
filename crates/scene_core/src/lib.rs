//! # scene_core
//!
//! Transform and scene-graph core of a real-time 3D engine.
//!
//! ## Features
//!
//! - **Entity handles**: Generation-checked 32-bit handles with slot reuse
//! - **Scene graph**: Dense transform hierarchy with eager world propagation
//! - **Culling**: Distance-based cullers attached per scene
//! - **Frame assembly**: Pooled render packets ordered by a single 64-bit key
//! - **Run loop**: Fixed-timestep ticks with explicit engine passing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_core::prelude::*;
//!
//! struct MyApp {
//!     ship: EntityHandle,
//! }
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let root = engine.add_scene(RenderPass::ThreeD)?;
//!         self.ship = engine.add_part(root);
//!         engine.graph_mut().set_at(self.ship, Vec3::new(0.0, 0.0, -10.0));
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
//!         engine.graph_mut().spin(self.ship, 0.0, 1.0, 0.0);
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine) {}
//! }
//!
//! struct NullSink;
//!
//! impl FrameSink for NullSink {
//!     fn submit(&mut self, _passes: &[PassFrame]) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let mut app = MyApp { ship: EntityHandle::INVALID };
//!     Engine::run(config, &mut app, &mut NullSink)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;

pub mod foundation;
pub mod ecs;
pub mod scene;
pub mod render;

mod application;
mod engine;

pub use application::{Application, AppError};
pub use engine::{Engine, EngineError, Profile};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Application, AppError,
        Engine, EngineError,
        core::config::{Config, CullerConfig, EngineConfig, RenderConfig, SceneConfig},
        ecs::{ComponentManager, EntityHandle},
        foundation::math::{Mat4, Quat, Transform, Vec3},
        render::{
            Camera, FrameSink, Light, LoadedAsset, ModelSpec, PassFrame, PovCamera, RenderPass,
        },
        scene::{SceneGraph, Visit},
    };
}
