//! Contract between frame assembly and whatever knows how to draw entities

use super::camera::Camera;
use super::packet::RenderPacket;
use crate::ecs::EntityHandle;
use crate::scene::WorldTransform;
use thiserror::Error;

/// World state of one visible entity, as handed to [`ModelSource::fill_packet`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSnapshot {
    /// Entity being drawn
    pub handle: EntityHandle,
    /// World transform after propagation
    pub world: WorldTransform,
    /// Distance from the pass camera, 0 for 2D passes
    pub distance: f32,
}

/// Reasons a packet could not be filled
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PacketError {
    /// Some asset the model uses has not finished loading
    #[error("assets for {0} not loaded yet")]
    AssetsNotReady(EntityHandle),

    /// The entity has no model
    #[error("no model for {0}")]
    NoModel(EntityHandle),

    /// The shader expects a uniform nobody provides
    #[error("shader {shader} expects uniform {uniform} which the model does not provide")]
    MissingUniform {
        /// Shader asset name
        shader: String,
        /// Uniform name
        uniform: String,
    },

    /// A texture is bound to a sampler the shader does not declare
    #[error("shader {shader} has no sampler named {sampler}")]
    UnknownSampler {
        /// Shader asset name
        shader: String,
        /// Sampler name given by the model
        sampler: String,
    },

    /// Too many instances for one draw
    #[error("{count} instances exceeds the limit of {max}")]
    InstanceLimit {
        /// Requested instance count
        count: u32,
        /// Configured limit
        max: u32,
    },
}

impl PacketError {
    /// True for mistakes in application setup, as opposed to conditions a
    /// frame can skip quietly: assets still loading, no model, or uniform
    /// data the model has not supplied yet
    pub fn is_developer_error(&self) -> bool {
        !matches!(
            self,
            PacketError::AssetsNotReady(_) | PacketError::NoModel(_) | PacketError::MissingUniform { .. }
        )
    }
}

/// Provides drawable data for entities
pub trait ModelSource {
    /// True once every asset the entity's model needs is loaded
    fn is_render_ready(&self, handle: EntityHandle) -> bool;

    /// Fill `packet` with the entity's draw data. The packet's tag is already
    /// set; the bucket is computed afterwards from the draw type and shader.
    fn fill_packet(
        &self,
        packet: &mut RenderPacket,
        snapshot: &TransformSnapshot,
        camera: &dyn Camera,
    ) -> Result<(), PacketError>;
}
