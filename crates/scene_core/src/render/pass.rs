//! Render passes and their per-pass uniform data

use crate::foundation::math::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Render pass a scene draws into. Passes submit in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RenderPass {
    /// Perspective 3D world pass
    ThreeD = 0,
    /// Orthographic 2D overlay pass
    TwoD = 1,
}

impl RenderPass {
    /// Every pass in submission order
    pub const ALL: [RenderPass; 2] = [RenderPass::ThreeD, RenderPass::TwoD];

    /// Numeric pass id, lower submits first
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// True for passes that sort and cull by camera distance
    pub const fn uses_depth(self) -> bool {
        matches!(self, RenderPass::ThreeD)
    }
}

/// A light as handed to a pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassLight {
    /// World position of the light
    pub position: Vec3,
    /// Linear RGB color
    pub color: Vec3,
    /// Brightness multiplier
    pub intensity: f32,
}

/// Uniform data shared by every packet in a pass
#[derive(Debug, Clone, PartialEq)]
pub struct PassData {
    /// Camera projection
    pub projection: Mat4,
    /// World-to-view transform
    pub view: Mat4,
    /// Camera location in world space
    pub camera_position: Vec3,
    /// Scene lights, at most the configured limit
    pub lights: Vec<PassLight>,
}

impl Default for PassData {
    fn default() -> Self {
        Self {
            projection: Mat4::identity(),
            view: Mat4::identity(),
            camera_position: Vec3::zeros(),
            lights: Vec::new(),
        }
    }
}

impl PassData {
    /// Clear per-frame data, keeping allocations
    pub fn reset(&mut self) {
        self.projection = Mat4::identity();
        self.view = Mat4::identity();
        self.camera_position = Vec3::zeros();
        self.lights.clear();
    }
}
