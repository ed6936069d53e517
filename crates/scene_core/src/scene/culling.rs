//! Distance-based culling
//!
//! A culler is a pure predicate over a camera and a world-space point. A
//! scene may carry one; the frame assembler consults it for every 3D node
//! that has something to draw.

use crate::core::config::CullerConfig;
use crate::foundation::math::Vec3;
use crate::render::Camera;

/// How far back along the look direction [`FrontCuller`] shifts a point,
/// as a fraction of its radius.
const FRONT_SHIFT: f32 = 0.8;

/// Decides whether a point should be left out of a frame
pub trait Culler: std::fmt::Debug {
    /// True if the point at (x, y, z) should not be drawn
    fn culled(&self, camera: &dyn Camera, x: f32, y: f32, z: f32) -> bool;
}

/// Keeps points in a sphere pushed out in front of the camera.
///
/// The point is moved back along the look direction before the radius test,
/// so the kept region extends further ahead of the camera than behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontCuller {
    radius: f32,
}

impl FrontCuller {
    /// Create a front culler. Negative radii are treated as zero.
    pub fn new(radius: f32) -> Self {
        Self { radius: radius.max(0.0) }
    }

    /// Keep radius
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Culler for FrontCuller {
    fn culled(&self, camera: &dyn Camera, x: f32, y: f32, z: f32) -> bool {
        let shifted = Vec3::new(x, y, z) - camera.look_direction() * (self.radius * FRONT_SHIFT);
        camera.distance_squared_to(&shifted) > self.radius * self.radius
    }
}

/// Keeps points within a fixed distance of the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusCuller {
    radius: f32,
}

impl RadiusCuller {
    /// Create a radius culler. Negative radii are treated as zero.
    pub fn new(radius: f32) -> Self {
        Self { radius: radius.max(0.0) }
    }

    /// Keep radius
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Culler for RadiusCuller {
    fn culled(&self, camera: &dyn Camera, x: f32, y: f32, z: f32) -> bool {
        camera.distance_squared_to(&Vec3::new(x, y, z)) > self.radius * self.radius
    }
}

/// Build the culler a configuration asks for
pub fn culler_from_config(config: &CullerConfig) -> Option<Box<dyn Culler>> {
    match *config {
        CullerConfig::None => None,
        CullerConfig::Front { radius } => Some(Box::new(FrontCuller::new(radius))),
        CullerConfig::Radius { radius } => Some(Box::new(RadiusCuller::new(radius))),
    }
}
