//! # Cameras
//!
//! The frame assembler only needs a handful of things from a camera: the two
//! pass matrices, where the camera is, and which way it looks. Those are the
//! [`Camera`] trait. [`PovCamera`] is the point-of-view camera scenes use by
//! default.
//!
//! ## Conventions
//! Right-handed, Y-up. An unrotated camera looks down -Z. Projection matrices
//! map depth to `[0, 1]`.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Quat, Vec3};

/// Camera data consumed by culling and frame assembly
pub trait Camera: std::fmt::Debug {
    /// Projection matrix for the pass
    fn projection_matrix(&self) -> Mat4;

    /// World-to-view matrix for the pass
    fn view_matrix(&self) -> Mat4;

    /// Camera location in world space
    fn world_position(&self) -> Vec3;

    /// Unit vector the camera is facing, in world space
    fn look_direction(&self) -> Vec3;

    /// Squared distance from the camera to a world-space point.
    ///
    /// Sorting and radius tests compare squared values, which avoids a
    /// square root per entity.
    fn distance_squared_to(&self, point: &Vec3) -> f32 {
        (point - self.world_position()).norm_squared()
    }

    /// Distance from the camera to a world-space point
    fn distance_to(&self, point: &Vec3) -> f32 {
        self.distance_squared_to(point).sqrt()
    }

    /// Viewport changed size. Fixed cameras ignore it.
    fn resize(&mut self, _width: u32, _height: u32) {}
}

/// Projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection for 3D passes
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        /// Viewport width / height
        aspect: f32,
        /// Near clip distance
        near: f32,
        /// Far clip distance
        far: f32,
    },
    /// Orthographic projection for 2D overlay passes
    Orthographic {
        /// Left clip plane
        left: f32,
        /// Right clip plane
        right: f32,
        /// Bottom clip plane
        bottom: f32,
        /// Top clip plane
        top: f32,
        /// Near clip distance
        near: f32,
        /// Far clip distance
        far: f32,
    },
}

impl Projection {
    /// Build the projection matrix
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y, aspect, near, far } => {
                Mat4::perspective(fov_y, aspect, near, far)
            }
            Projection::Orthographic { left, right, bottom, top, near, far } => {
                Mat4::orthographic(left, right, bottom, top, near, far)
            }
        }
    }
}

/// Point-of-view camera: a location, an orientation and a projection
///
/// # Example
/// ```rust
/// use scene_core::foundation::math::Vec3;
/// use scene_core::render::{Camera, PovCamera};
///
/// let mut camera = PovCamera::perspective(60.0, 16.0 / 9.0, 0.1, 500.0);
/// camera.set_position(Vec3::new(0.0, 0.0, 10.0));
/// camera.spin(0.0, 90.0, 0.0);
///
/// assert!((camera.look_direction() - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PovCamera {
    /// Camera position in world space
    pub position: Vec3,

    /// Camera orientation
    pub rotation: Quat,

    /// Projection parameters
    pub projection: Projection,
}

impl Default for PovCamera {
    fn default() -> Self {
        Self::perspective(60.0, 1.0, 0.1, 1000.0)
    }
}

impl PovCamera {
    /// Create a perspective camera at the origin looking down -Z
    ///
    /// # Arguments
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Viewport width / height
    /// * `near` - Near clip distance (must be > 0)
    /// * `far` - Far clip distance (must be > near)
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            projection: Projection::Perspective {
                fov_y: utils::deg_to_rad(fov_degrees),
                aspect,
                near,
                far,
            },
        }
    }

    /// Create an orthographic camera covering `width` by `height` units from
    /// the origin, as used by 2D overlays in screen coordinates
    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            projection: Projection::Orthographic {
                left: 0.0,
                right: width,
                bottom: 0.0,
                top: height,
                near,
                far,
            },
        }
    }

    /// Builder-style position setter
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Move the camera to a new location
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Move relative to the current orientation. Negative `dz` moves forward.
    pub fn move_by(&mut self, dx: f32, dy: f32, dz: f32) {
        self.position += self.rotation * Vec3::new(dx, dy, dz);
    }

    /// Rotate by the given degrees about the world X, Y and Z axes in turn
    pub fn spin(&mut self, x: f32, y: f32, z: f32) {
        let pitch = Quat::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(x));
        let yaw = Quat::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(y));
        let roll = Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(z));
        self.rotation = roll * yaw * pitch * self.rotation;
    }
}

impl Camera for PovCamera {
    fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    fn view_matrix(&self) -> Mat4 {
        self.rotation.inverse().to_homogeneous() * Mat4::new_translation(&-self.position)
    }

    fn world_position(&self) -> Vec3 {
        self.position
    }

    fn look_direction(&self) -> Vec3 {
        self.rotation * Vec3::new(0.0, 0.0, -1.0)
    }

    /// Update the perspective aspect ratio after a viewport resize.
    /// Orthographic cameras are resized to the new extent instead.
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        match &mut self.projection {
            Projection::Perspective { aspect, .. } => {
                *aspect = width as f32 / height as f32;
            }
            Projection::Orthographic { left, right, bottom, top, .. } => {
                *left = 0.0;
                *right = width as f32;
                *bottom = 0.0;
                *top = height as f32;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_distance_squared() {
        let camera = PovCamera::default().with_position(Vec3::new(1.0, 0.0, 0.0));

        assert_relative_eq!(camera.distance_squared_to(&Vec3::new(4.0, 4.0, 0.0)), 25.0);
        assert_relative_eq!(camera.distance_to(&Vec3::new(4.0, 4.0, 0.0)), 5.0);
    }

    #[test]
    fn test_view_matrix_moves_camera_to_origin() {
        let mut camera = PovCamera::default().with_position(Vec3::new(3.0, 2.0, 1.0));
        camera.spin(30.0, 45.0, 0.0);

        let view = camera.view_matrix();
        let eye = view.transform_point(&Point3::from(camera.position));
        assert_relative_eq!(eye.coords, Vec3::zeros(), epsilon = 1e-5);

        let ahead = camera.position + camera.look_direction() * 5.0;
        let in_view = view.transform_point(&Point3::from(ahead));
        assert_relative_eq!(in_view.coords, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-4);
    }

    #[test]
    fn test_move_by_uses_orientation() {
        let mut camera = PovCamera::default();
        camera.spin(0.0, -90.0, 0.0);
        camera.move_by(0.0, 0.0, -2.0);

        assert_relative_eq!(camera.position, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut camera = PovCamera::perspective(60.0, 1.0, 0.1, 100.0);
        camera.resize(1600, 800);

        match camera.projection {
            Projection::Perspective { aspect, .. } => assert_relative_eq!(aspect, 2.0),
            Projection::Orthographic { .. } => panic!("projection kind changed"),
        }
    }
}
