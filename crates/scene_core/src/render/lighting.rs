//! Light components
//!
//! Lights are plain data keyed by entity. The frame assembler picks up
//! lights attached to direct children of a scene root and places them at
//! that child's world position.

use crate::ecs::{ComponentManager, EntityHandle};
use crate::foundation::math::Vec3;
use std::collections::HashMap;

/// Point light data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// RGB color values (0.0 to 1.0 range)
    pub color: Vec3,
    /// Brightness multiplier
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
        }
    }
}

impl Light {
    /// Create a light with the given color and intensity
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self { color, intensity }
    }
}

/// Source of light data for frame assembly
pub trait LightSource {
    /// The light attached to `handle`, if any
    fn light(&self, handle: EntityHandle) -> Option<Light>;
}

/// Stores lights by entity
#[derive(Debug, Default)]
pub struct LightRegistry {
    lights: HashMap<EntityHandle, Light>,
}

impl LightRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach or replace the light on an entity
    pub fn insert(&mut self, handle: EntityHandle, light: Light) {
        self.lights.insert(handle, light);
    }

    /// Detach the light from an entity
    pub fn remove(&mut self, handle: EntityHandle) -> Option<Light> {
        self.lights.remove(&handle)
    }

    /// Mutable access to an entity's light
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut Light> {
        self.lights.get_mut(&handle)
    }

    /// Number of lights stored
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// True when no lights are stored
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}

impl LightSource for LightRegistry {
    fn light(&self, handle: EntityHandle) -> Option<Light> {
        self.lights.get(&handle).copied()
    }
}

impl ComponentManager for LightRegistry {
    fn on_entities_disposed(&mut self, handles: &[EntityHandle]) {
        for handle in handles {
            self.lights.remove(handle);
        }
    }
}
