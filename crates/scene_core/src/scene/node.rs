//! Per-entity records stored densely by the scene graph

use crate::ecs::EntityHandle;
use crate::foundation::math::{Mat4, Transform};

/// World-space result of transform propagation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    /// Decomposed world position, rotation and scale
    pub transform: Transform,

    /// Composed world matrix
    pub matrix: Mat4,
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            matrix: Mat4::identity(),
        }
    }
}

impl WorldTransform {
    /// World transform of a node with no parent
    pub fn from_local(local: &Transform) -> Self {
        let matrix = local.to_matrix();
        Self {
            transform: Transform::from_matrix(&matrix),
            matrix,
        }
    }

    /// World transform of a node below `parent`
    pub fn from_parent(parent: &WorldTransform, local: &Transform) -> Self {
        let matrix = parent.matrix * local.to_matrix();
        Self {
            transform: Transform::from_matrix(&matrix),
            matrix,
        }
    }
}

/// Spatial state for one entity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransformNode {
    /// Transform relative to the parent
    pub local: Transform,

    /// Local transform as of the last tick boundary
    pub prev: Transform,

    /// Cached result of propagation
    pub world: WorldTransform,

    /// False once `local` has changed since the last tick boundary
    pub stable: bool,
}

impl TransformNode {
    pub(crate) fn new() -> Self {
        Self {
            stable: true,
            ..Default::default()
        }
    }
}

/// Topology for one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneGraphNode {
    /// Parent handle, [`EntityHandle::INVALID`] for roots
    pub parent: EntityHandle,

    /// Children in insertion order
    pub children: Vec<EntityHandle>,

    /// Culled nodes and everything below them are skipped by traversal
    pub culled: bool,
}
