//! Scenes: a subtree root drawn by one camera into one render pass

use super::culling::Culler;
use crate::ecs::EntityHandle;
use crate::render::{Camera, RenderPass};
use thiserror::Error;

/// Scene registration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Only one scene per pass may exist
    #[error("a scene for the {0:?} pass already exists")]
    DuplicatePass(RenderPass),

    /// The root handle is not a live scene graph node
    #[error("scene root {0} is not a live entity")]
    InvalidRoot(EntityHandle),
}

/// One scene graph subtree bound to a camera and a pass
#[derive(Debug)]
pub struct Scene {
    /// Root of the subtree drawn by this scene
    pub root: EntityHandle,
    /// Pass the scene draws into
    pub pass: RenderPass,
    /// Viewpoint for the pass
    pub camera: Box<dyn Camera>,
    /// Optional culler, consulted for every pass
    pub culler: Option<Box<dyn Culler>>,
}

impl Scene {
    /// Create a scene with no culler
    pub fn new(root: EntityHandle, pass: RenderPass, camera: impl Camera + 'static) -> Self {
        Self {
            root,
            pass,
            camera: Box::new(camera),
            culler: None,
        }
    }

    /// Swap in a different camera
    pub fn set_camera(&mut self, camera: impl Camera + 'static) {
        self.camera = Box::new(camera);
    }

    /// Builder-style culler setter
    pub fn with_culler(mut self, culler: Option<Box<dyn Culler>>) -> Self {
        self.culler = culler;
        self
    }
}

/// The active scenes, at most one per pass, kept in pass order
#[derive(Debug, Default)]
pub struct SceneSet {
    scenes: Vec<Scene>,
}

impl SceneSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene. Fails if its pass is already taken.
    pub fn insert(&mut self, scene: Scene) -> Result<(), SceneError> {
        if self.get(scene.pass).is_some() {
            return Err(SceneError::DuplicatePass(scene.pass));
        }
        let position = self
            .scenes
            .iter()
            .position(|existing| existing.pass > scene.pass)
            .unwrap_or(self.scenes.len());
        self.scenes.insert(position, scene);
        Ok(())
    }

    /// Scene drawing into `pass`
    pub fn get(&self, pass: RenderPass) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.pass == pass)
    }

    /// Mutable scene drawing into `pass`
    pub fn get_mut(&mut self, pass: RenderPass) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|scene| scene.pass == pass)
    }

    /// Remove the scene rooted at `root`
    pub fn remove_root(&mut self, root: EntityHandle) -> Option<Scene> {
        let position = self.scenes.iter().position(|scene| scene.root == root)?;
        Some(self.scenes.remove(position))
    }

    /// Scenes in pass order
    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    /// Scene roots in pass order
    pub fn roots(&self) -> Vec<EntityHandle> {
        self.scenes.iter().map(|scene| scene.root).collect()
    }

    /// Number of scenes
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// True when there are no scenes
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}
