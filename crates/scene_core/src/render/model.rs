//! # Models
//!
//! A model ties an entity to a shader, a mesh and optional textures, plus a
//! few per-draw values. [`ModelSpec`] describes a model and is checked when
//! it is built. [`ModelRegistry`] stores specs by entity, tracks loaded
//! assets and fills render packets for frame assembly.
//!
//! ## Standard uniforms
//!
//! Shaders list the per-draw uniforms they read. These names are filled from
//! the entity's world transform and the pass camera:
//!
//! | name    | contents                                   |
//! |---------|--------------------------------------------|
//! | `model` | world matrix, column-major `[f32; 16]`     |
//! | `mvp`   | projection * view * world                  |
//! | `scale` | world scale `[f32; 3]`                     |
//! | `alpha` | model alpha `[f32; 1]`                     |
//!
//! Any other name must be supplied by the model with
//! [`ModelSpecBuilder::uniform`].

use super::assets::{AssetCatalog, AssetKind, AssetSlot, LoadedAsset};
use super::bucket::DrawType;
use super::camera::Camera;
use super::packet::{InstanceData, RenderPacket};
use super::source::{ModelSource, PacketError, TransformSnapshot};
use crate::ecs::{ComponentManager, EntityHandle};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// World matrix uniform
pub const UNIFORM_MODEL: &str = "model";
/// Model-view-projection uniform
pub const UNIFORM_MVP: &str = "mvp";
/// World scale uniform
pub const UNIFORM_SCALE: &str = "scale";
/// Alpha uniform
pub const UNIFORM_ALPHA: &str = "alpha";

/// Invalid model descriptions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A required asset kind has no slot
    #[error("model needs exactly one {0}, found none")]
    Missing(AssetKind),

    /// A single-use asset kind has more than one slot
    #[error("model needs exactly one {0}, found several")]
    Duplicate(AssetKind),

    /// A slot has no asset name
    #[error("{0} slot has an empty asset name")]
    EmptyName(AssetKind),

    /// A texture slot names no sampler
    #[error("texture {0} is not bound to a sampler")]
    Unbound(String),

    /// Two textures share a sampler
    #[error("sampler {0} is bound more than once")]
    DuplicateBinding(String),
}

/// Validated description of a model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    shader: AssetSlot,
    mesh: AssetSlot,
    textures: Vec<AssetSlot>,
    uniforms: HashMap<String, Vec<f32>>,
    alpha: f32,
    sky: bool,
}

impl ModelSpec {
    /// Start describing a model drawn with `shader` and `mesh`
    pub fn builder(shader: impl Into<String>, mesh: impl Into<String>) -> ModelSpecBuilder {
        ModelSpecBuilder {
            slots: vec![AssetSlot::shader(shader), AssetSlot::mesh(mesh)],
            uniforms: HashMap::new(),
            alpha: 1.0,
            sky: false,
        }
    }

    /// Build a model from raw slots: exactly one shader, exactly one mesh,
    /// and textures each bound to a distinct sampler.
    pub fn from_slots(slots: Vec<AssetSlot>) -> Result<Self, ModelError> {
        let mut shader = None;
        let mut mesh = None;
        let mut textures = Vec::new();
        let mut bindings = HashSet::new();

        for slot in slots {
            if slot.name.is_empty() {
                return Err(ModelError::EmptyName(slot.kind));
            }
            match slot.kind {
                AssetKind::Shader => {
                    if shader.replace(slot).is_some() {
                        return Err(ModelError::Duplicate(AssetKind::Shader));
                    }
                }
                AssetKind::Mesh => {
                    if mesh.replace(slot).is_some() {
                        return Err(ModelError::Duplicate(AssetKind::Mesh));
                    }
                }
                AssetKind::Texture => {
                    if slot.binding.is_empty() {
                        return Err(ModelError::Unbound(slot.name));
                    }
                    if !bindings.insert(slot.binding.clone()) {
                        return Err(ModelError::DuplicateBinding(slot.binding));
                    }
                    textures.push(slot);
                }
            }
        }

        Ok(Self {
            shader: shader.ok_or(ModelError::Missing(AssetKind::Shader))?,
            mesh: mesh.ok_or(ModelError::Missing(AssetKind::Mesh))?,
            textures,
            uniforms: HashMap::new(),
            alpha: 1.0,
            sky: false,
        })
    }

    /// Shader asset name
    pub fn shader(&self) -> &str {
        &self.shader.name
    }

    /// Mesh asset name
    pub fn mesh(&self) -> &str {
        &self.mesh.name
    }

    /// Texture slots
    pub fn textures(&self) -> &[AssetSlot] {
        &self.textures
    }

    /// Opacity; below 1 draws as transparent
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// True for sky backgrounds
    pub fn is_sky(&self) -> bool {
        self.sky
    }

    /// Every slot the model uses
    pub fn slots(&self) -> impl Iterator<Item = &AssetSlot> {
        [&self.shader, &self.mesh].into_iter().chain(self.textures.iter())
    }

    /// Draw type implied by the sky flag and alpha
    pub fn draw_type(&self) -> DrawType {
        if self.sky {
            DrawType::Sky
        } else if self.alpha < 1.0 {
            DrawType::Transparent
        } else {
            DrawType::Opaque
        }
    }
}

/// Builder for [`ModelSpec`]
#[derive(Debug, Clone)]
pub struct ModelSpecBuilder {
    slots: Vec<AssetSlot>,
    uniforms: HashMap<String, Vec<f32>>,
    alpha: f32,
    sky: bool,
}

impl ModelSpecBuilder {
    /// Bind a texture to a shader sampler
    pub fn texture(mut self, sampler: impl Into<String>, name: impl Into<String>) -> Self {
        self.slots.push(AssetSlot::texture(sampler, name));
        self
    }

    /// Provide a custom uniform value
    pub fn uniform(mut self, name: impl Into<String>, values: Vec<f32>) -> Self {
        self.uniforms.insert(name.into(), values);
        self
    }

    /// Set opacity, clamped to `[0, 1]`
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Draw as a sky background
    pub fn sky(mut self) -> Self {
        self.sky = true;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<ModelSpec, ModelError> {
        let mut spec = ModelSpec::from_slots(self.slots)?;
        spec.uniforms = self.uniforms;
        spec.alpha = self.alpha;
        spec.sky = self.sky;
        Ok(spec)
    }
}

#[derive(Debug, Clone)]
struct Model {
    spec: ModelSpec,
    instance: Option<InstanceData>,
}

/// Models by entity, plus the catalog of loaded assets they draw with
#[derive(Debug)]
pub struct ModelRegistry {
    catalog: AssetCatalog,
    models: HashMap<EntityHandle, Model>,
    max_instances: u32,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl ModelRegistry {
    /// Create an empty registry allowing up to `max_instances` per draw
    pub fn new(max_instances: u32) -> Self {
        Self {
            catalog: AssetCatalog::new(),
            models: HashMap::new(),
            max_instances,
        }
    }

    /// Attach or replace the model on an entity
    pub fn insert(&mut self, handle: EntityHandle, spec: ModelSpec) {
        if let Some(missing) = spec.slots().find(|slot| !self.catalog.is_loaded(slot)) {
            log::debug!("Model for {handle} waiting on {} {}", missing.kind, missing.name);
        }
        self.models.insert(handle, Model { spec, instance: None });
    }

    /// Detach the model from an entity
    pub fn remove(&mut self, handle: EntityHandle) -> Option<ModelSpec> {
        self.models.remove(&handle).map(|model| model.spec)
    }

    /// The model attached to an entity
    pub fn get(&self, handle: EntityHandle) -> Option<&ModelSpec> {
        self.models.get(&handle).map(|model| &model.spec)
    }

    /// Change a model's opacity. Alpha below 1 switches it to transparent.
    pub fn set_alpha(&mut self, handle: EntityHandle, alpha: f32) {
        match self.models.get_mut(&handle) {
            Some(model) => model.spec.alpha = alpha.clamp(0.0, 1.0),
            None => log::warn!("set_alpha: no model for {handle}"),
        }
    }

    /// Draw a model instanced, or `None` for a single draw
    pub fn set_instances(&mut self, handle: EntityHandle, instance: Option<InstanceData>) {
        match self.models.get_mut(&handle) {
            Some(model) => model.instance = instance,
            None => log::warn!("set_instances: no model for {handle}"),
        }
    }

    /// Record a finished asset load
    pub fn import(&mut self, asset: LoadedAsset) {
        self.catalog.insert(asset);
    }

    /// Number of models stored
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True when no models are stored
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelSource for ModelRegistry {
    fn is_render_ready(&self, handle: EntityHandle) -> bool {
        self.models
            .get(&handle)
            .is_some_and(|model| model.spec.slots().all(|slot| self.catalog.is_loaded(slot)))
    }

    fn fill_packet(
        &self,
        packet: &mut RenderPacket,
        snapshot: &TransformSnapshot,
        camera: &dyn Camera,
    ) -> Result<(), PacketError> {
        let handle = snapshot.handle;
        let model = self.models.get(&handle).ok_or(PacketError::NoModel(handle))?;
        let spec = &model.spec;
        let shader = self
            .catalog
            .shader(spec.shader())
            .ok_or(PacketError::AssetsNotReady(handle))?;
        let mesh = self
            .catalog
            .mesh(spec.mesh())
            .ok_or(PacketError::AssetsNotReady(handle))?;

        packet.shader_id = shader.id;
        packet.mesh_id = mesh;
        packet.draw_type = spec.draw_type();

        packet.texture_ids.resize(shader.samplers.len(), 0);
        for slot in spec.textures() {
            let unit = shader
                .samplers
                .iter()
                .position(|sampler| *sampler == slot.binding)
                .ok_or_else(|| PacketError::UnknownSampler {
                    shader: spec.shader().to_string(),
                    sampler: slot.binding.clone(),
                })?;
            packet.texture_ids[unit] = self
                .catalog
                .texture(&slot.name)
                .ok_or(PacketError::AssetsNotReady(handle))?;
        }

        if let Some(instance) = model.instance {
            if instance.count > self.max_instances {
                return Err(PacketError::InstanceLimit {
                    count: instance.count,
                    max: self.max_instances,
                });
            }
            packet.instance = Some(instance);
        }

        let world = &snapshot.world;
        for uniform in &shader.uniforms {
            match uniform.as_str() {
                UNIFORM_MODEL => packet.set_uniform(uniform, world.matrix.as_slice()),
                UNIFORM_MVP => {
                    let mvp = camera.projection_matrix() * camera.view_matrix() * world.matrix;
                    packet.set_uniform(uniform, mvp.as_slice());
                }
                UNIFORM_SCALE => packet.set_uniform(uniform, world.transform.scale.as_slice()),
                UNIFORM_ALPHA => packet.set_uniform(uniform, &[spec.alpha()]),
                custom => {
                    let values = spec.uniforms.get(custom).ok_or_else(|| {
                        PacketError::MissingUniform {
                            shader: spec.shader().to_string(),
                            uniform: custom.to_string(),
                        }
                    })?;
                    packet.set_uniform(custom, values);
                }
            }
        }
        Ok(())
    }
}

impl ComponentManager for ModelRegistry {
    fn on_entities_disposed(&mut self, handles: &[EntityHandle]) {
        for handle in handles {
            self.models.remove(handle);
        }
    }
}
