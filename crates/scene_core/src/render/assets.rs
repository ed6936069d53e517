//! GPU asset bookkeeping
//!
//! Loading and binding happen elsewhere. Loaders report finished assets as
//! [`LoadedAsset`] values over a channel; the engine drains them into an
//! [`AssetCatalog`] between ticks. Models refer to assets by name through
//! typed [`AssetSlot`]s.

use std::collections::HashMap;
use std::fmt;

/// What kind of asset a slot refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Shader program
    Shader,
    /// Vertex/index data
    Mesh,
    /// Sampled image
    Texture,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Shader => "shader",
            AssetKind::Mesh => "mesh",
            AssetKind::Texture => "texture",
        };
        f.write_str(name)
    }
}

/// A named asset used by a model. Textures bind to a shader sampler by name;
/// shaders and meshes leave `binding` empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSlot {
    /// Asset kind
    pub kind: AssetKind,
    /// Sampler name for textures
    pub binding: String,
    /// Asset name, such as `"textures/rock"`
    pub name: String,
}

impl AssetSlot {
    /// Shader slot
    pub fn shader(name: impl Into<String>) -> Self {
        Self { kind: AssetKind::Shader, binding: String::new(), name: name.into() }
    }

    /// Mesh slot
    pub fn mesh(name: impl Into<String>) -> Self {
        Self { kind: AssetKind::Mesh, binding: String::new(), name: name.into() }
    }

    /// Texture slot bound to a shader sampler
    pub fn texture(binding: impl Into<String>, name: impl Into<String>) -> Self {
        Self { kind: AssetKind::Texture, binding: binding.into(), name: name.into() }
    }
}

/// A finished asset load, as reported by a loader
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedAsset {
    /// Shader program bound on the GPU
    Shader {
        /// Asset name
        name: String,
        /// GPU program id
        id: u16,
        /// Sampler names in binding order
        samplers: Vec<String>,
        /// Uniform names the program reads per draw
        uniforms: Vec<String>,
    },
    /// Mesh uploaded to the GPU
    Mesh {
        /// Asset name
        name: String,
        /// GPU mesh id
        id: u32,
    },
    /// Texture uploaded to the GPU
    Texture {
        /// Asset name
        name: String,
        /// GPU texture id
        id: u32,
    },
}

/// Loaded shader program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInfo {
    /// GPU program id
    pub id: u16,
    /// Sampler names in binding order
    pub samplers: Vec<String>,
    /// Uniform names the program reads per draw
    pub uniforms: Vec<String>,
}

/// Loaded assets by name
#[derive(Debug, Default)]
pub struct AssetCatalog {
    shaders: HashMap<String, ShaderInfo>,
    meshes: HashMap<String, u32>,
    textures: HashMap<String, u32>,
}

impl AssetCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished load. Reloading an asset replaces the old entry.
    pub fn insert(&mut self, asset: LoadedAsset) {
        match asset {
            LoadedAsset::Shader { name, id, samplers, uniforms } => {
                log::debug!("Imported shader {name} as program {id}");
                self.shaders.insert(name, ShaderInfo { id, samplers, uniforms });
            }
            LoadedAsset::Mesh { name, id } => {
                log::debug!("Imported mesh {name} as {id}");
                self.meshes.insert(name, id);
            }
            LoadedAsset::Texture { name, id } => {
                log::debug!("Imported texture {name} as {id}");
                self.textures.insert(name, id);
            }
        }
    }

    /// Shader by name
    pub fn shader(&self, name: &str) -> Option<&ShaderInfo> {
        self.shaders.get(name)
    }

    /// Mesh id by name
    pub fn mesh(&self, name: &str) -> Option<u32> {
        self.meshes.get(name).copied()
    }

    /// Texture id by name
    pub fn texture(&self, name: &str) -> Option<u32> {
        self.textures.get(name).copied()
    }

    /// True if the asset a slot names is loaded
    pub fn is_loaded(&self, slot: &AssetSlot) -> bool {
        match slot.kind {
            AssetKind::Shader => self.shaders.contains_key(&slot.name),
            AssetKind::Mesh => self.meshes.contains_key(&slot.name),
            AssetKind::Texture => self.textures.contains_key(&slot.name),
        }
    }
}
