//! # Rendering System
//!
//! Everything between the scene graph and the GPU submission stage: cameras,
//! per-pass data, render packets and their sort keys, the model and light
//! collaborators, and the frame assembler that ties them together.
//!
//! ## Architecture
//!
//! - **Camera**: View and projection for a pass
//! - **Bucket**: 64-bit key that orders packets across passes
//! - **ModelRegistry**: Models by entity, fills packets once assets load
//! - **FrameAssembler**: Builds sorted packet lists per scene

pub mod assets;
pub mod bucket;
pub mod camera;
pub mod frame;
pub mod lighting;
pub mod model;
pub mod packet;
pub mod pass;
pub mod source;

pub use assets::{AssetCatalog, AssetKind, AssetSlot, LoadedAsset, ShaderInfo};
pub use bucket::{Bucket, DrawType};
pub use camera::{Camera, PovCamera, Projection};
pub use frame::{FrameAssembler, FrameSink, FrameStats, PassFrame};
pub use lighting::{Light, LightRegistry, LightSource};
pub use model::{ModelError, ModelRegistry, ModelSpec, ModelSpecBuilder};
pub use packet::{InstanceData, PacketPool, RenderPacket};
pub use pass::{PassData, PassLight, RenderPass};
pub use source::{ModelSource, PacketError, TransformSnapshot};
