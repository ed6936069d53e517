//! Scene management system
//!
//! The transform hierarchy and the scenes that draw parts of it.
//!
//! ## Architecture
//!
//! ```text
//! Application (mutates handles)
//!      ↓
//! SceneGraph (propagates world transforms)
//!      ↓
//! Scene + Culler (per pass)
//!      ↓
//! FrameAssembler (render packets)
//! ```

mod node;
mod scene_graph;
mod culling;
mod scenes;

pub use node::{SceneGraphNode, TransformNode, WorldTransform};
pub use scene_graph::{SceneGraph, Visit};
pub use culling::{culler_from_config, Culler, FrontCuller, RadiusCuller};
pub use scenes::{Scene, SceneError, SceneSet};
