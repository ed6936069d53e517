//! Entity identity
//!
//! Handles, the allocator that issues them, and the contract for anything
//! that stores data keyed by them.

pub mod entity;
pub mod component;

pub use entity::{EntityAllocator, EntityHandle};
pub use component::ComponentManager;
