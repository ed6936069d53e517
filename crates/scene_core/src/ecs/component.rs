//! Component manager contract

use super::EntityHandle;

/// Owner of per-entity data keyed by handle.
///
/// When the scene graph disposes an entity, every registered manager is told
/// about the entity and all of its removed descendants so it can drop data it
/// holds for them.
pub trait ComponentManager {
    /// Release everything stored for `handles`. Unknown handles are ignored.
    fn on_entities_disposed(&mut self, handles: &[EntityHandle]);
}
