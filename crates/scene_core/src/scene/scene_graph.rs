//! Transform hierarchy
//!
//! Every live entity owns a [`TransformNode`] and a [`SceneGraphNode`] held in
//! parallel dense arrays. A sparse table maps handle slots to dense indices.
//! Nodes are appended on creation and compacted in place on removal, so a
//! parent's dense index is always lower than those of its descendants. That
//! ordering is what lets a single forward pass over storage see parents before
//! children.
//!
//! World transforms are recomputed eagerly: every mutation propagates through
//! the affected subtree before returning.

use super::node::{SceneGraphNode, TransformNode, WorldTransform};
use crate::ecs::{EntityAllocator, EntityHandle};
use crate::foundation::math::{utils, Quat, Transform, Vec3};

const NO_INDEX: u32 = u32::MAX;

/// Visitor decision during [`SceneGraph::walk`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the node's children
    Continue,
    /// Do not visit the node's children
    SkipChildren,
}

/// Dense parent/child transform storage
#[derive(Debug, Default)]
pub struct SceneGraph {
    allocator: EntityAllocator,
    handles: Vec<EntityHandle>,
    transforms: Vec<TransformNode>,
    nodes: Vec<SceneGraphNode>,
    index: Vec<u32>,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scene graph using the given handle allocator
    pub fn with_allocator(allocator: EntityAllocator) -> Self {
        Self {
            allocator,
            ..Default::default()
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True when no nodes are stored
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// True if `handle` is live and has storage here
    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.dense(handle).is_some()
    }

    /// Handles in storage order
    pub fn handles(&self) -> &[EntityHandle] {
        &self.handles
    }

    fn dense(&self, handle: EntityHandle) -> Option<usize> {
        if !self.allocator.valid(handle) {
            return None;
        }
        let index = *self.index.get(handle.slot() as usize)?;
        if index == NO_INDEX || self.handles[index as usize] != handle {
            return None;
        }
        Some(index as usize)
    }

    fn dense_or_warn(&self, handle: EntityHandle, operation: &str) -> Option<usize> {
        let index = self.dense(handle);
        if index.is_none() {
            log::warn!("{operation}: invalid entity {handle}");
        }
        index
    }

    /// Create a node below `parent`, or a root when `parent` is
    /// [`EntityHandle::INVALID`]. Returns the invalid handle when the
    /// allocator is exhausted.
    pub fn create(&mut self, parent: EntityHandle) -> EntityHandle {
        let mut parent = parent;
        if !parent.is_null() && self.dense(parent).is_none() {
            log::warn!("create: invalid parent {parent}, node becomes a root");
            parent = EntityHandle::INVALID;
        }

        let handle = self.allocator.create();
        if handle.is_null() {
            return EntityHandle::INVALID;
        }

        let dense = self.handles.len();
        let slot = handle.slot() as usize;
        if self.index.len() <= slot {
            self.index.resize(slot + 1, NO_INDEX);
        }
        self.index[slot] = dense as u32;
        self.handles.push(handle);
        self.transforms.push(TransformNode::new());
        self.nodes.push(SceneGraphNode {
            parent,
            ..Default::default()
        });

        if let Some(parent_index) = self.dense(parent) {
            self.nodes[parent_index].children.push(handle);
            self.propagate(dense);
        }
        handle
    }

    /// Update any of the local position, rotation and scale, then
    /// recompute world transforms for the node and its subtree.
    pub fn set_local_transform(
        &mut self,
        handle: EntityHandle,
        position: Option<Vec3>,
        rotation: Option<Quat>,
        scale: Option<Vec3>,
    ) {
        let Some(index) = self.dense_or_warn(handle, "set_local_transform") else {
            return;
        };
        let node = &mut self.transforms[index];
        if let Some(position) = position {
            node.local.position = position;
        }
        if let Some(rotation) = rotation {
            node.local.rotation = rotation;
        }
        if let Some(scale) = scale {
            node.local.scale = scale;
        }
        node.stable = false;
        self.propagate(index);
    }

    /// Recompute world transforms for the node at `start` and everything
    /// below it, parents before children.
    fn propagate(&mut self, start: usize) {
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            let parent = self.nodes[index].parent;
            let world = if parent.is_null() {
                WorldTransform::from_local(&self.transforms[index].local)
            } else if let Some(parent_index) = self.dense(parent) {
                WorldTransform::from_parent(
                    &self.transforms[parent_index].world,
                    &self.transforms[index].local,
                )
            } else {
                log::error!(
                    "Scene graph corrupt: {} has missing parent {parent}, skipping subtree",
                    self.handles[index]
                );
                continue;
            };
            self.transforms[index].world = world;

            for child in self.nodes[index].children.iter().rev() {
                match self.dense(*child) {
                    Some(child_index) => stack.push(child_index),
                    None => log::error!(
                        "Scene graph corrupt: {} lists missing child {child}",
                        self.handles[index]
                    ),
                }
            }
        }
    }

    /// Handles of the node at `root_index` and all its descendants, pre-order
    fn subtree(&self, root_index: usize) -> Vec<usize> {
        let mut found = Vec::new();
        let mut stack = vec![root_index];
        while let Some(index) = stack.pop() {
            found.push(index);
            for child in self.nodes[index].children.iter().rev() {
                match self.dense(*child) {
                    Some(child_index) => stack.push(child_index),
                    None => log::error!(
                        "Scene graph corrupt: {} lists missing child {child}",
                        self.handles[index]
                    ),
                }
            }
        }
        found
    }

    /// Remove a node and its whole subtree. Returns every removed descendant
    /// once, not including `handle` itself, so other component managers can
    /// release their data.
    pub fn dispose(&mut self, handle: EntityHandle) -> Vec<EntityHandle> {
        let Some(index) = self.dense_or_warn(handle, "dispose") else {
            return Vec::new();
        };

        let parent = self.nodes[index].parent;
        if let Some(parent_index) = self.dense(parent) {
            self.nodes[parent_index].children.retain(|child| *child != handle);
        }

        let doomed = self.subtree(index);
        let mut removed = vec![false; self.handles.len()];
        for &dead in &doomed {
            removed[dead] = true;
        }
        let descendants: Vec<EntityHandle> =
            doomed.iter().skip(1).map(|&dead| self.handles[dead]).collect();

        // Slide survivors down without reordering them.
        let mut keep = 0;
        for current in 0..self.handles.len() {
            if removed[current] {
                continue;
            }
            if keep != current {
                self.handles.swap(keep, current);
                self.transforms.swap(keep, current);
                self.nodes.swap(keep, current);
            }
            keep += 1;
        }
        self.handles.truncate(keep);
        self.transforms.truncate(keep);
        self.nodes.truncate(keep);

        for dead in std::iter::once(handle).chain(descendants.iter().copied()) {
            self.index[dead.slot() as usize] = NO_INDEX;
            self.allocator.dispose(dead);
        }
        for (dense, live) in self.handles.iter().enumerate() {
            self.index[live.slot() as usize] = dense as u32;
        }

        descendants
    }

    /// Record the current local transform of every changed node as its
    /// previous transform. Returns the handles that changed.
    pub fn set_prev(&mut self) -> Vec<EntityHandle> {
        let mut changed = Vec::new();
        for (node, handle) in self.transforms.iter_mut().zip(&self.handles) {
            if !node.stable {
                node.prev = node.local;
                node.stable = true;
                changed.push(*handle);
            }
        }
        changed
    }

    /// Include or exclude a node (and its subtree) from traversal
    pub fn cull(&mut self, handle: EntityHandle, culled: bool) {
        if let Some(index) = self.dense_or_warn(handle, "cull") {
            self.nodes[index].culled = culled;
        }
    }

    /// True if the node is excluded from traversal
    pub fn is_culled(&self, handle: EntityHandle) -> bool {
        self.dense_or_warn(handle, "is_culled")
            .is_some_and(|index| self.nodes[index].culled)
    }

    /// Parent of a node, [`EntityHandle::INVALID`] for roots
    pub fn parent(&self, handle: EntityHandle) -> EntityHandle {
        self.dense_or_warn(handle, "parent")
            .map_or(EntityHandle::INVALID, |index| self.nodes[index].parent)
    }

    /// Children of a node in insertion order
    pub fn children(&self, handle: EntityHandle) -> &[EntityHandle] {
        match self.dense_or_warn(handle, "children") {
            Some(index) => &self.nodes[index].children,
            None => &[],
        }
    }

    /// Local transform of a node
    pub fn local(&self, handle: EntityHandle) -> Transform {
        self.dense_or_warn(handle, "local")
            .map(|index| self.transforms[index].local)
            .unwrap_or_default()
    }

    /// Local position
    pub fn at(&self, handle: EntityHandle) -> Vec3 {
        self.local(handle).position
    }

    /// Set the local position
    pub fn set_at(&mut self, handle: EntityHandle, position: Vec3) {
        self.set_local_transform(handle, Some(position), None, None);
    }

    /// Local rotation
    pub fn rotation(&self, handle: EntityHandle) -> Quat {
        self.local(handle).rotation
    }

    /// Set the local rotation
    pub fn set_rotation(&mut self, handle: EntityHandle, rotation: Quat) {
        self.set_local_transform(handle, None, Some(rotation), None);
    }

    /// Local per-axis scale
    pub fn scale(&self, handle: EntityHandle) -> Vec3 {
        self.local(handle).scale
    }

    /// Set the local per-axis scale
    pub fn set_scale(&mut self, handle: EntityHandle, scale: Vec3) {
        self.set_local_transform(handle, None, None, Some(scale));
    }

    /// World transform as of the last propagation
    pub fn world(&self, handle: EntityHandle) -> WorldTransform {
        self.dense_or_warn(handle, "world")
            .map(|index| self.transforms[index].world)
            .unwrap_or_default()
    }

    /// Move relative to the node's current orientation
    pub fn move_by(&mut self, handle: EntityHandle, dx: f32, dy: f32, dz: f32) {
        let Some(index) = self.dense_or_warn(handle, "move_by") else {
            return;
        };
        let local = self.transforms[index].local;
        let position = local.position + local.rotation * Vec3::new(dx, dy, dz);
        self.set_local_transform(handle, Some(position), None, None);
    }

    /// Rotate by the given degrees about the X, Y and Z axes, in that order
    pub fn spin(&mut self, handle: EntityHandle, x: f32, y: f32, z: f32) {
        let Some(index) = self.dense_or_warn(handle, "spin") else {
            return;
        };
        let mut rotation = self.transforms[index].local.rotation;
        if x != 0.0 {
            rotation = Quat::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(x)) * rotation;
        }
        if y != 0.0 {
            rotation = Quat::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(y)) * rotation;
        }
        if z != 0.0 {
            rotation = Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(z)) * rotation;
        }
        self.set_local_transform(handle, None, Some(rotation), None);
    }

    /// Local transform blended between the previous tick and now
    pub fn interpolated(&self, handle: EntityHandle, fraction: f32) -> Transform {
        self.dense_or_warn(handle, "interpolated")
            .map(|index| {
                let node = &self.transforms[index];
                node.prev.interpolate(&node.local, fraction.clamp(0.0, 1.0))
            })
            .unwrap_or_default()
    }

    /// Pre-order traversal from `root`, never entering culled nodes.
    ///
    /// The visitor sees each handle with its world transform and may prune
    /// the subtree below it.
    pub fn walk<F>(&self, root: EntityHandle, mut visitor: F)
    where
        F: FnMut(EntityHandle, &WorldTransform) -> Visit,
    {
        let Some(root_index) = self.dense_or_warn(root, "walk") else {
            return;
        };
        let mut stack = vec![root_index];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.culled {
                continue;
            }
            let handle = self.handles[index];
            if visitor(handle, &self.transforms[index].world) == Visit::SkipChildren {
                continue;
            }
            for child in node.children.iter().rev() {
                match self.dense(*child) {
                    Some(child_index) => stack.push(child_index),
                    None => log::error!(
                        "Scene graph corrupt: {handle} lists missing child {child}, skipping subtree"
                    ),
                }
            }
        }
    }

    /// Check that every parent is stored before its children
    pub fn is_topologically_ordered(&self) -> bool {
        self.nodes.iter().enumerate().all(|(index, node)| {
            node.parent.is_null() || self.dense(node.parent).is_some_and(|parent| parent < index)
        })
    }

    /// Drop every node and forget every handle
    pub fn clear(&mut self) {
        self.allocator.reset();
        self.handles.clear();
        self.transforms.clear();
        self.nodes.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, Unit};
    use approx::assert_relative_eq;

    #[test]
    fn test_create_root_and_child() {
        let mut graph = SceneGraph::new();
        let root = graph.create(EntityHandle::INVALID);
        let child = graph.create(root);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.parent(child), root);
        assert_eq!(graph.children(root), &[child]);
        assert!(graph.parent(root).is_null());
    }

    #[test]
    fn test_create_with_invalid_parent_makes_root() {
        let mut graph = SceneGraph::new();
        let orphan = graph.create(EntityHandle::from_raw(42));

        assert!(graph.contains(orphan));
        assert!(graph.parent(orphan).is_null());
    }

    #[test]
    fn test_create_returns_invalid_when_exhausted() {
        let allocator = EntityAllocator::new().with_capacity_limit(1);
        let mut graph = SceneGraph::with_allocator(allocator);
        let only = graph.create(EntityHandle::INVALID);
        let extra = graph.create(only);

        assert!(extra.is_null());
        assert_eq!(graph.len(), 1);
        assert!(graph.children(only).is_empty());
    }

    #[test]
    fn test_world_position_propagates_through_hierarchy() {
        let mut graph = SceneGraph::new();
        let root = graph.create(EntityHandle::INVALID);
        let child = graph.create(root);
        let grandchild = graph.create(child);

        graph.set_at(root, Vec3::new(5.0, 0.0, 0.0));
        graph.set_at(child, Vec3::new(0.0, 5.0, 0.0));

        assert_relative_eq!(
            graph.world(grandchild).transform.position,
            Vec3::new(5.0, 5.0, 0.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_child_created_after_move_inherits_parent() {
        let mut graph = SceneGraph::new();
        let root = graph.create(EntityHandle::INVALID);
        graph.set_at(root, Vec3::new(1.0, 2.0, 3.0));
        let child = graph.create(root);

        assert_relative_eq!(
            graph.world(child).transform.position,
            Vec3::new(1.0, 2.0, 3.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_parent_rotation_and_scale_apply_to_child() {
        let mut graph = SceneGraph::new();
        let root = graph.create(EntityHandle::INVALID);
        let child = graph.create(root);

        graph.set_local_transform(
            root,
            None,
            Some(Quat::from_axis_angle(&Vec3::z_axis(), constants::PI / 2.0)),
            Some(Vec3::new(2.0, 2.0, 2.0)),
        );
        graph.set_at(child, Vec3::new(1.0, 0.0, 0.0));

        let world = graph.world(child).transform;
        assert_relative_eq!(world.position, Vec3::new(0.0, 2.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(world.scale, Vec3::new(2.0, 2.0, 2.0), epsilon = 1e-5);
        assert_relative_eq!(world.rotation.angle(), constants::PI / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_non_uniform_parent_scale_is_approximate() {
        // Non-uniform scale above a rotated child introduces skew that the
        // decomposition cannot represent.
        let mut graph = SceneGraph::new();
        let root = graph.create(EntityHandle::INVALID);
        let child = graph.create(root);

        graph.set_scale(root, Vec3::new(2.0, 1.0, 1.0));
        graph.set_rotation(child, Quat::from_axis_angle(&Vec3::z_axis(), constants::PI / 4.0));

        let world = graph.world(child);
        let recomposed = world.transform.to_matrix();
        let difference = (recomposed - world.matrix).abs().max();
        assert!(difference > 0.1, "expected skew loss, got {difference}");
    }

    #[test]
    fn test_root_world_transform_matches_child_of_identity() {
        let mut graph = SceneGraph::new();
        let mirrored_root = graph.create(EntityHandle::INVALID);
        let holder = graph.create(EntityHandle::INVALID);
        let mirrored_child = graph.create(holder);

        for handle in [mirrored_root, mirrored_child] {
            graph.set_local_transform(
                handle,
                Some(Vec3::new(1.0, 2.0, 3.0)),
                Some(Quat::from_axis_angle(&Vec3::y_axis(), constants::PI / 3.0)),
                Some(Vec3::new(-1.0, 2.0, 1.0)),
            );
        }

        let root_world = graph.world(mirrored_root);
        let child_world = graph.world(mirrored_child);
        assert_relative_eq!(root_world.transform.scale, Vec3::new(1.0, 2.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(root_world.transform.scale, child_world.transform.scale, epsilon = 1e-5);
        assert_relative_eq!(root_world.transform.position, child_world.transform.position, epsilon = 1e-5);
        assert_relative_eq!(root_world.transform.rotation, child_world.transform.rotation, epsilon = 1e-5);
        assert_relative_eq!(root_world.matrix, child_world.matrix, epsilon = 1e-5);
    }

    #[test]
    fn test_set_local_transform_is_idempotent() {
        let mut graph = SceneGraph::new();
        let root = graph.create(EntityHandle::INVALID);
        let child = graph.create(root);
        let rotation = Quat::from_axis_angle(&Unit::new_normalize(Vec3::new(0.0, 1.0, 1.0)), 0.7);

        graph.set_local_transform(root, Some(Vec3::new(1.0, 2.0, 3.0)), Some(rotation), None);
        graph.set_at(child, Vec3::new(0.0, 0.0, -4.0));
        let first = graph.world(child);

        graph.set_local_transform(root, Some(Vec3::new(1.0, 2.0, 3.0)), Some(rotation), None);
        let second = graph.world(child);

        assert_eq!(first, second);
    }

    #[test]
    fn test_dispose_returns_each_descendant_once() {
        let mut graph = SceneGraph::new();
        let root = graph.create(EntityHandle::INVALID);
        let a = graph.create(root);
        let b = graph.create(root);
        let a1 = graph.create(a);
        let a2 = graph.create(a);
        let b1 = graph.create(b);

        let mut removed = graph.dispose(root);
        removed.sort();
        let mut expected = vec![a, b, a1, a2, b1];
        expected.sort();

        assert_eq!(removed, expected);
        assert!(graph.is_empty());
        for handle in [root, a, b, a1, a2, b1] {
            assert!(!graph.contains(handle));
        }
    }

    #[test]
    fn test_dispose_subtree_keeps_siblings_and_order() {
        let mut graph = SceneGraph::new();
        let root = graph.create(EntityHandle::INVALID);
        let a = graph.create(root);
        let b = graph.create(root);
        let a1 = graph.create(a);
        let b1 = graph.create(b);

        let removed = graph.dispose(a);

        assert_eq!(removed, vec![a1]);
        assert_eq!(graph.children(root), &[b]);
        assert_eq!(graph.handles(), &[root, b, b1]);
        assert!(graph.is_topologically_ordered());

        graph.set_at(root, Vec3::new(0.0, 0.0, 7.0));
        assert_relative_eq!(
            graph.world(b1).transform.position,
            Vec3::new(0.0, 0.0, 7.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_dispose_stale_handle_is_noop() {
        let mut graph = SceneGraph::new();
        let root = graph.create(EntityHandle::INVALID);
        graph.dispose(root);

        assert!(graph.dispose(root).is_empty());
        assert!(graph.dispose(EntityHandle::INVALID).is_empty());
    }

    #[test]
    fn test_stale_handle_accessors_return_defaults() {
        let mut graph = SceneGraph::new();
        let node = graph.create(EntityHandle::INVALID);
        graph.set_at(node, Vec3::new(3.0, 3.0, 3.0));
        graph.dispose(node);

        let reused = graph.create(EntityHandle::INVALID);
        assert_eq!(reused.slot(), node.slot());

        graph.set_at(node, Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(graph.at(node), Vec3::zeros());
        assert_eq!(graph.at(reused), Vec3::zeros());
        assert_eq!(graph.scale(node), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_topological_order_survives_churn() {
        let mut graph = SceneGraph::new();
        let mut live = vec![graph.create(EntityHandle::INVALID)];

        // Deterministic pseudo-random sequence of creates and disposes.
        let mut seed: u32 = 12345;
        for _ in 0..400 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let pick = (seed >> 8) as usize;
            live.retain(|handle| graph.contains(*handle));
            if live.is_empty() || pick % 3 != 0 {
                let parent = if live.is_empty() {
                    EntityHandle::INVALID
                } else {
                    live[pick % live.len()]
                };
                live.push(graph.create(parent));
            } else {
                graph.dispose(live[pick % live.len()]);
            }
            assert!(graph.is_topologically_ordered());
        }
    }

    #[test]
    fn test_set_prev_reports_changed_nodes_once() {
        let mut graph = SceneGraph::new();
        let a = graph.create(EntityHandle::INVALID);
        let b = graph.create(EntityHandle::INVALID);
        graph.set_at(b, Vec3::new(1.0, 0.0, 0.0));

        assert_eq!(graph.set_prev(), vec![b]);
        assert!(graph.set_prev().is_empty());

        graph.set_at(a, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(graph.set_prev(), vec![a]);
    }

    #[test]
    fn test_interpolated_blends_previous_and_current() {
        let mut graph = SceneGraph::new();
        let node = graph.create(EntityHandle::INVALID);
        graph.set_at(node, Vec3::new(2.0, 0.0, 0.0));
        graph.set_prev();
        graph.set_at(node, Vec3::new(4.0, 0.0, 0.0));

        let halfway = graph.interpolated(node, 0.5);
        assert_relative_eq!(halfway.position, Vec3::new(3.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_move_by_follows_orientation() {
        let mut graph = SceneGraph::new();
        let node = graph.create(EntityHandle::INVALID);
        graph.spin(node, 0.0, 90.0, 0.0);
        graph.move_by(node, 0.0, 0.0, -1.0);

        assert_relative_eq!(graph.at(node), Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_walk_skips_culled_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.create(EntityHandle::INVALID);
        let a = graph.create(root);
        let b = graph.create(root);
        let a1 = graph.create(a);
        let b1 = graph.create(b);
        graph.cull(a, true);

        let mut visited = Vec::new();
        graph.walk(root, |handle, _| {
            visited.push(handle);
            Visit::Continue
        });

        assert_eq!(visited, vec![root, b, b1]);
        assert!(!visited.contains(&a1));
        assert!(graph.is_culled(a));
    }

    #[test]
    fn test_walk_visitor_can_prune() {
        let mut graph = SceneGraph::new();
        let root = graph.create(EntityHandle::INVALID);
        let a = graph.create(root);
        let a1 = graph.create(a);
        let b = graph.create(root);

        let mut visited = Vec::new();
        graph.walk(root, |handle, _| {
            visited.push(handle);
            if handle == a {
                Visit::SkipChildren
            } else {
                Visit::Continue
            }
        });

        assert_eq!(visited, vec![root, a, b]);
        assert!(!visited.contains(&a1));
    }
}
