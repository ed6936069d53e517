//! # Frame Assembly
//!
//! Turns the scene graph into sorted packet lists, one per active scene.
//!
//! For each scene, in pass order:
//! 1. reset the pass's packet pool and uniform data
//! 2. fill camera matrices and collect lights from the root's direct children
//! 3. walk the scene subtree, skipping culled nodes; the scene culler sees
//!    anything drawable, and 3D passes also measure camera distance
//! 4. ask the model source to fill one packet per visible node and key it
//! 5. sort packets by bucket, largest first
//!
//! The result is handed to a [`FrameSink`], the stage that talks to the GPU.

use super::bucket::Bucket;
use super::camera::Camera;
use super::lighting::LightSource;
use super::packet::{PacketPool, RenderPacket};
use super::pass::{PassData, PassLight, RenderPass};
use super::source::{ModelSource, TransformSnapshot};
use crate::core::config::RenderConfig;
use crate::ecs::EntityHandle;
use crate::scene::{Scene, SceneGraph, Visit, WorldTransform};

/// Per-pass counters for the last assembled frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes reached by traversal
    pub visited: usize,
    /// Drawable nodes rejected by the scene culler
    pub culled: usize,
    /// Packets emitted
    pub packets: usize,
    /// Visible nodes whose packet could not be filled
    pub failed: usize,
    /// Lights left out because the pass was already full
    pub dropped_lights: usize,
}

/// One assembled pass
#[derive(Debug)]
pub struct PassFrame {
    pass: RenderPass,
    data: PassData,
    packets: PacketPool,
    stats: FrameStats,
}

impl PassFrame {
    fn new(pass: RenderPass, capacity: usize) -> Self {
        Self {
            pass,
            data: PassData::default(),
            packets: PacketPool::with_capacity(capacity),
            stats: FrameStats::default(),
        }
    }

    /// Pass these packets belong to
    pub fn pass(&self) -> RenderPass {
        self.pass
    }

    /// Uniform data shared by the pass
    pub fn data(&self) -> &PassData {
        &self.data
    }

    /// Packets in draw order
    pub fn packets(&self) -> &[RenderPacket] {
        self.packets.as_slice()
    }

    /// Counters for this pass
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

/// Consumer of assembled frames
pub trait FrameSink {
    /// Draw the passes, in order
    fn submit(&mut self, passes: &[PassFrame]);
}

/// A visible node waiting for its packet
#[derive(Debug, Clone, Copy)]
struct Visible {
    handle: EntityHandle,
    world: WorldTransform,
    distance: f32,
}

/// Builds sorted packet lists from scenes
#[derive(Debug)]
pub struct FrameAssembler {
    config: RenderConfig,
    frames: Vec<PassFrame>,
    visible: Vec<Visible>,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl FrameAssembler {
    /// Create an assembler with the given limits
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            frames: Vec::with_capacity(RenderPass::ALL.len()),
            visible: Vec::new(),
        }
    }

    /// Limits in use
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Passes from the last call to [`FrameAssembler::assemble`]
    pub fn frames(&self) -> &[PassFrame] {
        &self.frames
    }

    /// Assemble one frame for every scene, in pass order
    pub fn assemble<'a>(
        &mut self,
        graph: &SceneGraph,
        scenes: impl IntoIterator<Item = &'a Scene>,
        models: &dyn ModelSource,
        lights: &dyn LightSource,
    ) -> &[PassFrame] {
        let mut scenes: Vec<&Scene> = scenes.into_iter().collect();
        scenes.sort_by_key(|scene| scene.pass);

        for (index, scene) in scenes.iter().enumerate() {
            if index == self.frames.len() {
                self.frames.push(PassFrame::new(scene.pass, self.config.packet_capacity));
            }
            self.assemble_pass(index, graph, scene, models, lights);
        }
        self.frames.truncate(scenes.len());
        &self.frames
    }

    fn assemble_pass(
        &mut self,
        index: usize,
        graph: &SceneGraph,
        scene: &Scene,
        models: &dyn ModelSource,
        lights: &dyn LightSource,
    ) {
        let max_lights = self.config.max_lights;
        let frame = &mut self.frames[index];
        frame.pass = scene.pass;
        frame.packets.clear();
        frame.data.reset();
        let previously_dropped = frame.stats.dropped_lights;
        frame.stats = FrameStats::default();

        let camera: &dyn Camera = scene.camera.as_ref();
        frame.data.projection = camera.projection_matrix();
        frame.data.view = camera.view_matrix();
        frame.data.camera_position = camera.world_position();

        for &child in graph.children(scene.root) {
            if graph.is_culled(child) {
                continue;
            }
            let Some(light) = lights.light(child) else {
                continue;
            };
            if frame.data.lights.len() == max_lights {
                frame.stats.dropped_lights += 1;
                continue;
            }
            frame.data.lights.push(PassLight {
                position: graph.world(child).transform.position,
                color: light.color,
                intensity: light.intensity,
            });
        }

        if frame.stats.dropped_lights != previously_dropped && frame.stats.dropped_lights > 0 {
            log::warn!(
                "Scene {} has {} lights over the limit of {max_lights}, ignoring them",
                scene.root,
                frame.stats.dropped_lights
            );
        }

        let uses_depth = scene.pass.uses_depth();
        let culler = scene.culler.as_deref();
        let visible = &mut self.visible;
        let stats = &mut frame.stats;
        visible.clear();
        graph.walk(scene.root, |handle, world| {
            stats.visited += 1;
            if !models.is_render_ready(handle) {
                return Visit::Continue;
            }
            // 2D positions are screen space; the culler still applies there.
            let position = world.transform.position;
            if culler.is_some_and(|culler| culler.culled(camera, position.x, position.y, position.z)) {
                stats.culled += 1;
                return Visit::SkipChildren;
            }
            let distance = if uses_depth { camera.distance_to(&position) } else { 0.0 };
            visible.push(Visible {
                handle,
                world: *world,
                distance,
            });
            Visit::Continue
        });

        for entry in &self.visible {
            let snapshot = TransformSnapshot {
                handle: entry.handle,
                world: entry.world,
                distance: entry.distance,
            };
            let packet = frame.packets.acquire();
            packet.tag = entry.handle;
            match models.fill_packet(packet, &snapshot, camera) {
                Ok(()) => {
                    packet.bucket = Bucket::new(scene.pass)
                        .with_draw_type(packet.draw_type)
                        .with_shader(packet.shader_id)
                        .with_distance(entry.distance);
                }
                Err(error) => {
                    frame.packets.discard_last();
                    frame.stats.failed += 1;
                    if error.is_developer_error() {
                        log::error!("No packet for {}: {error}", entry.handle);
                    } else {
                        log::debug!("No packet for {}: {error}", entry.handle);
                    }
                }
            }
        }

        frame.packets.sort();
        frame.stats.packets = frame.packets.len();
        log::trace!(
            "{:?} pass: {} packets from {} nodes",
            scene.pass,
            frame.stats.packets,
            frame.stats.visited
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4, Vec3};
    use crate::render::{DrawType, Light, LightRegistry, LoadedAsset, ModelRegistry, ModelSpec, PovCamera};
    use crate::scene::RadiusCuller;
    use approx::assert_relative_eq;

    fn registry() -> ModelRegistry {
        let mut models = ModelRegistry::default();
        models.import(LoadedAsset::Shader {
            name: "flat".to_string(),
            id: 1,
            samplers: Vec::new(),
            uniforms: vec!["mvp".to_string()],
        });
        models.import(LoadedAsset::Mesh { name: "cube".to_string(), id: 1 });
        models
    }

    fn cube(alpha: f32) -> ModelSpec {
        ModelSpec::builder("flat", "cube").alpha(alpha).build().expect("valid")
    }

    #[test]
    fn test_packets_sorted_by_draw_type_then_distance() {
        let mut graph = SceneGraph::new();
        let mut models = registry();
        let root = graph.create(EntityHandle::INVALID);
        let near_glass = graph.create(root);
        let far_glass = graph.create(root);
        let wall = graph.create(root);
        graph.set_at(near_glass, Vec3::new(0.0, 0.0, -2.0));
        graph.set_at(far_glass, Vec3::new(0.0, 0.0, -20.0));
        graph.set_at(wall, Vec3::new(0.0, 0.0, -5.0));
        models.insert(near_glass, cube(0.5));
        models.insert(far_glass, cube(0.5));
        models.insert(wall, cube(1.0));

        let scene = Scene::new(root, RenderPass::ThreeD, PovCamera::default());
        let mut assembler = FrameAssembler::default();
        let frames = assembler.assemble(&graph, [&scene], &models, &LightRegistry::new());

        assert_eq!(frames.len(), 1);
        let order: Vec<EntityHandle> = frames[0].packets().iter().map(|p| p.tag).collect();
        assert_eq!(order, vec![wall, far_glass, near_glass]);
        assert_eq!(frames[0].packets()[0].draw_type, DrawType::Opaque);
        assert_eq!(frames[0].stats().visited, 4);
    }

    #[test]
    fn test_culled_node_subtree_never_drawn() {
        let mut graph = SceneGraph::new();
        let mut models = registry();
        let root = graph.create(EntityHandle::INVALID);
        let hidden = graph.create(root);
        let hidden_child = graph.create(hidden);
        models.insert(hidden, cube(1.0));
        models.insert(hidden_child, cube(1.0));
        graph.cull(hidden, true);

        let scene = Scene::new(root, RenderPass::ThreeD, PovCamera::default());
        let mut assembler = FrameAssembler::default();
        let frames = assembler.assemble(&graph, [&scene], &models, &LightRegistry::new());

        assert!(frames[0].packets().is_empty());
        assert_eq!(frames[0].stats().visited, 1);
    }

    #[test]
    fn test_culler_skips_far_subtree() {
        let mut graph = SceneGraph::new();
        let mut models = registry();
        let root = graph.create(EntityHandle::INVALID);
        let far = graph.create(root);
        let rider = graph.create(far);
        let near = graph.create(root);
        graph.set_at(far, Vec3::new(0.0, 0.0, -50.0));
        graph.set_at(rider, Vec3::new(0.0, 0.0, 45.0));
        models.insert(far, cube(1.0));
        models.insert(rider, cube(1.0));
        models.insert(near, cube(1.0));

        let scene = Scene::new(root, RenderPass::ThreeD, PovCamera::default())
            .with_culler(Some(Box::new(RadiusCuller::new(10.0))));
        let mut assembler = FrameAssembler::default();
        let frames = assembler.assemble(&graph, [&scene], &models, &LightRegistry::new());

        let tags: Vec<EntityHandle> = frames[0].packets().iter().map(|p| p.tag).collect();
        assert_eq!(tags, vec![near]);
        assert_eq!(frames[0].stats().culled, 1);
    }

    #[test]
    fn test_two_d_pass_culls_in_screen_space_without_distance() {
        let mut graph = SceneGraph::new();
        let mut models = registry();
        let root = graph.create(EntityHandle::INVALID);
        let offscreen = graph.create(root);
        let badge = graph.create(offscreen);
        let corner = graph.create(root);
        graph.set_at(offscreen, Vec3::new(500.0, 300.0, 0.0));
        graph.set_at(corner, Vec3::new(40.0, 30.0, 0.0));
        for handle in [offscreen, badge, corner] {
            models.insert(handle, cube(1.0));
        }

        let scene = Scene::new(root, RenderPass::TwoD, PovCamera::orthographic(800.0, 600.0, -1.0, 1.0))
            .with_culler(Some(Box::new(RadiusCuller::new(100.0))));
        let mut assembler = FrameAssembler::default();
        let frames = assembler.assemble(&graph, [&scene], &models, &LightRegistry::new());

        let tags: Vec<EntityHandle> = frames[0].packets().iter().map(|p| p.tag).collect();
        assert_eq!(tags, vec![corner]);
        assert_eq!(frames[0].stats().culled, 1);
        assert_eq!(frames[0].packets()[0].bucket.distance(), 0.0);
    }

    /// Camera parked at a fixed point, looking down -Z
    #[derive(Debug)]
    struct Tripod(Vec3);

    impl Camera for Tripod {
        fn projection_matrix(&self) -> Mat4 {
            Mat4::identity()
        }

        fn view_matrix(&self) -> Mat4 {
            Mat4::new_translation(&-self.0)
        }

        fn world_position(&self) -> Vec3 {
            self.0
        }

        fn look_direction(&self) -> Vec3 {
            Vec3::new(0.0, 0.0, -1.0)
        }
    }

    #[test]
    fn test_scene_driven_by_any_camera() {
        let mut graph = SceneGraph::new();
        let mut models = registry();
        let root = graph.create(EntityHandle::INVALID);
        let near_origin = graph.create(root);
        let near_tripod = graph.create(root);
        graph.set_at(near_tripod, Vec3::new(100.0, 0.0, 0.0));
        models.insert(near_origin, cube(1.0));
        models.insert(near_tripod, cube(1.0));

        let scene = Scene::new(root, RenderPass::ThreeD, Tripod(Vec3::new(100.0, 0.0, 3.0)))
            .with_culler(Some(Box::new(RadiusCuller::new(10.0))));
        let mut assembler = FrameAssembler::default();
        let frames = assembler.assemble(&graph, [&scene], &models, &LightRegistry::new());

        assert_eq!(frames[0].packets().len(), 1);
        assert_eq!(frames[0].packets()[0].tag, near_tripod);
        assert_relative_eq!(frames[0].packets()[0].bucket.distance(), 3.0, epsilon = 1e-5);
        assert_eq!(frames[0].data().camera_position, Vec3::new(100.0, 0.0, 3.0));
    }

    #[test]
    fn test_lights_from_root_children_capped() {
        let mut graph = SceneGraph::new();
        let models = registry();
        let mut lights = LightRegistry::new();
        let root = graph.create(EntityHandle::INVALID);
        let sun = graph.create(root);
        let lamp = graph.create(root);
        let dimmed = graph.create(root);
        let nested = graph.create(sun);
        graph.set_at(sun, Vec3::new(0.0, 100.0, 0.0));
        for handle in [sun, lamp, dimmed, nested] {
            lights.insert(handle, Light::new(Vec3::new(1.0, 1.0, 1.0), 1.0));
        }
        graph.cull(dimmed, true);

        let scene = Scene::new(root, RenderPass::ThreeD, PovCamera::default());
        let mut assembler = FrameAssembler::new(RenderConfig::new().with_max_lights(1));
        let frames = assembler.assemble(&graph, [&scene], &models, &lights);

        let data = frames[0].data();
        assert_eq!(data.lights.len(), 1);
        assert_eq!(data.lights[0].position, Vec3::new(0.0, 100.0, 0.0));
        assert_eq!(frames[0].stats().dropped_lights, 1);

        // Same overflow next frame; still counted, still capped.
        let frames = assembler.assemble(&graph, [&scene], &models, &lights);
        assert_eq!(frames[0].data().lights.len(), 1);
        assert_eq!(frames[0].stats().dropped_lights, 1);

        lights.remove(lamp);
        let frames = assembler.assemble(&graph, [&scene], &models, &lights);
        assert_eq!(frames[0].stats().dropped_lights, 0);
    }

    #[test]
    fn test_packets_wait_for_assets() {
        let mut graph = SceneGraph::new();
        let mut models = ModelRegistry::default();
        let root = graph.create(EntityHandle::INVALID);
        let ship = graph.create(root);
        models.insert(ship, cube(1.0));

        let scene = Scene::new(root, RenderPass::ThreeD, PovCamera::default());
        let mut assembler = FrameAssembler::default();
        assert!(assembler.assemble(&graph, [&scene], &models, &LightRegistry::new())[0]
            .packets()
            .is_empty());

        models.import(LoadedAsset::Shader {
            name: "flat".to_string(),
            id: 1,
            samplers: Vec::new(),
            uniforms: Vec::new(),
        });
        models.import(LoadedAsset::Mesh { name: "cube".to_string(), id: 1 });
        let frames = assembler.assemble(&graph, [&scene], &models, &LightRegistry::new());
        assert_eq!(frames[0].packets().len(), 1);
    }
}
