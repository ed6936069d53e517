//! Orbit demo application
//!
//! Runs the engine headless: a sun with an orbiting planet and moon, a belt
//! of rocks scattered around them and a 2D overlay. Assets arrive from a
//! loader thread after a short delay, so the first frames draw nothing.
//! Each frame's packet counts are logged instead of drawn.
//!
//! Usage: `orbit_demo [config.toml|config.ron]`

use rand::Rng;
use scene_core::prelude::*;
use scene_core::render::InstanceData;
use std::thread;
use std::time::Duration;

/// Ticks to run before quitting
const RUN_TICKS: u32 = 250;

/// Rocks scattered in the belt
const BELT_SIZE: usize = 40;

struct OrbitApp {
    planet: EntityHandle,
    moon: EntityHandle,
    belt: Vec<EntityHandle>,
    label: EntityHandle,
    ticks: u32,
}

impl OrbitApp {
    fn new() -> Self {
        Self {
            planet: EntityHandle::INVALID,
            moon: EntityHandle::INVALID,
            belt: Vec::new(),
            label: EntityHandle::INVALID,
            ticks: 0,
        }
    }
}

impl Application for OrbitApp {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        log::info!("Creating orbit scene...");
        let world = engine.add_scene(RenderPass::ThreeD)?;
        if let Some(scene) = engine.scene_mut(RenderPass::ThreeD) {
            let mut camera = PovCamera::default().with_position(Vec3::new(0.0, 15.0, 60.0));
            camera.spin(-15.0, 0.0, 0.0);
            scene.set_camera(camera);
        }

        let sun = engine.add_part(world);
        engine.lights_mut().insert(sun, Light::new(Vec3::new(1.0, 0.9, 0.7), 2.0));
        engine.models_mut().insert(sun, ModelSpec::builder("lit", "sphere").build()?);

        // The planet orbits by spinning a pivot at the sun's position.
        let pivot = engine.add_part(sun);
        self.planet = engine.add_part(pivot);
        engine.graph_mut().set_at(self.planet, Vec3::new(20.0, 0.0, 0.0));
        engine.graph_mut().set_scale(self.planet, Vec3::new(0.5, 0.5, 0.5));
        engine.models_mut().insert(
            self.planet,
            ModelSpec::builder("textured", "sphere").texture("diffuse", "planet").build()?,
        );

        self.moon = engine.add_part(self.planet);
        engine.graph_mut().set_at(self.moon, Vec3::new(4.0, 0.0, 0.0));
        engine.models_mut().insert(
            self.moon,
            ModelSpec::builder("lit", "sphere").alpha(0.6).build()?,
        );

        let mut rng = rand::thread_rng();
        for _ in 0..BELT_SIZE {
            let rock = engine.add_part(world);
            let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
            let radius: f32 = rng.gen_range(35.0..45.0);
            engine.graph_mut().set_at(
                rock,
                Vec3::new(radius * angle.cos(), rng.gen_range(-2.0..2.0), radius * angle.sin()),
            );
            engine.models_mut().insert(rock, ModelSpec::builder("lit", "rock").build()?);
            self.belt.push(rock);
        }

        let sky = engine.add_part(world);
        engine.models_mut().insert(sky, ModelSpec::builder("sky", "dome").sky().build()?);

        let overlay = engine.add_scene(RenderPass::TwoD)?;
        self.label = engine.add_part(overlay);
        engine.graph_mut().set_at(self.label, Vec3::new(20.0, 20.0, 0.0));
        engine.models_mut().insert(self.label, ModelSpec::builder("text", "label").build()?);
        engine.models_mut().set_instances(self.label, Some(InstanceData { buffer_id: 1, count: 12 }));
        engine.resize(1280, 720);

        spawn_loader(engine);
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
        self.ticks += 1;
        let graph = engine.graph_mut();
        let pivot = graph.parent(self.planet);
        graph.spin(pivot, 0.0, 20.0 * delta_time, 0.0);
        graph.spin(self.planet, 0.0, 90.0 * delta_time, 0.0);

        // Half way through, break up the belt.
        if self.ticks == RUN_TICKS / 2 {
            let doomed: Vec<EntityHandle> = self.belt.drain(..BELT_SIZE / 2).collect();
            for rock in doomed {
                engine.dispose(rock);
            }
            log::info!("Belt reduced to {} rocks", self.belt.len());
        }

        if self.ticks >= RUN_TICKS {
            engine.quit();
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        let moon = engine.graph().world(self.moon).transform.position;
        log::info!(
            "Cleaning up after {} ticks, moon at ({:.1}, {:.1}, {:.1})",
            self.ticks,
            moon.x,
            moon.y,
            moon.z
        );
    }
}

/// Pretend to load assets on a background thread
fn spawn_loader(engine: &Engine) {
    let sender = engine.asset_sender();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        let shaders = [
            ("lit", vec![], vec!["mvp", "model"]),
            ("textured", vec!["diffuse"], vec!["mvp", "model"]),
            ("sky", vec![], vec!["mvp"]),
            ("text", vec!["glyphs"], vec!["mvp", "alpha"]),
        ];
        let meshes = ["sphere", "rock", "dome", "label"];
        let mut assets: Vec<LoadedAsset> = Vec::new();
        for (id, (name, samplers, uniforms)) in shaders.into_iter().enumerate() {
            assets.push(LoadedAsset::Shader {
                name: name.to_string(),
                id: id as u16 + 1,
                samplers: samplers.into_iter().map(String::from).collect(),
                uniforms: uniforms.into_iter().map(String::from).collect(),
            });
        }
        for (id, name) in meshes.into_iter().enumerate() {
            assets.push(LoadedAsset::Mesh { name: name.to_string(), id: id as u32 + 1 });
        }
        assets.push(LoadedAsset::Texture { name: "planet".to_string(), id: 1 });

        for asset in assets {
            if sender.send(asset).is_err() {
                log::warn!("Engine stopped before assets finished loading");
                return;
            }
        }
        log::info!("All assets loaded");
    });
}

/// Logs what would be drawn each frame
#[derive(Default)]
struct LogSink {
    frames: u64,
}

impl FrameSink for LogSink {
    fn submit(&mut self, passes: &[PassFrame]) {
        self.frames += 1;
        if self.frames % 30 != 0 {
            return;
        }
        for pass in passes {
            let stats = pass.stats();
            log::info!(
                "frame {} {:?}: {} packets, {} visited, {} culled, {} lights",
                self.frames,
                pass.pass(),
                stats.packets,
                stats.visited,
                stats.culled,
                pass.data().lights.len()
            );
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::new()
            .with_name("orbit demo")
            .with_render(RenderConfig::new().with_culler(CullerConfig::Front { radius: 80.0 })),
    };

    let mut app = OrbitApp::new();
    let mut sink = LogSink::default();
    Engine::run(config, &mut app, &mut sink)?;
    Ok(())
}
