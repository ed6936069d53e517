//! Core engine implementation
//!
//! The engine owns the scene graph, the scenes, the component managers and
//! the frame assembler. The run loop owns the engine and passes it by
//! `&mut` to every [`Application`] callback; there is no global instance.
//!
//! Simulation advances in fixed ticks. Each tick drains finished asset loads,
//! snapshots changed transforms for interpolation and then runs the
//! application update. After the ticks due for a frame have run, one frame
//! is assembled and handed to the [`FrameSink`].

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;

use crate::{
    application::{AppError, Application},
    core::config::{ConfigError, EngineConfig},
    ecs::{ComponentManager, EntityAllocator, EntityHandle},
    foundation::{logging, time::{FixedStep, Stopwatch, Timer}},
    render::{FrameAssembler, FrameSink, LightRegistry, LoadedAsset, ModelRegistry, PovCamera, RenderPass},
    scene::{culler_from_config, Scene, SceneError, SceneGraph, SceneSet},
};
use thiserror::Error;

/// Time spent in the last frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Profile {
    /// Ticks run
    pub ticks: u32,
    /// Time spent in ticks
    pub update: Duration,
    /// Time spent assembling and submitting
    pub render: Duration,
}

/// Main engine struct
pub struct Engine {
    config: EngineConfig,
    graph: SceneGraph,
    scenes: SceneSet,
    assembler: FrameAssembler,
    models: ModelRegistry,
    lights: LightRegistry,
    managers: Vec<Box<dyn ComponentManager>>,
    imports: Receiver<LoadedAsset>,
    import_sender: Sender<LoadedAsset>,
    clock: FixedStep,
    profile: Profile,
    running: bool,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate().map_err(ConfigError::Invalid)?;
        log::info!("Initializing engine for {}", config.name);

        let allocator = EntityAllocator::with_recycle_threshold(config.scene.recycle_threshold)
            .with_capacity_limit(config.scene.max_entities);
        let (import_sender, imports) = mpsc::channel();

        Ok(Self {
            graph: SceneGraph::with_allocator(allocator),
            scenes: SceneSet::new(),
            assembler: FrameAssembler::new(config.render.clone()),
            models: ModelRegistry::new(config.render.max_instances),
            lights: LightRegistry::new(),
            managers: Vec::new(),
            imports,
            import_sender,
            clock: FixedStep::new(config.tick_duration(), config.max_ticks_per_frame),
            profile: Profile::default(),
            running: true,
            config,
        })
    }

    /// Run the engine main loop with the given application until it calls
    /// [`Engine::quit`]
    pub fn run<T: Application, S: FrameSink>(
        config: EngineConfig,
        app: &mut T,
        sink: &mut S,
    ) -> Result<(), EngineError> {
        logging::init_with_level(&config.log_level);
        let mut engine = Self::new(config)?;

        app.initialize(&mut engine)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {e}")))?;

        log::info!("Starting main loop...");
        let mut timer = Timer::new();
        while engine.running {
            timer.update();
            let elapsed = Duration::from_secs_f32(timer.delta_time());
            let ticks = engine
                .step(app, elapsed, sink)
                .map_err(|e| EngineError::ApplicationError(format!("App update: {e}")))?;
            if ticks == 0 {
                std::thread::sleep(Duration::from_millis(1));
            }
        }

        app.cleanup(&mut engine);
        engine.shutdown();
        log::info!(
            "Engine shutdown complete after {} ticks in {} frames, {:.1}s",
            engine.clock.total_ticks(),
            timer.frame_count(),
            timer.total_time()
        );
        Ok(())
    }

    /// Advance by `elapsed` wall time: run every tick now due, then assemble
    /// and submit one frame. Returns the number of ticks run.
    pub fn step<T: Application, S: FrameSink>(
        &mut self,
        app: &mut T,
        elapsed: Duration,
        sink: &mut S,
    ) -> Result<u32, AppError> {
        let due = self.clock.accumulate(elapsed);
        let mut stopwatch = Stopwatch::new();
        let mut ticks = 0;

        stopwatch.start();
        for _ in 0..due {
            if !self.running {
                break;
            }
            self.tick(app)?;
            ticks += 1;
        }
        stopwatch.stop();
        self.profile.ticks = ticks;
        self.profile.update = stopwatch.elapsed();

        stopwatch.reset();
        stopwatch.start();
        self.render(sink);
        stopwatch.stop();
        self.profile.render = stopwatch.elapsed();
        Ok(ticks)
    }

    /// Run one simulation tick
    pub fn tick<T: Application>(&mut self, app: &mut T) -> Result<(), AppError> {
        self.process_imports();
        self.graph.set_prev();
        let dt = self.clock.step().as_secs_f32();
        app.update(self, dt)
    }

    /// Assemble the current scene graph and submit it
    pub fn render<S: FrameSink>(&mut self, sink: &mut S) {
        let frames = self
            .assembler
            .assemble(&self.graph, self.scenes.iter(), &self.models, &self.lights);
        sink.submit(frames);
    }

    /// Move finished asset loads into the model registry. Returns how many
    /// were imported.
    pub fn process_imports(&mut self) -> usize {
        let mut imported = 0;
        loop {
            match self.imports.try_recv() {
                Ok(asset) => {
                    self.models.import(asset);
                    imported += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        imported
    }

    /// Channel for loader threads to report finished assets
    pub fn asset_sender(&self) -> Sender<LoadedAsset> {
        self.import_sender.clone()
    }

    /// Create a scene root drawing into `pass`. The 3D scene gets the
    /// configured culler.
    pub fn add_scene(&mut self, pass: RenderPass) -> Result<EntityHandle, SceneError> {
        if self.scenes.get(pass).is_some() {
            return Err(SceneError::DuplicatePass(pass));
        }
        let root = self.graph.create(EntityHandle::INVALID);
        if root.is_null() {
            return Err(SceneError::InvalidRoot(root));
        }

        let scene = match pass {
            RenderPass::ThreeD => Scene::new(root, pass, PovCamera::default())
                .with_culler(culler_from_config(&self.config.render.culler)),
            RenderPass::TwoD => Scene::new(root, pass, PovCamera::orthographic(1.0, 1.0, -1.0, 1.0)),
        };
        self.scenes.insert(scene)?;
        log::debug!("Added {pass:?} scene with root {root}");
        Ok(root)
    }

    /// Create an entity below `parent`
    pub fn add_part(&mut self, parent: EntityHandle) -> EntityHandle {
        self.graph.create(parent)
    }

    /// Remove an entity and everything below it, telling every component
    /// manager which entities are gone
    pub fn dispose(&mut self, handle: EntityHandle) {
        if !self.graph.contains(handle) {
            log::warn!("dispose: invalid entity {handle}");
            return;
        }
        if self.scenes.remove_root(handle).is_some() {
            log::debug!("Removed scene rooted at {handle}");
        }

        let mut dead = vec![handle];
        dead.extend(self.graph.dispose(handle));
        self.models.on_entities_disposed(&dead);
        self.lights.on_entities_disposed(&dead);
        for manager in &mut self.managers {
            manager.on_entities_disposed(&dead);
        }
    }

    /// Register an application-side component manager for dispose events
    pub fn register_manager(&mut self, manager: Box<dyn ComponentManager>) {
        self.managers.push(manager);
    }

    /// Resize every scene camera to a new viewport
    pub fn resize(&mut self, width: u32, height: u32) {
        for pass in RenderPass::ALL {
            if let Some(scene) = self.scenes.get_mut(pass) {
                scene.camera.resize(width, height);
            }
        }
    }

    /// Scene graph
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable scene graph
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Scene drawing into `pass`
    pub fn scene(&self, pass: RenderPass) -> Option<&Scene> {
        self.scenes.get(pass)
    }

    /// Mutable scene drawing into `pass`
    pub fn scene_mut(&mut self, pass: RenderPass) -> Option<&mut Scene> {
        self.scenes.get_mut(pass)
    }

    /// Model registry
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Mutable model registry
    pub fn models_mut(&mut self) -> &mut ModelRegistry {
        &mut self.models
    }

    /// Light registry
    pub fn lights(&self) -> &LightRegistry {
        &self.lights
    }

    /// Mutable light registry
    pub fn lights_mut(&mut self) -> &mut LightRegistry {
        &mut self.lights
    }

    /// Frame assembler, holding the last assembled frame
    pub fn assembler(&self) -> &FrameAssembler {
        &self.assembler
    }

    /// Fraction of a tick elapsed since the last tick, for interpolation
    pub fn interpolation(&self) -> f32 {
        self.clock.interpolation()
    }

    /// Timing of the last frame
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// True until [`Engine::quit`] is called
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ask the run loop to stop after the current tick
    pub fn quit(&mut self) {
        log::info!("Quit requested");
        self.running = false;
    }

    /// Dispose every scene, which disposes everything
    pub fn shutdown(&mut self) {
        self.running = false;
        for root in self.scenes.roots() {
            self.dispose(root);
        }
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::{Light, ModelSpec, PassFrame};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        frames: usize,
        packets: Vec<usize>,
    }

    impl FrameSink for Recorder {
        fn submit(&mut self, passes: &[PassFrame]) {
            self.frames += 1;
            self.packets = passes.iter().map(|pass| pass.packets().len()).collect();
        }
    }

    #[derive(Default)]
    struct Spinner {
        ship: EntityHandle,
        updates: u32,
    }

    impl Application for Spinner {
        fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
            let root = engine.add_scene(RenderPass::ThreeD)?;
            self.ship = engine.add_part(root);
            engine.graph_mut().set_at(self.ship, Vec3::new(0.0, 0.0, -10.0));
            let spec = ModelSpec::builder("flat", "ship").build()?;
            engine.models_mut().insert(self.ship, spec);
            Ok(())
        }

        fn update(&mut self, engine: &mut Engine, _dt: f32) -> Result<(), AppError> {
            self.updates += 1;
            engine.graph_mut().spin(self.ship, 0.0, 10.0, 0.0);
            if self.updates == 3 {
                engine.quit();
            }
            Ok(())
        }

        fn cleanup(&mut self, _engine: &mut Engine) {}
    }

    fn send_assets(engine: &Engine) {
        let sender = engine.asset_sender();
        std::thread::spawn(move || {
            sender
                .send(LoadedAsset::Shader {
                    name: "flat".to_string(),
                    id: 2,
                    samplers: Vec::new(),
                    uniforms: vec!["mvp".to_string()],
                })
                .expect("engine alive");
            sender
                .send(LoadedAsset::Mesh { name: "ship".to_string(), id: 4 })
                .expect("engine alive");
        })
        .join()
        .expect("loader thread");
    }

    #[test]
    fn test_step_runs_due_ticks_and_renders() {
        let mut engine = Engine::new(EngineConfig::new().with_tick_rate(10)).expect("engine");
        let mut app = Spinner::default();
        let mut sink = Recorder::default();
        app.initialize(&mut engine).expect("init");

        let ticks = engine.step(&mut app, Duration::from_millis(250), &mut sink).expect("step");
        assert_eq!(ticks, 2);
        assert_eq!(sink.frames, 1);
        assert_eq!(sink.packets, vec![0]);

        send_assets(&engine);
        let ticks = engine.step(&mut app, Duration::from_millis(100), &mut sink).expect("step");
        assert_eq!(ticks, 1);
        assert_eq!(sink.packets, vec![1]);
        assert!(!engine.is_running());
        assert_eq!(engine.profile().ticks, 1);
    }

    #[test]
    fn test_duplicate_scene_rejected() {
        let mut engine = Engine::new(EngineConfig::default()).expect("engine");
        engine.add_scene(RenderPass::TwoD).expect("overlay");
        assert_eq!(
            engine.add_scene(RenderPass::TwoD),
            Err(SceneError::DuplicatePass(RenderPass::TwoD))
        );
        assert!(engine.add_scene(RenderPass::ThreeD).is_ok());
    }

    struct Tracker(Rc<RefCell<Vec<EntityHandle>>>);

    impl ComponentManager for Tracker {
        fn on_entities_disposed(&mut self, handles: &[EntityHandle]) {
            self.0.borrow_mut().extend_from_slice(handles);
        }
    }

    #[test]
    fn test_dispose_notifies_every_manager() {
        let mut engine = Engine::new(EngineConfig::default()).expect("engine");
        let seen = Rc::new(RefCell::new(Vec::new()));
        engine.register_manager(Box::new(Tracker(Rc::clone(&seen))));

        let root = engine.add_scene(RenderPass::ThreeD).expect("scene");
        let lamp = engine.add_part(root);
        let bulb = engine.add_part(lamp);
        engine.lights_mut().insert(lamp, Light::default());
        engine
            .models_mut()
            .insert(bulb, ModelSpec::builder("s", "m").build().expect("valid"));

        engine.dispose(lamp);

        assert_eq!(*seen.borrow(), vec![lamp, bulb]);
        assert!(engine.lights().is_empty());
        assert!(engine.models().is_empty());
        assert!(engine.graph().contains(root));

        engine.shutdown();
        assert!(engine.scene(RenderPass::ThreeD).is_none());
        assert!(engine.graph().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Engine::new(EngineConfig::new().with_tick_rate(0));
        assert!(matches!(result, Err(EngineError::Config(ConfigError::Invalid(_)))));
    }
}
