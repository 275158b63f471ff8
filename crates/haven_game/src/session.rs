//! The session owns every service a running level needs (level, player
//! controller, camera, light registry, lighting worker, input state) and
//! drives the frame loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use haven_core::{FrameClock, InputState, Key, Point2, Rectangle};
use haven_render::{
    light_map_channel, Camera, Canvas, DayNightCycle, Light, LightId, LightMapReceiver,
    LightRegistry, LightingWorker,
};
use image::Rgb;

use crate::assets::AssetProvider;
use crate::config::{validate_config, EngineConfig};
use crate::controller::{PlayerController, TickReport};
use crate::entity::{Entity, EntityId};
use crate::error::SessionError;
use crate::level::{Level, LevelOptions};
use crate::map::MapProvider;
use crate::player::build_player_entity;

/// Cooperative stop flag for `Session::run`, checked once per iteration.
#[derive(Debug, Clone, Default)]
pub struct QuitHandle(Arc<AtomicBool>);

impl QuitHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Whatever feeds keyboard state into the loop (a window, a script, a test).
pub trait InputSource {
    fn poll(&mut self, input: &mut InputState);
}

pub struct Session {
    config: EngineConfig,
    level: Level,
    controller: PlayerController,
    camera: Camera,
    registry: LightRegistry,
    day_night: Option<DayNightCycle>,
    worker: LightingWorker,
    light_maps: LightMapReceiver,
    input: InputState,
    quit: QuitHandle,
    last_tick: TickReport,
}

impl Session {
    pub fn new(
        config: EngineConfig,
        assets: &dyn AssetProvider,
        maps: &dyn MapProvider,
        level_name: &str,
    ) -> Result<Self, SessionError> {
        validate_config(&config).map_err(SessionError::Config)?;

        let mut level = Level::load(level_name, maps, assets, &LevelOptions::from(&config))?;
        let spawn = level.player_spawn().unwrap_or(Point2::ZERO);
        let player = build_player_entity(&config.player, config.sprite_scale, spawn, assets)?;
        let player_id = level.add_actor(player);
        let controller = PlayerController::new(player_id, config.player.speed);

        let (width, height) = level.size();
        let mut camera = Camera::new(config.viewport_width, config.viewport_height);
        camera.set_world_size(width, height);

        let registry = LightRegistry::new(width, height);
        for light in level.lights() {
            registry.add(light.clone());
        }
        let day_night = config.day_night.as_ref().map(|cycle| {
            DayNightCycle::new(
                &registry,
                Rgb(cycle.color),
                cycle.day_strength,
                cycle.night_strength,
                cycle.transition_rate,
            )
        });

        let (publisher, light_maps) = light_map_channel();
        let worker =
            LightingWorker::spawn(registry.clone(), config.lighting_interval(), publisher)?;

        log::info!(
            "Session started on '{}' ({}x{}), player at {}",
            level.name(),
            width,
            height,
            spawn
        );

        let mut session = Self {
            config,
            level,
            controller,
            camera,
            registry,
            day_night,
            worker,
            light_maps,
            input: InputState::new(),
            quit: QuitHandle::default(),
            last_tick: TickReport::default(),
        };
        session.follow_player();
        Ok(session)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub fn player(&self) -> EntityId {
        self.controller.entity()
    }

    pub fn controller(&self) -> &PlayerController {
        &self.controller
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn registry(&self) -> &LightRegistry {
        &self.registry
    }

    pub fn day_night_mut(&mut self) -> Option<&mut DayNightCycle> {
        self.day_night.as_mut()
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn quit_handle(&self) -> QuitHandle {
        self.quit.clone()
    }

    pub fn last_tick(&self) -> TickReport {
        self.last_tick
    }

    pub fn level_size(&self) -> (u32, u32) {
        self.level.size()
    }

    pub fn add_actor(&mut self, actor: Entity) -> EntityId {
        self.level.add_actor(actor)
    }

    pub fn add_light(&self, light: impl Into<Light>) -> LightId {
        self.registry.add(light)
    }

    pub fn remove_light(&self, id: LightId) -> Option<Light> {
        self.registry.remove(id)
    }

    pub fn collision_rects(&self, exclude: Option<EntityId>) -> Vec<Rectangle> {
        self.level.collision_rects(exclude)
    }

    pub fn trigger_entities(&self, exclude: Option<EntityId>) -> Vec<&Entity> {
        self.level.trigger_entities(exclude)
    }

    /// Advance one tick: input, animations, movement with collisions and
    /// triggers, ambient light, then the camera.
    pub fn update(&mut self, dt_ns: u64) {
        match self.level.entity_mut(self.controller.entity()) {
            Some(player) => self.controller.handle_input(&self.input, player),
            None => log::warn!("Player entity is no longer in the level"),
        }
        self.level.update_entities(dt_ns);
        self.last_tick = self.controller.update(dt_ns, &mut self.level);
        if let Some(cycle) = &mut self.day_night {
            cycle.update(dt_ns, &self.registry);
        }
        self.follow_player();
    }

    /// Tile layers, z-ordered entities, then the newest complete light map.
    pub fn draw(&mut self, canvas: &mut dyn Canvas) {
        self.level.draw(canvas, &self.camera, &self.config.debug);
        if let Some(light_map) = self.light_maps.latest() {
            canvas.draw_image(&light_map.image, self.camera.apply(Point2::ZERO));
        }
    }

    /// Run the frame loop until Escape is held or quit is requested.
    /// Returns the number of frames run.
    pub fn run(&mut self, source: &mut dyn InputSource, canvas: &mut dyn Canvas) -> u64 {
        let mut clock = FrameClock::new(self.config.frame_interval());
        let mut frames = 0;
        loop {
            source.poll(&mut self.input);
            if self.input.is_held(Key::Escape) {
                self.quit.request();
            }
            if self.quit.is_requested() {
                break;
            }

            let dt_ns = clock.begin_frame();
            self.update(dt_ns);
            self.draw(canvas);
            self.input.end_frame();
            clock.end_frame();
            frames += 1;
        }
        log::info!(
            "Frame loop ended after {} frames ({:.2}ms smoothed frame time)",
            frames,
            clock.smoothed_frame_time_ms
        );
        frames
    }

    /// Stop the lighting worker. Also happens on drop.
    pub fn shutdown(&mut self) {
        self.worker.stop();
    }

    fn follow_player(&mut self) {
        if let Some(player) = self.level.entity(self.controller.entity()) {
            self.camera.set_position(player.pixel_position());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetStore;
    use crate::config::DayNightConfig;
    use crate::level::tests::fixture;
    use crate::map::MapStore;
    use crate::player::tests::{player_config, sheet};
    use glam::DVec2;
    use haven_render::PointLight;
    use image::RgbaImage;
    use std::time::{Duration, Instant};

    /// Records what was drawn instead of rasterising it.
    #[derive(Default)]
    struct RecordingCanvas {
        images: Vec<((u32, u32), Point2)>,
        outlines: usize,
    }

    impl Canvas for RecordingCanvas {
        fn size(&self) -> (u32, u32) {
            (32, 32)
        }

        fn draw_image(&mut self, image: &RgbaImage, position: Point2) {
            self.images.push((image.dimensions(), position));
        }

        fn draw_rect_outline(&mut self, _rect: Rectangle, _color: image::Rgba<u8>) {
            self.outlines += 1;
        }
    }

    /// Holds `keys` for `frames` polls, then presses Escape.
    struct Scripted {
        keys: Vec<Key>,
        frames: u32,
        polled: u32,
    }

    impl InputSource for Scripted {
        fn poll(&mut self, input: &mut InputState) {
            self.polled += 1;
            if self.polled > self.frames {
                input.release_all();
                input.key_down(Key::Escape);
            } else {
                for key in &self.keys {
                    input.key_down(*key);
                }
            }
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            viewport_width: 16,
            viewport_height: 16,
            frame_interval_ms: 1,
            lighting_interval_ms: 5,
            sprite_scale: 1.0,
            player: player_config(),
            ..EngineConfig::default()
        }
    }

    fn providers() -> (MapStore, AssetStore) {
        let (maps, mut assets) = fixture();
        assets.insert_image("body", sheet(2));
        assets.insert_image("hair", sheet(1));
        (maps, assets)
    }

    fn session(config: EngineConfig) -> Session {
        let (maps, assets) = providers();
        Session::new(config, &assets, &maps, "Test").unwrap()
    }

    fn wait_for_light_map(session: &mut Session) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if session.light_maps.latest().is_some() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn player_spawns_at_spawn_point() {
        let session = session(config());
        let player = session.level().entity(session.player()).unwrap();
        assert_eq!(player.position(), DVec2::new(12.0, 18.0));
        assert_eq!(session.level_size(), (32, 32));
        // Map light plus nothing else.
        assert_eq!(session.registry().len(), 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (maps, assets) = providers();
        let mut bad = config();
        bad.player.layers.clear();
        let err = Session::new(bad, &assets, &maps, "Test").err();
        assert!(matches!(err, Some(SessionError::Config(_))));
    }

    #[test]
    fn unknown_level_fails_with_load_error() {
        let (maps, assets) = providers();
        let err = Session::new(config(), &assets, &maps, "Nowhere").err();
        assert!(matches!(err, Some(SessionError::Load(_))));
    }

    #[test]
    fn update_moves_player_and_camera_follows() {
        let mut session = session(config());
        assert_eq!(session.camera().offset(), Point2::new(12, 18));
        session.input_mut().key_down(Key::W);
        session.update(50_000_000);
        let player = session.level().entity(session.player()).unwrap();
        assert_eq!(player.position(), DVec2::new(12.0, 14.0));
        assert_eq!(player.current_animation(), Some("WalkUp"));
        assert_eq!(session.camera().offset(), Point2::new(12, 14));
        assert_eq!(session.last_tick(), TickReport::default());
    }

    #[test]
    fn day_night_light_is_registered_and_driven() {
        let mut with_cycle = config();
        with_cycle.day_night = Some(DayNightConfig {
            day_strength: 1.0,
            night_strength: 0.0,
            transition_rate: 1.0,
            color: [255, 255, 255],
        });
        let mut session = session(with_cycle);
        assert_eq!(session.registry().len(), 2);

        let cycle = session.day_night_mut().unwrap();
        cycle.set_time_of_day(haven_render::TimeOfDay::Night);
        let light = cycle.light();
        session.update(500_000_000);
        let strength = session.registry().get(light).unwrap().strength();
        assert!((strength - 0.5).abs() < 1e-9);
    }

    #[test]
    fn lights_can_be_added_and_removed() {
        let session = session(config());
        let id = session.add_light(PointLight::new(
            DVec2::new(4.0, 4.0),
            Rgb([255, 0, 0]),
            1.0,
            8.0,
        ));
        assert_eq!(session.registry().len(), 2);
        assert!(session.remove_light(id).is_some());
        assert!(session.remove_light(id).is_none());
        assert_eq!(session.registry().len(), 1);
    }

    #[test]
    fn draw_puts_light_map_last() {
        let mut session = session(config());
        assert!(wait_for_light_map(&mut session));
        let mut canvas = RecordingCanvas::default();
        session.draw(&mut canvas);
        let (size, _) = canvas.images.last().copied().unwrap();
        assert_eq!(size, (32, 32));
        // Ground layer first.
        assert_eq!(canvas.images[0].0, (32, 32));
        assert!(canvas.images.len() > 2);
    }

    #[test]
    fn debug_boxes_are_outlined_when_enabled() {
        let mut plain = session(config());
        let mut canvas = RecordingCanvas::default();
        plain.draw(&mut canvas);
        assert_eq!(canvas.outlines, 0);

        let mut debug = config();
        debug.debug.show_bounding_boxes = true;
        debug.debug.show_triggers = true;
        let mut session = session(debug);
        let mut canvas = RecordingCanvas::default();
        session.draw(&mut canvas);
        // Tree and player boxes at least.
        assert!(canvas.outlines >= 2);
    }

    #[test]
    fn run_stops_on_escape() {
        let mut session = session(config());
        let mut source = Scripted {
            keys: vec![Key::D],
            frames: 3,
            polled: 0,
        };
        let mut canvas = RecordingCanvas::default();
        assert_eq!(session.run(&mut source, &mut canvas), 3);
        assert!(session.quit_handle().is_requested());
        let player = session.level().entity(session.player()).unwrap();
        assert!(player.position().x > 12.0);
        assert!(!canvas.images.is_empty());
    }

    #[test]
    fn quit_handle_stops_loop_before_first_frame() {
        let mut session = session(config());
        session.quit_handle().request();
        let mut source = Scripted {
            keys: Vec::new(),
            frames: 100,
            polled: 0,
        };
        assert_eq!(session.run(&mut source, &mut RecordingCanvas::default()), 0);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut session = session(config());
        session.shutdown();
        session.shutdown();
    }
}
