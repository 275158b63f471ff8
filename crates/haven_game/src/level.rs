//! A loaded map: tile layers, placed sprites, actors, static collision
//! rectangles, the player spawn and the map's fixed lights.
//!
//! Object groups are classified by name: "Objects" (sprites looked up by
//! descriptor), "Collisions" (static rectangles), "Spawn Points" (only
//! `player_spawn` is used) and "Lighting" (point lights with `radius`,
//! `strength` and `color` properties). Map coordinates are multiplied by the
//! sprite scale on load.

use crossbeam_channel::{Receiver, Sender};
use glam::DVec2;
use haven_core::{Animation, Point2, Rectangle};
use haven_render::{Camera, Canvas, PointLight};

use crate::assets::{scale_image, AssetProvider, ImageHandle, SpriteDescriptor};
use crate::config::{DebugConfig, EngineConfig};
use crate::entity::{Drawable, Entity, EntityId, Updatable};
use crate::error::LoadError;
use crate::map::{parse_color, validate_map, MapData, MapObject, MapProvider};
use crate::tiles::{TileCache, TileLayer};
use crate::trigger::Trigger;

pub const INTERACTION_ANIMATION: &str = "Interaction";
pub const PLAYER_SPAWN: &str = "player_spawn";

const OBJECTS_GROUP: &str = "Objects";
const COLLISIONS_GROUP: &str = "Collisions";
const SPAWN_POINTS_GROUP: &str = "Spawn Points";
const LIGHTING_GROUP: &str = "Lighting";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelOptions {
    pub scale: f64,
    pub world_object_frame_time_ns: u64,
}

impl Default for LevelOptions {
    fn default() -> Self {
        LevelOptions::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for LevelOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            scale: config.sprite_scale,
            world_object_frame_time_ns: config.world_object_frame_time_ns(),
        }
    }
}

/// Deferred requests from trigger callbacks, applied by the level between
/// trigger resolution and drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelCommand {
    PlayAnimation { target: EntityId, animation: String },
}

pub struct Level {
    name: String,
    layers: Vec<TileLayer>,
    tile_cache: TileCache,
    sprites: Vec<Entity>,
    actors: Vec<Entity>,
    collision_rects: Vec<Rectangle>,
    player_spawn: Option<Point2>,
    lights: Vec<PointLight>,
    next_id: u64,
    commands_tx: Sender<LevelCommand>,
    commands_rx: Receiver<LevelCommand>,
}

impl Level {
    pub fn load(
        name: &str,
        maps: &dyn MapProvider,
        assets: &dyn AssetProvider,
        options: &LevelOptions,
    ) -> Result<Self, LoadError> {
        let map = maps.map(name)?;
        validate_map(&map).map_err(|reason| LoadError::MalformedMap {
            map: name.to_string(),
            reason,
        })?;

        let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
        let mut level = Self {
            name: name.to_string(),
            layers: Vec::with_capacity(map.layers.len()),
            tile_cache: TileCache::new(options.scale),
            sprites: Vec::new(),
            actors: Vec::new(),
            collision_rects: Vec::new(),
            player_spawn: None,
            lights: Vec::new(),
            next_id: 0,
            commands_tx,
            commands_rx,
        };
        level.load_layers(&map, assets)?;
        level.load_objects(&map, assets, options)?;

        if level.player_spawn.is_none() {
            log::warn!("Level '{name}' has no '{PLAYER_SPAWN}' spawn point");
        }
        log::info!(
            "Loaded level '{}': {} layers, {} sprites, {} collision rects, {} lights, {} tiles",
            level.name,
            level.layers.len(),
            level.sprites.len(),
            level.collision_rects.len(),
            level.lights.len(),
            level.tile_cache.len()
        );
        Ok(level)
    }

    fn load_layers(&mut self, map: &MapData, assets: &dyn AssetProvider) -> Result<(), LoadError> {
        let source = assets.image(&map.tileset.image)?;
        for data in &map.layers {
            let layer = TileLayer::build(data, &map.tileset, &source, &mut self.tile_cache)?;
            self.layers.push(layer);
        }
        Ok(())
    }

    fn load_objects(
        &mut self,
        map: &MapData,
        assets: &dyn AssetProvider,
        options: &LevelOptions,
    ) -> Result<(), LoadError> {
        let scale = options.scale;
        for group in &map.object_groups {
            match group.name.as_str() {
                OBJECTS_GROUP => {
                    for object in &group.objects {
                        let descriptor = assets.sprite(&object.name)?;
                        let sprite = if descriptor.animated {
                            self.animated_object(object, &descriptor, assets, options)?
                        } else {
                            self.static_object(object, &descriptor, assets, scale)?
                        };
                        self.sprites.push(sprite);
                    }
                }
                COLLISIONS_GROUP => {
                    for object in &group.objects {
                        self.collision_rects.push(Rectangle::new(
                            (object.x * scale) as i32,
                            (object.y * scale) as i32,
                            (object.width * scale) as i32,
                            (object.height * scale) as i32,
                        ));
                    }
                }
                SPAWN_POINTS_GROUP => {
                    for object in &group.objects {
                        if object.name == PLAYER_SPAWN {
                            self.player_spawn = Some(Point2::new(
                                (object.x * scale) as i32,
                                (object.y * scale) as i32,
                            ));
                        } else {
                            log::debug!("Ignoring spawn point '{}'", object.name);
                        }
                    }
                }
                LIGHTING_GROUP => {
                    for object in &group.objects {
                        let light = parse_light(object, scale).map_err(|reason| {
                            LoadError::MalformedMap {
                                map: self.name.clone(),
                                reason,
                            }
                        })?;
                        self.lights.push(light);
                    }
                }
                other => log::warn!(
                    "Level '{}': skipping unknown object group '{}'",
                    self.name,
                    other
                ),
            }
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn static_object(
        &mut self,
        object: &MapObject,
        descriptor: &SpriteDescriptor,
        assets: &dyn AssetProvider,
        scale: f64,
    ) -> Result<Entity, LoadError> {
        let images = scaled_images(&descriptor.images, assets, scale)?;
        let mut sprite =
            Entity::new(object_position(object, scale), images).with_name(&object.name);
        if let Some(bb) = descriptor.collision_box {
            sprite = sprite.with_bounding_box(bb.scaled(scale));
        }
        if let Some(tb) = descriptor.trigger_box {
            sprite = sprite.with_trigger(Trigger::new(tb.scaled(scale)));
        }
        sprite.assign_id(self.allocate_id());
        Ok(sprite)
    }

    fn animated_object(
        &mut self,
        object: &MapObject,
        descriptor: &SpriteDescriptor,
        assets: &dyn AssetProvider,
        options: &LevelOptions,
    ) -> Result<Entity, LoadError> {
        let frames = scaled_images(&descriptor.images, assets, options.scale)?;
        let still = frames.first().cloned().into_iter().collect();
        let animation = Animation::new(
            INTERACTION_ANIMATION,
            vec![frames],
            options.world_object_frame_time_ns,
            false,
        )
        .map_err(|source| LoadError::animation(&object.name, source))?;

        let id = self.allocate_id();
        let mut sprite = Entity::new(object_position(object, options.scale), still)
            .with_name(&object.name)
            .with_animation(animation);
        if let Some(bb) = descriptor.collision_box {
            sprite = sprite.with_bounding_box(bb.scaled(options.scale));
        }
        if let Some(tb) = descriptor.trigger_box {
            let commands = self.commands_tx.clone();
            let trigger = Trigger::new(tb.scaled(options.scale)).with_callback(move || {
                // Send only fails once the level is gone.
                let _ = commands.send(LevelCommand::PlayAnimation {
                    target: id,
                    animation: INTERACTION_ANIMATION.to_string(),
                });
            });
            sprite = sprite.with_trigger(trigger);
        }
        sprite.assign_id(id);
        Ok(sprite)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pixel size of the first tile layer.
    pub fn size(&self) -> (u32, u32) {
        self.layers.first().map(TileLayer::size).unwrap_or((0, 0))
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn player_spawn(&self) -> Option<Point2> {
        self.player_spawn
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn sprites(&self) -> &[Entity] {
        &self.sprites
    }

    pub fn actors(&self) -> &[Entity] {
        &self.actors
    }

    pub fn static_collision_rects(&self) -> &[Rectangle] {
        &self.collision_rects
    }

    pub fn tile_cache(&self) -> &TileCache {
        &self.tile_cache
    }

    pub fn add_actor(&mut self, mut actor: Entity) -> EntityId {
        let id = self.allocate_id();
        actor.assign_id(id);
        self.actors.push(actor);
        id
    }

    pub fn remove_actor(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.actors.iter().position(|actor| actor.id() == Some(id))?;
        Some(self.actors.remove(index))
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.sprites
            .iter()
            .chain(self.actors.iter())
            .find(|entity| entity.id() == Some(id))
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.sprites
            .iter_mut()
            .chain(self.actors.iter_mut())
            .find(|entity| entity.id() == Some(id))
    }

    fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.sprites.iter().chain(self.actors.iter())
    }

    /// Positioned boxes of every boxed entity except `exclude`, followed by
    /// the static collision rectangles.
    pub fn collision_rects(&self, exclude: Option<EntityId>) -> Vec<Rectangle> {
        self.entities()
            .filter(|entity| exclude.is_none() || entity.id() != exclude)
            .filter_map(Entity::positioned_bounding_box)
            .chain(self.collision_rects.iter().copied())
            .collect()
    }

    /// Every entity carrying a trigger, except `exclude`.
    pub fn trigger_entities(&self, exclude: Option<EntityId>) -> Vec<&Entity> {
        self.entities()
            .filter(|entity| exclude.is_none() || entity.id() != exclude)
            .filter(|entity| entity.trigger().is_some())
            .collect()
    }

    pub fn command_sender(&self) -> Sender<LevelCommand> {
        self.commands_tx.clone()
    }

    /// Apply every queued command. Returns how many were applied.
    pub fn apply_commands(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.commands_rx.try_recv() {
            match command {
                LevelCommand::PlayAnimation { target, animation } => {
                    match self.entity_mut(target) {
                        Some(entity) => {
                            entity.play_animation(&animation);
                        }
                        None => {
                            log::debug!("Dropping animation request for removed entity {target:?}")
                        }
                    }
                }
            }
            applied += 1;
        }
        applied
    }

    pub fn update_entities(&mut self, dt_ns: u64) {
        for sprite in &mut self.sprites {
            sprite.update(dt_ns);
        }
        for actor in &mut self.actors {
            actor.update(dt_ns);
        }
    }

    /// Sprites and actors in draw order: ascending depth key, ties keep
    /// sprites before actors and otherwise insertion order.
    pub fn draw_order(&self) -> Vec<&Entity> {
        let mut ordered: Vec<&Entity> = self.entities().collect();
        ordered.sort_by_key(|entity| entity.depth_key());
        ordered
    }

    pub fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera, debug: &DebugConfig) {
        let origin = camera.apply(Point2::ZERO);
        for layer in &self.layers {
            canvas.draw_image(layer.image(), origin);
        }
        for entity in self.draw_order() {
            if camera.is_visible(&entity.draw_bounds()) {
                entity.draw(canvas, camera, debug);
            }
        }
    }
}

fn object_position(object: &MapObject, scale: f64) -> DVec2 {
    DVec2::new(
        ((object.x as i32) as f64 * scale) as i32 as f64,
        ((object.y as i32) as f64 * scale) as i32 as f64,
    )
}

fn scaled_images(
    names: &[String],
    assets: &dyn AssetProvider,
    scale: f64,
) -> Result<Vec<ImageHandle>, LoadError> {
    names
        .iter()
        .map(|name| {
            let image = assets.image(name)?;
            Ok(ImageHandle::new(scale_image(&image, scale)))
        })
        .collect()
}

fn parse_light(object: &MapObject, scale: f64) -> Result<PointLight, String> {
    let radius = object.number("radius").unwrap_or(0.0) as i32;
    let strength = object.number("strength").unwrap_or(0.0);
    let color = object
        .text("color")
        .ok_or_else(|| format!("light at ({}, {}) has no color", object.x, object.y))
        .and_then(parse_color)?;
    Ok(PointLight::new(
        DVec2::new(
            (object.x * scale) as i32 as f64,
            (object.y * scale) as i32 as f64,
        ),
        color,
        strength,
        (radius as f64 * scale) as i32 as f64,
    ))
}
