//! Positioned drawable units and their optional components.
//!
//! An entity always has a position, a size and a stack of static images.
//! Animation, a collision box and a trigger are optional and attached per
//! entity: a tree has a box, a chest has a box, an animation and a trigger,
//! the player has a box and a set of locomotion animations.

use std::collections::HashMap;

use glam::DVec2;
use haven_core::{Animation, Point2, Rectangle};
use haven_render::{Camera, Canvas};
use image::Rgba;

use crate::assets::ImageHandle;
use crate::config::DebugConfig;
use crate::trigger::Trigger;

pub type SpriteAnimation = Animation<ImageHandle>;

const BOUNDING_BOX_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const TRIGGER_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u64);

impl EntityId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Where `position` sits on the drawn image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawOrigin {
    #[default]
    TopLeft,
    Center,
}

pub trait Updatable {
    fn update(&mut self, dt_ns: u64);
}

pub trait Drawable {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera, debug: &DebugConfig);
}

/// Named animations and the one currently playing.
#[derive(Debug, Default)]
pub struct AnimationSet {
    animations: HashMap<String, SpriteAnimation>,
    current: Option<String>,
}

impl AnimationSet {
    pub fn insert(&mut self, animation: SpriteAnimation) {
        self.animations
            .insert(animation.name().to_string(), animation);
    }

    pub fn get(&self, name: &str) -> Option<&SpriteAnimation> {
        self.animations.get(name)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&SpriteAnimation> {
        self.current
            .as_deref()
            .and_then(|name| self.animations.get(name))
    }

    fn current_mut(&mut self) -> Option<&mut SpriteAnimation> {
        match self.current.as_deref() {
            Some(name) => self.animations.get_mut(name),
            None => None,
        }
    }

    /// Switch to `name` and restart it. Requesting the animation already
    /// selected does nothing; an unfinished non-cancellable animation blocks
    /// the switch. Returns whether `name` is now the current animation.
    pub fn play(&mut self, name: &str) -> bool {
        if self.current.as_deref() == Some(name) {
            return true;
        }
        if !self.animations.contains_key(name) {
            log::debug!("Ignoring request for unknown animation '{name}'");
            return false;
        }
        if let Some(running) = self.current() {
            if !running.can_cancel() && !running.is_done() {
                log::debug!(
                    "Ignoring switch to '{}': '{}' cannot be cancelled",
                    name,
                    running.name()
                );
                return false;
            }
        }
        self.current = Some(name.to_string());
        if let Some(animation) = self.current_mut() {
            animation.reset();
        }
        true
    }

    pub fn stop(&mut self) {
        if let Some(animation) = self.current_mut() {
            animation.reset();
        }
        self.current = None;
    }

    pub fn update(&mut self, dt_ns: u64) {
        if let Some(animation) = self.current_mut() {
            animation.update(dt_ns);
        }
    }
}

#[derive(Debug)]
pub struct Entity {
    id: Option<EntityId>,
    name: Option<String>,
    position: DVec2,
    width: i32,
    height: i32,
    images: Vec<ImageHandle>,
    animations: Option<AnimationSet>,
    draw_origin: DrawOrigin,
    bounding_box: Option<Rectangle>,
    trigger: Option<Trigger>,
}

impl Entity {
    /// An entity drawn as `images` stacked bottom to top; its size is that
    /// of the first image.
    pub fn new(position: DVec2, images: Vec<ImageHandle>) -> Self {
        let (width, height) = images
            .first()
            .map(|image| (image.width() as i32, image.height() as i32))
            .unwrap_or((0, 0));
        Self {
            id: None,
            name: None,
            position,
            width,
            height,
            images,
            animations: None,
            draw_origin: DrawOrigin::TopLeft,
            bounding_box: None,
            trigger: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width.max(0);
        self.height = height.max(0);
        self
    }

    pub fn with_draw_origin(mut self, origin: DrawOrigin) -> Self {
        self.draw_origin = origin;
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: Rectangle) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn with_animation(mut self, animation: SpriteAnimation) -> Self {
        self.add_animation(animation);
        self
    }

    pub fn add_animation(&mut self, animation: SpriteAnimation) {
        self.animations
            .get_or_insert_with(AnimationSet::default)
            .insert(animation);
    }

    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn set_position(&mut self, position: DVec2) {
        self.position = position;
    }

    /// Position truncated to whole pixels.
    pub fn pixel_position(&self) -> Point2 {
        Point2::new(self.position.x as i32, self.position.y as i32)
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn bounding_box(&self) -> Option<Rectangle> {
        self.bounding_box
    }

    pub fn trigger(&self) -> Option<&Trigger> {
        self.trigger.as_ref()
    }

    pub fn set_trigger(&mut self, trigger: Option<Trigger>) {
        self.trigger = trigger;
    }

    pub fn animations(&self) -> Option<&AnimationSet> {
        self.animations.as_ref()
    }

    pub fn current_animation(&self) -> Option<&str> {
        self.animations.as_ref().and_then(AnimationSet::current_name)
    }

    /// See `AnimationSet::play`. False for entities without animations.
    pub fn play_animation(&mut self, name: &str) -> bool {
        match &mut self.animations {
            Some(set) => set.play(name),
            None => false,
        }
    }

    pub fn stop_animation(&mut self) {
        if let Some(set) = &mut self.animations {
            set.stop();
        }
    }

    /// Images to draw this frame, bottom layer first.
    pub fn current_images(&self) -> &[ImageHandle] {
        match self.animations.as_ref().and_then(AnimationSet::current) {
            Some(animation) => animation.current_frame(),
            None => &self.images,
        }
    }

    /// Draw-order key: the bottom edge of the collision box if there is one,
    /// else the bottom edge of the sprite.
    pub fn depth_key(&self) -> i32 {
        match self.bounding_box {
            Some(bb) => (self.position.y + (bb.y + bb.height) as f64) as i32,
            None => (self.position.y + self.height as f64) as i32,
        }
    }

    fn offset_box(&self, rect: Rectangle) -> Rectangle {
        Rectangle::new(
            (self.position.x + rect.x as f64) as i32,
            (self.position.y + rect.y as f64) as i32,
            rect.width,
            rect.height,
        )
    }

    pub fn positioned_bounding_box(&self) -> Option<Rectangle> {
        self.bounding_box.map(|bb| self.offset_box(bb))
    }

    pub fn positioned_trigger_box(&self) -> Option<Rectangle> {
        self.trigger
            .as_ref()
            .map(|trigger| self.offset_box(trigger.bounding_box()))
    }

    /// World-space rectangle covered by the drawn images.
    pub fn draw_bounds(&self) -> Rectangle {
        let origin = self.pixel_position();
        let top_left = match self.draw_origin {
            DrawOrigin::TopLeft => origin,
            DrawOrigin::Center => origin - Point2::new(self.width / 2, self.height / 2),
        };
        Rectangle::new(top_left.x, top_left.y, self.width, self.height)
    }
}

impl Updatable for Entity {
    fn update(&mut self, dt_ns: u64) {
        if let Some(set) = &mut self.animations {
            set.update(dt_ns);
        }
    }
}

impl Drawable for Entity {
    fn draw(&self, canvas: &mut dyn Canvas, camera: &Camera, debug: &DebugConfig) {
        if debug.show_sprites {
            let at = camera.apply(self.draw_bounds().position());
            for image in self.current_images() {
                canvas.draw_image(image, at);
            }
        }
        if debug.show_bounding_boxes {
            if let Some(rect) = self.positioned_bounding_box() {
                let at = camera.apply(rect.position());
                canvas.draw_rect_outline(
                    Rectangle::new(at.x, at.y, rect.width, rect.height),
                    BOUNDING_BOX_COLOR,
                );
            }
        }
        if debug.show_triggers {
            if let Some(rect) = self.positioned_trigger_box() {
                let at = camera.apply(rect.position());
                canvas.draw_rect_outline(
                    Rectangle::new(at.x, at.y, rect.width, rect.height),
                    TRIGGER_COLOR,
                );
            }
        }
    }
}
