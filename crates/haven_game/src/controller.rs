//! Keyboard-driven movement for one actor, with push-out collision and
//! trigger firing against the level.

use glam::DVec2;
use haven_core::{InputState, Key, Rectangle, Side};

use crate::entity::{Entity, EntityId};
use crate::level::Level;
use crate::player::Facing;

const LEFT_KEYS: [Key; 2] = [Key::A, Key::Left];
const RIGHT_KEYS: [Key; 2] = [Key::D, Key::Right];
const UP_KEYS: [Key; 2] = [Key::W, Key::Up];
const DOWN_KEYS: [Key; 2] = [Key::S, Key::Down];

/// What one `update` did, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub collisions_resolved: usize,
    pub triggers_fired: usize,
    pub commands_applied: usize,
}

#[derive(Debug)]
pub struct PlayerController {
    entity: EntityId,
    speed: f64,
    /// Per-axis input, each component -1, 0 or 1.
    direction: DVec2,
    facing: Facing,
}

impl PlayerController {
    pub fn new(entity: EntityId, speed: f64) -> Self {
        Self {
            entity,
            speed,
            direction: DVec2::ZERO,
            facing: Facing::Down,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn direction(&self) -> DVec2 {
        self.direction
    }

    pub fn move_horizontal(&mut self, axis: f64) {
        self.direction.x = axis;
        self.facing = if axis > 0.0 { Facing::Right } else { Facing::Left };
    }

    pub fn move_vertical(&mut self, axis: f64) {
        self.direction.y = axis;
        self.facing = if axis > 0.0 { Facing::Down } else { Facing::Up };
    }

    /// Zero the stopped axes; when both stop, play the idle animation for
    /// the current facing.
    pub fn stop_moving(&mut self, horizontal: bool, vertical: bool, actor: &mut Entity) {
        if horizontal {
            self.direction.x = 0.0;
        }
        if vertical {
            self.direction.y = 0.0;
        }
        if horizontal && vertical {
            actor.play_animation(self.facing.idle_animation());
        }
    }

    /// Map held keys to movement and the walk animation. Keys are checked in
    /// the order left, right, up, down; a later key on the same axis wins the
    /// movement but the first key held picks the animation.
    pub fn handle_input(&mut self, input: &InputState, actor: &mut Entity) {
        let mut moving_horizontal = false;
        let mut moving_vertical = false;
        let mut animation: Option<Facing> = None;

        if input.any_held(&LEFT_KEYS) {
            self.move_horizontal(-1.0);
            moving_horizontal = true;
            animation.get_or_insert(Facing::Left);
        }
        if input.any_held(&RIGHT_KEYS) {
            self.move_horizontal(1.0);
            moving_horizontal = true;
            animation.get_or_insert(Facing::Right);
        }
        if input.any_held(&UP_KEYS) {
            self.move_vertical(-1.0);
            moving_vertical = true;
            animation.get_or_insert(Facing::Up);
        }
        if input.any_held(&DOWN_KEYS) {
            self.move_vertical(1.0);
            moving_vertical = true;
            animation.get_or_insert(Facing::Down);
        }

        if let Some(facing) = animation {
            actor.play_animation(facing.walk_animation());
        }
        self.stop_moving(!moving_horizontal, !moving_vertical, actor);
    }

    /// Integrate movement, push out of obstacles, fire overlapping triggers
    /// and apply the commands they queued.
    pub fn update(&mut self, dt_ns: u64, level: &mut Level) -> TickReport {
        let mut report = TickReport::default();
        let obstacles = level.collision_rects(Some(self.entity));
        let Some(actor) = level.entity_mut(self.entity) else {
            log::warn!("Controlled entity {:?} is not in the level", self.entity);
            return report;
        };

        let dt_s = dt_ns as f64 / 1e9;
        let mut position = actor.position() + self.direction * self.speed * dt_s;
        let Some(bounding_box) = actor.bounding_box() else {
            actor.set_position(position);
            return report;
        };
        report.collisions_resolved = resolve_collisions(&mut position, bounding_box, &obstacles);
        actor.set_position(position);

        let own_box = positioned_box(position, bounding_box);
        for other in level.trigger_entities(Some(self.entity)) {
            let (Some(trigger), Some(zone)) = (other.trigger(), other.positioned_trigger_box())
            else {
                continue;
            };
            if own_box.intersects(&zone).intersects {
                trigger.fire();
                report.triggers_fired += 1;
            }
        }

        report.commands_applied = level.apply_commands();
        report
    }
}

fn positioned_box(position: DVec2, bounding_box: Rectangle) -> Rectangle {
    Rectangle::new(
        (position.x + bounding_box.x as f64) as i32,
        (position.y + bounding_box.y as f64) as i32,
        bounding_box.width,
        bounding_box.height,
    )
}

/// Push `position` out of each obstacle in turn along the side of least
/// penetration. Obstacles are handled one at a time in order, each against
/// the box as corrected by the ones before it, so the result can depend on
/// the order when several overlap at once. Returns how many corrections were
/// applied.
pub fn resolve_collisions(
    position: &mut DVec2,
    bounding_box: Rectangle,
    obstacles: &[Rectangle],
) -> usize {
    let mut corrections = 0;
    for other in obstacles {
        let current = positioned_box(*position, bounding_box);
        let intersection = current.intersects(other);
        let Some(side) = intersection.side else {
            continue;
        };
        match side {
            Side::Left => position.x = (other.right() - bounding_box.x) as f64,
            Side::Right => position.x = (other.x - bounding_box.x - bounding_box.width) as f64,
            Side::Top => position.y = (other.bottom() - bounding_box.y) as f64,
            Side::Bottom => position.y = (other.y - bounding_box.y - bounding_box.height) as f64,
        }
        corrections += 1;
    }
    corrections
}
