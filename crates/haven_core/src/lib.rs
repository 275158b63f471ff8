//! Engine-independent building blocks: integer geometry, the multi-layer
//! animation compositor, keyboard state and frame pacing.

pub mod animation;
pub mod geometry;
pub mod input;
pub mod time;

pub use animation::{Animation, AnimationError};
pub use geometry::{Intersection, Point2, Rectangle, Side};
pub use input::{InputState, Key, KeySet};
pub use time::FrameClock;
