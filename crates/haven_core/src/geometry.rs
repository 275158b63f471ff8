//! Integer 2D geometry: points, axis-aligned rectangles and the
//! side-resolving intersection test used by collision push-out.
//!
//! `Rectangle::intersects` reports not only whether two boxes overlap but
//! also which side of `self` was penetrated the least. Controllers use that
//! side to push an actor out along a single axis.

use serde::Deserialize;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct Point2 {
    pub x: i32,
    pub y: i32,
}

impl Point2 {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<i32> for Point2 {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<i32> for Point2 {
    type Output = Self;

    fn div(self, rhs: i32) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The side of a rectangle that another rectangle has crossed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// Evaluation order for tie-breaking between equal penetration depths.
    pub const ORDER: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    pub fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Result of `Rectangle::intersects`. `side` is `Some` exactly when
/// `intersects` is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intersection {
    pub intersects: bool,
    pub side: Option<Side>,
}

impl Intersection {
    pub const NONE: Self = Self {
        intersects: false,
        side: None,
    };

    fn on(side: Side) -> Self {
        Self {
            intersects: true,
            side: Some(side),
        }
    }
}

/// Axis-aligned rectangle with integer coordinates. Width and height are
/// never negative; constructors clamp them to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "RectangleJson")]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Deserialize)]
struct RectangleJson {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl From<RectangleJson> for Rectangle {
    fn from(json: RectangleJson) -> Self {
        Rectangle::new(json.x, json.y, json.width, json.height)
    }
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    pub fn from_corners(start: Point2, end: Point2) -> Self {
        Self::new(start.x, start.y, end.x - start.x, end.y - start.y)
    }

    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn translated(&self, offset: Point2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Uniformly scales position and size, truncating toward zero.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(
            (self.x as f64 * factor) as i32,
            (self.y as f64 * factor) as i32,
            (self.width as f64 * factor) as i32,
            (self.height as f64 * factor) as i32,
        )
    }

    /// AABB overlap test. On overlap the side of `self` with the smallest
    /// penetration depth is reported; equal depths resolve in the order
    /// Top, Bottom, Left, Right.
    pub fn intersects(&self, other: &Rectangle) -> Intersection {
        let overlaps = self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y;
        if !overlaps {
            return Intersection::NONE;
        }

        let depths = [
            other.bottom() - self.y,
            self.bottom() - other.y,
            other.right() - self.x,
            self.right() - other.x,
        ];

        // min_by_key keeps the first of several equal minima.
        let side = Side::ORDER
            .iter()
            .zip(depths)
            .min_by_key(|(_, depth)| *depth)
            .map(|(side, _)| *side)
            .unwrap_or(Side::Top);
        Intersection::on(side)
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rectangle{{x={}, y={}, width={}, height={}}}",
            self.x, self.y, self.width, self.height
        )
    }
}
