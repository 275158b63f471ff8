//! Light sources and the per-pixel lighting compositor.
//!
//! Lights do not blend additively. For every pixel each light reports the
//! colour it contributes there, the brightest contribution (mean of the RGB
//! channels) wins, and the overlay pixel becomes black with alpha
//! `255 - brightness`. Fully lit pixels are transparent; unlit ones opaque.
//!
//! The compositor is O(width x height x lights) and runs on the lighting
//! worker's cadence, never per render frame.

use glam::DVec2;
use image::{Rgb, Rgba, RgbaImage};

/// Constant colour x strength everywhere. Drives global ambient brightness.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub color: Rgb<u8>,
    pub strength: f64,
}

impl DirectionalLight {
    pub fn new(color: Rgb<u8>, strength: f64) -> Self {
        Self { color, strength }
    }

    pub fn color_at(&self, _x: i32, _y: i32) -> Rgb<u8> {
        scale_color(self.color, self.strength)
    }
}

/// Colour x strength with linear falloff to zero at `radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub position: DVec2,
    pub color: Rgb<u8>,
    pub strength: f64,
    pub radius: f64,
}

impl PointLight {
    pub fn new(position: DVec2, color: Rgb<u8>, strength: f64, radius: f64) -> Self {
        Self {
            position,
            color,
            strength,
            radius,
        }
    }

    pub fn color_at(&self, x: i32, y: i32) -> Rgb<u8> {
        let distance = DVec2::new(x as f64, y as f64).distance(self.position);
        if self.radius <= 0.0 || distance > self.radius {
            return Rgb([0, 0, 0]);
        }
        let factor = 1.0 - distance / self.radius;
        scale_color(self.color, self.strength * factor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Directional(DirectionalLight),
    Point(PointLight),
}

impl Light {
    pub fn color_at(&self, x: i32, y: i32) -> Rgb<u8> {
        match self {
            Self::Directional(light) => light.color_at(x, y),
            Self::Point(light) => light.color_at(x, y),
        }
    }

    pub fn strength(&self) -> f64 {
        match self {
            Self::Directional(light) => light.strength,
            Self::Point(light) => light.strength,
        }
    }

    pub fn set_strength(&mut self, strength: f64) {
        match self {
            Self::Directional(light) => light.strength = strength,
            Self::Point(light) => light.strength = strength,
        }
    }
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        Self::Directional(light)
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Self::Point(light)
    }
}

fn scale_color(color: Rgb<u8>, factor: f64) -> Rgb<u8> {
    let scale = |channel: u8| (channel as f64 * factor).clamp(0.0, 255.0) as u8;
    Rgb([scale(color[0]), scale(color[1]), scale(color[2])])
}

/// Mean of the three channels, rounded down.
pub fn brightness(color: Rgb<u8>) -> u8 {
    ((color[0] as u16 + color[1] as u16 + color[2] as u16) / 3) as u8
}

/// Brightness of the single brightest light at a pixel; 0 with no lights.
pub fn max_brightness_at(lights: &[Light], x: i32, y: i32) -> u8 {
    lights
        .iter()
        .map(|light| brightness(light.color_at(x, y)))
        .max()
        .unwrap_or(0)
}

/// Compute a `width x height` overlay whose alpha encodes darkness.
pub fn compute_light_map(lights: &[Light], width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let max = max_brightness_at(lights, x as i32, y as i32);
        Rgba([0, 0, 0, 255 - max])
    })
}
