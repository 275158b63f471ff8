//! Drawing seam between the scene and whatever presents pixels.
//!
//! The scene only ever blits decoded RGBA images at integer screen positions
//! and, for debug views, outlines rectangles. `ImageCanvas` implements that
//! on an in-memory `RgbaImage`; a window backend implements the same trait.

use haven_core::{Point2, Rectangle};
use image::{imageops, Rgba, RgbaImage};

pub trait Canvas {
    fn size(&self) -> (u32, u32);

    /// Alpha-blend `image` with its top-left corner at `at` (screen space).
    fn draw_image(&mut self, image: &RgbaImage, at: Point2);

    /// Draw a one-pixel outline of `rect` (screen space).
    fn draw_rect_outline(&mut self, rect: Rectangle, color: Rgba<u8>);
}

/// A canvas that renders into an owned `RgbaImage`.
pub struct ImageCanvas {
    target: RgbaImage,
}

impl ImageCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        }
    }

    pub fn clear(&mut self, color: Rgba<u8>) {
        for pixel in self.target.pixels_mut() {
            *pixel = color;
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.target
    }

    pub fn into_image(self) -> RgbaImage {
        self.target
    }

    fn put_clipped(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.target.width() && (y as u32) < self.target.height()
        {
            self.target.put_pixel(x as u32, y as u32, color);
        }
    }
}

impl Canvas for ImageCanvas {
    fn size(&self) -> (u32, u32) {
        self.target.dimensions()
    }

    fn draw_image(&mut self, image: &RgbaImage, at: Point2) {
        imageops::overlay(&mut self.target, image, at.x as i64, at.y as i64);
    }

    fn draw_rect_outline(&mut self, rect: Rectangle, color: Rgba<u8>) {
        if rect.width == 0 || rect.height == 0 {
            return;
        }
        let right = rect.right() - 1;
        let bottom = rect.bottom() - 1;
        for x in rect.x..=right {
            self.put_clipped(x, rect.y, color);
            self.put_clipped(x, bottom, color);
        }
        for y in rect.y..=bottom {
            self.put_clipped(rect.x, y, color);
            self.put_clipped(right, y, color);
        }
    }
}
