//! Decoded images and sprite descriptors, looked up by name.
//!
//! Decoding and descriptor parsing happen outside the engine; the level only
//! sees an `AssetProvider`. Lookups by unknown name are errors, never
//! placeholders.

use std::collections::HashMap;
use std::sync::Arc;

use haven_core::Rectangle;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::Deserialize;

use crate::error::LoadError;

pub type ImageHandle = Arc<RgbaImage>;

/// How a named sprite is built. Boxes are unscaled and relative to the
/// sprite's position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpriteDescriptor {
    /// Static: stacked layers drawn bottom to top. Animated: the frames of
    /// its single animation, in order.
    pub images: Vec<String>,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub collision_box: Option<Rectangle>,
    #[serde(default)]
    pub trigger_box: Option<Rectangle>,
}

impl SpriteDescriptor {
    pub fn single(image: impl Into<String>) -> Self {
        Self {
            images: vec![image.into()],
            animated: false,
            collision_box: None,
            trigger_box: None,
        }
    }

    pub fn animated(frames: Vec<String>) -> Self {
        Self {
            images: frames,
            animated: true,
            collision_box: None,
            trigger_box: None,
        }
    }

    pub fn with_collision_box(mut self, rect: Rectangle) -> Self {
        self.collision_box = Some(rect);
        self
    }

    pub fn with_trigger_box(mut self, rect: Rectangle) -> Self {
        self.trigger_box = Some(rect);
        self
    }
}

pub trait AssetProvider {
    fn image(&self, name: &str) -> Result<ImageHandle, LoadError>;
    fn sprite(&self, name: &str) -> Result<SpriteDescriptor, LoadError>;
}

#[derive(Debug, Default, Clone)]
pub struct AssetStore {
    images: HashMap<String, ImageHandle>,
    sprites: HashMap<String, SpriteDescriptor>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_image(&mut self, name: impl Into<String>, image: RgbaImage) {
        self.images.insert(name.into(), Arc::new(image));
    }

    pub fn insert_sprite(&mut self, name: impl Into<String>, descriptor: SpriteDescriptor) {
        self.sprites.insert(name.into(), descriptor);
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }
}

impl AssetProvider for AssetStore {
    fn image(&self, name: &str) -> Result<ImageHandle, LoadError> {
        self.images
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::MissingImage {
                name: name.to_string(),
            })
    }

    fn sprite(&self, name: &str) -> Result<SpriteDescriptor, LoadError> {
        self.sprites
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::MissingSprite {
                name: name.to_string(),
            })
    }
}

/// Nearest-neighbour resize by `scale`, truncating the target size.
pub fn scale_image(image: &RgbaImage, scale: f64) -> RgbaImage {
    let width = (image.width() as f64 * scale) as u32;
    let height = (image.height() as f64 * scale) as u32;
    if (width, height) == image.dimensions() {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn unknown_names_fail_fast() {
        let store = AssetStore::new();
        assert!(matches!(
            store.image("nope"),
            Err(LoadError::MissingImage { name }) if name == "nope"
        ));
        assert!(matches!(
            store.sprite("nope"),
            Err(LoadError::MissingSprite { name }) if name == "nope"
        ));
    }

    #[test]
    fn images_are_shared_not_copied() {
        let mut store = AssetStore::new();
        store.insert_image("rock", RgbaImage::new(4, 4));
        let a = store.image("rock").unwrap();
        let b = store.image("rock").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn scale_image_uses_nearest_neighbour() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let scaled = scale_image(&image, 2.5);
        assert_eq!(scaled.dimensions(), (5, 2));
        assert_eq!(*scaled.get_pixel(0, 1), Rgba([255, 0, 0, 255]));
        assert_eq!(*scaled.get_pixel(4, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn descriptor_records_deserialize_with_defaults() {
        let well: SpriteDescriptor = serde_json::from_str(
            r#"{
              "images": ["well_base", "well_roof"],
              "collision_box": { "x": 0, "y": 8, "width": 16, "height": 8 },
              "trigger_box": { "x": -4, "y": 4, "width": 24, "height": 16 }
            }"#,
        )
        .expect("descriptor should parse");
        assert!(!well.animated);
        assert_eq!(well.collision_box, Some(Rectangle::new(0, 8, 16, 8)));
        assert_eq!(well.trigger_box, Some(Rectangle::new(-4, 4, 24, 16)));

        let chest: SpriteDescriptor =
            serde_json::from_str(r#"{ "images": ["chest_0", "chest_1"], "animated": true }"#)
                .expect("descriptor should parse");
        assert_eq!(chest, SpriteDescriptor::animated(vec!["chest_0".into(), "chest_1".into()]));
    }
}
