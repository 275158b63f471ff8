//! Tile images and composited tile layers.
//!
//! `TileCache` crops and scales each (tileset, gid) once. It is filled while
//! a level loads and only read afterwards; it belongs to the level, so a new
//! map starts with an empty cache.

use std::collections::HashMap;
use std::sync::Arc;

use image::imageops;
use image::RgbaImage;

use crate::assets::{scale_image, ImageHandle};
use crate::error::LoadError;
use crate::map::{TileLayerData, TilesetRef};

#[derive(Debug)]
pub struct TileCache {
    scale: f64,
    tiles: HashMap<(String, u32), ImageHandle>,
}

impl TileCache {
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            tiles: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Scaled image of tile `gid` (1-based) from `source`.
    pub fn tile(
        &mut self,
        tileset: &TilesetRef,
        source: &RgbaImage,
        gid: u32,
    ) -> Result<ImageHandle, LoadError> {
        let key = (tileset.image.clone(), gid);
        if let Some(tile) = self.tiles.get(&key) {
            return Ok(Arc::clone(tile));
        }

        let invalid = || LoadError::InvalidTile {
            tileset: tileset.image.clone(),
            gid,
        };
        if gid == 0 || tileset.columns == 0 {
            return Err(invalid());
        }
        let column = (gid - 1) % tileset.columns;
        let row = (gid - 1) / tileset.columns;
        let (Some(x), Some(y)) = (
            column.checked_mul(tileset.tile_width),
            row.checked_mul(tileset.tile_height),
        ) else {
            return Err(invalid());
        };
        if !fits(x, tileset.tile_width, source.width())
            || !fits(y, tileset.tile_height, source.height())
        {
            return Err(invalid());
        }

        let cropped =
            imageops::crop_imm(source, x, y, tileset.tile_width, tileset.tile_height).to_image();
        let tile = Arc::new(scale_image(&cropped, self.scale));
        self.tiles.insert(key, Arc::clone(&tile));
        Ok(tile)
    }
}

/// True if `len` pixels starting at `start` stay within `limit`.
pub(crate) fn fits(start: u32, len: u32, limit: u32) -> bool {
    start.checked_add(len).is_some_and(|end| end <= limit)
}

/// One map layer flattened into a single image at load time.
#[derive(Debug)]
pub struct TileLayer {
    pub index: u32,
    pub name: String,
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    tiles: Vec<u32>,
    image: RgbaImage,
}

impl TileLayer {
    pub fn build(
        data: &TileLayerData,
        tileset: &TilesetRef,
        source: &RgbaImage,
        cache: &mut TileCache,
    ) -> Result<Self, LoadError> {
        let tile_width = (tileset.tile_width as f64 * cache.scale) as u32;
        let tile_height = (tileset.tile_height as f64 * cache.scale) as u32;
        let mut image = RgbaImage::new(data.width * tile_width, data.height * tile_height);

        for (cell, &gid) in data.tiles.iter().enumerate() {
            if gid == 0 {
                continue;
            }
            let tile = cache.tile(tileset, source, gid)?;
            let x = (cell as u32 % data.width) * tile_width;
            let y = (cell as u32 / data.width) * tile_height;
            imageops::replace(&mut image, tile.as_ref(), x as i64, y as i64);
        }

        Ok(Self {
            index: data.id,
            name: data.name.clone(),
            width: data.width,
            height: data.height,
            tile_width,
            tile_height,
            tiles: data.tiles.clone(),
            image,
        })
    }

    /// Pixel size after scaling.
    pub fn size(&self) -> (u32, u32) {
        (self.width * self.tile_width, self.height * self.tile_height)
    }

    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get((y * self.width + x) as usize).copied()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 2x2 tiles of 2x2 pixels, tile n filled with red channel 10*n.
    fn tileset_image() -> (TilesetRef, RgbaImage) {
        let tileset = TilesetRef {
            image: "tiles".into(),
            tile_width: 2,
            tile_height: 2,
            columns: 2,
        };
        let image = RgbaImage::from_fn(4, 4, |x, y| {
            let gid = (y / 2) * 2 + (x / 2) + 1;
            Rgba([(gid * 10) as u8, 0, 0, 255])
        });
        (tileset, image)
    }

    #[test]
    fn crops_by_gid() {
        let (tileset, source) = tileset_image();
        let mut cache = TileCache::new(1.0);
        let tile = cache.tile(&tileset, &source, 4).unwrap();
        assert_eq!(tile.dimensions(), (2, 2));
        assert_eq!(tile.get_pixel(0, 0)[0], 40);
        let tile = cache.tile(&tileset, &source, 2).unwrap();
        assert_eq!(tile.get_pixel(1, 1)[0], 20);
    }

    #[test]
    fn cache_reuses_tiles() {
        let (tileset, source) = tileset_image();
        let mut cache = TileCache::new(2.0);
        let a = cache.tile(&tileset, &source, 3).unwrap();
        let b = cache.tile(&tileset, &source, 3).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert_eq!(a.dimensions(), (4, 4));
    }

    #[test]
    fn out_of_range_gid_is_invalid() {
        let (tileset, source) = tileset_image();
        let mut cache = TileCache::new(1.0);
        assert!(matches!(
            cache.tile(&tileset, &source, 5),
            Err(LoadError::InvalidTile { gid: 5, .. })
        ));
        assert!(cache.tile(&tileset, &source, 0).is_err());
    }

    #[test]
    fn huge_gid_is_invalid_not_overflow() {
        let tileset = TilesetRef {
            image: "narrow".into(),
            tile_width: 2,
            tile_height: 2,
            columns: 1,
        };
        let source = RgbaImage::new(2, 2);
        let mut cache = TileCache::new(1.0);
        assert!(matches!(
            cache.tile(&tileset, &source, 4_000_000_000),
            Err(LoadError::InvalidTile { gid: 4_000_000_000, .. })
        ));
        assert!(matches!(
            cache.tile(&tileset, &source, u32::MAX),
            Err(LoadError::InvalidTile { .. })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn layer_composites_tiles_and_leaves_gaps_transparent() {
        let (tileset, source) = tileset_image();
        let mut cache = TileCache::new(1.5);
        let data = TileLayerData {
            id: 1,
            name: "Ground".into(),
            width: 2,
            height: 1,
            tiles: vec![0, 2],
        };
        let layer = TileLayer::build(&data, &tileset, &source, &mut cache).unwrap();
        assert_eq!(layer.tile_size(), (3, 3));
        assert_eq!(layer.size(), (6, 3));
        assert_eq!(layer.image().get_pixel(0, 0)[3], 0);
        assert_eq!(*layer.image().get_pixel(4, 1), Rgba([20, 0, 0, 255]));
        assert_eq!(layer.tile_at(1, 0), Some(2));
        assert_eq!(layer.tile_at(2, 0), None);
    }
}
