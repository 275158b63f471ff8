//! The paper-doll player entity.
//!
//! Each layer (body, clothing, hair, ...) is a sprite sheet of square cells.
//! Rows hold the facings in the order Down, Up, Right, Left; each row holds
//! eight walk frames per variant, so variant `v` starts at column `8 * v`.
//! Idle animations are the first walk frame of each row.

use glam::DVec2;
use haven_core::{Animation, Point2};
use image::{imageops, RgbaImage};

use crate::assets::{scale_image, AssetProvider, ImageHandle};
use crate::config::PlayerConfig;
use crate::entity::{DrawOrigin, Entity, SpriteAnimation};
use crate::error::LoadError;
use crate::tiles::fits;

pub const WALK_FRAMES: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Down,
    Up,
    Right,
    Left,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::Down, Facing::Up, Facing::Right, Facing::Left];

    /// Sprite sheet row.
    pub fn row(self) -> u32 {
        match self {
            Facing::Down => 0,
            Facing::Up => 1,
            Facing::Right => 2,
            Facing::Left => 3,
        }
    }

    pub fn walk_animation(self) -> &'static str {
        match self {
            Facing::Down => "WalkDown",
            Facing::Up => "WalkUp",
            Facing::Right => "WalkRight",
            Facing::Left => "WalkLeft",
        }
    }

    pub fn idle_animation(self) -> &'static str {
        match self {
            Facing::Down => "IdleDown",
            Facing::Up => "IdleUp",
            Facing::Right => "IdleRight",
            Facing::Left => "IdleLeft",
        }
    }
}

pub fn build_player_entity(
    config: &PlayerConfig,
    scale: f64,
    spawn: Point2,
    assets: &dyn AssetProvider,
) -> Result<Entity, LoadError> {
    let mut walks: Vec<Vec<Vec<ImageHandle>>> = vec![Vec::new(); Facing::ALL.len()];
    let mut idles: Vec<Vec<Vec<ImageHandle>>> = vec![Vec::new(); Facing::ALL.len()];
    let mut stills = Vec::with_capacity(config.layers.len());

    for layer in &config.layers {
        let sheet = assets.image(&layer.image)?;
        let first_column = WALK_FRAMES
            .checked_mul(layer.variant)
            .filter(|first| first.checked_add(WALK_FRAMES).is_some())
            .ok_or_else(|| LoadError::CellOutOfBounds {
                name: layer.image.clone(),
                column: u32::MAX,
                row: 0,
            })?;
        for (slot, facing) in Facing::ALL.iter().enumerate() {
            let frames = (first_column..first_column + WALK_FRAMES)
                .map(|column| {
                    let cell = Cell {
                        column,
                        row: facing.row(),
                        size: config.cell_size,
                    };
                    cut_cell(&sheet, &layer.image, cell, scale)
                })
                .collect::<Result<Vec<_>, _>>()?;
            idles[slot].push(vec![ImageHandle::clone(&frames[0])]);
            if *facing == Facing::Down {
                stills.push(ImageHandle::clone(&frames[0]));
            }
            walks[slot].push(frames);
        }
    }

    let size = (config.cell_size as f64 * scale) as i32;
    let mut player = Entity::new(DVec2::new(spawn.x as f64, spawn.y as f64), stills)
        .with_name("player")
        .with_size(size, size)
        .with_draw_origin(DrawOrigin::Center)
        .with_bounding_box(config.bounding_box.scaled(scale));

    let frame_time = config.frame_time_ns();
    for ((facing, walk), idle) in Facing::ALL.iter().zip(walks).zip(idles) {
        player.add_animation(animation(facing.walk_animation(), walk, frame_time, true)?);
        player.add_animation(animation(facing.idle_animation(), idle, frame_time, false)?);
    }
    Ok(player)
}

fn animation(
    name: &str,
    layers: Vec<Vec<ImageHandle>>,
    frame_time_ns: u64,
    looping: bool,
) -> Result<SpriteAnimation, LoadError> {
    Animation::new(name, layers, frame_time_ns, looping).map_err(|e| LoadError::animation(name, e))
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    column: u32,
    row: u32,
    size: u32,
}

fn cut_cell(
    sheet: &RgbaImage,
    name: &str,
    cell: Cell,
    scale: f64,
) -> Result<ImageHandle, LoadError> {
    let out_of_bounds = || LoadError::CellOutOfBounds {
        name: name.to_string(),
        column: cell.column,
        row: cell.row,
    };
    let (Some(x), Some(y)) = (
        cell.column.checked_mul(cell.size),
        cell.row.checked_mul(cell.size),
    ) else {
        return Err(out_of_bounds());
    };
    if !fits(x, cell.size, sheet.width()) || !fits(y, cell.size, sheet.height()) {
        return Err(out_of_bounds());
    }
    let image = imageops::crop_imm(sheet, x, y, cell.size, cell.size).to_image();
    Ok(ImageHandle::new(scale_image(&image, scale)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assets::AssetStore;
    use crate::config::PlayerLayer;
    use haven_core::Rectangle;
    use image::Rgba;

    /// Sheet of 4x4 cells; red encodes the column, green the row.
    pub(crate) fn sheet(variants: u32) -> RgbaImage {
        RgbaImage::from_fn(4 * WALK_FRAMES * variants, 16, |x, y| {
            Rgba([(x / 4) as u8, (y / 4) as u8, 0, 255])
        })
    }

    pub(crate) fn player_config() -> PlayerConfig {
        PlayerConfig {
            speed: 80.0,
            frame_time_ms: 100,
            cell_size: 4,
            bounding_box: Rectangle::new(-1, 0, 2, 2),
            layers: vec![
                PlayerLayer {
                    image: "body".into(),
                    variant: 1,
                },
                PlayerLayer {
                    image: "hair".into(),
                    variant: 0,
                },
            ],
        }
    }

    pub(crate) fn player_assets() -> AssetStore {
        let mut assets = AssetStore::new();
        assets.insert_image("body", sheet(2));
        assets.insert_image("hair", sheet(1));
        assets
    }

    #[test]
    fn builds_all_eight_animations() {
        let spawn = Point2::new(5, 6);
        let player = build_player_entity(&player_config(), 1.0, spawn, &player_assets()).unwrap();
        let set = player.animations().unwrap();
        for facing in Facing::ALL {
            let walk = set.get(facing.walk_animation()).unwrap();
            assert_eq!(walk.frame_count(), 8);
            assert_eq!(walk.layer_count(), 2);
            assert!(walk.is_looping());
            let idle = set.get(facing.idle_animation()).unwrap();
            assert_eq!(idle.frame_count(), 1);
            assert!(!idle.is_looping());
        }
        assert_eq!(player.position(), DVec2::new(5.0, 6.0));
    }

    #[test]
    fn variant_selects_column_block_and_rows_select_facing() {
        let mut player =
            build_player_entity(&player_config(), 1.0, Point2::ZERO, &player_assets()).unwrap();
        player.play_animation("WalkLeft");
        let frame = player.current_images();
        // Body uses variant 1 (columns 8..16), hair variant 0.
        assert_eq!(frame[0].get_pixel(0, 0)[0], 8);
        assert_eq!(frame[1].get_pixel(0, 0)[0], 0);
        assert_eq!(frame[0].get_pixel(0, 0)[1], 3);
    }

    #[test]
    fn scale_applies_to_cells_box_and_size() {
        let player =
            build_player_entity(&player_config(), 2.0, Point2::ZERO, &player_assets()).unwrap();
        assert_eq!(player.size(), (8, 8));
        assert_eq!(player.bounding_box(), Some(Rectangle::new(-2, 0, 4, 4)));
        assert_eq!(player.current_images()[0].dimensions(), (8, 8));
        assert_eq!(player.draw_bounds(), Rectangle::new(-4, -4, 8, 8));
    }

    #[test]
    fn missing_variant_columns_are_reported() {
        let mut assets = player_assets();
        assets.insert_image("body", sheet(1));
        let err = build_player_entity(&player_config(), 1.0, Point2::ZERO, &assets).err();
        assert!(matches!(
            err,
            Some(LoadError::CellOutOfBounds { name, column: 8, row: 0 }) if name == "body"
        ));
    }

    #[test]
    fn huge_variant_or_cell_is_out_of_bounds() {
        let mut config = player_config();
        config.layers[1].variant = u32::MAX / 4;
        let err = build_player_entity(&config, 1.0, Point2::ZERO, &player_assets()).err();
        assert!(matches!(err, Some(LoadError::CellOutOfBounds { name, .. }) if name == "hair"));

        let mut config = player_config();
        config.cell_size = u32::MAX / 2;
        let err = build_player_entity(&config, 1.0, Point2::ZERO, &player_assets()).err();
        assert!(matches!(err, Some(LoadError::CellOutOfBounds { .. })));
    }

    #[test]
    fn missing_sheet_fails_fast() {
        let mut config = player_config();
        config.layers.push(PlayerLayer {
            image: "hat".into(),
            variant: 0,
        });
        let err = build_player_entity(&config, 1.0, Point2::ZERO, &player_assets()).err();
        assert!(matches!(err, Some(LoadError::MissingImage { name }) if name == "hat"));
    }
}
