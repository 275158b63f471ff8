//! Headless demo: builds a small procedural world in memory, walks the player
//! around it with scripted input and writes the last frame to a PNG.
//!
//! Usage: `haven_game [config.json] [output.png]`. Without a config file a
//! small-viewport default is used.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use haven_core::{InputState, Key, Rectangle};
use haven_game::map::{MapObject, ObjectGroup, PropertyValue, TileLayerData, TilesetRef};
use haven_game::{
    load_config_from_path, AssetStore, DayNightConfig, EngineConfig, InputSource, MapData,
    MapStore, PlayerConfig, PlayerLayer, Session, SpriteDescriptor,
};
use haven_render::{ImageCanvas, TimeOfDay};
use image::{Rgba, RgbaImage};

const LEVEL_NAME: &str = "Meadow";
const DEFAULT_OUTPUT: &str = "haven_demo.png";
const TILE_SIZE: u32 = 16;
const MAP_COLUMNS: u32 = 20;
const MAP_ROWS: u32 = 12;

/// Plays back a fixed list of (frames, held keys) steps, then holds Escape.
struct ScriptedInput {
    steps: Vec<(u32, Vec<Key>)>,
    step: usize,
    frame_in_step: u32,
}

impl ScriptedInput {
    fn new(steps: Vec<(u32, Vec<Key>)>) -> Self {
        Self {
            steps,
            step: 0,
            frame_in_step: 0,
        }
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, input: &mut InputState) {
        input.release_all();
        while let Some((frames, keys)) = self.steps.get(self.step) {
            if self.frame_in_step < *frames {
                self.frame_in_step += 1;
                for key in keys {
                    input.key_down(*key);
                }
                return;
            }
            self.step += 1;
            self.frame_in_step = 0;
        }
        input.key_down(Key::Escape);
    }
}

fn demo_config() -> EngineConfig {
    EngineConfig {
        viewport_width: 320,
        viewport_height: 240,
        frame_interval_ms: 16,
        lighting_interval_ms: 100,
        sprite_scale: 2.0,
        player: PlayerConfig {
            cell_size: 16,
            bounding_box: Rectangle::new(-4, 2, 8, 6),
            layers: vec![
                PlayerLayer {
                    image: "body".into(),
                    variant: 0,
                },
                PlayerLayer {
                    image: "hair".into(),
                    variant: 1,
                },
            ],
            ..PlayerConfig::default()
        },
        day_night: Some(DayNightConfig {
            transition_rate: 0.5,
            ..DayNightConfig::default()
        }),
        ..EngineConfig::default()
    }
}

fn fill(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

/// One sprite sheet per paper-doll layer, each layer painting its own band
/// of every cell so the stack is visible.
fn player_sheets(config: &PlayerConfig, assets: &mut AssetStore) {
    let cell = config.cell_size;
    let bands = config.layers.len() as u32;
    for (index, layer) in config.layers.iter().enumerate() {
        let index = index as u32;
        let columns = 8 * (layer.variant + 1);
        let shade = (60 + 40 * index) as u8;
        let sheet = RgbaImage::from_fn(cell * columns, cell * 4, |x, y| {
            let (cx, cy) = (x % cell, y % cell);
            let band_top = cell * index / bands;
            let band_bottom = cell * (index + 1) / bands;
            let inside = cx >= cell / 4 && cx < cell - cell / 4;
            if inside && cy >= band_top && cy < band_bottom {
                let row = (y / cell) as u8;
                Rgba([shade, 40 * row, 200u8.saturating_sub(shade), 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        assets.insert_image(layer.image.clone(), sheet);
    }
}

fn object(name: &str, x: f64, y: f64, width: f64, height: f64) -> MapObject {
    MapObject {
        name: name.to_string(),
        x,
        y,
        width,
        height,
        properties: HashMap::new(),
    }
}

fn lamp(x: f64, y: f64, radius: f64, color: &str) -> MapObject {
    let mut light = object("lamp", x, y, 0.0, 0.0);
    light
        .properties
        .insert("radius".into(), PropertyValue::Number(radius));
    light
        .properties
        .insert("strength".into(), PropertyValue::Number(0.9));
    light
        .properties
        .insert("color".into(), PropertyValue::Text(color.into()));
    light
}

fn demo_world(config: &EngineConfig) -> (MapStore, AssetStore) {
    let mut assets = AssetStore::new();
    let mut tileset = fill(TILE_SIZE * 2, TILE_SIZE, [70, 140, 60, 255]);
    for x in TILE_SIZE..TILE_SIZE * 2 {
        for y in 0..TILE_SIZE {
            tileset.put_pixel(x, y, Rgba([150, 120, 80, 255]));
        }
    }
    assets.insert_image("meadow_tiles", tileset);
    assets.insert_image("rock", fill(16, 16, [120, 120, 130, 255]));
    assets.insert_image("chest_closed", fill(16, 12, [140, 90, 30, 255]));
    assets.insert_image("chest_open", fill(16, 12, [200, 160, 40, 255]));
    assets.insert_sprite(
        "rock",
        SpriteDescriptor::single("rock").with_collision_box(Rectangle::new(2, 8, 12, 8)),
    );
    assets.insert_sprite(
        "chest",
        SpriteDescriptor::animated(vec!["chest_closed".into(), "chest_open".into()])
            .with_collision_box(Rectangle::new(0, 6, 16, 6))
            .with_trigger_box(Rectangle::new(-4, -4, 24, 20)),
    );
    player_sheets(&config.player, &mut assets);

    // Path runs along row 6.
    let tiles = (0..MAP_ROWS)
        .flat_map(|row| (0..MAP_COLUMNS).map(move |_| if row == 6 { 2 } else { 1 }))
        .collect();
    let width = (MAP_COLUMNS * TILE_SIZE) as f64;
    let height = (MAP_ROWS * TILE_SIZE) as f64;
    let map = MapData {
        tileset: TilesetRef {
            image: "meadow_tiles".into(),
            tile_width: TILE_SIZE,
            tile_height: TILE_SIZE,
            columns: 2,
        },
        layers: vec![TileLayerData {
            id: 1,
            name: "Ground".into(),
            width: MAP_COLUMNS,
            height: MAP_ROWS,
            tiles,
        }],
        object_groups: vec![
            ObjectGroup {
                name: "Objects".into(),
                objects: vec![
                    object("rock", 64.0, 64.0, 16.0, 16.0),
                    object("rock", 200.0, 120.0, 16.0, 16.0),
                    object("chest", 150.0, 84.0, 16.0, 12.0),
                ],
            },
            ObjectGroup {
                name: "Collisions".into(),
                objects: vec![
                    object("", 0.0, 0.0, width, 8.0),
                    object("", 0.0, height - 8.0, width, 8.0),
                    object("", 0.0, 0.0, 8.0, height),
                    object("", width - 8.0, 0.0, 8.0, height),
                ],
            },
            ObjectGroup {
                name: "Spawn Points".into(),
                objects: vec![object("player_spawn", 40.0, 100.0, 0.0, 0.0)],
            },
            ObjectGroup {
                name: "Lighting".into(),
                objects: vec![
                    lamp(158.0, 80.0, 60.0, "#ffffd890"),
                    lamp(40.0, 100.0, 40.0, "#ff90c0ff"),
                ],
            },
        ],
    };
    let mut maps = MapStore::new();
    maps.insert(LEVEL_NAME, map);
    (maps, assets)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => load_config_from_path(Path::new(&path))
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("loading config '{path}'"))?,
        None => demo_config(),
    };
    let output = args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    log::info!("Haven demo starting...");
    let (maps, assets) = demo_world(&config);
    let mut session = Session::new(config, &assets, &maps, LEVEL_NAME)
        .context("failed to start session")?;
    if let Some(cycle) = session.day_night_mut() {
        cycle.set_time_of_day(TimeOfDay::Night);
    }

    let mut input = ScriptedInput::new(vec![
        (90, vec![Key::D]),
        (20, vec![Key::S, Key::D]),
        (30, vec![Key::W]),
        (20, Vec::new()),
    ]);
    let (width, height) = (
        session.config().viewport_width,
        session.config().viewport_height,
    );
    let mut canvas = ImageCanvas::new(width, height);
    let frames = session.run(&mut input, &mut canvas);
    session.shutdown();

    let player = session
        .level()
        .entity(session.player())
        .context("player left the level")?;
    log::info!(
        "Ran {} frames; player ended at ({:.1}, {:.1})",
        frames,
        player.position().x,
        player.position().y
    );

    canvas
        .image()
        .save(&output)
        .with_context(|| format!("writing '{output}'"))?;
    log::info!("Wrote last frame to {output}");
    Ok(())
}
