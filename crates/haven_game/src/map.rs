//! In-memory tile-map records, as handed over by the map parser.
//!
//! Coordinates are in unscaled map pixels. Tile ids (gids) are 1-based
//! indices into the tileset; 0 marks an empty cell.

use std::collections::HashMap;

use image::Rgb;
use serde::Deserialize;

use crate::error::LoadError;

#[derive(Debug, Clone, Deserialize)]
pub struct MapData {
    pub tileset: TilesetRef,
    #[serde(default)]
    pub layers: Vec<TileLayerData>,
    #[serde(default)]
    pub object_groups: Vec<ObjectGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TilesetRef {
    /// Asset name of the tileset image.
    pub image: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub columns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TileLayerData {
    pub id: u32,
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Row-major, `width * height` entries.
    pub tiles: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectGroup {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapObject {
    #[serde(default)]
    pub name: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl MapObject {
    pub fn number(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(PropertyValue::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(PropertyValue::as_str)
    }
}

pub trait MapProvider {
    fn map(&self, name: &str) -> Result<MapData, LoadError>;
}

#[derive(Debug, Default, Clone)]
pub struct MapStore {
    maps: HashMap<String, MapData>,
}

impl MapStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, map: MapData) {
        self.maps.insert(name.into(), map);
    }
}

impl MapProvider for MapStore {
    fn map(&self, name: &str) -> Result<MapData, LoadError> {
        self.maps
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::MapNotFound {
                map: name.to_string(),
            })
    }
}

pub fn validate_map(map: &MapData) -> Result<(), String> {
    let tileset = &map.tileset;
    if tileset.tile_width == 0 || tileset.tile_height == 0 {
        return Err("Map validation failed: tile size must be > 0".to_string());
    }
    if tileset.columns == 0 {
        return Err("Map validation failed: tileset columns must be > 0".to_string());
    }
    if map.layers.is_empty() {
        return Err("Map validation failed: no tile layers".to_string());
    }
    for layer in &map.layers {
        let expected = layer.width as usize * layer.height as usize;
        if layer.tiles.len() != expected {
            return Err(format!(
                "Map validation failed: layer '{}' has {} tiles, expected {}x{}={}",
                layer.name,
                layer.tiles.len(),
                layer.width,
                layer.height,
                expected
            ));
        }
    }
    Ok(())
}

/// Parse a Tiled colour, `#AARRGGBB` (alpha dropped) or `#RRGGBB`.
pub fn parse_color(value: &str) -> Result<Rgb<u8>, String> {
    let hex = value
        .strip_prefix('#')
        .ok_or_else(|| format!("colour '{value}' must start with '#'"))?;
    if !hex.is_ascii() {
        return Err(format!("colour '{value}' is not hexadecimal"));
    }
    let rgb = match hex.len() {
        8 => &hex[2..],
        6 => hex,
        _ => return Err(format!("colour '{value}' must be #RRGGBB or #AARRGGBB")),
    };
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&rgb[range], 16).map_err(|e| format!("colour '{value}': {e}"))
    };
    Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r##"{
          "tileset": { "image": "tiles", "tile_width": 16, "tile_height": 16, "columns": 4 },
          "layers": [
            { "id": 1, "name": "Ground", "width": 2, "height": 2, "tiles": [1, 2, 0, 3] }
          ],
          "object_groups": [
            {
              "name": "Lighting",
              "objects": [
                { "x": 10, "y": 20,
                  "properties": { "radius": 40, "strength": "0.8", "color": "#ffff8800" } }
              ]
            },
            { "name": "Spawn Points", "objects": [ { "name": "player_spawn", "x": 5.5, "y": 6 } ] }
          ]
        }"##
    }

    #[test]
    fn parses_layers_and_objects() {
        let map: MapData = serde_json::from_str(sample_json()).expect("map should parse");
        validate_map(&map).expect("map should validate");
        assert_eq!(map.layers[0].tiles, vec![1, 2, 0, 3]);
        let light = &map.object_groups[0].objects[0];
        assert_eq!(light.number("radius"), Some(40.0));
        assert_eq!(light.number("strength"), Some(0.8));
        assert_eq!(light.text("color"), Some("#ffff8800"));
        assert_eq!(map.object_groups[1].objects[0].x, 5.5);
    }

    #[test]
    fn rejects_tile_count_mismatch() {
        let mut map: MapData = serde_json::from_str(sample_json()).expect("map should parse");
        map.layers[0].tiles.pop();
        let err = validate_map(&map).expect_err("short layer must fail");
        assert!(err.contains("Ground"));
    }

    #[test]
    fn rejects_zero_columns() {
        let mut map: MapData = serde_json::from_str(sample_json()).expect("map should parse");
        map.tileset.columns = 0;
        assert!(validate_map(&map).is_err());
    }

    #[test]
    fn unknown_map_is_not_found() {
        let store = MapStore::new();
        assert!(matches!(
            store.map("PlayerBase"),
            Err(LoadError::MapNotFound { map }) if map == "PlayerBase"
        ));
    }

    #[test]
    fn colour_with_alpha_drops_alpha() {
        assert_eq!(parse_color("#80ff8800").unwrap(), Rgb([255, 136, 0]));
    }

    #[test]
    fn colour_without_alpha() {
        assert_eq!(parse_color("#102030").unwrap(), Rgb([16, 32, 48]));
    }

    #[test]
    fn colour_rejects_garbage() {
        assert!(parse_color("ff8800").is_err());
        assert!(parse_color("#ff88").is_err());
        assert!(parse_color("#gg8800").is_err());
    }
}
