//! Engine configuration, loaded from JSON with defaults for every field.

use std::fs;
use std::path::Path;
use std::time::Duration;

use haven_core::Rectangle;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_lighting_interval_ms")]
    pub lighting_interval_ms: u64,
    #[serde(default = "default_sprite_scale")]
    pub sprite_scale: f64,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default = "default_world_object_frame_time_ms")]
    pub world_object_frame_time_ms: u64,
    #[serde(default)]
    pub day_night: Option<DayNightConfig>,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_speed")]
    pub speed: f64,
    #[serde(default = "default_player_frame_time_ms")]
    pub frame_time_ms: u64,
    #[serde(default = "default_cell_size")]
    pub cell_size: u32,
    /// Unscaled, relative to the player's position.
    #[serde(default = "default_player_bounding_box")]
    pub bounding_box: Rectangle,
    #[serde(default = "default_player_layers")]
    pub layers: Vec<PlayerLayer>,
}

/// One paper-doll layer: a sprite sheet and which 8-column block to use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerLayer {
    pub image: String,
    #[serde(default)]
    pub variant: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DayNightConfig {
    #[serde(default = "default_day_strength")]
    pub day_strength: f64,
    #[serde(default = "default_night_strength")]
    pub night_strength: f64,
    /// Fraction of the remaining distance covered per second.
    #[serde(default = "default_transition_rate")]
    pub transition_rate: f64,
    #[serde(default = "default_ambient_color")]
    pub color: [u8; 3],
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DebugConfig {
    #[serde(default = "default_show_sprites")]
    pub show_sprites: bool,
    #[serde(default)]
    pub show_bounding_boxes: bool,
    #[serde(default)]
    pub show_triggers: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            frame_interval_ms: default_frame_interval_ms(),
            lighting_interval_ms: default_lighting_interval_ms(),
            sprite_scale: default_sprite_scale(),
            player: PlayerConfig::default(),
            world_object_frame_time_ms: default_world_object_frame_time_ms(),
            day_night: None,
            debug: DebugConfig::default(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: default_player_speed(),
            frame_time_ms: default_player_frame_time_ms(),
            cell_size: default_cell_size(),
            bounding_box: default_player_bounding_box(),
            layers: default_player_layers(),
        }
    }
}

impl Default for DayNightConfig {
    fn default() -> Self {
        Self {
            day_strength: default_day_strength(),
            night_strength: default_night_strength(),
            transition_rate: default_transition_rate(),
            color: default_ambient_color(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_sprites: default_show_sprites(),
            show_bounding_boxes: false,
            show_triggers: false,
        }
    }
}

impl EngineConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn lighting_interval(&self) -> Duration {
        Duration::from_millis(self.lighting_interval_ms)
    }

    pub fn world_object_frame_time_ns(&self) -> u64 {
        self.world_object_frame_time_ms * 1_000_000
    }
}

impl PlayerConfig {
    pub fn frame_time_ns(&self) -> u64 {
        self.frame_time_ms * 1_000_000
    }
}

pub fn load_config_from_path(path: &Path) -> Result<EngineConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &EngineConfig) -> Result<(), String> {
    if config.viewport_width == 0 || config.viewport_height == 0 {
        return Err("Config validation failed: viewport must be non-empty".to_string());
    }
    if config.frame_interval_ms == 0 {
        return Err("Config validation failed: frame_interval_ms must be > 0".to_string());
    }
    if config.lighting_interval_ms == 0 {
        return Err("Config validation failed: lighting_interval_ms must be > 0".to_string());
    }
    if !(config.sprite_scale > 0.0) {
        return Err(format!(
            "Config validation failed: sprite_scale must be > 0, got {}",
            config.sprite_scale
        ));
    }
    if config.world_object_frame_time_ms == 0 {
        return Err("Config validation failed: world_object_frame_time_ms must be > 0".to_string());
    }

    let player = &config.player;
    if !(player.speed > 0.0) {
        return Err(format!(
            "Config validation failed: player.speed must be > 0, got {}",
            player.speed
        ));
    }
    if player.frame_time_ms == 0 {
        return Err("Config validation failed: player.frame_time_ms must be > 0".to_string());
    }
    if player.cell_size == 0 {
        return Err("Config validation failed: player.cell_size must be > 0".to_string());
    }
    if player.layers.is_empty() {
        return Err("Config validation failed: player.layers is empty".to_string());
    }

    if let Some(day_night) = &config.day_night {
        if day_night.transition_rate < 0.0 {
            return Err(
                "Config validation failed: day_night.transition_rate must be >= 0".to_string(),
            );
        }
    }
    Ok(())
}

const fn default_viewport_width() -> u32 {
    1280
}

const fn default_viewport_height() -> u32 {
    720
}

const fn default_frame_interval_ms() -> u64 {
    8
}

const fn default_lighting_interval_ms() -> u64 {
    500
}

const fn default_sprite_scale() -> f64 {
    2.5
}

const fn default_player_speed() -> f64 {
    80.0
}

const fn default_player_frame_time_ms() -> u64 {
    100
}

const fn default_cell_size() -> u32 {
    32
}

const fn default_player_bounding_box() -> Rectangle {
    Rectangle {
        x: -6,
        y: 6,
        width: 12,
        height: 12,
    }
}

fn default_player_layers() -> Vec<PlayerLayer> {
    [("character", 2), ("basic", 0), ("pants", 0), ("shoes", 0), ("hair", 0)]
        .into_iter()
        .map(|(image, variant)| PlayerLayer {
            image: image.to_string(),
            variant,
        })
        .collect()
}

const fn default_world_object_frame_time_ms() -> u64 {
    150
}

const fn default_day_strength() -> f64 {
    1.0
}

const fn default_night_strength() -> f64 {
    0.3
}

const fn default_transition_rate() -> f64 {
    0.1
}

const fn default_ambient_color() -> [u8; 3] {
    [255, 255, 255]
}

const fn default_show_sprites() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "haven_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn empty_object_uses_defaults() {
        let path = temp_file_path("empty");
        fs::write(&path, "{}").expect("failed to write temp config");
        let config = load_config_from_path(&path).expect("defaults should validate");
        let _ = fs::remove_file(&path);

        assert_eq!((config.viewport_width, config.viewport_height), (1280, 720));
        assert_eq!(config.frame_interval(), Duration::from_millis(8));
        assert_eq!(config.lighting_interval(), Duration::from_millis(500));
        assert_eq!(config.sprite_scale, 2.5);
        assert_eq!(config.player.speed, 80.0);
        assert_eq!(config.player.bounding_box, Rectangle::new(-6, 6, 12, 12));
        assert_eq!(config.player.layers.len(), 5);
        assert_eq!(config.player.layers[0].variant, 2);
        assert_eq!(config.world_object_frame_time_ns(), 150_000_000);
        assert!(config.day_night.is_none());
        assert!(config.debug.show_sprites);
        assert!(!config.debug.show_bounding_boxes);
    }

    #[test]
    fn partial_overrides_merge_with_defaults() {
        let path = temp_file_path("partial");
        fs::write(
            &path,
            r#"{
              "sprite_scale": 1.0,
              "player": { "speed": 120.0, "layers": [ { "image": "body" } ] },
              "day_night": { "night_strength": 0.1 },
              "debug": { "show_triggers": true }
            }"#,
        )
        .expect("failed to write temp config");
        let config = load_config_from_path(&path).expect("config should load");
        let _ = fs::remove_file(&path);

        assert_eq!(config.sprite_scale, 1.0);
        assert_eq!(config.player.speed, 120.0);
        assert_eq!(config.player.frame_time_ns(), 100_000_000);
        assert_eq!(
            config.player.layers,
            vec![PlayerLayer {
                image: "body".into(),
                variant: 0
            }]
        );
        let day_night = config.day_night.expect("day_night should be present");
        assert_eq!(day_night.night_strength, 0.1);
        assert_eq!(day_night.day_strength, 1.0);
        assert!(config.debug.show_triggers);
        assert!(config.debug.show_sprites);
    }

    #[test]
    fn rejects_zero_scale() {
        let config = EngineConfig {
            sprite_scale: 0.0,
            ..EngineConfig::default()
        };
        let err = validate_config(&config).expect_err("zero scale must fail");
        assert!(err.contains("sprite_scale"));
    }

    #[test]
    fn rejects_empty_player_layers() {
        let mut config = EngineConfig::default();
        config.player.layers.clear();
        let err = validate_config(&config).expect_err("empty layers must fail");
        assert!(err.contains("player.layers"));
    }

    #[test]
    fn rejects_malformed_json() {
        let path = temp_file_path("malformed");
        fs::write(&path, "{ not json").expect("failed to write temp config");
        let err = load_config_from_path(&path).expect_err("malformed must fail");
        let _ = fs::remove_file(&path);
        assert!(err.contains("Failed to parse config JSON"));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = temp_file_path("missing");
        let err = load_config_from_path(&path).expect_err("missing must fail");
        assert!(err.contains("Failed to read config file"));
    }
}
