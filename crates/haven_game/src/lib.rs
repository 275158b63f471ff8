pub mod assets;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod level;
pub mod map;
pub mod player;
pub mod session;
pub mod tiles;
pub mod trigger;

pub use assets::{AssetProvider, AssetStore, ImageHandle, SpriteDescriptor};
pub use config::{
    load_config_from_path, DayNightConfig, DebugConfig, EngineConfig, PlayerConfig, PlayerLayer,
};
pub use controller::{resolve_collisions, PlayerController, TickReport};
pub use entity::{DrawOrigin, Drawable, Entity, EntityId, Updatable};
pub use error::{LoadError, SessionError};
pub use level::{Level, LevelCommand, LevelOptions};
pub use map::{MapData, MapProvider, MapStore};
pub use player::{build_player_entity, Facing};
pub use session::{InputSource, QuitHandle, Session};
pub use trigger::Trigger;
