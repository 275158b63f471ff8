use haven_core::AnimationError;
use thiserror::Error;

/// Failure to build a level or one of its entities from the providers.
///
/// Every variant names the resource that could not be resolved so the caller
/// can report it and decide whether to abort startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("map '{map}' not found")]
    MapNotFound { map: String },

    #[error("map '{map}' is malformed: {reason}")]
    MalformedMap { map: String, reason: String },

    #[error("image '{name}' not found")]
    MissingImage { name: String },

    #[error("sprite descriptor '{name}' not found")]
    MissingSprite { name: String },

    #[error("tile {gid} lies outside tileset '{tileset}'")]
    InvalidTile { tileset: String, gid: u32 },

    #[error("cell ({column}, {row}) lies outside sprite sheet '{name}'")]
    CellOutOfBounds { name: String, column: u32, row: u32 },

    #[error("animation '{name}' is invalid: {source}")]
    Animation {
        name: String,
        #[source]
        source: AnimationError,
    },
}

/// Failure to start a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to start lighting worker: {0}")]
    Worker(#[from] std::io::Error),
}

impl LoadError {
    pub fn animation(name: impl Into<String>, source: AnimationError) -> Self {
        Self::Animation {
            name: name.into(),
            source,
        }
    }
}
