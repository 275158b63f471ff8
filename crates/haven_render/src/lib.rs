pub mod camera;
pub mod canvas;
pub mod daynight;
pub mod lighting;
pub mod overlay;
pub mod registry;
pub mod worker;

pub use camera::Camera;
pub use canvas::{Canvas, ImageCanvas};
pub use daynight::{DayNightCycle, TimeOfDay};
pub use lighting::{compute_light_map, DirectionalLight, Light, PointLight};
pub use overlay::{light_map_channel, LightMap, LightMapPublisher, LightMapReceiver};
pub use registry::{LightId, LightRegistry, LightSnapshot};
pub use worker::LightingWorker;
