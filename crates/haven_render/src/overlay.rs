//! Handoff of finished light maps from the lighting worker to the renderer.
//!
//! A light map is published as a whole `Arc<RgbaImage>`; the renderer only
//! ever sees complete images, never a map the worker is still writing. The
//! channel holds at most one pending map and publishing replaces it, so a
//! slow renderer never backs up the worker and always draws the newest map.

use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use image::RgbaImage;

#[derive(Debug, Clone)]
pub struct LightMap {
    pub image: Arc<RgbaImage>,
    /// Increases by one per published map.
    pub generation: u64,
}

pub struct LightMapPublisher {
    tx: Sender<LightMap>,
    // Used to evict the pending map; keeps the channel connected, so the
    // receiver's liveness is tracked separately.
    drain: Receiver<LightMap>,
    receiver_alive: Weak<()>,
    generation: u64,
}

pub struct LightMapReceiver {
    rx: Receiver<LightMap>,
    latest: Option<LightMap>,
    _alive: Arc<()>,
}

pub fn light_map_channel() -> (LightMapPublisher, LightMapReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let alive = Arc::new(());
    (
        LightMapPublisher {
            tx,
            drain: rx.clone(),
            receiver_alive: Arc::downgrade(&alive),
            generation: 0,
        },
        LightMapReceiver {
            rx,
            latest: None,
            _alive: alive,
        },
    )
}

impl LightMapPublisher {
    /// Publish `image`, replacing any map the renderer has not picked up yet.
    /// Returns false once the receiving side is gone.
    pub fn publish(&mut self, image: RgbaImage) -> bool {
        if self.receiver_alive.strong_count() == 0 {
            return false;
        }
        self.generation += 1;
        let mut map = LightMap {
            image: Arc::new(image),
            generation: self.generation,
        };
        loop {
            match self.tx.try_send(map) {
                Ok(()) => return true,
                Err(TrySendError::Full(rejected)) => {
                    let _ = self.drain.try_recv();
                    map = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }

    pub fn published(&self) -> u64 {
        self.generation
    }
}

impl LightMapReceiver {
    /// The newest complete map, if any has ever been published.
    pub fn latest(&mut self) -> Option<&LightMap> {
        while let Ok(map) = self.rx.try_recv() {
            self.latest = Some(map);
        }
        self.latest.as_ref()
    }
}
