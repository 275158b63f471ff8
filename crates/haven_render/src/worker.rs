//! Background thread that recomputes the light map on a fixed cadence.
//!
//! Each pass snapshots the registry, composites the overlay and publishes it.
//! The thread then waits on its stop channel for the interval, so a stop
//! request ends the wait immediately instead of after a full interval.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender};

use crate::lighting::compute_light_map;
use crate::overlay::LightMapPublisher;
use crate::registry::LightRegistry;

pub struct LightingWorker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl LightingWorker {
    pub fn spawn(
        registry: LightRegistry,
        interval: Duration,
        mut publisher: LightMapPublisher,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let handle = thread::Builder::new()
            .name("lighting".into())
            .spawn(move || {
                log::info!("Lighting worker started ({}ms interval)", interval.as_millis());
                loop {
                    let started = Instant::now();
                    let snapshot = registry.snapshot();
                    let map = compute_light_map(&snapshot.lights, snapshot.width, snapshot.height);
                    log::debug!(
                        "Light map {}x{} from {} lights in {:.1}ms",
                        snapshot.width,
                        snapshot.height,
                        snapshot.lights.len(),
                        started.elapsed().as_secs_f64() * 1000.0
                    );
                    if !publisher.publish(map) {
                        log::info!("Light map receiver dropped, stopping worker");
                        break;
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::info!("Lighting worker stopped");
            })?;
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signal the thread and wait for it to exit. Idempotent.
    pub fn stop(&mut self) {
        // Dropping the sender disconnects the channel and wakes the wait.
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Lighting worker panicked");
            }
        }
    }
}

impl Drop for LightingWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
