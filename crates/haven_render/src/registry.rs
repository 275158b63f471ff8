//! Shared, thread-safe light collection.
//!
//! The scene thread adds and removes lights while the lighting worker reads
//! them. Readers take an owned snapshot under the read lock so the compositor
//! never holds the lock while it walks every pixel. A poisoned lock is
//! recovered rather than propagated: the light list stays valid after any
//! panic in a writer since every mutation is a single push/remove/assign.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::lighting::Light;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(u64);

impl LightId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    lights: Vec<(LightId, Light)>,
    target_size: (u32, u32),
}

/// Cloning yields another handle onto the same lights.
#[derive(Debug, Clone, Default)]
pub struct LightRegistry {
    state: Arc<RwLock<RegistryState>>,
}

/// Everything the compositor needs for one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSnapshot {
    pub lights: Vec<Light>,
    pub width: u32,
    pub height: u32,
}

impl LightRegistry {
    pub fn new(width: u32, height: u32) -> Self {
        let registry = Self::default();
        registry.set_target_size(width, height);
        registry
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, light: impl Into<Light>) -> LightId {
        let mut state = self.write();
        let id = LightId(state.next_id);
        state.next_id += 1;
        state.lights.push((id, light.into()));
        id
    }

    /// Remove a light; returns it if it was registered.
    pub fn remove(&self, id: LightId) -> Option<Light> {
        let mut state = self.write();
        let index = state.lights.iter().position(|(light_id, _)| *light_id == id)?;
        Some(state.lights.remove(index).1)
    }

    /// Returns false if `id` is not registered.
    pub fn set_strength(&self, id: LightId, strength: f64) -> bool {
        let mut state = self.write();
        match state.lights.iter_mut().find(|(light_id, _)| *light_id == id) {
            Some((_, light)) => {
                light.set_strength(strength);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: LightId) -> Option<Light> {
        self.read()
            .lights
            .iter()
            .find(|(light_id, _)| *light_id == id)
            .map(|(_, light)| light.clone())
    }

    pub fn set_target_size(&self, width: u32, height: u32) {
        self.write().target_size = (width, height);
    }

    pub fn target_size(&self) -> (u32, u32) {
        self.read().target_size
    }

    pub fn len(&self) -> usize {
        self.read().lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> LightSnapshot {
        let state = self.read();
        LightSnapshot {
            lights: state.lights.iter().map(|(_, light)| light.clone()).collect(),
            width: state.target_size.0,
            height: state.target_size.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::{DirectionalLight, PointLight};
    use glam::DVec2;
    use image::Rgb;

    fn ambient(strength: f64) -> DirectionalLight {
        DirectionalLight::new(Rgb([255, 255, 255]), strength)
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let registry = LightRegistry::new(10, 10);
        let a = registry.add(ambient(0.5));
        let b = registry.add(ambient(0.5));
        assert!(b > a);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_returns_light_once() {
        let registry = LightRegistry::new(10, 10);
        let id = registry.add(ambient(0.5));
        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_is_detached_from_later_edits() {
        let registry = LightRegistry::new(32, 16);
        let id = registry.add(PointLight::new(DVec2::ZERO, Rgb([255, 0, 0]), 1.0, 8.0));
        let snapshot = registry.snapshot();
        registry.remove(id);
        assert_eq!(snapshot.lights.len(), 1);
        assert_eq!((snapshot.width, snapshot.height), (32, 16));
        assert!(registry.snapshot().lights.is_empty());
    }

    #[test]
    fn clones_share_state() {
        let registry = LightRegistry::new(1, 1);
        let handle = registry.clone();
        let id = handle.add(ambient(0.2));
        assert!(registry.set_strength(id, 0.7));
        assert_eq!(handle.get(id).map(|l| l.strength()), Some(0.7));
    }

    #[test]
    fn set_strength_on_unknown_id_reports_false() {
        let registry = LightRegistry::new(1, 1);
        assert!(!registry.set_strength(LightId(99), 1.0));
    }

    #[test]
    fn concurrent_writers_do_not_lose_lights() {
        let registry = LightRegistry::new(4, 4);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        registry.add(ambient(0.1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 100);
    }
}
