//! Ambient brightness that eases between a day and a night strength.

use image::Rgb;

use crate::lighting::DirectionalLight;
use crate::registry::{LightId, LightRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Day,
    Night,
}

/// Owns one directional light in the registry and moves its strength toward
/// the target for the current time of day by `rate` per second.
#[derive(Debug)]
pub struct DayNightCycle {
    light: LightId,
    day_strength: f64,
    night_strength: f64,
    rate: f64,
    current: f64,
    time_of_day: TimeOfDay,
}

impl DayNightCycle {
    pub fn new(
        registry: &LightRegistry,
        color: Rgb<u8>,
        day_strength: f64,
        night_strength: f64,
        rate: f64,
    ) -> Self {
        let light = registry.add(DirectionalLight::new(color, day_strength));
        Self {
            light,
            day_strength,
            night_strength,
            rate,
            current: day_strength,
            time_of_day: TimeOfDay::Day,
        }
    }

    pub fn light(&self) -> LightId {
        self.light
    }

    pub fn strength(&self) -> f64 {
        self.current
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
    }

    pub fn set_time_of_day(&mut self, time_of_day: TimeOfDay) {
        self.time_of_day = time_of_day;
    }

    fn target(&self) -> f64 {
        match self.time_of_day {
            TimeOfDay::Day => self.day_strength,
            TimeOfDay::Night => self.night_strength,
        }
    }

    pub fn update(&mut self, dt_ns: u64, registry: &LightRegistry) {
        let t = (dt_ns as f64 / 1e9 * self.rate).clamp(0.0, 1.0);
        let target = self.target();
        let next = self.current + (target - self.current) * t;
        if next != self.current {
            self.current = next;
            registry.set_strength(self.light, next);
        }
    }
}
