//! Frame pacing for the main loop.
//!
//! The loop targets a minimum frame interval. Each iteration measures the
//! wall time since the previous one (the tick delta) and, after update and
//! draw, sleeps only what is left of the budget. An iteration that overruns
//! the budget proceeds immediately: there is no frame skipping and no
//! catch-up stepping.

use std::time::{Duration, Instant};

const FRAME_SAMPLE_COUNT: usize = 60;

pub struct FrameClock {
    target_interval: Duration,
    last_instant: Instant,
    frame_start: Instant,
    pub frame_count: u64,
    pub last_delta_ns: u64,

    frame_samples: [u64; FRAME_SAMPLE_COUNT],
    frame_sample_index: usize,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new(target_interval: Duration) -> Self {
        let now = Instant::now();
        let initial_ns = target_interval.as_nanos() as u64;
        Self {
            target_interval,
            last_instant: now,
            frame_start: now,
            frame_count: 0,
            last_delta_ns: 0,
            frame_samples: [initial_ns; FRAME_SAMPLE_COUNT],
            frame_sample_index: 0,
            smoothed_frame_time_ms: initial_ns as f64 / 1e6,
        }
    }

    pub fn target_interval(&self) -> Duration {
        self.target_interval
    }

    /// Start a frame and return the nanoseconds elapsed since the previous one.
    pub fn begin_frame(&mut self) -> u64 {
        let now = Instant::now();
        let delta_ns = now.duration_since(self.last_instant).as_nanos() as u64;
        self.last_instant = now;
        self.frame_start = now;
        self.frame_count += 1;
        self.last_delta_ns = delta_ns;

        self.frame_samples[self.frame_sample_index] = delta_ns;
        self.frame_sample_index = (self.frame_sample_index + 1) % FRAME_SAMPLE_COUNT;
        let avg_ns: u64 = self.frame_samples.iter().sum::<u64>() / FRAME_SAMPLE_COUNT as u64;
        self.smoothed_frame_time_ms = avg_ns as f64 / 1e6;

        delta_ns
    }

    /// Time left in this frame's budget given `work` already spent on it.
    /// `None` when the budget is exhausted.
    pub fn remaining_budget(&self, work: Duration) -> Option<Duration> {
        self.target_interval
            .checked_sub(work)
            .filter(|left| !left.is_zero())
    }

    /// Sleep out the rest of the frame budget, if any remains.
    pub fn end_frame(&self) {
        let work = self.frame_start.elapsed();
        match self.remaining_budget(work) {
            Some(left) => std::thread::sleep(left),
            None => {
                if work > self.target_interval * 2 {
                    log::warn!(
                        "Frame took {:.1}ms, budget is {:.1}ms",
                        work.as_secs_f64() * 1000.0,
                        self.target_interval.as_secs_f64() * 1000.0
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_budget_subtracts_work() {
        let clock = FrameClock::new(Duration::from_millis(8));
        assert_eq!(
            clock.remaining_budget(Duration::from_millis(3)),
            Some(Duration::from_millis(5))
        );
    }

    #[test]
    fn overrun_has_no_budget_left() {
        let clock = FrameClock::new(Duration::from_millis(8));
        assert_eq!(clock.remaining_budget(Duration::from_millis(8)), None);
        assert_eq!(clock.remaining_budget(Duration::from_millis(30)), None);
    }

    #[test]
    fn begin_frame_measures_elapsed_time() {
        let mut clock = FrameClock::new(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(2));
        let delta = clock.begin_frame();
        assert!(delta >= 2_000_000);
        assert_eq!(clock.frame_count, 1);
        assert_eq!(clock.last_delta_ns, delta);
    }

    #[test]
    fn end_frame_never_sleeps_past_budget() {
        let mut clock = FrameClock::new(Duration::from_millis(5));
        clock.begin_frame();
        let start = Instant::now();
        clock.end_frame();
        let slept = start.elapsed();
        assert!(slept <= Duration::from_millis(50), "slept {slept:?}");
    }
}
