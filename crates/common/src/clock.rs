//! Clock and timing utilities for exercise sessions.
//!
//! Landmark frames carry monotonic nanosecond timestamps relative to a
//! session epoch. This module provides utilities for:
//! - Capturing the epoch (monotonic + wall clock)
//! - Converting between nanoseconds and seconds
//! - Tracking per-frame processing cost against a real-time budget

use std::time::{Duration, Instant};

/// A session clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment the session started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant the session started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new session clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get seconds elapsed since session start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert a nanosecond value to seconds.
    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / 1_000_000_000.0
    }

    /// Convert seconds to nanoseconds. Negative input saturates to zero.
    pub fn secs_to_ns(secs: f64) -> u64 {
        (secs * 1_000_000_000.0) as u64
    }
}

/// Tracks how long each frame took to process against a fixed budget.
#[derive(Debug, Clone)]
pub struct FrameBudget {
    budget: Duration,
    frames: u64,
    over_budget: u64,
    worst: Duration,
    total: Duration,
}

impl FrameBudget {
    /// Create a tracker with the given per-frame budget.
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            frames: 0,
            over_budget: 0,
            worst: Duration::ZERO,
            total: Duration::ZERO,
        }
    }

    /// Record one frame's processing time. Returns true if it exceeded the budget.
    pub fn record(&mut self, cost: Duration) -> bool {
        self.frames += 1;
        self.total += cost;
        self.worst = self.worst.max(cost);
        let over = cost > self.budget;
        if over {
            self.over_budget += 1;
        }
        over
    }

    /// Run `f`, recording its wall-clock cost.
    pub fn measure<T>(&mut self, f: impl FnOnce() -> T) -> (T, bool) {
        let started = Instant::now();
        let out = f();
        let over = self.record(started.elapsed());
        (out, over)
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn over_budget(&self) -> u64 {
        self.over_budget
    }

    pub fn worst(&self) -> Duration {
        self.worst
    }

    /// Mean processing time per frame.
    pub fn mean(&self) -> Duration {
        if self.frames == 0 {
            return Duration::ZERO;
        }
        self.total / self.frames as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = SessionClock::start();
        assert!(clock.elapsed_secs() < 1.0);
        assert!(chrono::DateTime::parse_from_rfc3339(clock.epoch_wall()).is_ok());
    }

    #[test]
    fn test_ns_to_secs_conversion() {
        assert!((SessionClock::ns_to_secs(1_500_000_000) - 1.5).abs() < 1e-9);
        assert_eq!(SessionClock::secs_to_ns(2.0), 2_000_000_000);
        assert_eq!(SessionClock::secs_to_ns(-1.0), 0);
    }

    #[test]
    fn test_frame_budget_counts_overruns() {
        let mut budget = FrameBudget::new(Duration::from_millis(33));
        assert!(!budget.record(Duration::from_millis(5)));
        assert!(budget.record(Duration::from_millis(40)));
        assert!(!budget.record(Duration::from_millis(33)));

        assert_eq!(budget.frames(), 3);
        assert_eq!(budget.over_budget(), 1);
        assert_eq!(budget.worst(), Duration::from_millis(40));
        assert_eq!(budget.mean(), Duration::from_millis(26));
    }

    #[test]
    fn test_frame_budget_measure_returns_value() {
        let mut budget = FrameBudget::new(Duration::from_secs(1));
        let (value, over) = budget.measure(|| 7 * 6);
        assert_eq!(value, 42);
        assert!(!over);
        assert_eq!(budget.frames(), 1);
    }
}
