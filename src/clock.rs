//! Timing collaborator used for performance measurements.

use std::time::Instant;

/// A monotonic clock with millisecond-scale readings.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now(&self) -> f64;

    /// Whether readings are precise enough to honor performance reporting.
    fn is_high_resolution(&self) -> bool {
        true
    }
}

/// Clock backed by [`std::time::Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1_000.0
    }
}

/// Stand-in for environments without a high-resolution timer.
///
/// Runners configured with this clock silently drop performance reporting.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableClock;

impl Clock for UnavailableClock {
    fn now(&self) -> f64 {
        0.0
    }

    fn is_high_resolution(&self) -> bool {
        false
    }
}
