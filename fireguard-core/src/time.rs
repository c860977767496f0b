//! Time management for the sensing core
//!
//! Everything runs on one monotonic millisecond clock:
//! - Reading timestamps and trend rates
//! - Heater warmup windows
//! - Calibration pacing (through [`DelayNs`])

use embedded_hal::delay::DelayNs;

use crate::constants::time::MS_PER_MINUTE;

/// Milliseconds since device boot
pub type Timestamp = u64;

/// Source of monotonic time
pub trait TimeSource {
    /// Current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Clock that only moves when told to
///
/// Delays advance it instead of sleeping, so a 300-sample calibration runs
/// instantly in tests and simulations while timestamps stay consistent.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Timestamp,
    pending_ns: u64,
}

impl ManualClock {
    /// Clock reading `start_ms`
    pub fn new(start_ms: Timestamp) -> Self {
        Self { now_ms: start_ms, pending_ns: 0 }
    }

    /// Jump to `timestamp`
    pub fn set(&mut self, timestamp: Timestamp) {
        self.now_ms = timestamp;
        self.pending_ns = 0;
    }

    /// Move forward by `ms`
    pub fn advance(&mut self, ms: u64) {
        self.now_ms = self.now_ms.saturating_add(ms);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now_ms
    }
}

impl DelayNs for ManualClock {
    fn delay_ns(&mut self, ns: u32) {
        self.pending_ns += u64::from(ns);
        self.advance(self.pending_ns / 1_000_000);
        self.pending_ns %= 1_000_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

/// Wall-clock backed monotonic time (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemClock {
    boot: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    /// Clock whose zero is now
    pub fn new() -> Self {
        Self { boot: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        self.boot.elapsed().as_millis() as Timestamp
    }
}

#[cfg(feature = "std")]
impl DelayNs for SystemClock {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

/// Heater warmup window
///
/// Starts when the channel begins; once elapsed it latches complete and
/// never re-arms until [`Warmup::start`] is called again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Warmup {
    started_at: Timestamp,
    duration_ms: u64,
    complete: bool,
}

impl Warmup {
    /// Warmup that has not started yet; reports incomplete
    pub const fn new(duration_ms: u64) -> Self {
        Self { started_at: 0, duration_ms, complete: false }
    }

    /// Begin timing from `now`. A zero duration completes immediately.
    pub fn start(&mut self, now: Timestamp) {
        self.started_at = now;
        self.complete = self.duration_ms == 0;
    }

    /// Skip the window entirely
    pub fn skip(&mut self) {
        self.complete = true;
    }

    /// Advance to `now`; returns true exactly once, on the call that completes it
    pub fn update(&mut self, now: Timestamp) -> bool {
        if self.complete {
            return false;
        }
        if now.saturating_sub(self.started_at) >= self.duration_ms {
            self.complete = true;
            return true;
        }
        false
    }

    /// Warmup has elapsed
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Milliseconds left, zero once complete
    pub fn remaining_ms(&self, now: Timestamp) -> u64 {
        if self.complete {
            return 0;
        }
        self.duration_ms
            .saturating_sub(now.saturating_sub(self.started_at))
    }
}

/// Convert a change over `time_delta_ms` to a per-minute rate
///
/// Zero elapsed time yields zero, never infinity.
pub fn rate_per_minute(value_delta: f32, time_delta_ms: u64) -> f32 {
    if time_delta_ms == 0 {
        return 0.0;
    }

    value_delta * MS_PER_MINUTE as f32 / time_delta_ms as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_on_delay() {
        let mut clock = ManualClock::new(1000);
        assert_eq!(clock.now(), 1000);

        clock.delay_ms(500);
        assert_eq!(clock.now(), 1500);

        // Sub-millisecond delays accumulate
        clock.delay_us(600);
        clock.delay_us(600);
        assert_eq!(clock.now(), 1501);
    }

    #[test]
    fn warmup_latches_once() {
        let mut warmup = Warmup::new(60_000);
        warmup.start(1_000);

        assert!(!warmup.update(30_000));
        assert_eq!(warmup.remaining_ms(30_000), 31_000);

        // Exactly at the boundary counts as elapsed
        assert!(warmup.update(61_000));
        assert!(warmup.is_complete());
        assert!(!warmup.update(70_000));
        assert_eq!(warmup.remaining_ms(70_000), 0);
    }

    #[test]
    fn skipped_warmup_is_complete() {
        let mut warmup = Warmup::new(180_000);
        warmup.start(0);
        warmup.skip();
        assert!(warmup.is_complete());
    }

    #[test]
    fn rate_calculation() {
        // 2 units in 30 s = 4 units/minute
        assert_eq!(rate_per_minute(2.0, 30_000), 4.0);

        // Zero time delta
        assert_eq!(rate_per_minute(10.0, 0), 0.0);
    }
}
