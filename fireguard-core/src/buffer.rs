//! Trend Windows for Environmental Rate-of-Change
//!
//! ## Overview
//!
//! The environment channel keeps the last few temperature and pressure samples
//! with their timestamps to compute how fast each is moving. A fire heats a
//! room at several degrees per minute; weather and HVAC move it by fractions
//! of a degree. The slope across the window separates the two.
//!
//! Only the two ends of the window matter for that slope, so the window
//! exposes [`oldest`](TrendBuffer::oldest), [`newest`](TrendBuffer::newest)
//! and the derived [`rate_per_minute`](TrendBuffer::rate_per_minute).
//!
//! ## Slot Reuse
//!
//! ```text
//! TrendBuffer<5> after 7 samples s0..s6:
//!
//!   slots   [ s5 | s6 | s2 | s3 | s4 ]
//!                      ^ next: overwritten by s7, currently the oldest
//! ```
//!
//! Until the window has filled, slot 0 is the oldest; afterwards the slot
//! about to be overwritten is.
//!
//! ## Rate Definition
//!
//! ```text
//! rate = (newest.value - oldest.value) / (newest.t - oldest.t)   [per ms]
//!      × 60 000                                                  [per minute]
//! ```
//!
//! Fewer than two samples, or zero elapsed time, gives a rate of zero.
//!
//! ```rust
//! use fireguard_core::buffer::TrendBuffer;
//!
//! let mut trend: TrendBuffer<10> = TrendBuffer::new();
//! trend.record(24.0, 0);
//! trend.record(26.0, 30_000);
//!
//! assert_eq!(trend.rate_per_minute(), 4.0);
//! assert_eq!(trend.span_ms(), 30_000);
//! ```

use crate::time::{rate_per_minute, Timestamp};

/// Single value with the time it was sampled
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimestampedReading {
    /// Measured value in the channel's unit (°C or hPa)
    pub value: f32,
    /// When it was measured
    pub timestamp: Timestamp,
}

/// Window over the last `N` samples of one quantity
#[derive(Debug, Clone)]
pub struct TrendBuffer<const N: usize> {
    samples: [TimestampedReading; N],
    /// Slot the next sample goes into
    next: usize,
    /// Samples held, saturating at `N`
    filled: usize,
}

impl<const N: usize> TrendBuffer<N> {
    /// Empty window
    pub const fn new() -> Self {
        Self {
            samples: [TimestampedReading { value: 0.0, timestamp: 0 }; N],
            next: 0,
            filled: 0,
        }
    }

    /// Add a sample, displacing the oldest once the window is full
    pub fn record(&mut self, value: f32, timestamp: Timestamp) {
        self.samples[self.next] = TimestampedReading { value, timestamp };
        self.next = (self.next + 1) % N;
        self.filled = (self.filled + 1).min(N);
    }

    /// Number of samples in the window
    pub fn len(&self) -> usize {
        self.filled
    }

    /// No sample recorded since creation or the last clear
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Earliest sample still in the window
    pub fn oldest(&self) -> Option<TimestampedReading> {
        match self.filled {
            0 => None,
            f if f < N => Some(self.samples[0]),
            _ => Some(self.samples[self.next]),
        }
    }

    /// Latest sample
    pub fn newest(&self) -> Option<TimestampedReading> {
        if self.filled == 0 {
            return None;
        }
        Some(self.samples[(self.next + N - 1) % N])
    }

    /// Time covered by the window (ms)
    pub fn span_ms(&self) -> u64 {
        match (self.oldest(), self.newest()) {
            (Some(oldest), Some(newest)) => newest.timestamp.saturating_sub(oldest.timestamp),
            _ => 0,
        }
    }

    /// Slope from oldest to newest, per minute
    pub fn rate_per_minute(&self) -> f32 {
        match (self.oldest(), self.newest()) {
            (Some(oldest), Some(newest)) if self.filled >= 2 => {
                rate_per_minute(newest.value - oldest.value, self.span_ms())
            }
            _ => 0.0,
        }
    }

    /// Forget every sample
    pub fn clear(&mut self) {
        self.next = 0;
        self.filled = 0;
    }
}

impl<const N: usize> Default for TrendBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_has_no_rate() {
        let trend: TrendBuffer<5> = TrendBuffer::new();
        assert!(trend.is_empty());
        assert!(trend.newest().is_none());
        assert_eq!(trend.span_ms(), 0);
        assert_eq!(trend.rate_per_minute(), 0.0);
    }

    #[test]
    fn single_sample_has_no_rate() {
        let mut trend = TrendBuffer::<5>::new();
        trend.record(80.0, 5_000);
        assert_eq!(trend.oldest(), trend.newest());
        assert_eq!(trend.rate_per_minute(), 0.0);
    }

    #[test]
    fn full_window_drops_the_oldest() {
        let mut trend = TrendBuffer::<3>::new();
        for i in 0..5u64 {
            trend.record(i as f32, i * 1_000);
        }

        assert_eq!(trend.len(), 3);
        assert_eq!(trend.oldest().map(|r| r.value), Some(2.0));
        assert_eq!(trend.newest().map(|r| r.value), Some(4.0));
        assert_eq!(trend.span_ms(), 2_000);
    }

    #[test]
    fn rate_spans_oldest_to_newest() {
        let mut trend = TrendBuffer::<10>::new();

        // 0.5 °C every 5 s = 6 °C/min
        for i in 0..12u64 {
            trend.record(25.0 + 0.5 * i as f32, i * 5_000);
        }

        let rate = trend.rate_per_minute();
        assert!((rate - 6.0).abs() < 1e-4, "rate was {rate}");
    }

    #[test]
    fn zero_elapsed_time_gives_zero_rate() {
        let mut trend = TrendBuffer::<4>::new();
        trend.record(20.0, 7_000);
        trend.record(90.0, 7_000);
        assert_eq!(trend.rate_per_minute(), 0.0);
    }

    #[test]
    fn falling_pressure_gives_negative_rate() {
        let mut trend = TrendBuffer::<4>::new();
        trend.record(1013.0, 0);
        trend.record(1010.0, 60_000);
        assert_eq!(trend.rate_per_minute(), -3.0);
    }

    #[test]
    fn steady_after_a_step_once_the_window_turns_over() {
        let mut trend = TrendBuffer::<4>::new();
        trend.record(25.0, 0);
        for i in 1..=4u64 {
            trend.record(45.0, i * 5_000);
        }
        assert_eq!(trend.rate_per_minute(), 0.0);
    }

    #[test]
    fn clear_forgets_samples() {
        let mut trend = TrendBuffer::<2>::new();
        trend.record(1.0, 1);
        trend.record(2.0, 2);
        trend.clear();
        assert!(trend.is_empty());
        assert!(trend.oldest().is_none());

        trend.record(5.0, 10);
        assert_eq!(trend.oldest().map(|r| r.value), Some(5.0));
    }
}
