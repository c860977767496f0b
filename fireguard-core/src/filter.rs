//! Moving-Average Filter for the Analog Channels
//!
//! ## Overview
//!
//! MEMS smoke and methane elements are noisy at the single-sample level. Each
//! analog channel smooths its ADC codes through a boxcar average over the last
//! `N` samples before classifying.
//!
//! ## Algorithm
//!
//! A running sum avoids re-adding the window on every sample:
//!
//! ```text
//! sum -= window[index]      // value being evicted
//! window[index] = raw
//! sum += raw
//! index = (index + 1) % N
//! output = sum / N          // integer division
//! ```
//!
//! ## Startup Bias
//!
//! The window starts filled with zeros and the divisor is always `N`, so the
//! first `N` outputs ramp up from zero toward the true level:
//!
//! ```text
//! N = 4, constant input 100:  25, 50, 75, 100, 100, ...
//! ```
//!
//! This is intentional. During the ramp the smoothed value under-reads, and
//! the warmup window (60 s smoke, 180 s gas at 5 s cadence) is longer than
//! the ramp, so no classification ever sees a partially filled window.
//!
//! ## Memory
//!
//! `N * 4 + 16` bytes, no allocation.

/// Fixed-depth boxcar average over raw ADC codes
#[derive(Debug, Clone)]
pub struct SamplingFilter<const N: usize> {
    window: [i32; N],
    index: usize,
    sum: i64,
}

impl<const N: usize> SamplingFilter<N> {
    /// Create a filter whose window is all zeros
    pub const fn new() -> Self {
        Self {
            window: [0; N],
            index: 0,
            sum: 0,
        }
    }

    /// Feed one raw sample, get the smoothed value
    pub fn push(&mut self, raw: i32) -> i32 {
        self.sum -= i64::from(self.window[self.index]);
        self.window[self.index] = raw;
        self.sum += i64::from(raw);
        self.index = (self.index + 1) % N;

        self.average()
    }

    /// Current smoothed value without feeding a sample
    pub fn average(&self) -> i32 {
        (self.sum / N as i64) as i32
    }

    /// Window depth
    pub const fn depth(&self) -> usize {
        N
    }

    /// Refill the window with zeros
    pub fn reset(&mut self) {
        self.window = [0; N];
        self.index = 0;
        self.sum = 0;
    }
}

impl<const N: usize> Default for SamplingFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ramps_up_from_zero() {
        let mut filter = SamplingFilter::<4>::new();

        let outputs: Vec<i32> = (0..5).map(|_| filter.push(100)).collect();
        assert_eq!(outputs, vec![25, 50, 75, 100, 100]);
    }

    #[test]
    fn evicts_oldest_sample() {
        let mut filter = SamplingFilter::<3>::new();
        for _ in 0..3 {
            filter.push(300);
        }

        // One low sample replaces one of the three 300s
        assert_eq!(filter.push(0), 200);
        assert_eq!(filter.push(0), 100);
        assert_eq!(filter.push(0), 0);
    }

    #[test]
    fn integer_division_truncates() {
        let mut filter = SamplingFilter::<10>::new();
        // 9 / 10 truncates to zero
        assert_eq!(filter.push(9), 0);
    }

    #[test]
    fn reset_restores_startup_bias() {
        let mut filter = SamplingFilter::<2>::new();
        filter.push(50);
        filter.push(50);
        filter.reset();
        assert_eq!(filter.push(50), 25);
    }

    proptest! {
        #[test]
        fn converges_after_one_wrap(value in 0i32..=4095, prefix in proptest::collection::vec(0i32..=4095, 0..40)) {
            let mut filter = SamplingFilter::<15>::new();
            for raw in prefix {
                filter.push(raw);
            }

            let mut last = 0;
            for _ in 0..15 {
                last = filter.push(value);
            }
            prop_assert_eq!(last, value);
        }
    }
}
