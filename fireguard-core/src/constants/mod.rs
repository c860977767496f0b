//! Constants for FireGuard Core
//!
//! Every numeric limit the channels and the arbiter depend on lives here,
//! with its unit in the name.
//!
//! ## Organization
//!
//! - **Sensors**: ADC span, filter depths, default calibrations, conversion factors
//! - **Thresholds**: environment cascade limits, fire-probability tiers, arbiter limits
//! - **Time**: warmups, sampling cadence, calibration pacing
//!
//! ## Usage Guidelines
//!
//! 1. Use these constants instead of magic numbers
//! 2. Keep units in names (`_MS`, `_HPA`, `_PCT`, `_C`)
//! 3. A constant that changes alarm behavior needs a test naming the scenario

/// Sensor specifications, default calibrations and conversion factors.
pub mod sensors;

/// Classification and arbitration thresholds.
pub mod thresholds;

/// Warmups, cadences and other durations.
pub mod time;

// Re-export commonly used constants for convenience
pub use sensors::{
    ADC_MAX, ADC_REFERENCE_V, GAS_FILTER_DEPTH, SMOKE_FILTER_DEPTH,
    METHANE_LEL_PPM, TREND_CAPACITY,
};

pub use time::{
    MS_PER_SECOND, MS_PER_MINUTE, SMOKE_WARMUP_MS, GAS_WARMUP_MS,
    SENSOR_READ_INTERVAL_MS,
};
