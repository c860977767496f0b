//! Time-Related Constants
//!
//! All durations are milliseconds on the device's monotonic clock.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Milliseconds per minute.
pub const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;

// ===== WARMUP =====

/// Smoke sensor heater warmup (ms).
pub const SMOKE_WARMUP_MS: u64 = 60 * MS_PER_SECOND;

/// Methane sensor heater warmup (ms).
///
/// Catalytic/MOS methane elements need three minutes to stabilize.
pub const GAS_WARMUP_MS: u64 = 180 * MS_PER_SECOND;

// ===== CADENCE =====

/// Interval between polling-loop sensor reads (ms).
pub const SENSOR_READ_INTERVAL_MS: u64 = 5 * MS_PER_SECOND;

/// Spacing between environment baseline samples (ms).
///
/// 100 samples at this spacing take five minutes.
pub const BASELINE_SAMPLE_INTERVAL_MS: u32 = 3000;

/// Default number of analog calibration samples.
pub const DEFAULT_CALIBRATION_SAMPLES: u32 = 300;

/// Default spacing between analog calibration samples (ms).
pub const DEFAULT_CALIBRATION_DELAY_MS: u32 = 1000;
