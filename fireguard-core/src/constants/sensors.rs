//! Sensor Specifications and Default Calibrations
//!
//! Values for the MEMS smoke and methane sensors read through a 12-bit ADC,
//! and for the AHT20/BMP280 style environment pair.

// ===== ANALOG FRONT END =====

/// Highest raw value the 12-bit ADC can report.
///
/// Anything above this did not come from the converter and is a sensor fault.
pub const ADC_MAX: u16 = 4095;

/// ADC reference voltage at 11 dB attenuation (V).
pub const ADC_REFERENCE_V: f32 = 3.3;

/// Moving-average depth for the smoke channel (samples).
pub const SMOKE_FILTER_DEPTH: usize = 10;

/// Moving-average depth for the methane channel (samples).
///
/// Deeper than smoke: slower to respond, steadier near the explosive threshold.
pub const GAS_FILTER_DEPTH: usize = 15;

/// Capacity of each environment trend buffer (samples).
pub const TREND_CAPACITY: usize = 10;

// ===== SMOKE =====

/// Full-scale smoke concentration estimate (ppm).
///
/// Heuristic placeholder, not derived from a datasheet.
pub const SMOKE_PPM_FULL_SCALE: i32 = 1000;

/// Default smoke calibration, used until a calibration record loads.
pub const SMOKE_DEFAULT_BASELINE_MIN: i32 = 0;
/// Default smoke baseline maximum.
pub const SMOKE_DEFAULT_BASELINE_MAX: i32 = 500;
/// Default smoke baseline average.
pub const SMOKE_DEFAULT_BASELINE_AVG: i32 = 250;
/// Default smoke thresholds: caution, warning, alarm.
pub const SMOKE_DEFAULT_THRESHOLDS: [i32; 3] = [400, 800, 1500];

/// Threshold multipliers over half the clean-air spread: caution, warning, alarm.
pub const SMOKE_VARIANCE_MULTIPLIERS: [i32; 3] = [2, 4, 8];

// ===== METHANE =====

/// Lower Explosive Limit of methane in air (ppm), 5 % by volume.
pub const METHANE_LEL_PPM: i32 = 50_000;

/// Default methane calibration, used until a calibration record loads.
pub const GAS_DEFAULT_BASELINE_MIN: i32 = 0;
/// Default methane baseline maximum.
pub const GAS_DEFAULT_BASELINE_MAX: i32 = 500;
/// Default methane baseline average.
pub const GAS_DEFAULT_BASELINE_AVG: i32 = 250;
/// Default methane thresholds: caution (~0.5 % LEL), warning (~2 %), alarm (~4 %),
/// explosive (~5 %).
pub const GAS_DEFAULT_THRESHOLDS: [i32; 4] = [500, 1000, 1800, 2200];

/// Threshold multipliers for methane.
///
/// Steeper than smoke: an explosive gas gets a wider margin before alarm.
pub const GAS_VARIANCE_MULTIPLIERS: [i32; 4] = [3, 6, 10, 12];

// ===== ENVIRONMENT =====

/// Default baseline temperature (°C).
pub const DEFAULT_BASELINE_TEMP_C: f32 = 25.0;

/// Default baseline relative humidity (%).
pub const DEFAULT_BASELINE_HUMIDITY_PCT: f32 = 50.0;

/// Standard sea level pressure (hPa), also the default baseline.
pub const SEA_LEVEL_PRESSURE_HPA: f32 = 1013.25;

/// Number of samples averaged for an environment baseline.
pub const BASELINE_SAMPLES: u32 = 100;

/// Accepted baseline temperature span (°C), the AHT20 operating range.
pub const BASELINE_TEMP_RANGE_C: (f32, f32) = (-40.0, 85.0);

/// Accepted baseline humidity span (%).
pub const BASELINE_HUMIDITY_RANGE_PCT: (f32, f32) = (0.0, 100.0);

/// Accepted baseline pressure span (hPa), the BMP280 operating range.
pub const BASELINE_PRESSURE_RANGE_HPA: (f32, f32) = (300.0, 1100.0);
