//! Classification and Arbitration Thresholds
//!
//! Deltas are relative to the environment baseline. Comparisons are strict
//! (`>` / `<`) everywhere in this file; the analog ladders in the channels
//! are the only inclusive bounds.

// ===== ENVIRONMENT CASCADE =====

/// Fire pattern: temperature rise over baseline (°C).
pub const FIRE_PATTERN_TEMP_DELTA_C: f32 = 20.0;

/// Fire pattern: pressure change from baseline (hPa).
pub const FIRE_PATTERN_PRESSURE_DELTA_HPA: f32 = -3.0;

/// Fire pattern: humidity change from baseline (%).
pub const FIRE_PATTERN_HUMIDITY_DELTA_PCT: f32 = -20.0;

/// Rapid rise: temperature rate (°C/min).
pub const RAPID_RISE_RATE_C_PER_MIN: f32 = 5.0;

/// Rapid rise: minimum temperature rise over baseline (°C).
pub const RAPID_RISE_TEMP_DELTA_C: f32 = 10.0;

/// Pressure drop from baseline (hPa).
pub const PRESSURE_DROP_HPA: f32 = -5.0;

/// High temperature rise over baseline (°C).
pub const HIGH_TEMP_DELTA_C: f32 = 15.0;

/// Dry air, fire-prone (% RH).
pub const LOW_HUMIDITY_PCT: f32 = 20.0;

/// Steam or cooking vapor (% RH).
pub const HIGH_HUMIDITY_PCT: f32 = 80.0;

// ===== FIRE PROBABILITY TIERS =====

/// Absolute temperature above which the top tier applies (°C).
pub const PROBABILITY_TEMP_CRITICAL_C: f32 = 60.0;

/// Absolute temperature above which the second tier applies (°C).
pub const PROBABILITY_TEMP_HIGH_C: f32 = 40.0;

/// Temperature rate above which the top rate tier applies (°C/min).
pub const PROBABILITY_RATE_VERY_FAST_C_PER_MIN: f32 = 10.0;

/// Humidity below which the second humidity tier applies (%).
pub const PROBABILITY_HUMIDITY_DRY_PCT: f32 = 30.0;

// ===== ALERT ARBITER =====

/// Gas critical escalates to GAS_CRITICAL above this temperature (°C).
pub const GAS_CRITICAL_TEMP_C: f32 = 45.0;

/// FIRE_CONFIRMED requires a temperature above this (°C).
pub const FIRE_CONFIRMED_TEMP_C: f32 = 60.0;

/// FIRE_CONFIRMED requires a pressure delta below this (hPa).
pub const FIRE_CONFIRMED_PRESSURE_DELTA_HPA: f32 = -5.0;

/// Smoke concentration that corroborates an environmental fire pattern (ppm).
pub const FIRE_SUSPECTED_SMOKE_PPM: i32 = 300;

/// Cooking exception: humidity above this (%).
pub const COOKING_HUMIDITY_PCT: f32 = 75.0;

/// Cooking exception: temperature below this (°C).
pub const COOKING_MAX_TEMP_C: f32 = 35.0;

/// Active indicator: temperature above this (°C).
pub const INDICATOR_TEMP_C: f32 = 40.0;

/// Active indicator: pressure delta below this (hPa).
pub const INDICATOR_PRESSURE_DELTA_HPA: f32 = -3.0;
