//! Calibration Records and Their Persisted Schema
//!
//! ## Records
//!
//! | Record                | Key               | Fields |
//! |-----------------------|-------------------|--------|
//! | [`SmokeCalibration`]  | `smoke_cal_v1`    | 6: `min,max,avg,caution,warning,alarm` |
//! | [`GasCalibration`]    | `gas_cal_v1`      | 7: smoke fields + `explosive` |
//! | [`EnvironmentBaseline`] | `env_baseline_v1` | 3: `temperature,humidity,pressure` |
//!
//! The schema version is part of the key. A future layout gets a new key, so
//! an old record is never parsed with the wrong field meanings.
//!
//! ## Acceptance Rules
//!
//! A record is accepted whole or not at all:
//!
//! 1. The field count must match exactly. A short or long record means no
//!    calibration is present; nothing is partially applied.
//! 2. Every field must parse as a number.
//! 3. Range and ordering invariants must hold:
//!    - analog baselines inside the ADC span with `min <= avg <= max`
//!    - thresholds strictly ascending, above the baseline average and
//!      reachable by the ADC
//!    - environment baselines finite and inside the sensors' operating ranges
//!
//! The same rules gate writes: a calibration run whose thresholds fail them
//! (for example a perfectly flat clean-air signal, where every threshold
//! collapses onto the average) is rejected before anything is persisted.
//!
//! ## Example
//!
//! ```rust
//! use fireguard_core::calibration::{CalibrationRecord, SmokeCalibration};
//!
//! let cal = SmokeCalibration::decode("180,220,200,240,280,360").unwrap();
//! assert_eq!(cal.thresholds, [240, 280, 360]);
//! assert_eq!(cal.encode().unwrap().as_str(), "180,220,200,240,280,360");
//!
//! // Wrong field count is "no calibration", not a partial one
//! assert!(SmokeCalibration::decode("180,220,200,240,280").is_err());
//! ```

use core::fmt::Write;
use core::str::FromStr;

use crate::{
    constants::sensors::{
        ADC_MAX, BASELINE_HUMIDITY_RANGE_PCT, BASELINE_PRESSURE_RANGE_HPA,
        BASELINE_TEMP_RANGE_C, DEFAULT_BASELINE_HUMIDITY_PCT, DEFAULT_BASELINE_TEMP_C,
        GAS_DEFAULT_BASELINE_AVG, GAS_DEFAULT_BASELINE_MAX, GAS_DEFAULT_BASELINE_MIN,
        GAS_DEFAULT_THRESHOLDS, SEA_LEVEL_PRESSURE_HPA, SMOKE_DEFAULT_BASELINE_AVG,
        SMOKE_DEFAULT_BASELINE_MAX, SMOKE_DEFAULT_BASELINE_MIN, SMOKE_DEFAULT_THRESHOLDS,
    },
    errors::{CalibrationError, CalibrationResult, StoreError},
    time::Timestamp,
    traits::{CalibrationStore, RecordText},
};

/// Version of the record layouts below
pub const SCHEMA_VERSION: u8 = 1;

/// Store keys, one per record type
pub mod keys {
    /// Smoke calibration
    pub const SMOKE: &str = "smoke_cal_v1";
    /// Methane calibration
    pub const GAS: &str = "gas_cal_v1";
    /// Environment baseline
    pub const ENVIRONMENT: &str = "env_baseline_v1";
}

/// A calibration that can be persisted as one comma-separated text record
pub trait CalibrationRecord: Sized {
    /// Store key for this record type
    const KEY: &'static str;

    /// Exact number of fields in the text form
    const FIELD_COUNT: usize;

    /// Check range and ordering invariants
    fn validate(&self) -> CalibrationResult<()>;

    /// Render the text form; refuses records that fail [`validate`](Self::validate)
    fn encode(&self) -> CalibrationResult<RecordText>;

    /// Parse and validate the text form
    fn decode(text: &str) -> CalibrationResult<Self>;
}

/// Read a record from the store
///
/// `Ok(None)` when nothing is stored under the key. Store failures and
/// malformed records are errors; callers fall back to defaults on either.
pub fn load<R: CalibrationRecord, S: CalibrationStore + ?Sized>(
    store: &mut S,
) -> CalibrationResult<Option<R>> {
    match store.read(R::KEY)? {
        Some(text) => R::decode(text.as_str()).map(Some),
        None => Ok(None),
    }
}

/// Validate, encode and write a record
pub fn save<R: CalibrationRecord, S: CalibrationStore + ?Sized>(
    record: &R,
    store: &mut S,
) -> CalibrationResult<()> {
    let text = record.encode()?;
    store.write(R::KEY, text.as_str())?;
    Ok(())
}

/// Split `text` into exactly `F` numeric fields
fn parse_fields<T, const F: usize>(text: &str) -> CalibrationResult<[T; F]>
where
    T: FromStr + Copy + Default,
{
    let text = text.trim();
    let found = text.split(',').count();
    if found != F {
        return Err(CalibrationError::FieldCount { expected: F, found });
    }

    let mut values = [T::default(); F];
    for (index, (slot, field)) in values.iter_mut().zip(text.split(',')).enumerate() {
        *slot = field
            .trim()
            .parse()
            .map_err(|_| CalibrationError::InvalidField { index })?;
    }
    Ok(values)
}

/// Baseline statistics and threshold ladder for an analog sensor
///
/// `T` is the number of thresholds: 3 for smoke, 4 for methane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogCalibration<const T: usize> {
    /// Lowest raw code seen in clean air
    pub baseline_min: i32,
    /// Highest raw code seen in clean air
    pub baseline_max: i32,
    /// Mean raw code in clean air
    pub baseline_avg: i32,
    /// Ascending thresholds, lowest (caution) first
    pub thresholds: [i32; T],
    /// False while running on hard-coded defaults
    pub is_calibrated: bool,
}

/// Smoke calibration: caution, warning, alarm
pub type SmokeCalibration = AnalogCalibration<3>;

/// Methane calibration: caution, warning, alarm, explosive
pub type GasCalibration = AnalogCalibration<4>;

/// Running min/max/sum over raw calibration samples
#[derive(Debug, Clone, Copy)]
pub struct SampleStats {
    min: i32,
    max: i32,
    sum: i64,
    count: u32,
}

impl SampleStats {
    /// No samples yet
    pub const fn new() -> Self {
        Self {
            min: ADC_MAX as i32,
            max: 0,
            sum: 0,
            count: 0,
        }
    }

    /// Account for one raw code
    pub fn add(&mut self, raw: i32) {
        self.min = self.min.min(raw);
        self.max = self.max.max(raw);
        self.sum += i64::from(raw);
        self.count += 1;
    }

    /// Samples added so far
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Integer mean, `None` without samples
    pub fn mean(&self) -> Option<i32> {
        if self.count == 0 {
            return None;
        }
        Some((self.sum / i64::from(self.count)) as i32)
    }
}

impl Default for SampleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl<const T: usize> AnalogCalibration<T> {
    /// Derive a calibration from clean-air statistics
    ///
    /// `variance` is half the observed spread; each threshold sits
    /// `multiplier × variance` above the average. The result replaces any
    /// previous calibration outright.
    pub fn from_stats(stats: &SampleStats, multipliers: [i32; T]) -> CalibrationResult<Self> {
        let baseline_avg = stats.mean().ok_or(CalibrationError::NoSamples)?;
        let variance = (stats.max - stats.min) / 2;

        let mut thresholds = [0; T];
        for (threshold, multiplier) in thresholds.iter_mut().zip(multipliers) {
            *threshold = baseline_avg + variance * multiplier;
        }

        let calibration = Self {
            baseline_min: stats.min,
            baseline_max: stats.max,
            baseline_avg,
            thresholds,
            is_calibrated: true,
        };
        calibration.check_invariants()?;
        Ok(calibration)
    }

    /// Highest threshold in the ladder
    pub fn top_threshold(&self) -> i32 {
        self.thresholds[T - 1]
    }

    fn check_invariants(&self) -> CalibrationResult<()> {
        let adc_max = i32::from(ADC_MAX);

        if self.baseline_min < 0 || self.baseline_max > adc_max {
            return Err(CalibrationError::OutOfRange { field: "baseline" });
        }
        if !(self.baseline_min <= self.baseline_avg && self.baseline_avg <= self.baseline_max) {
            return Err(CalibrationError::OutOfRange { field: "baseline_avg" });
        }
        if self.thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(CalibrationError::ThresholdsNotAscending);
        }
        if self.thresholds[0] <= self.baseline_avg {
            return Err(CalibrationError::ThresholdsNotAscending);
        }
        if self.top_threshold() > adc_max {
            return Err(CalibrationError::OutOfRange { field: "threshold" });
        }
        Ok(())
    }

    fn from_fields(fields: &[i32]) -> Self {
        let mut thresholds = [0; T];
        thresholds.copy_from_slice(&fields[3..3 + T]);
        Self {
            baseline_min: fields[0],
            baseline_max: fields[1],
            baseline_avg: fields[2],
            thresholds,
            is_calibrated: true,
        }
    }

    fn write_fields(&self) -> CalibrationResult<RecordText> {
        let mut text = RecordText::new();
        write!(text, "{},{},{}", self.baseline_min, self.baseline_max, self.baseline_avg)
            .map_err(|_| StoreError::Capacity)?;
        for threshold in &self.thresholds {
            write!(text, ",{}", threshold).map_err(|_| StoreError::Capacity)?;
        }
        Ok(text)
    }
}

impl SmokeCalibration {
    /// Hard-coded defaults, not calibrated
    pub const fn smoke_defaults() -> Self {
        Self {
            baseline_min: SMOKE_DEFAULT_BASELINE_MIN,
            baseline_max: SMOKE_DEFAULT_BASELINE_MAX,
            baseline_avg: SMOKE_DEFAULT_BASELINE_AVG,
            thresholds: SMOKE_DEFAULT_THRESHOLDS,
            is_calibrated: false,
        }
    }

    /// First rung
    pub fn caution(&self) -> i32 {
        self.thresholds[0]
    }

    /// DETECTED from here
    pub fn warning(&self) -> i32 {
        self.thresholds[1]
    }

    /// CRITICAL from here
    pub fn alarm(&self) -> i32 {
        self.thresholds[2]
    }
}

impl GasCalibration {
    /// Hard-coded defaults, not calibrated
    pub const fn gas_defaults() -> Self {
        Self {
            baseline_min: GAS_DEFAULT_BASELINE_MIN,
            baseline_max: GAS_DEFAULT_BASELINE_MAX,
            baseline_avg: GAS_DEFAULT_BASELINE_AVG,
            thresholds: GAS_DEFAULT_THRESHOLDS,
            is_calibrated: false,
        }
    }

    /// First rung
    pub fn caution(&self) -> i32 {
        self.thresholds[0]
    }

    /// Second rung; DETECTED from here
    pub fn warning(&self) -> i32 {
        self.thresholds[1]
    }

    /// CRITICAL from here
    pub fn alarm(&self) -> i32 {
        self.thresholds[2]
    }

    /// EXPLOSIVE from here
    pub fn explosive(&self) -> i32 {
        self.thresholds[3]
    }
}

impl CalibrationRecord for SmokeCalibration {
    const KEY: &'static str = keys::SMOKE;
    const FIELD_COUNT: usize = 6;

    fn validate(&self) -> CalibrationResult<()> {
        self.check_invariants()
    }

    fn encode(&self) -> CalibrationResult<RecordText> {
        self.validate()?;
        self.write_fields()
    }

    fn decode(text: &str) -> CalibrationResult<Self> {
        let fields = parse_fields::<i32, 6>(text)?;
        let calibration = Self::from_fields(&fields);
        calibration.validate()?;
        Ok(calibration)
    }
}

impl CalibrationRecord for GasCalibration {
    const KEY: &'static str = keys::GAS;
    const FIELD_COUNT: usize = 7;

    fn validate(&self) -> CalibrationResult<()> {
        self.check_invariants()
    }

    fn encode(&self) -> CalibrationResult<RecordText> {
        self.validate()?;
        self.write_fields()
    }

    fn decode(text: &str) -> CalibrationResult<Self> {
        let fields = parse_fields::<i32, 7>(text)?;
        let calibration = Self::from_fields(&fields);
        calibration.validate()?;
        Ok(calibration)
    }
}

/// Reference conditions the environment deltas are measured against
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvironmentBaseline {
    /// Reference temperature (°C)
    pub temperature_c: f32,
    /// Reference relative humidity (%)
    pub humidity_pct: f32,
    /// Reference pressure (hPa)
    pub pressure_hpa: f32,
    /// When the baseline was established; not persisted
    pub timestamp: Timestamp,
    /// False while running on hard-coded defaults
    pub is_calibrated: bool,
}

impl EnvironmentBaseline {
    /// Room conditions at sea level, not calibrated
    pub const fn defaults() -> Self {
        Self {
            temperature_c: DEFAULT_BASELINE_TEMP_C,
            humidity_pct: DEFAULT_BASELINE_HUMIDITY_PCT,
            pressure_hpa: SEA_LEVEL_PRESSURE_HPA,
            timestamp: 0,
            is_calibrated: false,
        }
    }

    /// A calibrated baseline from explicit values
    pub const fn new(temperature_c: f32, humidity_pct: f32, pressure_hpa: f32, timestamp: Timestamp) -> Self {
        Self {
            temperature_c,
            humidity_pct,
            pressure_hpa,
            timestamp,
            is_calibrated: true,
        }
    }
}

impl Default for EnvironmentBaseline {
    fn default() -> Self {
        Self::defaults()
    }
}

fn check_span(value: f32, (min, max): (f32, f32), field: &'static str) -> CalibrationResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(CalibrationError::OutOfRange { field });
    }
    Ok(())
}

impl CalibrationRecord for EnvironmentBaseline {
    const KEY: &'static str = keys::ENVIRONMENT;
    const FIELD_COUNT: usize = 3;

    fn validate(&self) -> CalibrationResult<()> {
        check_span(self.temperature_c, BASELINE_TEMP_RANGE_C, "temperature")?;
        check_span(self.humidity_pct, BASELINE_HUMIDITY_RANGE_PCT, "humidity")?;
        check_span(self.pressure_hpa, BASELINE_PRESSURE_RANGE_HPA, "pressure")
    }

    fn encode(&self) -> CalibrationResult<RecordText> {
        self.validate()?;
        let mut text = RecordText::new();
        write!(
            text,
            "{:.2},{:.2},{:.2}",
            self.temperature_c, self.humidity_pct, self.pressure_hpa
        )
        .map_err(|_| StoreError::Capacity)?;
        Ok(text)
    }

    fn decode(text: &str) -> CalibrationResult<Self> {
        let [temperature_c, humidity_pct, pressure_hpa] = parse_fields::<f32, 3>(text)?;
        let baseline = Self::new(temperature_c, humidity_pct, pressure_hpa, 0);
        baseline.validate()?;
        Ok(baseline)
    }
}
