//! Environment channel: temperature, humidity and pressure
//!
//! ## Subsystems
//!
//! | Subsystem  | Provides                         |
//! |------------|----------------------------------|
//! | Hygrometer | temperature, relative humidity   |
//! | Barometer  | temperature, pressure, altitude  |
//!
//! Either may be missing. The channel works with whichever answered at
//! `begin` and reports ERROR only when neither delivers a sample.
//!
//! ## Cascade
//!
//! Evaluated top to bottom, first match wins:
//!
//! ```text
//! FIRE_SUSPECTED   ΔT > 20  ∧ ΔP < −3 ∧ ΔRH < −20
//! RAPID_TEMP_RISE  rate > 5 °C/min ∧ ΔT > 10
//! PRESSURE_DROP    ΔP < −5
//! HIGH_TEMP        ΔT > 15
//! LOW_HUMIDITY     RH < 20
//! HIGH_HUMIDITY    RH > 80
//! NORMAL
//! ```
//!
//! A missing quantity has a zero delta and never satisfies a humidity rule.

use embedded_hal::delay::DelayNs;

use crate::{
    buffer::TrendBuffer,
    calibration::{self, CalibrationRecord, EnvironmentBaseline},
    constants::{
        sensors::{BASELINE_SAMPLES, SEA_LEVEL_PRESSURE_HPA, TREND_CAPACITY},
        thresholds::*,
        time::BASELINE_SAMPLE_INTERVAL_MS,
    },
    errors::{CalibrationError, CalibrationResult, SensorError, SensorResult},
    time::{TimeSource, Timestamp},
    traits::{BarometricSensor, CalibrationStore, HygrometerSensor},
};

/// Environment classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnvironmentState {
    /// No rule matched
    #[default]
    Normal,
    /// More than 15 °C above baseline
    HighTemp,
    /// Heating faster than 5 °C/min while over 10 °C above baseline
    RapidTempRise,
    /// Under 20 % relative humidity
    LowHumidity,
    /// Over 80 % relative humidity
    HighHumidity,
    /// More than 5 hPa below baseline
    PressureDrop,
    /// Heat, pressure drop and drying together
    FireSuspected,
    /// No subsystem delivered a sample
    Error,
}

impl EnvironmentState {
    /// Stable upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::HighTemp => "HIGH_TEMP",
            Self::RapidTempRise => "RAPID_TEMP_RISE",
            Self::LowHumidity => "LOW_HUMIDITY",
            Self::HighHumidity => "HIGH_HUMIDITY",
            Self::PressureDrop => "PRESSURE_DROP",
            Self::FireSuspected => "FIRE_SUSPECTED",
            Self::Error => "ERROR",
        }
    }
}

impl core::fmt::Display for EnvironmentState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One environment sample with deltas and trends
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvironmentReading {
    /// Fused temperature (°C): mean of both sensors when both answered
    pub temperature_c: f32,
    /// Hygrometer's own temperature
    pub hygrometer_temperature_c: Option<f32>,
    /// Barometer's own temperature
    pub barometer_temperature_c: Option<f32>,
    /// `None` without a hygrometer
    pub humidity_pct: Option<f32>,
    /// `None` without a barometer
    pub pressure_hpa: Option<f32>,
    /// Above sea level from the standard atmosphere, metres
    pub altitude_m: Option<f32>,

    /// Against the baseline (°C)
    pub temp_delta: f32,
    /// Against the baseline (%), zero without a hygrometer
    pub humidity_delta: f32,
    /// Against the baseline (hPa), zero without a barometer
    pub pressure_delta: f32,

    /// °C per minute across the trend window
    pub temp_rate: f32,
    /// hPa per minute across the trend window
    pub pressure_rate: f32,

    /// Informational score in 0..=1
    pub fire_probability: f32,

    /// Classification of this sample
    pub state: EnvironmentState,
    /// When it was taken
    pub timestamp: Timestamp,
}

impl EnvironmentReading {
    /// FIRE_SUSPECTED or RAPID_TEMP_RISE
    pub fn is_fire_suspected(&self) -> bool {
        matches!(self.state, EnvironmentState::FireSuspected | EnvironmentState::RapidTempRise)
    }

    /// More than 15 °C above baseline
    pub fn is_high_temperature(&self) -> bool {
        self.temp_delta > HIGH_TEMP_DELTA_C
    }

    /// More than 5 hPa below baseline
    pub fn is_pressure_drop(&self) -> bool {
        self.pressure_delta < PRESSURE_DROP_HPA
    }

    fn humidity_below(&self, limit: f32) -> bool {
        self.humidity_pct.map_or(false, |h| h < limit)
    }

    fn humidity_above(&self, limit: f32) -> bool {
        self.humidity_pct.map_or(false, |h| h > limit)
    }
}

fn fire_pattern(r: &EnvironmentReading) -> bool {
    r.temp_delta > FIRE_PATTERN_TEMP_DELTA_C
        && r.pressure_delta < FIRE_PATTERN_PRESSURE_DELTA_HPA
        && r.humidity_delta < FIRE_PATTERN_HUMIDITY_DELTA_PCT
}

fn rapid_rise(r: &EnvironmentReading) -> bool {
    r.temp_rate > RAPID_RISE_RATE_C_PER_MIN && r.temp_delta > RAPID_RISE_TEMP_DELTA_C
}

fn pressure_drop(r: &EnvironmentReading) -> bool {
    r.is_pressure_drop()
}

fn high_temp(r: &EnvironmentReading) -> bool {
    r.is_high_temperature()
}

fn low_humidity(r: &EnvironmentReading) -> bool {
    r.humidity_below(LOW_HUMIDITY_PCT)
}

fn high_humidity(r: &EnvironmentReading) -> bool {
    r.humidity_above(HIGH_HUMIDITY_PCT)
}

const CASCADE: [(fn(&EnvironmentReading) -> bool, EnvironmentState); 6] = [
    (fire_pattern, EnvironmentState::FireSuspected),
    (rapid_rise, EnvironmentState::RapidTempRise),
    (pressure_drop, EnvironmentState::PressureDrop),
    (high_temp, EnvironmentState::HighTemp),
    (low_humidity, EnvironmentState::LowHumidity),
    (high_humidity, EnvironmentState::HighHumidity),
];

/// First matching cascade rule, NORMAL when none match
pub fn classify(reading: &EnvironmentReading) -> EnvironmentState {
    CASCADE
        .iter()
        .find(|(predicate, _)| predicate(reading))
        .map_or(EnvironmentState::Normal, |(_, state)| *state)
}

/// Heuristic fire likelihood, clamped to 0..=1
///
/// Not part of the alert decision.
pub fn fire_probability(reading: &EnvironmentReading) -> f32 {
    let mut score: f32 = 0.0;

    if reading.temperature_c > PROBABILITY_TEMP_CRITICAL_C {
        score += 0.5;
    } else if reading.temperature_c > PROBABILITY_TEMP_HIGH_C {
        score += 0.3;
    } else if reading.temp_delta > HIGH_TEMP_DELTA_C {
        score += 0.2;
    }

    if reading.temp_rate > PROBABILITY_RATE_VERY_FAST_C_PER_MIN {
        score += 0.4;
    } else if reading.temp_rate > RAPID_RISE_RATE_C_PER_MIN {
        score += 0.2;
    }

    if reading.humidity_below(LOW_HUMIDITY_PCT) {
        score += 0.2;
    } else if reading.humidity_below(PROBABILITY_HUMIDITY_DRY_PCT) {
        score += 0.1;
    }

    if reading.pressure_delta < PRESSURE_DROP_HPA {
        score += 0.3;
    } else if reading.pressure_delta < FIRE_PATTERN_PRESSURE_DELTA_HPA {
        score += 0.15;
    }

    let indicators = [
        reading.temp_delta > HIGH_TEMP_DELTA_C,
        reading.temp_rate > RAPID_RISE_RATE_C_PER_MIN,
        reading.humidity_below(PROBABILITY_HUMIDITY_DRY_PCT),
        reading.pressure_delta < FIRE_PATTERN_PRESSURE_DELTA_HPA,
    ]
    .iter()
    .filter(|&&hit| hit)
    .count();

    score += match indicators {
        0 | 1 => 0.0,
        2 => 0.15,
        _ => 0.3,
    };

    score.clamp(0.0, 1.0)
}

/// Altitude of a station pressure in the international standard atmosphere
pub fn altitude_m(pressure_hpa: f32) -> f32 {
    44_330.0 * (1.0 - libm::powf(pressure_hpa / SEA_LEVEL_PRESSURE_HPA, 0.1903))
}

/// Baseline calibration pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Readings averaged into a baseline
    pub baseline_samples: u32,
    /// Pause between those readings
    pub baseline_interval_ms: u32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            baseline_samples: BASELINE_SAMPLES,
            baseline_interval_ms: BASELINE_SAMPLE_INTERVAL_MS,
        }
    }
}

/// Environment sensing channel over a hygrometer and a barometer
pub struct EnvironmentChannel<H, B> {
    hygrometer: H,
    barometer: B,
    hygrometer_ready: bool,
    barometer_ready: bool,
    config: EnvironmentConfig,
    baseline: EnvironmentBaseline,
    temp_trend: TrendBuffer<TREND_CAPACITY>,
    pressure_trend: TrendBuffer<TREND_CAPACITY>,
    last: EnvironmentReading,
}

impl<H: HygrometerSensor, B: BarometricSensor> EnvironmentChannel<H, B> {
    /// Channel with the default baseline schedule
    pub fn new(hygrometer: H, barometer: B) -> Self {
        Self::with_config(hygrometer, barometer, EnvironmentConfig::default())
    }

    /// Channel with an explicit baseline schedule
    pub fn with_config(hygrometer: H, barometer: B, config: EnvironmentConfig) -> Self {
        Self {
            hygrometer,
            barometer,
            hygrometer_ready: false,
            barometer_ready: false,
            config,
            baseline: EnvironmentBaseline::defaults(),
            temp_trend: TrendBuffer::new(),
            pressure_trend: TrendBuffer::new(),
            last: EnvironmentReading::default(),
        }
    }

    /// Initialise both subsystems, load the baseline and take a first reading
    ///
    /// Fails with [`SensorError::NoSubsystem`] only when neither answers.
    pub fn begin<S: CalibrationStore + ?Sized>(&mut self, store: &mut S, now: Timestamp) -> SensorResult<()> {
        self.hygrometer_ready = match self.hygrometer.init() {
            Ok(()) => true,
            Err(e) => {
                log_warn!("environment: hygrometer unavailable: {}", e);
                false
            }
        };
        self.barometer_ready = match self.barometer.init() {
            Ok(()) => true,
            Err(e) => {
                log_warn!("environment: barometer unavailable: {}", e);
                false
            }
        };

        self.baseline = match calibration::load::<EnvironmentBaseline, S>(store) {
            Ok(Some(loaded)) => {
                log_info!(
                    "environment: baseline loaded ({:.2} °C, {:.2} %, {:.2} hPa)",
                    loaded.temperature_c,
                    loaded.humidity_pct,
                    loaded.pressure_hpa
                );
                loaded
            }
            Ok(None) => {
                log_info!("environment: no stored baseline, using defaults");
                EnvironmentBaseline::defaults()
            }
            Err(e) => {
                log_warn!("environment: stored baseline rejected ({}), using defaults", e);
                EnvironmentBaseline::defaults()
            }
        };

        if !self.is_ready() {
            log_error!("environment: no sensor subsystem answered");
            self.last = EnvironmentReading {
                state: EnvironmentState::Error,
                timestamp: now,
                ..EnvironmentReading::default()
            };
            return Err(SensorError::NoSubsystem);
        }

        self.read(now);
        Ok(())
    }

    /// Sample both subsystems, update trends and classify
    pub fn read(&mut self, now: Timestamp) -> EnvironmentReading {
        let hygro = if self.hygrometer_ready {
            self.hygrometer
                .read()
                .and_then(|s| finite(s.temperature_c).and(finite(s.humidity_pct)).map(|_| s))
                .map_err(|e| log_warn!("environment: hygrometer read failed: {}", e))
                .ok()
        } else {
            None
        };
        let baro = if self.barometer_ready {
            self.barometer
                .read()
                .and_then(|s| finite(s.temperature_c).and(finite(s.pressure_hpa)).map(|_| s))
                .map_err(|e| log_warn!("environment: barometer read failed: {}", e))
                .ok()
        } else {
            None
        };

        let temperature_c = match (hygro, baro) {
            (Some(h), Some(b)) => (h.temperature_c + b.temperature_c) / 2.0,
            (Some(h), None) => h.temperature_c,
            (None, Some(b)) => b.temperature_c,
            (None, None) => {
                if self.last.state != EnvironmentState::Error {
                    log_error!("environment: no subsystem delivered a sample");
                }
                self.last = EnvironmentReading {
                    state: EnvironmentState::Error,
                    timestamp: now,
                    ..EnvironmentReading::default()
                };
                return self.last;
            }
        };

        let humidity_pct = hygro.map(|h| h.humidity_pct);
        let pressure_hpa = baro.map(|b| b.pressure_hpa);

        self.temp_trend.record(temperature_c, now);
        if let Some(pressure) = pressure_hpa {
            self.pressure_trend.record(pressure, now);
        }

        let mut reading = EnvironmentReading {
            temperature_c,
            hygrometer_temperature_c: hygro.map(|h| h.temperature_c),
            barometer_temperature_c: baro.map(|b| b.temperature_c),
            humidity_pct,
            pressure_hpa,
            altitude_m: pressure_hpa.map(altitude_m),
            temp_delta: temperature_c - self.baseline.temperature_c,
            humidity_delta: humidity_pct.map_or(0.0, |h| h - self.baseline.humidity_pct),
            pressure_delta: pressure_hpa.map_or(0.0, |p| p - self.baseline.pressure_hpa),
            temp_rate: self.temp_trend.rate_per_minute(),
            pressure_rate: self.pressure_trend.rate_per_minute(),
            fire_probability: 0.0,
            state: EnvironmentState::Normal,
            timestamp: now,
        };
        reading.state = classify(&reading);
        reading.fire_probability = fire_probability(&reading);

        if reading.state != self.last.state {
            log_info!(
                "environment: {} -> {} (ΔT {:.1}, rate {:.1} °C/min)",
                self.last.state,
                reading.state,
                reading.temp_delta,
                reading.temp_rate
            );
        }

        self.last = reading;
        reading
    }

    /// Average the configured number of readings into a new baseline
    ///
    /// Blocks for `baseline_samples × baseline_interval_ms`. Quantities whose
    /// subsystem is missing keep their current baseline value.
    pub fn calibrate_baseline<C, S>(&mut self, clock: &mut C, store: &mut S) -> CalibrationResult<EnvironmentBaseline>
    where
        C: TimeSource + DelayNs,
        S: CalibrationStore + ?Sized,
    {
        if !self.is_ready() {
            log_warn!("environment: baseline calibration refused, no subsystem ready");
            return Err(CalibrationError::NotReady);
        }

        let samples = self.config.baseline_samples;
        log_info!(
            "environment: baseline over {} samples, {} ms apart",
            samples,
            self.config.baseline_interval_ms
        );

        let mut temperature = Mean::default();
        let mut humidity = Mean::default();
        let mut pressure = Mean::default();
        let step = (samples / 10).max(1);

        for i in 0..samples {
            let reading = self.read(clock.now());
            if reading.state != EnvironmentState::Error {
                temperature.add(reading.temperature_c);
            }
            if let Some(h) = reading.humidity_pct {
                humidity.add(h);
            }
            if let Some(p) = reading.pressure_hpa {
                pressure.add(p);
            }

            if (i + 1) % step == 0 {
                log_debug!(
                    "environment: baseline {}% (T {:.1} RH {:?} P {:?})",
                    (i + 1) * 100 / samples,
                    reading.temperature_c,
                    reading.humidity_pct,
                    reading.pressure_hpa
                );
            }
            clock.delay_ms(self.config.baseline_interval_ms);
        }

        let temperature_c = temperature.value().ok_or(CalibrationError::NoSamples)?;
        let fresh = EnvironmentBaseline::new(
            temperature_c,
            humidity.value().unwrap_or(self.baseline.humidity_pct),
            pressure.value().unwrap_or(self.baseline.pressure_hpa),
            clock.now(),
        );
        if let Err(e) = fresh.validate() {
            log_error!("environment: baseline rejected: {}", e);
            return Err(e);
        }

        self.baseline = fresh;
        log_info!(
            "environment: baseline {:.2} °C, {:.2} %, {:.2} hPa",
            fresh.temperature_c,
            fresh.humidity_pct,
            fresh.pressure_hpa
        );

        if let Err(e) = calibration::save(&fresh, store) {
            log_error!("environment: baseline not persisted: {}", e);
            return Err(e);
        }
        Ok(fresh)
    }

    /// Replace the baseline with known reference values; not persisted
    pub fn set_baseline(
        &mut self,
        temperature_c: f32,
        humidity_pct: f32,
        pressure_hpa: f32,
        now: Timestamp,
    ) -> CalibrationResult<()> {
        let baseline = EnvironmentBaseline::new(temperature_c, humidity_pct, pressure_hpa, now);
        baseline.validate()?;
        self.baseline = baseline;
        Ok(())
    }

    /// Back to 25 °C / 50 % / 1013.25 hPa, uncalibrated
    pub fn reset_calibration(&mut self) {
        self.baseline = EnvironmentBaseline::defaults();
        log_info!("environment: baseline reset to defaults");
    }

    /// Baseline the deltas are measured against
    pub fn baseline(&self) -> &EnvironmentBaseline {
        &self.baseline
    }

    /// Reading from the last `read`
    pub fn last_reading(&self) -> &EnvironmentReading {
        &self.last
    }

    /// State of the last reading
    pub fn state(&self) -> EnvironmentState {
        self.last.state
    }

    /// Last reading suggests a fire
    pub fn is_fire_suspected(&self) -> bool {
        self.last.is_fire_suspected()
    }

    /// Last reading is well above baseline temperature
    pub fn is_high_temperature(&self) -> bool {
        self.last.is_high_temperature()
    }

    /// Last reading shows a pressure drop
    pub fn is_pressure_drop(&self) -> bool {
        self.last.is_pressure_drop()
    }

    /// At least one subsystem answered at `begin`
    pub fn is_ready(&self) -> bool {
        self.hygrometer_ready || self.barometer_ready
    }

    /// Hygrometer answered at `begin`
    pub fn is_hygrometer_ready(&self) -> bool {
        self.hygrometer_ready
    }

    /// Barometer answered at `begin`
    pub fn is_barometer_ready(&self) -> bool {
        self.barometer_ready
    }

    /// The hygrometer
    pub fn hygrometer_mut(&mut self) -> &mut H {
        &mut self.hygrometer
    }

    /// The barometer
    pub fn barometer_mut(&mut self) -> &mut B {
        &mut self.barometer
    }
}

fn finite(value: f32) -> SensorResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SensorError::InvalidValue)
    }
}

#[derive(Debug, Default)]
struct Mean {
    sum: f32,
    count: u32,
}

impl Mean {
    fn add(&mut self, value: f32) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> Option<f32> {
        (self.count > 0).then(|| self.sum / self.count as f32)
    }
}
