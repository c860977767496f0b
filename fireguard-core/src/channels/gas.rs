//! Methane channel
//!
//! Same front end as smoke with a deeper filter (15), a longer heater warmup
//! (180 s) and a fourth threshold: EXPLOSIVE. Reaching it is absolute; the
//! arbiter ranks it above every fire pattern.
//!
//! ## Concentration Estimate
//!
//! ```text
//! deviation = max(filtered − baseline_avg, 0)
//! ppm       = deviation × 50 000 / (explosive − baseline_avg)
//! LEL %     = ppm / 50 000 × 100
//! ```
//!
//! The scale pins the explosive threshold to 100 % LEL. It is a placeholder
//! heuristic, not a characterized sensor curve; above the explosive threshold
//! the figure keeps growing past 100 %.

use embedded_hal::delay::DelayNs;

use super::analog::{map_range, to_voltage, AnalogConfig, AnalogFrontEnd};
use crate::{
    calibration::GasCalibration,
    constants::sensors::{ADC_MAX, GAS_FILTER_DEPTH, METHANE_LEL_PPM},
    errors::{CalibrationError, CalibrationResult, SensorError},
    time::{TimeSource, Timestamp},
    traits::{AnalogSource, CalibrationStore},
};

/// Methane classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GasState {
    /// Heater still warming up
    #[default]
    Initializing,
    /// Below the warning threshold
    Normal,
    /// At or above the warning threshold
    Detected,
    /// At or above the alarm threshold
    Critical,
    /// At or above the explosive threshold
    Explosive,
    /// Sample could not be taken or was out of span
    Error,
}

impl GasState {
    /// Stable upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING",
            Self::Normal => "NORMAL",
            Self::Detected => "DETECTED",
            Self::Critical => "CRITICAL",
            Self::Explosive => "EXPLOSIVE",
            Self::Error => "ERROR",
        }
    }

    /// DETECTED or worse
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected | Self::Critical | Self::Explosive)
    }

    /// CRITICAL or EXPLOSIVE
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical | Self::Explosive)
    }

    /// EXPLOSIVE only
    pub fn is_explosive(&self) -> bool {
        *self == Self::Explosive
    }
}

impl core::fmt::Display for GasState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

const LADDER: [(usize, GasState); 3] = [
    (3, GasState::Explosive),
    (2, GasState::Critical),
    (1, GasState::Detected),
];

/// One methane sample with its derived quantities
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GasReading {
    /// Code from the converter this tick
    pub raw: u16,
    /// Moving average of accepted codes
    pub filtered: i32,
    /// Pin voltage of the filtered value
    pub voltage: f32,
    /// Position between clean air and the explosive threshold, 0..=100
    pub percentage: i32,
    /// Estimated methane concentration
    pub ppm: i32,
    /// Percentage of the lower explosive limit
    pub lel_pct: f32,
    /// Classification of this sample
    pub state: GasState,
    /// When it was taken
    pub timestamp: Timestamp,
}

impl GasReading {
    /// DETECTED or worse
    pub fn is_detected(&self) -> bool {
        self.state.is_detected()
    }

    /// CRITICAL or EXPLOSIVE
    pub fn is_critical(&self) -> bool {
        self.state.is_critical()
    }

    /// EXPLOSIVE only
    pub fn is_explosive(&self) -> bool {
        self.state.is_explosive()
    }
}

/// Classify a filtered value
///
/// Warmup wins over a fault, a fault wins over the ladder, and the highest
/// threshold reached decides.
pub fn classify(filtered: i32, warmed_up: bool, fault: Option<SensorError>, calibration: &GasCalibration) -> GasState {
    if !warmed_up {
        return GasState::Initializing;
    }
    if fault.is_some() {
        return GasState::Error;
    }

    LADDER
        .iter()
        .find(|(threshold, _)| filtered >= calibration.thresholds[*threshold])
        .map_or(GasState::Normal, |(_, state)| *state)
}

/// Percentage, ppm and LEL % of a filtered value
pub fn convert(filtered: i32, calibration: &GasCalibration) -> (i32, i32, f32) {
    let (percentage, ppm) = if calibration.is_calibrated {
        let range = (calibration.explosive() - calibration.baseline_avg).max(1);
        let deviation = (filtered - calibration.baseline_avg).max(0);
        (
            map_range(deviation.min(range), 0, range, 0, 100),
            map_range(deviation, 0, range, 0, METHANE_LEL_PPM),
        )
    } else {
        let adc_max = i32::from(ADC_MAX);
        (
            map_range(filtered, 0, adc_max, 0, 100),
            map_range(filtered, 0, adc_max, 0, METHANE_LEL_PPM),
        )
    };

    (percentage, ppm, lel_pct(ppm))
}

/// Share of the lower explosive limit a concentration represents
pub fn lel_pct(ppm: i32) -> f32 {
    ppm as f32 / METHANE_LEL_PPM as f32 * 100.0
}

/// Methane sensing channel over an analog source
pub struct GasChannel<A> {
    front: AnalogFrontEnd<A, GAS_FILTER_DEPTH, 4>,
    last: GasReading,
}

impl<A: AnalogSource> GasChannel<A> {
    /// Channel with the standard 180 s warmup
    pub fn new(source: A) -> Self {
        Self::with_config(source, AnalogConfig::gas())
    }

    /// Channel with explicit warmup and multipliers
    pub fn with_config(source: A, config: AnalogConfig<4>) -> Self {
        Self {
            front: AnalogFrontEnd::new(source, config, GasCalibration::gas_defaults()),
            last: GasReading::default(),
        }
    }

    /// Load calibration (defaults if absent or malformed) and start warmup
    pub fn begin<S: CalibrationStore + ?Sized>(&mut self, store: &mut S, now: Timestamp) {
        self.front.begin(store, now);
        self.last = GasReading {
            timestamp: now,
            ..GasReading::default()
        };
    }

    /// Take one sample, classify it and remember it as the last reading
    pub fn read(&mut self, now: Timestamp) -> GasReading {
        let sample = self.front.sample(now);
        let calibration = self.front.calibration();
        let (percentage, ppm, lel_pct) = convert(sample.filtered, calibration);
        let state = classify(sample.filtered, self.front.is_warmed_up(), sample.fault, calibration);

        if let Some(fault) = sample.fault {
            log_warn!("gas: sample rejected: {}", fault);
        }
        if state != self.last.state {
            if state.is_explosive() {
                log_error!("gas: EXPLOSIVE at {} ({:.0} % LEL)", sample.filtered, lel_pct);
            } else {
                log_info!("gas: {} -> {} (filtered {})", self.last.state, state, sample.filtered);
            }
        }

        self.last = GasReading {
            raw: sample.raw,
            filtered: sample.filtered,
            voltage: to_voltage(sample.filtered),
            percentage,
            ppm,
            lel_pct,
            state,
            timestamp: now,
        };
        self.last
    }

    /// Blocking clean-air calibration
    ///
    /// Refused with [`CalibrationError::NotWarmedUp`] while the heater is
    /// still warming; a cold element reads low and would set thresholds that
    /// alarm on clean air.
    pub fn calibrate<C, S>(
        &mut self,
        samples: u32,
        delay_ms: u32,
        clock: &mut C,
        store: &mut S,
    ) -> CalibrationResult<GasCalibration>
    where
        C: TimeSource + DelayNs,
        S: CalibrationStore + ?Sized,
    {
        self.front.update_warmup(clock.now());
        if !self.front.is_warmed_up() {
            log_warn!(
                "gas: calibration refused, {} ms of warmup left",
                self.front.warmup_remaining_ms(clock.now())
            );
            return Err(CalibrationError::NotWarmedUp);
        }
        self.front.calibrate(samples, delay_ms, clock, store)
    }

    /// Back to hard-coded defaults, uncalibrated; the stored record is untouched
    pub fn reset_calibration(&mut self) {
        self.front.reset_calibration();
    }

    /// Calibration in use
    pub fn calibration(&self) -> &GasCalibration {
        self.front.calibration()
    }

    /// Reading from the last `read`
    pub fn last_reading(&self) -> &GasReading {
        &self.last
    }

    /// State of the last reading
    pub fn state(&self) -> GasState {
        self.last.state
    }

    /// Last reading at DETECTED or worse
    pub fn is_detected(&self) -> bool {
        self.last.is_detected()
    }

    /// Last reading at CRITICAL or worse
    pub fn is_critical(&self) -> bool {
        self.last.is_critical()
    }

    /// Last reading at EXPLOSIVE
    pub fn is_explosive(&self) -> bool {
        self.last.is_explosive()
    }

    /// Heater warmup elapsed
    pub fn is_warmed_up(&self) -> bool {
        self.front.is_warmed_up()
    }

    /// Warmed up and running on a real calibration
    pub fn is_ready(&self) -> bool {
        self.front.is_warmed_up() && self.front.calibration().is_calibrated
    }

    /// Milliseconds of warmup left at `now`
    pub fn warmup_remaining_ms(&self, now: Timestamp) -> u64 {
        self.front.warmup_remaining_ms(now)
    }

    /// The underlying converter
    pub fn source_mut(&mut self) -> &mut A {
        self.front.source_mut()
    }
}
