//! Smoke channel
//!
//! Classifies particulate concentration from an optical/MEMS smoke element.
//!
//! ```text
//! raw ──► SamplingFilter<10> ──► filtered ──► ladder ──► SmokeState
//!                                   │
//!                                   └──► voltage, %, ppm
//! ```
//!
//! The caution threshold is stored with the calibration but does not move
//! the state; DETECTED starts at the warning threshold.

use embedded_hal::delay::DelayNs;

use super::analog::{map_range, to_voltage, AnalogConfig, AnalogFrontEnd};
use crate::{
    calibration::SmokeCalibration,
    constants::sensors::{ADC_MAX, SMOKE_FILTER_DEPTH, SMOKE_PPM_FULL_SCALE},
    errors::{CalibrationResult, SensorError},
    time::{TimeSource, Timestamp},
    traits::{AnalogSource, CalibrationStore},
};

/// Smoke classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SmokeState {
    /// Heater still warming up
    #[default]
    Initializing,
    /// Below the warning threshold
    Normal,
    /// At or above the warning threshold
    Detected,
    /// At or above the alarm threshold
    Critical,
    /// Sample could not be taken or was out of span
    Error,
}

impl SmokeState {
    /// Stable upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "INITIALIZING",
            Self::Normal => "NORMAL",
            Self::Detected => "DETECTED",
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
        }
    }
}

impl core::fmt::Display for SmokeState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filtered value at or above the threshold wins, highest first
const LADDER: [(usize, SmokeState); 2] = [(2, SmokeState::Critical), (1, SmokeState::Detected)];

/// One smoke sample with its derived quantities
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmokeReading {
    /// Code from the converter this tick
    pub raw: u16,
    /// Moving average of accepted codes
    pub filtered: i32,
    /// Pin voltage of the filtered value
    pub voltage: f32,
    /// 0..=100
    pub percentage: i32,
    /// Estimated concentration, 0..=1000
    pub ppm: i32,
    /// Classification of this sample
    pub state: SmokeState,
    /// When it was taken
    pub timestamp: Timestamp,
}

impl SmokeReading {
    /// DETECTED or CRITICAL
    pub fn is_detected(&self) -> bool {
        matches!(self.state, SmokeState::Detected | SmokeState::Critical)
    }

    /// CRITICAL only
    pub fn is_critical(&self) -> bool {
        self.state == SmokeState::Critical
    }
}

/// Map a filtered value to a state
///
/// Warmup wins over everything; a faulty sample wins over the ladder.
pub fn classify(filtered: i32, warmed_up: bool, fault: Option<SensorError>, calibration: &SmokeCalibration) -> SmokeState {
    if !warmed_up {
        return SmokeState::Initializing;
    }
    if fault.is_some() {
        return SmokeState::Error;
    }

    LADDER
        .iter()
        .find(|(threshold, _)| filtered >= calibration.thresholds[*threshold])
        .map_or(SmokeState::Normal, |(_, state)| *state)
}

/// Percentage and ppm of a filtered value
///
/// Uncalibrated, the whole ADC span maps linearly. Calibrated, the deviation
/// above the clean-air average is clamped to the alarm distance and rescaled.
/// The ppm figure is an uncalibrated estimate, not a measured concentration.
pub fn convert(filtered: i32, calibration: &SmokeCalibration) -> (i32, i32) {
    if !calibration.is_calibrated {
        let adc_max = i32::from(ADC_MAX);
        return (
            map_range(filtered, 0, adc_max, 0, 100),
            map_range(filtered, 0, adc_max, 0, SMOKE_PPM_FULL_SCALE),
        );
    }

    let range = (calibration.alarm() - calibration.baseline_avg).max(1);
    let deviation = (filtered - calibration.baseline_avg).clamp(0, range);
    (
        map_range(deviation, 0, range, 0, 100),
        map_range(deviation, 0, range, 0, SMOKE_PPM_FULL_SCALE),
    )
}

/// Smoke sensing channel over an analog source
pub struct SmokeChannel<A> {
    front: AnalogFrontEnd<A, SMOKE_FILTER_DEPTH, 3>,
    last: SmokeReading,
}

impl<A: AnalogSource> SmokeChannel<A> {
    /// Channel with the standard 60 s warmup
    pub fn new(source: A) -> Self {
        Self::with_config(source, AnalogConfig::smoke())
    }

    /// Channel with explicit warmup and multipliers
    pub fn with_config(source: A, config: AnalogConfig<3>) -> Self {
        Self {
            front: AnalogFrontEnd::new(source, config, SmokeCalibration::smoke_defaults()),
            last: SmokeReading::default(),
        }
    }

    /// Load calibration (defaults if absent or malformed) and start warmup
    pub fn begin<S: CalibrationStore + ?Sized>(&mut self, store: &mut S, now: Timestamp) {
        self.front.begin(store, now);
        self.last = SmokeReading {
            timestamp: now,
            ..SmokeReading::default()
        };
    }

    /// Take one sample, classify it and remember it as the last reading
    pub fn read(&mut self, now: Timestamp) -> SmokeReading {
        let sample = self.front.sample(now);
        let calibration = self.front.calibration();
        let (percentage, ppm) = convert(sample.filtered, calibration);
        let state = classify(sample.filtered, self.front.is_warmed_up(), sample.fault, calibration);

        if let Some(fault) = sample.fault {
            log_warn!("smoke: sample rejected: {}", fault);
        }
        if state != self.last.state {
            log_info!("smoke: {} -> {} (filtered {})", self.last.state, state, sample.filtered);
        }

        self.last = SmokeReading {
            raw: sample.raw,
            filtered: sample.filtered,
            voltage: to_voltage(sample.filtered),
            percentage,
            ppm,
            state,
            timestamp: now,
        };
        self.last
    }

    /// Blocking clean-air calibration; replaces the ladder on success
    pub fn calibrate<C, S>(
        &mut self,
        samples: u32,
        delay_ms: u32,
        clock: &mut C,
        store: &mut S,
    ) -> CalibrationResult<SmokeCalibration>
    where
        C: TimeSource + DelayNs,
        S: CalibrationStore + ?Sized,
    {
        self.front.update_warmup(clock.now());
        self.front.calibrate(samples, delay_ms, clock, store)
    }

    /// Back to hard-coded defaults, uncalibrated; the stored record is untouched
    pub fn reset_calibration(&mut self) {
        self.front.reset_calibration();
    }

    /// Calibration in use
    pub fn calibration(&self) -> &SmokeCalibration {
        self.front.calibration()
    }

    /// Reading from the last `read`
    pub fn last_reading(&self) -> &SmokeReading {
        &self.last
    }

    /// State of the last reading
    pub fn state(&self) -> SmokeState {
        self.last.state
    }

    /// Last reading at DETECTED or worse
    pub fn is_detected(&self) -> bool {
        self.last.is_detected()
    }

    /// Last reading at CRITICAL
    pub fn is_critical(&self) -> bool {
        self.last.is_critical()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        calibration::CalibrationRecord,
        channels::mock::ScriptedAdc,
        store::MemoryStore,
        time::ManualClock,
        CalibrationError,
    };

    fn warm_channel(level: u16) -> (SmokeChannel<ScriptedAdc>, MemoryStore) {
        let mut store = MemoryStore::<4>::new();
        let mut channel = SmokeChannel::with_config(
            ScriptedAdc::constant(level),
            AnalogConfig::smoke().without_warmup(),
        );
        channel.begin(&mut store, 0);
        (channel, store)
    }

    fn settle(channel: &mut SmokeChannel<ScriptedAdc>) -> SmokeReading {
        let mut reading = SmokeReading::default();
        for tick in 0..SMOKE_FILTER_DEPTH as u64 {
            reading = channel.read(tick * 5_000);
        }
        reading
    }

    #[test]
    fn initializing_until_warmup_elapses() {
        let mut store = MemoryStore::<4>::new();
        let mut channel = SmokeChannel::new(ScriptedAdc::constant(3000));
        channel.begin(&mut store, 1_000);

        assert_eq!(channel.read(30_000).state, SmokeState::Initializing);
        assert_eq!(channel.read(60_999).state, SmokeState::Initializing);
        assert!(!channel.is_warmed_up());

        // Three samples of 3000 through a 10-deep filter: 900
        assert_eq!(channel.read(61_000).state, SmokeState::Detected);
        assert!(channel.is_warmed_up());
    }

    #[test]
    fn warning_threshold_boundary() {
        // Default warning is 800
        let (mut channel, _) = warm_channel(799);
        assert_eq!(settle(&mut channel).state, SmokeState::Normal);

        let (mut channel, _) = warm_channel(800);
        let reading = settle(&mut channel);
        assert_eq!(reading.state, SmokeState::Detected);
        assert!(reading.is_detected());
        assert!(!reading.is_critical());
    }

    #[test]
    fn alarm_threshold_boundary() {
        let (mut channel, _) = warm_channel(1499);
        assert_eq!(settle(&mut channel).state, SmokeState::Detected);

        let (mut channel, _) = warm_channel(1500);
        assert_eq!(settle(&mut channel).state, SmokeState::Critical);
        assert!(channel.is_critical());
    }

    #[test]
    fn caution_does_not_change_state() {
        let (mut channel, _) = warm_channel(600);
        assert_eq!(settle(&mut channel).state, SmokeState::Normal);
    }

    #[test]
    fn steady_signal_is_idempotent() {
        let (mut channel, _) = warm_channel(900);
        let first = settle(&mut channel);
        let second = channel.read(100_000);
        assert_eq!(first.state, second.state);
        assert_eq!(first.filtered, second.filtered);
        assert_eq!(first.ppm, second.ppm);
    }

    #[test]
    fn out_of_span_sample_is_error_and_not_filtered() {
        let (mut channel, _) = warm_channel(400);
        let settled = settle(&mut channel);

        channel.source_mut().set(5000);
        let reading = channel.read(60_000);
        assert_eq!(reading.state, SmokeState::Error);
        assert_eq!(reading.filtered, settled.filtered);

        channel.source_mut().set(400);
        assert_eq!(channel.read(65_000).state, SmokeState::Normal);
    }

    #[test]
    fn read_failure_is_error() {
        let (mut channel, _) = warm_channel(400);
        channel.source_mut().fail();
        assert_eq!(channel.read(5_000).state, SmokeState::Error);
    }

    #[test]
    fn uncalibrated_conversion_spans_adc() {
        let defaults = SmokeCalibration::smoke_defaults();
        assert_eq!(convert(4095, &defaults), (100, 1000));
        assert_eq!(convert(0, &defaults), (0, 0));
        assert_eq!(convert(2048, &defaults), (50, 500));
    }

    #[test]
    fn calibrated_conversion_clamps_to_alarm() {
        let cal = SmokeCalibration::decode("180,220,200,240,280,360").unwrap();
        assert_eq!(convert(100, &cal), (0, 0));
        assert_eq!(convert(280, &cal), (50, 500));
        assert_eq!(convert(4000, &cal), (100, 1000));
    }

    #[test]
    fn calibration_replaces_ladder_and_persists() {
        let (mut channel, mut store) = warm_channel(200);
        channel.source_mut().script(&[180, 220, 200, 200]);
        let mut clock = ManualClock::new(0);

        let cal = channel.calibrate(4, 1_000, &mut clock, &mut store).unwrap();
        assert_eq!(cal.thresholds, [240, 280, 360]);
        assert_eq!(clock.now(), 4_000);
        assert!(channel.is_ready());

        let stored = store.read(SmokeCalibration::KEY).unwrap().unwrap();
        assert_eq!(stored.as_str(), "180,220,200,240,280,360");
    }

    #[test]
    fn flat_calibration_keeps_previous_ladder() {
        let (mut channel, mut store) = warm_channel(300);
        let mut clock = ManualClock::new(0);

        let result = channel.calibrate(10, 100, &mut clock, &mut store);
        assert_eq!(result, Err(CalibrationError::ThresholdsNotAscending));
        assert_eq!(channel.calibration(), &SmokeCalibration::smoke_defaults());
        assert!(store.is_empty());
    }

    #[test]
    fn failed_persist_still_applies() {
        let (mut channel, mut store) = warm_channel(200);
        channel.source_mut().script(&[180, 220]);
        store.set_read_only(true);
        let mut clock = ManualClock::new(0);

        let result = channel.calibrate(2, 10, &mut clock, &mut store);
        assert!(matches!(result, Err(CalibrationError::Store(_))));
        assert!(channel.calibration().is_calibrated);
    }

    #[test]
    fn stored_calibration_is_loaded_and_reset_restores_defaults() {
        let mut store = MemoryStore::<4>::new();
        store.write(SmokeCalibration::KEY, "180,220,200,240,280,360").unwrap();

        let mut channel = SmokeChannel::new(ScriptedAdc::constant(0));
        channel.begin(&mut store, 0);
        assert_eq!(channel.calibration().alarm(), 360);

        channel.reset_calibration();
        assert_eq!(channel.calibration(), &SmokeCalibration::smoke_defaults());
    }

    #[test]
    fn malformed_record_falls_back_to_defaults() {
        let mut store = MemoryStore::<4>::new();
        store.write(SmokeCalibration::KEY, "180,220,200").unwrap();

        let mut channel = SmokeChannel::new(ScriptedAdc::constant(0));
        channel.begin(&mut store, 0);
        assert_eq!(channel.calibration(), &SmokeCalibration::smoke_defaults());
    }

    #[test]
    fn state_names() {
        assert_eq!(SmokeState::Initializing.as_str(), "INITIALIZING");
        assert_eq!(SmokeState::Critical.as_str(), "CRITICAL");
    }
}
