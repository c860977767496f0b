//! Shared front end of the two analog channels
//!
//! Smoke and methane elements are read the same way: one ADC code per tick,
//! smoothed through a [`SamplingFilter`], gated by a heater warmup and
//! classified against a calibration ladder. Only the ladder length, filter
//! depth, warmup and multipliers differ, so they live here once.

use embedded_hal::delay::DelayNs;

use crate::{
    calibration::{self, AnalogCalibration, CalibrationRecord, SampleStats},
    constants::{
        sensors::{ADC_MAX, ADC_REFERENCE_V, GAS_VARIANCE_MULTIPLIERS, SMOKE_VARIANCE_MULTIPLIERS},
        time::{GAS_WARMUP_MS, SMOKE_WARMUP_MS},
    },
    errors::{CalibrationResult, SensorError},
    filter::SamplingFilter,
    time::{TimeSource, Timestamp, Warmup},
    traits::{AnalogSource, CalibrationStore},
};

/// Tunables of one analog channel
///
/// ```rust
/// use fireguard_core::channels::AnalogConfig;
///
/// let bench = AnalogConfig::gas().with_warmup_ms(5_000);
/// assert_eq!(bench.warmup_ms, 5_000);
/// assert_eq!(bench.multipliers, [3, 6, 10, 12]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalogConfig<const T: usize> {
    /// Channel name used in log lines
    pub name: &'static str,
    /// Heater warmup after `begin`; zero skips it
    pub warmup_ms: u64,
    /// Threshold multipliers applied to the clean-air variance
    pub multipliers: [i32; T],
}

impl AnalogConfig<3> {
    /// Smoke element: 60 s warmup, thresholds at 2/4/8 × variance
    pub const fn smoke() -> Self {
        Self {
            name: "smoke",
            warmup_ms: SMOKE_WARMUP_MS,
            multipliers: SMOKE_VARIANCE_MULTIPLIERS,
        }
    }
}

impl AnalogConfig<4> {
    /// Methane element: 180 s warmup, thresholds at 3/6/10/12 × variance
    pub const fn gas() -> Self {
        Self {
            name: "gas",
            warmup_ms: GAS_WARMUP_MS,
            multipliers: GAS_VARIANCE_MULTIPLIERS,
        }
    }
}

impl<const T: usize> AnalogConfig<T> {
    /// Override the warmup duration
    pub const fn with_warmup_ms(self, warmup_ms: u64) -> Self {
        Self {
            name: self.name,
            warmup_ms,
            multipliers: self.multipliers,
        }
    }

    /// Start classifying immediately after `begin`
    pub const fn without_warmup(self) -> Self {
        self.with_warmup_ms(0)
    }
}

impl Default for AnalogConfig<3> {
    fn default() -> Self {
        Self::smoke()
    }
}

impl Default for AnalogConfig<4> {
    fn default() -> Self {
        Self::gas()
    }
}

/// Outcome of one tick's conversion
#[derive(Debug, Clone, Copy)]
pub(crate) struct AnalogSample {
    /// Code delivered by the converter, 0 on a failed read
    pub raw: u16,
    /// Smoothed value; unchanged from the last tick on a fault
    pub filtered: i32,
    /// Why this tick's sample was discarded
    pub fault: Option<SensorError>,
}

/// Source, filter, warmup and calibration of one analog element
#[derive(Debug)]
pub(crate) struct AnalogFrontEnd<A, const N: usize, const T: usize> {
    source: A,
    filter: SamplingFilter<N>,
    warmup: Warmup,
    config: AnalogConfig<T>,
    calibration: AnalogCalibration<T>,
    defaults: AnalogCalibration<T>,
}

impl<A: AnalogSource, const N: usize, const T: usize> AnalogFrontEnd<A, N, T>
where
    AnalogCalibration<T>: CalibrationRecord,
{
    /// Front end running on `defaults` until `begin` loads a record
    pub fn new(source: A, config: AnalogConfig<T>, defaults: AnalogCalibration<T>) -> Self {
        Self {
            source,
            filter: SamplingFilter::new(),
            warmup: Warmup::new(config.warmup_ms),
            config,
            calibration: defaults,
            defaults,
        }
    }

    /// Load the persisted calibration and start the warmup clock
    pub fn begin<S: CalibrationStore + ?Sized>(&mut self, store: &mut S, now: Timestamp) {
        self.calibration = match calibration::load::<AnalogCalibration<T>, S>(store) {
            Ok(Some(loaded)) => {
                log_info!("{}: calibration loaded ({:?})", self.config.name, loaded.thresholds);
                loaded
            }
            Ok(None) => {
                log_info!("{}: no stored calibration, using defaults", self.config.name);
                self.defaults
            }
            Err(e) => {
                log_warn!("{}: stored calibration rejected ({}), using defaults", self.config.name, e);
                self.defaults
            }
        };

        self.filter.reset();
        self.warmup.start(now);
        if self.warmup.is_complete() {
            log_info!("{}: warmup skipped", self.config.name);
        } else {
            log_info!("{}: warming up for {} ms", self.config.name, self.config.warmup_ms);
        }
    }

    /// Convert one sample and feed the filter
    ///
    /// Failed and out-of-span samples never enter the filter.
    pub fn sample(&mut self, now: Timestamp) -> AnalogSample {
        if self.warmup.update(now) {
            log_info!("{}: warmup complete", self.config.name);
        }

        match self.read_checked() {
            Ok(raw) => AnalogSample {
                raw,
                filtered: self.filter.push(i32::from(raw)),
                fault: None,
            },
            Err((raw, fault)) => AnalogSample {
                raw,
                filtered: self.filter.average(),
                fault: Some(fault),
            },
        }
    }

    /// Measure clean air and derive a new ladder
    ///
    /// Takes `samples` raw reads, each followed by a `delay_ms` wait, bypassing
    /// the filter. Faulty reads are skipped. On success the calibration is
    /// applied, then persisted; a failed write leaves it applied and is
    /// reported as [`CalibrationError::Store`](crate::CalibrationError::Store).
    pub fn calibrate<C, S>(
        &mut self,
        samples: u32,
        delay_ms: u32,
        clock: &mut C,
        store: &mut S,
    ) -> CalibrationResult<AnalogCalibration<T>>
    where
        C: TimeSource + DelayNs,
        S: CalibrationStore + ?Sized,
    {
        log_info!("{}: calibrating over {} samples, {} ms apart", self.config.name, samples, delay_ms);

        let mut stats = SampleStats::new();
        let step = (samples / 10).max(1);

        for i in 0..samples {
            match self.read_checked() {
                Ok(raw) => stats.add(i32::from(raw)),
                Err((_, fault)) => {
                    log_warn!("{}: calibration sample skipped: {}", self.config.name, fault);
                }
            }

            if (i + 1) % step == 0 {
                log_debug!("{}: calibration {}%", self.config.name, (i + 1) * 100 / samples);
            }
            clock.delay_ms(delay_ms);
        }

        let fresh = match AnalogCalibration::from_stats(&stats, self.config.multipliers) {
            Ok(fresh) => fresh,
            Err(e) => {
                log_error!("{}: calibration rejected: {}", self.config.name, e);
                return Err(e);
            }
        };

        self.calibration = fresh;
        log_info!(
            "{}: calibrated at {} (range {}..{}), thresholds {:?}",
            self.config.name,
            fresh.baseline_avg,
            fresh.baseline_min,
            fresh.baseline_max,
            fresh.thresholds
        );

        if let Err(e) = calibration::save(&fresh, store) {
            log_error!("{}: calibration not persisted: {}", self.config.name, e);
            return Err(e);
        }
        Ok(fresh)
    }

    /// Back to the channel defaults
    pub fn reset_calibration(&mut self) {
        self.calibration = self.defaults;
        log_info!("{}: calibration reset to defaults", self.config.name);
    }

    /// Calibration in use
    pub fn calibration(&self) -> &AnalogCalibration<T> {
        &self.calibration
    }

    /// Advance the warmup to `now` without sampling
    pub fn update_warmup(&mut self, now: Timestamp) {
        if self.warmup.update(now) {
            log_info!("{}: warmup complete", self.config.name);
        }
    }

    /// Heater warmup elapsed
    pub fn is_warmed_up(&self) -> bool {
        self.warmup.is_complete()
    }

    /// Milliseconds of warmup left at `now`
    pub fn warmup_remaining_ms(&self, now: Timestamp) -> u64 {
        self.warmup.remaining_ms(now)
    }

    /// The converter
    pub fn source_mut(&mut self) -> &mut A {
        &mut self.source
    }

    fn read_checked(&mut self) -> Result<u16, (u16, SensorError)> {
        match nb::block!(self.source.read_raw()) {
            Ok(raw) if raw > ADC_MAX => Err((raw, SensorError::OutOfRange { raw, max: ADC_MAX })),
            Ok(raw) => Ok(raw),
            Err(e) => Err((0, e)),
        }
    }
}

/// Integer linear rescale with the usual truncating semantics
///
/// `(x − in_min) × (out_max − out_min) / (in_max − in_min) + out_min`.
/// A degenerate input span maps everything to `out_min`.
pub(crate) fn map_range(x: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    let span = i64::from(in_max) - i64::from(in_min);
    if span == 0 {
        return out_min;
    }
    let scaled = (i64::from(x) - i64::from(in_min)) * (i64::from(out_max) - i64::from(out_min)) / span;
    (scaled + i64::from(out_min)) as i32
}

/// Volts at the ADC pin for a code
pub(crate) fn to_voltage(code: i32) -> f32 {
    code as f32 / f32::from(ADC_MAX) * ADC_REFERENCE_V
}
