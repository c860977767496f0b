//! Device orchestration
//!
//! [`FireGuard`] owns the three channels and the calibration store for the
//! device's lifetime. The firmware's polling loop calls [`FireGuard::tick`]
//! on a fixed cadence; each tick reads every channel, arbitrates, and reports
//! whether the global level changed.
//!
//! ```rust
//! use fireguard_core::{
//!     channels::AnalogConfig, store::MemoryStore, traits::Absent, AlertLevel, AnalogSource,
//!     EnvironmentChannel, FireGuard, GasChannel, SensorError, SmokeChannel,
//! };
//!
//! struct Quiet;
//! impl AnalogSource for Quiet {
//!     fn read_raw(&mut self) -> nb::Result<u16, SensorError> {
//!         Ok(120)
//!     }
//! }
//!
//! let mut device = FireGuard::new(
//!     SmokeChannel::with_config(Quiet, AnalogConfig::smoke().without_warmup()),
//!     GasChannel::with_config(Quiet, AnalogConfig::gas().without_warmup()),
//!     EnvironmentChannel::new(Absent, Absent),
//!     MemoryStore::<4>::new(),
//! );
//!
//! // No environment sensors fitted: begin reports it, sampling still works
//! assert!(device.begin(0).is_err());
//! let outcome = device.tick(5_000);
//! assert_eq!(outcome.level, AlertLevel::Normal);
//! assert!(outcome.transition.is_none());
//! ```

use embedded_hal::delay::DelayNs;

use crate::{
    arbiter::{AlertArbiter, AlertInputs, AlertLevel, NotificationPriority},
    calibration::{EnvironmentBaseline, GasCalibration, SmokeCalibration},
    channels::{
        EnvironmentChannel, EnvironmentReading, GasChannel, GasReading, SmokeChannel, SmokeReading,
    },
    errors::{CalibrationResult, SensorResult},
    time::{TimeSource, Timestamp},
    traits::{AnalogSource, BarometricSensor, CalibrationStore, HygrometerSensor},
};

/// A change of global level between two ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Level before the tick
    pub from: AlertLevel,
    /// Level after it
    pub to: AlertLevel,
    /// Urgency of the new level
    pub notification: NotificationPriority,
    /// Rule that produced the new level, `None` for NORMAL
    pub rule: Option<&'static str>,
}

impl Transition {
    /// The new level is more severe than the old one
    pub fn is_escalation(&self) -> bool {
        self.to > self.from
    }
}

/// Everything one tick produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Smoke reading of this tick
    pub smoke: SmokeReading,
    /// Methane reading of this tick
    pub gas: GasReading,
    /// Environment reading of this tick
    pub environment: EnvironmentReading,
    /// Arbitrated level
    pub level: AlertLevel,
    /// Set when the level differs from the previous tick
    pub transition: Option<Transition>,
}

/// The sensing and decision core of one device
pub struct FireGuard<SA, GA, H, B, S> {
    smoke: SmokeChannel<SA>,
    gas: GasChannel<GA>,
    environment: EnvironmentChannel<H, B>,
    store: S,
    level: AlertLevel,
}

impl<SA, GA, H, B, S> FireGuard<SA, GA, H, B, S>
where
    SA: AnalogSource,
    GA: AnalogSource,
    H: HygrometerSensor,
    B: BarometricSensor,
    S: CalibrationStore,
{
    /// Assemble a device; nothing is read until `begin`
    pub fn new(
        smoke: SmokeChannel<SA>,
        gas: GasChannel<GA>,
        environment: EnvironmentChannel<H, B>,
        store: S,
    ) -> Self {
        Self {
            smoke,
            gas,
            environment,
            store,
            level: AlertLevel::Normal,
        }
    }

    /// Start every channel
    ///
    /// The analog channels always start. The result reports whether the
    /// environment channel found a sensor; without one it reads ERROR and
    /// the arbiter sees no temperature, humidity or pressure.
    pub fn begin(&mut self, now: Timestamp) -> SensorResult<()> {
        log_info!("fireguard {}: starting", crate::VERSION);
        self.smoke.begin(&mut self.store, now);
        self.gas.begin(&mut self.store, now);
        let environment = self.environment.begin(&mut self.store, now);
        self.level = AlertLevel::Normal;
        environment
    }

    /// Read all channels, arbitrate, detect a level change
    pub fn tick(&mut self, now: Timestamp) -> TickOutcome {
        let smoke = self.smoke.read(now);
        let gas = self.gas.read(now);
        let environment = self.environment.read(now);

        let inputs = AlertInputs::from_readings(&smoke, &gas, &environment);
        let rule = AlertArbiter::matching_rule(&inputs);
        let level = rule.map_or(AlertLevel::Normal, |r| r.level);

        let transition = (level != self.level).then(|| Transition {
            from: self.level,
            to: level,
            notification: level.notification(),
            rule: rule.map(|r| r.name),
        });

        if let Some(t) = &transition {
            if t.is_escalation() && level.is_alarming() {
                log_warn!("alert {} -> {} ({})", t.from, t.to, t.rule.unwrap_or("-"));
            } else {
                log_info!("alert {} -> {}", t.from, t.to);
            }
        }
        self.level = level;

        TickOutcome {
            smoke,
            gas,
            environment,
            level,
            transition,
        }
    }

    /// Blocking smoke calibration; alert evaluation is frozen meanwhile
    pub fn calibrate_smoke<C: TimeSource + DelayNs>(
        &mut self,
        samples: u32,
        delay_ms: u32,
        clock: &mut C,
    ) -> CalibrationResult<SmokeCalibration> {
        self.smoke.calibrate(samples, delay_ms, clock, &mut self.store)
    }

    /// Blocking methane calibration; refused during warmup
    pub fn calibrate_gas<C: TimeSource + DelayNs>(
        &mut self,
        samples: u32,
        delay_ms: u32,
        clock: &mut C,
    ) -> CalibrationResult<GasCalibration> {
        self.gas.calibrate(samples, delay_ms, clock, &mut self.store)
    }

    /// Blocking environment baseline calibration
    pub fn calibrate_environment_baseline<C: TimeSource + DelayNs>(
        &mut self,
        clock: &mut C,
    ) -> CalibrationResult<EnvironmentBaseline> {
        self.environment.calibrate_baseline(clock, &mut self.store)
    }

    /// Level produced by the last tick
    pub fn level(&self) -> AlertLevel {
        self.level
    }

    /// Smoke channel
    pub fn smoke(&self) -> &SmokeChannel<SA> {
        &self.smoke
    }

    /// Smoke channel, mutable
    pub fn smoke_mut(&mut self) -> &mut SmokeChannel<SA> {
        &mut self.smoke
    }

    /// Methane channel
    pub fn gas(&self) -> &GasChannel<GA> {
        &self.gas
    }

    /// Methane channel, mutable
    pub fn gas_mut(&mut self) -> &mut GasChannel<GA> {
        &mut self.gas
    }

    /// Environment channel
    pub fn environment(&self) -> &EnvironmentChannel<H, B> {
        &self.environment
    }

    /// Environment channel, mutable
    pub fn environment_mut(&mut self) -> &mut EnvironmentChannel<H, B> {
        &mut self.environment
    }

    /// Calibration store
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channels::{
            mock::{MockBarometer, MockHygrometer, ScriptedAdc},
            AnalogConfig,
        },
        store::MemoryStore,
        time::ManualClock,
        CalibrationError,
    };

    type Device = FireGuard<ScriptedAdc, ScriptedAdc, MockHygrometer, MockBarometer, MemoryStore>;

    fn device() -> Device {
        let mut device = FireGuard::new(
            SmokeChannel::with_config(ScriptedAdc::constant(100), AnalogConfig::smoke().without_warmup()),
            GasChannel::with_config(ScriptedAdc::constant(100), AnalogConfig::gas().without_warmup()),
            EnvironmentChannel::new(MockHygrometer::new(25.0, 50.0), MockBarometer::new(25.0, 1013.25)),
            MemoryStore::<4>::new(),
        );
        device.begin(0).unwrap();
        device
    }

    fn run(device: &mut Device, ticks: u64, start: Timestamp) -> TickOutcome {
        let mut outcome = device.tick(start);
        for i in 1..ticks {
            outcome = device.tick(start + i * 5_000);
        }
        outcome
    }

    #[test]
    fn quiet_room_stays_normal() {
        let mut device = device();
        let outcome = run(&mut device, 20, 5_000);
        assert_eq!(outcome.level, AlertLevel::Normal);
        assert!(outcome.transition.is_none());
    }

    #[test]
    fn explosive_transition_is_reported_once() {
        let mut device = device();
        device.gas_mut().source_mut().set(2200);

        let mut transitions = Vec::new();
        for i in 1..=20u64 {
            let outcome = device.tick(i * 5_000);
            if let Some(t) = outcome.transition {
                transitions.push(t);
            }
        }

        let last = transitions.last().copied().unwrap();
        assert_eq!(last.to, AlertLevel::Explosive);
        assert_eq!(last.notification, NotificationPriority::Emergency);
        assert_eq!(last.rule, Some("gas_explosive"));
        assert!(last.is_escalation());
        assert_eq!(device.level(), AlertLevel::Explosive);
        assert_eq!(transitions.iter().filter(|t| t.to == AlertLevel::Explosive).count(), 1);
    }

    #[test]
    fn recovery_is_a_transition_back_to_normal() {
        let mut device = device();
        device.smoke_mut().source_mut().set(900);
        assert_eq!(run(&mut device, 10, 5_000).level, AlertLevel::Anomaly);

        device.smoke_mut().source_mut().set(100);
        let outcome = run(&mut device, 10, 60_000);
        assert_eq!(outcome.level, AlertLevel::Normal);

        device.smoke_mut().source_mut().set(900);
        let outcome = run(&mut device, 10, 120_000);
        assert_eq!(outcome.level, AlertLevel::Anomaly);
    }

    #[test]
    fn steam_reads_as_cooking() {
        let mut device = device();
        device.environment_mut().hygrometer_mut().set(28.0, 85.0);
        device.environment_mut().barometer_mut().set(28.0, 1013.25);
        device.smoke_mut().source_mut().set(900);

        let outcome = run(&mut device, 10, 5_000);
        assert_eq!(outcome.level, AlertLevel::Cooking);
        assert!(!outcome.level.is_alarming());
    }

    #[test]
    fn calibration_goes_through_the_store() {
        let mut device = device();
        device.gas_mut().source_mut().script(&[290, 310, 300]);
        let mut clock = ManualClock::new(200_000);

        let cal = device.calibrate_gas(3, 1_000, &mut clock).unwrap();
        assert_eq!(cal.explosive(), 420);
        assert!(device.store_mut().read("gas_cal_v1").unwrap().is_some());
        assert_eq!(clock.now(), 203_000);
    }

    #[test]
    fn environment_calibration_uses_device_store() {
        let mut device = device();
        let mut clock = ManualClock::new(0);
        let baseline = device.calibrate_environment_baseline(&mut clock).unwrap();
        assert_eq!(baseline.temperature_c, 25.0);
        assert!(device.store_mut().read("env_baseline_v1").unwrap().is_some());
    }

    #[test]
    fn flat_smoke_calibration_fails() {
        let mut device = device();
        let mut clock = ManualClock::new(0);
        assert_eq!(
            device.calibrate_smoke(5, 10, &mut clock),
            Err(CalibrationError::ThresholdsNotAscending)
        );
    }
}
