//! Shared fixtures for the integration tests
//!
//! - Scripted analog converters
//! - Settable hygrometer and barometer
//! - A store that fails on demand
//! - A device builder with warmups disabled

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use fireguard_core::{
    channels::AnalogConfig,
    errors::{SensorResult, StoreResult},
    traits::{BarometerSample, HygrometerSample, RecordText},
    AnalogSource, BarometricSensor, CalibrationStore, EnvironmentChannel, FireGuard, GasChannel,
    HygrometerSensor, SensorError, SmokeChannel, StoreError, TickOutcome,
};

/// Tick cadence used throughout the tests
pub const TICK_MS: u64 = 5_000;

/// ADC that plays queued codes, then holds a level
#[derive(Debug, Default)]
pub struct ScriptedAdc {
    queue: VecDeque<u16>,
    level: u16,
    failing: bool,
}

impl ScriptedAdc {
    pub fn at(level: u16) -> Self {
        Self { level, ..Self::default() }
    }

    pub fn set(&mut self, level: u16) {
        self.level = level;
        self.failing = false;
    }

    pub fn queue(&mut self, codes: &[u16]) {
        self.queue.extend(codes);
    }

    pub fn fail(&mut self) {
        self.failing = true;
    }
}

impl AnalogSource for ScriptedAdc {
    fn read_raw(&mut self) -> nb::Result<u16, SensorError> {
        if self.failing {
            return Err(nb::Error::Other(SensorError::ReadFailed { reason: "adc fault" }));
        }
        Ok(self.queue.pop_front().unwrap_or(self.level))
    }
}

/// Converter that reports busy once before every conversion
#[derive(Debug)]
pub struct SlowAdc {
    level: u16,
    busy: bool,
}

impl SlowAdc {
    pub fn at(level: u16) -> Self {
        Self { level, busy: true }
    }
}

impl AnalogSource for SlowAdc {
    fn read_raw(&mut self) -> nb::Result<u16, SensorError> {
        if self.busy {
            self.busy = false;
            return Err(nb::Error::WouldBlock);
        }
        self.busy = true;
        Ok(self.level)
    }
}

#[derive(Debug)]
pub struct Hygrometer {
    pub present: bool,
    pub sample: HygrometerSample,
    pub failing: bool,
}

impl Hygrometer {
    pub fn new(temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            present: true,
            sample: HygrometerSample { temperature_c, humidity_pct },
            failing: false,
        }
    }

    pub fn missing() -> Self {
        Self { present: false, ..Self::new(0.0, 0.0) }
    }

    pub fn set(&mut self, temperature_c: f32, humidity_pct: f32) {
        self.sample = HygrometerSample { temperature_c, humidity_pct };
    }
}

impl HygrometerSensor for Hygrometer {
    fn init(&mut self) -> SensorResult<()> {
        if self.present {
            Ok(())
        } else {
            Err(SensorError::NoSubsystem)
        }
    }

    fn read(&mut self) -> SensorResult<HygrometerSample> {
        if self.failing {
            return Err(SensorError::ReadFailed { reason: "i2c nack" });
        }
        Ok(self.sample)
    }
}

#[derive(Debug)]
pub struct Barometer {
    pub present: bool,
    pub sample: BarometerSample,
    pub failing: bool,
}

impl Barometer {
    pub fn new(temperature_c: f32, pressure_hpa: f32) -> Self {
        Self {
            present: true,
            sample: BarometerSample { temperature_c, pressure_hpa },
            failing: false,
        }
    }

    pub fn missing() -> Self {
        Self { present: false, ..Self::new(0.0, 0.0) }
    }

    pub fn set(&mut self, temperature_c: f32, pressure_hpa: f32) {
        self.sample = BarometerSample { temperature_c, pressure_hpa };
    }
}

impl BarometricSensor for Barometer {
    fn init(&mut self) -> SensorResult<()> {
        if self.present {
            Ok(())
        } else {
            Err(SensorError::NoSubsystem)
        }
    }

    fn read(&mut self) -> SensorResult<BarometerSample> {
        if self.failing {
            return Err(SensorError::ReadFailed { reason: "i2c nack" });
        }
        Ok(self.sample)
    }
}

/// Map-backed store whose reads and writes can be made to fail
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub records: HashMap<String, String>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub writes: usize,
}

impl FlakyStore {
    pub fn with(key: &str, text: &str) -> Self {
        let mut store = Self::default();
        store.records.insert(key.to_string(), text.to_string());
        store
    }
}

impl CalibrationStore for FlakyStore {
    fn read(&mut self, key: &str) -> StoreResult<Option<RecordText>> {
        if self.fail_reads {
            return Err(StoreError::Io { reason: "flash read error" });
        }
        match self.records.get(key) {
            Some(text) => {
                let mut record = RecordText::new();
                record.push_str(text).map_err(|_| StoreError::Capacity)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn write(&mut self, key: &str, text: &str) -> StoreResult<()> {
        if self.fail_writes {
            return Err(StoreError::Unavailable);
        }
        self.writes += 1;
        self.records.insert(key.to_string(), text.to_string());
        Ok(())
    }
}

pub type TestDevice = FireGuard<ScriptedAdc, ScriptedAdc, Hygrometer, Barometer, FlakyStore>;

/// Device in a 25 °C / 50 % / 1013.25 hPa room with both heaters warm
pub fn warm_device(store: FlakyStore) -> TestDevice {
    let mut device = FireGuard::new(
        SmokeChannel::with_config(ScriptedAdc::at(150), AnalogConfig::smoke().without_warmup()),
        GasChannel::with_config(ScriptedAdc::at(150), AnalogConfig::gas().without_warmup()),
        EnvironmentChannel::new(Hygrometer::new(25.0, 50.0), Barometer::new(25.0, 1013.25)),
        store,
    );
    device
        .begin(0)
        .expect("both environment sensors are present");
    device
}

/// Tick `count` times from `start`, returning the last outcome
pub fn run(device: &mut TestDevice, start: u64, count: u64) -> TickOutcome {
    let mut outcome = device.tick(start);
    for i in 1..count {
        outcome = device.tick(start + i * TICK_MS);
    }
    outcome
}

/// Set both environment sensors to the same room conditions
pub fn set_room(device: &mut TestDevice, temperature_c: f32, humidity_pct: f32, pressure_hpa: f32) {
    let environment = device.environment_mut();
    environment.hygrometer_mut().set(temperature_c, humidity_pct);
    environment.barometer_mut().set(temperature_c, pressure_hpa);
}
