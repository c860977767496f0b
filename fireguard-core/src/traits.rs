//! Core traits for the hardware and storage seams
//!
//! The channels never touch a bus or a filesystem directly. Boards implement
//! these traits over their ADC, I2C drivers and flash; tests implement them
//! over scripted values.

use crate::errors::{SensorResult, StoreResult};

/// Longest calibration record a store must hold (bytes)
pub const RECORD_CAPACITY: usize = 96;

/// Text of one calibration record
pub type RecordText = heapless::String<RECORD_CAPACITY>;

/// Single-ended analog input (smoke or methane element)
///
/// Follows the `nb` convention of one-shot ADC drivers: `WouldBlock` while
/// the conversion is in flight. Callers block on it; conversions are
/// microseconds long.
pub trait AnalogSource {
    /// Start or poll a conversion, yielding the raw code
    fn read_raw(&mut self) -> nb::Result<u16, crate::errors::SensorError>;
}

/// One temperature + humidity sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HygrometerSample {
    /// Air temperature (°C)
    pub temperature_c: f32,
    /// Relative humidity (%)
    pub humidity_pct: f32,
}

/// One temperature + pressure sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarometerSample {
    /// Die temperature (°C)
    pub temperature_c: f32,
    /// Station pressure (hPa)
    pub pressure_hpa: f32,
}

/// Temperature/humidity sensor (AHT20 class)
pub trait HygrometerSensor {
    /// Detect and configure; an error means the sensor is absent
    fn init(&mut self) -> SensorResult<()>;

    /// Take one measurement
    fn read(&mut self) -> SensorResult<HygrometerSample>;
}

/// Temperature/pressure sensor (BMP280 class)
pub trait BarometricSensor {
    /// Detect and configure; an error means the sensor is absent
    fn init(&mut self) -> SensorResult<()>;

    /// Take one measurement
    fn read(&mut self) -> SensorResult<BarometerSample>;
}

/// Placeholder for a subsystem the board does not fit
///
/// Always fails to initialize, so the channel treats it as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Absent;

impl HygrometerSensor for Absent {
    fn init(&mut self) -> SensorResult<()> {
        Err(crate::errors::SensorError::NoSubsystem)
    }

    fn read(&mut self) -> SensorResult<HygrometerSample> {
        Err(crate::errors::SensorError::NoSubsystem)
    }
}

impl BarometricSensor for Absent {
    fn init(&mut self) -> SensorResult<()> {
        Err(crate::errors::SensorError::NoSubsystem)
    }

    fn read(&mut self) -> SensorResult<BarometerSample> {
        Err(crate::errors::SensorError::NoSubsystem)
    }
}

/// Durable key/value text storage for calibration records
///
/// Reads distinguish "nothing stored" (`Ok(None)`) from a failing store
/// (`Err`); both lead the channels to default calibration.
pub trait CalibrationStore {
    /// Fetch the record stored under `key`
    fn read(&mut self, key: &str) -> StoreResult<Option<RecordText>>;

    /// Replace the record stored under `key`
    fn write(&mut self, key: &str, text: &str) -> StoreResult<()>;
}

impl<S: CalibrationStore + ?Sized> CalibrationStore for &mut S {
    fn read(&mut self, key: &str) -> StoreResult<Option<RecordText>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, text: &str) -> StoreResult<()> {
        (**self).write(key, text)
    }
}
