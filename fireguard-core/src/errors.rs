//! Error Types for Sensor, Persistence and Calibration Faults
//!
//! ## Design Philosophy
//!
//! Errors here never cross a channel boundary as a panic. A channel that hits
//! a [`SensorError`] turns it into its own `Error` state and keeps sampling; a
//! [`StoreError`] on load falls back to default calibration; a
//! [`CalibrationError`] is returned to whoever triggered the calibration.
//!
//! Every variant is `Copy` and carries only inline data or `&'static str`
//! reasons, so errors can sit in readings and be returned from hot paths
//! without allocation.
//!
//! ## Error Categories
//!
//! ### Sensor faults
//! - `OutOfRange`: raw sample outside what the converter can produce
//! - `ReadFailed`: bus or conversion failure
//! - `NoSubsystem`: no physical sensor answered at startup
//!
//! ### Persistence faults
//! - `Unavailable`, `Io`, `Capacity`
//!
//! ### Calibration faults
//! - Preconditions (`NotWarmedUp`, `NotReady`, `NoSamples`)
//! - Record schema (`FieldCount`, `InvalidField`)
//! - Invariants (`ThresholdsNotAscending`, `OutOfRange`)
//! - `Store`: measured fine, could not be persisted
//!
//! ## Handling Strategy
//!
//! ```rust
//! use fireguard_core::CalibrationError;
//!
//! fn report(result: Result<(), CalibrationError>) {
//!     match result {
//!         Ok(()) => {}
//!         Err(CalibrationError::NotWarmedUp) => {
//!             // retry after warmup
//!         }
//!         Err(CalibrationError::Store(_)) => {
//!             // active until reboot only
//!         }
//!         Err(_) => {
//!             // previous calibration is still in force
//!         }
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for sensor operations
pub type SensorResult<T> = Result<T, SensorError>;

/// Result type for persistence operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for calibration operations
pub type CalibrationResult<T> = Result<T, CalibrationError>;

/// Hardware and sample faults
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Raw sample outside the converter's representable span
    #[error("Raw value {raw} outside [0, {max}]")]
    OutOfRange {
        /// The offending sample
        raw: u16,
        /// Largest value the converter can report
        max: u16,
    },

    /// The sensor did not answer or the conversion failed
    #[error("Sensor read failed: {reason}")]
    ReadFailed {
        /// What failed
        reason: &'static str,
    },

    /// The sensor returned a value that is not a number
    #[error("Sensor returned a non-finite value")]
    InvalidValue,

    /// None of the physical sensors a channel needs is present
    #[error("No usable sensor subsystem present")]
    NoSubsystem,
}

/// Persistence faults
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Backing storage is not mounted or not reachable
    #[error("Calibration store unavailable")]
    Unavailable,

    /// Read or write failed part way
    #[error("Calibration store I/O failed: {reason}")]
    Io {
        /// What failed
        reason: &'static str,
    },

    /// Key or record does not fit the store
    #[error("Calibration store capacity exceeded")]
    Capacity,
}

/// Calibration and calibration-record faults
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// Calibrating a heated sensor before warmup gives a wrong baseline
    #[error("Sensor still warming up")]
    NotWarmedUp,

    /// No physical sensor is available to calibrate against
    #[error("Sensor not ready")]
    NotReady,

    /// A calibration needs at least one sample
    #[error("Calibration needs at least one sample")]
    NoSamples,

    /// Record has the wrong number of comma-separated fields
    #[error("Expected {expected} fields, found {found}")]
    FieldCount {
        /// Fields the schema defines
        expected: usize,
        /// Fields present in the record
        found: usize,
    },

    /// A field did not parse as a number
    #[error("Field {index} is not a valid number")]
    InvalidField {
        /// Zero-based field position
        index: usize,
    },

    /// Thresholds are not strictly ascending (e.g. a flat clean-air signal)
    #[error("Thresholds are not strictly ascending")]
    ThresholdsNotAscending,

    /// A value lies outside what the sensor can produce
    #[error("Field '{field}' out of range")]
    OutOfRange {
        /// Name of the offending field
        field: &'static str,
    },

    /// Calibration was applied but could not be persisted
    #[error("Calibration not persisted: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CalibrationError {
    fn from(err: StoreError) -> Self {
        CalibrationError::Store(err)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::OutOfRange { raw, max } =>
                defmt::write!(fmt, "Raw {} outside [0, {}]", raw, max),
            Self::ReadFailed { reason } =>
                defmt::write!(fmt, "Read failed: {}", reason),
            Self::InvalidValue =>
                defmt::write!(fmt, "Non-finite value"),
            Self::NoSubsystem =>
                defmt::write!(fmt, "No sensor subsystem"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StoreError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Unavailable => defmt::write!(fmt, "Store unavailable"),
            Self::Io { reason } => defmt::write!(fmt, "Store I/O: {}", reason),
            Self::Capacity => defmt::write!(fmt, "Store capacity exceeded"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CalibrationError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NotWarmedUp => defmt::write!(fmt, "Still warming up"),
            Self::NotReady => defmt::write!(fmt, "Sensor not ready"),
            Self::NoSamples => defmt::write!(fmt, "No samples"),
            Self::FieldCount { expected, found } =>
                defmt::write!(fmt, "Expected {} fields, found {}", expected, found),
            Self::InvalidField { index } =>
                defmt::write!(fmt, "Field {} invalid", index),
            Self::ThresholdsNotAscending =>
                defmt::write!(fmt, "Thresholds not ascending"),
            Self::OutOfRange { field } =>
                defmt::write!(fmt, "Field '{}' out of range", field),
            Self::Store(err) =>
                defmt::write!(fmt, "Not persisted: {}", err),
        }
    }
}
