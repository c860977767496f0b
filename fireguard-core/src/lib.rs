//! Sensing and decision core for FireGuard
//!
//! Turns periodic raw measurements from a smoke sensor, a methane sensor and
//! a temperature/humidity/pressure pair into one global alert level.
//! Designed for the same constraints as the device firmware it runs in.
//!
//! Key constraints:
//! - No heap allocation anywhere in the core
//! - One cooperative control thread; only calibration blocks
//! - Persistence failures degrade to defaults, never abort sampling
//!
//! ```no_run
//! use fireguard_core::arbiter::{AlertArbiter, AlertInputs};
//! use fireguard_core::AlertLevel;
//!
//! let inputs = AlertInputs::default();
//! assert_eq!(AlertArbiter::evaluate(&inputs), AlertLevel::Normal);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod arbiter;
pub mod buffer;
pub mod calibration;
pub mod channels;
pub mod constants;
pub mod device;
pub mod errors;
pub mod filter;
pub mod store;
pub mod time;
pub mod traits;

// Public API
pub use arbiter::{AlertArbiter, AlertInputs, AlertLevel, NotificationPriority};
pub use channels::{
    EnvironmentChannel, EnvironmentReading, EnvironmentState,
    GasChannel, GasReading, GasState,
    SmokeChannel, SmokeReading, SmokeState,
};
pub use device::{FireGuard, TickOutcome, Transition};
pub use errors::{CalibrationError, SensorError, StoreError};
pub use traits::{AnalogSource, BarometricSensor, CalibrationStore, HygrometerSensor};

/// Crate version, reported by the device at boot
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
