//! Sensing channels
//!
//! Each channel owns its hardware handle, smoothing and calibration and
//! produces one reading per tick:
//!
//! - [`SmokeChannel`]: particulate concentration
//! - [`GasChannel`]: methane concentration and explosive limit
//! - [`EnvironmentChannel`]: temperature, humidity, pressure and their trends
//!
//! Channels are independent; none reads another's state. The arbiter
//! combines their last readings afterwards.

mod analog;
pub mod environment;
pub mod gas;
pub mod smoke;

pub use analog::AnalogConfig;
pub use environment::{EnvironmentChannel, EnvironmentConfig, EnvironmentReading, EnvironmentState};
pub use gas::{GasChannel, GasReading, GasState};
pub use smoke::{SmokeChannel, SmokeReading, SmokeState};
