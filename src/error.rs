//! Unified error types for the SeatSense controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they can be passed through the orchestrator and FSM without allocation.

use core::fmt;

use crate::devices::{CalibrationTarget, DeviceId};

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// A device id received from outside does not name a known device.
    UnknownDevice(u8),
    /// The named device is not in the state the operation requires.
    NotReady(DeviceId),
    /// A calibration pass could not complete.
    CalibrationIncomplete(CalibrationTarget),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::UnknownDevice(raw) => write!(f, "unknown device id {raw}"),
            Self::NotReady(dev) => write!(f, "device not ready: {dev:?}"),
            Self::CalibrationIncomplete(dev) => write!(f, "calibration incomplete: {dev:?}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC scan returned an error or timed out.
    AdcReadFailed,
    /// I2C transaction with an IMU failed.
    ImuReadFailed,
    /// RTC could not be read.
    RtcReadFailed,
    /// The device did not answer its connectivity probe.
    Disconnected,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::ImuReadFailed => write!(f, "IMU read failed"),
            Self::RtcReadFailed => write!(f, "RTC read failed"),
            Self::Disconnected => write!(f, "device disconnected"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
