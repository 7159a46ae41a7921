//! Hardware port traits — the boundary between the orchestration core and
//! the physical buses.
//!
//! ```text
//!   Adapter (I2C / ADC / GPIO) ──▶ Port trait ──▶ DeviceOrchestrator
//! ```
//!
//! Every port carries a `probe()` connectivity check used both at startup
//! initialisation and by the reconnect supervision path. Read operations
//! return typed [`SensorError`]s; the orchestrator degrades to sentinel
//! values instead of propagating them upward.

use crate::error::SensorError;
use crate::sensors::orientation::ImuSample;
use crate::sensors::pressure_mat::CELL_COUNT;

/// One of the two inertial sensors.
pub trait ImuPort {
    /// Probe the bus; `true` when the device answers.
    fn probe(&mut self) -> bool;

    /// Read one raw accelerometer sample.
    fn read(&mut self) -> Result<ImuSample, SensorError>;
}

/// The ADC scanning the pressure mat's force cells.
pub trait PressurePort {
    fn probe(&mut self) -> bool;

    /// Read all cells, in ADC channel order.
    fn scan(&mut self) -> Result<[u16; CELL_COUNT], SensorError>;
}

/// The real-time clock.
pub trait ClockPort {
    fn probe(&mut self) -> bool;

    /// Seconds since the Unix epoch.
    fn epoch_secs(&mut self) -> Result<u64, SensorError>;
}

/// The movement-detection accelerometer on the chair frame.
pub trait MotionPort {
    fn probe(&mut self) -> bool;

    fn read(&mut self) -> Result<ImuSample, SensorError>;
}

/// The notification module: two LEDs and a DC motor.
pub trait AlarmPort {
    fn probe(&mut self) -> bool;

    fn set_red_led(&mut self, on: bool);
    fn set_green_led(&mut self, on: bool);
    fn set_motor(&mut self, on: bool);

    /// Safe-off: every output line low.
    fn all_off(&mut self) {
        self.set_red_led(false);
        self.set_green_led(false);
        self.set_motor(false);
    }
}
