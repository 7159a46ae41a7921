//! System configuration parameters
//!
//! All tunable parameters for the SeatSense controller. Values can be
//! overridden through the persisted settings store; the tilt-reminder
//! parameters themselves (angle/period/duration) arrive over the broker
//! and live in [`TiltSettings`](crate::fsm::context::TiltSettings), not here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Tilt workflow ---
    /// Consecutive seconds of presence before the reminder cycle arms
    pub required_sitting_secs: u16,
    /// Tolerance subtracted from the required angle when checking "reached"
    pub angle_tolerance_deg: f32,
    /// Back-rest angle below which the chair counts as returned upright
    pub return_angle_deg: f32,

    // --- Orientation ---
    /// Magnitude above which the chair counts as reclined (coarse signal,
    /// independent of the reminder's own target angle)
    pub min_inclination_deg: f32,
    /// Samples averaged during an IMU bias calibration pass
    pub imu_calibration_samples: u16,

    // --- Pressure mat ---
    /// Fraction of the baseline mean used as the presence threshold
    pub detection_margin: f32,
    /// Raw scans averaged per cell during mat calibration
    pub mat_calibration_iterations: u16,
    /// Half-distance between paired sensors along X (cm)
    pub plate_dx_cm: f32,
    /// Half-distance between paired sensors along Y (cm)
    pub plate_dy_cm: f32,
    /// Height of the mat surface above the sensing plane (cm)
    pub plate_dz_cm: f32,

    // --- Motion ---
    /// Accel magnitude (g) above which the chair counts as moving
    pub moving_trigger_g: f32,

    // --- Alarm patterns ---
    /// How long the red alarm pattern runs before self-terminating (seconds)
    pub red_alarm_secs: u16,
    /// How long the blink pattern runs before self-terminating (seconds)
    pub blink_alarm_secs: u16,

    // --- Timing ---
    /// Control loop interval (milliseconds); the workflow counts whole ticks
    pub control_loop_interval_ms: u32,
    /// Centre-of-pressure emission period while someone is seated (seconds)
    pub cop_emission_period_secs: u32,
    /// Heartbeat emission period (seconds)
    pub heartbeat_period_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Tilt workflow
            required_sitting_secs: 5,
            angle_tolerance_deg: 5.0,
            return_angle_deg: 2.0,

            // Orientation
            min_inclination_deg: 15.0,
            imu_calibration_samples: 100,

            // Pressure mat
            detection_margin: 0.15,
            mat_calibration_iterations: 10,
            plate_dx_cm: 4.0,
            plate_dy_cm: 4.0,
            plate_dz_cm: 2.0,

            // Motion
            moving_trigger_g: 1.05,

            // Alarm patterns
            red_alarm_secs: 10,
            blink_alarm_secs: 10,

            // Timing
            control_loop_interval_ms: 1000,
            cop_emission_period_secs: 15,
            heartbeat_period_secs: 300,
        }
    }
}

impl SystemConfig {
    /// Range-check every field. The settings store calls this before
    /// persisting so a compromised broker channel cannot inject dangerous
    /// operating parameters.
    pub fn validate(&self) -> Result<()> {
        if !(1..=60).contains(&self.required_sitting_secs) {
            return Err(Error::Config("required_sitting_secs must be 1-60"));
        }
        if !(0.0..=45.0).contains(&self.angle_tolerance_deg) {
            return Err(Error::Config("angle_tolerance_deg must be 0-45"));
        }
        if !(0.0..=30.0).contains(&self.return_angle_deg) {
            return Err(Error::Config("return_angle_deg must be 0-30"));
        }
        if !(1.0..=60.0).contains(&self.min_inclination_deg) {
            return Err(Error::Config("min_inclination_deg must be 1-60"));
        }
        if self.imu_calibration_samples == 0 {
            return Err(Error::Config("imu_calibration_samples must be > 0"));
        }
        if !(0.01..=2.0).contains(&self.detection_margin) {
            return Err(Error::Config("detection_margin must be 0.01-2.0"));
        }
        if self.mat_calibration_iterations == 0 {
            return Err(Error::Config("mat_calibration_iterations must be > 0"));
        }
        if self.plate_dx_cm <= 0.0 || self.plate_dy_cm <= 0.0 || self.plate_dz_cm < 0.0 {
            return Err(Error::Config("plate geometry must be positive"));
        }
        if !(1.0..=2.0).contains(&self.moving_trigger_g) {
            return Err(Error::Config("moving_trigger_g must be 1.0-2.0"));
        }
        if !(100..=5000).contains(&self.control_loop_interval_ms) {
            return Err(Error::Config("control_loop_interval_ms must be 100-5000"));
        }
        if self.cop_emission_period_secs == 0 || self.heartbeat_period_secs == 0 {
            return Err(Error::Config("emission periods must be > 0"));
        }
        Ok(())
    }
}

/// Alarm behaviour configuration, updated over the broker and persisted.
///
/// Field names serialise to the upstream JSON contract
/// (`isLedBlinkingEnabled`, `isVibrationEnabled`, `snoozeTime`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsSettings {
    pub is_led_blinking_enabled: bool,
    pub is_vibration_enabled: bool,
    /// Reserved by the upstream contract; persisted and round-tripped but
    /// not consumed by the alarm logic.
    pub snooze_time: f32,
}

impl Default for NotificationsSettings {
    fn default() -> Self {
        Self {
            is_led_blinking_enabled: true,
            is_vibration_enabled: true,
            snooze_time: 600.0,
        }
    }
}
