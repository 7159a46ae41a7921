//! Inbound commands to the chair service.
//!
//! These represent actions requested by the outside world (broker topics,
//! the mobile application, provisioning) that the
//! [`ChairService`](super::service::ChairService) interprets and acts upon.

use crate::config::NotificationsSettings;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum ChairCommand {
    /// Manual alarm override: `true` raises the red reminder immediately,
    /// `false` silences everything.
    SetAlarm(bool),

    /// Target backrest angle for the tilt reminder (degrees; 0 disables).
    SetRequiredAngle(u16),

    /// Sitting period between reminders (seconds; 0 disables).
    SetRequiredPeriod(u16),

    /// How long the target angle must be held (seconds; 0 disables).
    SetRequiredDuration(u16),

    /// Run a pressure-mat calibration pass with an empty seat.
    CalibratePressureMat,

    /// Run a bias calibration pass on both IMUs, chair upright.
    CalibrateImus,

    /// Replace the persisted notification settings.
    UpdateNotificationsSettings(NotificationsSettings),

    /// Select the Wi-Fi network the gateway should join (forwarded to the
    /// provisioning layer, not acted on by the core).
    SelectWifi(String),
}
