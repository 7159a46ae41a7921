//! Outbound telemetry events.
//!
//! The [`ChairService`](super::service::ChairService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them — serialize onto the broker bridge,
//! log to the console, record in a test.
//!
//! Payload structs serialise to the upstream JSON contract, so field
//! renames here are wire-format changes.

use serde::Serialize;

use crate::devices::SensorsStatus;
use crate::sensors::Coord;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum ChairEvent {
    /// The backrest angle changed while someone is seated.
    BackRestAngle(BackRestAnglePayload),

    /// Someone sat down or stood up.
    PresenceChanged(PresencePayload),

    /// Periodic centre-of-pressure telemetry (only while seated).
    PressureMatData(PressureMatPayload),

    /// The chair started or stopped moving.
    IsMoving(IsMovingPayload),

    /// Estimated chair speed, emitted while moving.
    Speed(SpeedPayload),

    /// Accelerometer magnitude, emitted while moving.
    Vibration(VibrationPayload),

    /// Tilt-reminder workflow progress code.
    TiltInfo(TiltInfoPayload),

    /// Periodic keep-alive.
    Heartbeat(HeartbeatPayload),

    /// Per-device health summary, emitted when a device's connectivity
    /// changes.
    SensorsStatus(SensorsStatusPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackRestAnglePayload {
    pub datetime: u64,
    pub angle: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub datetime: u64,
    pub is_someone_there: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PressureMatPayload {
    pub datetime: u64,
    /// Global centre of pressure (cm from seat centre).
    pub center: Coord,
    /// Per-quadrant centres of pressure (front-left, front-right,
    /// back-left, back-right).
    pub quadrants: [Coord; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsMovingPayload {
    pub datetime: u64,
    pub is_moving: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedPayload {
    pub datetime: u64,
    /// Estimated speed (m/s). The upstream contract keeps the original
    /// French field name.
    pub vitesse: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VibrationPayload {
    pub datetime: u64,
    /// Accelerometer magnitude (g).
    pub vibration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TiltInfoPayload {
    pub datetime: u64,
    /// 1 = reminder due, 2 = angle reached, 3 = hold complete,
    /// 4 = returned upright.
    pub info: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeartbeatPayload {
    pub datetime: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorsStatusPayload {
    pub datetime: u64,
    pub notification_module: bool,
    pub fixed_accelerometer: bool,
    pub mobile_accelerometer: bool,
    pub pressure_mat: bool,
}

impl SensorsStatusPayload {
    pub fn new(datetime: u64, status: SensorsStatus) -> Self {
        Self {
            datetime,
            notification_module: status.notification_module,
            fixed_accelerometer: status.fixed_accelerometer,
            mobile_accelerometer: status.mobile_accelerometer,
            pressure_mat: status.pressure_mat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_payload_uses_contract_keys() {
        let json = serde_json::to_string(&PresencePayload {
            datetime: 1000,
            is_someone_there: true,
        })
        .unwrap();
        assert!(json.contains("isSomeoneThere"));
        assert!(json.contains("datetime"));
    }

    #[test]
    fn sensors_status_payload_uses_contract_keys() {
        let status = SensorsStatus {
            notification_module: true,
            fixed_accelerometer: false,
            mobile_accelerometer: true,
            pressure_mat: true,
        };
        let json = serde_json::to_string(&SensorsStatusPayload::new(7, status)).unwrap();
        assert!(json.contains("notificationModule"));
        assert!(json.contains("fixedAccelerometer"));
        assert!(json.contains("mobileAccelerometer"));
        assert!(json.contains("pressureMat"));
    }

    #[test]
    fn speed_payload_keeps_original_field_name() {
        let json = serde_json::to_string(&SpeedPayload {
            datetime: 1,
            vitesse: 0.5,
        })
        .unwrap();
        assert!(json.contains("vitesse"));
    }
}
