//! Payload codec for the broker contract.
//!
//! Inbound payloads are forgiving: a malformed numeric setting decodes to
//! its inactive default (0 or false) with a warning, never an error — a
//! buggy client must not be able to wedge the controller, and a zeroed
//! setting simply parks the tilt workflow. Outbound events serialize to
//! the upstream JSON contract via the payload structs in
//! [`crate::app::events`].

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::commands::ChairCommand;
use crate::app::events::ChairEvent;
use crate::config::NotificationsSettings;

use super::topics;

/// The notifications payload nests the settings under a fixed key.
#[derive(Debug, Deserialize)]
struct NotificationsEnvelope {
    notifications_settings: NotificationsSettings,
}

/// Decode one inbound message. Returns `None` for unknown topics and for
/// request payloads that decode to "do nothing".
pub fn decode(topic: &str, payload: &str) -> Option<ChairCommand> {
    match topic {
        topics::SET_ALARM => Some(ChairCommand::SetAlarm(parse_flag(topic, payload))),
        topics::REQUIRED_ANGLE => Some(ChairCommand::SetRequiredAngle(parse_u16(topic, payload))),
        topics::REQUIRED_PERIOD => Some(ChairCommand::SetRequiredPeriod(parse_u16(topic, payload))),
        topics::REQUIRED_DURATION => {
            Some(ChairCommand::SetRequiredDuration(parse_u16(topic, payload)))
        }
        topics::CALIB_PRESSURE_MAT => {
            parse_flag(topic, payload).then_some(ChairCommand::CalibratePressureMat)
        }
        topics::CALIB_IMU => parse_flag(topic, payload).then_some(ChairCommand::CalibrateImus),
        topics::NOTIFICATIONS_SETTINGS => {
            match serde_json::from_str::<NotificationsEnvelope>(payload) {
                Ok(env) => Some(ChairCommand::UpdateNotificationsSettings(
                    env.notifications_settings,
                )),
                Err(e) => {
                    warn!("bad payload on {topic}: {e}");
                    None
                }
            }
        }
        topics::SELECT_WIFI => Some(ChairCommand::SelectWifi(payload.to_owned())),
        _ => {
            warn!("message on unknown topic {topic:?}");
            None
        }
    }
}

/// Encode one outbound event as `(topic, json)`.
pub fn encode(event: &ChairEvent) -> (&'static str, String) {
    match event {
        ChairEvent::BackRestAngle(p) => (topics::CURRENT_BACK_REST_ANGLE, json(p)),
        ChairEvent::PresenceChanged(p) => (topics::CURRENT_IS_SOMEONE_THERE, json(p)),
        ChairEvent::PressureMatData(p) => (topics::CURRENT_PRESSURE_MAT_DATA, json(p)),
        ChairEvent::IsMoving(p) => (topics::IS_MOVING, json(p)),
        ChairEvent::Speed(p) => (topics::CURRENT_CHAIR_SPEED, json(p)),
        ChairEvent::Vibration(p) => (topics::VIBRATION, json(p)),
        ChairEvent::TiltInfo(p) => (topics::TILT_INFO, json(p)),
        ChairEvent::Heartbeat(p) => (topics::HEARTBEAT, json(p)),
        ChairEvent::SensorsStatus(p) => (topics::SENSORS_STATUS, json(p)),
    }
}

fn parse_u16(topic: &str, payload: &str) -> u16 {
    match payload.trim().parse::<u16>() {
        Ok(v) => v,
        Err(e) => {
            warn!("bad payload {payload:?} on {topic}: {e}; falling back to 0");
            0
        }
    }
}

fn parse_flag(topic: &str, payload: &str) -> bool {
    match payload.trim().parse::<i32>() {
        Ok(v) => v != 0,
        Err(e) => {
            warn!("bad payload {payload:?} on {topic}: {e}; falling back to off");
            false
        }
    }
}

fn json<T: Serialize>(payload: &T) -> String {
    // Payload structs are plain numbers and bools; serialization cannot
    // fail in practice, but a broken message beats a crashed controller.
    serde_json::to_string(payload).unwrap_or_else(|e| {
        warn!("event serialization failed: {e}");
        String::from("{}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::events::{BackRestAnglePayload, HeartbeatPayload, PresencePayload};

    #[test]
    fn settings_topics_decode_numbers() {
        assert_eq!(
            decode(topics::REQUIRED_ANGLE, "30"),
            Some(ChairCommand::SetRequiredAngle(30))
        );
        assert_eq!(
            decode(topics::REQUIRED_PERIOD, " 10 "),
            Some(ChairCommand::SetRequiredPeriod(10))
        );
        assert_eq!(
            decode(topics::REQUIRED_DURATION, "3"),
            Some(ChairCommand::SetRequiredDuration(3))
        );
    }

    #[test]
    fn malformed_number_falls_back_to_zero() {
        assert_eq!(
            decode(topics::REQUIRED_ANGLE, "abc"),
            Some(ChairCommand::SetRequiredAngle(0))
        );
        assert_eq!(
            decode(topics::REQUIRED_PERIOD, ""),
            Some(ChairCommand::SetRequiredPeriod(0))
        );
    }

    #[test]
    fn alarm_override_decodes_to_bool() {
        assert_eq!(decode(topics::SET_ALARM, "1"), Some(ChairCommand::SetAlarm(true)));
        assert_eq!(decode(topics::SET_ALARM, "0"), Some(ChairCommand::SetAlarm(false)));
        // Malformed means off, never an error.
        assert_eq!(
            decode(topics::SET_ALARM, "maybe"),
            Some(ChairCommand::SetAlarm(false))
        );
    }

    #[test]
    fn calibration_requests_need_a_truthy_payload() {
        assert_eq!(
            decode(topics::CALIB_PRESSURE_MAT, "1"),
            Some(ChairCommand::CalibratePressureMat)
        );
        assert_eq!(decode(topics::CALIB_PRESSURE_MAT, "0"), None);
        assert_eq!(decode(topics::CALIB_IMU, "1"), Some(ChairCommand::CalibrateImus));
        assert_eq!(decode(topics::CALIB_IMU, "nope"), None);
    }

    #[test]
    fn notifications_settings_decode_from_nested_json() {
        let payload = r#"{
            "notifications_settings": {
                "isLedBlinkingEnabled": false,
                "isVibrationEnabled": true,
                "snoozeTime": 300.0
            }
        }"#;
        let cmd = decode(topics::NOTIFICATIONS_SETTINGS, payload).unwrap();
        match cmd {
            ChairCommand::UpdateNotificationsSettings(s) => {
                assert!(!s.is_led_blinking_enabled);
                assert!(s.is_vibration_enabled);
                assert!((s.snooze_time - 300.0).abs() < f32::EPSILON);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn notifications_settings_reject_flat_json() {
        let payload = r#"{"isLedBlinkingEnabled": true}"#;
        assert_eq!(decode(topics::NOTIFICATIONS_SETTINGS, payload), None);
    }

    #[test]
    fn wifi_selection_passes_the_payload_through() {
        assert_eq!(
            decode(topics::SELECT_WIFI, "ssid:pass"),
            Some(ChairCommand::SelectWifi("ssid:pass".into()))
        );
    }

    #[test]
    fn unknown_topic_is_dropped() {
        assert_eq!(decode("data/not_a_topic", "1"), None);
    }

    #[test]
    fn encode_routes_to_contract_topics() {
        let (topic, body) = encode(&ChairEvent::BackRestAngle(BackRestAnglePayload {
            datetime: 1000,
            angle: 25,
        }));
        assert_eq!(topic, topics::CURRENT_BACK_REST_ANGLE);
        assert!(body.contains("\"angle\":25"));
        assert!(body.contains("\"datetime\":1000"));

        let (topic, body) = encode(&ChairEvent::PresenceChanged(PresencePayload {
            datetime: 1000,
            is_someone_there: true,
        }));
        assert_eq!(topic, topics::CURRENT_IS_SOMEONE_THERE);
        assert!(body.contains("\"isSomeoneThere\":true"));

        let (topic, _) = encode(&ChairEvent::Heartbeat(HeartbeatPayload { datetime: 1 }));
        assert_eq!(topic, topics::HEARTBEAT);
    }
}
