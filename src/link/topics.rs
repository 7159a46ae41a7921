//! Broker topic names.
//!
//! These strings are the external contract with the mobile application
//! and the backend; renaming one here breaks deployed clients.

// Inbound (the controller subscribes).
pub const SET_ALARM: &str = "data/set_alarm";
pub const REQUIRED_ANGLE: &str = "data/required_back_rest_angle";
pub const REQUIRED_PERIOD: &str = "data/required_period";
pub const REQUIRED_DURATION: &str = "data/required_duration";
pub const CALIB_PRESSURE_MAT: &str = "config/calib_pressure_mat";
pub const CALIB_IMU: &str = "config/calib_imu";
pub const NOTIFICATIONS_SETTINGS: &str = "config/notifications_settings";
pub const SELECT_WIFI: &str = "config/wifi";

/// Every subscription, for the transport adapter to register at connect.
pub const SUBSCRIPTIONS: [&str; 8] = [
    SET_ALARM,
    REQUIRED_ANGLE,
    REQUIRED_PERIOD,
    REQUIRED_DURATION,
    CALIB_PRESSURE_MAT,
    CALIB_IMU,
    NOTIFICATIONS_SETTINGS,
    SELECT_WIFI,
];

// Outbound (the controller publishes).
pub const CURRENT_BACK_REST_ANGLE: &str = "data/current_back_rest_angle";
pub const CURRENT_PRESSURE_MAT_DATA: &str = "data/current_pressure_mat_data";
pub const CURRENT_IS_SOMEONE_THERE: &str = "data/current_is_someone_there";
pub const CURRENT_CHAIR_SPEED: &str = "data/current_chair_speed";
pub const VIBRATION: &str = "data/vibration";
pub const IS_MOVING: &str = "data/is_moving";
pub const TILT_INFO: &str = "data/tilt_info";
pub const HEARTBEAT: &str = "heartbeat/embedded";
pub const SENSORS_STATUS: &str = "status/sensors";
