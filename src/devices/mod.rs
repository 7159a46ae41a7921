//! Device orchestration — lifecycle supervision and the fused snapshot.

pub mod orchestrator;
pub mod ports;

pub use orchestrator::{DeviceOrchestrator, FusedSnapshot, SensorsStatus};

/// Capability tag stored alongside each sensor handle. Reconnect and
/// state-change queries dispatch on this tag; an unknown raw id from the
/// broker is a reported error, never a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceId {
    Alarm = 0,
    MobileImu = 1,
    FixedImu = 2,
    MotionSensor = 3,
}

impl DeviceId {
    pub const COUNT: usize = 4;

    pub const ALL: [DeviceId; Self::COUNT] = [
        DeviceId::Alarm,
        DeviceId::MobileImu,
        DeviceId::FixedImu,
        DeviceId::MotionSensor,
    ];

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Alarm),
            1 => Some(Self::MobileImu),
            2 => Some(Self::FixedImu),
            3 => Some(Self::MotionSensor),
            _ => None,
        }
    }
}

/// The devices that own a calibration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationTarget {
    PressureMat,
    FixedImu,
    MobileImu,
}

/// Lifecycle state of one physical device.
///
/// A device moves Uninitialized → Initialized → Calibrated, and falls back
/// to Uninitialized when its connectivity probe fails. Devices without a
/// calibration step stop at Initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Uninitialized,
    Initialized,
    Calibrated,
}

impl DeviceState {
    pub fn is_initialized(self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    pub fn is_calibrated(self) -> bool {
        matches!(self, Self::Calibrated)
    }
}
