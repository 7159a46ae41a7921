//! Port traits — the hexagonal boundary between the core and the outside
//! world.
//!
//! Driven adapters (the broker bridge, the settings file, the log sink)
//! implement these traits. The [`ChairService`](super::service::ChairService)
//! and the device orchestrator consume them via generics, so the core never
//! touches a transport or a filesystem directly.

use crate::config::NotificationsSettings;
use crate::sensors::orientation::ImuOffset;
use crate::sensors::pressure_mat::MatOffset;

// ───────────────────────────────────────────────────────────────
// Event sink (core → telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`ChairEvent`](super::events::ChairEvent)s
/// through this port. Adapters decide where they go — serial log, the
/// broker bridge, a test recorder.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ChairEvent);
}

// ───────────────────────────────────────────────────────────────
// Settings store (core ↔ persistence)
// ───────────────────────────────────────────────────────────────

/// Which of the two inertial sensors an offset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImuSide {
    Fixed,
    Mobile,
}

/// Persistent storage for calibration offsets and notification settings.
///
/// The store is exclusively owned by the device orchestrator for offsets
/// (every calibration funnels through calibrate-then-persist) and by the
/// service for notification settings; `load_*` on a fresh store returns
/// `Ok(None)`, never a fabricated default.
///
/// Writes MUST be atomic — a crash mid-save must leave either the old or
/// the new value, never a torn blob.
pub trait SettingsStore {
    fn load_mat_offset(&self) -> Result<Option<MatOffset>, StorageError>;
    fn save_mat_offset(&mut self, offset: &MatOffset) -> Result<(), StorageError>;

    fn load_imu_offset(&self, side: ImuSide) -> Result<Option<ImuOffset>, StorageError>;
    fn save_imu_offset(&mut self, side: ImuSide, offset: &ImuOffset) -> Result<(), StorageError>;

    fn load_notifications(&self) -> Result<Option<NotificationsSettings>, StorageError>;
    fn save_notifications(&mut self, settings: &NotificationsSettings) -> Result<(), StorageError>;
}

/// Errors from [`SettingsStore`] operations.
#[derive(Debug)]
pub enum StorageError {
    /// Stored blob failed deserialization.
    Corrupted,
    /// Generic I/O error from the backing store.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "stored value corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for StorageError {}
