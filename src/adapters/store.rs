//! Settings store adapters.
//!
//! [`FileStore`] persists calibration offsets and notification settings as
//! a single postcard blob. Writes go to a temporary file in the same
//! directory followed by a rename, so a crash mid-save leaves either the
//! old or the new blob on disk, never a torn one.
//!
//! [`MemStore`] is the in-memory twin for tests and the simulation binary.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ImuSide, SettingsStore, StorageError};
use crate::config::NotificationsSettings;
use crate::sensors::orientation::ImuOffset;
use crate::sensors::pressure_mat::MatOffset;

/// Everything the controller persists, serialized wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreBlob {
    mat: Option<MatOffset>,
    fixed_imu: Option<ImuOffset>,
    mobile_imu: Option<ImuOffset>,
    notifications: Option<NotificationsSettings>,
}

impl StoreBlob {
    fn imu(&self, side: ImuSide) -> Option<ImuOffset> {
        match side {
            ImuSide::Fixed => self.fixed_imu,
            ImuSide::Mobile => self.mobile_imu,
        }
    }

    fn imu_mut(&mut self, side: ImuSide) -> &mut Option<ImuOffset> {
        match side {
            ImuSide::Fixed => &mut self.fixed_imu,
            ImuSide::Mobile => &mut self.mobile_imu,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// File-backed store
// ───────────────────────────────────────────────────────────────

pub struct FileStore {
    path: PathBuf,
    blob: StoreBlob,
}

impl FileStore {
    /// Open (or create) the store at `path`. A corrupted blob is reported,
    /// not silently replaced — the caller decides whether to start fresh.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let blob = match fs::read(&path) {
            Ok(bytes) => {
                let blob = postcard::from_bytes(&bytes).map_err(|_| StorageError::Corrupted)?;
                info!("settings store loaded from {}", path.display());
                blob
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no settings store at {}, starting fresh", path.display());
                StoreBlob::default()
            }
            Err(e) => {
                warn!("settings store read failed: {e}");
                return Err(StorageError::IoError);
            }
        };
        Ok(Self { path, blob })
    }

    /// Serialize the whole blob and swap it into place atomically.
    fn flush(&self) -> Result<(), StorageError> {
        let bytes = postcard::to_allocvec(&self.blob).map_err(|_| StorageError::IoError)?;
        let tmp = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).map_err(|_| StorageError::IoError)?;
        file.write_all(&bytes).map_err(|_| StorageError::IoError)?;
        file.sync_all().map_err(|_| StorageError::IoError)?;
        fs::rename(&tmp, &self.path).map_err(|_| StorageError::IoError)?;
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn load_mat_offset(&self) -> Result<Option<MatOffset>, StorageError> {
        Ok(self.blob.mat.clone())
    }

    fn save_mat_offset(&mut self, offset: &MatOffset) -> Result<(), StorageError> {
        self.blob.mat = Some(offset.clone());
        self.flush()
    }

    fn load_imu_offset(&self, side: ImuSide) -> Result<Option<ImuOffset>, StorageError> {
        Ok(self.blob.imu(side))
    }

    fn save_imu_offset(&mut self, side: ImuSide, offset: &ImuOffset) -> Result<(), StorageError> {
        *self.blob.imu_mut(side) = Some(*offset);
        self.flush()
    }

    fn load_notifications(&self) -> Result<Option<NotificationsSettings>, StorageError> {
        Ok(self.blob.notifications)
    }

    fn save_notifications(&mut self, settings: &NotificationsSettings) -> Result<(), StorageError> {
        self.blob.notifications = Some(*settings);
        self.flush()
    }
}

// ───────────────────────────────────────────────────────────────
// In-memory store
// ───────────────────────────────────────────────────────────────

/// Volatile [`SettingsStore`] for tests and the simulation loop.
#[derive(Debug, Default)]
pub struct MemStore {
    blob: StoreBlob,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemStore {
    fn load_mat_offset(&self) -> Result<Option<MatOffset>, StorageError> {
        Ok(self.blob.mat.clone())
    }

    fn save_mat_offset(&mut self, offset: &MatOffset) -> Result<(), StorageError> {
        self.blob.mat = Some(offset.clone());
        Ok(())
    }

    fn load_imu_offset(&self, side: ImuSide) -> Result<Option<ImuOffset>, StorageError> {
        Ok(self.blob.imu(side))
    }

    fn save_imu_offset(&mut self, side: ImuSide, offset: &ImuOffset) -> Result<(), StorageError> {
        *self.blob.imu_mut(side) = Some(*offset);
        Ok(())
    }

    fn load_notifications(&self) -> Result<Option<NotificationsSettings>, StorageError> {
        Ok(self.blob.notifications)
    }

    fn save_notifications(&mut self, settings: &NotificationsSettings) -> Result<(), StorageError> {
        self.blob.notifications = Some(*settings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_returns_none_for_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("settings.bin")).unwrap();
        assert!(store.load_mat_offset().unwrap().is_none());
        assert!(store.load_imu_offset(ImuSide::Fixed).unwrap().is_none());
        assert!(store.load_notifications().unwrap().is_none());
    }

    #[test]
    fn offsets_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.bin");

        let offset = ImuOffset {
            bias: [0.1, -0.2, 0.05],
            calibrated: true,
        };
        {
            let mut store = FileStore::open(&path).unwrap();
            store.save_imu_offset(ImuSide::Mobile, &offset).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.load_imu_offset(ImuSide::Mobile).unwrap(), Some(offset));
        // The other side was never saved.
        assert!(store.load_imu_offset(ImuSide::Fixed).unwrap().is_none());
    }

    #[test]
    fn saves_do_not_clobber_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.bin");
        let mut store = FileStore::open(&path).unwrap();

        let mat = MatOffset {
            cell_baseline: [100; 9],
            total_mean: 100.0,
            detection_threshold: 15.0,
            calibrated: true,
        };
        store.save_mat_offset(&mat).unwrap();
        store
            .save_notifications(&NotificationsSettings::default())
            .unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.load_mat_offset().unwrap(), Some(mat));
        assert!(reopened.load_notifications().unwrap().is_some());
    }

    #[test]
    fn corrupted_blob_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.bin");
        fs::write(&path, b"\xff\xff\xff\xff not postcard").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(StorageError::Corrupted)
        ));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.bin");
        let mut store = FileStore::open(&path).unwrap();
        store
            .save_notifications(&NotificationsSettings::default())
            .unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn mem_store_roundtrip() {
        let mut store = MemStore::new();
        let offset = ImuOffset {
            bias: [0.0, 0.0, 0.01],
            calibrated: true,
        };
        store.save_imu_offset(ImuSide::Fixed, &offset).unwrap();
        assert_eq!(store.load_imu_offset(ImuSide::Fixed).unwrap(), Some(offset));
    }
}
