//! Dual-IMU back-seat-angle tracker.
//!
//! One accelerometer is fixed to the chair base, the other rides on the
//! moving backrest. The back-seat angle is the signed difference between
//! the two pitch readings, so 0° is the chair's neutral upright position
//! regardless of how the base itself is tilted (ramps, slopes).
//!
//! The tracker is pure math: the caller (device orchestrator) must only
//! query it when both IMUs are initialised and their bias calibration is
//! valid, and substitutes the sentinel angle otherwise.

use serde::{Deserialize, Serialize};

/// One raw accelerometer reading, in g.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuSample {
    pub ax: f32,
    pub ay: f32,
    pub az: f32,
}

impl ImuSample {
    pub fn magnitude(&self) -> f32 {
        (self.ax * self.ax + self.ay * self.ay + self.az * self.az).sqrt()
    }
}

/// Persisted per-IMU bias calibration.
///
/// `calibrated` is only ever set by a completed calibration pass — a
/// default-zero offset deserialised from an empty store is invalid and
/// triggers auto-calibration at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImuOffset {
    pub bias: [f32; 3],
    pub calibrated: bool,
}

impl ImuOffset {
    pub fn is_valid(&self) -> bool {
        self.calibrated
    }
}

/// Accumulates samples for a bias calibration pass.
///
/// The pass is complete once `target` samples have been fed; an aborted
/// pass yields no offset, leaving the IMU uncalibrated.
pub struct ImuCalibration {
    sum: [f32; 3],
    count: u16,
    target: u16,
}

impl ImuCalibration {
    pub fn new(target: u16) -> Self {
        Self {
            sum: [0.0; 3],
            count: 0,
            target,
        }
    }

    /// Feed one at-rest sample. Returns the finished offset once the
    /// configured sample count is reached, `None` while more samples are needed.
    pub fn push(&mut self, sample: ImuSample) -> Option<ImuOffset> {
        self.sum[0] += sample.ax;
        self.sum[1] += sample.ay;
        self.sum[2] += sample.az;
        self.count += 1;

        if self.count < self.target {
            return None;
        }

        let n = f32::from(self.count);
        // At rest the sensor should read (0, 0, 1 g); everything else is bias.
        Some(ImuOffset {
            bias: [self.sum[0] / n, self.sum[1] / n, self.sum[2] / n - 1.0],
            calibrated: true,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.count >= self.target
    }
}

/// Pitch of a bias-corrected sample, in degrees.
///
/// Positive pitch = sensor tilted backwards about the lateral axis.
pub fn pitch_deg(sample: ImuSample, offset: &ImuOffset) -> f32 {
    let ax = sample.ax - offset.bias[0];
    let ay = sample.ay - offset.bias[1];
    let az = sample.az - offset.bias[2];
    ax.atan2((ay * ay + az * az).sqrt()).to_degrees()
}

/// Signed backrest angle relative to the base frame, in degrees.
/// 0° is the neutral upright position.
pub fn back_seat_angle(fixed: ImuSample, fixed_offset: &ImuOffset, mobile: ImuSample, mobile_offset: &ImuOffset) -> f32 {
    pitch_deg(mobile, mobile_offset) - pitch_deg(fixed, fixed_offset)
}

/// Coarse "chair is reclined" signal, independent of the tilt-reminder's
/// own target angle.
pub fn is_inclined(angle_deg: f32, min_inclination_deg: f32) -> bool {
    angle_deg.abs() > min_inclination_deg
}
