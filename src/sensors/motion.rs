//! Movement detection from the base-frame accelerometer.
//!
//! Keeps a short window of acceleration magnitudes and flags the chair as
//! moving when the peak magnitude in the window exceeds the trigger level.
//! At rest the magnitude sits at 1 g regardless of mounting orientation,
//! so no calibration is needed here.

use heapless::HistoryBuffer;

use super::orientation::ImuSample;

const WINDOW: usize = 8;

pub struct MotionDetector {
    window: HistoryBuffer<f32, WINDOW>,
    trigger_g: f32,
    moving: bool,
    last_magnitude: f32,
}

impl MotionDetector {
    pub fn new(trigger_g: f32) -> Self {
        Self {
            window: HistoryBuffer::new(),
            trigger_g,
            moving: false,
            last_magnitude: 1.0,
        }
    }

    /// Feed one sample and return the updated movement flag.
    pub fn push(&mut self, sample: ImuSample) -> bool {
        self.last_magnitude = sample.magnitude();
        self.window.write(self.last_magnitude);
        let peak = self
            .window
            .oldest_ordered()
            .fold(0.0f32, |acc, &m| acc.max(m));
        self.moving = peak > self.trigger_g;
        self.moving
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Magnitude of the most recent sample (g). Feeds the vibration
    /// telemetry.
    pub fn last_magnitude(&self) -> f32 {
        self.last_magnitude
    }
}
