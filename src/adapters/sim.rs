//! Simulated hardware ports.
//!
//! Scriptable stand-ins for every bus-facing port, used by the demo loop
//! in `main.rs` and by the integration tests. Each sim exposes setters to
//! script the physical situation (someone sits down, the backrest tilts,
//! a device drops off the bus) and the ports read from that scripted
//! state.

use std::cell::RefCell;
use std::rc::Rc;

use crate::app::events::ChairEvent;
use crate::app::ports::EventSink;
use crate::devices::ports::{AlarmPort, ClockPort, ImuPort, MotionPort, PressurePort};
use crate::error::SensorError;
use crate::sensors::orientation::ImuSample;
use crate::sensors::pressure_mat::CELL_COUNT;

// ───────────────────────────────────────────────────────────────
// IMU
// ───────────────────────────────────────────────────────────────

/// Simulated accelerometer. Reports a gravity vector for a scripted pitch
/// angle; optionally disconnected or failing.
pub struct SimImu {
    pub connected: bool,
    pub fail_reads: bool,
    sample: ImuSample,
}

impl SimImu {
    pub fn level() -> Self {
        let mut imu = Self {
            connected: true,
            fail_reads: false,
            sample: ImuSample::default(),
        };
        imu.set_pitch(0.0);
        imu
    }

    /// Script the sensor's pitch (degrees about the lateral axis).
    pub fn set_pitch(&mut self, deg: f32) {
        let rad = deg.to_radians();
        self.sample = ImuSample {
            ax: rad.sin(),
            ay: 0.0,
            az: rad.cos(),
        };
    }

    /// Script a raw sample directly (for vibration scenarios).
    pub fn set_sample(&mut self, sample: ImuSample) {
        self.sample = sample;
    }
}

impl ImuPort for SimImu {
    fn probe(&mut self) -> bool {
        self.connected
    }

    fn read(&mut self) -> Result<ImuSample, SensorError> {
        if !self.connected {
            return Err(SensorError::Disconnected);
        }
        if self.fail_reads {
            return Err(SensorError::ImuReadFailed);
        }
        Ok(self.sample)
    }
}

impl MotionPort for SimImu {
    fn probe(&mut self) -> bool {
        self.connected
    }

    fn read(&mut self) -> Result<ImuSample, SensorError> {
        ImuPort::read(self)
    }
}

// ───────────────────────────────────────────────────────────────
// Pressure mat ADC
// ───────────────────────────────────────────────────────────────

/// Simulated mat ADC. Scripts a uniform baseline plus an optional load.
pub struct SimPressureMat {
    pub connected: bool,
    pub fail_reads: bool,
    scan: [u16; CELL_COUNT],
    baseline: u16,
}

impl SimPressureMat {
    pub fn with_baseline(baseline: u16) -> Self {
        Self {
            connected: true,
            fail_reads: false,
            scan: [baseline; CELL_COUNT],
            baseline,
        }
    }

    /// Someone sits down: every cell rises by `load` above the baseline.
    pub fn sit(&mut self, load: u16) {
        self.scan = [self.baseline.saturating_add(load); CELL_COUNT];
    }

    /// The seat empties.
    pub fn stand(&mut self) {
        self.scan = [self.baseline; CELL_COUNT];
    }

    /// Script an arbitrary scan, in ADC channel order.
    pub fn set_scan(&mut self, scan: [u16; CELL_COUNT]) {
        self.scan = scan;
    }
}

impl PressurePort for SimPressureMat {
    fn probe(&mut self) -> bool {
        self.connected
    }

    fn scan(&mut self) -> Result<[u16; CELL_COUNT], SensorError> {
        if !self.connected {
            return Err(SensorError::Disconnected);
        }
        if self.fail_reads {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(self.scan)
    }
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Simulated RTC that advances one second per read.
pub struct SimClock {
    now: u64,
}

impl SimClock {
    pub fn starting_at(epoch_secs: u64) -> Self {
        Self { now: epoch_secs }
    }
}

impl ClockPort for SimClock {
    fn probe(&mut self) -> bool {
        true
    }

    fn epoch_secs(&mut self) -> Result<u64, SensorError> {
        self.now += 1;
        Ok(self.now)
    }
}

// ───────────────────────────────────────────────────────────────
// Alarm module
// ───────────────────────────────────────────────────────────────

/// Last observed state of the alarm output lines, shared so tests can
/// assert on it while the orchestrator owns the port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmLines {
    pub red_led: bool,
    pub green_led: bool,
    pub motor: bool,
}

#[derive(Clone)]
pub struct SimAlarm {
    pub connected: bool,
    lines: Rc<RefCell<AlarmLines>>,
}

impl SimAlarm {
    pub fn new() -> Self {
        Self {
            connected: true,
            lines: Rc::new(RefCell::new(AlarmLines::default())),
        }
    }

    /// A handle for observing the lines after the port has been moved
    /// into the orchestrator.
    pub fn lines(&self) -> Rc<RefCell<AlarmLines>> {
        Rc::clone(&self.lines)
    }
}

impl Default for SimAlarm {
    fn default() -> Self {
        Self::new()
    }
}

impl AlarmPort for SimAlarm {
    fn probe(&mut self) -> bool {
        self.connected
    }

    fn set_red_led(&mut self, on: bool) {
        self.lines.borrow_mut().red_led = on;
    }

    fn set_green_led(&mut self, on: bool) {
        self.lines.borrow_mut().green_led = on;
    }

    fn set_motor(&mut self, on: bool) {
        self.lines.borrow_mut().motor = on;
    }
}

// ───────────────────────────────────────────────────────────────
// Event recorder
// ───────────────────────────────────────────────────────────────

/// [`EventSink`] that records everything, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<ChairEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn count_matching(&self, pred: impl Fn(&ChairEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ChairEvent) {
        self.events.push(event.clone());
    }
}
