//! Device orchestrator — lifecycle supervision for every physical device
//! and the producer of the one fused snapshot per control cycle.
//!
//! Every sensor handle is injected at construction; the orchestrator is
//! the sole owner of the settings store, so the startup auto-calibration
//! path and on-demand recalibration commands funnel through the same
//! calibrate-then-persist operations and nothing can observe a
//! half-written offset.

use log::{info, warn};

use crate::app::ports::{ImuSide, SettingsStore};
use crate::config::{NotificationsSettings, SystemConfig};
use crate::drivers::alarm_patterns::AlarmOutput;
use crate::error::{Error, Result};
use crate::sensors::force_plate::PlateGeometry;
use crate::sensors::motion::MotionDetector;
use crate::sensors::orientation::{self, ImuCalibration, ImuOffset};
use crate::sensors::pressure_mat::{rearrange_scan, MatCalibration, MatOffset, PressureMat, Quadrant};
use crate::sensors::Coord;

use super::ports::{AlarmPort, ClockPort, ImuPort, MotionPort, PressurePort};
use super::{CalibrationTarget, DeviceId, DeviceState};

/// Sentinel angle reported while the two IMUs are not simultaneously
/// initialised and calibrated. Consumers must check `angle_valid`, not
/// the value.
pub const DEFAULT_BACK_SEAT_ANGLE: f32 = 0.0;

/// One control-cycle reading, immutable once produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct FusedSnapshot {
    /// Seconds since the Unix epoch at the start of the cycle.
    pub timestamp: u64,
    /// Someone is on the mat.
    pub present: bool,
    /// Global centre of pressure (cm from seat centre).
    pub centre_of_pressure: Coord,
    /// Per-quadrant centres of pressure.
    pub quadrant_cops: [Coord; Quadrant::COUNT],
    /// Backrest angle relative to the base frame (degrees).
    pub back_seat_angle: f32,
    /// `back_seat_angle` came from two calibrated IMUs this cycle.
    pub angle_valid: bool,
    /// Coarse "chair is reclined" flag.
    pub is_inclined: bool,
    /// The chair is moving.
    pub is_moving: bool,
    /// Latest motion-accelerometer magnitude (g); 1.0 at rest.
    pub accel_magnitude_g: f32,
}

/// Per-device health summary for the status telemetry topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorsStatus {
    pub notification_module: bool,
    pub fixed_accelerometer: bool,
    pub mobile_accelerometer: bool,
    pub pressure_mat: bool,
}

pub struct DeviceOrchestrator<FI, MI, P, C, M, A, S> {
    fixed_imu: FI,
    mobile_imu: MI,
    pressure: P,
    clock: C,
    motion: M,
    alarm: A,
    store: S,

    config: SystemConfig,
    mat: PressureMat,
    motion_detector: MotionDetector,
    fixed_offset: ImuOffset,
    mobile_offset: ImuOffset,

    /// Lifecycle state per addressable device.
    states: [DeviceState; DeviceId::COUNT],
    /// Last probe result per addressable device, for state-change queries.
    connected: [bool; DeviceId::COUNT],
    mat_state: DeviceState,
    rtc_state: DeviceState,

    last_snapshot: FusedSnapshot,
}

impl<FI, MI, P, C, M, A, S> DeviceOrchestrator<FI, MI, P, C, M, A, S>
where
    FI: ImuPort,
    MI: ImuPort,
    P: PressurePort,
    C: ClockPort,
    M: MotionPort,
    A: AlarmPort,
    S: SettingsStore,
{
    pub fn new(
        config: SystemConfig,
        fixed_imu: FI,
        mobile_imu: MI,
        pressure: P,
        clock: C,
        motion: M,
        alarm: A,
        store: S,
    ) -> Self {
        let geometry = PlateGeometry {
            dx: config.plate_dx_cm,
            dy: config.plate_dy_cm,
            dz: config.plate_dz_cm,
        };
        let motion_detector = MotionDetector::new(config.moving_trigger_g);
        Self {
            fixed_imu,
            mobile_imu,
            pressure,
            clock,
            motion,
            alarm,
            store,
            config,
            mat: PressureMat::new(geometry),
            motion_detector,
            fixed_offset: ImuOffset::default(),
            mobile_offset: ImuOffset::default(),
            states: [DeviceState::Uninitialized; DeviceId::COUNT],
            connected: [false; DeviceId::COUNT],
            mat_state: DeviceState::Uninitialized,
            rtc_state: DeviceState::Uninitialized,
            last_snapshot: FusedSnapshot::default(),
        }
    }

    // ── Startup ───────────────────────────────────────────────

    /// Initialise every device in the fixed startup order. Individual
    /// failures degrade (the device stays Uninitialized and the reconnect
    /// supervision keeps retrying); startup itself never aborts.
    pub fn initialize_devices(&mut self) {
        self.init_pressure_mat();
        self.init_mobile_imu();
        self.init_fixed_imu();

        // RTC and alarm share the expander bus with the mat ADC; keep
        // their bring-up sequenced after the sensor init.
        self.rtc_state = if self.clock.probe() {
            DeviceState::Initialized
        } else {
            warn!("RTC did not answer its probe");
            DeviceState::Uninitialized
        };

        let motion_ok = self.motion.probe();
        self.set_state(DeviceId::MotionSensor, motion_ok);

        let alarm_ok = self.alarm.probe();
        self.set_state(DeviceId::Alarm, alarm_ok);
        if alarm_ok {
            self.alarm.all_off();
        }

        info!(
            "devices initialised: mat={:?} fixed_imu={:?} mobile_imu={:?} rtc={:?} motion={:?} alarm={:?}",
            self.mat_state,
            self.state(DeviceId::FixedImu),
            self.state(DeviceId::MobileImu),
            self.rtc_state,
            self.state(DeviceId::MotionSensor),
            self.state(DeviceId::Alarm),
        );
    }

    fn init_pressure_mat(&mut self) {
        if !self.pressure.probe() {
            warn!("pressure mat ADC did not answer its probe");
            self.mat_state = DeviceState::Uninitialized;
            return;
        }
        self.mat_state = DeviceState::Initialized;

        match self.store.load_mat_offset() {
            Ok(Some(offset)) if offset.is_valid() => {
                self.mat.set_offset(offset);
                self.mat_state = DeviceState::Calibrated;
                info!("pressure mat offsets restored from store");
            }
            Ok(_) => info!("no valid pressure mat offsets; awaiting calibration"),
            Err(e) => warn!("pressure mat offset load failed: {e}"),
        }
    }

    fn init_fixed_imu(&mut self) {
        let ok = self.fixed_imu.probe();
        self.set_state(DeviceId::FixedImu, ok);
        if !ok {
            warn!("fixed IMU did not answer its probe");
            return;
        }

        match self.store.load_imu_offset(ImuSide::Fixed) {
            Ok(Some(offset)) if offset.is_valid() => {
                self.fixed_offset = offset;
                self.states[DeviceId::FixedImu as usize] = DeviceState::Calibrated;
            }
            Ok(_) => {
                info!("fixed IMU offset invalid; auto-calibrating");
                if let Err(e) = self.calibrate_fixed_imu() {
                    warn!("fixed IMU auto-calibration failed: {e}");
                }
            }
            Err(e) => warn!("fixed IMU offset load failed: {e}"),
        }
    }

    fn init_mobile_imu(&mut self) {
        let ok = self.mobile_imu.probe();
        self.set_state(DeviceId::MobileImu, ok);
        if !ok {
            warn!("mobile IMU did not answer its probe");
            return;
        }

        match self.store.load_imu_offset(ImuSide::Mobile) {
            Ok(Some(offset)) if offset.is_valid() => {
                self.mobile_offset = offset;
                self.states[DeviceId::MobileImu as usize] = DeviceState::Calibrated;
            }
            Ok(_) => {
                info!("mobile IMU offset invalid; auto-calibrating");
                if let Err(e) = self.calibrate_mobile_imu() {
                    warn!("mobile IMU auto-calibration failed: {e}");
                }
            }
            Err(e) => warn!("mobile IMU offset load failed: {e}"),
        }
    }

    // ── Per-cycle update ──────────────────────────────────────

    /// Pull every sensor once and build the cycle's fused snapshot.
    /// Reads happen before the snapshot is assembled; the caller hands the
    /// finished value to the workflow, never a partially-updated one.
    pub fn update(&mut self) -> FusedSnapshot {
        let mut snapshot = self.last_snapshot;

        if self.rtc_state.is_initialized() {
            match self.clock.epoch_secs() {
                Ok(secs) => snapshot.timestamp = secs,
                Err(e) => warn!("RTC read failed: {e}"),
            }
        }

        if self.state(DeviceId::MotionSensor).is_initialized() {
            match self.motion.read() {
                Ok(sample) => {
                    snapshot.is_moving = self.motion_detector.push(sample);
                    snapshot.accel_magnitude_g = self.motion_detector.last_magnitude();
                }
                Err(e) => warn!("motion sensor read failed: {e}"),
            }
        }

        snapshot.back_seat_angle = DEFAULT_BACK_SEAT_ANGLE;
        snapshot.angle_valid = false;
        if self.state(DeviceId::FixedImu).is_calibrated() && self.state(DeviceId::MobileImu).is_calibrated() {
            match (self.fixed_imu.read(), self.mobile_imu.read()) {
                (Ok(fixed), Ok(mobile)) => {
                    let angle = orientation::back_seat_angle(
                        fixed,
                        &self.fixed_offset,
                        mobile,
                        &self.mobile_offset,
                    );
                    snapshot.back_seat_angle = angle;
                    snapshot.angle_valid = true;
                    snapshot.is_inclined =
                        orientation::is_inclined(angle, self.config.min_inclination_deg);
                }
                (fixed, mobile) => {
                    if let Err(e) = fixed {
                        warn!("fixed IMU read failed: {e}");
                    }
                    if let Err(e) = mobile {
                        warn!("mobile IMU read failed: {e}");
                    }
                }
            }
        }

        if self.mat_state.is_calibrated() {
            match self.pressure.scan() {
                Ok(scan) => {
                    self.mat.set_scan(&scan);
                    snapshot.present = self.mat.is_user_detected();
                    let field = self.mat.compute_force_plates();
                    snapshot.centre_of_pressure = field.global.cop;
                    snapshot.quadrant_cops = field.quadrant_cops();
                }
                Err(e) => warn!("pressure mat scan failed: {e}"),
            }
        }

        self.last_snapshot = snapshot;
        snapshot
    }

    // ── Calibration (single calibrate-then-persist funnel) ────

    /// Calibrate the pressure mat and persist the offsets immediately.
    /// An incomplete pass leaves the mat uncalibrated with no partial
    /// offsets persisted.
    pub fn calibrate_pressure_mat(&mut self) -> Result<()> {
        info!("calibrating pressure mat");
        let iterations = self.config.mat_calibration_iterations;
        let mut cal = MatCalibration::new(iterations, self.config.detection_margin);

        let mut offset: Option<MatOffset> = None;
        for _ in 0..iterations {
            match self.pressure.scan() {
                Ok(scan) => offset = cal.push_scan(&rearrange_scan(&scan)),
                Err(e) => {
                    warn!("pressure mat calibration aborted: {e}");
                    self.mat.set_offset(MatOffset::default());
                    self.mat_state = DeviceState::Initialized;
                    return Err(Error::CalibrationIncomplete(CalibrationTarget::PressureMat));
                }
            }
        }

        let offset = offset
            .ok_or(Error::CalibrationIncomplete(CalibrationTarget::PressureMat))?;
        if let Err(e) = self.store.save_mat_offset(&offset) {
            warn!("pressure mat offset persist failed: {e}");
        }
        self.mat.set_offset(offset);
        self.mat_state = DeviceState::Calibrated;
        info!("pressure mat calibrated");
        Ok(())
    }

    /// Calibrate both IMUs (the broker exposes them as one request).
    pub fn calibrate_imus(&mut self) -> Result<()> {
        self.calibrate_fixed_imu()?;
        self.calibrate_mobile_imu()
    }

    pub fn calibrate_fixed_imu(&mut self) -> Result<()> {
        if !self.state(DeviceId::FixedImu).is_initialized() {
            return Err(Error::NotReady(DeviceId::FixedImu));
        }
        info!("calibrating fixed IMU");
        let samples = self.config.imu_calibration_samples;
        let mut cal = ImuCalibration::new(samples);
        let mut offset: Option<ImuOffset> = None;
        for _ in 0..samples {
            match self.fixed_imu.read() {
                Ok(sample) => offset = cal.push(sample),
                Err(e) => {
                    warn!("fixed IMU calibration aborted: {e}");
                    self.fixed_offset.calibrated = false;
                    self.states[DeviceId::FixedImu as usize] = DeviceState::Initialized;
                    return Err(Error::CalibrationIncomplete(CalibrationTarget::FixedImu));
                }
            }
        }
        let offset =
            offset.ok_or(Error::CalibrationIncomplete(CalibrationTarget::FixedImu))?;
        if let Err(e) = self.store.save_imu_offset(ImuSide::Fixed, &offset) {
            warn!("fixed IMU offset persist failed: {e}");
        }
        self.fixed_offset = offset;
        self.states[DeviceId::FixedImu as usize] = DeviceState::Calibrated;
        info!("fixed IMU calibrated");
        Ok(())
    }

    pub fn calibrate_mobile_imu(&mut self) -> Result<()> {
        if !self.state(DeviceId::MobileImu).is_initialized() {
            return Err(Error::NotReady(DeviceId::MobileImu));
        }
        info!("calibrating mobile IMU");
        let samples = self.config.imu_calibration_samples;
        let mut cal = ImuCalibration::new(samples);
        let mut offset: Option<ImuOffset> = None;
        for _ in 0..samples {
            match self.mobile_imu.read() {
                Ok(sample) => offset = cal.push(sample),
                Err(e) => {
                    warn!("mobile IMU calibration aborted: {e}");
                    self.mobile_offset.calibrated = false;
                    self.states[DeviceId::MobileImu as usize] = DeviceState::Initialized;
                    return Err(Error::CalibrationIncomplete(CalibrationTarget::MobileImu));
                }
            }
        }
        let offset =
            offset.ok_or(Error::CalibrationIncomplete(CalibrationTarget::MobileImu))?;
        if let Err(e) = self.store.save_imu_offset(ImuSide::Mobile, &offset) {
            warn!("mobile IMU offset persist failed: {e}");
        }
        self.mobile_offset = offset;
        self.states[DeviceId::MobileImu as usize] = DeviceState::Calibrated;
        info!("mobile IMU calibrated");
        Ok(())
    }

    // ── Reconnect supervision ─────────────────────────────────

    /// Re-run a device's startup initialisation path when it answers its
    /// probe again after a drop-out. Dispatch is by the capability tag,
    /// not runtime type identity.
    pub fn reconnect(&mut self, device: DeviceId) {
        let connected = self.probe(device);
        self.connected[device as usize] = connected;
        if !connected {
            self.states[device as usize] = DeviceState::Uninitialized;
            return;
        }
        if self.state(device).is_initialized() {
            return;
        }

        info!("reconnecting {device:?}");
        match device {
            DeviceId::FixedImu => self.init_fixed_imu(),
            DeviceId::MobileImu => self.init_mobile_imu(),
            DeviceId::MotionSensor => {
                let ok = self.motion.probe();
                self.set_state(DeviceId::MotionSensor, ok);
            }
            DeviceId::Alarm => {
                let ok = self.alarm.probe();
                self.set_state(DeviceId::Alarm, ok);
            }
        }
    }

    /// Reconnect addressed by a raw id from outside; an unknown id is a
    /// reported error.
    pub fn reconnect_raw(&mut self, raw: u8) -> Result<()> {
        let device = DeviceId::from_raw(raw).ok_or(Error::UnknownDevice(raw))?;
        self.reconnect(device);
        Ok(())
    }

    /// Whether the device's connectivity changed since the last query.
    pub fn is_state_changed(&mut self, device: DeviceId) -> bool {
        let connected = self.probe(device);
        let changed = connected != self.connected[device as usize];
        self.connected[device as usize] = connected;
        if changed {
            let state = self.state(device);
            if !connected && state.is_initialized() {
                warn!("{device:?} disconnected");
                self.states[device as usize] = DeviceState::Uninitialized;
            }
        }
        changed
    }

    fn probe(&mut self, device: DeviceId) -> bool {
        match device {
            DeviceId::Alarm => self.alarm.probe(),
            DeviceId::MobileImu => self.mobile_imu.probe(),
            DeviceId::FixedImu => self.fixed_imu.probe(),
            DeviceId::MotionSensor => self.motion.probe(),
        }
    }

    // ── Queries & pass-throughs ───────────────────────────────

    pub fn state(&self, device: DeviceId) -> DeviceState {
        self.states[device as usize]
    }

    pub fn is_pressure_mat_calibrated(&self) -> bool {
        self.mat_state.is_calibrated()
    }

    pub fn sensors_status(&self) -> SensorsStatus {
        SensorsStatus {
            notification_module: self.state(DeviceId::Alarm).is_initialized(),
            fixed_accelerometer: self.state(DeviceId::FixedImu).is_initialized(),
            mobile_accelerometer: self.state(DeviceId::MobileImu).is_initialized(),
            pressure_mat: self.mat_state.is_initialized(),
        }
    }

    /// Drive the notification module's output lines for this cycle.
    pub fn apply_alarm(&mut self, output: AlarmOutput) {
        if !self.state(DeviceId::Alarm).is_initialized() {
            return;
        }
        self.alarm.set_red_led(output.red_led);
        self.alarm.set_green_led(output.green_led);
        self.alarm.set_motor(output.motor);
    }

    /// Safe-off on shutdown.
    pub fn turn_off(&mut self) {
        if self.state(DeviceId::Alarm).is_initialized() {
            self.alarm.all_off();
        }
    }

    /// Notification settings live in the same store as the offsets; the
    /// service reads and writes them through the orchestrator so the
    /// store has exactly one owner.
    pub fn load_notifications(&self) -> NotificationsSettings {
        match self.store.load_notifications() {
            Ok(Some(settings)) => settings,
            Ok(None) => NotificationsSettings::default(),
            Err(e) => {
                warn!("notification settings load failed: {e}");
                NotificationsSettings::default()
            }
        }
    }

    pub fn save_notifications(&mut self, settings: &NotificationsSettings) {
        if let Err(e) = self.store.save_notifications(settings) {
            warn!("notification settings persist failed: {e}");
        }
    }

    /// Mutable access to the injected ports. The simulation binary and the
    /// tests script scenarios through these; production code has no
    /// business touching a port directly.
    pub fn fixed_imu_mut(&mut self) -> &mut FI {
        &mut self.fixed_imu
    }

    pub fn mobile_imu_mut(&mut self) -> &mut MI {
        &mut self.mobile_imu
    }

    pub fn pressure_mut(&mut self) -> &mut P {
        &mut self.pressure
    }

    pub fn motion_mut(&mut self) -> &mut M {
        &mut self.motion
    }

    fn set_state(&mut self, device: DeviceId, connected: bool) {
        self.connected[device as usize] = connected;
        self.states[device as usize] = if connected {
            DeviceState::Initialized
        } else {
            DeviceState::Uninitialized
        };
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    // The mocks' trait impls spell out their error types; shadow the
    // crate-wide single-parameter alias pulled in by the glob import.
    use std::result::Result;

    use super::*;
    use crate::app::ports::StorageError;
    use crate::sensors::orientation::ImuSample;
    use crate::sensors::pressure_mat::CELL_COUNT;

    struct SimImu {
        connected: bool,
        sample: Result<ImuSample, crate::error::SensorError>,
    }

    impl SimImu {
        fn level() -> Self {
            Self {
                connected: true,
                sample: Ok(ImuSample {
                    ax: 0.0,
                    ay: 0.0,
                    az: 1.0,
                }),
            }
        }

        fn tilted(deg: f32) -> Self {
            let rad = deg.to_radians();
            Self {
                connected: true,
                sample: Ok(ImuSample {
                    ax: rad.sin(),
                    ay: 0.0,
                    az: rad.cos(),
                }),
            }
        }
    }

    impl ImuPort for SimImu {
        fn probe(&mut self) -> bool {
            self.connected
        }

        fn read(&mut self) -> Result<ImuSample, crate::error::SensorError> {
            self.sample
        }
    }

    struct SimPressure {
        connected: bool,
        scan: Result<[u16; CELL_COUNT], crate::error::SensorError>,
    }

    impl SimPressure {
        fn flat(raw: u16) -> Self {
            Self {
                connected: true,
                scan: Ok([raw; CELL_COUNT]),
            }
        }
    }

    impl PressurePort for SimPressure {
        fn probe(&mut self) -> bool {
            self.connected
        }

        fn scan(&mut self) -> Result<[u16; CELL_COUNT], crate::error::SensorError> {
            self.scan
        }
    }

    struct SimClock {
        now: u64,
    }

    impl ClockPort for SimClock {
        fn probe(&mut self) -> bool {
            true
        }

        fn epoch_secs(&mut self) -> Result<u64, crate::error::SensorError> {
            self.now += 1;
            Ok(self.now)
        }
    }

    struct SimMotion;

    impl MotionPort for SimMotion {
        fn probe(&mut self) -> bool {
            true
        }

        fn read(&mut self) -> Result<ImuSample, crate::error::SensorError> {
            Ok(ImuSample {
                ax: 0.0,
                ay: 0.0,
                az: 1.0,
            })
        }
    }

    #[derive(Clone, Default)]
    struct SimAlarm {
        lines: Rc<RefCell<(bool, bool, bool)>>,
    }

    impl AlarmPort for SimAlarm {
        fn probe(&mut self) -> bool {
            true
        }

        fn set_red_led(&mut self, on: bool) {
            self.lines.borrow_mut().0 = on;
        }

        fn set_green_led(&mut self, on: bool) {
            self.lines.borrow_mut().1 = on;
        }

        fn set_motor(&mut self, on: bool) {
            self.lines.borrow_mut().2 = on;
        }
    }

    #[derive(Clone, Default)]
    struct RecordingStore {
        inner: Rc<RefCell<StoreInner>>,
    }

    #[derive(Default)]
    struct StoreInner {
        mat: Option<MatOffset>,
        fixed: Option<ImuOffset>,
        mobile: Option<ImuOffset>,
        notifications: Option<NotificationsSettings>,
        saves: usize,
    }

    impl SettingsStore for RecordingStore {
        fn load_mat_offset(&self) -> Result<Option<MatOffset>, StorageError> {
            Ok(self.inner.borrow().mat.clone())
        }

        fn save_mat_offset(&mut self, offset: &MatOffset) -> Result<(), StorageError> {
            let mut inner = self.inner.borrow_mut();
            inner.mat = Some(offset.clone());
            inner.saves += 1;
            Ok(())
        }

        fn load_imu_offset(&self, side: ImuSide) -> Result<Option<ImuOffset>, StorageError> {
            let inner = self.inner.borrow();
            Ok(match side {
                ImuSide::Fixed => inner.fixed,
                ImuSide::Mobile => inner.mobile,
            })
        }

        fn save_imu_offset(
            &mut self,
            side: ImuSide,
            offset: &ImuOffset,
        ) -> Result<(), StorageError> {
            let mut inner = self.inner.borrow_mut();
            match side {
                ImuSide::Fixed => inner.fixed = Some(*offset),
                ImuSide::Mobile => inner.mobile = Some(*offset),
            }
            inner.saves += 1;
            Ok(())
        }

        fn load_notifications(&self) -> Result<Option<NotificationsSettings>, StorageError> {
            Ok(self.inner.borrow().notifications.clone())
        }

        fn save_notifications(
            &mut self,
            settings: &NotificationsSettings,
        ) -> Result<(), StorageError> {
            self.inner.borrow_mut().notifications = Some(settings.clone());
            Ok(())
        }
    }

    fn test_config() -> SystemConfig {
        SystemConfig {
            imu_calibration_samples: 4,
            mat_calibration_iterations: 3,
            ..SystemConfig::default()
        }
    }

    type TestOrchestrator =
        DeviceOrchestrator<SimImu, SimImu, SimPressure, SimClock, SimMotion, SimAlarm, RecordingStore>;

    fn orchestrator(store: RecordingStore) -> TestOrchestrator {
        DeviceOrchestrator::new(
            test_config(),
            SimImu::level(),
            SimImu::tilted(30.0),
            SimPressure::flat(100),
            SimClock { now: 1000 },
            SimMotion,
            SimAlarm::default(),
            store,
        )
    }

    #[test]
    fn fresh_store_triggers_imu_auto_calibration() {
        let store = RecordingStore::default();
        let mut orch = orchestrator(store.clone());
        orch.initialize_devices();

        assert!(orch.state(DeviceId::FixedImu).is_calibrated());
        assert!(orch.state(DeviceId::MobileImu).is_calibrated());
        // Both passes persisted their offsets.
        assert!(store.inner.borrow().fixed.is_some());
        assert!(store.inner.borrow().mobile.is_some());
        // Mat has no baseline yet, so it stays short of Calibrated.
        assert!(!orch.is_pressure_mat_calibrated());
    }

    #[test]
    fn persisted_offsets_skip_auto_calibration() {
        let store = RecordingStore::default();
        {
            let mut inner = store.inner.borrow_mut();
            let offset = ImuOffset {
                bias: [0.0; 3],
                calibrated: true,
            };
            inner.fixed = Some(offset);
            inner.mobile = Some(offset);
        }
        let mut orch = orchestrator(store.clone());
        orch.initialize_devices();

        assert!(orch.state(DeviceId::FixedImu).is_calibrated());
        // Nothing was re-persisted.
        assert_eq!(store.inner.borrow().saves, 0);
    }

    #[test]
    fn snapshot_carries_relative_angle() {
        let store = RecordingStore::default();
        {
            let mut inner = store.inner.borrow_mut();
            let offset = ImuOffset {
                bias: [0.0; 3],
                calibrated: true,
            };
            inner.fixed = Some(offset);
            inner.mobile = Some(offset);
        }
        let mut orch = orchestrator(store);
        orch.initialize_devices();
        // Base on a 5° ramp, backrest at 30° in the world frame.
        orch.fixed_imu = SimImu::tilted(5.0);
        orch.mobile_imu = SimImu::tilted(30.0);

        let snap = orch.update();
        assert!(snap.angle_valid);
        assert!((snap.back_seat_angle - 25.0).abs() < 0.1);
        assert!(snap.is_inclined);
        assert!(snap.timestamp > 1000);
    }

    #[test]
    fn angle_is_sentinel_until_both_imus_calibrated() {
        let mut orch = orchestrator(RecordingStore::default());
        // No initialisation at all.
        let snap = orch.update();
        assert!(!snap.angle_valid);
        assert_eq!(snap.back_seat_angle, DEFAULT_BACK_SEAT_ANGLE);
    }

    #[test]
    fn mat_calibration_persists_then_detects() {
        let store = RecordingStore::default();
        let mut orch = orchestrator(store.clone());
        orch.initialize_devices();

        orch.calibrate_pressure_mat().unwrap();
        assert!(orch.is_pressure_mat_calibrated());
        assert!(store.inner.borrow().mat.as_ref().unwrap().is_valid());

        // Someone sits down.
        orch.pressure = SimPressure::flat(600);
        let snap = orch.update();
        assert!(snap.present);
    }

    #[test]
    fn failed_calibration_leaves_no_partial_state() {
        let store = RecordingStore::default();
        let mut orch = orchestrator(store.clone());
        orch.initialize_devices();
        orch.pressure.scan = Err(crate::error::SensorError::AdcReadFailed);

        let err = orch.calibrate_pressure_mat().unwrap_err();
        assert_eq!(
            err,
            Error::CalibrationIncomplete(CalibrationTarget::PressureMat)
        );
        assert!(!orch.is_pressure_mat_calibrated());
        assert!(store.inner.borrow().mat.is_none());
    }

    #[test]
    fn failed_imu_read_aborts_calibration() {
        let mut orch = orchestrator(RecordingStore::default());
        orch.initialize_devices();
        orch.fixed_imu.sample = Err(crate::error::SensorError::ImuReadFailed);

        let err = orch.calibrate_fixed_imu().unwrap_err();
        assert_eq!(err, Error::CalibrationIncomplete(CalibrationTarget::FixedImu));
        assert!(!orch.state(DeviceId::FixedImu).is_calibrated());
    }

    #[test]
    fn calibration_requires_an_initialized_device() {
        let mut orch = orchestrator(RecordingStore::default());
        assert_eq!(
            orch.calibrate_fixed_imu().unwrap_err(),
            Error::NotReady(DeviceId::FixedImu)
        );
    }

    #[test]
    fn unknown_raw_device_id_is_reported() {
        let mut orch = orchestrator(RecordingStore::default());
        assert_eq!(orch.reconnect_raw(9).unwrap_err(), Error::UnknownDevice(9));
        assert!(orch.reconnect_raw(DeviceId::Alarm as u8).is_ok());
    }

    #[test]
    fn disconnect_is_a_single_state_change() {
        let mut orch = orchestrator(RecordingStore::default());
        orch.initialize_devices();

        assert!(!orch.is_state_changed(DeviceId::FixedImu));
        orch.fixed_imu.connected = false;
        assert!(orch.is_state_changed(DeviceId::FixedImu));
        assert!(!orch.state(DeviceId::FixedImu).is_initialized());
        // Stable disconnected state is not a change.
        assert!(!orch.is_state_changed(DeviceId::FixedImu));
    }

    #[test]
    fn alarm_lines_follow_output() {
        let alarm = SimAlarm::default();
        let mut orch = DeviceOrchestrator::new(
            test_config(),
            SimImu::level(),
            SimImu::level(),
            SimPressure::flat(100),
            SimClock { now: 0 },
            SimMotion,
            alarm.clone(),
            RecordingStore::default(),
        );
        orch.initialize_devices();

        orch.apply_alarm(AlarmOutput {
            red_led: true,
            green_led: false,
            motor: true,
        });
        assert_eq!(*alarm.lines.borrow(), (true, false, true));

        orch.turn_off();
        assert_eq!(*alarm.lines.borrow(), (false, false, false));
    }

    #[test]
    fn sensors_status_reflects_device_states() {
        let mut orch = orchestrator(RecordingStore::default());
        let before = orch.sensors_status();
        assert!(!before.pressure_mat);

        orch.initialize_devices();
        let after = orch.sensors_status();
        assert!(after.notification_module);
        assert!(after.fixed_accelerometer);
        assert!(after.mobile_accelerometer);
        assert!(after.pressure_mat);
    }
}
