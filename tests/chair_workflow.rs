//! End-to-end workflow tests: broker codec → ChairService → FSM →
//! pattern engine → alarm lines, over simulated hardware.

use std::cell::RefCell;
use std::rc::Rc;

use seatsense::adapters::sim::{AlarmLines, RecordingSink, SimAlarm, SimClock, SimImu, SimPressureMat};
use seatsense::adapters::store::MemStore;
use seatsense::app::events::ChairEvent;
use seatsense::app::service::ChairService;
use seatsense::config::{NotificationsSettings, SystemConfig};
use seatsense::devices::DeviceOrchestrator;
use seatsense::fsm::TiltState;
use seatsense::link::{codec, topics};

type SimDevices =
    DeviceOrchestrator<SimImu, SimImu, SimPressureMat, SimClock, SimImu, SimAlarm, MemStore>;

struct Rig {
    service: ChairService,
    devices: SimDevices,
    sink: RecordingSink,
    lines: Rc<RefCell<AlarmLines>>,
}

impl Rig {
    /// Calibrated controller with an empty seat and a level backrest.
    fn new() -> Self {
        let config = SystemConfig {
            imu_calibration_samples: 4,
            mat_calibration_iterations: 3,
            ..SystemConfig::default()
        };

        let alarm = SimAlarm::new();
        let lines = alarm.lines();
        let mut devices = DeviceOrchestrator::new(
            config.clone(),
            SimImu::level(),
            SimImu::level(),
            SimPressureMat::with_baseline(100),
            SimClock::starting_at(1_700_000_000),
            SimImu::level(),
            alarm,
            MemStore::new(),
        );
        devices.initialize_devices();
        devices.calibrate_pressure_mat().unwrap();

        let mut service = ChairService::new(config, NotificationsSettings::default());
        service.start();

        Self {
            service,
            devices,
            sink: RecordingSink::new(),
            lines,
        }
    }

    /// Deliver a broker message through the codec, the way the transport
    /// adapter would.
    fn deliver(&mut self, topic: &str, payload: &str) {
        if let Some(cmd) = codec::decode(topic, payload) {
            self.service.handle_command(cmd, &mut self.devices);
        }
    }

    fn advance(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.service.tick(&mut self.devices, &mut self.sink);
        }
    }

    fn state(&self) -> TiltState {
        self.service.workflow_state()
    }

    fn lines(&self) -> AlarmLines {
        *self.lines.borrow()
    }

    fn tilt_codes(&self) -> Vec<u8> {
        self.sink
            .events
            .iter()
            .filter_map(|e| match e {
                ChairEvent::TiltInfo(p) => Some(p.info),
                _ => None,
            })
            .collect()
    }
}

/// Reminder configured to 30° target, 5 s period, 3 s hold — delivered
/// over the broker topics, not injected.
fn configure(rig: &mut Rig) {
    rig.deliver(topics::REQUIRED_ANGLE, "30");
    rig.deliver(topics::REQUIRED_PERIOD, "5");
    rig.deliver(topics::REQUIRED_DURATION, "3");
}

#[test]
fn full_reminder_cycle() {
    let mut rig = Rig::new();
    configure(&mut rig);

    // Empty seat: nothing arms.
    rig.advance(3);
    assert_eq!(rig.state(), TiltState::WaitSitting);
    assert_eq!(rig.lines(), AlarmLines::default());

    // Sit down; the settling time (5 s) runs out.
    rig.devices.pressure_mut().sit(500);
    rig.advance(5);
    assert_eq!(rig.state(), TiltState::WaitPeriod);

    // The sitting period (5 s) elapses: red reminder, motor pulsing.
    rig.advance(5);
    assert_eq!(rig.state(), TiltState::WaitAngleReached);
    assert!(rig.lines().red_led);
    assert!(!rig.lines().green_led);
    // The motor pulses at 0.5 Hz: on in one half-period, off in the other.
    let motor_first = rig.lines().motor;
    rig.advance(1);
    assert_ne!(motor_first, rig.lines().motor);

    // Recline to 26°: clears the 30° target with the 5° tolerance.
    rig.devices.mobile_imu_mut().set_pitch(26.0);
    rig.advance(1);
    assert_eq!(rig.state(), TiltState::HoldAngle);
    assert!(rig.lines().green_led);
    assert!(!rig.lines().red_led);
    assert!(!rig.lines().motor);

    // Hold for the 3 s duration.
    rig.advance(3);
    assert_eq!(rig.state(), TiltState::WaitReturn);

    // Come back upright (below the 2° return threshold): the cycle
    // restarts its period.
    rig.devices.mobile_imu_mut().set_pitch(1.0);
    rig.advance(1);
    assert_eq!(rig.state(), TiltState::WaitPeriod);

    // Progress notices arrived in workflow order.
    assert_eq!(rig.tilt_codes(), vec![1, 2, 3, 4]);

    // Exactly one presence transition was reported.
    assert_eq!(
        rig.sink
            .count_matching(|e| matches!(e, ChairEvent::PresenceChanged(_))),
        1
    );
}

#[test]
fn malformed_setting_parks_the_workflow() {
    let mut rig = Rig::new();
    configure(&mut rig);
    rig.devices.pressure_mut().sit(500);
    rig.advance(10);
    assert_eq!(rig.state(), TiltState::WaitAngleReached);

    // A garbage payload decodes to the inactive default and the guard
    // parks the workflow, still seated.
    rig.deliver(topics::REQUIRED_ANGLE, "abc");
    rig.advance(1);
    assert_eq!(rig.state(), TiltState::WaitSitting);
    assert_eq!(rig.lines(), AlarmLines::default());

    // Nothing arms until the angle is configured again.
    rig.advance(20);
    assert_eq!(rig.state(), TiltState::WaitSitting);
}

#[test]
fn standing_up_cancels_the_red_reminder() {
    let mut rig = Rig::new();
    configure(&mut rig);
    rig.devices.pressure_mut().sit(500);
    rig.advance(10);
    assert!(rig.lines().red_led);

    rig.devices.pressure_mut().stand();
    rig.advance(1);
    assert_eq!(rig.state(), TiltState::WaitSitting);
    assert_eq!(rig.lines(), AlarmLines::default());
}

#[test]
fn disabled_vibration_keeps_the_motor_off() {
    let mut rig = Rig::new();
    configure(&mut rig);

    rig.deliver(
        topics::NOTIFICATIONS_SETTINGS,
        r#"{"notifications_settings": {
            "isLedBlinkingEnabled": true,
            "isVibrationEnabled": false,
            "snoozeTime": 600.0
        }}"#,
    );

    rig.devices.pressure_mut().sit(500);
    rig.advance(10);
    assert_eq!(rig.state(), TiltState::WaitAngleReached);
    assert!(rig.lines().red_led);
    assert!(!rig.lines().motor);
}

#[test]
fn alarm_override_topic_drives_the_lines() {
    let mut rig = Rig::new();

    rig.deliver(topics::SET_ALARM, "1");
    rig.advance(1);
    assert!(rig.lines().red_led);

    rig.deliver(topics::SET_ALARM, "0");
    rig.advance(1);
    assert_eq!(rig.lines(), AlarmLines::default());
}

#[test]
fn heartbeat_is_periodic() {
    let mut rig = Rig::new();
    // Default heartbeat period is 300 s; no presence required.
    rig.advance(301);
    assert_eq!(
        rig.sink
            .count_matching(|e| matches!(e, ChairEvent::Heartbeat(_))),
        1
    );
}
