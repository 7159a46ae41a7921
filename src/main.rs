//! SeatSense controller — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  Sim hardware ports    FileStore       broker inbox/codec    │
//! │  (IMU/mat/clock/alarm) (SettingsStore) (topics + JSON)       │
//! │                                                              │
//! │  ─────────────────── Port Trait Boundary ─────────────────── │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │   DeviceOrchestrator → ChairService (FSM + patterns)   │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The broker transport is not part of this crate; the binary feeds a
//! channel of `(topic, payload)` pairs through the codec, exactly the
//! way a transport adapter would, and publishes outbound events through
//! the same codec. Hardware is the simulated port set, scripted below
//! into a complete reminder cycle.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use seatsense::adapters::log_sink::ConsoleLogger;
use seatsense::adapters::sim::{SimAlarm, SimClock, SimImu, SimPressureMat};
use seatsense::adapters::store::FileStore;
use seatsense::app::events::ChairEvent;
use seatsense::app::ports::EventSink;
use seatsense::app::service::ChairService;
use seatsense::config::SystemConfig;
use seatsense::devices::DeviceOrchestrator;
use seatsense::link::{codec, topics};

const STORE_PATH: &str = "seatsense-settings.bin";
const DEMO_TICKS: u64 = 50;

/// Event sink that pushes every event through the broker codec and logs
/// the resulting publication.
struct BrokerSink;

impl EventSink for BrokerSink {
    fn emit(&mut self, event: &ChairEvent) {
        let (topic, body) = codec::encode(event);
        info!("publish {topic}: {body}");
    }
}

fn main() -> Result<()> {
    ConsoleLogger::init();
    info!("seatsense controller starting");

    let config = SystemConfig::default();
    config.validate().context("invalid system configuration")?;

    let store = FileStore::open(STORE_PATH)
        .with_context(|| format!("opening settings store at {STORE_PATH}"))?;

    let interval = Duration::from_millis(u64::from(config.control_loop_interval_ms));
    let mut devices = DeviceOrchestrator::new(
        config.clone(),
        SimImu::level(),
        SimImu::level(),
        SimPressureMat::with_baseline(100),
        SimClock::starting_at(1_700_000_000),
        SimImu::level(),
        SimAlarm::new(),
        store,
    );
    devices.initialize_devices();
    if !devices.is_pressure_mat_calibrated() {
        devices
            .calibrate_pressure_mat()
            .context("initial pressure mat calibration")?;
    }

    let notifications = devices.load_notifications();
    let mut service = ChairService::new(config, notifications);
    service.start();

    // Inbound bridge: a transport adapter would feed this channel from the
    // broker subscriptions; here the demo script does.
    let (tx, rx) = mpsc::channel::<(String, String)>();
    let mut sink = BrokerSink;

    for tick in 0..DEMO_TICKS {
        for (topic, payload) in rx.try_iter() {
            if let Some(cmd) = codec::decode(&topic, &payload) {
                service.handle_command(cmd, &mut devices);
            }
        }

        script(tick, &tx, &mut devices)?;
        service.tick(&mut devices, &mut sink);
        thread::sleep(interval);
    }

    devices.turn_off();
    info!("seatsense controller stopped");
    Ok(())
}

type SimDevices =
    DeviceOrchestrator<SimImu, SimImu, SimPressureMat, SimClock, SimImu, SimAlarm, FileStore>;

/// Demo timeline: configure the reminder, sit down, recline past the
/// target, hold, come back upright, stand up.
fn script(tick: u64, tx: &mpsc::Sender<(String, String)>, devices: &mut SimDevices) -> Result<()> {
    let send = |topic: &str, payload: &str| {
        tx.send((topic.to_owned(), payload.to_owned()))
            .context("inbox send")
    };

    match tick {
        1 => {
            send(topics::REQUIRED_ANGLE, "25")?;
            send(topics::REQUIRED_PERIOD, "10")?;
            send(topics::REQUIRED_DURATION, "5")?;
        }
        3 => devices.pressure_mut().sit(500),
        25 => devices.mobile_imu_mut().set_pitch(30.0),
        35 => devices.mobile_imu_mut().set_pitch(0.0),
        42 => devices.pressure_mut().stand(),
        _ => {}
    }
    Ok(())
}
