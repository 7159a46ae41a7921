//! Console logging adapters.
//!
//! [`LogEventSink`] implements [`EventSink`] by writing structured
//! telemetry events through the `log` facade — the broker bridge in
//! `main.rs` wraps it so every event is both published and visible on the
//! console. [`ConsoleLogger`] is the `log::Log` backend for the binary.

use log::{info, LevelFilter, Metadata, Record};

use crate::app::events::ChairEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ChairEvent`] to the console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ChairEvent) {
        match event {
            ChairEvent::BackRestAngle(p) => info!("ANGLE | {}°", p.angle),
            ChairEvent::PresenceChanged(p) => {
                info!(
                    "SEAT  | {}",
                    if p.is_someone_there { "occupied" } else { "empty" }
                );
            }
            ChairEvent::PressureMatData(p) => {
                info!("COP   | ({:.1}, {:.1}) cm", p.center.x, p.center.y);
            }
            ChairEvent::IsMoving(p) => {
                info!("MOVE  | {}", if p.is_moving { "moving" } else { "stopped" });
            }
            ChairEvent::Speed(p) => info!("SPEED | {:.2} m/s", p.vitesse),
            ChairEvent::Vibration(p) => info!("VIBR  | {:.3} g", p.vibration),
            ChairEvent::TiltInfo(p) => info!("TILT  | code={}", p.info),
            ChairEvent::Heartbeat(p) => info!("ALIVE | t={}", p.datetime),
            ChairEvent::SensorsStatus(p) => {
                info!(
                    "STAT  | alarm={} fixed_imu={} mobile_imu={} mat={}",
                    p.notification_module,
                    p.fixed_accelerometer,
                    p.mobile_accelerometer,
                    p.pressure_mat,
                );
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Console logger backend
// ───────────────────────────────────────────────────────────────

/// Minimal stderr logger for the binary.
pub struct ConsoleLogger {
    level: LevelFilter,
}

static LOGGER: ConsoleLogger = ConsoleLogger {
    level: LevelFilter::Info,
};

impl ConsoleLogger {
    /// Install the logger. Safe to call once at startup; a second call is
    /// a no-op (the first logger wins).
    pub fn init() {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LOGGER.level);
        }
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "[{:<5}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}
