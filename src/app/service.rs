//! Chair service — the hexagonal core.
//!
//! [`ChairService`] owns the tilt workflow FSM, its context, and the alarm
//! pattern engine. Hardware access goes through the device orchestrator
//! and telemetry through the [`EventSink`] port, so the whole service runs
//! against simulated ports in tests.
//!
//! ```text
//!  DeviceOrchestrator ──▶ ┌───────────────────────────┐ ──▶ EventSink
//!                         │        ChairService       │
//!  ChairCommand ─────────▶│  FSM · guards · patterns  │
//!                         └───────────────────────────┘
//! ```
//!
//! Per tick, in order: fused snapshot → device supervision → global
//! guards → workflow tick → pattern engine tick → alarm lines →
//! telemetry. The guards run before the FSM so no handler ever sees an
//! empty seat or a deconfigured reminder.

use log::{info, warn};

use crate::config::{NotificationsSettings, SystemConfig};
use crate::devices::ports::{AlarmPort, ClockPort, ImuPort, MotionPort, PressurePort};
use crate::devices::{DeviceId, DeviceOrchestrator};
use crate::drivers::alarm_patterns::{AlarmPattern, AlarmPatternEngine};
use crate::fsm::context::{AlarmRequest, PostureSnapshot, TiltContext, TiltSettings};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, TiltState};

use super::commands::ChairCommand;
use super::events::{
    BackRestAnglePayload, ChairEvent, HeartbeatPayload, IsMovingPayload, PresencePayload,
    PressureMatPayload, SensorsStatusPayload, SpeedPayload, TiltInfoPayload, VibrationPayload,
};
use super::ports::{EventSink, SettingsStore};

const GRAVITY_M_S2: f32 = 9.81;

/// The application service orchestrates all domain logic.
pub struct ChairService {
    fsm: Fsm,
    ctx: TiltContext,
    patterns: AlarmPatternEngine,
    /// One control tick, in both units the loop needs.
    tick_ms: u32,
    tick_secs: f32,
    tick_count: u64,

    /// Manual alarm override received since the last tick.
    pending_override: Option<bool>,

    // Emission timers and edge detectors.
    cop_elapsed_secs: f32,
    heartbeat_elapsed_secs: f32,
    prev_present: bool,
    prev_angle: i32,
    prev_moving: bool,
    /// Leaky speed estimate integrated from excess acceleration.
    speed_m_s: f32,
}

impl ChairService {
    /// Construct the service. Does **not** start the workflow — call
    /// [`start`](Self::start) next.
    pub fn new(config: SystemConfig, notifications: NotificationsSettings) -> Self {
        let tick_ms = config.control_loop_interval_ms;
        let tick_secs = tick_ms as f32 / 1000.0;
        let patterns = AlarmPatternEngine::new(&config, notifications);
        let ctx = TiltContext::new(config);
        let fsm = Fsm::new(build_state_table(), TiltState::WaitSitting);

        Self {
            fsm,
            ctx,
            patterns,
            tick_ms,
            tick_secs,
            tick_count: 0,
            pending_override: None,
            cop_elapsed_secs: 0.0,
            heartbeat_elapsed_secs: 0.0,
            prev_present: false,
            prev_angle: 0,
            prev_moving: false,
            speed_m_s: 0.0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the initial state's `on_enter`. Call once before the first tick.
    pub fn start(&mut self) {
        self.fsm.start(&mut self.ctx);
        info!("chair service started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    pub fn tick<FI, MI, P, C, M, A, S>(
        &mut self,
        devices: &mut DeviceOrchestrator<FI, MI, P, C, M, A, S>,
        sink: &mut impl EventSink,
    ) where
        FI: ImuPort,
        MI: ImuPort,
        P: PressurePort,
        C: ClockPort,
        M: MotionPort,
        A: AlarmPort,
        S: SettingsStore,
    {
        self.tick_count += 1;

        // 1. One fused snapshot per cycle; the workflow never sees a
        //    partially-updated reading.
        let snapshot = devices.update();
        self.ctx.posture = PostureSnapshot {
            present: snapshot.present,
            back_seat_angle: snapshot.back_seat_angle,
            angle_valid: snapshot.angle_valid,
        };

        // 2. Device supervision: reconnect drop-outs, report transitions.
        let mut status_changed = false;
        for device in DeviceId::ALL {
            if devices.is_state_changed(device) {
                status_changed = true;
            }
            devices.reconnect(device);
        }
        if status_changed {
            sink.emit(&ChairEvent::SensorsStatus(SensorsStatusPayload::new(
                snapshot.timestamp,
                devices.sensors_status(),
            )));
        }

        // 3. Guards, then the workflow.
        if let Some(on) = self.pending_override.take() {
            // Manual override acts on the alarm directly and pre-empts the
            // workflow (and any request it left behind) for this cycle.
            self.ctx.alarm_request = None;
            if on {
                self.patterns.start(AlarmPattern::Red);
            } else {
                self.patterns.cancel();
            }
            info!("alarm override: {}", if on { "on" } else { "off" });
        } else if !snapshot.present || !self.ctx.settings.is_active() {
            // Even one absent tick restarts the settling count, and the
            // alarm never runs over an empty or deconfigured seat. Both
            // must happen here: the forced transition is a no-op when the
            // workflow is already parked in WaitSitting.
            self.ctx.seated_ticks = 0;
            self.fsm
                .force_transition(TiltState::WaitSitting, &mut self.ctx);
            self.patterns.cancel();
        } else {
            self.fsm.tick(&mut self.ctx);
        }

        // 4. Apply the workflow's pattern request, then advance the engine.
        if let Some(request) = self.ctx.alarm_request.take() {
            match request {
                AlarmRequest::Red => self.patterns.start(AlarmPattern::Red),
                AlarmRequest::Green => self.patterns.start(AlarmPattern::Green),
                AlarmRequest::Blink => self.patterns.start(AlarmPattern::Blink),
                AlarmRequest::Cancel => self.patterns.cancel(),
            }
        }
        let output = self.patterns.tick(self.tick_ms);
        devices.apply_alarm(output);

        // 5. Telemetry.
        self.emit_telemetry(&snapshot, sink);
    }

    fn emit_telemetry(
        &mut self,
        snapshot: &crate::devices::FusedSnapshot,
        sink: &mut impl EventSink,
    ) {
        let datetime = snapshot.timestamp;

        if let Some(notice) = self.ctx.notice.take() {
            sink.emit(&ChairEvent::TiltInfo(TiltInfoPayload {
                datetime,
                info: notice.code(),
            }));
        }

        // Angle changes only matter (and only get reported) while someone
        // is seated; whole degrees, like the upstream contract.
        let angle = snapshot.back_seat_angle.round() as i32;
        if snapshot.present && snapshot.angle_valid && angle != self.prev_angle {
            sink.emit(&ChairEvent::BackRestAngle(BackRestAnglePayload {
                datetime,
                angle,
            }));
        }
        self.prev_angle = angle;

        if snapshot.present != self.prev_present {
            sink.emit(&ChairEvent::PresenceChanged(PresencePayload {
                datetime,
                is_someone_there: snapshot.present,
            }));
        }
        self.prev_present = snapshot.present;

        if snapshot.is_moving != self.prev_moving {
            sink.emit(&ChairEvent::IsMoving(IsMovingPayload {
                datetime,
                is_moving: snapshot.is_moving,
            }));
        }
        self.prev_moving = snapshot.is_moving;

        if snapshot.is_moving {
            let excess_g = (snapshot.accel_magnitude_g - 1.0).max(0.0);
            self.speed_m_s += excess_g * GRAVITY_M_S2 * self.tick_secs;
            sink.emit(&ChairEvent::Vibration(VibrationPayload {
                datetime,
                vibration: snapshot.accel_magnitude_g,
            }));
            sink.emit(&ChairEvent::Speed(SpeedPayload {
                datetime,
                vitesse: self.speed_m_s,
            }));
        } else {
            self.speed_m_s = 0.0;
        }

        // The COP cadence only runs while someone is seated; an empty seat
        // resets it so sitting down never triggers an instant emission.
        if snapshot.present {
            self.cop_elapsed_secs += self.tick_secs;
            if self.cop_elapsed_secs >= self.ctx.config.cop_emission_period_secs as f32 {
                self.cop_elapsed_secs = 0.0;
                sink.emit(&ChairEvent::PressureMatData(PressureMatPayload {
                    datetime,
                    center: snapshot.centre_of_pressure,
                    quadrants: snapshot.quadrant_cops,
                }));
            }
        } else {
            self.cop_elapsed_secs = 0.0;
        }

        self.heartbeat_elapsed_secs += self.tick_secs;
        if self.heartbeat_elapsed_secs >= self.ctx.config.heartbeat_period_secs as f32 {
            self.heartbeat_elapsed_secs = 0.0;
            sink.emit(&ChairEvent::Heartbeat(HeartbeatPayload { datetime }));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (decoded from the broker bridge).
    pub fn handle_command<FI, MI, P, C, M, A, S>(
        &mut self,
        cmd: ChairCommand,
        devices: &mut DeviceOrchestrator<FI, MI, P, C, M, A, S>,
    ) where
        FI: ImuPort,
        MI: ImuPort,
        P: PressurePort,
        C: ClockPort,
        M: MotionPort,
        A: AlarmPort,
        S: SettingsStore,
    {
        match cmd {
            ChairCommand::SetAlarm(on) => {
                self.pending_override = Some(on);
            }
            ChairCommand::SetRequiredAngle(deg) => {
                info!("reminder target angle set to {deg}°");
                self.ctx.settings.required_back_rest_angle = deg;
                self.reset_workflow();
            }
            ChairCommand::SetRequiredPeriod(secs) => {
                info!("reminder period set to {secs}s");
                self.ctx.settings.required_period = secs;
                self.reset_workflow();
            }
            ChairCommand::SetRequiredDuration(secs) => {
                info!("reminder hold duration set to {secs}s");
                self.ctx.settings.required_duration = secs;
                self.reset_workflow();
            }
            ChairCommand::CalibratePressureMat => {
                if let Err(e) = devices.calibrate_pressure_mat() {
                    warn!("pressure mat calibration failed: {e}");
                }
            }
            ChairCommand::CalibrateImus => {
                if let Err(e) = devices.calibrate_imus() {
                    warn!("IMU calibration failed: {e}");
                }
            }
            ChairCommand::UpdateNotificationsSettings(settings) => {
                self.patterns.set_settings(settings);
                devices.save_notifications(&settings);
            }
            ChairCommand::SelectWifi(ssid) => {
                // Provisioning belongs to the gateway layer; the core only
                // acknowledges the request.
                info!("wifi selection forwarded: {ssid}");
            }
        }
    }

    /// Any settings change restarts the workflow from the top, including
    /// the settling count, and cancels whatever pattern was running (the
    /// forced transition alone would skip both when the workflow is
    /// already in `WaitSitting`).
    fn reset_workflow(&mut self) {
        self.ctx.seated_ticks = 0;
        self.fsm
            .force_transition(TiltState::WaitSitting, &mut self.ctx);
        self.patterns.cancel();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn workflow_state(&self) -> TiltState {
        self.fsm.current_state()
    }

    pub fn settings(&self) -> TiltSettings {
        self.ctx.settings
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
