//! Shared mutable context threaded through every workflow handler.
//!
//! `TiltContext` is the single struct that state handlers read from and
//! write to. It carries the per-tick posture snapshot, the user's reminder
//! settings, timing, configuration, and the handlers' outputs (alarm
//! requests and workflow notices). Think of it as the "blackboard" in a
//! blackboard architecture.

use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Posture snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// The slice of the fused snapshot the workflow cares about.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostureSnapshot {
    /// Someone is seated on the mat.
    pub present: bool,
    /// Backrest angle relative to the base frame (degrees).
    pub back_seat_angle: f32,
    /// The angle came from two calibrated IMUs this tick.
    pub angle_valid: bool,
}

// ---------------------------------------------------------------------------
// Reminder settings (arrive over the broker, per-field)
// ---------------------------------------------------------------------------

/// The user's tilt-reminder parameters.
///
/// Each field arrives on its own broker topic; a zero in any field means
/// the reminder is not (yet) configured and the workflow must stay parked
/// in `WaitSitting`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TiltSettings {
    /// Target backrest angle (degrees).
    pub required_back_rest_angle: u16,
    /// Seconds of sitting between reminders.
    pub required_period: u16,
    /// Seconds the target angle must be held.
    pub required_duration: u16,
}

impl TiltSettings {
    /// The reminder only runs once every parameter is configured.
    pub fn is_active(&self) -> bool {
        self.required_back_rest_angle > 0 && self.required_period > 0 && self.required_duration > 0
    }
}

// ---------------------------------------------------------------------------
// Handler outputs (consumed by the service after each tick)
// ---------------------------------------------------------------------------

/// Alarm pattern requests raised by state handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmRequest {
    /// Reminder due: red LED with pulsed motor.
    Red,
    /// Target angle reached: steady green.
    Green,
    /// Hold complete: alternating blink.
    Blink,
    /// Cancel whatever pattern is running.
    Cancel,
}

/// Workflow progress notices, forwarded to the tilt-info telemetry topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiltNotice {
    ReminderDue,
    AngleReached,
    HoldComplete,
    Returned,
}

impl TiltNotice {
    /// Wire code on the tilt-info topic.
    pub fn code(self) -> u8 {
        match self {
            Self::ReminderDue => 1,
            Self::AngleReached => 2,
            Self::HoldComplete => 3,
            Self::Returned => 4,
        }
    }
}

// ---------------------------------------------------------------------------
// TiltContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct TiltContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,
    /// Duration of one tick in seconds (inverse of control loop frequency).
    pub tick_period_secs: f32,

    // -- Inputs --
    /// Latest posture readings. Updated before each workflow tick.
    pub posture: PostureSnapshot,
    /// The user's reminder parameters.
    pub settings: TiltSettings,
    /// Consecutive ticks of presence, maintained by the `WaitSitting`
    /// handler (resets on every absence).
    pub seated_ticks: u64,

    // -- Outputs --
    /// Pattern request raised this tick, if any. The service consumes and
    /// clears it after each tick.
    pub alarm_request: Option<AlarmRequest>,
    /// Progress notice raised this tick, if any.
    pub notice: Option<TiltNotice>,

    // -- Configuration --
    pub config: SystemConfig,
}

impl TiltContext {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            tick_period_secs: config.control_loop_interval_ms as f32 / 1000.0,
            posture: PostureSnapshot::default(),
            settings: TiltSettings::default(),
            seated_ticks: 0,
            alarm_request: None,
            notice: None,
            config,
        }
    }

    /// Seconds elapsed since the current state was entered.
    pub fn secs_in_state(&self) -> f32 {
        self.ticks_in_state as f32 * self.tick_period_secs
    }

    /// Seconds of uninterrupted presence accumulated in `WaitSitting`.
    pub fn seated_secs(&self) -> f32 {
        self.seated_ticks as f32 * self.tick_period_secs
    }

    /// The backrest counts as at its target once the angle clears the
    /// required value minus the configured tolerance.
    pub fn angle_reached(&self) -> bool {
        self.posture.angle_valid
            && self.posture.back_seat_angle
                >= f32::from(self.settings.required_back_rest_angle) - self.config.angle_tolerance_deg
    }

    /// The backrest has come back upright.
    pub fn angle_returned(&self) -> bool {
        self.posture.angle_valid && self.posture.back_seat_angle < self.config.return_angle_deg
    }
}
