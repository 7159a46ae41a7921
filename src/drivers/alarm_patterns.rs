//! Alarm pattern engine for the notification module.
//!
//! Generates time-varying LED/motor line states. The service calls
//! `tick()` each control cycle and hands the output to the orchestrator,
//! which drives the real lines. Patterns are cooperative: starting one
//! cancels whatever was running, and `cancel()` stops everything — no
//! pattern ever runs detached from the control loop.
//!
//! ## Pattern types
//!
//! | Pattern | Behaviour                             | Ends             |
//! |---------|---------------------------------------|------------------|
//! | Red     | Red LED steady, motor pulsed at 0.5 Hz| after a timeout  |
//! | Green   | Green LED steady                      | when replaced    |
//! | Blink   | Red/green alternating at 0.5 Hz       | after a timeout  |
//!
//! The per-user notification settings gate the output lines: LEDs only
//! drive when LED notifications are enabled, the motor only when
//! vibration is enabled. The pattern clock keeps running either way so a
//! settings change mid-pattern takes effect on the next tick.

use crate::config::{NotificationsSettings, SystemConfig};

/// Half-period of the pulsed/alternating patterns. Chosen so a 1 Hz
/// control loop still produces visible alternation.
const PULSE_HALF_MS: u32 = 1000;

/// Pattern identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmPattern {
    /// Reminder due: red LED with pulsed motor.
    Red,
    /// Target angle reached: steady green.
    Green,
    /// Hold complete: alternating LEDs.
    Blink,
}

/// Desired state of the notification module's output lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmOutput {
    pub red_led: bool,
    pub green_led: bool,
    pub motor: bool,
}

impl AlarmOutput {
    pub const OFF: AlarmOutput = AlarmOutput {
        red_led: false,
        green_led: false,
        motor: false,
    };
}

/// Tick-driven pattern engine. Stack-allocated, no heap, no threads.
pub struct AlarmPatternEngine {
    active: Option<AlarmPattern>,
    phase_ms: u32,
    elapsed_ms: u32,
    red_timeout_ms: u32,
    blink_timeout_ms: u32,
    settings: NotificationsSettings,
}

impl AlarmPatternEngine {
    pub fn new(config: &SystemConfig, settings: NotificationsSettings) -> Self {
        Self {
            active: None,
            phase_ms: 0,
            elapsed_ms: 0,
            red_timeout_ms: u32::from(config.red_alarm_secs) * 1000,
            blink_timeout_ms: u32::from(config.blink_alarm_secs) * 1000,
            settings,
        }
    }

    /// Replace the notification settings (arrives over the broker).
    pub fn set_settings(&mut self, settings: NotificationsSettings) {
        self.settings = settings;
    }

    /// Start a pattern. An in-flight pattern is cancelled first; the phase
    /// clock restarts from zero.
    pub fn start(&mut self, pattern: AlarmPattern) {
        self.active = Some(pattern);
        self.phase_ms = 0;
        self.elapsed_ms = 0;
    }

    /// Stop whatever is running. The next `tick()` returns all-off.
    pub fn cancel(&mut self) {
        self.active = None;
        self.phase_ms = 0;
        self.elapsed_ms = 0;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_pattern(&self) -> Option<AlarmPattern> {
        self.active
    }

    /// Advance the pattern clock by `delta_ms` and return the line states
    /// for this cycle.
    pub fn tick(&mut self, delta_ms: u32) -> AlarmOutput {
        let Some(pattern) = self.active else {
            return AlarmOutput::OFF;
        };

        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        self.phase_ms = self.phase_ms.wrapping_add(delta_ms);

        // Self-terminating patterns time out even if the workflow stalls.
        let timeout = match pattern {
            AlarmPattern::Red => Some(self.red_timeout_ms),
            AlarmPattern::Blink => Some(self.blink_timeout_ms),
            AlarmPattern::Green => None,
        };
        if let Some(timeout) = timeout {
            if self.elapsed_ms >= timeout {
                self.cancel();
                return AlarmOutput::OFF;
            }
        }

        let leds = self.settings.is_led_blinking_enabled;
        let motor = self.settings.is_vibration_enabled;
        let first_half = self.phase_ms % (2 * PULSE_HALF_MS) < PULSE_HALF_MS;

        match pattern {
            AlarmPattern::Red => AlarmOutput {
                red_led: leds,
                green_led: false,
                motor: motor && first_half,
            },
            AlarmPattern::Green => AlarmOutput {
                red_led: false,
                green_led: leds,
                motor: false,
            },
            AlarmPattern::Blink => AlarmOutput {
                red_led: leds && first_half,
                green_led: leds && !first_half,
                motor: false,
            },
        }
    }
}
