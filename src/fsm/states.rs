//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers — no closures, no
//! dynamic dispatch, no heap.  This is the classic embedded C FSM pattern
//! expressed in safe Rust.
//!
//! ```text
//!  WAIT_SITTING ──[seated for the settling time]──▶ WAIT_PERIOD ◀──┐
//!                                                       │          │
//!                                            [period elapsed]  [returned
//!                                                       ▼       upright]
//!                  ┌──[angle lost]── WAIT_ANGLE_REACHED │          │
//!                  │                       ▲  │ [angle reached]    │
//!                  └───────────────────────┘  ▼                    │
//!                                        HOLD_ANGLE                │
//!                                             │ [held for duration]│
//!                                             ▼                    │
//!                                        WAIT_RETURN ──────────────┘
//!
//!  (The service forces any state back to WAIT_SITTING when the seat
//!   empties or the reminder settings drop to zero.)
//! ```

use super::context::{AlarmRequest, TiltContext, TiltNotice};
use super::{StateDescriptor, TiltState};
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; TiltState::COUNT] {
    [
        // Index 0 — WaitSitting
        StateDescriptor {
            id: TiltState::WaitSitting,
            name: "WaitSitting",
            on_enter: Some(wait_sitting_enter),
            on_exit: None,
            on_update: wait_sitting_update,
        },
        // Index 1 — WaitPeriod
        StateDescriptor {
            id: TiltState::WaitPeriod,
            name: "WaitPeriod",
            on_enter: None,
            on_exit: None,
            on_update: wait_period_update,
        },
        // Index 2 — WaitAngleReached
        StateDescriptor {
            id: TiltState::WaitAngleReached,
            name: "WaitAngleReached",
            on_enter: Some(wait_angle_reached_enter),
            on_exit: None,
            on_update: wait_angle_reached_update,
        },
        // Index 3 — HoldAngle
        StateDescriptor {
            id: TiltState::HoldAngle,
            name: "HoldAngle",
            on_enter: Some(hold_angle_enter),
            on_exit: None,
            on_update: hold_angle_update,
        },
        // Index 4 — WaitReturn
        StateDescriptor {
            id: TiltState::WaitReturn,
            name: "WaitReturn",
            on_enter: Some(wait_return_enter),
            on_exit: None,
            on_update: wait_return_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAIT_SITTING — waiting for someone to settle into the seat
// ═══════════════════════════════════════════════════════════════════════════

fn wait_sitting_enter(ctx: &mut TiltContext) {
    // Fresh cycle: no pattern may outlive the workflow reset.
    ctx.alarm_request = Some(AlarmRequest::Cancel);
    ctx.seated_ticks = 0;
    info!("WAIT_SITTING: waiting for presence");
}

fn wait_sitting_update(ctx: &mut TiltContext) -> Option<TiltState> {
    // The settling time must be uninterrupted; any absence restarts it.
    if !ctx.posture.present {
        ctx.seated_ticks = 0;
        return None;
    }
    ctx.seated_ticks += 1;

    if ctx.seated_secs() >= f32::from(ctx.config.required_sitting_secs) {
        info!(
            "WAIT_SITTING: seated for {:.0}s, arming the reminder",
            ctx.seated_secs()
        );
        return Some(TiltState::WaitPeriod);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAIT_PERIOD — counting down the sitting period before the next reminder
// ═══════════════════════════════════════════════════════════════════════════

fn wait_period_update(ctx: &mut TiltContext) -> Option<TiltState> {
    if ctx.secs_in_state() >= f32::from(ctx.settings.required_period) {
        info!(
            "WAIT_PERIOD: {}s of sitting elapsed, reminder due",
            ctx.settings.required_period
        );
        return Some(TiltState::WaitAngleReached);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAIT_ANGLE_REACHED — reminder raised, waiting for the backrest to tilt
// ═══════════════════════════════════════════════════════════════════════════

fn wait_angle_reached_enter(ctx: &mut TiltContext) {
    ctx.alarm_request = Some(AlarmRequest::Red);
    ctx.notice = Some(TiltNotice::ReminderDue);
    info!(
        "WAIT_ANGLE_REACHED: target {}° (tolerance {}°)",
        ctx.settings.required_back_rest_angle, ctx.config.angle_tolerance_deg
    );
}

fn wait_angle_reached_update(ctx: &mut TiltContext) -> Option<TiltState> {
    if ctx.angle_reached() {
        info!(
            "WAIT_ANGLE_REACHED: backrest at {:.1}°, target reached",
            ctx.posture.back_seat_angle
        );
        return Some(TiltState::HoldAngle);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HOLD_ANGLE — target reached, must be held for the duration
// ═══════════════════════════════════════════════════════════════════════════

fn hold_angle_enter(ctx: &mut TiltContext) {
    ctx.alarm_request = Some(AlarmRequest::Green);
    ctx.notice = Some(TiltNotice::AngleReached);
    info!(
        "HOLD_ANGLE: holding {}° for {}s",
        ctx.settings.required_back_rest_angle, ctx.settings.required_duration
    );
}

fn hold_angle_update(ctx: &mut TiltContext) -> Option<TiltState> {
    // Slipping below the target restarts the wait (and re-raises red).
    if !ctx.angle_reached() {
        info!(
            "HOLD_ANGLE: backrest slipped to {:.1}°, restarting",
            ctx.posture.back_seat_angle
        );
        return Some(TiltState::WaitAngleReached);
    }

    if ctx.secs_in_state() >= f32::from(ctx.settings.required_duration) {
        info!("HOLD_ANGLE: held for {}s, done", ctx.settings.required_duration);
        return Some(TiltState::WaitReturn);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  WAIT_RETURN — hold complete, waiting for the backrest to come upright
// ═══════════════════════════════════════════════════════════════════════════

fn wait_return_enter(ctx: &mut TiltContext) {
    ctx.alarm_request = Some(AlarmRequest::Blink);
    ctx.notice = Some(TiltNotice::HoldComplete);
    info!("WAIT_RETURN: waiting for return below {}°", ctx.config.return_angle_deg);
}

fn wait_return_update(ctx: &mut TiltContext) -> Option<TiltState> {
    if ctx.angle_returned() {
        info!(
            "WAIT_RETURN: backrest back at {:.1}°, cycle complete",
            ctx.posture.back_seat_angle
        );
        ctx.notice = Some(TiltNotice::Returned);
        return Some(TiltState::WaitPeriod);
    }

    None
}
