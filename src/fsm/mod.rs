//! Function-pointer finite state machine engine for the tilt workflow.
//!
//! Classic embedded FSM pattern expressed in Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StateTable                                                  │
//! │  ┌──────────────────┬──────────┬─────────┬─────────────────┐ │
//! │  │ TiltState        │ on_enter │ on_exit │ on_update       │ │
//! │  ├──────────────────┼──────────┼─────────┼─────────────────┤ │
//! │  │ WaitSitting      │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt<>  │ │
//! │  │ WaitPeriod       │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt<>  │ │
//! │  │ WaitAngleReached │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt<>  │ │
//! │  │ HoldAngle        │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt<>  │ │
//! │  │ WaitReturn       │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Opt<>  │ │
//! │  └──────────────────┴──────────┴─────────┴─────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state. If it
//! returns `Some(next)`, the engine runs `on_exit` for the current state,
//! then `on_enter` for the next, and updates the current pointer. All
//! handlers receive `&mut TiltContext`, the blackboard holding the posture
//! snapshot, reminder settings, timing, and handler outputs.
//!
//! The presence and settings guards do not live here: the service forces
//! the machine back to `WaitSitting` whenever the seat empties or the
//! reminder is deconfigured, so every handler may assume both hold.

pub mod context;
pub mod states;

use context::TiltContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of the tilt workflow states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TiltState {
    /// Waiting for someone to settle into the seat.
    WaitSitting = 0,
    /// Seated; counting down the sitting period before the next reminder.
    WaitPeriod = 1,
    /// Reminder raised; waiting for the backrest to reach the target angle.
    WaitAngleReached = 2,
    /// Target angle reached; it must now be held for the duration.
    HoldAngle = 3,
    /// Hold complete; waiting for the backrest to come back upright.
    WaitReturn = 4,
}

impl TiltState {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 5;

    /// Convert a `usize` index back to `TiltState`. Panics on out-of-range
    /// in debug builds; returns `WaitSitting` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::WaitSitting,
            1 => Self::WaitPeriod,
            2 => Self::WaitAngleReached,
            3 => Self::HoldAngle,
            4 => Self::WaitReturn,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::WaitSitting
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut TiltContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut TiltContext) -> Option<TiltState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single workflow state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: TiltState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]) and threads a
/// mutable [`TiltContext`] through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `TiltState as usize`.
    table: [StateDescriptor; TiltState::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Monotonically increasing tick counter (wraps at u64::MAX).
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; TiltState::COUNT], initial: TiltState) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut TiltContext) {
        info!("workflow starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut TiltContext) {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition (used by the service guards to park
    /// the workflow in `WaitSitting` regardless of what `on_update`
    /// returned).
    pub fn force_transition(&mut self, next: TiltState, ctx: &mut TiltContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> TiltState {
        TiltState::from_index(self.current)
    }

    /// How many ticks the FSM has been in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: TiltState, ctx: &mut TiltContext) {
        let next_idx = next_id as usize;

        info!(
            "workflow transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
