//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  State table                                             │
//! │  ┌───────────┬───────────┬────────────────────┬─────────┐ │
//! │  │ StateId   │ on_enter  │ on_update          │ on_leave│ │
//! │  ├───────────┼───────────┼────────────────────┼─────────┤ │
//! │  │ Standby   │ fn(ctx)   │ fn(ctx)->Option<>  │ -       │ │
//! │  │ Calibrate │ fn(ctx)   │ fn(ctx)->Option<>  │ fn(ctx) │ │
//! │  │ Reflow    │ fn(ctx)   │ fn(ctx)->Option<>  │ fn(ctx) │ │
//! │  └───────────┴───────────┴────────────────────┴─────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every row is a [`StateNode`] with an `active` flag.  Activating an
//! inactive node runs `on_enter` once; deactivating an active node runs
//! `on_leave` once; repeated requests for the same flag value are no-ops,
//! so side-effecting callbacks never run twice.  `on_update` only runs
//! while the node is active.
//!
//! A switch leaves the current node, enters the target and then runs the
//! target's `on_update` once, so a freshly entered state acts in the same
//! tick instead of idling until the next one.

pub mod context;
pub mod states;

use context::ControlContext;
use log::{error, info};

use crate::error::ControllerError;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Process states of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Standby = 0,
    Calibrate = 1,
    Reflow = 2,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 3;

    pub const ALL: [Self; Self::COUNT] = [Self::Standby, Self::Calibrate, Self::Reflow];

    /// Name used by [`Fsm::switch_to`] and in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standby => "standby",
            Self::Calibrate => "calibrate",
            Self::Reflow => "reflow",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// States that step through a profile each tick.
    pub const fn runs_profile(self) -> bool {
        matches!(self, Self::Calibrate | Self::Reflow)
    }
}

impl core::fmt::Display for StateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_leave` actions.
pub type StateActionFn = fn(&mut ControlContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to request a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut ControlContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State node
// ---------------------------------------------------------------------------

/// One state: three optional callbacks and an `active` flag guarding them.
pub struct StateNode {
    pub id: StateId,
    pub on_enter: Option<StateActionFn>,
    pub on_update: Option<StateUpdateFn>,
    pub on_leave: Option<StateActionFn>,
    active: bool,
}

impl StateNode {
    pub fn new(
        id: StateId,
        on_enter: Option<StateActionFn>,
        on_update: Option<StateUpdateFn>,
        on_leave: Option<StateActionFn>,
    ) -> Self {
        Self {
            id,
            on_enter,
            on_update,
            on_leave,
            active: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Set the active flag, running `on_enter` / `on_leave` only on an
    /// actual change.
    pub fn set_active(&mut self, active: bool, ctx: &mut ControlContext) {
        if active == self.active {
            return;
        }
        self.active = active;
        let action = if active { self.on_enter } else { self.on_leave };
        if let Some(action) = action {
            action(ctx);
        }
    }

    /// Run `on_update` if active; inactive nodes never request transitions.
    pub fn update(&mut self, ctx: &mut ControlContext) -> Option<StateId> {
        if !self.active {
            return None;
        }
        self.on_update.and_then(|update| update(ctx))
    }
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the node table (indexed by `StateId as usize`) and threads a
/// mutable [`ControlContext`] through every handler call.
pub struct Fsm {
    table: [StateNode; StateId::COUNT],
    current: Option<StateId>,
    /// Monotonically increasing tick counter.
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl Fsm {
    /// Construct an FSM with no active state.  Call [`start`](Self::start)
    /// before the first [`tick`](Self::tick).
    pub fn new(table: [StateNode; StateId::COUNT]) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, n)| n.id as usize == i),
            "state table out of order"
        );
        Self {
            table,
            current: None,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Enter `initial`.
    pub fn start(&mut self, initial: StateId, ctx: &mut ControlContext) {
        info!("FSM starting in state: {initial}");
        self.transition(initial, ctx);
    }

    /// Advance the FSM by one tick: run the current state's update and
    /// follow any transition it requests.
    pub fn tick(&mut self, ctx: &mut ControlContext) {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let Some(current) = self.current else {
            return;
        };
        if let Some(next) = self.table[current as usize].update(ctx) {
            self.transition(next, ctx);
        }
    }

    /// Switch to the state called `name`.
    pub fn switch_to(&mut self, name: &str, ctx: &mut ControlContext) -> Result<(), ControllerError> {
        let Some(target) = StateId::from_name(name) else {
            error!("FSM: switch to unknown state '{name}'");
            return Err(ControllerError::UnknownState(name.to_owned()));
        };
        self.transition(target, ctx);
        Ok(())
    }

    /// Switch to `target` by identity.
    pub fn force_transition(&mut self, target: StateId, ctx: &mut ControlContext) {
        self.transition(target, ctx);
    }

    /// The active state.  `Standby` before [`start`](Self::start).
    pub fn current_state(&self) -> StateId {
        self.current.unwrap_or(StateId::Standby)
    }

    pub fn current_name(&self) -> &'static str {
        self.current_state().name()
    }

    pub fn is_started(&self) -> bool {
        self.current.is_some()
    }

    /// How many ticks the FSM has been in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Leave the current node, enter `target`, run its update once, and
    /// follow on-entry transitions.  Each state is entered at most once
    /// per call, which bounds the chain.
    fn transition(&mut self, target: StateId, ctx: &mut ControlContext) {
        let mut next = Some(target);
        let mut entered = [false; StateId::COUNT];

        while let Some(target) = next.take() {
            if entered[target as usize] {
                error!("FSM: transition loop detected at '{target}', staying put");
                break;
            }
            entered[target as usize] = true;

            match self.current {
                Some(current) => info!("FSM transition: {current} -> {target}"),
                None => info!("FSM transition: <none> -> {target}"),
            }
            if let Some(current) = self.current {
                self.table[current as usize].set_active(false, ctx);
            }

            self.current = Some(target);
            self.state_entry_tick = self.tick_count;
            ctx.ticks_in_state = 0;

            let node = &mut self.table[target as usize];
            node.set_active(true, ctx);
            next = node.update(ctx);
        }
    }
}
