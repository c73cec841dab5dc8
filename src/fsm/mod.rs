//! Function-pointer finite state machine engine.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                    │
//! │  ┌────────────┬───────────┬───────────────────────┬──────────┐ │
//! │  │ StateId    │ on_enter  │ on_update             │ successor│ │
//! │  ├────────────┼───────────┼───────────────────────┼──────────┤ │
//! │  │ Off        │ fn(ctx)   │ fn(ctx)->Option<Tr>   │ Regen.   │ │
//! │  │ Regenerate │ fn(ctx)   │ fn(ctx)->Option<Tr>   │ Cooldown │ │
//! │  │ Cooldown   │ fn(ctx)   │ fn(ctx)->Option<Tr>   │ DryFan   │ │
//! │  │ DryFan     │ fn(ctx)   │ fn(ctx)->Option<Tr>   │ DryWait  │ │
//! │  │ DryWait    │ fn(ctx)   │ fn(ctx)->Option<Tr>   │ Off      │ │
//! │  └────────────┴───────────┴───────────────────────┴──────────┘ │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine either consumes a pending "forward" request
//! (jump to the declared successor) or calls `on_update` for the current
//! state.  Every state change goes through [`Fsm::switch`]: no-op for the
//! current state, otherwise log, notify the observer, then run the new
//! state's `on_enter` before its `on_update` can ever run.

pub mod context;
pub mod history;
pub mod states;

use context::FsmContext;
use log::{debug, info};

use crate::error::Error;

/// Reason attached to transitions caused by the user button.
pub const WHY_FORWARD: &str = "User Button: Forward to next state";

/// Reason attached to transitions forced by the remote command channel.
pub const WHY_REMOTE: &str = "Remote intervention";

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Operating modes of the dryer.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Off = 0,
    Regenerate = 1,
    Cooldown = 2,
    DryFan = 3,
    DryWait = 4,
}

impl StateId {
    /// Total number of states, sizes the table array.
    pub const COUNT: usize = 5;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Off,
        Self::Regenerate,
        Self::Cooldown,
        Self::DryFan,
        Self::DryWait,
    ];

    /// Symbolic name used in logs and remote commands.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Regenerate => "regenerate",
            Self::Cooldown => "cooldown",
            Self::DryFan => "dryfan",
            Self::DryWait => "drywait",
        }
    }

    /// Inverse of [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
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

/// A requested state change with its human-readable justification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub to: StateId,
    pub reason: String,
}

impl Transition {
    pub fn new(to: StateId, reason: impl Into<String>) -> Self {
        Self {
            to,
            reason: reason.into(),
        }
    }
}

/// A state change that happened, as reported to the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub from: StateId,
    pub to: StateId,
    pub reason: String,
}

/// Signature for `on_enter`: initialises actuators and per-state memory.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(transition)` to leave the state, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<Transition>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub on_enter: StateActionFn,
    pub on_update: StateUpdateFn,
    /// Target of a manual "forward" request.
    pub successor: StateId,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: StateId,
    forward_requested: bool,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.id as usize == i),
            "state table out of order"
        );
        Self {
            table,
            current: initial,
            forward_requested: false,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.current);
        ctx.entered_at_ms = ctx.now_ms;
        (self.descriptor(self.current).on_enter)(ctx);
    }

    /// Advance the FSM by one evaluation at `ctx.now_ms`.
    ///
    /// A pending forward request wins over the state's own update and is
    /// cleared by this call.
    pub fn tick(&mut self, ctx: &mut FsmContext, observer: &mut impl FnMut(&StateChange)) {
        let transition = if core::mem::take(&mut self.forward_requested) {
            Some(Transition::new(
                self.descriptor(self.current).successor,
                WHY_FORWARD,
            ))
        } else {
            (self.descriptor(self.current).on_update)(ctx)
        };

        if let Some(t) = transition {
            self.switch(t.to, &t.reason, ctx, observer);
        }
    }

    /// The single path for every state change.  Returns `false` (and does
    /// nothing at all) when `next` is already the current state.
    pub fn switch(
        &mut self,
        next: StateId,
        reason: &str,
        ctx: &mut FsmContext,
        observer: &mut impl FnMut(&StateChange),
    ) -> bool {
        if next == self.current {
            return false;
        }
        let from = self.current;
        info!("FSM transition: '{}' -> '{}' {}", from, next, reason);
        observer(&StateChange {
            from,
            to: next,
            reason: reason.to_string(),
        });

        self.current = next;
        ctx.entered_at_ms = ctx.now_ms;
        (self.descriptor(next).on_enter)(ctx);
        true
    }

    /// Forced transition by symbolic name (remote command channel).
    pub fn switch_by_name(
        &mut self,
        name: &str,
        ctx: &mut FsmContext,
        observer: &mut impl FnMut(&StateChange),
    ) -> Result<bool, Error> {
        let Some(next) = StateId::from_name(name) else {
            debug!("FSM: unknown state '{}'", name);
            return Err(Error::UnknownState);
        };
        Ok(self.switch(next, WHY_REMOTE, ctx, observer))
    }

    /// Ask for one jump to the current state's successor at the next tick.
    pub fn request_forward(&mut self) {
        self.forward_requested = true;
    }

    pub fn forward_pending(&self) -> bool {
        self.forward_requested
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        self.current
    }

    fn descriptor(&self, id: StateId) -> &StateDescriptor {
        &self.table[id as usize]
    }
}
