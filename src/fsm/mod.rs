//! Function-pointer duty-cycle state machine.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  StateTable                                               │
//! │  ┌─────────┬───────────┬──────────┬───────────────────┐   │
//! │  │ State   │ on_enter  │ on_exit  │ on_update         │   │
//! │  ├─────────┼───────────┼──────────┼───────────────────┤   │
//! │  │ Off     │ fn(ctx)   │    -     │ fn(ctx)->Option<> │   │
//! │  │ Warmup  │ fn(ctx)   │    -     │ fn(ctx)->Option<> │   │
//! │  │ Measure │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │   │
//! │  └─────────┴───────────┴──────────┴───────────────────┘   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The controller keeps only the current state and the instant it was
//! entered.  Planning a transition is a pure function of
//! `(state, entered_at, now)`; applying one runs `on_exit`, moves the
//! entered-at reference to `now`, runs `on_enter` and applies whatever
//! power command `on_enter` staged.
//!
//! The controller is advisory.  It drives the power line, but whether a
//! sample is used is decided by the sampling loop from [`DutyState`].

pub mod context;
pub mod states;

use context::{DutyContext, DutyTiming, PowerAction};
use log::info;

use crate::app::ports::PowerControl;
use crate::config::ProbeConfig;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DutyState {
    Off = 0,
    Warmup = 1,
    Measure = 2,
}

impl DutyState {
    pub const COUNT: usize = 3;

    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Warmup => "WARMUP",
            Self::Measure => "MEASURE",
        }
    }

    /// Sensor power is on in this state.
    pub fn is_powered(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Samples taken in this state may reach the filter.
    pub fn accepts_samples(self) -> bool {
        matches!(self, Self::Measure)
    }
}

impl core::fmt::Display for DutyState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut DutyContext);

/// Per-tick update handler.  `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut DutyContext) -> Option<DutyState>;

/// One row of the state table.
pub struct StateDescriptor {
    pub id: DutyState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

/// A transition that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: DutyState,
    pub to: DutyState,
    pub at_us: u64,
    pub power: Option<PowerAction>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct DutyCycleController {
    table: [StateDescriptor; DutyState::COUNT],
    timing: DutyTiming,
    current: DutyState,
    entered_at_us: u64,
    /// MEASURE → OFF transitions since start.
    cycles: u32,
}

impl DutyCycleController {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            table: states::build_state_table(),
            timing: DutyTiming::from_config(config),
            current: DutyState::Off,
            entered_at_us: 0,
            cycles: 0,
        }
    }

    /// Enter OFF at `now_us`, deasserting sensor power.  Call once before
    /// the first [`advance`](Self::advance).
    pub fn start(&mut self, now_us: u64, power: &mut impl PowerControl) {
        info!(
            "duty cycle starting in {} (period {}s)",
            self.current,
            self.timing.period_us() / 1_000_000
        );
        self.current = DutyState::Off;
        self.entered_at_us = now_us;
        self.cycles = 0;
        let mut ctx = DutyContext::new(self.timing);
        if let Some(enter) = self.table[DutyState::Off as usize].on_enter {
            enter(&mut ctx);
        }
        apply(ctx.power, power);
    }

    /// Pure transition planning: where the controller would go at `now_us`.
    pub fn plan(&self, now_us: u64) -> Option<DutyState> {
        plan_transition(&self.table, self.timing, self.current, self.entered_at_us, now_us)
    }

    /// Advance to `now_us`, applying at most one transition.
    pub fn advance(&mut self, now_us: u64, power: &mut impl PowerControl) -> Option<Transition> {
        let next = self.plan(now_us)?;
        let from = self.current;
        let mut ctx = DutyContext::new(self.timing);

        info!("duty transition: {} -> {}", from, next);

        if let Some(exit) = self.table[from as usize].on_exit {
            exit(&mut ctx);
        }

        self.current = next;
        self.entered_at_us = now_us;
        if from == DutyState::Measure && next == DutyState::Off {
            self.cycles = self.cycles.wrapping_add(1);
        }

        if let Some(enter) = self.table[next as usize].on_enter {
            enter(&mut ctx);
        }
        apply(ctx.power, power);

        Some(Transition {
            from,
            to: next,
            at_us: now_us,
            power: ctx.power,
        })
    }

    /// Power the sensor down for good.  The state is left as-is.
    pub fn shutdown(&mut self, power: &mut impl PowerControl) {
        info!("duty cycle stopped in {}", self.current);
        power.deassert_power();
    }

    pub fn state(&self) -> DutyState {
        self.current
    }

    pub fn entered_at_us(&self) -> u64 {
        self.entered_at_us
    }

    /// Completed OFF → WARMUP → MEASURE cycles.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}

/// Decide the next state from `(state, entered_at, now)` alone.
pub fn plan_transition(
    table: &[StateDescriptor; DutyState::COUNT],
    timing: DutyTiming,
    state: DutyState,
    entered_at_us: u64,
    now_us: u64,
) -> Option<DutyState> {
    let mut ctx = DutyContext::new(timing);
    ctx.elapsed_us = now_us.saturating_sub(entered_at_us);
    (table[state as usize].on_update)(&mut ctx)
}

fn apply(action: Option<PowerAction>, power: &mut impl PowerControl) {
    match action {
        Some(PowerAction::Assert) => power.assert_power(),
        Some(PowerAction::Deassert) => power.deassert_power(),
        None => {}
    }
}
