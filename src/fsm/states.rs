//! Concrete state handler functions and table builder.
//!
//! Each state is three plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!   OFF ──[off elapsed]──▶ WARMUP ──[warm-up elapsed]──▶ MEASURE
//!    ▲   (power off)              (power on)                │
//!    └──────────────────[measure window elapsed]────────────┘
//! ```

use super::context::{DutyContext, PowerAction};
use super::{DutyState, StateDescriptor};
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; DutyState::COUNT] {
    [
        // Index 0: Off
        StateDescriptor {
            id: DutyState::Off,
            name: "OFF",
            on_enter: Some(off_enter),
            on_exit: None,
            on_update: off_update,
        },
        // Index 1: Warmup
        StateDescriptor {
            id: DutyState::Warmup,
            name: "WARMUP",
            on_enter: Some(warmup_enter),
            on_exit: None,
            on_update: warmup_update,
        },
        // Index 2: Measure
        StateDescriptor {
            id: DutyState::Measure,
            name: "MEASURE",
            on_enter: Some(measure_enter),
            on_exit: Some(measure_exit),
            on_update: measure_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF: sensor unpowered, no samples
// ═══════════════════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut DutyContext) {
    ctx.power = Some(PowerAction::Deassert);
    info!("OFF: sensor power down for {}s", ctx.timing.off_us / 1_000_000);
}

fn off_update(ctx: &mut DutyContext) -> Option<DutyState> {
    (ctx.elapsed_us >= ctx.timing.off_us).then_some(DutyState::Warmup)
}

// ═══════════════════════════════════════════════════════════════════════════
//  WARMUP: powered, readings not yet trusted
// ═══════════════════════════════════════════════════════════════════════════

fn warmup_enter(ctx: &mut DutyContext) {
    ctx.power = Some(PowerAction::Assert);
    info!("WARMUP: sensor powered, settling for {}s", ctx.timing.warmup_us / 1_000_000);
}

fn warmup_update(ctx: &mut DutyContext) -> Option<DutyState> {
    (ctx.elapsed_us >= ctx.timing.warmup_us).then_some(DutyState::Measure)
}

// ═══════════════════════════════════════════════════════════════════════════
//  MEASURE: powered and trusted
// ═══════════════════════════════════════════════════════════════════════════

fn measure_enter(ctx: &mut DutyContext) {
    info!("MEASURE: window open for {}s", ctx.timing.measure_us / 1_000_000);
}

fn measure_exit(_ctx: &mut DutyContext) {
    info!("MEASURE: window closed");
}

fn measure_update(ctx: &mut DutyContext) -> Option<DutyState> {
    (ctx.elapsed_us >= ctx.timing.measure_us).then_some(DutyState::Off)
}
