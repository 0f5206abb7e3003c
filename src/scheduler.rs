//! Fixed-cadence scheduler loop.
//!
//! ```text
//!   ┌──────────────────────────────────────────────┐
//!   │ loop every tick_ms                           │
//!   │   stop flag set? ──yes──▶ shutdown, return   │
//!   │   ProbeService::tick(hw, sinks, events)      │
//!   │   heartbeat()          (watchdog feed)       │
//!   │   delay.delay_ms(tick_ms)                    │
//!   └──────────────────────────────────────────────┘
//! ```
//!
//! The flow epoch and the report interval are two [`Periodic`] timers
//! with independent phases, polled from inside the tick.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use log::info;

use crate::app::ports::{ClockPort, EventSink, IntervalPort, PowerControl, PulsePort, TelemetrySink};
use crate::app::service::ProbeService;

// ═══════════════════════════════════════════════════════════════
//  Periodic timer
// ═══════════════════════════════════════════════════════════════

/// Fires when at least one period has elapsed since it last fired.
///
/// The reference moves to the poll instant, so a late poll delays every
/// later firing by the same amount.
#[derive(Debug, Clone, Copy)]
pub struct Periodic {
    period_us: u64,
    last_us: u64,
}

impl Periodic {
    pub fn from_millis(period_ms: u32) -> Self {
        Self {
            period_us: u64::from(period_ms) * 1_000,
            last_us: 0,
        }
    }

    pub fn reset(&mut self, now_us: u64) {
        self.last_us = now_us;
    }

    pub fn poll(&mut self, now_us: u64) -> bool {
        if now_us.saturating_sub(self.last_us) >= self.period_us {
            self.last_us = now_us;
            true
        } else {
            false
        }
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }
}

// ═══════════════════════════════════════════════════════════════
//  Loop
// ═══════════════════════════════════════════════════════════════

/// Start `service` and tick it every `tick_ms` until `stop` is set, then
/// shut it down.  Returns the number of ticks run.
///
/// `heartbeat` runs once per tick after the service; the firmware feeds
/// the task watchdog from it.
#[allow(clippy::too_many_arguments)]
pub fn run(
    service: &mut ProbeService,
    hw: &mut (impl ClockPort + PowerControl + IntervalPort + PulsePort),
    sinks: &mut [&mut dyn TelemetrySink],
    events: &mut impl EventSink,
    delay: &mut impl DelayNs,
    tick_ms: u32,
    stop: &AtomicBool,
    mut heartbeat: impl FnMut(),
) -> u64 {
    service.start(hw, events);
    info!("scheduler: ticking every {}ms", tick_ms);

    let mut ticks: u64 = 0;
    while !stop.load(Ordering::Acquire) {
        service.tick(hw, sinks, events);
        heartbeat();
        ticks += 1;
        delay.delay_ms(tick_ms);
    }

    info!("scheduler: stop requested after {} ticks", ticks);
    service.shutdown(hw, events);
    ticks
}
