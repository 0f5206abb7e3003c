//! Simulated probe hardware for integration tests.
//!
//! A shared microsecond clock is advanced only by [`SimDelay`], so the
//! scheduler loop runs in simulated time.  The oscillator produces one
//! edge interval per poll while the sensor is powered; scripted intervals
//! take priority over it.  Every power call is recorded.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use tdsprobe::app::events::AppEvent;
use tdsprobe::app::ports::{
    ClockPort, EventSink, IntervalPort, PowerControl, PulsePort, TelemetrySink,
};
use tdsprobe::error::SinkError;

pub const S: u64 = 1_000_000;

pub type SimClock = Rc<Cell<u64>>;

// ── Hardware ──────────────────────────────────────────────────

pub struct SimHardware {
    pub clock: SimClock,
    pub powered: bool,
    /// Every power call in order: `true` = assert.
    pub power_history: Vec<(u64, bool)>,
    /// Interval the oscillator produces while powered.
    pub oscillator_us: Option<u32>,
    /// Delivered before any oscillator interval, powered or not.
    pub scripted: VecDeque<u32>,
    /// Pulses returned by each drain.
    pub pulses_per_drain: u32,
    pub dropped: u32,
    pub drains: u32,
}

#[allow(dead_code)]
impl SimHardware {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            powered: false,
            power_history: Vec::new(),
            oscillator_us: None,
            scripted: VecDeque::new(),
            pulses_per_drain: 0,
            dropped: 0,
            drains: 0,
        }
    }

    /// Times at which power was asserted.
    pub fn power_on_times(&self) -> Vec<u64> {
        self.power_history
            .iter()
            .filter(|(_, on)| *on)
            .map(|(t, _)| *t)
            .collect()
    }

    pub fn power_off_times(&self) -> Vec<u64> {
        self.power_history
            .iter()
            .filter(|(_, on)| !*on)
            .map(|(t, _)| *t)
            .collect()
    }
}

impl ClockPort for SimHardware {
    fn now_us(&self) -> u64 {
        self.clock.get()
    }
}

impl PowerControl for SimHardware {
    fn assert_power(&mut self) {
        self.powered = true;
        self.power_history.push((self.clock.get(), true));
    }

    fn deassert_power(&mut self) {
        self.powered = false;
        self.power_history.push((self.clock.get(), false));
    }
}

impl IntervalPort for SimHardware {
    fn recv_interval(&mut self, _timeout_us: u32) -> Option<u32> {
        if let Some(interval) = self.scripted.pop_front() {
            return Some(interval);
        }
        if self.powered { self.oscillator_us } else { None }
    }

    fn discard_pending(&mut self) -> u32 {
        let n = self.scripted.len() as u32;
        self.scripted.clear();
        n
    }

    fn dropped_intervals(&self) -> u32 {
        self.dropped
    }
}

impl PulsePort for SimHardware {
    fn drain_pulses(&mut self) -> u32 {
        self.drains += 1;
        self.pulses_per_drain
    }
}

// ── Delay ─────────────────────────────────────────────────────

/// Advances the shared clock instead of sleeping and raises `stop` once
/// the clock reaches `stop_at_us`.
pub struct SimDelay {
    pub clock: SimClock,
    pub stop: Arc<AtomicBool>,
    pub stop_at_us: u64,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        let now = self.clock.get() + u64::from(ns) / 1_000;
        self.clock.set(now);
        if now >= self.stop_at_us {
            self.stop.store(true, Ordering::Release);
        }
    }
}

// ── Sinks ─────────────────────────────────────────────────────

/// Records every event.
#[derive(Default)]
pub struct RecordingEvents(pub Vec<AppEvent>);

#[allow(dead_code)]
impl RecordingEvents {
    /// Text of every `Report` event, in order.
    pub fn reports(&self) -> Vec<String> {
        self.0
            .iter()
            .filter_map(|e| match e {
                AppEvent::Report(r) => Some(r.as_str().to_string()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingEvents {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(event.clone());
    }
}

/// A transport sink with scripted readiness and failure.
pub struct RecordingSink {
    pub name: &'static str,
    pub ready: bool,
    pub fail_with: Option<SinkError>,
    pub received: Vec<String>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ready: true,
            fail_with: None,
            received: Vec::new(),
        }
    }

    pub fn not_ready(name: &'static str) -> Self {
        Self {
            ready: false,
            ..Self::new(name)
        }
    }

    pub fn failing(name: &'static str, error: SinkError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new(name)
        }
    }
}

impl TelemetrySink for RecordingSink {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn send(&mut self, record: &str) -> Result<(), SinkError> {
        if let Some(error) = self.fail_with {
            return Err(error);
        }
        self.received.push(record.to_string());
        Ok(())
    }
}
