//! Port traits: the hexagonal boundary between the sampling core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ProbeService (domain)
//! ```
//!
//! Driven adapters (ISR hand-off, power switch, clock, transports) implement
//! these traits.  [`ProbeService`](super::service::ProbeService) consumes
//! them via generics, so the domain core never touches hardware directly.

use crate::error::SinkError;
use crate::sensors::edge_timer::EdgeInterval;

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic microsecond clock.
pub trait ClockPort {
    fn now_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Sensor power (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The sensor's power line.  Both operations are idempotent.
pub trait PowerControl {
    fn assert_power(&mut self);
    fn deassert_power(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Interrupt hand-off (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Consumer side of the edge-interval channel.
pub trait IntervalPort {
    /// Dequeue the oldest interval, waiting at most `timeout_us`.
    fn recv_interval(&mut self, timeout_us: u32) -> Option<EdgeInterval>;

    /// Drop every queued interval and return how many there were.
    fn discard_pending(&mut self) -> u32;

    /// Intervals lost to a full channel since startup.
    fn dropped_intervals(&self) -> u32;
}

/// Consumer side of the flow pulse counter.
pub trait PulsePort {
    /// Read and zero the pulse tally.
    fn drain_pulses(&mut self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Telemetry transports (domain → network)
// ───────────────────────────────────────────────────────────────

/// A fire-and-forget destination for telemetry records.
///
/// `send` must not block for long: a stalled sink stalls the sampling
/// loop.  A sink that is not ready is skipped for that record.
pub trait TelemetrySink {
    /// Short label for logs and events.
    fn name(&self) -> &'static str;

    fn is_ready(&self) -> bool;

    fn send(&mut self, record: &str) -> Result<(), SinkError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
