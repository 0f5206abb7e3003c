//! Rising-edge interval capture for the oscillator sensor line.
//!
//! The GPIO ISR calls [`EdgeTimer::on_rising_edge`] with the ESP high-
//! resolution timer value.  The first edge after startup only seeds the
//! reference timestamp; every later edge pushes the elapsed microseconds
//! into a bounded channel that the sampling loop drains.
//!
//! ```text
//!  GPIO ISR ──▶ EdgeTimer ──try_send──▶ [ u32; N ] ──▶ sampling loop
//!                 │                        full?
//!                 └── last edge (u32) ─────▶ drop newest, count it
//! ```
//!
//! The ISR side is bounded and non-blocking: two relaxed atomics and a
//! `try_send` on an `embassy_sync` channel guarded by a critical section.
//! Timestamps are kept as the low 32 bits of the microsecond clock, so an
//! interval is exact as long as edges are less than ~71 minutes apart.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Interval channel depth.  Holds several report periods' worth of
/// consumer latency at low sensor frequencies.
pub const INTERVAL_QUEUE_LEN: usize = 32;

/// Microseconds between two consecutive rising edges.
pub type EdgeInterval = u32;

/// What a single edge did to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// First edge since startup: reference stored, nothing queued.
    Seeded,
    /// Interval queued for the sampling loop.
    Queued(EdgeInterval),
    /// Channel full: interval discarded.
    Dropped(EdgeInterval),
}

pub struct EdgeTimer<const N: usize = INTERVAL_QUEUE_LEN> {
    last_edge_us: AtomicU32,
    seeded: AtomicBool,
    dropped: AtomicU32,
    intervals: Channel<CriticalSectionRawMutex, EdgeInterval, N>,
}

impl<const N: usize> Default for EdgeTimer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EdgeTimer<N> {
    pub const fn new() -> Self {
        Self {
            last_edge_us: AtomicU32::new(0),
            seeded: AtomicBool::new(false),
            dropped: AtomicU32::new(0),
            intervals: Channel::new(),
        }
    }

    /// Record a rising edge seen at `now_us` (monotonic microseconds).
    ///
    /// ISR-safe.  Single producer: only the edge ISR may call this.
    pub fn on_rising_edge(&self, now_us: u64) -> EdgeOutcome {
        let now = now_us as u32;
        let last = self.last_edge_us.swap(now, Ordering::Relaxed);

        if !self.seeded.swap(true, Ordering::Relaxed) {
            return EdgeOutcome::Seeded;
        }

        let interval = now.wrapping_sub(last);
        match self.intervals.try_send(interval) {
            Ok(()) => EdgeOutcome::Queued(interval),
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                EdgeOutcome::Dropped(interval)
            }
        }
    }

    /// Take the oldest queued interval without waiting.
    pub fn try_take(&self) -> Option<EdgeInterval> {
        self.intervals.try_receive().ok()
    }

    /// Throw away every queued interval and return how many there were.
    pub fn clear(&self) -> usize {
        let mut cleared = 0;
        while self.intervals.try_receive().is_ok() {
            cleared += 1;
        }
        cleared
    }

    /// Intervals currently queued.
    pub fn pending(&self) -> usize {
        self.intervals.len()
    }

    /// Intervals dropped on a full channel since startup.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}
