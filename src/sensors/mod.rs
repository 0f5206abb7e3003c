//! Sensor subsystem: edge capture, frequency smoothing and flow counting.
//!
//! The two GPIO interrupt lines each own one static here.  ISRs touch
//! nothing else; the sampling loop reaches the same statics through the
//! hardware adapter's port implementations.

pub mod edge_timer;
pub mod flow;
pub mod frequency;

use edge_timer::{EdgeOutcome, EdgeTimer};
use flow::FlowCounter;

/// Rising-edge intervals of the oscillator sensor line.
pub static EDGE_TIMER: EdgeTimer = EdgeTimer::new();

/// Pulse tally of the flow sensor line.
pub static FLOW_COUNTER: FlowCounter = FlowCounter::new();

/// Sensor-line ISR body.  `now_us` is the high-resolution timer value at
/// interrupt entry.
#[inline]
pub fn edge_isr_handler(now_us: u64) -> EdgeOutcome {
    EDGE_TIMER.on_rising_edge(now_us)
}

/// Flow-line ISR body.
#[inline]
pub fn flow_isr_handler() {
    FLOW_COUNTER.on_rising_edge();
}
