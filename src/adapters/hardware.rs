//! Hardware adapter: bridges the ISR hand-off and the power switch to the
//! domain port traits.
//!
//! Combines the static [`EdgeTimer`] and [`FlowCounter`], a power switch
//! and the ESP timer into one value that satisfies every hardware port, so
//! [`ProbeService::tick`](crate::app::service::ProbeService::tick) can take
//! it as a single `&mut`.

use crate::app::ports::{ClockPort, IntervalPort, PowerControl, PulsePort};
use crate::sensors::edge_timer::{EdgeInterval, EdgeTimer};
use crate::sensors::flow::FlowCounter;

use super::time::Esp32TimeAdapter;

/// Give up the CPU between channel polls.
#[cfg(target_os = "espidf")]
fn poll_pause() {
    // A whole tick: newlib's sub-tick usleep busy-waits.
    // SAFETY: blocks the calling task; no other preconditions.
    unsafe { esp_idf_svc::sys::vTaskDelay(1) };
}

#[cfg(not(target_os = "espidf"))]
fn poll_pause() {
    std::thread::sleep(std::time::Duration::from_millis(1));
}

pub struct HardwareAdapter<P: PowerControl> {
    edges: &'static EdgeTimer,
    pulses: &'static FlowCounter,
    power: P,
    clock: Esp32TimeAdapter,
}

impl<P: PowerControl> HardwareAdapter<P> {
    pub fn new(edges: &'static EdgeTimer, pulses: &'static FlowCounter, power: P) -> Self {
        Self {
            edges,
            pulses,
            power,
            clock: Esp32TimeAdapter::new(),
        }
    }

    pub fn power(&self) -> &P {
        &self.power
    }
}

impl<P: PowerControl> ClockPort for HardwareAdapter<P> {
    fn now_us(&self) -> u64 {
        self.clock.uptime_us()
    }
}

impl<P: PowerControl> PowerControl for HardwareAdapter<P> {
    fn assert_power(&mut self) {
        self.power.assert_power();
    }

    fn deassert_power(&mut self) {
        self.power.deassert_power();
    }
}

impl<P: PowerControl> IntervalPort for HardwareAdapter<P> {
    /// Poll the channel until an interval arrives or `timeout_us` passes.
    /// The ISR never wakes this task; it only enqueues.
    fn recv_interval(&mut self, timeout_us: u32) -> Option<EdgeInterval> {
        let deadline = self.clock.uptime_us() + u64::from(timeout_us);
        loop {
            if let Some(interval) = self.edges.try_take() {
                return Some(interval);
            }
            if self.clock.uptime_us() >= deadline {
                return None;
            }
            poll_pause();
        }
    }

    fn discard_pending(&mut self) -> u32 {
        self.edges.clear() as u32
    }

    fn dropped_intervals(&self) -> u32 {
        self.edges.dropped()
    }
}

impl<P: PowerControl> PulsePort for HardwareAdapter<P> {
    fn drain_pulses(&mut self) -> u32 {
        self.pulses.drain()
    }
}
