//! Hall-effect flow sensor: pulse counting and per-epoch rate.
//!
//! An ISR increments an atomic counter on each rising edge of the flow
//! line; once per epoch the sampling loop swaps it to zero and converts
//! the count into a flow rate.
//!
//! The ISR and the sampling task run at different priorities, so the
//! counter is an `AtomicU32` and the drain is a single `swap`.  A pulse
//! landing during the drain is never lost or counted twice.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::ProbeConfig;

/// Pulse tally shared between the flow ISR and the sampling loop.
pub struct FlowCounter {
    pulses: AtomicU32,
}

impl Default for FlowCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowCounter {
    pub const fn new() -> Self {
        Self {
            pulses: AtomicU32::new(0),
        }
    }

    /// Called from the GPIO ISR on each rising edge.
    pub fn on_rising_edge(&self) {
        self.pulses.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the tally and reset it to zero in one atomic step.
    pub fn drain(&self) -> u32 {
        self.pulses.swap(0, Ordering::Relaxed)
    }
}

/// Result of one flow epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowReading {
    /// Pulses counted in the epoch.
    pub pulse_count: u32,
    /// Flow rate (L/min).
    pub flow_rate: f32,
}

/// Converts per-epoch pulse counts into a flow rate.  Unsmoothed: each
/// epoch replaces the previous rate.
pub struct FlowRateEstimator {
    pulse_to_hz: f32,
    calibration: f32,
    rate: f32,
}

impl FlowRateEstimator {
    pub fn new(pulse_to_hz: f32, calibration: f32) -> Self {
        Self {
            pulse_to_hz,
            calibration,
            rate: 0.0,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.flow_pulse_to_hz, config.flow_calibration)
    }

    /// Close an epoch with `pulses` counted in it.
    pub fn update(&mut self, pulses: u32) -> FlowReading {
        let pulse_hz = pulses as f32 * self.pulse_to_hz;
        self.rate = pulse_hz / self.calibration;
        FlowReading {
            pulse_count: pulses,
            flow_rate: self.rate,
        }
    }

    /// Flow rate from the most recent epoch (0 before the first).
    pub fn rate(&self) -> f32 {
        self.rate
    }
}
