//! Context threaded through every duty-cycle state handler.
//!
//! Handlers read the time spent in the current state and the configured
//! dwell times, and stage a power command for the controller to apply.
//! They never touch hardware themselves.

use crate::config::ProbeConfig;

const US_PER_SEC: u64 = 1_000_000;

/// Requested change on the sensor power line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Assert,
    Deassert,
}

/// Dwell time of each state, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyTiming {
    pub off_us: u64,
    pub warmup_us: u64,
    pub measure_us: u64,
}

impl DutyTiming {
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            off_us: u64::from(config.off_secs) * US_PER_SEC,
            warmup_us: u64::from(config.warmup_secs) * US_PER_SEC,
            measure_us: u64::from(config.measure_secs()) * US_PER_SEC,
        }
    }

    /// One full OFF → WARMUP → MEASURE period.
    pub fn period_us(&self) -> u64 {
        self.off_us + self.warmup_us + self.measure_us
    }
}

pub struct DutyContext {
    pub timing: DutyTiming,
    /// Microseconds since the current state was entered.
    pub elapsed_us: u64,
    /// Staged by `on_enter`; taken and applied by the controller.
    pub power: Option<PowerAction>,
}

impl DutyContext {
    pub fn new(timing: DutyTiming) -> Self {
        Self {
            timing,
            elapsed_us: 0,
            power: None,
        }
    }
}
