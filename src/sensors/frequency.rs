//! Instantaneous frequency and its exponential smoothing.
//!
//! ```text
//!   raw      = 1e6 / interval_us
//!   filtered = raw                              (first sample)
//!   filtered = α·raw + (1 − α)·filtered         (afterwards)
//! ```
//!
//! A single-pole low-pass filter.  Its only state is the previous
//! filtered value, plus the last raw value kept for telemetry.

use crate::error::SensorError;

/// Frequency (Hz) of a signal whose rising edges are `interval_us` apart.
/// `None` for a zero interval.
pub fn interval_to_hz(interval_us: u32) -> Option<f32> {
    if interval_us == 0 {
        return None;
    }
    Some(1_000_000.0 / interval_us as f32)
}

/// Raw and smoothed frequency after one accepted sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencySample {
    pub raw_hz: f32,
    pub filtered_hz: f32,
}

pub struct FrequencyFilter {
    alpha: f32,
    filtered: Option<f32>,
    last_raw: Option<f32>,
}

impl FrequencyFilter {
    /// `alpha` must lie in (0, 1); see [`ProbeConfig::validate`](crate::config::ProbeConfig::validate).
    pub fn new(alpha: f32) -> Self {
        debug_assert!(alpha > 0.0 && alpha < 1.0, "alpha out of range: {alpha}");
        Self {
            alpha,
            filtered: None,
            last_raw: None,
        }
    }

    /// Feed one edge interval.  A zero interval is rejected and leaves the
    /// filter untouched.
    pub fn observe(&mut self, interval_us: u32) -> Result<FrequencySample, SensorError> {
        let raw_hz = interval_to_hz(interval_us).ok_or(SensorError::ZeroInterval)?;

        let filtered_hz = match self.filtered {
            None => raw_hz,
            Some(prev) => self.alpha * raw_hz + (1.0 - self.alpha) * prev,
        };

        self.filtered = Some(filtered_hz);
        self.last_raw = Some(raw_hz);
        Ok(FrequencySample {
            raw_hz,
            filtered_hz,
        })
    }

    /// Smoothed frequency, `None` until the first sample.
    pub fn filtered_hz(&self) -> Option<f32> {
        self.filtered
    }

    /// Most recent raw frequency, `None` until the first sample.
    pub fn last_raw_hz(&self) -> Option<f32> {
        self.last_raw
    }

    /// Return to the unset state; the next sample initialises the filter.
    pub fn reset(&mut self) {
        self.filtered = None;
        self.last_raw = None;
    }
}
