//! Total-dissolved-solids estimation model.
//!
//! Converts the filtered sensor frequency and the current flow rate into a
//! TDS estimate (ppm).  Two regressions are calibrated separately and the
//! flow threshold selects between them:
//!
//! ```text
//!   flow <  threshold:  tds = a·f² + b·f + c            (low flow)
//!   flow >= threshold:  tds = d·f + e·flow + g          (high flow)
//! ```
//!
//! The two branches do not meet at the threshold.  That step is a known
//! limitation of the calibration data; it is reported as-is rather than
//! blended.

use serde::{Deserialize, Serialize};

/// Regression coefficients.  An external calibration input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdsModel {
    /// Flow rate (L/min) at which the high-flow branch takes over.
    pub flow_threshold: f32,
    /// Low-flow quadratic: `quad_a·f² + quad_b·f + quad_c`.
    pub quad_a: f32,
    pub quad_b: f32,
    pub quad_c: f32,
    /// High-flow linear: `lin_freq·f + lin_flow·flow + lin_offset`.
    pub lin_freq: f32,
    pub lin_flow: f32,
    pub lin_offset: f32,
}

impl Default for TdsModel {
    fn default() -> Self {
        Self {
            flow_threshold: 0.400,
            quad_a: 9e-7,
            quad_b: 0.0683,
            quad_c: 3.5733,
            lin_freq: 0.0901,
            lin_flow: 501.9,
            lin_offset: -266.8,
        }
    }
}

/// Which regression produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowRegime {
    Low,
    High,
}

impl TdsModel {
    pub fn regime(&self, flow_rate: f32) -> FlowRegime {
        if flow_rate < self.flow_threshold {
            FlowRegime::Low
        } else {
            FlowRegime::High
        }
    }

    /// Estimate TDS (ppm) from filtered frequency (Hz) and flow (L/min).
    /// Never negative.
    pub fn estimate(&self, frequency_hz: f32, flow_rate: f32) -> f32 {
        let f = frequency_hz;
        let tds = match self.regime(flow_rate) {
            FlowRegime::Low => self.quad_a * f * f + self.quad_b * f + self.quad_c,
            FlowRegime::High => self.lin_freq * f + self.lin_flow * flow_rate + self.lin_offset,
        };
        tds.max(0.0)
    }
}
