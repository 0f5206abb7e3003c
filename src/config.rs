//! Probe configuration parameters
//!
//! All tunable parameters for the TDS probe.  Values are fixed at build or
//! deploy time: the defaults below, optionally replaced by a JSON document
//! supplied through the `TDSPROBE_CONFIG` environment variable when the
//! firmware is built.  Nothing here is reconfigurable at runtime.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::tds::TdsModel;

/// What happens to the frequency filter when the sensor is powered down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterResetPolicy {
    /// Carry the filtered value into the next measurement window.
    #[default]
    Persist,
    /// Start every measurement window from an unset filter.
    ResetOnPowerDown,
}

/// Core acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    // --- Frequency filter ---
    /// Exponential smoothing weight for new samples, in (0, 1).
    pub alpha: f32,
    /// Filter behaviour across power cycles.
    pub filter_reset: FilterResetPolicy,

    // --- Duty cycle ---
    /// Sensor unpowered time (seconds).
    pub off_secs: u32,
    /// Powered settling time before readings are trusted (seconds).
    pub warmup_secs: u32,
    /// Total powered time per cycle, warm-up included (seconds).
    pub sensor_on_secs: u32,

    // --- Flow ---
    /// Multiplier from pulses-per-epoch to pulse frequency.
    pub flow_pulse_to_hz: f32,
    /// Divisor from pulse frequency to flow rate (L/min).
    pub flow_calibration: f32,
    /// Pulse counting window (milliseconds).
    pub flow_epoch_ms: u32,

    // --- Estimation ---
    /// TDS regression model and its flow threshold.
    pub model: TdsModel,

    // --- Timing ---
    /// Telemetry report interval (milliseconds).
    pub report_interval_ms: u32,
    /// Scheduler loop tick (milliseconds).
    pub tick_ms: u32,
    /// Longest wait for a queued edge interval per tick (milliseconds).
    pub interval_wait_ms: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            alpha: 0.10,
            filter_reset: FilterResetPolicy::Persist,

            off_secs: 5,
            warmup_secs: 20,
            sensor_on_secs: 180,

            flow_pulse_to_hz: 2.0,
            flow_calibration: 150.0,
            flow_epoch_ms: 1000,

            model: TdsModel::default(),

            report_interval_ms: 1000,
            tick_ms: 10,
            interval_wait_ms: 50,
        }
    }
}

impl ProbeConfig {
    /// Powered measurement time per cycle (seconds).
    pub fn measure_secs(&self) -> u32 {
        self.sensor_on_secs.saturating_sub(self.warmup_secs)
    }

    /// Full OFF → WARMUP → MEASURE period (seconds).
    pub fn cycle_secs(&self) -> u32 {
        self.off_secs.saturating_add(self.sensor_on_secs)
    }

    /// Reject parameter sets the sampling core cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::Config("alpha must lie strictly between 0 and 1"));
        }
        if self.off_secs == 0 || self.warmup_secs == 0 {
            return Err(Error::Config("off and warm-up durations must be non-zero"));
        }
        if self.sensor_on_secs <= self.warmup_secs {
            return Err(Error::Config("sensor on-time must exceed warm-up time"));
        }
        if !(self.flow_calibration > 0.0) || !(self.flow_pulse_to_hz > 0.0) {
            return Err(Error::Config("flow factors must be positive"));
        }
        if self.flow_epoch_ms == 0 || self.report_interval_ms == 0 || self.tick_ms == 0 {
            return Err(Error::Config("epoch, report and tick periods must be non-zero"));
        }
        if self.interval_wait_ms == 0 {
            return Err(Error::Config("interval wait must be non-zero"));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// The configuration baked into this build.
    ///
    /// An invalid `TDSPROBE_CONFIG` override is logged and the defaults
    /// are used instead.
    pub fn deployed() -> Self {
        match option_env!("TDSPROBE_CONFIG") {
            Some(json) => Self::from_json(json).unwrap_or_else(|e| {
                log::warn!("TDSPROBE_CONFIG rejected ({}), using defaults", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

/// Network bring-up parameters for the datagram transport.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub ssid: &'static str,
    pub password: &'static str,
    /// Datagram destination, `host:port`.
    pub destination: &'static str,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: "",
            password: "",
            destination: "192.168.1.7:3333",
        }
    }
}

impl NetworkConfig {
    /// Credentials and destination baked into this build.
    pub fn deployed() -> Self {
        let defaults = Self::default();
        Self {
            ssid: option_env!("TDSPROBE_WIFI_SSID").unwrap_or(defaults.ssid),
            password: option_env!("TDSPROBE_WIFI_PASS").unwrap_or(defaults.password),
            destination: option_env!("TDSPROBE_DEST").unwrap_or(defaults.destination),
        }
    }
}
