//! Outbound application events.
//!
//! [`ProbeService`](super::service::ProbeService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  The firmware logs them;
//! tests record them.

use crate::error::{SensorError, SinkError};
use crate::fsm::DutyState;
use crate::telemetry::TelemetryRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service started (carries the initial state).
    Started(DutyState),

    /// The duty cycle moved between states.
    StateChanged { from: DutyState, to: DutyState },

    /// A telemetry record was produced.  Emitted whether or not any
    /// transport sink took it.
    Report(TelemetryRecord),

    /// An interval was refused by the frequency filter.
    SampleRejected(SensorError),

    /// A ready sink failed to take a record.
    SinkFailed {
        sink: &'static str,
        error: SinkError,
    },

    /// The service shut down and the sensor was powered off.
    Stopped,
}
