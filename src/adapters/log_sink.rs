//! Log-based event sink adapter.
//!
//! The local diagnostic sink: writes every application event, including
//! each telemetry record, to the ESP-IDF logger (UART / USB-CDC on the
//! board, stderr on the host).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Report(record) => {
                info!("TELEM | {}", record.trim_end());
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::SampleRejected(e) => {
                debug!("SAMPLE | rejected: {}", e);
            }
            AppEvent::SinkFailed { sink, error } => {
                warn!("SINK | {}: {}", sink, error);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            AppEvent::Stopped => {
                info!("STOP | sensor powered down");
            }
        }
    }
}
