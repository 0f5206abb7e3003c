//! Fuzz target: `parse_record`
//!
//! Feeds arbitrary text to the telemetry record parser and asserts that it
//! never panics, and that any accepted record survives a format/parse
//! cycle as the same kind of frame.
//!
//! cargo fuzz run fuzz_record_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use tdsprobe::telemetry::{TelemetryFrame, format_record, parse_record};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(frame) = parse_record(text) else {
        return;
    };

    let again = parse_record(&format_record(&frame)).expect("formatted record must parse");
    match (frame, again) {
        (TelemetryFrame::Off, TelemetryFrame::Off) => {}
        (TelemetryFrame::Warmup, TelemetryFrame::Warmup) => {}
        (TelemetryFrame::Measure(_), TelemetryFrame::Measure(_)) => {}
        (a, b) => panic!("{a:?} reparsed as {b:?}"),
    }
});
