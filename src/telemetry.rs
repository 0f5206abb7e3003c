//! Telemetry record wire format.
//!
//! One newline-terminated line of four comma-separated fields, no spaces:
//!
//! ```text
//!   OFF      -,-,-,-
//!   WARMUP   warmup,warmup,warmup,warmup
//!   MEASURE  raw_hz,filtered_hz,flow_lpm,tds_ppm     (2/2/3/2 decimals)
//! ```
//!
//! [`format_record`] is total over [`TelemetryFrame`].  [`parse_record`]
//! is the receiving side, used by the host monitor.

use core::fmt::{self, Write};

use heapless::String;

/// Large enough for four `f32::MAX`-sized fields at the chosen precision,
/// so formatting never truncates.
pub const RECORD_CAPACITY: usize = 192;

pub type TelemetryRecord = String<RECORD_CAPACITY>;

const OFF_FIELD: &str = "-";
const WARMUP_FIELD: &str = "warmup";

/// Values reported during a measurement window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub raw_hz: f32,
    pub filtered_hz: f32,
    /// L/min
    pub flow_rate: f32,
    /// ppm
    pub tds: f32,
}

/// Content of one telemetry record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryFrame {
    Off,
    Warmup,
    Measure(Measurement),
}

pub fn format_record(frame: &TelemetryFrame) -> TelemetryRecord {
    let mut line = TelemetryRecord::new();
    let written = match frame {
        TelemetryFrame::Off => write_placeholder(&mut line, OFF_FIELD),
        TelemetryFrame::Warmup => write_placeholder(&mut line, WARMUP_FIELD),
        TelemetryFrame::Measure(m) => writeln!(
            line,
            "{:.2},{:.2},{:.3},{:.2}",
            m.raw_hz, m.filtered_hz, m.flow_rate, m.tds
        ),
    };
    debug_assert!(written.is_ok(), "record overflowed {RECORD_CAPACITY} bytes");
    line
}

fn write_placeholder(line: &mut TelemetryRecord, field: &str) -> fmt::Result {
    writeln!(line, "{field},{field},{field},{field}")
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Not exactly four fields.
    FieldCount(usize),
    /// Field `n` (0-based) is not a number.
    InvalidNumber(usize),
    /// Placeholder fields mixed with values or with each other.
    MixedPlaceholder,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldCount(n) => write!(f, "expected 4 fields, got {n}"),
            Self::InvalidNumber(i) => write!(f, "field {i} is not a number"),
            Self::MixedPlaceholder => write!(f, "placeholder mixed with values"),
        }
    }
}

impl core::error::Error for ParseError {}

/// Parse one record.  Surrounding whitespace, including the line
/// terminator, is ignored.
pub fn parse_record(line: &str) -> Result<TelemetryFrame, ParseError> {
    let line = line.trim();
    let mut fields = [""; 4];
    let mut count = 0;
    for field in line.split(',') {
        if count < fields.len() {
            fields[count] = field;
        }
        count += 1;
    }
    if count != fields.len() {
        return Err(ParseError::FieldCount(count));
    }

    for placeholder in [OFF_FIELD, WARMUP_FIELD] {
        let matching = fields.iter().filter(|f| **f == placeholder).count();
        match matching {
            0 => {}
            4 if placeholder == OFF_FIELD => return Ok(TelemetryFrame::Off),
            4 => return Ok(TelemetryFrame::Warmup),
            _ => return Err(ParseError::MixedPlaceholder),
        }
    }

    let mut values = [0.0f32; 4];
    for (i, field) in fields.iter().enumerate() {
        values[i] = field.parse().map_err(|_| ParseError::InvalidNumber(i))?;
    }
    let [raw_hz, filtered_hz, flow_rate, tds] = values;
    Ok(TelemetryFrame::Measure(Measurement {
        raw_hz,
        filtered_hz,
        flow_rate,
        tds,
    }))
}
