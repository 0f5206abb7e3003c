//! Host-side telemetry monitor.
//!
//! Listens for probe datagrams and prints each record with labels and
//! units.  Malformed datagrams are reported on stderr and skipped.
//!
//! ```text
//! tds-monitor [PORT]        (default 3333)
//! ```

use std::net::UdpSocket;

use anyhow::{Context, Result};

use tdsprobe::telemetry::{TelemetryFrame, parse_record};

const DEFAULT_PORT: u16 = 3333;
const BUFFER_SIZE: usize = 256;

fn render(frame: &TelemetryFrame) -> String {
    match frame {
        TelemetryFrame::Off => "Sensor off\n".to_string(),
        TelemetryFrame::Warmup => "Sensor warming up\n".to_string(),
        TelemetryFrame::Measure(m) => format!(
            "Raw Frequency: {:.2} Hz\n\
             Filtered Frequency: {:.2} Hz\n\
             Flow Rate: {:.3} L/min\n\
             TDS: {:.2} ppm\n",
            m.raw_hz, m.filtered_hz, m.flow_rate, m.tds
        ),
    }
}

fn main() -> Result<()> {
    let port = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u16>()
            .with_context(|| format!("invalid port '{arg}'"))?,
        None => DEFAULT_PORT,
    };

    let socket = UdpSocket::bind(("0.0.0.0", port))
        .with_context(|| format!("cannot bind UDP port {port}"))?;
    println!("Listening for probe telemetry on UDP {port}");

    let mut buf = [0u8; BUFFER_SIZE];
    loop {
        let (n, from) = socket.recv_from(&mut buf).context("receive failed")?;
        let Ok(text) = std::str::from_utf8(&buf[..n]) else {
            eprintln!("{from}: datagram is not UTF-8, skipped");
            continue;
        };
        match parse_record(text) {
            Ok(frame) => println!("{}", render(&frame)),
            Err(e) => eprintln!("{from}: bad record {:?}: {e}", text.trim_end()),
        }
    }
}
