//! Datagram telemetry sink.
//!
//! Sends each record as one UDP datagram to a fixed destination.  The
//! socket is non-blocking, so a congested stack shows up as a send error
//! instead of a stalled sampling loop.  Ready only while the network
//! adapter reports the link up.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use log::info;

use crate::app::ports::TelemetrySink;
use crate::error::{Error, SinkError};

use super::wifi::LinkReady;

pub struct UdpSink {
    socket: UdpSocket,
    destination: SocketAddr,
    link: LinkReady,
}

impl UdpSink {
    /// Bind an ephemeral local port for sending to `destination`
    /// (`ip:port`).
    pub fn bind(destination: &str, link: LinkReady) -> Result<Self, Error> {
        let destination: SocketAddr = destination
            .parse()
            .map_err(|_| Error::Config("datagram destination must be ip:port"))?;
        let local: SocketAddr = if destination.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local).map_err(|_| Error::Init("UDP socket bind"))?;
        socket
            .set_nonblocking(true)
            .map_err(|_| Error::Init("UDP socket non-blocking"))?;
        info!("udp: sending telemetry to {}", destination);
        Ok(Self {
            socket,
            destination,
            link,
        })
    }
}

impl TelemetrySink for UdpSink {
    fn name(&self) -> &'static str {
        "udp"
    }

    fn is_ready(&self) -> bool {
        self.link.is_up()
    }

    fn send(&mut self, record: &str) -> Result<(), SinkError> {
        if !self.link.is_up() {
            return Err(SinkError::NotReady);
        }
        match self.socket.send_to(record.as_bytes(), self.destination) {
            Ok(n) if n == record.len() => Ok(()),
            Ok(_) => Err(SinkError::ShortWrite),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(SinkError::NotReady),
            Err(_) => Err(SinkError::Io),
        }
    }
}
