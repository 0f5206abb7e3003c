//! Application core: pure sampling logic, zero I/O.
//!
//! The duty cycle, frequency filter, flow estimator and TDS model are
//! wired together in [`service::ProbeService`].  All interaction with
//! hardware and transports happens through the port traits in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
