//! TDS probe firmware library.
//!
//! Duty-cycled acquisition of an oscillator sensor's frequency and a flow
//! pulse rate, smoothed and combined into a dissolved-solids estimate,
//! reported once a second as a text record.
//!
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module; host builds get simulation stubs so the whole
//! sampling core can be tested off-target.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod scheduler;
pub mod tds;
pub mod telemetry;

pub mod adapters;
pub mod drivers;
pub mod sensors;
