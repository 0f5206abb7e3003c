//! GPIO assignments for the probe board (ESP32-S3).
//!
//! Single source of truth: drivers reference these rather than hard-coding
//! pin numbers.

/// Oscillator sensor output.  Input with pull-down, rising-edge interrupt.
pub const SENSOR_INPUT_GPIO: i32 = 38;

/// Hall-effect flow sensor pulse output.  Rising-edge interrupt.
pub const FLOW_PULSE_GPIO: i32 = 37;

/// Sensor supply switch.  HIGH = powered.  Driven through `esp-idf-hal`'s
/// `PinDriver`, so `main` uses the typed peripheral rather than this
/// number; kept here for the board map and the boot log.
pub const SENSOR_POWER_GPIO: i32 = 16;
