//! Hardware initialisation, the sensor power switch and the watchdog.

pub mod hw_init;
pub mod sensor_power;
pub mod watchdog;
