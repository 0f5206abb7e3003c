//! Sensor supply switch.
//!
//! Wraps any `embedded-hal` output pin.  On the board this is GPIO 16
//! through `esp_idf_hal::gpio::PinDriver`; host tests use a recording pin.

use embedded_hal::digital::OutputPin;
use log::{debug, warn};

use crate::app::ports::PowerControl;

pub struct SensorPowerSwitch<P: OutputPin> {
    pin: P,
    powered: bool,
}

impl<P: OutputPin> SensorPowerSwitch<P> {
    /// Take the pin and drive it low.
    pub fn new(pin: P) -> Self {
        let mut switch = Self { pin, powered: true };
        switch.deassert_power();
        switch
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }
}

impl<P: OutputPin> PowerControl for SensorPowerSwitch<P> {
    fn assert_power(&mut self) {
        match self.pin.set_high() {
            Ok(()) => {
                self.powered = true;
                debug!("sensor power on");
            }
            Err(e) => warn!("sensor power on failed: {:?}", e),
        }
    }

    fn deassert_power(&mut self) {
        match self.pin.set_low() {
            Ok(()) => {
                self.powered = false;
                debug!("sensor power off");
            }
            Err(e) => warn!("sensor power off failed: {:?}", e),
        }
    }
}
