//! One-shot GPIO and interrupt bring-up.
//!
//! Configures the two sensor input lines with raw ESP-IDF sys calls and
//! attaches their ISRs.  Called once from `main()` before the scheduler
//! loop starts.  The ISRs only forward into the static hand-off
//! primitives in [`crate::sensors`].

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::error::Error;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed { pin: i32, rc: i32 },
    IsrInstallFailed(i32),
    IsrAttachFailed { pin: i32, rc: i32 },
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed { pin, rc } => {
                write!(f, "GPIO {} config failed (rc={})", pin, rc)
            }
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrAttachFailed { pin, rc } => {
                write!(f, "GPIO {} ISR attach failed (rc={})", pin, rc)
            }
        }
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::GpioConfigFailed { .. } => Error::Init("sensor GPIO config"),
            HwInitError::IsrInstallFailed(_) => Error::Init("GPIO ISR service"),
            HwInitError::IsrAttachFailed { .. } => Error::Init("GPIO ISR attach"),
        }
    }
}

// ── Input lines ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn configure_edge_input(pin: i32, pull_down: bool) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: if pull_down {
            gpio_pulldown_t_GPIO_PULLDOWN_ENABLE
        } else {
            gpio_pulldown_t_GPIO_PULLDOWN_DISABLE
        },
        intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
    };
    let rc = unsafe { gpio_config(&cfg) };
    if rc != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed { pin, rc });
    }
    Ok(())
}

// ── ISRs ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn sensor_edge_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time reads the high-resolution timer; ISR-safe.
    let now_us = unsafe { esp_timer_get_time() } as u64;
    crate::sensors::edge_isr_handler(now_us);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn flow_pulse_isr(_arg: *mut core::ffi::c_void) {
    crate::sensors::flow_isr_handler();
}

#[cfg(target_os = "espidf")]
unsafe fn attach(
    pin: i32,
    isr: unsafe extern "C" fn(*mut core::ffi::c_void),
) -> Result<(), HwInitError> {
    let rc = unsafe { gpio_isr_handler_add(pin, Some(isr), core::ptr::null_mut()) };
    if rc != ESP_OK as i32 {
        return Err(HwInitError::IsrAttachFailed { pin, rc });
    }
    unsafe { gpio_intr_enable(pin) };
    Ok(())
}

/// Configure both sensor inputs and attach their rising-edge ISRs.
#[cfg(target_os = "espidf")]
pub fn init_sensor_inputs() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before the scheduler loop; the ISRs
    // only touch the static atomics and channel in `crate::sensors`.
    unsafe {
        configure_edge_input(pins::SENSOR_INPUT_GPIO, true)?;
        configure_edge_input(pins::FLOW_PULSE_GPIO, false)?;

        // ESP_ERR_INVALID_STATE: already installed by another driver.
        let rc = gpio_install_isr_service(0);
        if rc != ESP_OK as i32 && rc != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(rc));
        }

        attach(pins::SENSOR_INPUT_GPIO, sensor_edge_isr)?;
        attach(pins::FLOW_PULSE_GPIO, flow_pulse_isr)?;
    }
    info!(
        "hw_init: sensor GPIO {} and flow GPIO {} armed (rising edge)",
        pins::SENSOR_INPUT_GPIO,
        pins::FLOW_PULSE_GPIO
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_sensor_inputs() -> Result<(), HwInitError> {
    info!("hw_init(sim): sensor inputs skipped");
    Ok(())
}
