//! Task Watchdog Timer (TWDT) driver.
//!
//! Subscribes the sampling task to the ESP-IDF TWDT so a stalled
//! scheduler loop resets the probe.  The loop feeds it once per tick
//! through the scheduler heartbeat.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

/// Stall timeout.  Far above one tick plus the longest interval wait.
pub const WATCHDOG_TIMEOUT_MS: u32 = 5_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::subscribe(WATCHDOG_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Reconfigure the TWDT to panic after `timeout_ms` and subscribe the
    /// calling task.  Failure is logged and leaves an inert watchdog.
    pub fn subscribe(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: plain TWDT API calls; the null handle means the
            // calling task.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK as i32 {
                    log::warn!("watchdog: reconfigure returned {}", ret);
                }

                let subscribed = esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK as i32;
                if subscribed {
                    info!("watchdog: sampling task subscribed ({}ms)", timeout_ms);
                } else {
                    log::warn!("watchdog: subscribe failed, running unguarded");
                }
                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("watchdog(sim): {}ms timeout ignored", timeout_ms);
            Self {}
        }
    }

    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: resets the calling task's TWDT entry.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}
