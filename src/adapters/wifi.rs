//! Wi-Fi station link supervisor.
//!
//! Joins the configured access point, disables modem power save once an
//! address is held (power save adds tens of milliseconds of jitter to
//! datagram delivery), and publishes the result as a shared [`LinkReady`]
//! flag that telemetry sinks consult before sending.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`EspStation`] drives `esp_idf_svc::wifi`.
//! - **all other targets**: [`SimStation`] scripts connect results for
//!   host-side tests.
//!
//! ## Reconnection policy
//!
//! After a failed join or a lost link the supervisor waits an exponential
//! backoff (2 s → 4 s → 8 s … capped at 60 s) before retrying.  A
//! successful join resets the backoff.

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

const INITIAL_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;

/// How often a held link is re-checked.
pub const LINK_CHECK_PERIOD: Duration = Duration::from_secs(1);

// ───────────────────────────────────────────────────────────────
// Link flag
// ───────────────────────────────────────────────────────────────

/// Shared "an IP address is held" flag.  Cheap to clone; every clone sees
/// the same state.
#[derive(Debug, Clone, Default)]
pub struct LinkReady(Arc<AtomicBool>);

impl LinkReady {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, up: bool) {
        self.0.store(up, Ordering::Release);
    }

    pub fn is_up(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ───────────────────────────────────────────────────────────────
// Errors and credentials
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "Wi-Fi connection failed"),
        }
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Validated station credentials.
#[derive(Debug, Clone)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        if ssid.is_empty() || !is_printable_ascii(ssid) {
            return Err(ConnectivityError::InvalidSsid);
        }
        if !password.is_empty() && password.len() < 8 {
            return Err(ConnectivityError::InvalidPassword);
        }
        let mut creds = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds
            .ssid
            .push_str(ssid)
            .map_err(|_| ConnectivityError::InvalidSsid)?;
        creds
            .password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok(creds)
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Station driver seam
// ───────────────────────────────────────────────────────────────

/// The platform Wi-Fi station.
pub trait StationDriver {
    /// Join the access point and wait until an address is held.
    fn connect(&mut self, creds: &WifiCredentials) -> Result<(), ConnectivityError>;

    fn is_connected(&self) -> bool;

    fn disable_power_save(&mut self);
}

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::{EspError, esp_wifi_set_ps, wifi_ps_type_t_WIFI_PS_NONE};
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::warn;

    use super::{ConnectivityError, StationDriver, WifiCredentials};

    pub struct EspStation {
        wifi: BlockingWifi<EspWifi<'static>>,
    }

    impl EspStation {
        pub fn new(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: Option<EspDefaultNvsPartition>,
        ) -> Result<Self, EspError> {
            let wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), nvs)?, sysloop)?;
            Ok(Self { wifi })
        }
    }

    fn failed(e: EspError) -> ConnectivityError {
        warn!("wifi: {}", e);
        ConnectivityError::ConnectionFailed
    }

    impl StationDriver for EspStation {
        fn connect(&mut self, creds: &WifiCredentials) -> Result<(), ConnectivityError> {
            let config = Configuration::Client(ClientConfiguration {
                ssid: creds
                    .ssid()
                    .try_into()
                    .map_err(|_| ConnectivityError::InvalidSsid)?,
                password: creds
                    .password()
                    .try_into()
                    .map_err(|_| ConnectivityError::InvalidPassword)?,
                auth_method: if creds.is_open() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            });
            self.wifi.set_configuration(&config).map_err(failed)?;
            if !self.wifi.is_started().map_err(failed)? {
                self.wifi.start().map_err(failed)?;
            }
            self.wifi.connect().map_err(failed)?;
            self.wifi.wait_netif_up().map_err(failed)?;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }

        fn disable_power_save(&mut self) {
            // SAFETY: plain driver call on a started station.
            let rc = unsafe { esp_wifi_set_ps(wifi_ps_type_t_WIFI_PS_NONE) };
            if rc != 0 {
                warn!("wifi: power save disable returned {}", rc);
            }
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::EspStation;

/// Scripted station for host tests.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimStation {
    /// Joins that fail before one succeeds.
    pub failures_before_join: u32,
    pub connected: bool,
    pub join_attempts: u32,
    pub power_save_disabled: bool,
}

#[cfg(not(target_os = "espidf"))]
impl StationDriver for SimStation {
    fn connect(&mut self, creds: &WifiCredentials) -> Result<(), ConnectivityError> {
        self.join_attempts += 1;
        if self.failures_before_join > 0 {
            self.failures_before_join -= 1;
            warn!("wifi(sim): join '{}' failed", creds.ssid());
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disable_power_save(&mut self) {
        self.power_save_disabled = true;
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    Reconnecting { attempt: u32 },
}

pub struct WifiLink<D: StationDriver> {
    driver: D,
    creds: WifiCredentials,
    state: WifiState,
    backoff_secs: u32,
    link: LinkReady,
}

impl<D: StationDriver> WifiLink<D> {
    pub fn new(driver: D, creds: WifiCredentials, link: LinkReady) -> Self {
        link.set(false);
        Self {
            driver,
            creds,
            state: WifiState::Disconnected,
            backoff_secs: INITIAL_BACKOFF_SECS,
            link,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn link(&self) -> &LinkReady {
        &self.link
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Make one step of progress and return how long to wait before the
    /// next call.
    pub fn poll(&mut self) -> Duration {
        match self.state {
            WifiState::Disconnected => self.join(0),
            WifiState::Reconnecting { attempt } => self.join(attempt),
            WifiState::Connected => {
                if self.driver.is_connected() {
                    return LINK_CHECK_PERIOD;
                }
                warn!("wifi: link lost, reconnecting in {}s", self.backoff_secs);
                self.link.set(false);
                self.state = WifiState::Reconnecting { attempt: 0 };
                self.next_backoff()
            }
        }
    }

    /// Poll until `stop` is set.  Runs on its own thread in the firmware.
    pub fn run(mut self, stop: &AtomicBool) {
        while !stop.load(Ordering::Acquire) {
            let wait = self.poll();
            pause(wait, LINK_CHECK_PERIOD, stop);
        }
        self.link.set(false);
    }

    fn join(&mut self, attempt: u32) -> Duration {
        info!("wifi: joining '{}' (attempt {})", self.creds.ssid(), attempt + 1);
        match self.driver.connect(&self.creds) {
            Ok(()) => {
                self.driver.disable_power_save();
                self.state = WifiState::Connected;
                self.backoff_secs = INITIAL_BACKOFF_SECS;
                self.link.set(true);
                info!("wifi: link up");
                LINK_CHECK_PERIOD
            }
            Err(e) => {
                warn!("wifi: join failed: {} (retry in {}s)", e, self.backoff_secs);
                self.link.set(false);
                self.state = WifiState::Reconnecting {
                    attempt: attempt + 1,
                };
                self.next_backoff()
            }
        }
    }

    /// Current backoff as a wait, then double it for next time.
    fn next_backoff(&mut self) -> Duration {
        let wait = Duration::from_secs(u64::from(self.backoff_secs));
        self.backoff_secs = (self.backoff_secs * 2).min(MAX_BACKOFF_SECS);
        wait
    }
}

/// Sleep for `wait` in `slice` steps, returning early once `stop` is set.
fn pause(wait: Duration, slice: Duration, stop: &AtomicBool) {
    let mut left = wait;
    while !left.is_zero() && !stop.load(Ordering::Acquire) {
        let step = left.min(slice);
        std::thread::sleep(step);
        left -= step;
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
