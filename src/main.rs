//! TDS probe firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter              LogEventSink     UdpSink         │
//! │  (Clock+Power+Interval+Pulse) (EventSink)      (TelemetrySink) │
//! │  WifiLink (own thread, publishes LinkReady)                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ProbeService (pure logic)                   │    │
//! │  │  DutyCycle · FrequencyFilter · Flow · TDS model        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  GPIO ISRs ──▶ EDGE_TIMER / FLOW_COUNTER (static hand-off)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use core::sync::atomic::AtomicBool;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use tdsprobe::adapters::hardware::HardwareAdapter;
use tdsprobe::adapters::log_sink::LogEventSink;
use tdsprobe::adapters::udp::UdpSink;
use tdsprobe::adapters::wifi::{EspStation, LinkReady, WifiCredentials, WifiLink};
use tdsprobe::app::ports::TelemetrySink;
use tdsprobe::app::service::ProbeService;
use tdsprobe::config::{NetworkConfig, ProbeConfig};
use tdsprobe::drivers::hw_init;
use tdsprobe::drivers::sensor_power::SensorPowerSwitch;
use tdsprobe::drivers::watchdog::Watchdog;
use tdsprobe::error::Error;
use tdsprobe::pins;
use tdsprobe::scheduler;
use tdsprobe::sensors::{EDGE_TIMER, FLOW_COUNTER};

/// Never set on the board; the loop runs until reset.
static STOP: AtomicBool = AtomicBool::new(false);

const WIFI_STACK_SIZE: usize = 8 * 1024;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TDS probe v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = ProbeConfig::deployed();
    config.validate()?;
    let network = NetworkConfig::deployed();
    info!(
        "config: off {}s, warm-up {}s, measure {}s (period {}s), alpha {:.2}, filter {:?}",
        config.off_secs,
        config.warmup_secs,
        config.measure_secs(),
        config.cycle_secs(),
        config.alpha,
        config.filter_reset
    );

    // ── 3. Sensor lines and power switch ──────────────────────
    let peripherals = Peripherals::take()?;
    let power_pin = PinDriver::output(peripherals.pins.gpio16)?;
    let power = SensorPowerSwitch::new(power_pin);
    info!("sensor power on GPIO {} (held low)", pins::SENSOR_POWER_GPIO);
    hw_init::init_sensor_inputs().map_err(Error::from)?;
    let mut hw = HardwareAdapter::new(&EDGE_TIMER, &FLOW_COUNTER, power);

    // ── 4. Network ────────────────────────────────────────────
    let link = LinkReady::new();
    match WifiCredentials::new(network.ssid, network.password) {
        Ok(creds) => {
            let sysloop = EspSystemEventLoop::take()?;
            let nvs = EspDefaultNvsPartition::take().ok();
            let station = EspStation::new(peripherals.modem, sysloop, nvs)?;
            let wifi = WifiLink::new(station, creds, link.clone());
            std::thread::Builder::new()
                .name("wifi".into())
                .stack_size(WIFI_STACK_SIZE)
                .spawn(move || wifi.run(&STOP))?;
        }
        Err(e) => warn!("wifi disabled: {} (telemetry stays on the console)", e),
    }

    let mut udp = match UdpSink::bind(network.destination, link) {
        Ok(sink) => Some(sink),
        Err(e) => {
            warn!("udp sink disabled: {}", e);
            None
        }
    };
    let mut sinks: Vec<&mut dyn TelemetrySink> = udp
        .iter_mut()
        .map(|s| s as &mut dyn TelemetrySink)
        .collect();

    // ── 5. Sampling loop ──────────────────────────────────────
    let watchdog = Watchdog::default();
    let mut events = LogEventSink::new();
    let mut service = ProbeService::new(&config);

    scheduler::run(
        &mut service,
        &mut hw,
        &mut sinks,
        &mut events,
        &mut FreeRtos,
        config.tick_ms,
        &STOP,
        || watchdog.feed(),
    );

    Ok(())
}
