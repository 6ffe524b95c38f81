//! edgenode firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   EepromStore   Esp32Time      │
//! │  (Sensor+Actuator) (EventSink)    (ByteStore)   (ClockPort)    │
//! │  WifiAdapter       MqttAdapter    HwEntropy                    │
//! │  (LinkPort)        (BrokerPort)   (EntropyPort)                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              ControlLoop (pure logic)                  │    │
//! │  │  Link · Session · Dispatch · Telemetry · Indicator     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals as Board;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use edgenode::adapters::entropy::HwEntropy;
use edgenode::adapters::hardware::HardwareAdapter;
use edgenode::adapters::log_sink::LogEventSink;
use edgenode::adapters::mqtt::MqttAdapter;
use edgenode::adapters::nvs::EepromStore;
use edgenode::adapters::time::Esp32TimeAdapter;
use edgenode::adapters::wifi::WifiAdapter;
use edgenode::app::persistence::PersistenceGateway;
use edgenode::app::ports::{ClockPort, Platform};
use edgenode::app::service::{ControlLoop, Peripherals};
use edgenode::config::DeviceConfig;
use edgenode::diagnostics;
use edgenode::drivers::hw_init;
use edgenode::drivers::output::GpioOutput;
use edgenode::pins;

/// The adapter set for a real ESP32 board.
struct Esp32;

impl Platform for Esp32 {
    type Link = WifiAdapter;
    type Broker = MqttAdapter;
    type Hardware = HardwareAdapter<GpioOutput, GpioOutput>;
    type Store = EepromStore;
    type Entropy = HwEntropy;
    type Clock = Esp32TimeAdapter;
    type Sink = LogEventSink;
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  edgenode v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    diagnostics::install_panic_handler();

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}, halting", e);
        return Err(e.into());
    }

    let board = Board::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let config = DeviceConfig::default();
    let clock = Esp32TimeAdapter::new();

    let store = EepromStore::new().map_err(|e| anyhow::anyhow!("EEPROM init failed: {}", e))?;
    if config.wifi_ssid.is_empty() {
        warn!("no WiFi SSID configured; set EDGENODE_WIFI_SSID at build time");
    }

    let link = WifiAdapter::new(
        board.modem,
        sysloop,
        Some(nvs_partition),
        config.wifi_ssid,
        config.wifi_password,
    )?;

    let hw = HardwareAdapter::new(
        pins::AD1_ADC_CHANNEL,
        GpioOutput::new(pins::IO1_GPIO),
        GpioOutput::new(pins::STATUS_LED_GPIO),
    );

    let mut peripherals = Peripherals::<Esp32> {
        link,
        broker: MqttAdapter::new(),
        hw,
        persistence: PersistenceGateway::new(store),
        entropy: HwEntropy::new(),
        sink: LogEventSink::new(),
        clock,
    };

    // ── 3. Boot + run ─────────────────────────────────────────
    let mut control = ControlLoop::new(config, peripherals.clock.now_ms())?;
    control.boot(&mut peripherals);
    info!("System ready. Entering control loop.");
    control.run(&mut peripherals)
}
