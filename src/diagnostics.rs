//! Boot-time system report and runtime counter summaries.
//!
//! On hardware the report reads chip, flash and heap figures from ESP-IDF;
//! in simulation it returns fixed synthetic values so the same logging
//! paths run on the host.

use log::{error, info};

use crate::app::context::TelemetryCounters;
use crate::config::DeviceConfig;

/// Static facts about the chip, gathered once at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemInfo {
    pub chip_model: u32,
    pub chip_revision: u16,
    pub cores: u8,
    pub flash_bytes: u32,
    pub heap_free: u32,
}

impl SystemInfo {
    #[cfg(target_os = "espidf")]
    pub fn collect() -> Self {
        use esp_idf_svc::sys::*;

        let mut chip: esp_chip_info_t = unsafe { core::mem::zeroed() };
        // SAFETY: fills a caller-owned struct, no other side effects.
        unsafe { esp_chip_info(&mut chip) };

        let mut flash_bytes: u32 = 0;
        // SAFETY: null selects the default flash chip.
        let ret = unsafe { esp_flash_get_size(core::ptr::null_mut(), &mut flash_bytes) };
        if ret != ESP_OK as i32 {
            flash_bytes = 0;
        }

        Self {
            chip_model: chip.model as u32,
            chip_revision: chip.revision as u16,
            cores: chip.cores as u8,
            flash_bytes,
            heap_free: unsafe { esp_get_free_heap_size() },
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn collect() -> Self {
        Self {
            chip_model: 1, // CHIP_ESP32
            chip_revision: 3,
            cores: 2,
            flash_bytes: 4 * 1024 * 1024,
            heap_free: 307_200,
        }
    }
}

/// Log the boot banner: chip facts plus the schedule and broker in use.
pub fn log_system_info(config: &DeviceConfig, sys: &SystemInfo) {
    info!("=== edgenode v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "chip: model={} rev={} cores={} flash={}MB heap_free={}KB",
        sys.chip_model,
        sys.chip_revision,
        sys.cores,
        sys.flash_bytes / 1024 / 1024,
        sys.heap_free / 1024,
    );
    info!(
        "upload every {} ms, status every {} ms, tick {} ms",
        config.upload_interval_ms, config.status_interval_ms, config.loop_period_ms
    );
    info!("broker: {}:{}", config.broker_host, config.broker_port);
}

/// One-line counter summary, logged next to each periodic status report.
pub fn log_counters(counters: &TelemetryCounters, uptime_secs: u64) {
    info!(
        "STATS | up={}s | rx={} | tx={} | status={} | wifi_retry={} | mqtt_retry={} | bad_cmd={}",
        uptime_secs,
        counters.messages_received,
        counters.telemetry_published,
        counters.status_published,
        counters.link_reconnects,
        counters.session_reconnects,
        counters.decode_failures,
    );
}

/// Route panics through the logger before the default abort/reset.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        match info.location() {
            Some(loc) => error!("PANIC: {} at {}:{}", reason, loc.file(), loc.line()),
            None => error!("PANIC: {}", reason),
        }
    }));
}
