//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`], the hexagonal boundary for the network link.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//!   `connect` starts an association and polls for netif-up until the
//!   caller's timeout.
//! - **all other targets**: a simulated radio with injectable outages for
//!   host-side tests.

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::LinkPort;
use crate::error::LinkError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{delay::FreeRtos, modem::Modem},
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi},
};

#[cfg(target_os = "espidf")]
const NETIF_POLL_MS: u32 = 50;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// SSID must be 1–32 printable ASCII bytes.
pub fn validate_ssid(ssid: &str) -> Result<(), LinkError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(LinkError::NoCredentials);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimRadio,
}

/// Simulated radio state.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone)]
struct SimRadio {
    ap_in_range: bool,
    associated: bool,
    fail_next: u32,
    attempts: u32,
    rssi: i8,
    ip: Ipv4Addr,
}

impl WifiAdapter {
    /// Bring up the driver in station mode with the given credentials.
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        ssid: &str,
        password: &str,
    ) -> Result<Self, crate::error::Error> {
        use crate::error::Error;

        let mut wifi =
            EspWifi::new(modem, sysloop, nvs).map_err(|_| Error::Init("wifi driver"))?;

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPAWPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| Error::Config("wifi ssid too long"))?,
            password: password
                .try_into()
                .map_err(|_| Error::Config("wifi password too long"))?,
            auth_method,
            ..Default::default()
        }))
        .map_err(|_| Error::Init("wifi configuration"))?;
        wifi.start().map_err(|_| Error::Init("wifi start"))?;
        info!("WiFi: station started for \"{}\"", ssid);

        Ok(Self {
            ssid: Self::ssid_of(ssid),
            wifi,
        })
    }

    /// Simulated radio with the access point in range.
    #[cfg(not(target_os = "espidf"))]
    pub fn new(ssid: &str) -> Self {
        info!("WiFi(sim): radio for \"{}\"", ssid);
        Self {
            ssid: Self::ssid_of(ssid),
            sim: SimRadio {
                ap_in_range: true,
                associated: false,
                fail_next: 0,
                attempts: 0,
                rssi: -55,
                ip: Ipv4Addr::new(192, 168, 1, 77),
            },
        }
    }

    fn ssid_of(ssid: &str) -> heapless::String<32> {
        let mut s = heapless::String::new();
        if validate_ssid(ssid).is_ok() {
            let _ = s.push_str(ssid);
        }
        s
    }

    // ── Simulation controls ───────────────────────────────────

    /// Move the access point in or out of range.  Going out of range drops
    /// any association.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_ap_in_range(&mut self, in_range: bool) {
        self.sim.ap_in_range = in_range;
        if !in_range {
            self.sim.associated = false;
        }
    }

    /// Fail the next `n` attempts even with the AP in range.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_next(&mut self, n: u32) {
        self.sim.fail_next = n;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_attempts(&self) -> u32 {
        self.sim.attempts
    }
}

impl LinkPort for WifiAdapter {
    #[cfg(target_os = "espidf")]
    fn connect(&mut self, timeout_ms: u32) -> Result<(), LinkError> {
        if self.ssid.is_empty() {
            return Err(LinkError::NoCredentials);
        }
        if let Err(e) = self.wifi.connect() {
            warn!("WiFi: connect request failed: {}", e);
            return Err(LinkError::ConnectFailed);
        }

        let mut waited = 0;
        loop {
            if self.wifi.is_up().unwrap_or(false) {
                info!("WiFi: connected to \"{}\"", self.ssid);
                return Ok(());
            }
            if waited >= timeout_ms {
                let _ = self.wifi.disconnect();
                return Err(LinkError::Timeout);
            }
            FreeRtos::delay_ms(NETIF_POLL_MS);
            waited += NETIF_POLL_MS;
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn connect(&mut self, _timeout_ms: u32) -> Result<(), LinkError> {
        if self.ssid.is_empty() {
            return Err(LinkError::NoCredentials);
        }
        self.sim.attempts += 1;
        if self.sim.fail_next > 0 {
            self.sim.fail_next -= 1;
            warn!("WiFi(sim): simulated failure (attempt {})", self.sim.attempts);
            return Err(LinkError::ConnectFailed);
        }
        if !self.sim.ap_in_range {
            return Err(LinkError::Timeout);
        }
        self.sim.associated = true;
        info!("WiFi(sim): connected to \"{}\"", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn disconnect(&mut self) {
        // Errors when not associated; nothing to undo then.
        let _ = self.wifi.disconnect();
    }

    #[cfg(not(target_os = "espidf"))]
    fn disconnect(&mut self) {
        self.sim.associated = false;
    }

    #[cfg(target_os = "espidf")]
    fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_connected(&self) -> bool {
        self.sim.associated
    }

    #[cfg(target_os = "espidf")]
    fn rssi(&self) -> Option<i8> {
        use esp_idf_svc::sys::*;
        let mut ap_info: wifi_ap_record_t = unsafe { core::mem::zeroed() };
        // SAFETY: fills a caller-owned record; fails cleanly when not associated.
        let ret = unsafe { esp_wifi_sta_get_ap_info(&mut ap_info) };
        (ret == ESP_OK as i32).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn rssi(&self) -> Option<i8> {
        self.sim.associated.then_some(self.sim.rssi)
    }

    #[cfg(target_os = "espidf")]
    fn local_ip(&self) -> Option<Ipv4Addr> {
        let info = self.wifi.sta_netif().get_ip_info().ok()?;
        (!info.ip.is_unspecified()).then_some(info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.sim.associated.then_some(self.sim.ip)
    }
}
