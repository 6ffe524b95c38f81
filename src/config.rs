//! Device configuration.
//!
//! Everything here is a compile-time constant: there is no runtime
//! configuration surface.  Credentials and broker address can be overridden
//! at build time through `EDGENODE_*` environment variables; everything else
//! is fixed for the board.

use serde::Serialize;

use crate::error::Error;

const fn env_or(value: Option<&'static str>, default: &'static str) -> &'static str {
    match value {
        Some(v) => v,
        None => default,
    }
}

// --- Network credentials ---
pub const WIFI_SSID: &str = env_or(option_env!("EDGENODE_WIFI_SSID"), "YourWiFiSSID");
pub const WIFI_PASSWORD: &str = env_or(option_env!("EDGENODE_WIFI_PASSWORD"), "YourWiFiPassword");

// --- Broker ---
pub const MQTT_BROKER: &str = env_or(option_env!("EDGENODE_MQTT_BROKER"), "192.168.1.100");
pub const MQTT_PORT: u16 = 1883;
/// Client identifier prefix; a random hex suffix is appended per attempt.
pub const MQTT_CLIENT_ID: &str = "ESP32_Device";
/// Empty means "connect without credentials".
pub const MQTT_USERNAME: &str = env_or(option_env!("EDGENODE_MQTT_USERNAME"), "");
pub const MQTT_PASSWORD: &str = env_or(option_env!("EDGENODE_MQTT_PASSWORD"), "");
pub const MQTT_KEEPALIVE_SECS: u16 = 60;

// --- Topics ---
pub const TOPIC_MEASUREMENT: &str = "esp32/ad1/data";
pub const TOPIC_CONTROL: &str = "esp32/io1/control";
pub const TOPIC_STATUS: &str = "esp32/status";

// --- Timing (ms) ---
pub const DATA_UPLOAD_INTERVAL_MS: u32 = 5_000;
pub const STATUS_INTERVAL_MS: u32 = 30_000;
pub const LINK_RETRY_INTERVAL_MS: u32 = 5_000;
pub const SESSION_RETRY_INTERVAL_MS: u32 = 5_000;
pub const LINK_CONNECT_TIMEOUT_MS: u32 = 5_000;
pub const SESSION_CONNECT_TIMEOUT_MS: u32 = 5_000;
pub const LOOP_PERIOD_MS: u32 = 100;

// --- Boot link pass ---
pub const MAX_LINK_RETRY: u32 = 20;
pub const BOOT_LINK_RETRY_PAUSE_MS: u32 = 500;

// --- Indicator ---
pub const FAST_BLINK_MS: u32 = 200;
pub const SLOW_BLINK_MS: u32 = 1_000;

// --- Payloads / storage ---
pub const JSON_BUFFER_BYTES: usize = 200;
pub const EEPROM_SIZE: usize = 512;
/// Validity marker written at offset 0 of the store.
pub const CONFIG_SENTINEL: u8 = 0xAA;

/// Snapshot of the compile-time configuration, handed to the control loop
/// and logged at boot.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceConfig {
    // --- Link ---
    pub wifi_ssid: &'static str,
    #[serde(skip)]
    pub wifi_password: &'static str,
    pub max_link_retry: u32,
    pub boot_link_retry_pause_ms: u32,
    pub link_retry_interval_ms: u32,
    pub link_connect_timeout_ms: u32,

    // --- Session ---
    pub broker_host: &'static str,
    pub broker_port: u16,
    pub client_id_prefix: &'static str,
    pub username: &'static str,
    #[serde(skip)]
    pub password: &'static str,
    pub keep_alive_secs: u16,
    pub session_retry_interval_ms: u32,
    pub session_connect_timeout_ms: u32,

    // --- Topics ---
    pub control_topic: &'static str,
    pub measurement_topic: &'static str,
    pub status_topic: &'static str,

    // --- Schedule ---
    pub upload_interval_ms: u32,
    pub status_interval_ms: u32,
    pub loop_period_ms: u32,

    // --- Indicator ---
    pub fast_blink_ms: u32,
    pub slow_blink_ms: u32,

    // --- Decode ---
    pub json_budget: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: WIFI_SSID,
            wifi_password: WIFI_PASSWORD,
            max_link_retry: MAX_LINK_RETRY,
            boot_link_retry_pause_ms: BOOT_LINK_RETRY_PAUSE_MS,
            link_retry_interval_ms: LINK_RETRY_INTERVAL_MS,
            link_connect_timeout_ms: LINK_CONNECT_TIMEOUT_MS,

            broker_host: MQTT_BROKER,
            broker_port: MQTT_PORT,
            client_id_prefix: MQTT_CLIENT_ID,
            username: MQTT_USERNAME,
            password: MQTT_PASSWORD,
            keep_alive_secs: MQTT_KEEPALIVE_SECS,
            session_retry_interval_ms: SESSION_RETRY_INTERVAL_MS,
            session_connect_timeout_ms: SESSION_CONNECT_TIMEOUT_MS,

            control_topic: TOPIC_CONTROL,
            measurement_topic: TOPIC_MEASUREMENT,
            status_topic: TOPIC_STATUS,

            upload_interval_ms: DATA_UPLOAD_INTERVAL_MS,  // 0.2 Hz
            status_interval_ms: STATUS_INTERVAL_MS,       // 1/30 s
            loop_period_ms: LOOP_PERIOD_MS,               // 10 Hz

            fast_blink_ms: FAST_BLINK_MS,
            slow_blink_ms: SLOW_BLINK_MS,

            json_budget: JSON_BUFFER_BYTES,
        }
    }
}

impl DeviceConfig {
    /// Reject timing that would make the loop misbehave.
    pub fn validate(&self) -> Result<(), Error> {
        if self.loop_period_ms == 0 {
            return Err(Error::Config("loop period must be non-zero"));
        }
        if self.upload_interval_ms == 0 || self.status_interval_ms == 0 {
            return Err(Error::Config("publish intervals must be non-zero"));
        }
        if self.loop_period_ms >= self.upload_interval_ms {
            return Err(Error::Config("loop period must be shorter than upload interval"));
        }
        if self.fast_blink_ms == 0 || self.fast_blink_ms >= self.slow_blink_ms {
            return Err(Error::Config("fast blink must be shorter than slow blink"));
        }
        if self.max_link_retry == 0 {
            return Err(Error::Config("boot link pass needs at least one attempt"));
        }
        if self.broker_host.is_empty() {
            return Err(Error::Config("broker host is empty"));
        }
        if self.json_budget == 0 {
            return Err(Error::Config("JSON budget must be non-zero"));
        }
        Ok(())
    }

    /// Username to present to the broker, if any.
    pub fn credentials(&self) -> (Option<&'static str>, Option<&'static str>) {
        let user = (!self.username.is_empty()).then_some(self.username);
        let pass = (!self.password.is_empty()).then_some(self.password);
        (user, pass)
    }
}
