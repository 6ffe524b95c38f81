//! Mutable device state owned by the control loop.
//!
//! Nothing here is global; the [`ControlLoop`](super::service::ControlLoop)
//! owns one [`DeviceContext`] and lends it to each component per tick.

use crate::config::DeviceConfig;
use crate::drivers::indicator::IndicatorDriver;

/// Current IO1 level.  Mutated only by the command dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorState {
    pub value: bool,
}

/// Run-time diagnostics.  Monotonic, never reset during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetryCounters {
    /// Every message delivered on any subscribed topic.
    pub messages_received: u32,
    /// Measurement publishes that the client accepted.
    pub telemetry_published: u32,
    /// Loop-driven link attempts.
    pub link_reconnects: u32,
    /// Loop-driven session attempts.
    pub session_reconnects: u32,
    /// Status publishes that the client accepted.
    pub status_published: u32,
    /// Control payloads dropped as malformed.
    pub decode_failures: u32,
}

pub struct DeviceContext {
    pub actuator: ActuatorState,
    pub counters: TelemetryCounters,
    pub indicator: IndicatorDriver,
    /// Clock reading at boot; uptime is measured from here.
    pub boot_ms: u64,
}

impl DeviceContext {
    pub fn new(config: &DeviceConfig, boot_ms: u64) -> Self {
        Self {
            actuator: ActuatorState::default(),
            counters: TelemetryCounters::default(),
            indicator: IndicatorDriver::from_config(config),
            boot_ms,
        }
    }

    pub fn uptime_secs(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.boot_ms) / 1000
    }
}
