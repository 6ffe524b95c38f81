//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (UART / USB-CDC through `esp_idf_logger` in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Booted { actuator, restored } => {
                info!(
                    "BOOT  | io1={} | source={}",
                    if *actuator { "ON" } else { "OFF" },
                    if *restored { "stored" } else { "default" },
                );
            }
            AppEvent::LinkUp => info!("LINK  | up"),
            AppEvent::LinkDown(e) => warn!("LINK  | down: {}", e),
            AppEvent::SessionUp { client_id } => {
                info!("MQTT  | connected as {}", client_id);
            }
            AppEvent::SessionDown(e) => warn!("MQTT  | down: {}", e),
            AppEvent::ActuatorChanged(on) => {
                info!("IO1   | -> {}", if *on { "ON" } else { "OFF" });
            }
            AppEvent::DecodeFailed(e) => warn!("CTRL  | dropped payload: {}", e),
            AppEvent::PublishFailed { topic, error } => {
                warn!("PUB   | {} failed: {}", topic, error);
            }
            AppEvent::HealthChanged { from, to } => {
                info!("HEALTH| {:?} -> {:?}", from, to);
            }
        }
    }
}
