//! Telemetry publisher.
//!
//! Builds the measurement, status and confirmation payloads and hands them
//! to the broker at QoS 0.  Every publish is fire-and-forget: a failure is
//! reported through the event sink and returned for the caller's
//! information, but nothing retries it.  The next scheduled publish
//! supersedes it.

use core::fmt::Write as _;

use log::debug;

use super::context::DeviceContext;
use super::events::AppEvent;
use super::messages::{Confirmation, Measurement, OutboundMessage, Status};
use super::ports::{BrokerPort, EventSink, LinkPort, Topic};
use crate::config::DeviceConfig;
use crate::error::PublishError;

pub const AD1_CHANNEL: &str = "AD1";
pub const IO1_CHANNEL: &str = "IO1";
pub const ADC_UNIT: &str = "ADC";

/// Status label published whenever a session is (re)established.
pub const STATUS_ONLINE: &str = "online";
/// Status label published on the periodic status interval.
pub const STATUS_RUNNING: &str = "running";

pub struct TelemetryPublisher {
    device_id: &'static str,
    measurement_topic: &'static str,
    status_topic: &'static str,
    control_topic: &'static str,
}

impl TelemetryPublisher {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            device_id: config.client_id_prefix,
            measurement_topic: config.measurement_topic,
            status_topic: config.status_topic,
            control_topic: config.control_topic,
        }
    }

    /// Publish one AD1 sample with the current IO1 level and link quality.
    pub fn publish_measurement(
        &self,
        now_ms: u64,
        sample: u16,
        ctx: &mut DeviceContext,
        link: &impl LinkPort,
        broker: &mut impl BrokerPort,
        sink: &mut impl EventSink,
    ) -> Result<(), PublishError> {
        let body = Measurement {
            device_id: self.device_id,
            channel: AD1_CHANNEL,
            value: sample,
            unit: ADC_UNIT,
            timestamp: now_ms,
            io1_state: ctx.actuator.value,
            wifi_rssi: rssi_or_zero(link),
            uptime: ctx.uptime_secs(now_ms),
        };
        self.send(self.measurement_topic, &body, broker, sink)?;
        ctx.counters.telemetry_published += 1;
        Ok(())
    }

    /// Publish a status report carrying `label`.
    pub fn publish_status(
        &self,
        now_ms: u64,
        label: &str,
        ctx: &mut DeviceContext,
        link: &impl LinkPort,
        broker: &mut impl BrokerPort,
        sink: &mut impl EventSink,
    ) -> Result<(), PublishError> {
        let body = Status {
            device_id: self.device_id,
            status: label,
            timestamp: now_ms,
            ip: ip_string(link),
            io1_state: ctx.actuator.value,
            uptime: ctx.uptime_secs(now_ms),
            wifi_rssi: rssi_or_zero(link),
        };
        self.send(self.status_topic, &body, broker, sink)?;
        ctx.counters.status_published += 1;
        Ok(())
    }

    /// Echo an applied IO1 level on the control topic.
    pub fn publish_confirmation(
        &self,
        now_ms: u64,
        state: bool,
        broker: &mut impl BrokerPort,
        sink: &mut impl EventSink,
    ) -> Result<(), PublishError> {
        let body = Confirmation {
            device_id: self.device_id,
            channel: IO1_CHANNEL,
            state,
            timestamp: now_ms,
        };
        self.send(self.control_topic, &body, broker, sink)
    }

    fn send<T: serde::Serialize>(
        &self,
        topic: &str,
        body: &T,
        broker: &mut impl BrokerPort,
        sink: &mut impl EventSink,
    ) -> Result<(), PublishError> {
        let result = if broker.is_connected() {
            OutboundMessage::encode(topic, body)
                .and_then(|msg| broker.publish(msg.topic, &msg.payload, msg.qos))
        } else {
            Err(PublishError::NotConnected)
        };

        match result {
            Ok(()) => debug!("publish: {} ok", topic),
            Err(error) => {
                let mut t = Topic::new();
                let _ = t.push_str(topic);
                sink.emit(&AppEvent::PublishFailed { topic: t, error });
            }
        }
        result
    }
}

fn rssi_or_zero(link: &impl LinkPort) -> i32 {
    link.rssi().map_or(0, i32::from)
}

fn ip_string(link: &impl LinkPort) -> heapless::String<16> {
    let mut s = heapless::String::new();
    let ip = link.local_ip().unwrap_or(core::net::Ipv4Addr::UNSPECIFIED);
    // "255.255.255.255" is 15 bytes, always fits.
    let _ = write!(s, "{}", ip);
    s
}
