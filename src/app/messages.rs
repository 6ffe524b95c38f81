//! Outbound payloads.
//!
//! Field names and order are part of the wire contract with the backend.

use serde::Serialize;

use super::ports::QoS;
use crate::error::PublishError;

/// Periodic AD1 sample, published on the measurement topic.
#[derive(Debug, Clone, Serialize)]
pub struct Measurement<'a> {
    pub device_id: &'a str,
    pub channel: &'static str,
    pub value: u16,
    pub unit: &'static str,
    pub timestamp: u64,
    pub io1_state: bool,
    pub wifi_rssi: i32,
    pub uptime: u64,
}

/// Liveness report, published on the status topic.
#[derive(Debug, Clone, Serialize)]
pub struct Status<'a> {
    pub device_id: &'a str,
    pub status: &'a str,
    pub timestamp: u64,
    pub ip: heapless::String<16>,
    pub io1_state: bool,
    pub uptime: u64,
    pub wifi_rssi: i32,
}

/// Echo of an applied command, published on the control topic.
#[derive(Debug, Clone, Serialize)]
pub struct Confirmation<'a> {
    pub device_id: &'a str,
    pub channel: &'static str,
    pub state: bool,
    pub timestamp: u64,
}

/// A serialised message ready for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage<'a> {
    pub topic: &'a str,
    pub payload: Vec<u8>,
    pub qos: QoS,
}

impl<'a> OutboundMessage<'a> {
    pub fn encode<T: Serialize>(topic: &'a str, body: &T) -> Result<Self, PublishError> {
        let payload = serde_json::to_vec(body).map_err(|_| PublishError::Serialize)?;
        Ok(Self {
            topic,
            payload,
            qos: QoS::AtMostOnce,
        })
    }
}
