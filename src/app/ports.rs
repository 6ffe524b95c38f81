//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (radio, broker client, ADC/GPIO, flash, clock) implement
//! these traits.  The [`ControlLoop`](super::service::ControlLoop) consumes
//! them via generics, so the domain core never touches hardware directly.
//!
//! The two connect calls are the only places allowed to block, and both take
//! an explicit timeout.

use core::net::Ipv4Addr;

use crate::error::{LinkError, PublishError, SessionError, StorageError};

/// Fixed-capacity topic name.
pub type Topic = heapless::String<64>;

/// Largest inbound payload the broker adapter will queue.
pub const MAX_INBOUND_PAYLOAD: usize = 256;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the single analog input.
pub trait SensorPort {
    /// Raw ADC sample from AD1.
    fn read_analog(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the actuator line and the indicator line.
pub trait ActuatorPort {
    /// Drive IO1.
    fn set_output(&mut self, high: bool);

    /// Drive the status LED.
    fn set_indicator(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock plus a cooperative delay.
pub trait ClockPort {
    fn now_ms(&self) -> u64;

    fn sleep_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Entropy port
// ───────────────────────────────────────────────────────────────

/// Source of the per-attempt client identifier suffix.
pub trait EntropyPort {
    fn next_u16(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Byte store (driven adapter: domain ↔ EEPROM emulation)
// ───────────────────────────────────────────────────────────────

/// Byte-addressable non-volatile store.
///
/// Writes are staged until [`commit`](ByteStore::commit); only committed
/// bytes survive a restart.
pub trait ByteStore {
    fn read(&self, offset: usize) -> Result<u8, StorageError>;

    fn write(&mut self, offset: usize, value: u8) -> Result<(), StorageError>;

    fn commit(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: domain ↔ WiFi station)
// ───────────────────────────────────────────────────────────────

pub trait LinkPort {
    /// One bounded association attempt.
    fn connect(&mut self, timeout_ms: u32) -> Result<(), LinkError>;

    /// Drop any half-open association before a fresh attempt.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Signal strength of the current association in dBm.
    fn rssi(&self) -> Option<i8>;

    fn local_ip(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Broker port (driven adapter: domain ↔ MQTT client)
// ───────────────────────────────────────────────────────────────

/// Delivery guarantee requested for an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QoS {
    AtMostOnce,
}

/// Parameters for one broker connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions<'a> {
    pub host: &'a str,
    pub port: u16,
    pub client_id: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub keep_alive_secs: u16,
}

/// A message received on a subscribed topic, queued until the loop drains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: Topic,
    pub payload: heapless::Vec<u8, MAX_INBOUND_PAYLOAD>,
}

impl InboundMessage {
    /// Copy topic and payload into fixed-capacity storage.
    /// Returns `None` when either does not fit.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = Topic::new();
        t.push_str(topic).ok()?;
        let payload = heapless::Vec::from_slice(payload).ok()?;
        Some(Self { topic: t, payload })
    }
}

pub trait BrokerPort {
    /// One bounded connect attempt.
    fn connect(&mut self, options: &ConnectOptions<'_>, timeout_ms: u32)
    -> Result<(), SessionError>;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError>;

    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<(), PublishError>;

    /// Service the client library and return how many inbound messages are
    /// waiting.
    fn poll(&mut self) -> usize;

    /// Oldest queued inbound message, in arrival order.
    fn take_message(&mut self) -> Option<InboundMessage>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Platform bundle
// ───────────────────────────────────────────────────────────────

/// Names the concrete adapter for every port, so the control loop can be
/// generic over one parameter instead of seven.
pub trait Platform {
    type Link: LinkPort;
    type Broker: BrokerPort;
    type Hardware: SensorPort + ActuatorPort;
    type Store: ByteStore;
    type Entropy: EntropyPort;
    type Clock: ClockPort;
    type Sink: EventSink;
}
