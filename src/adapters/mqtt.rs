//! MQTT client adapter.
//!
//! Implements [`BrokerPort`].  Inbound messages land in an [`Inbox`] shared
//! with the client's event callback and are drained by the control loop on
//! its own thread, so dispatch never runs inside the client library.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`,
//!   rebuilt on every connect attempt because the client id changes.
//! - **all other targets**: an in-memory broker that records publishes and
//!   loops them back to matching subscriptions, like a real broker would.

use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use crate::app::ports::{BrokerPort, ConnectOptions, InboundMessage, QoS};
use crate::error::{PublishError, SessionError};

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    hal::delay::FreeRtos,
    mqtt::client::{
        Details, EspMqttClient, EventPayload, MqttClientConfiguration, QoS as EspQoS,
    },
};

/// Messages held between two loop ticks.
pub const INBOX_DEPTH: usize = 8;

#[cfg(target_os = "espidf")]
const CONNACK_POLL_MS: u32 = 50;

// ───────────────────────────────────────────────────────────────
// Inbox
// ───────────────────────────────────────────────────────────────

/// Bounded FIFO between the client callback and the control loop.
///
/// Oversized messages and messages arriving while the queue is full are
/// dropped with a warning.
#[derive(Clone, Default)]
pub struct Inbox(Arc<Mutex<heapless::Deque<InboundMessage, INBOX_DEPTH>>>);

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, heapless::Deque<InboundMessage, INBOX_DEPTH>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a message; returns `false` if it was dropped.
    pub fn push(&self, topic: &str, payload: &[u8]) -> bool {
        let Some(msg) = InboundMessage::new(topic, payload) else {
            warn!(
                "MQTT: dropping oversized message on {} ({} bytes)",
                topic,
                payload.len()
            );
            return false;
        };
        if self.queue().push_back(msg).is_err() {
            warn!("MQTT: inbox full, dropping message on {}", topic);
            return false;
        }
        true
    }

    pub fn pop(&self) -> Option<InboundMessage> {
        self.queue().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.queue().clear();
    }
}

// ───────────────────────────────────────────────────────────────
// MQTT adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    inbox: Inbox,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    connected: Arc<AtomicBool>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

/// In-memory broker state.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimBroker {
    reachable: bool,
    connected: bool,
    reject_subscribe: bool,
    subscriptions: Vec<String>,
    published: Vec<(String, Vec<u8>)>,
    client_ids: Vec<String>,
}

impl Default for MqttAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MqttAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {
            inbox: Inbox::new(),
            client: None,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// In-memory broker, reachable.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            inbox: Inbox::new(),
            sim: SimBroker {
                reachable: true,
                ..SimBroker::default()
            },
        }
    }

    // ── Simulation controls ───────────────────────────────────

    /// Make the broker (un)reachable.  Going unreachable drops the session.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_reachable(&mut self, reachable: bool) {
        self.sim.reachable = reachable;
        if !reachable {
            self.sim.connected = false;
        }
    }

    /// Refuse subscriptions while set.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_reject_subscribe(&mut self, reject: bool) {
        self.sim.reject_subscribe = reject;
    }

    /// Drop the session from the broker side.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_session(&mut self) {
        self.sim.connected = false;
        self.sim.subscriptions.clear();
    }

    /// Inject a message from another client.  Only delivered when the
    /// session is up and subscribed to `topic`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_deliver(&mut self, topic: &str, payload: &[u8]) -> bool {
        self.sim.connected
            && self.sim.subscriptions.iter().any(|t| t == topic)
            && self.inbox.push(topic, payload)
    }

    /// Every successful publish, oldest first.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_published(&self) -> &[(String, Vec<u8>)] {
        &self.sim.published
    }

    /// Publishes on `topic`, oldest first.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_published_on<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.sim
            .published
            .iter()
            .filter(move |(t, _)| t == topic)
            .map(|(_, p)| p.as_slice())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_subscriptions(&self) -> &[String] {
        &self.sim.subscriptions
    }

    /// Client id of every connect attempt, successful or not.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_client_ids(&self) -> &[String] {
        &self.sim.client_ids
    }
}

#[cfg(target_os = "espidf")]
impl BrokerPort for MqttAdapter {
    fn connect(
        &mut self,
        options: &ConnectOptions<'_>,
        timeout_ms: u32,
    ) -> Result<(), SessionError> {
        self.disconnect();
        self.inbox.clear();

        let url = format!("mqtt://{}:{}", options.host, options.port);
        let conf = MqttClientConfiguration {
            client_id: Some(options.client_id),
            username: options.username,
            password: options.password,
            keep_alive_interval: Some(core::time::Duration::from_secs(u64::from(
                options.keep_alive_secs,
            ))),
            disable_clean_session: false,
            ..Default::default()
        };

        let inbox = self.inbox.clone();
        let connected = self.connected.clone();
        let client = EspMqttClient::new_cb(&url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => connected.store(true, Ordering::Release),
            EventPayload::Disconnected => connected.store(false, Ordering::Release),
            EventPayload::Received {
                topic: Some(topic),
                data,
                details: Details::Complete,
                ..
            } => {
                inbox.push(topic, data);
            }
            EventPayload::Received { .. } => {
                warn!("MQTT: dropping fragmented message");
            }
            EventPayload::Error(e) => warn!("MQTT: client error: {:?}", e),
            _ => {}
        })
        .map_err(|e| {
            warn!("MQTT: client create failed: {}", e);
            SessionError::ConnectFailed
        })?;
        self.client = Some(client);

        let mut waited = 0;
        while !self.connected.load(Ordering::Acquire) {
            if waited >= timeout_ms {
                self.disconnect();
                return Err(SessionError::Timeout);
            }
            FreeRtos::delay_ms(CONNACK_POLL_MS);
            waited += CONNACK_POLL_MS;
        }
        info!("MQTT: connected to {} as {}", url, options.client_id);
        Ok(())
    }

    fn disconnect(&mut self) {
        // Dropping the client stops its task and closes the socket.
        self.client = None;
        self.connected.store(false, Ordering::Release);
    }

    fn is_connected(&self) -> bool {
        self.client.is_some() && self.connected.load(Ordering::Acquire)
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        let client = self.client.as_mut().ok_or(SessionError::LinkDown)?;
        client.subscribe(topic, EspQoS::AtMostOnce).map_err(|e| {
            warn!("MQTT: subscribe {} failed: {}", topic, e);
            SessionError::SubscribeFailed
        })?;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<(), PublishError> {
        if !self.is_connected() {
            return Err(PublishError::NotConnected);
        }
        let client = self.client.as_mut().ok_or(PublishError::NotConnected)?;
        let qos = match qos {
            QoS::AtMostOnce => EspQoS::AtMostOnce,
        };
        client
            .publish(topic, qos, false, payload)
            .map(|_| ())
            .map_err(|_| PublishError::Rejected)
    }

    fn poll(&mut self) -> usize {
        // The client runs its own task; nothing to service here.
        self.inbox.len()
    }

    fn take_message(&mut self) -> Option<InboundMessage> {
        self.inbox.pop()
    }
}

#[cfg(not(target_os = "espidf"))]
impl BrokerPort for MqttAdapter {
    fn connect(
        &mut self,
        options: &ConnectOptions<'_>,
        _timeout_ms: u32,
    ) -> Result<(), SessionError> {
        self.sim.client_ids.push(options.client_id.to_owned());
        self.sim.connected = false;
        self.sim.subscriptions.clear();
        self.inbox.clear();
        if !self.sim.reachable {
            return Err(SessionError::ConnectFailed);
        }
        self.sim.connected = true;
        info!("MQTT(sim): connected as {}", options.client_id);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.sim.connected = false;
        self.sim.subscriptions.clear();
    }

    fn is_connected(&self) -> bool {
        self.sim.connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        if !self.sim.connected {
            return Err(SessionError::LinkDown);
        }
        if self.sim.reject_subscribe {
            return Err(SessionError::SubscribeFailed);
        }
        if !self.sim.subscriptions.iter().any(|t| t == topic) {
            self.sim.subscriptions.push(topic.to_owned());
        }
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], _qos: QoS) -> Result<(), PublishError> {
        if !self.sim.connected {
            return Err(PublishError::NotConnected);
        }
        self.sim.published.push((topic.to_owned(), payload.to_vec()));
        if self.sim.subscriptions.iter().any(|t| t == topic) {
            self.inbox.push(topic, payload);
        }
        Ok(())
    }

    fn poll(&mut self) -> usize {
        self.inbox.len()
    }

    fn take_message(&mut self) -> Option<InboundMessage> {
        self.inbox.pop()
    }
}
