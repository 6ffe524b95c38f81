//! Broker session lifecycle (MQTT), layered on an established link.
//!
//! [`SessionManager`] owns [`SessionState`] exclusively.  It refuses to do
//! anything while the link is down and forces itself `Down` when it sees
//! the link has gone.  A session only counts as `Up` once the control topic
//! is subscribed.

use core::fmt::Write as _;

use log::debug;

use super::{RetryPolicy, Status};
use crate::app::context::TelemetryCounters;
use crate::app::ports::{BrokerPort, ConnectOptions, EntropyPort, Topic};
use crate::config::DeviceConfig;
use crate::error::SessionError;

/// Client identifier: configured prefix plus a per-attempt hex suffix.
pub type ClientId = heapless::String<48>;

/// Topics currently subscribed.
pub type Subscriptions = heapless::Vec<Topic, 4>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub status: Status,
    pub last_attempt_ms: Option<u64>,
    /// Consecutive failed attempts since the last success.
    pub retry_count: u32,
    pub subscriptions: Subscriptions,
    /// Identifier used by the most recent attempt.
    pub client_id: ClientId,
}

/// Result of one [`SessionManager::pump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pump {
    /// Inbound messages ready to drain, oldest first.
    pub pending: usize,
    /// The library reported a disconnect during this pass.
    pub dropped: bool,
}

/// Broker parameters, resolved once from [`DeviceConfig`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub host: &'static str,
    pub port: u16,
    pub client_id_prefix: &'static str,
    pub username: Option<&'static str>,
    pub password: Option<&'static str>,
    pub keep_alive_secs: u16,
    pub control_topic: &'static str,
    pub retry_interval_ms: u32,
    pub connect_timeout_ms: u32,
}

impl SessionSettings {
    pub fn from_config(config: &DeviceConfig) -> Self {
        let (username, password) = config.credentials();
        Self {
            host: config.broker_host,
            port: config.broker_port,
            client_id_prefix: config.client_id_prefix,
            username,
            password,
            keep_alive_secs: config.keep_alive_secs,
            control_topic: config.control_topic,
            retry_interval_ms: config.session_retry_interval_ms,
            connect_timeout_ms: config.session_connect_timeout_ms,
        }
    }
}

/// What a call to [`SessionManager::ensure_session`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Already up.
    Alive,
    /// Down, retry interval not yet elapsed.
    Waiting,
    /// Link is not up; session forced down, nothing attempted.
    LinkDown,
    /// Connected and subscribed.
    Established,
    /// The attempt failed.
    Failed(SessionError),
}

pub struct SessionManager {
    settings: SessionSettings,
    state: SessionState,
    policy: RetryPolicy,
}

impl SessionManager {
    pub fn new(config: &DeviceConfig) -> Self {
        let settings = SessionSettings::from_config(config);
        let policy = RetryPolicy::Periodic {
            interval_ms: settings.retry_interval_ms,
        };
        Self {
            settings,
            state: SessionState::default(),
            policy,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn client_id(&self) -> &str {
        &self.state.client_id
    }

    /// Open the session if it is down and the retry interval allows.
    ///
    /// Every attempt bumps `counters.session_reconnects`, successful or not.
    pub fn ensure_session(
        &mut self,
        now_ms: u64,
        link: Status,
        broker: &mut impl BrokerPort,
        entropy: &mut impl EntropyPort,
        counters: &mut TelemetryCounters,
    ) -> SessionOutcome {
        if !link.is_up() {
            self.force_down();
            return SessionOutcome::LinkDown;
        }
        if self.state.status.is_up() {
            return SessionOutcome::Alive;
        }
        if !self
            .policy
            .permits(self.state.retry_count, self.state.last_attempt_ms, now_ms)
        {
            return SessionOutcome::Waiting;
        }

        counters.session_reconnects += 1;
        self.attempt(now_ms, broker, entropy)
    }

    /// Boot-time single attempt.  Does not count towards
    /// `session_reconnects`.
    pub fn connect_initial(
        &mut self,
        now_ms: u64,
        link: Status,
        broker: &mut impl BrokerPort,
        entropy: &mut impl EntropyPort,
    ) -> SessionOutcome {
        if !link.is_up() {
            self.force_down();
            return SessionOutcome::LinkDown;
        }
        self.attempt(now_ms, broker, entropy)
    }

    fn attempt(
        &mut self,
        now_ms: u64,
        broker: &mut impl BrokerPort,
        entropy: &mut impl EntropyPort,
    ) -> SessionOutcome {
        self.state.last_attempt_ms = Some(now_ms);
        self.state.client_id = self.next_client_id(entropy);
        debug!(
            "session: attempt as {} (retry_count={})",
            self.state.client_id, self.state.retry_count
        );

        match self.open(broker) {
            Ok(()) => {
                self.state.status = Status::Up;
                self.state.retry_count = 0;
                SessionOutcome::Established
            }
            Err(e) => {
                self.state.status = Status::Down;
                self.state.subscriptions.clear();
                self.state.retry_count += 1;
                SessionOutcome::Failed(e)
            }
        }
    }

    fn open(&mut self, broker: &mut impl BrokerPort) -> Result<(), SessionError> {
        let options = ConnectOptions {
            host: self.settings.host,
            port: self.settings.port,
            client_id: &self.state.client_id,
            username: self.settings.username,
            password: self.settings.password,
            keep_alive_secs: self.settings.keep_alive_secs,
        };
        broker.connect(&options, self.settings.connect_timeout_ms)?;

        let topic = self.settings.control_topic;
        if let Err(e) = broker.subscribe(topic) {
            broker.disconnect();
            return Err(e);
        }

        if let Err(e) = self.record_subscription(topic) {
            broker.disconnect();
            return Err(e);
        }
        Ok(())
    }

    fn record_subscription(&mut self, topic: &str) -> Result<(), SessionError> {
        self.state.subscriptions.clear();
        let mut t = Topic::new();
        t.push_str(topic)
            .map_err(|_| SessionError::SubscribeFailed)?;
        self.state
            .subscriptions
            .push(t)
            .map_err(|_| SessionError::SubscribeFailed)
    }

    fn next_client_id(&self, entropy: &mut impl EntropyPort) -> ClientId {
        let mut id = ClientId::new();
        // Prefix is a compile-time constant well under capacity; a
        // truncated id is still a valid id.
        let _ = write!(id, "{}-{:x}", self.settings.client_id_prefix, entropy.next_u16());
        id
    }

    /// Mark the session down and forget subscriptions.  Used when the link
    /// is lost underneath it.
    pub fn force_down(&mut self) {
        self.state.status = Status::Down;
        self.state.subscriptions.clear();
    }

    /// Service the client library.
    ///
    /// Messages the library already delivered stay drainable even when it
    /// reports a disconnect in the same pass; the session is then `Down`.
    pub fn pump(&mut self, broker: &mut impl BrokerPort) -> Pump {
        if !self.state.status.is_up() {
            return Pump::default();
        }
        let pending = broker.poll();
        let dropped = !broker.is_connected();
        if dropped {
            self.force_down();
        }
        Pump { pending, dropped }
    }
}
