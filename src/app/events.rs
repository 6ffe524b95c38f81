//! Outbound application events.
//!
//! The [`ControlLoop`](super::service::ControlLoop) and the components it
//! drives emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them; the
//! firmware logs them to the serial console.

use crate::app::health::DeviceHealth;
use crate::app::ports::Topic;
use crate::connectivity::session::ClientId;
use crate::error::{DecodeError, LinkError, PublishError, SessionError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Boot finished loading persisted state and drove the output.
    Booted { actuator: bool, restored: bool },

    /// Network link established.
    LinkUp,

    /// Network link attempt failed or an established link dropped.
    LinkDown(LinkError),

    /// Broker session established and control topic subscribed.
    SessionUp { client_id: ClientId },

    /// Broker session attempt failed or an established session dropped.
    SessionDown(SessionError),

    /// A control command changed the actuator.
    ActuatorChanged(bool),

    /// An inbound control payload was rejected.
    DecodeFailed(DecodeError),

    /// A fire-and-forget publish did not go out.
    PublishFailed { topic: Topic, error: PublishError },

    /// Derived health moved between classes.
    HealthChanged { from: DeviceHealth, to: DeviceHealth },
}
