//! Command dispatcher for the control topic.
//!
//! Applying a changed IO1 level is a fixed sequence:
//!
//! 1. update [`ActuatorState`](super::context::ActuatorState)
//! 2. drive the IO1 output
//! 3. mirror the level on the indicator
//! 4. persist (write-through)
//! 5. publish a confirmation on the control topic
//!
//! A command that matches the current level does none of these.

use log::{debug, warn};

use super::commands::{ControlDecode, decode_control};
use super::context::DeviceContext;
use super::events::AppEvent;
use super::persistence::PersistenceGateway;
use super::ports::{ActuatorPort, BrokerPort, ByteStore, EventSink};
use super::telemetry::TelemetryPublisher;
use crate::config::DeviceConfig;
use crate::error::DecodeError;

/// What [`CommandDispatcher::on_message`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not the control topic.
    Ignored,
    /// Dropped as malformed.
    Malformed(DecodeError),
    /// Decoded, but IO1 already had this level.
    Unchanged(bool),
    /// IO1 changed to this level.
    Applied(bool),
}

pub struct CommandDispatcher {
    control_topic: &'static str,
    json_budget: usize,
}

impl CommandDispatcher {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            control_topic: config.control_topic,
            json_budget: config.json_budget,
        }
    }

    /// Handle one inbound message.
    pub fn on_message<S: ByteStore>(
        &self,
        now_ms: u64,
        topic: &str,
        payload: &[u8],
        ctx: &mut DeviceContext,
        telemetry: &TelemetryPublisher,
        hw: &mut impl ActuatorPort,
        persistence: &mut PersistenceGateway<S>,
        broker: &mut impl BrokerPort,
        sink: &mut impl EventSink,
    ) -> DispatchOutcome {
        ctx.counters.messages_received += 1;
        debug!("inbound: {} ({} bytes)", topic, payload.len());

        if topic != self.control_topic {
            return DispatchOutcome::Ignored;
        }

        let desired = match decode_control(payload, self.json_budget) {
            ControlDecode::Ok { desired, .. } => desired,
            ControlDecode::Malformed(e) => {
                ctx.counters.decode_failures += 1;
                sink.emit(&AppEvent::DecodeFailed(e));
                return DispatchOutcome::Malformed(e);
            }
        };

        if desired == ctx.actuator.value {
            return DispatchOutcome::Unchanged(desired);
        }

        ctx.actuator.value = desired;
        hw.set_output(desired);
        ctx.indicator.mirror(desired);
        hw.set_indicator(desired);
        if let Err(e) = persistence.save(desired) {
            warn!("persistence: save failed: {}", e);
        }
        sink.emit(&AppEvent::ActuatorChanged(desired));
        // Failure already reported by the publisher.
        let _ = telemetry.publish_confirmation(now_ms, desired, broker, sink);

        DispatchOutcome::Applied(desired)
    }
}
