//! Application core: domain logic behind the port traits.
//!
//! Command decoding, actuator persistence, telemetry payloads and the
//! control loop itself.  All interaction with hardware and the network
//! happens through the traits in [`ports`], so this layer runs unchanged
//! against mocks on the host.

pub mod commands;
pub mod context;
pub mod dispatcher;
pub mod events;
pub mod health;
pub mod messages;
pub mod persistence;
pub mod ports;
pub mod service;
pub mod telemetry;
