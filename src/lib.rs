//! edgenode firmware library.
//!
//! Exposes the control loop, its ports and the host-side adapters for
//! integration testing.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod connectivity;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod scheduler;
