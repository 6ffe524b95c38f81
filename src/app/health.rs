//! Aggregate device health, derived every tick from link and session status.

use crate::connectivity::Status;

/// Tri-state connectivity classification shown on the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceHealth {
    /// No network link.
    Disconnected,
    /// Link up, broker session down.
    LinkOnly,
    /// Link and session both up.
    Operational,
}

impl DeviceHealth {
    pub fn derive(link: Status, session: Status) -> Self {
        match (link, session) {
            (Status::Down, _) => Self::Disconnected,
            (Status::Up, Status::Down) => Self::LinkOnly,
            (Status::Up, Status::Up) => Self::Operational,
        }
    }
}
