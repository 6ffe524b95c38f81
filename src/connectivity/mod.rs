//! Connection lifecycle for the two stacked transports.
//!
//! ```text
//!   LinkManager  (WiFi station)
//!        │  Up
//!        ▼
//!   SessionManager (MQTT session, control topic subscribed)
//! ```
//!
//! The session layer never attempts work unless the link reports `Up`, and
//! is torn down before the link is judged down.

pub mod link;
pub mod session;

/// Binary status shared by both layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Down,
    Up,
}

impl Status {
    pub fn is_up(self) -> bool {
        self == Self::Up
    }
}

/// When another connection attempt is allowed.
///
/// The boot pass and the loop-driven path use different policies: boot gives
/// up after a fixed number of attempts and carries on regardless, while the
/// loop retries forever on a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// At most `max_attempts`, with `pause_ms` of blocking delay between them.
    Bounded { max_attempts: u32, pause_ms: u32 },
    /// Unlimited attempts, at least `interval_ms` apart.
    Periodic { interval_ms: u32 },
}

impl RetryPolicy {
    /// Whether an attempt may start now.
    ///
    /// `attempts` is the number already made under this policy and
    /// `last_attempt_ms` the timestamp of the most recent one.
    pub fn permits(&self, attempts: u32, last_attempt_ms: Option<u64>, now_ms: u64) -> bool {
        match *self {
            Self::Bounded { max_attempts, .. } => attempts < max_attempts,
            Self::Periodic { interval_ms } => last_attempt_ms
                .is_none_or(|last| now_ms.saturating_sub(last) >= u64::from(interval_ms)),
        }
    }

    /// Blocking delay between consecutive attempts, if any.
    pub fn pause_ms(&self) -> Option<u32> {
        match *self {
            Self::Bounded { pause_ms, .. } => Some(pause_ms),
            Self::Periodic { .. } => None,
        }
    }
}
