//! Network link lifecycle (WiFi station).
//!
//! [`LinkManager`] owns [`LinkState`] exclusively.  Two entry points:
//!
//! - [`connect_initial`](LinkManager::connect_initial): the boot pass, bounded
//!   attempts with a blocking pause, proceeds whatever the outcome.
//! - [`ensure_link`](LinkManager::ensure_link): called by the control loop,
//!   at most one attempt per retry interval, forever.

use log::debug;

use super::{RetryPolicy, Status};
use crate::app::context::TelemetryCounters;
use crate::app::ports::{ClockPort, LinkPort};
use crate::config::DeviceConfig;
use crate::error::LinkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkState {
    pub status: Status,
    pub last_attempt_ms: Option<u64>,
    /// Consecutive failed attempts since the last success.
    pub retry_count: u32,
}

/// What a call to [`LinkManager::ensure_link`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Already up and still associated.
    Alive,
    /// Down, retry interval not yet elapsed.
    Waiting,
    /// An attempt succeeded.
    Connected,
    /// An attempt failed.
    Failed(LinkError),
    /// Recorded Up but the radio reports no association; now Down.
    Dropped,
}

/// Result of a side-effect-free liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Recorded Up and the port agrees.
    Alive,
    /// Recorded Up but the port no longer reports a connection.
    Lost,
    /// Recorded Down.
    Down,
}

pub struct LinkManager {
    state: LinkState,
    boot: RetryPolicy,
    steady: RetryPolicy,
    connect_timeout_ms: u32,
}

impl LinkManager {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            state: LinkState::default(),
            boot: RetryPolicy::Bounded {
                max_attempts: config.max_link_retry,
                pause_ms: config.boot_link_retry_pause_ms,
            },
            steady: RetryPolicy::Periodic {
                interval_ms: config.link_retry_interval_ms,
            },
            connect_timeout_ms: config.link_connect_timeout_ms,
        }
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    /// Compare the recorded status with what the port reports, without
    /// changing anything.
    pub fn check_liveness(&self, port: &impl LinkPort) -> Liveness {
        match self.state.status {
            Status::Down => Liveness::Down,
            Status::Up if port.is_connected() => Liveness::Alive,
            Status::Up => Liveness::Lost,
        }
    }

    /// Bring the link up if it is down and the retry interval allows.
    ///
    /// Every attempt bumps `counters.link_reconnects`, successful or not.
    /// A drop detected here only reclassifies; the reconnect happens on a
    /// later call.
    pub fn ensure_link(
        &mut self,
        now_ms: u64,
        port: &mut impl LinkPort,
        counters: &mut TelemetryCounters,
    ) -> LinkOutcome {
        match self.check_liveness(port) {
            Liveness::Alive => return LinkOutcome::Alive,
            Liveness::Lost => {
                self.state.status = Status::Down;
                return LinkOutcome::Dropped;
            }
            Liveness::Down => {}
        }

        if !self
            .steady
            .permits(self.state.retry_count, self.state.last_attempt_ms, now_ms)
        {
            return LinkOutcome::Waiting;
        }

        debug!("link: attempt (retry_count={})", self.state.retry_count);
        counters.link_reconnects += 1;
        self.state.last_attempt_ms = Some(now_ms);
        port.disconnect();
        match port.connect(self.connect_timeout_ms) {
            Ok(()) => {
                self.state.status = Status::Up;
                self.state.retry_count = 0;
                LinkOutcome::Connected
            }
            Err(e) => {
                self.state.retry_count += 1;
                LinkOutcome::Failed(e)
            }
        }
    }

    /// Boot-time pass: up to the configured number of attempts with a
    /// blocking pause between them.  Does not count towards
    /// `link_reconnects`.
    pub fn connect_initial(
        &mut self,
        port: &mut impl LinkPort,
        clock: &impl ClockPort,
    ) -> Result<(), LinkError> {
        let mut attempts = 0;
        let mut last_err = LinkError::ConnectFailed;

        while self.boot.permits(attempts, None, clock.now_ms()) {
            if attempts > 0 {
                if let Some(pause) = self.boot.pause_ms() {
                    clock.sleep_ms(pause);
                }
            }
            attempts += 1;
            debug!("link: boot attempt {}", attempts);
            match port.connect(self.connect_timeout_ms) {
                Ok(()) => {
                    self.state = LinkState {
                        status: Status::Up,
                        last_attempt_ms: Some(clock.now_ms()),
                        retry_count: 0,
                    };
                    return Ok(());
                }
                Err(LinkError::NoCredentials) => {
                    last_err = LinkError::NoCredentials;
                    break;
                }
                Err(e) => last_err = e,
            }
        }

        self.state = LinkState {
            status: Status::Down,
            last_attempt_ms: Some(clock.now_ms()),
            retry_count: attempts,
        };
        Err(last_err)
    }
}
