//! Tick scheduling for the control loop.
//!
//! ```text
//!   ┌──── period ────┐┌──── period ────┐
//!   │ work │  sleep  ││ work │  sleep  │ ...
//!   └──────┴─────────┘└──────┴─────────┘
//! ```
//!
//! [`TickScheduler`] keeps a fixed cadence by sleeping only the remainder of
//! each period.  [`Interval`] gates work that should run at most once per
//! longer period (measurement upload, status report) however short the tick.

use crate::app::ports::ClockPort;

/// A "has `period_ms` passed since the last run" gate.
///
/// Starts as if it last ran at t = 0, so the first run happens one full
/// period after boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period_ms: u32,
    last_ms: u64,
}

impl Interval {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: 0,
        }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_ms) >= u64::from(self.period_ms)
    }

    /// Record a run at `now_ms`.  Called whether or not the work succeeded.
    pub fn mark(&mut self, now_ms: u64) {
        self.last_ms = now_ms;
    }

    /// `is_due` + `mark` in one step.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.mark(now_ms);
            true
        } else {
            false
        }
    }
}

/// Fixed-period tick pacing.
#[derive(Debug, Clone, Copy)]
pub struct TickScheduler {
    period_ms: u32,
    tick_count: u64,
}

impl TickScheduler {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            tick_count: 0,
        }
    }

    /// Start of a tick; returns the timestamp to pass to [`finish`](Self::finish).
    pub fn begin(&mut self, clock: &impl ClockPort) -> u64 {
        self.tick_count += 1;
        clock.now_ms()
    }

    /// Sleep whatever is left of the period.  An overrun tick does not sleep.
    pub fn finish(&self, started_ms: u64, clock: &impl ClockPort) {
        let elapsed = clock.now_ms().saturating_sub(started_ms);
        if let Some(rest) = u64::from(self.period_ms).checked_sub(elapsed) {
            if rest > 0 {
                clock.sleep_ms(rest as u32);
            }
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
