//! Control loop: the single-threaded scheduler that drives everything else.
//!
//! [`ControlLoop`] owns all device state (link, session, actuator, counters,
//! indicator phase).  Adapters are lent to it per call through
//! [`Peripherals`], so the whole loop runs against mocks on the host.
//!
//! ```text
//!   LinkPort ───┐                         ┌──▶ EventSink
//!   BrokerPort ─┤   ┌─────────────────┐   │
//!   Sensor/Act ─┼──▶│   ControlLoop   │───┤
//!   ByteStore ──┤   │ link · session  │   └──▶ indicator line
//!   Clock ──────┘   │ dispatch · pub  │
//!                   └─────────────────┘
//! ```
//!
//! One tick, in priority order:
//!
//! 0. liveness probe: a lost link tears the session down first
//! 1. link down → [`LinkManager::ensure_link`]
//! 2. else session down → [`SessionManager::ensure_session`]
//! 3. else drain inbound messages through the dispatcher
//! 4. measurement publish when due
//! 5. status publish when due
//! 6. indicator update

use log::{debug, info};

use crate::config::DeviceConfig;
use crate::connectivity::Status;
use crate::connectivity::link::{LinkManager, LinkOutcome, LinkState, Liveness};
use crate::connectivity::session::{SessionManager, SessionOutcome, SessionState};
use crate::diagnostics::{self, SystemInfo};
use crate::error::{Error, LinkError, SessionError};
use crate::scheduler::{Interval, TickScheduler};

use super::context::DeviceContext;
use super::dispatcher::{CommandDispatcher, DispatchOutcome};
use super::events::AppEvent;
use super::health::DeviceHealth;
use super::persistence::PersistenceGateway;
use super::ports::{ActuatorPort, BrokerPort, ClockPort, EventSink, Platform, SensorPort};
use super::telemetry::{STATUS_ONLINE, STATUS_RUNNING, TelemetryPublisher};

// ───────────────────────────────────────────────────────────────
// Peripherals
// ───────────────────────────────────────────────────────────────

/// Every adapter the loop talks to, owned in one place.
pub struct Peripherals<P: Platform> {
    pub link: P::Link,
    pub broker: P::Broker,
    pub hw: P::Hardware,
    pub persistence: PersistenceGateway<P::Store>,
    pub entropy: P::Entropy,
    pub clock: P::Clock,
    pub sink: P::Sink,
}

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

pub struct ControlLoop {
    config: DeviceConfig,
    link: LinkManager,
    session: SessionManager,
    telemetry: TelemetryPublisher,
    dispatcher: CommandDispatcher,
    ctx: DeviceContext,
    measurement: Interval,
    status: Interval,
    health: DeviceHealth,
}

impl ControlLoop {
    /// Build the loop.  `boot_ms` is the clock reading uptime counts from.
    pub fn new(config: DeviceConfig, boot_ms: u64) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            link: LinkManager::new(&config),
            session: SessionManager::new(&config),
            telemetry: TelemetryPublisher::new(&config),
            dispatcher: CommandDispatcher::new(&config),
            ctx: DeviceContext::new(&config, boot_ms),
            measurement: Interval::new(config.upload_interval_ms),
            status: Interval::new(config.status_interval_ms),
            health: DeviceHealth::Disconnected,
            config,
        })
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn link_state(&self) -> &LinkState {
        self.link.state()
    }

    pub fn session_state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn context(&self) -> &DeviceContext {
        &self.ctx
    }

    pub fn health(&self) -> DeviceHealth {
        self.health
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Startup sequence: restore IO1, bounded link pass, one session
    /// attempt, system report.
    pub fn boot<P: Platform>(&mut self, p: &mut Peripherals<P>) {
        let (level, restored) = p.persistence.load_actuator();
        self.ctx.actuator.value = level;
        p.hw.set_output(level);
        p.sink.emit(&AppEvent::Booted {
            actuator: level,
            restored,
        });

        info!("link: connecting to \"{}\"", self.config.wifi_ssid);
        match self.link.connect_initial(&mut p.link, &p.clock) {
            Ok(()) => p.sink.emit(&AppEvent::LinkUp),
            Err(e) => p.sink.emit(&AppEvent::LinkDown(e)),
        }

        let now = p.clock.now_ms();
        if self.link.status().is_up() {
            let outcome = self.session.connect_initial(
                now,
                self.link.status(),
                &mut p.broker,
                &mut p.entropy,
            );
            self.on_session_outcome(now, outcome, p);
        }

        diagnostics::log_system_info(&self.config, &SystemInfo::collect());
        self.health = DeviceHealth::derive(self.link.status(), self.session.status());
    }

    /// One control cycle at `now_ms`.
    pub fn tick<P: Platform>(&mut self, now_ms: u64, p: &mut Peripherals<P>) {
        // 0. A lost link takes the session with it before anything else.
        let liveness = self.link.check_liveness(&p.link);
        if liveness == Liveness::Lost && self.session.status().is_up() {
            self.session.force_down();
            p.sink.emit(&AppEvent::SessionDown(SessionError::LinkDown));
        }

        // 1–3. Strictly layered: at most one of these per tick.
        if liveness != Liveness::Alive {
            self.step_link(now_ms, p);
        } else if !self.session.status().is_up() {
            let outcome = self.session.ensure_session(
                now_ms,
                self.link.status(),
                &mut p.broker,
                &mut p.entropy,
                &mut self.ctx.counters,
            );
            self.on_session_outcome(now_ms, outcome, p);
        } else {
            self.drain_inbound(now_ms, p);
        }

        // 4. Measurement.
        if self.session.status().is_up() && self.measurement.poll(now_ms) {
            let sample = p.hw.read_analog();
            let _ = self.telemetry.publish_measurement(
                now_ms,
                sample,
                &mut self.ctx,
                &p.link,
                &mut p.broker,
                &mut p.sink,
            );
        }

        // 5. Periodic status.
        if self.session.status().is_up() && self.status.poll(now_ms) {
            let _ = self.telemetry.publish_status(
                now_ms,
                STATUS_RUNNING,
                &mut self.ctx,
                &p.link,
                &mut p.broker,
                &mut p.sink,
            );
            diagnostics::log_counters(&self.ctx.counters, self.ctx.uptime_secs(now_ms));
        }

        // 6. Indicator.
        let health = DeviceHealth::derive(self.link.status(), self.session.status());
        if health != self.health {
            p.sink.emit(&AppEvent::HealthChanged {
                from: self.health,
                to: health,
            });
            self.health = health;
        }
        let level = self.ctx.indicator.update(now_ms, health);
        p.hw.set_indicator(level);
    }

    /// Run forever at the configured tick period.
    pub fn run<P: Platform>(mut self, p: &mut Peripherals<P>) -> ! {
        let mut scheduler = TickScheduler::new(self.config.loop_period_ms);
        info!("control loop running ({} ms tick)", self.config.loop_period_ms);
        loop {
            let started = scheduler.begin(&p.clock);
            self.tick(started, p);
            scheduler.finish(started, &p.clock);
        }
    }

    // ── Steps ─────────────────────────────────────────────────

    fn step_link<P: Platform>(&mut self, now_ms: u64, p: &mut Peripherals<P>) {
        match self
            .link
            .ensure_link(now_ms, &mut p.link, &mut self.ctx.counters)
        {
            LinkOutcome::Connected => p.sink.emit(&AppEvent::LinkUp),
            LinkOutcome::Failed(e) => p.sink.emit(&AppEvent::LinkDown(e)),
            LinkOutcome::Dropped => p.sink.emit(&AppEvent::LinkDown(LinkError::Dropped)),
            LinkOutcome::Alive | LinkOutcome::Waiting => {}
        }
    }

    fn on_session_outcome<P: Platform>(
        &mut self,
        now_ms: u64,
        outcome: SessionOutcome,
        p: &mut Peripherals<P>,
    ) {
        match outcome {
            SessionOutcome::Established => {
                p.sink.emit(&AppEvent::SessionUp {
                    client_id: self.session.state().client_id.clone(),
                });
                let _ = self.telemetry.publish_status(
                    now_ms,
                    STATUS_ONLINE,
                    &mut self.ctx,
                    &p.link,
                    &mut p.broker,
                    &mut p.sink,
                );
            }
            SessionOutcome::Failed(e) => p.sink.emit(&AppEvent::SessionDown(e)),
            SessionOutcome::Alive | SessionOutcome::Waiting | SessionOutcome::LinkDown => {}
        }
    }

    /// Dispatch every message that was pending when the pump ran, oldest
    /// first.  Messages arriving meanwhile wait for the next tick.  A drop
    /// seen by the pump is reported after the delivered messages are handled.
    fn drain_inbound<P: Platform>(&mut self, now_ms: u64, p: &mut Peripherals<P>) {
        let pump = self.session.pump(&mut p.broker);

        for _ in 0..pump.pending {
            let Some(msg) = p.broker.take_message() else {
                break;
            };
            let outcome = self.dispatcher.on_message(
                now_ms,
                &msg.topic,
                &msg.payload,
                &mut self.ctx,
                &self.telemetry,
                &mut p.hw,
                &mut p.persistence,
                &mut p.broker,
                &mut p.sink,
            );
            if let DispatchOutcome::Unchanged(level) = outcome {
                debug!("io1 already {}", level);
            }
        }

        if pump.dropped {
            p.sink.emit(&AppEvent::SessionDown(SessionError::Dropped));
        }
    }

    /// Link and session status as seen at the end of the last call.
    pub fn statuses(&self) -> (Status, Status) {
        (self.link.status(), self.session.status())
    }
}
