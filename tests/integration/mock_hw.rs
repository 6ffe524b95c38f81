//! Mock adapters and a simulated board for integration tests.
//!
//! [`MockHardware`] records every actuator call so tests can assert on the
//! full output history.  The network side uses the crate's own host
//! adapters (`WifiAdapter`, `MqttAdapter`), which expose outage injection.

#![allow(dead_code)]

use std::cell::Cell;

use edgenode::adapters::mqtt::MqttAdapter;
use edgenode::adapters::nvs::EepromStore;
use edgenode::adapters::wifi::WifiAdapter;
use edgenode::app::events::AppEvent;
use edgenode::app::persistence::PersistenceGateway;
use edgenode::app::ports::{
    ActuatorPort, ClockPort, EntropyPort, EventSink, Platform, SensorPort,
};
use edgenode::app::service::{ControlLoop, Peripherals};
use edgenode::config::{DeviceConfig, LOOP_PERIOD_MS, TOPIC_CONTROL};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    Output(bool),
    Indicator(bool),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<HwCall>,
    pub analog: u16,
    pub reads: u32,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            analog: 0,
            reads: 0,
        }
    }

    /// Every level written to IO1, oldest first.
    pub fn outputs(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::Output(v) => Some(*v),
                HwCall::Indicator(_) => None,
            })
            .collect()
    }

    /// Every level written to the status LED, oldest first.
    pub fn indicators(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::Indicator(v) => Some(*v),
                HwCall::Output(_) => None,
            })
            .collect()
    }

    pub fn last_output(&self) -> Option<bool> {
        self.outputs().last().copied()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_analog(&mut self) -> u16 {
        self.reads += 1;
        self.analog
    }
}

impl ActuatorPort for MockHardware {
    fn set_output(&mut self, high: bool) {
        self.calls.push(HwCall::Output(high));
    }

    fn set_indicator(&mut self, on: bool) {
        self.calls.push(HwCall::Indicator(on));
    }
}

// ── FakeClock ─────────────────────────────────────────────────

/// Manually driven clock.  `sleep_ms` advances time instead of blocking.
pub struct FakeClock {
    now: Cell<u64>,
    slept: Cell<u64>,
}

impl FakeClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
            slept: Cell::new(0),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    /// Total time spent in `sleep_ms`.
    pub fn slept_ms(&self) -> u64 {
        self.slept.get()
    }
}

impl ClockPort for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u32) {
        self.now.set(self.now.get() + u64::from(ms));
        self.slept.set(self.slept.get() + u64::from(ms));
    }
}

// ── SeqEntropy ────────────────────────────────────────────────

/// Yields `start`, `start + 1`, ... so client ids are predictable.
pub struct SeqEntropy(u16);

impl SeqEntropy {
    pub fn new(start: u16) -> Self {
        Self(start)
    }
}

impl EntropyPort for SeqEntropy {
    fn next_u16(&mut self) -> u16 {
        let v = self.0;
        self.0 = self.0.wrapping_add(1);
        v
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn position(&self, pred: impl Fn(&AppEvent) -> bool) -> Option<usize> {
        self.events.iter().position(pred)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Simulated board ───────────────────────────────────────────

pub struct SimBoard;

impl Platform for SimBoard {
    type Link = WifiAdapter;
    type Broker = MqttAdapter;
    type Hardware = MockHardware;
    type Store = EepromStore;
    type Entropy = SeqEntropy;
    type Clock = FakeClock;
    type Sink = RecordingSink;
}

/// A control loop wired to the simulated board, clock starting at 0.
pub struct Rig {
    pub control: ControlLoop,
    pub p: Peripherals<SimBoard>,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_store(EepromStore::new().expect("sim store"))
    }

    /// Same board, but starting from a previously committed store image.
    pub fn with_store(store: EepromStore) -> Self {
        let control = ControlLoop::new(DeviceConfig::default(), 0).expect("default config");
        let p = Peripherals {
            link: WifiAdapter::new("TestNet"),
            broker: MqttAdapter::new(),
            hw: MockHardware::new(),
            persistence: PersistenceGateway::new(store),
            entropy: SeqEntropy::new(1),
            clock: FakeClock::new(0),
            sink: RecordingSink::new(),
        };
        Self { control, p }
    }

    pub fn boot(&mut self) {
        self.control.boot(&mut self.p);
    }

    pub fn now(&self) -> u64 {
        self.p.clock.now_ms()
    }

    pub fn tick_at(&mut self, now_ms: u64) {
        self.p.clock.set(now_ms);
        self.control.tick(now_ms, &mut self.p);
    }

    /// Tick once per loop period after the current time, up to and
    /// including `end_ms`.
    pub fn run_until(&mut self, end_ms: u64) {
        let mut t = self.now() + u64::from(LOOP_PERIOD_MS);
        while t <= end_ms {
            self.tick_at(t);
            t += u64::from(LOOP_PERIOD_MS);
        }
    }

    /// Inject a control-topic message from the backend.
    pub fn deliver(&mut self, payload: &str) -> bool {
        self.p.broker.sim_deliver(TOPIC_CONTROL, payload.as_bytes())
    }

    /// Parsed payloads published on `topic`, oldest first.
    pub fn published_json(&self, topic: &str) -> Vec<serde_json::Value> {
        self.p
            .broker
            .sim_published_on(topic)
            .map(|p| serde_json::from_slice(p).expect("published payload is JSON"))
            .collect()
    }
}

impl Default for Rig {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of level changes in a sequence of writes.
pub fn transitions(levels: &[bool]) -> usize {
    levels.windows(2).filter(|w| w[0] != w[1]).count()
}
