//! Integration tests for control-topic command handling.
//!
//! Covers the apply sequence (IO1, indicator, persistence, confirmation),
//! idempotence, and every way a payload can be rejected.

use crate::mock_hw::{HwCall, MockHardware, RecordingSink, Rig};

use edgenode::adapters::mqtt::MqttAdapter;
use edgenode::adapters::nvs::EepromStore;
use edgenode::app::context::DeviceContext;
use edgenode::app::dispatcher::{CommandDispatcher, DispatchOutcome};
use edgenode::app::events::AppEvent;
use edgenode::app::persistence::PersistenceGateway;
use edgenode::app::ports::{BrokerPort, ConnectOptions};
use edgenode::app::telemetry::TelemetryPublisher;
use edgenode::config::{CONFIG_SENTINEL, DeviceConfig, TOPIC_CONTROL};
use edgenode::error::{DecodeError, PublishError};

// ── Direct harness (no control loop) ──────────────────────────

struct Bench {
    ctx: DeviceContext,
    telemetry: TelemetryPublisher,
    dispatcher: CommandDispatcher,
    hw: MockHardware,
    persistence: PersistenceGateway<EepromStore>,
    broker: MqttAdapter,
    sink: RecordingSink,
}

impl Bench {
    fn new(connected: bool) -> Self {
        let config = DeviceConfig::default();
        let mut broker = MqttAdapter::new();
        if connected {
            let options = ConnectOptions {
                host: config.broker_host,
                port: config.broker_port,
                client_id: "bench",
                username: None,
                password: None,
                keep_alive_secs: config.keep_alive_secs,
            };
            broker.connect(&options, 1_000).expect("sim broker");
        }
        Self {
            ctx: DeviceContext::new(&config, 0),
            telemetry: TelemetryPublisher::new(&config),
            dispatcher: CommandDispatcher::new(&config),
            hw: MockHardware::new(),
            persistence: PersistenceGateway::new(EepromStore::new().expect("sim store")),
            broker,
            sink: RecordingSink::new(),
        }
    }

    fn send(&mut self, topic: &str, payload: &[u8]) -> DispatchOutcome {
        self.dispatcher.on_message(
            1_000,
            topic,
            payload,
            &mut self.ctx,
            &self.telemetry,
            &mut self.hw,
            &mut self.persistence,
            &mut self.broker,
            &mut self.sink,
        )
    }
}

fn booted() -> Rig {
    let mut rig = Rig::new();
    rig.boot();
    rig.p.sink.clear();
    rig.p.hw.calls.clear();
    rig
}

// ── Apply sequence ────────────────────────────────────────────

#[test]
fn set_true_applies_persists_and_confirms() {
    let mut rig = booted();
    assert!(rig.deliver(r#"{"state":true}"#));
    rig.tick_at(100);

    assert!(rig.control.context().actuator.value);
    assert_eq!(rig.p.hw.calls[0], HwCall::Output(true));
    assert_eq!(rig.p.hw.calls[1], HwCall::Indicator(true));

    let image = rig.p.persistence.store().committed_image();
    assert_eq!(image[0], CONFIG_SENTINEL);
    assert_eq!(image[1], 1);

    let confirmations = rig.published_json(TOPIC_CONTROL);
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0]["device_id"], "ESP32_Device");
    assert_eq!(confirmations[0]["channel"], "IO1");
    assert_eq!(confirmations[0]["state"], true);
    assert_eq!(confirmations[0]["timestamp"], 100);

    assert_eq!(rig.p.sink.count(|e| *e == AppEvent::ActuatorChanged(true)), 1);
}

#[test]
fn action_shape_is_accepted() {
    let mut rig = booted();
    rig.deliver(r#"{"command":"set_io1","state":true}"#);
    rig.tick_at(100);

    assert!(rig.control.context().actuator.value);
    assert_eq!(rig.p.hw.last_output(), Some(true));
}

#[test]
fn switching_back_off_persists_zero() {
    let mut rig = booted();
    rig.deliver(r#"{"state":true}"#);
    rig.tick_at(100);
    rig.deliver(r#"{"state":false}"#);
    rig.run_until(300);

    assert_eq!(rig.p.hw.outputs(), [true, false]);
    assert_eq!(rig.p.persistence.store().committed_image()[1], 0);
    let states: Vec<_> = rig
        .published_json(TOPIC_CONTROL)
        .iter()
        .map(|c| c["state"].clone())
        .collect();
    assert_eq!(states, [true, false]);
}

#[test]
fn state_field_applies_whatever_the_command_says() {
    let mut bench = Bench::new(true);
    assert_eq!(
        bench.send(TOPIC_CONTROL, br#"{"command":"toggle","state":true}"#),
        DispatchOutcome::Applied(true)
    );
    assert!(bench.ctx.actuator.value);
    assert_eq!(bench.hw.last_output(), Some(true));
    assert_eq!(bench.persistence.load(), Some(true));
    assert_eq!(bench.ctx.counters.decode_failures, 0);
}

#[test]
fn repeated_command_is_idempotent() {
    let mut rig = booted();
    rig.deliver(r#"{"state":true}"#);
    rig.deliver(r#"{"state":true}"#);
    rig.run_until(500);

    assert_eq!(rig.p.hw.outputs(), [true]);
    assert_eq!(rig.published_json(TOPIC_CONTROL).len(), 1);
    assert_eq!(rig.p.sink.count(|e| matches!(e, AppEvent::ActuatorChanged(_))), 1);
}

#[test]
fn own_confirmation_echo_is_a_no_op() {
    let mut rig = booted();
    rig.deliver(r#"{"state":true}"#);
    rig.tick_at(100);
    // The broker loops the confirmation back on the subscribed topic.
    assert_eq!(rig.p.broker.poll(), 1);

    rig.tick_at(200);
    let counters = rig.control.context().counters;
    assert_eq!(counters.messages_received, 2);
    assert_eq!(counters.decode_failures, 0);
    assert_eq!(rig.p.hw.outputs(), [true]);
    assert_eq!(rig.published_json(TOPIC_CONTROL).len(), 1);
}

#[test]
fn messages_drained_in_arrival_order() {
    let mut rig = booted();
    rig.deliver(r#"{"state":true}"#);
    rig.deliver(r#"{"state":false}"#);
    rig.tick_at(100);

    assert_eq!(rig.p.hw.outputs(), [true, false]);
    assert!(!rig.control.context().actuator.value);
}

// ── Rejections ────────────────────────────────────────────────

#[test]
fn malformed_payloads_change_nothing() {
    let cases: [(&[u8], DecodeError); 6] = [
        (br#"{"value":1}"#, DecodeError::MissingState),
        (br#"{"state":"on"}"#, DecodeError::StateNotBool),
        (br#"{"state":1}"#, DecodeError::StateNotBool),
        (b"not json", DecodeError::Syntax),
        (b"[true]", DecodeError::NotAnObject),
        (br#"{"command":"reboot"}"#, DecodeError::UnknownCommand),
    ];

    for (payload, expected) in cases {
        let mut bench = Bench::new(true);
        let outcome = bench.send(TOPIC_CONTROL, payload);

        assert_eq!(outcome, DispatchOutcome::Malformed(expected), "{:?}", payload);
        assert!(!bench.ctx.actuator.value);
        assert!(bench.hw.calls.is_empty());
        assert!(!bench.persistence.has_record());
        assert!(bench.broker.sim_published().is_empty());
        assert_eq!(bench.ctx.counters.decode_failures, 1);
        assert_eq!(bench.ctx.counters.messages_received, 1);
        assert_eq!(bench.sink.events, [AppEvent::DecodeFailed(expected)]);
    }
}

#[test]
fn payload_over_budget_rejected() {
    let mut bench = Bench::new(true);
    let padding = "x".repeat(200);
    let payload = format!(r#"{{"state":true,"pad":"{}"}}"#, padding);

    assert_eq!(
        bench.send(TOPIC_CONTROL, payload.as_bytes()),
        DispatchOutcome::Malformed(DecodeError::TooLarge)
    );
    assert!(!bench.ctx.actuator.value);
}

#[test]
fn other_topics_are_counted_but_ignored() {
    let mut bench = Bench::new(true);
    assert_eq!(
        bench.send("esp32/other", br#"{"state":true}"#),
        DispatchOutcome::Ignored
    );
    assert_eq!(bench.ctx.counters.messages_received, 1);
    assert_eq!(bench.ctx.counters.decode_failures, 0);
    assert!(bench.hw.calls.is_empty());
}

#[test]
fn failed_confirmation_does_not_undo_the_change() {
    let mut bench = Bench::new(false);
    assert_eq!(
        bench.send(TOPIC_CONTROL, br#"{"state":true}"#),
        DispatchOutcome::Applied(true)
    );

    assert!(bench.ctx.actuator.value);
    assert_eq!(bench.persistence.load(), Some(true));
    assert_eq!(
        bench.sink.count(|e| matches!(
            e,
            AppEvent::PublishFailed { topic, error: PublishError::NotConnected }
                if topic.as_str() == TOPIC_CONTROL
        )),
        1
    );
}
