//! End-to-end behaviour of the control loop with fake peripherals.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};
use vault_alert::core::{Indicator, IndicatorAction};
use vault_alert::sensor::{Acceleration, ScriptedSampler, SensorSample};
use vault_alert::transport::{ReportTransport, TransportError, TransportResponse};
use vault_alert::{CycleOutcome, NetworkLink, Node, NodeSettings};

const INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Default)]
struct RecordingIndicator {
    actions: Vec<&'static str>,
}

impl Indicator for RecordingIndicator {
    fn start(&mut self, _frequency_hz: u32) {
        self.actions.push("start");
    }

    fn stop(&mut self) {
        self.actions.push("stop");
    }
}

struct FakeLink {
    up: bool,
    reconnects: usize,
}

impl NetworkLink for FakeLink {
    fn is_connected(&mut self) -> bool {
        self.up
    }

    fn attempt_reconnect(&mut self) {
        self.reconnects += 1;
    }
}

struct FakeTransport {
    replies: RefCell<Vec<Result<String, u16>>>,
    sent: RefCell<Vec<String>>,
    calls: Cell<usize>,
}

impl FakeTransport {
    /// Replies are consumed in order; the last one repeats.
    fn new(replies: Vec<Result<&str, u16>>) -> Self {
        Self {
            replies: RefCell::new(
                replies
                    .into_iter()
                    .map(|r| r.map(|s| s.to_string()))
                    .collect(),
            ),
            sent: RefCell::new(Vec::new()),
            calls: Cell::new(0),
        }
    }

    fn acking() -> Self {
        Self::new(vec![Ok("true")])
    }
}

impl ReportTransport for FakeTransport {
    fn send(&self, body: &str) -> Result<TransportResponse, TransportError> {
        self.sent.borrow_mut().push(body.to_string());
        self.calls.set(self.calls.get() + 1);

        let mut replies = self.replies.borrow_mut();
        let reply = if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies[0].clone()
        };

        match reply {
            Ok(body) => Ok(TransportResponse { status: 200, body }),
            Err(status) => Err(TransportError::Server {
                status,
                message: "unavailable".to_string(),
            }),
        }
    }
}

type TestNode = Node<ScriptedSampler, RecordingIndicator, FakeLink, FakeTransport>;

fn node(samples: Vec<SensorSample>, link_up: bool, transport: FakeTransport) -> (TestNode, Instant) {
    let start = Instant::now();
    let node = Node::new(
        NodeSettings::default(),
        ScriptedSampler::new(samples).unwrap(),
        RecordingIndicator::default(),
        FakeLink {
            up: link_up,
            reconnects: 0,
        },
        transport,
        start,
    );
    (node, start)
}

fn dark() -> SensorSample {
    SensorSample::quiet()
}

fn bright() -> SensorSample {
    SensorSample::new(100, Acceleration::resting())
}

fn shaken() -> SensorSample {
    SensorSample::new(0, [0.3, 0.0, 1.3])
}

#[test]
fn quiet_enclosure_reports_closed() {
    let (mut node, start) = node(vec![dark()], true, FakeTransport::acking());

    for ms in (0..2000).step_by(100) {
        let tick = node.tick(start + Duration::from_millis(ms));
        assert!(!tick.edges.any());
        assert!(tick.cycle.is_none());
    }
    let tick = node.tick(start + INTERVAL);

    assert!(matches!(
        tick.cycle,
        Some(CycleOutcome::Delivered { reset: false, .. })
    ));
    assert!(!node.state().alarm_active());
    assert!(node.indicator().actions.is_empty());
    assert_eq!(
        node.transport().sent.borrow().as_slice(),
        [r#"{"light_level":0,"motion_detected":false,"alarm_active":false,"vault_status":"CLOSED"}"#]
    );
}

#[test]
fn light_opens_vault_and_sounds_buzzer() {
    let (mut node, start) = node(vec![bright(), dark()], true, FakeTransport::acking());

    let tick = node.tick(start);
    assert!(tick.edges.light && tick.edges.alarm);
    assert!(matches!(tick.indicator, Some(IndicatorAction::Start { frequency_hz: 2000 })));
    assert!(node.state().light_event());
    assert!(node.state().alarm_active());

    node.tick(start + INTERVAL);

    let sent = node.transport().sent.borrow();
    assert_eq!(
        sent[0],
        r#"{"light_level":0,"motion_detected":false,"alarm_active":true,"vault_status":"OPEN"}"#
    );
    assert_eq!(node.indicator().actions, vec!["start"]);
    assert!(node.state().alarm_active());
    assert!(!node.state().light_event());
}

#[test]
fn remote_reset_silences_buzzer_on_next_tick() {
    let (mut node, start) = node(
        vec![shaken(), dark()],
        true,
        FakeTransport::new(vec![Ok("result: false")]),
    );

    node.tick(start);
    assert!(node.state().alarm_active());

    let tick = node.tick(start + INTERVAL);
    assert!(tick.cycle.as_ref().is_some_and(CycleOutcome::reset_applied));
    assert!(!node.state().alarm_active());
    // Reconcile ran before the report in this tick.
    assert!(node.indicator_on());

    let tick = node.tick(start + INTERVAL + Duration::from_millis(20));
    assert_eq!(tick.indicator, Some(IndicatorAction::Stop));
    assert_eq!(node.indicator().actions, vec!["start", "stop"]);
}

#[test]
fn link_down_defers_report_but_clears_events() {
    let (mut node, start) = node(vec![bright(), dark()], false, FakeTransport::acking());

    node.tick(start);
    let tick = node.tick(start + INTERVAL);

    assert!(matches!(tick.cycle, Some(CycleOutcome::LinkDown)));
    assert_eq!(node.transport().calls.get(), 0);
    assert_eq!(node.link().reconnects, 1);
    assert!(!node.state().light_event());
    assert!(!node.state().motion_event());
    assert!(node.state().alarm_active());
}

#[test]
fn transport_failure_clears_events_and_keeps_alarm() {
    let (mut node, start) = node(vec![shaken(), dark()], true, FakeTransport::new(vec![Err(503)]));

    node.tick(start);
    let tick = node.tick(start + INTERVAL);

    assert!(matches!(tick.cycle, Some(CycleOutcome::Failed { .. })));
    assert!(!node.state().motion_event());
    assert!(node.state().alarm_active());
    assert_eq!(node.activity().stats().report_failures, 1);

    // The next interval is still attempted on schedule.
    let tick = node.tick(start + INTERVAL * 2);
    assert!(tick.cycle.is_some());
    assert_eq!(node.transport().calls.get(), 2);
}

#[test]
fn persistent_light_rearms_after_reset() {
    let (mut node, start) = node(
        vec![bright()],
        true,
        FakeTransport::new(vec![Ok("false"), Ok("true")]),
    );

    node.tick(start);
    node.tick(start + INTERVAL);
    assert!(!node.state().alarm_active());
    assert!(!node.state().light_event());

    let tick = node.tick(start + INTERVAL + Duration::from_millis(20));
    assert!(tick.edges.light && tick.edges.alarm);
    assert!(node.state().alarm_active());
    // The buzzer never saw the alarm drop, so it was never stopped.
    assert_eq!(node.indicator().actions, vec!["start"]);
}

#[test]
fn events_latch_until_report() {
    let samples = vec![shaken(), bright(), dark(), dark(), dark()];
    let (mut node, start) = node(samples, true, FakeTransport::acking());

    for ms in [0, 100, 200, 300, 400] {
        node.tick(start + Duration::from_millis(ms));
        assert!(node.state().motion_event());
    }
    assert!(node.state().light_event());
    assert_eq!(node.state().last_light_level(), 0);

    node.tick(start + INTERVAL);
    assert_eq!(
        node.transport().sent.borrow()[0],
        r#"{"light_level":0,"motion_detected":true,"alarm_active":true,"vault_status":"OPEN"}"#
    );
    assert!(!node.state().motion_event());
    assert!(!node.state().light_event());
}

#[test]
fn buzzer_is_debounced_across_many_ticks() {
    let (mut node, start) = node(vec![bright()], true, FakeTransport::acking());

    for ms in (0..1900).step_by(10) {
        node.tick(start + Duration::from_millis(ms));
    }

    assert_eq!(node.indicator().actions, vec!["start"]);
    assert_eq!(node.activity().stats().alarms_raised, 1);
}
