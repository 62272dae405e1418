//! Periodic status reporting and remote reset handling.

use crate::core::latch::AlarmState;
use crate::core::report::{is_reset_directive, StatusReport};
use crate::link::NetworkLink;
use crate::transport::{ReportTransport, TransportError};
use std::time::{Duration, Instant};

/// Default time between reports.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(2000);

/// What a reporting cycle did.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The link was down; a reconnect was requested and nothing was sent.
    LinkDown,
    /// The endpoint accepted the report.
    Delivered {
        report: StatusReport,
        status: u16,
        reset: bool,
    },
    /// The report could not be delivered.
    Failed {
        report: StatusReport,
        error: TransportError,
    },
}

impl CycleOutcome {
    /// Whether the endpoint asked for a reset.
    pub fn reset_applied(&self) -> bool {
        matches!(self, CycleOutcome::Delivered { reset: true, .. })
    }
}

/// Fixed-period reporting timer plus the report/reset exchange.
#[derive(Debug, Clone)]
pub struct ReportingCycle {
    interval: Duration,
    last_run: Instant,
}

impl ReportingCycle {
    /// Start the timer at `started_at`; the first report is due one
    /// interval later.
    pub fn new(interval: Duration, started_at: Instant) -> Self {
        Self {
            interval,
            last_run: started_at,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a full interval has elapsed since the last cycle.
    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_run) >= self.interval
    }

    /// Run the cycle if it is due.
    pub fn poll<L, T>(
        &mut self,
        now: Instant,
        state: &mut AlarmState,
        link: &mut L,
        transport: &T,
    ) -> Option<CycleOutcome>
    where
        L: NetworkLink + ?Sized,
        T: ReportTransport + ?Sized,
    {
        if self.is_due(now) {
            Some(self.run(now, state, link, transport))
        } else {
            None
        }
    }

    /// Run one cycle unconditionally.
    ///
    /// Event flags are cleared whatever happens; a failed interval's events
    /// are dropped, not queued. The next cycle is scheduled from `now`, so a
    /// late tick never produces two reports back to back.
    pub fn run<L, T>(
        &mut self,
        now: Instant,
        state: &mut AlarmState,
        link: &mut L,
        transport: &T,
    ) -> CycleOutcome
    where
        L: NetworkLink + ?Sized,
        T: ReportTransport + ?Sized,
    {
        self.last_run = now;

        let outcome = if link.is_connected() {
            Self::exchange(state, transport)
        } else {
            tracing::warn!("Link down, attempting reconnect");
            link.attempt_reconnect();
            CycleOutcome::LinkDown
        };

        state.clear_events();
        outcome
    }

    fn exchange<T: ReportTransport + ?Sized>(
        state: &mut AlarmState,
        transport: &T,
    ) -> CycleOutcome {
        let report = StatusReport::from_state(state);
        let body = match report.to_json() {
            Ok(body) => body,
            Err(e) => {
                return CycleOutcome::Failed {
                    report,
                    error: TransportError::Serialization(e.to_string()),
                }
            }
        };

        tracing::debug!(%body, "Sending report");

        match transport.send(&body) {
            Ok(response) => {
                tracing::debug!(status = response.status, body = %response.body, "Report accepted");
                let reset = is_reset_directive(&response.body);
                if reset {
                    tracing::info!("Received reset command from endpoint");
                    state.remote_reset();
                }
                CycleOutcome::Delivered {
                    report,
                    status: response.status,
                    reset,
                }
            }
            Err(error) => {
                tracing::warn!(%error, "Report failed");
                CycleOutcome::Failed { report, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::latch::AlarmLatch;
    use crate::sensor::SensorSample;
    use crate::transport::TransportResponse;
    use std::cell::RefCell;

    struct FixedLink {
        up: bool,
        reconnects: usize,
    }

    impl NetworkLink for FixedLink {
        fn is_connected(&mut self) -> bool {
            self.up
        }

        fn attempt_reconnect(&mut self) {
            self.reconnects += 1;
        }
    }

    struct CannedTransport {
        reply: Result<&'static str, u16>,
        sent: RefCell<Vec<String>>,
    }

    impl CannedTransport {
        fn ok(body: &'static str) -> Self {
            Self {
                reply: Ok(body),
                sent: RefCell::new(Vec::new()),
            }
        }

        fn status(status: u16) -> Self {
            Self {
                reply: Err(status),
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl ReportTransport for CannedTransport {
        fn send(&self, body: &str) -> Result<TransportResponse, TransportError> {
            self.sent.borrow_mut().push(body.to_string());
            match self.reply {
                Ok(body) => Ok(TransportResponse {
                    status: 200,
                    body: body.to_string(),
                }),
                Err(status) => Err(TransportError::Server {
                    status,
                    message: "false".to_string(),
                }),
            }
        }
    }

    fn alarmed_state() -> AlarmState {
        let mut state = AlarmState::new();
        AlarmLatch::default().evaluate(&SensorSample::new(100, [0.0, 0.6, 1.1]), &mut state);
        state
    }

    fn up() -> FixedLink {
        FixedLink {
            up: true,
            reconnects: 0,
        }
    }

    #[test]
    fn test_not_due_before_interval() {
        let start = Instant::now();
        let cycle = ReportingCycle::new(DEFAULT_REPORT_INTERVAL, start);
        assert!(!cycle.is_due(start));
        assert!(!cycle.is_due(start + Duration::from_millis(1999)));
        assert!(cycle.is_due(start + Duration::from_millis(2000)));
    }

    #[test]
    fn test_poll_skips_when_not_due() {
        let start = Instant::now();
        let mut cycle = ReportingCycle::new(DEFAULT_REPORT_INTERVAL, start);
        let mut state = alarmed_state();
        let transport = CannedTransport::ok("true");

        let outcome = cycle.poll(start, &mut state, &mut up(), &transport);

        assert!(outcome.is_none());
        assert!(transport.sent.borrow().is_empty());
        assert!(state.light_event());
    }

    #[test]
    fn test_late_tick_schedules_from_now() {
        let start = Instant::now();
        let mut cycle = ReportingCycle::new(DEFAULT_REPORT_INTERVAL, start);
        let mut state = AlarmState::new();
        let transport = CannedTransport::ok("true");
        let late = start + Duration::from_millis(4500);

        assert!(cycle.poll(late, &mut state, &mut up(), &transport).is_some());
        assert!(cycle
            .poll(late + Duration::from_millis(1), &mut state, &mut up(), &transport)
            .is_none());
        assert_eq!(transport.sent.borrow().len(), 1);
    }

    #[test]
    fn test_acknowledgement_keeps_alarm() {
        let start = Instant::now();
        let mut cycle = ReportingCycle::new(DEFAULT_REPORT_INTERVAL, start);
        let mut state = alarmed_state();
        assert!(state.motion_event());
        let transport = CannedTransport::ok("true");

        let outcome = cycle.run(start, &mut state, &mut up(), &transport);

        assert!(matches!(
            outcome,
            CycleOutcome::Delivered { reset: false, status: 200, .. }
        ));
        assert!(state.alarm_active());
        assert!(!state.light_event());
        assert!(!state.motion_event());
        assert_eq!(
            transport.sent.borrow()[0],
            r#"{"light_level":100,"motion_detected":true,"alarm_active":true,"vault_status":"OPEN"}"#
        );
    }

    #[test]
    fn test_reset_directive_clears_alarm() {
        let start = Instant::now();
        let mut cycle = ReportingCycle::new(DEFAULT_REPORT_INTERVAL, start);
        let mut state = alarmed_state();

        let outcome = cycle.run(start, &mut state, &mut up(), &CannedTransport::ok("\"false\""));

        assert!(outcome.reset_applied());
        assert!(!state.alarm_active());
    }

    #[test]
    fn test_server_error_is_not_a_directive() {
        let start = Instant::now();
        let mut cycle = ReportingCycle::new(DEFAULT_REPORT_INTERVAL, start);
        let mut state = alarmed_state();
        assert!(state.motion_event());

        let outcome = cycle.run(start, &mut state, &mut up(), &CannedTransport::status(500));

        assert!(matches!(outcome, CycleOutcome::Failed { .. }));
        assert!(state.alarm_active());
        assert!(!state.light_event());
        assert!(!state.motion_event());
    }

    #[test]
    fn test_link_down_defers_and_reconnects() {
        let start = Instant::now();
        let mut cycle = ReportingCycle::new(DEFAULT_REPORT_INTERVAL, start);
        let mut state = alarmed_state();
        assert!(state.motion_event());
        let mut link = FixedLink {
            up: false,
            reconnects: 0,
        };
        let transport = CannedTransport::ok("false");

        let outcome = cycle.run(start, &mut state, &mut link, &transport);

        assert!(matches!(outcome, CycleOutcome::LinkDown));
        assert_eq!(link.reconnects, 1);
        assert!(transport.sent.borrow().is_empty());
        assert!(state.alarm_active());
        assert!(!state.light_event());
        assert!(!state.motion_event());
    }
}
