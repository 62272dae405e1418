//! The node's control loop.
//!
//! One iteration samples the sensors, folds the sample into the alarm
//! latch, reconciles the buzzer, and runs the reporting cycle when it is
//! due. Everything happens on the calling thread; the loop owns the
//! [`AlarmState`] and lends it to each step in turn.

use crate::activity::{create_shared_log, SharedActivityLog};
use crate::config::Config;
use crate::core::{
    AlarmLatch, AlarmState, CycleOutcome, Indicator, IndicatorAction, IndicatorDriver,
    LatchEdges, ReportingCycle, DEFAULT_FREQUENCY_HZ, DEFAULT_LIGHT_THRESHOLD,
    DEFAULT_MOTION_THRESHOLD, DEFAULT_REPORT_INTERVAL,
};
use crate::link::NetworkLink;
use crate::sensor::{SensorSample, SensorSampler};
use crate::transport::ReportTransport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Tunables for the alarm core.
#[derive(Debug, Clone, Copy)]
pub struct NodeSettings {
    pub light_threshold: u16,
    pub motion_threshold: f64,
    pub report_interval: Duration,
    pub indicator_frequency_hz: u32,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            light_threshold: DEFAULT_LIGHT_THRESHOLD,
            motion_threshold: DEFAULT_MOTION_THRESHOLD,
            report_interval: DEFAULT_REPORT_INTERVAL,
            indicator_frequency_hz: DEFAULT_FREQUENCY_HZ,
        }
    }
}

impl From<&Config> for NodeSettings {
    fn from(config: &Config) -> Self {
        Self {
            light_threshold: config.light_threshold,
            motion_threshold: config.motion_threshold,
            report_interval: config.report_interval,
            indicator_frequency_hz: config.indicator_frequency_hz,
        }
    }
}

/// Everything that happened during one tick.
#[derive(Debug)]
pub struct TickReport {
    pub sample: SensorSample,
    pub edges: LatchEdges,
    pub indicator: Option<IndicatorAction>,
    pub cycle: Option<CycleOutcome>,
}

/// A VaultAlert node wired to its sensors, buzzer, link and transport.
pub struct Node<S, I, L, T> {
    latch: AlarmLatch,
    driver: IndicatorDriver,
    cycle: ReportingCycle,
    state: AlarmState,
    sampler: S,
    indicator: I,
    link: L,
    transport: T,
    activity: SharedActivityLog,
}

impl<S, I, L, T> Node<S, I, L, T>
where
    S: SensorSampler,
    I: Indicator,
    L: NetworkLink,
    T: ReportTransport,
{
    /// Create a node. The reporting timer starts at `started_at`.
    pub fn new(
        settings: NodeSettings,
        sampler: S,
        indicator: I,
        link: L,
        transport: T,
        started_at: Instant,
    ) -> Self {
        Self {
            latch: AlarmLatch::new(settings.light_threshold, settings.motion_threshold),
            driver: IndicatorDriver::new(settings.indicator_frequency_hz),
            cycle: ReportingCycle::new(settings.report_interval, started_at),
            state: AlarmState::new(),
            sampler,
            indicator,
            link,
            transport,
            activity: create_shared_log(),
        }
    }

    /// Share an existing activity log instead of the node's own.
    pub fn with_activity_log(mut self, activity: SharedActivityLog) -> Self {
        self.activity = activity;
        self
    }

    /// Run one iteration of the control loop.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        self.activity.record_tick();

        let sample = self.sampler.sample();
        let edges = self.latch.evaluate(&sample, &mut self.state);
        self.activity.record_edges(&edges);

        let indicator = self
            .driver
            .reconcile(self.state.alarm_active(), &mut self.indicator);

        let cycle = self
            .cycle
            .poll(now, &mut self.state, &mut self.link, &self.transport);
        if let Some(ref outcome) = cycle {
            self.activity.record_cycle(outcome);
            if let CycleOutcome::Delivered { report, .. } = outcome {
                tracing::info!(
                    light_level = report.light_level,
                    motion = report.motion_detected,
                    alarm = report.alarm_active,
                    vault = %report.vault_status,
                    "Report delivered"
                );
            }
        }

        TickReport {
            sample,
            edges,
            indicator,
            cycle,
        }
    }

    /// Tick at a fixed rate until `running` is cleared or `max_ticks` is
    /// reached. Returns the number of ticks run.
    ///
    /// A tick that overruns its slot (usually a slow report) is followed
    /// immediately by the next one.
    pub fn run(&mut self, running: &AtomicBool, tick_interval: Duration, max_ticks: Option<u64>) -> u64 {
        let mut ticks = 0;

        while running.load(Ordering::SeqCst) && max_ticks.map_or(true, |max| ticks < max) {
            let tick_start = Instant::now();
            self.tick(tick_start);
            ticks += 1;

            let elapsed = tick_start.elapsed();
            if elapsed < tick_interval {
                std::thread::sleep(tick_interval - elapsed);
            }
        }

        ticks
    }

    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    pub fn indicator_on(&self) -> bool {
        self.driver.is_on()
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn activity(&self) -> &SharedActivityLog {
        &self.activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConsoleBuzzer;
    use crate::sensor::RestingSampler;
    use crate::transport::{TransportError, TransportResponse};

    struct UpLink;

    impl NetworkLink for UpLink {
        fn is_connected(&mut self) -> bool {
            true
        }

        fn attempt_reconnect(&mut self) {}
    }

    struct AckTransport;

    impl ReportTransport for AckTransport {
        fn send(&self, _body: &str) -> Result<TransportResponse, TransportError> {
            Ok(TransportResponse {
                status: 200,
                body: "true".to_string(),
            })
        }
    }

    #[test]
    fn test_tick_updates_activity() {
        let start = Instant::now();
        let mut node = Node::new(
            NodeSettings::default(),
            RestingSampler,
            ConsoleBuzzer::default(),
            UpLink,
            AckTransport,
            start,
        );

        let report = node.tick(start);

        assert!(!report.edges.any());
        assert!(report.indicator.is_none());
        assert!(report.cycle.is_none());
        assert_eq!(node.activity().stats().ticks, 1);
    }

    #[test]
    fn test_run_stops_at_max_ticks() {
        let mut node = Node::new(
            NodeSettings::default(),
            RestingSampler,
            ConsoleBuzzer::default(),
            UpLink,
            AckTransport,
            Instant::now(),
        );
        let running = AtomicBool::new(true);

        let ticks = node.run(&running, Duration::from_millis(1), Some(5));

        assert_eq!(ticks, 5);
        assert_eq!(node.activity().stats().ticks, 5);
    }

    #[test]
    fn test_run_honours_stop_flag() {
        let mut node = Node::new(
            NodeSettings::default(),
            RestingSampler,
            ConsoleBuzzer::default(),
            UpLink,
            AckTransport,
            Instant::now(),
        );
        let running = AtomicBool::new(false);

        assert_eq!(node.run(&running, Duration::from_millis(1), None), 0);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.light_threshold = 700;
        config.indicator_frequency_hz = 880;

        let settings = NodeSettings::from(&config);
        assert_eq!(settings.light_threshold, 700);
        assert_eq!(settings.indicator_frequency_hz, 880);
    }
}
