//! In-memory session activity log.
//!
//! Counters only; nothing here survives a restart.

use crate::core::{CycleOutcome, LatchEdges};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Activity counters for the current session.
#[derive(Debug)]
pub struct ActivityLog {
    /// Control loop iterations
    ticks: AtomicU64,
    /// Fresh motion edges
    motion_triggers: AtomicU64,
    /// Fresh light edges
    light_triggers: AtomicU64,
    /// Times the alarm went from idle to active
    alarms_raised: AtomicU64,
    /// Reports accepted by the endpoint
    reports_delivered: AtomicU64,
    /// Reports that failed in transport
    report_failures: AtomicU64,
    /// Reset directives applied
    remote_resets: AtomicU64,
    /// Reports skipped because the link was down
    link_down_deferrals: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl ActivityLog {
    /// Create a new activity log.
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            motion_triggers: AtomicU64::new(0),
            light_triggers: AtomicU64::new(0),
            alarms_raised: AtomicU64::new(0),
            reports_delivered: AtomicU64::new(0),
            report_failures: AtomicU64::new(0),
            remote_resets: AtomicU64::new(0),
            link_down_deferrals: AtomicU64::new(0),
            session_start: Utc::now(),
        }
    }

    /// Record one loop iteration.
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the edges from one latch evaluation.
    pub fn record_edges(&self, edges: &LatchEdges) {
        if edges.motion {
            self.motion_triggers.fetch_add(1, Ordering::Relaxed);
        }
        if edges.light {
            self.light_triggers.fetch_add(1, Ordering::Relaxed);
        }
        if edges.alarm {
            self.alarms_raised.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record the result of a reporting cycle.
    pub fn record_cycle(&self, outcome: &CycleOutcome) {
        let counter = match outcome {
            CycleOutcome::LinkDown => &self.link_down_deferrals,
            CycleOutcome::Failed { .. } => &self.report_failures,
            CycleOutcome::Delivered { reset, .. } => {
                if *reset {
                    self.remote_resets.fetch_add(1, Ordering::Relaxed);
                }
                &self.reports_delivered
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            motion_triggers: self.motion_triggers.load(Ordering::Relaxed),
            light_triggers: self.light_triggers.load(Ordering::Relaxed),
            alarms_raised: self.alarms_raised.load(Ordering::Relaxed),
            reports_delivered: self.reports_delivered.load(Ordering::Relaxed),
            report_failures: self.report_failures.load(Ordering::Relaxed),
            remote_resets: self.remote_resets.load(Ordering::Relaxed),
            link_down_deferrals: self.link_down_deferrals.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Ticks: {}\n\
             - Motion triggers: {}\n\
             - Light triggers: {}\n\
             - Alarms raised: {}\n\
             - Reports delivered: {}\n\
             - Report failures: {}\n\
             - Remote resets: {}\n\
             - Reports deferred (link down): {}\n\
             - Session duration: {} seconds",
            stats.ticks,
            stats.motion_triggers,
            stats.light_triggers,
            stats.alarms_raised,
            stats.reports_delivered,
            stats.report_failures,
            stats.remote_resets,
            stats.link_down_deferrals,
            stats.session_duration_secs
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.ticks,
            &self.motion_triggers,
            &self.light_triggers,
            &self.alarms_raised,
            &self.reports_delivered,
            &self.report_failures,
            &self.remote_resets,
            &self.link_down_deferrals,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of activity statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStats {
    pub ticks: u64,
    pub motion_triggers: u64,
    pub light_triggers: u64,
    pub alarms_raised: u64,
    pub reports_delivered: u64,
    pub report_failures: u64,
    pub remote_resets: u64,
    pub link_down_deferrals: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

/// Create a new shared activity log.
pub fn create_shared_log() -> SharedActivityLog {
    Arc::new(ActivityLog::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StatusReport, VaultStatus};
    use crate::transport::TransportError;

    fn report() -> StatusReport {
        StatusReport {
            light_level: 0,
            motion_detected: false,
            alarm_active: true,
            vault_status: VaultStatus::Closed,
        }
    }

    #[test]
    fn test_edge_counting() {
        let log = ActivityLog::new();

        log.record_edges(&LatchEdges {
            motion: true,
            light: false,
            alarm: true,
        });
        log.record_edges(&LatchEdges {
            motion: false,
            light: true,
            alarm: false,
        });

        let stats = log.stats();
        assert_eq!(stats.motion_triggers, 1);
        assert_eq!(stats.light_triggers, 1);
        assert_eq!(stats.alarms_raised, 1);
    }

    #[test]
    fn test_cycle_counting() {
        let log = ActivityLog::new();

        log.record_cycle(&CycleOutcome::LinkDown);
        log.record_cycle(&CycleOutcome::Delivered {
            report: report(),
            status: 200,
            reset: true,
        });
        log.record_cycle(&CycleOutcome::Failed {
            report: report(),
            error: TransportError::Timeout,
        });

        let stats = log.stats();
        assert_eq!(stats.link_down_deferrals, 1);
        assert_eq!(stats.reports_delivered, 1);
        assert_eq!(stats.remote_resets, 1);
        assert_eq!(stats.report_failures, 1);
    }

    #[test]
    fn test_activity_log_reset() {
        let log = ActivityLog::new();
        log.record_tick();
        log.record_tick();
        log.reset();
        assert_eq!(log.stats().ticks, 0);
    }

    #[test]
    fn test_summary_format() {
        let log = ActivityLog::new();
        let summary = log.summary();

        assert!(summary.contains("Ticks"));
        assert!(summary.contains("Alarms raised"));
        assert!(summary.contains("Remote resets"));
    }
}
