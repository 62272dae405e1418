//! Core functionality for the VaultAlert node.
//!
//! This module contains:
//! - The alarm latch that turns sensor samples into a sticky alarm
//! - The indicator driver that sounds the buzzer on alarm edges
//! - The status report and its reset directive
//! - The periodic reporting cycle

pub mod cycle;
pub mod indicator;
pub mod latch;
pub mod report;

// Re-export commonly used types
pub use cycle::{CycleOutcome, ReportingCycle, DEFAULT_REPORT_INTERVAL};
pub use indicator::{
    ConsoleBuzzer, Indicator, IndicatorAction, IndicatorDriver, DEFAULT_FREQUENCY_HZ,
};
pub use latch::{
    AlarmLatch, AlarmState, LatchEdges, DEFAULT_LIGHT_THRESHOLD, DEFAULT_MOTION_THRESHOLD,
};
pub use report::{is_reset_directive, StatusReport, VaultStatus, RESET_MARKER};
