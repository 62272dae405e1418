//! Status report payload and reset directive parsing.

use crate::core::latch::AlarmState;
use serde::{Deserialize, Serialize};

/// Literal that marks a response as a reset directive.
pub const RESET_MARKER: &str = "false";

/// Whether the enclosure has been opened during the interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaultStatus {
    Open,
    #[default]
    Closed,
}

impl std::fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultStatus::Open => write!(f, "OPEN"),
            VaultStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Snapshot sent to the supervisory endpoint each reporting cycle.
///
/// Field order is the wire order. Fields missing from a parsed body take
/// their quiet defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusReport {
    pub light_level: u16,
    pub motion_detected: bool,
    pub alarm_active: bool,
    pub vault_status: VaultStatus,
}

impl StatusReport {
    /// Snapshot the current state.
    pub fn from_state(state: &AlarmState) -> Self {
        Self {
            light_level: state.last_light_level(),
            motion_detected: state.motion_event(),
            alarm_active: state.alarm_active(),
            vault_status: if state.light_event() {
                VaultStatus::Open
            } else {
                VaultStatus::Closed
            },
        }
    }

    /// Compact JSON body.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Whether a response body asks the node to silence its alarm.
///
/// Any occurrence of `false` counts, quoted or not. This also matches
/// text like `"false alarm"`; the supervisor only ever answers `true` or
/// `false`, so that is accepted.
pub fn is_reset_directive(body: &str) -> bool {
    body.contains(RESET_MARKER)
}
