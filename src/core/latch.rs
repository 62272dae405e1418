//! Alarm latch: turns momentary sensor readings into a sticky alarm.
//!
//! The state carries two orthogonal sticky bits (`motion_event`,
//! `light_event`) that live for one reporting interval, and one derived
//! bit (`alarm_active`) that lives until a remote reset.
//!
//! ```text
//!   motion/light edge            remote reset
//!  ──────────────────▶ ACTIVE ─────────────────▶ IDLE
//!  IDLE                  ▲                        │
//!                        └──── next fresh edge ◀──┘
//! ```

use crate::sensor::SensorSample;

/// Default light threshold in raw ADC counts.
pub const DEFAULT_LIGHT_THRESHOLD: u16 = 50;

/// Default motion threshold as a deviation from 1 g.
pub const DEFAULT_MOTION_THRESHOLD: f64 = 0.2;

/// The node's only long-lived state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmState {
    alarm_active: bool,
    motion_event: bool,
    light_event: bool,
    last_light_level: u16,
}

impl AlarmState {
    /// All flags false, light level zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alarm_active(&self) -> bool {
        self.alarm_active
    }

    pub fn motion_event(&self) -> bool {
        self.motion_event
    }

    pub fn light_event(&self) -> bool {
        self.light_event
    }

    pub fn last_light_level(&self) -> u16 {
        self.last_light_level
    }

    /// Close the reporting interval. The alarm itself is untouched.
    pub fn clear_events(&mut self) {
        self.motion_event = false;
        self.light_event = false;
    }

    /// Apply a remote reset directive.
    ///
    /// Clears the alarm even when an event is still latched; a later
    /// evaluation re-raises it only from a fresh edge.
    pub fn remote_reset(&mut self) {
        self.alarm_active = false;
    }
}

/// Edges produced by a single evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatchEdges {
    /// `motion_event` went false → true
    pub motion: bool,
    /// `light_event` went false → true
    pub light: bool,
    /// `alarm_active` went false → true
    pub alarm: bool,
}

impl LatchEdges {
    pub fn any(&self) -> bool {
        self.motion || self.light || self.alarm
    }
}

/// Evaluates samples against the configured thresholds.
#[derive(Debug, Clone, Copy)]
pub struct AlarmLatch {
    light_threshold: u16,
    motion_threshold: f64,
}

impl Default for AlarmLatch {
    fn default() -> Self {
        Self::new(DEFAULT_LIGHT_THRESHOLD, DEFAULT_MOTION_THRESHOLD)
    }
}

impl AlarmLatch {
    pub fn new(light_threshold: u16, motion_threshold: f64) -> Self {
        Self {
            light_threshold,
            motion_threshold,
        }
    }

    pub fn light_threshold(&self) -> u16 {
        self.light_threshold
    }

    pub fn motion_threshold(&self) -> f64 {
        self.motion_threshold
    }

    /// Whether the sample shows the enclosure being moved.
    pub fn motion_tripped(&self, sample: &SensorSample) -> bool {
        sample.acceleration.deviation_from_rest() > self.motion_threshold
    }

    /// Whether the sample shows light inside the enclosure.
    pub fn light_tripped(&self, sample: &SensorSample) -> bool {
        sample.light_intensity > self.light_threshold
    }

    /// Fold one sample into the state.
    ///
    /// Event flags are only ever set here, and only on their first trip
    /// within the interval. `alarm_active` is never cleared here.
    pub fn evaluate(&self, sample: &SensorSample, state: &mut AlarmState) -> LatchEdges {
        let mut edges = LatchEdges::default();

        state.last_light_level = sample.light_intensity;

        if !state.motion_event && self.motion_tripped(sample) {
            state.motion_event = true;
            edges.motion = true;
            tracing::info!(
                magnitude = sample.acceleration.magnitude(),
                "Motion detected"
            );
        }

        if !state.light_event && self.light_tripped(sample) {
            state.light_event = true;
            edges.light = true;
            tracing::info!(light_level = sample.light_intensity, "Light detected");
        }

        if (state.motion_event || state.light_event) && !state.alarm_active {
            state.alarm_active = true;
            edges.alarm = true;
            tracing::warn!("Alarm triggered");
        }

        edges
    }
}
