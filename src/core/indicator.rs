//! Audible indicator driver.
//!
//! Indicators are not assumed to be idempotent, so the driver tracks what
//! it last commanded and only acts on alarm edges.

use std::io::Write;

/// Default buzzer tone in Hz.
pub const DEFAULT_FREQUENCY_HZ: u32 = 2000;

/// An audible output that can be started and stopped.
pub trait Indicator {
    fn start(&mut self, frequency_hz: u32);
    fn stop(&mut self);
}

/// Action issued by a reconcile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorAction {
    Start { frequency_hz: u32 },
    Stop,
}

/// Tracks the indicator's commanded state.
#[derive(Debug, Clone)]
pub struct IndicatorDriver {
    frequency_hz: u32,
    indicator_on: bool,
}

impl Default for IndicatorDriver {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCY_HZ)
    }
}

impl IndicatorDriver {
    pub fn new(frequency_hz: u32) -> Self {
        Self {
            frequency_hz,
            indicator_on: false,
        }
    }

    pub fn is_on(&self) -> bool {
        self.indicator_on
    }

    /// Bring the indicator in line with the alarm flag.
    pub fn reconcile<I: Indicator + ?Sized>(
        &mut self,
        alarm_active: bool,
        indicator: &mut I,
    ) -> Option<IndicatorAction> {
        match (alarm_active, self.indicator_on) {
            (false, true) => {
                indicator.stop();
                self.indicator_on = false;
                Some(IndicatorAction::Stop)
            }
            (true, false) => {
                indicator.start(self.frequency_hz);
                self.indicator_on = true;
                Some(IndicatorAction::Start {
                    frequency_hz: self.frequency_hz,
                })
            }
            _ => None,
        }
    }
}

/// Indicator rendered on the console for desktop runs.
#[derive(Debug, Default)]
pub struct ConsoleBuzzer {
    bell: bool,
    sounding: Option<u32>,
}

impl ConsoleBuzzer {
    /// Create a buzzer; with `bell` set, a terminal bell rings on start.
    pub fn new(bell: bool) -> Self {
        Self {
            bell,
            sounding: None,
        }
    }

    /// Frequency currently sounding, if any.
    pub fn sounding(&self) -> Option<u32> {
        self.sounding
    }
}

impl Indicator for ConsoleBuzzer {
    fn start(&mut self, frequency_hz: u32) {
        tracing::warn!(frequency_hz, "Buzzer on");
        if self.bell {
            let mut stderr = std::io::stderr();
            let _ = stderr.write_all(b"\x07");
            let _ = stderr.flush();
        }
        self.sounding = Some(frequency_hz);
    }

    fn stop(&mut self) {
        tracing::info!("Buzzer off");
        self.sounding = None;
    }
}
