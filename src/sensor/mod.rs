//! Sensor sampling for the VaultAlert node.
//!
//! The node only needs two instantaneous readings per tick: a light level
//! and an acceleration vector. Real hardware sits behind [`SensorSampler`];
//! this crate ships a resting sampler and a scripted one for desktop runs.

pub mod scripted;
pub mod types;

// Re-export commonly used types
pub use scripted::{RestingSampler, ScriptedSampler};
pub use types::{Acceleration, SensorSample, RESTING_MAGNITUDE};

/// Source of instantaneous sensor readings.
///
/// Reads are synchronous and always succeed. Implementations that lose
/// contact with their hardware return a last-known or zero value instead.
pub trait SensorSampler {
    /// Current light level in raw ADC counts (0-4095).
    fn read_light(&mut self) -> u16;

    /// Current acceleration in g.
    fn read_acceleration(&mut self) -> Acceleration;

    /// Take a full sample for one tick.
    fn sample(&mut self) -> SensorSample {
        SensorSample {
            light_intensity: self.read_light(),
            acceleration: self.read_acceleration(),
        }
    }
}

impl<S: SensorSampler + ?Sized> SensorSampler for Box<S> {
    fn read_light(&mut self) -> u16 {
        (**self).read_light()
    }

    fn read_acceleration(&mut self) -> Acceleration {
        (**self).read_acceleration()
    }

    fn sample(&mut self) -> SensorSample {
        (**self).sample()
    }
}
