//! Sample types produced by the sensor sampler.

use serde::{Deserialize, Serialize};

/// Acceleration magnitude of a device at rest, in g.
pub const RESTING_MAGNITUDE: f64 = 1.0;

/// A 3-axis acceleration reading in g.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Acceleration {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Acceleration of a device lying flat and still.
    pub fn resting() -> Self {
        Self::new(0.0, 0.0, RESTING_MAGNITUDE)
    }

    /// Total force magnitude, independent of orientation.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// How far the magnitude strays from resting gravity.
    pub fn deviation_from_rest(&self) -> f64 {
        (self.magnitude() - RESTING_MAGNITUDE).abs()
    }
}

impl From<[f64; 3]> for Acceleration {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// One tick's worth of sensor readings. Never retained past the tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    /// Raw light level (higher is brighter)
    pub light_intensity: u16,
    /// Acceleration vector
    pub acceleration: Acceleration,
}

impl SensorSample {
    pub fn new(light_intensity: u16, acceleration: impl Into<Acceleration>) -> Self {
        Self {
            light_intensity,
            acceleration: acceleration.into(),
        }
    }

    /// A dark, motionless enclosure.
    pub fn quiet() -> Self {
        Self::new(0, Acceleration::resting())
    }
}
