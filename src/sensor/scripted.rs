//! Desktop samplers: a resting enclosure and a replayed script.

use crate::sensor::types::{Acceleration, SensorSample};
use crate::sensor::SensorSampler;
use serde::Deserialize;
use std::path::Path;

/// A sampler that always reports a dark, still enclosure.
#[derive(Debug, Default, Clone, Copy)]
pub struct RestingSampler;

impl SensorSampler for RestingSampler {
    fn read_light(&mut self) -> u16 {
        0
    }

    fn read_acceleration(&mut self) -> Acceleration {
        Acceleration::resting()
    }
}

/// Errors that can occur while loading a sample script.
#[derive(Debug)]
pub enum ScriptError {
    IoError(String),
    ParseError { line: usize, message: String },
    Empty,
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptError::IoError(e) => write!(f, "IO error: {e}"),
            ScriptError::ParseError { line, message } => {
                write!(f, "Parse error on line {line}: {message}")
            }
            ScriptError::Empty => write!(f, "Script contains no samples"),
        }
    }
}

impl std::error::Error for ScriptError {}

/// One line of a sample script.
#[derive(Debug, Deserialize)]
struct ScriptLine {
    #[serde(default)]
    light: u16,
    #[serde(default = "resting_accel")]
    accel: [f64; 3],
}

fn resting_accel() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

/// Replays a fixed sequence of samples, one per tick.
///
/// Once the script runs out, the last sample is held, the same way a
/// real sensor keeps reporting its last known value.
#[derive(Debug, Clone)]
pub struct ScriptedSampler {
    samples: Vec<SensorSample>,
    cursor: usize,
}

impl ScriptedSampler {
    /// Create a sampler from an in-memory sequence.
    pub fn new(samples: Vec<SensorSample>) -> Result<Self, ScriptError> {
        if samples.is_empty() {
            return Err(ScriptError::Empty);
        }
        Ok(Self { samples, cursor: 0 })
    }

    /// Parse a JSON-lines script such as `{"light": 120, "accel": [0.0, 0.3, 1.1]}`.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse(script: &str) -> Result<Self, ScriptError> {
        let mut samples = Vec::new();
        for (idx, raw) in script.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed: ScriptLine =
                serde_json::from_str(line).map_err(|e| ScriptError::ParseError {
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            samples.push(SensorSample::new(parsed.light, parsed.accel));
        }
        Self::new(samples)
    }

    /// Load a script from disk.
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ScriptError::IoError(e.to_string()))?;
        Self::parse(&content)
    }

    /// Number of samples in the script.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Whether every scripted sample has been replayed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.samples.len()
    }

    fn current(&self) -> SensorSample {
        let idx = self.cursor.min(self.samples.len() - 1);
        self.samples[idx]
    }
}

impl SensorSampler for ScriptedSampler {
    fn read_light(&mut self) -> u16 {
        self.current().light_intensity
    }

    fn read_acceleration(&mut self) -> Acceleration {
        self.current().acceleration
    }

    fn sample(&mut self) -> SensorSample {
        let sample = self.current();
        if self.cursor < self.samples.len() {
            self.cursor += 1;
        }
        sample
    }
}
