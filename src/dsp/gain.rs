//! Output level
//!
//! Scales the normalized signal to the requested dBFS level.

use log::warn;

use crate::dsp::Processor;
use crate::engine::{db_to_linear, SampleBuffer};
use crate::request::{MAX_LEVEL_DBFS, MIN_LEVEL_DBFS};

/// Level stage: multiplies by `10^(dBFS/20)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gain {
    level_dbfs: f64,
    gain_linear: f64,
}

impl Gain {
    /// Create a gain stage, clamping the level to [-60, 0] dBFS
    pub fn new(level_dbfs: f64) -> Self {
        let clamped = level_dbfs.clamp(MIN_LEVEL_DBFS, MAX_LEVEL_DBFS);
        if clamped != level_dbfs {
            warn!("Level {} dBFS clamped to {} dBFS", level_dbfs, clamped);
        }
        Self {
            level_dbfs: clamped,
            gain_linear: db_to_linear(clamped),
        }
    }

    /// Level in dBFS after clamping
    pub fn level_dbfs(&self) -> f64 {
        self.level_dbfs
    }

    pub fn gain_linear(&self) -> f64 {
        self.gain_linear
    }

    pub fn is_unity(&self) -> bool {
        self.level_dbfs == 0.0
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Processor for Gain {
    fn name(&self) -> &'static str {
        "gain"
    }

    fn process(&mut self, mut buffer: SampleBuffer) -> SampleBuffer {
        if self.is_unity() {
            return buffer;
        }
        for sample in buffer.iter_mut() {
            *sample *= self.gain_linear;
        }
        buffer
    }
}
