//! Sample buffers and channel sets
//!
//! A [`SampleBuffer`] is one channel of double-precision samples. A
//! [`ChannelSet`] is the final multichannel layout handed to the encoder:
//! built once, read-only afterwards.

use crate::error::{Result, SignalError};

/// One channel of samples, logically bounded to [-1, 1] after final gain
pub type SampleBuffer = Vec<f64>;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f64::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Largest absolute sample value, 0.0 for an empty slice
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0_f64, |m, s| m.max(s.abs()))
}

/// Root mean square level, 0.0 for an empty slice
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f64).sqrt()
}

// ============================================================================
// Channel Set
// ============================================================================

/// Ordered, equal-length channels plus their sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSet {
    channels: Vec<SampleBuffer>,
    sample_rate: u32,
}

impl ChannelSet {
    /// Build a channel set from one or two equal-length buffers
    pub fn new(channels: Vec<SampleBuffer>, sample_rate: u32) -> Result<Self> {
        if channels.is_empty() || channels.len() > 2 {
            return Err(SignalError::invalid(
                "channels",
                format!("{} channels (only mono or stereo supported)", channels.len()),
            ));
        }
        let expected = channels[0].len();
        if let Some(bad) = channels.iter().find(|c| c.len() != expected) {
            return Err(SignalError::ChannelMismatch {
                expected,
                actual: bad.len(),
            });
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Single-channel set
    pub fn mono(samples: SampleBuffer, sample_rate: u32) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> &[f64] {
        &self.channels[index]
    }

    pub fn channels(&self) -> &[SampleBuffer] {
        &self.channels
    }

    /// Peak across all channels
    pub fn peak(&self) -> f64 {
        self.channels.iter().map(|c| peak(c)).fold(0.0, f64::max)
    }
}
