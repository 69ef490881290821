//! Stepped sine tones
//!
//! A list of fixed frequencies across [f1, f2], each played for a dwell time
//! with tapered edges and followed by a silent gap. The frequency list is a
//! pure function of its inputs so that duration estimates, equalization and
//! plotting all see the same steps.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::engine::SampleBuffer;
use crate::progress::{tick, Progress};

/// Edge taper length for stepped tones and bursts, in seconds
pub const TAPER_SECS: f64 = 0.005;

/// Tolerance for including the end frequency in a logarithmic list
const END_TOLERANCE: f64 = 1.001;

/// How the step frequencies are distributed across the range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSpacing {
    /// Equal ratio per step, `steps_per_octave` steps per doubling
    #[default]
    Logarithmic,
    /// Equal spacing in Hz, same number of steps as the logarithmic list
    Linear,
}

/// Upper bound on the number of steps in one request
pub const MAX_STEPS: usize = 100_000;

/// Number of logarithmic steps in [f1, f2 × 1.001]: `floor(spo·log2(f2·1.001/f1)) + 1`.
///
/// Saturates instead of overflowing, so absurd densities come back as a huge
/// count that validation can reject. Returns 0 for an invalid range.
pub fn step_count(start_hz: f64, end_hz: f64, steps_per_octave: f64) -> usize {
    if !(start_hz > 0.0 && end_hz >= start_hz && steps_per_octave > 0.0) {
        return 0;
    }
    let octaves = (end_hz * END_TOLERANCE / start_hz).log2();
    ((steps_per_octave * octaves).floor() as usize).saturating_add(1)
}

/// Derive the step frequencies.
///
/// Logarithmic: `f1·2^(i/spo)` for every i whose frequency does not exceed
/// `f2 × 1.001`. Linear: the same count, evenly spaced from f1 to f2. The
/// list never holds more than [`MAX_STEPS`] entries.
pub fn step_frequencies(
    start_hz: f64,
    end_hz: f64,
    steps_per_octave: f64,
    spacing: StepSpacing,
) -> Vec<f64> {
    let count = step_count(start_hz, end_hz, steps_per_octave).min(MAX_STEPS);
    if count == 0 {
        return Vec::new();
    }

    let limit = end_hz * END_TOLERANCE;
    let log_freqs: Vec<f64> = (0..count)
        .map(|i| start_hz * 2f64.powf(i as f64 / steps_per_octave))
        .take_while(|&f| f <= limit)
        .collect();

    match spacing {
        StepSpacing::Logarithmic => log_freqs,
        StepSpacing::Linear => {
            let count = log_freqs.len();
            if count < 2 {
                return vec![start_hz];
            }
            let step = (end_hz - start_hz) / (count - 1) as f64;
            (0..count).map(|i| start_hz + step * i as f64).collect()
        }
    }
}

/// Taper length in samples for a tone of `tone_len` samples: a fixed
/// [`TAPER_SECS`], capped at a quarter of the tone.
pub fn taper_len(tone_len: usize, sample_rate: u32) -> usize {
    let fixed = (TAPER_SECS * sample_rate as f64).round() as usize;
    fixed.min(tone_len / 4)
}

/// Append a sine tone of `len` samples with raised-cosine edges
pub(crate) fn push_tapered_tone(
    out: &mut SampleBuffer,
    frequency_hz: f64,
    amplitude: f64,
    len: usize,
    sample_rate: u32,
) {
    let taper = taper_len(len, sample_rate);
    let w = 2.0 * PI * frequency_hz / sample_rate as f64;
    for i in 0..len {
        let mut s = amplitude * (w * i as f64).sin();
        if taper > 0 {
            let edge = i.min(len - 1 - i);
            if edge < taper {
                s *= 0.5 * (1.0 - (PI * edge as f64 / taper as f64).cos());
            }
        }
        out.push(s);
    }
}

/// Generate the stepped tone sequence for the given frequency list
pub fn stepped_tone(
    frequencies: &[f64],
    dwell_secs: f64,
    gap_secs: f64,
    sample_rate: u32,
    progress: &mut dyn Progress,
) -> SampleBuffer {
    let sr = sample_rate as f64;
    let dwell = (dwell_secs * sr).round() as usize;
    let gap = (gap_secs * sr).round() as usize;
    let total = frequencies.len() * (dwell + gap);

    let mut out = Vec::with_capacity(total);
    for &f in frequencies {
        tick(progress, out.len(), total);
        push_tapered_tone(&mut out, f, 1.0, dwell, sample_rate);
        out.resize(out.len() + gap, 0.0);
        progress.report(out.len() as f64 / total as f64);
    }
    progress.report(1.0);
    out
}
