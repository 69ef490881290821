//! Tone-burst patterns
//!
//! An explicit, ordered list of bursts. Unlike stepped tones nothing is
//! derived: each step carries its own frequency, level and timing.

use crate::engine::SampleBuffer;
use crate::generators::stepped::push_tapered_tone;
use crate::progress::Progress;
use crate::request::ToneBurstStep;

/// Samples for a duration in milliseconds
fn ms_to_samples(ms: f64, sample_rate: u32) -> usize {
    (ms * sample_rate as f64 / 1000.0).round() as usize
}

/// On and off sample counts of one step
pub fn step_samples(step: &ToneBurstStep, sample_rate: u32) -> (usize, usize) {
    (
        ms_to_samples(step.on_ms, sample_rate),
        ms_to_samples(step.off_ms, sample_rate),
    )
}

/// Render the pattern: each burst is a tapered sine at `10^(level/20)`,
/// followed by its off time in silence.
pub fn tone_burst(
    steps: &[ToneBurstStep],
    sample_rate: u32,
    progress: &mut dyn Progress,
) -> SampleBuffer {
    let total: usize = steps
        .iter()
        .map(|s| {
            let (on, off) = step_samples(s, sample_rate);
            on + off
        })
        .sum();

    let mut out = Vec::with_capacity(total);
    for (i, step) in steps.iter().enumerate() {
        let (on, off) = step_samples(step, sample_rate);
        let amplitude = 10f64.powf(step.level_db / 20.0);
        push_tapered_tone(&mut out, step.frequency_hz, amplitude, on, sample_rate);
        out.resize(out.len() + off, 0.0);
        progress.report((i + 1) as f64 / steps.len() as f64);
    }
    progress.report(1.0);
    out
}
