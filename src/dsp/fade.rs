//! Fade shaping
//!
//! Multiplicative fade-in over the first L samples and a mirrored fade-out
//! over the last L. The half-Hann window is `0.5(1 − cos(πn/(L−1)))`, the
//! linear ramp `n/(L−1)`; both reach exactly 1.0 at the inner edge.

use std::f64::consts::PI;

use crate::dsp::Processor;
use crate::engine::SampleBuffer;
use crate::generators::SweepParams;
use crate::request::{Fade, FadeLength, FadeShape, SignalKind};

/// Window gain at position `n` of an `len`-sample fade-in
#[inline]
pub fn fade_gain(shape: FadeShape, n: usize, len: usize) -> f64 {
    if len < 2 {
        return 1.0;
    }
    let x = n as f64 / (len - 1) as f64;
    match shape {
        FadeShape::None => 1.0,
        FadeShape::Hann => 0.5 * (1.0 - (PI * x).cos()),
        FadeShape::Linear => x,
    }
}

/// Resolve a fade length in samples.
///
/// Octave lengths use the time the exponential sweep takes to cover its
/// first octave, `T·ln2 / ln(f2/f1)`. Other kinds have no octave length and
/// get no fade.
pub fn fade_len(fade: &Fade, signal: &SignalKind, sample_rate: u32) -> usize {
    if fade.is_none() {
        return 0;
    }
    let secs = match fade.length {
        FadeLength::Secs(secs) => secs,
        FadeLength::Octave => match *signal {
            SignalKind::ExponentialSweep {
                start_hz,
                end_hz,
                duration_secs,
            } => SweepParams::new(start_hz, end_hz, duration_secs, sample_rate).octave_secs(),
            _ => 0.0,
        },
    };
    (secs * sample_rate as f64).round().max(0.0) as usize
}

/// Fade-in and fade-out stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fader {
    pub fade_in: (FadeShape, usize),
    pub fade_out: (FadeShape, usize),
}

impl Fader {
    pub fn new(fade_in: (FadeShape, usize), fade_out: (FadeShape, usize)) -> Self {
        Self { fade_in, fade_out }
    }

    /// Resolve both fades of a request against its signal
    pub fn for_signal(fade_in: &Fade, fade_out: &Fade, signal: &SignalKind, sr: u32) -> Self {
        Self::new(
            (fade_in.shape, fade_len(fade_in, signal, sr)),
            (fade_out.shape, fade_len(fade_out, signal, sr)),
        )
    }

    pub fn is_identity(&self) -> bool {
        let inert = |(shape, len): (FadeShape, usize)| shape == FadeShape::None || len < 2;
        inert(self.fade_in) && inert(self.fade_out)
    }

    /// Apply both fades in place
    pub fn apply(&self, samples: &mut [f64]) {
        let n = samples.len();

        let (shape, len) = self.fade_in;
        let len = len.min(n);
        if shape != FadeShape::None && len >= 2 {
            for (i, s) in samples[..len].iter_mut().enumerate() {
                *s *= fade_gain(shape, i, len);
            }
        }

        let (shape, len) = self.fade_out;
        let len = len.min(n);
        if shape != FadeShape::None && len >= 2 {
            for i in 0..len {
                samples[n - 1 - i] *= fade_gain(shape, i, len);
            }
        }
    }
}

impl Processor for Fader {
    fn name(&self) -> &'static str {
        "fade"
    }

    fn process(&mut self, mut buffer: SampleBuffer) -> SampleBuffer {
        self.apply(&mut buffer);
        buffer
    }
}
