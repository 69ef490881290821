//! TPDF dither
//!
//! Triangular noise `(u1 − u2)·A` with `u1, u2` uniform in [0, 1), added
//! before quantization. `A` is one LSB of the output format.

use std::ops::Range;

use rand::rngs::StdRng;
use rand::Rng;

use crate::dsp::timeline::RepetitionPlan;
use crate::dsp::Processor;
use crate::engine::SampleBuffer;
use crate::generators::entropy;
use crate::request::{Dither, DitherMode, DitherRegion, EncodingFormat};

/// Dither amplitude for an output format: `2^-(bits-1)` for PCM, `2^-24`
/// (the float mantissa step at full scale) for float
pub fn dither_amplitude(format: EncodingFormat) -> f64 {
    match format {
        EncodingFormat::Pcm16 => 1.0 / 32768.0,
        EncodingFormat::Pcm24 => 1.0 / 8_388_608.0,
        EncodingFormat::Float32 => 2f64.powi(-24),
    }
}

/// Sample ranges of the padded buffer that receive dither.
///
/// The silent region is everything outside the repetitions: lead, the gaps
/// between repetitions and trail. Empty ranges are dropped.
pub fn dither_ranges(region: DitherRegion, plan: &RepetitionPlan) -> Vec<Range<usize>> {
    let total = plan.total_len();
    let ranges = match region {
        DitherRegion::All => vec![0..total],
        DitherRegion::Signal => (0..plan.repetitions).map(|i| plan.segment(i)).collect(),
        DitherRegion::Silence => {
            let mut ranges = vec![0..plan.lead];
            ranges.extend((0..plan.repetitions).map(|i| plan.gap_after(i)));
            ranges.push(plan.signal_range().end..total);
            ranges
        }
    };
    ranges.into_iter().filter(|r| !r.is_empty()).collect()
}

/// Dither stage
pub struct Ditherer {
    amplitude: f64,
    ranges: Vec<Range<usize>>,
    rng: StdRng,
}

impl Ditherer {
    pub fn new(amplitude: f64, ranges: Vec<Range<usize>>, rng: StdRng) -> Self {
        Self {
            amplitude,
            ranges,
            rng,
        }
    }

    /// Ditherer for a request, or `None` when dither is off
    pub fn for_request(
        dither: &Dither,
        format: EncodingFormat,
        plan: &RepetitionPlan,
    ) -> Option<Self> {
        match dither.mode {
            DitherMode::Off => None,
            DitherMode::Tpdf => Some(Self::new(
                dither_amplitude(format),
                dither_ranges(dither.region, plan),
                entropy(dither.seed),
            )),
        }
    }

    pub fn apply(&mut self, samples: &mut [f64]) {
        let len = samples.len();
        for range in &self.ranges {
            let range = range.start.min(len)..range.end.min(len);
            for s in &mut samples[range] {
                let u1: f64 = self.rng.random();
                let u2: f64 = self.rng.random();
                *s += (u1 - u2) * self.amplitude;
            }
        }
    }
}

impl Processor for Ditherer {
    fn name(&self) -> &'static str {
        "dither"
    }

    fn process(&mut self, mut buffer: SampleBuffer) -> SampleBuffer {
        self.apply(&mut buffer);
        buffer
    }
}
