//! Repetition and silence padding
//!
//! Both stages, the dither region and the channel layout read their
//! boundaries from one [`RepetitionPlan`], so every stage agrees on where
//! each repetition starts.

use std::ops::Range;

use crate::dsp::Processor;
use crate::engine::SampleBuffer;
use crate::request::SignalRequest;

/// Sample positions of the final timeline
///
/// ```text
/// | lead | seg 0 | gap | seg 1 | gap | ... | seg R-1 | trail |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepetitionPlan {
    pub lead: usize,
    pub segment_len: usize,
    pub gap: usize,
    pub repetitions: usize,
    pub trail: usize,
}

impl RepetitionPlan {
    pub fn new(
        lead: usize,
        segment_len: usize,
        gap: usize,
        repetitions: usize,
        trail: usize,
    ) -> Self {
        Self {
            lead,
            segment_len,
            gap,
            repetitions: repetitions.max(1),
            trail,
        }
    }

    /// Plan for a request whose generated signal is `segment_len` samples
    pub fn for_request(request: &SignalRequest, segment_len: usize) -> Self {
        Self::new(
            request.secs_to_samples(request.lead_silence_secs),
            segment_len,
            request.secs_to_samples(request.repetition_gap_secs),
            request.repetitions as usize,
            request.secs_to_samples(request.trail_silence_secs),
        )
    }

    /// Start of repetition `i` in the final timeline: `lead + i·(N + G)`
    pub fn segment_start(&self, i: usize) -> usize {
        self.lead + i * (self.segment_len + self.gap)
    }

    /// Samples of repetition `i` in the final timeline
    pub fn segment(&self, i: usize) -> Range<usize> {
        let start = self.segment_start(i);
        start..start + self.segment_len
    }

    /// Silent gap after repetition `i`, empty after the last one
    pub fn gap_after(&self, i: usize) -> Range<usize> {
        let end = self.segment(i).end;
        if i + 1 >= self.repetitions {
            end..end
        } else {
            end..end + self.gap
        }
    }

    /// Length of the repeated block without lead and trail
    pub fn core_len(&self) -> usize {
        self.repetitions * self.segment_len + (self.repetitions - 1) * self.gap
    }

    /// Repetitions and gaps in the final timeline
    pub fn signal_range(&self) -> Range<usize> {
        self.lead..self.lead + self.core_len()
    }

    pub fn total_len(&self) -> usize {
        self.lead + self.core_len() + self.trail
    }
}

/// Repeat the segment `R` times with `G` zeros between copies
pub fn repeat(segment: &[f64], repetitions: usize, gap: usize) -> SampleBuffer {
    let repetitions = repetitions.max(1);
    let mut out = Vec::with_capacity(repetitions * segment.len() + (repetitions - 1) * gap);
    for i in 0..repetitions {
        if i > 0 {
            out.resize(out.len() + gap, 0.0);
        }
        out.extend_from_slice(segment);
    }
    out
}

/// Surround `core` with lead and trail silence
pub fn pad(core: &[f64], lead: usize, trail: usize) -> SampleBuffer {
    let mut out = Vec::with_capacity(lead + core.len() + trail);
    out.resize(lead, 0.0);
    out.extend_from_slice(core);
    out.resize(out.len() + trail, 0.0);
    out
}

/// Repetition stage
#[derive(Debug, Clone, Copy)]
pub struct Repeater {
    plan: RepetitionPlan,
}

impl Repeater {
    pub fn new(plan: RepetitionPlan) -> Self {
        Self { plan }
    }
}

impl Processor for Repeater {
    fn name(&self) -> &'static str {
        "repeat"
    }

    fn process(&mut self, buffer: SampleBuffer) -> SampleBuffer {
        if self.plan.repetitions == 1 {
            return buffer;
        }
        repeat(&buffer, self.plan.repetitions, self.plan.gap)
    }
}

/// Silence padding stage
#[derive(Debug, Clone, Copy)]
pub struct Padder {
    plan: RepetitionPlan,
}

impl Padder {
    pub fn new(plan: RepetitionPlan) -> Self {
        Self { plan }
    }
}

impl Processor for Padder {
    fn name(&self) -> &'static str {
        "pad"
    }

    fn process(&mut self, buffer: SampleBuffer) -> SampleBuffer {
        if self.plan.lead == 0 && self.plan.trail == 0 {
            return buffer;
        }
        pad(&buffer, self.plan.lead, self.plan.trail)
    }
}
