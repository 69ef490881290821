//! Channel layout
//!
//! Turns the padded, dithered mono timeline into the final channel set.
//! Lead silence, gaps and trail are copied to every channel; only the
//! repetition segments are routed.

use crate::dsp::timeline::RepetitionPlan;
use crate::engine::{ChannelSet, SampleBuffer};
use crate::error::Result;
use crate::request::ChannelMode;

/// Where repetition `i` goes for the routed modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Left,
    Right,
    Both,
}

fn route(mode: ChannelMode, repetition: usize) -> Route {
    match mode {
        ChannelMode::Alternating => {
            if repetition % 2 == 0 {
                Route::Left
            } else {
                Route::Right
            }
        }
        ChannelMode::Rotating => match repetition % 3 {
            0 => Route::Left,
            1 => Route::Right,
            _ => Route::Both,
        },
        _ => Route::Both,
    }
}

/// Build the channel set for `mode` from the mono timeline
pub fn build_layout(
    timeline: SampleBuffer,
    mode: ChannelMode,
    plan: &RepetitionPlan,
    sample_rate: u32,
) -> Result<ChannelSet> {
    match mode {
        ChannelMode::Mono => Ok(ChannelSet::mono(timeline, sample_rate)),
        ChannelMode::Stereo => {
            let right = timeline.clone();
            ChannelSet::new(vec![timeline, right], sample_rate)
        }
        ChannelMode::SyncImpulse => {
            let mut right = vec![0.0; timeline.len()];
            if let Some(s) = right.get_mut(plan.lead) {
                *s = 1.0;
            }
            ChannelSet::new(vec![timeline, right], sample_rate)
        }
        ChannelMode::Alternating | ChannelMode::Rotating => {
            let mut left = timeline.clone();
            let mut right = timeline;
            let len = left.len();
            for i in 0..plan.repetitions {
                let segment = plan.segment(i);
                let segment = segment.start.min(len)..segment.end.min(len);
                match route(mode, i) {
                    Route::Left => right[segment].fill(0.0),
                    Route::Right => left[segment].fill(0.0),
                    Route::Both => {}
                }
            }
            ChannelSet::new(vec![left, right], sample_rate)
        }
    }
}
