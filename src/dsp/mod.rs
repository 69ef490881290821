//! Post-processing
//!
//! Deterministic stages between the generator and the encoder. Every stage
//! implements [`Processor`]; the pipeline runs them through a
//! [`ProcessingChain`] in the fixed order:
//! fade → equalization → gain → repetition → padding → dither, then builds
//! the channel layout.

mod chain;
mod processor;

pub mod dither;
pub mod fade;
pub mod gain;
pub mod layout;
pub mod timeline;
pub mod weighting;

pub use chain::ProcessingChain;
pub use dither::{dither_amplitude, Ditherer};
pub use fade::{fade_gain, fade_len, Fader};
pub use gain::Gain;
pub use layout::build_layout;
pub use processor::Processor;
pub use timeline::{pad, repeat, Padder, Repeater, RepetitionPlan};
pub use weighting::{envelope_gain, Equalizer, FrequencyTrack};
