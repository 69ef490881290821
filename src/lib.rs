//! Sweepgen - Measurement Stimulus Generator
//!
//! Synthesizes calibrated test signals and writes them as byte-exact
//! RIFF/WAVE files with Broadcast Wave metadata:
//! 1. Generators - exponential and linear sweeps, white and pink noise,
//!    maximum length sequences, stepped tones, tone-burst patterns
//! 2. Post-processing - fades, equalization envelope, level, repetition,
//!    silence, dither and channel layout
//! 3. Container - 16/24-bit PCM and 32-bit float WAVE with `bext`
//!
//! # Architecture
//!
//! ```text
//! SignalRequest -> generators -> dsp chain -> ChannelSet -> engine::wav -> EncodedFile
//! ```
//!
//! Everything runs synchronously on owned buffers; [`pipeline::generate`]
//! is the single entry point.

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod generators;
pub mod pipeline;
pub mod progress;
pub mod request;

pub use error::{Result, SignalError};
pub use pipeline::{generate, generate_preview, EncodedFile, Preview, Rendered};
pub use request::SignalRequest;
