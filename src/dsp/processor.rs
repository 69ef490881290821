//! Processor trait definition
//!
//! Base trait for every post-processing stage.

use crate::engine::SampleBuffer;

/// One stage of the post-processing chain
///
/// Stages take ownership of the buffer and hand back the processed one, so
/// a stage that changes the length (repetition, padding) allocates once and
/// the rest work in place.
pub trait Processor {
    /// Stage identifier, used in logs
    fn name(&self) -> &'static str;

    /// Process the buffer
    fn process(&mut self, buffer: SampleBuffer) -> SampleBuffer;
}
