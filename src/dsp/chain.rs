//! Processing chain
//!
//! Stages run in insertion order. The pipeline builds the chain in the fixed
//! order fade → equalization → gain → repetition → padding → dither.

use log::debug;

use super::Processor;
use crate::engine::SampleBuffer;
use crate::progress::Progress;

/// Ordered list of processing stages
#[derive(Default)]
pub struct ProcessingChain {
    processors: Vec<Box<dyn Processor>>,
}

impl ProcessingChain {
    /// Create a new empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage at the end of the chain
    pub fn push(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(processor);
    }

    /// Builder-style [`push`](Self::push)
    pub fn with(mut self, processor: impl Processor + 'static) -> Self {
        self.push(Box::new(processor));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Stage names in processing order
    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Run every stage, reporting progress after each one
    pub fn process(
        &mut self,
        mut buffer: SampleBuffer,
        progress: &mut dyn Progress,
    ) -> SampleBuffer {
        let count = self.processors.len();
        for (i, processor) in self.processors.iter_mut().enumerate() {
            debug!("Stage '{}' on {} samples", processor.name(), buffer.len());
            buffer = processor.process(buffer);
            progress.report((i + 1) as f64 / count as f64);
        }
        progress.report(1.0);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;

    struct Double;

    impl Processor for Double {
        fn name(&self) -> &'static str {
            "double"
        }

        fn process(&mut self, buffer: SampleBuffer) -> SampleBuffer {
            buffer.into_iter().map(|s| s * 2.0).collect()
        }
    }

    struct Append(f64);

    impl Processor for Append {
        fn name(&self) -> &'static str {
            "append"
        }

        fn process(&mut self, mut buffer: SampleBuffer) -> SampleBuffer {
            buffer.push(self.0);
            buffer
        }
    }

    #[test]
    fn test_chain_runs_in_order() {
        let mut chain = ProcessingChain::new().with(Append(1.0)).with(Double);
        assert_eq!(chain.names(), vec!["append", "double"]);
        let out = chain.process(vec![0.5], &mut NoProgress);
        assert_eq!(out, vec![1.0, 2.0]);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let mut chain = ProcessingChain::new();
        assert!(chain.is_empty());
        let mut reports = Vec::new();
        let out = chain.process(vec![0.25, -0.25], &mut |f: f64| reports.push(f));
        assert_eq!(out, vec![0.25, -0.25]);
        assert_eq!(reports, vec![1.0]);
    }

    #[test]
    fn test_chain_reports_each_stage() {
        let mut chain = ProcessingChain::new().with(Double).with(Double);
        let mut reports = Vec::new();
        chain.process(vec![1.0], &mut |f: f64| reports.push(f));
        assert_eq!(reports, vec![0.5, 1.0, 1.0]);
    }
}
