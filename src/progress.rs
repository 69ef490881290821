//! Progress reporting
//!
//! Long-running stages report a completion fraction in [0, 1] through an
//! injected observer. Reporting is synchronous and never affects output.

/// Number of samples between progress notifications
pub const PROGRESS_INTERVAL: usize = 1 << 16;

/// Observer notified with a monotonically increasing fraction in [0, 1]
pub trait Progress {
    fn report(&mut self, fraction: f64);
}

impl<F: FnMut(f64)> Progress for F {
    fn report(&mut self, fraction: f64) {
        self(fraction)
    }
}

/// Observer that discards every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _fraction: f64) {}
}

/// Maps a stage-local [0, 1] fraction onto a sub-range of a parent observer.
///
/// Stage reports are clamped and never go backwards.
pub struct Stage<'a> {
    inner: &'a mut dyn Progress,
    start: f64,
    end: f64,
    last: f64,
}

impl<'a> Stage<'a> {
    pub fn new(inner: &'a mut dyn Progress, start: f64, end: f64) -> Self {
        Self {
            inner,
            start,
            end,
            last: 0.0,
        }
    }

    /// Report that the stage is finished
    pub fn finish(&mut self) {
        self.report(1.0);
    }
}

impl Progress for Stage<'_> {
    fn report(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0).max(self.last);
        self.last = fraction;
        // Exact bounds keep adjacent stages from overlapping by rounding
        let mapped = if fraction >= 1.0 {
            self.end
        } else {
            self.start + (self.end - self.start) * fraction
        };
        self.inner.report(mapped);
    }
}

/// Report `done / total` when `done` crosses a [`PROGRESS_INTERVAL`] boundary
#[inline]
pub(crate) fn tick(progress: &mut dyn Progress, done: usize, total: usize) {
    if done % PROGRESS_INTERVAL == 0 && total > 0 {
        progress.report(done as f64 / total as f64);
    }
}
