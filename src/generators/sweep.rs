//! Sine sweeps
//!
//! Exponential (Farina) and linear sweeps, plus the matched inverse filter
//! used to recover an impulse response from a recorded exponential sweep.

use std::f64::consts::PI;

use crate::engine::SampleBuffer;
use crate::progress::{tick, Progress};

/// Parameters shared by both sweep kinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepParams {
    pub start_hz: f64,
    pub end_hz: f64,
    pub duration_secs: f64,
    pub sample_rate: u32,
}

impl SweepParams {
    pub fn new(start_hz: f64, end_hz: f64, duration_secs: f64, sample_rate: u32) -> Self {
        Self {
            start_hz,
            end_hz,
            duration_secs,
            sample_rate,
        }
    }

    /// Number of samples, `round(sample_rate * duration)`
    pub fn num_samples(&self) -> usize {
        (self.sample_rate as f64 * self.duration_secs).round() as usize
    }

    /// `ln(f2 / f1)`, the sweep rate constant
    #[inline]
    pub fn log_ratio(&self) -> f64 {
        (self.end_hz / self.start_hz).ln()
    }

    /// Phase of the exponential sweep at time `t` in radians
    #[inline]
    pub fn ess_phase(&self, t: f64) -> f64 {
        let l = self.log_ratio();
        let k = 2.0 * PI * self.start_hz * self.duration_secs / l;
        k * ((t / self.duration_secs * l).exp() - 1.0)
    }

    /// Instantaneous frequency of the exponential sweep at time `t`
    #[inline]
    pub fn ess_frequency(&self, t: f64) -> f64 {
        self.start_hz * (t / self.duration_secs * self.log_ratio()).exp()
    }

    /// Phase of the linear sweep at time `t` in radians
    #[inline]
    pub fn linear_phase(&self, t: f64) -> f64 {
        let slope = (self.end_hz - self.start_hz) / (2.0 * self.duration_secs);
        2.0 * PI * (self.start_hz * t + slope * t * t)
    }

    /// Instantaneous frequency of the linear sweep at time `t`
    #[inline]
    pub fn linear_frequency(&self, t: f64) -> f64 {
        self.start_hz + (self.end_hz - self.start_hz) * t / self.duration_secs
    }

    /// Seconds the exponential sweep needs to cover its first octave
    pub fn octave_secs(&self) -> f64 {
        self.duration_secs * std::f64::consts::LN_2 / self.log_ratio()
    }
}

/// Generate an exponential sine sweep.
///
/// `x[n] = sin(2π·f1·T/ln(f2/f1) · (e^(n/sr/T · ln(f2/f1)) − 1))`, so the
/// first sample is exactly zero and the frequency reaches f2 at t = T.
/// Assumes `0 < f1 < f2`; the request is validated before this runs.
pub fn exponential_sweep(params: &SweepParams, progress: &mut dyn Progress) -> SampleBuffer {
    let n = params.num_samples();
    let sr = params.sample_rate as f64;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        tick(progress, i, n);
        out.push(params.ess_phase(i as f64 / sr).sin());
    }
    progress.report(1.0);
    out
}

/// Generate a linear sine sweep
pub fn linear_sweep(params: &SweepParams, progress: &mut dyn Progress) -> SampleBuffer {
    let n = params.num_samples();
    let sr = params.sample_rate as f64;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        tick(progress, i, n);
        out.push(params.linear_phase(i as f64 / sr).sin());
    }
    progress.report(1.0);
    out
}

/// Build the Farina inverse filter for an exponential sweep.
///
/// The sweep is time-reversed and weighted by `exp(-t/T · ln(f2/f1))`,
/// with `t` the time within the reversed buffer: the high-frequency end
/// keeps unity gain and the low end drops by f1/f2. The result is scaled by
/// `ln(f2/f1) / (2π·f1·T)`.
pub fn inverse_filter(sweep: &[f64], params: &SweepParams) -> SampleBuffer {
    let sr = params.sample_rate as f64;
    let l = params.log_ratio();
    let t_total = params.duration_secs;
    let norm = l / (2.0 * PI * params.start_hz * t_total);

    sweep
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &s)| {
            let t = i as f64 / sr;
            s * (-t / t_total * l).exp() * norm
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use approx::assert_relative_eq;

    #[test]
    fn test_ess_starts_at_zero() {
        let params = SweepParams::new(20.0, 20000.0, 1.0, 48000);
        let sweep = exponential_sweep(&params, &mut NoProgress);
        assert_eq!(sweep.len(), 48000);
        assert_eq!(sweep[0], 0.0);
    }

    #[test]
    fn test_ess_last_sample_matches_formula() {
        let params = SweepParams::new(20.0, 20000.0, 1.0, 48000);
        let sweep = exponential_sweep(&params, &mut NoProgress);

        let l = (20000.0_f64 / 20.0).ln();
        let t = 47999.0 / 48000.0;
        let expected = (2.0 * PI * 20.0 * 1.0 / l * ((t / 1.0 * l).exp() - 1.0)).sin();
        assert_relative_eq!(sweep[47999], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_ess_instantaneous_frequency() {
        let params = SweepParams::new(50.0, 16000.0, 2.0, 48000);
        assert_relative_eq!(params.ess_frequency(0.0), 50.0, epsilon = 1e-9);
        assert_relative_eq!(params.ess_frequency(2.0), 16000.0, max_relative = 1e-12);

        // Derivative of the phase matches the analytic frequency
        let n = 1000;
        let l = params.log_ratio();
        let h = 1e-7;
        for k in [1, 100, 500, 999] {
            let t = k as f64 * params.duration_secs / n as f64;
            let numeric =
                (params.ess_phase(t + h) - params.ess_phase(t - h)) / (2.0 * h) / (2.0 * PI);
            let analytic = 50.0 * (k as f64 / n as f64 * l).exp();
            assert_relative_eq!(numeric, analytic, max_relative = 1e-5);
            assert_relative_eq!(params.ess_frequency(t), analytic, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_linear_sweep_frequency() {
        let params = SweepParams::new(100.0, 1100.0, 1.0, 48000);
        assert_relative_eq!(params.linear_frequency(0.0), 100.0);
        assert_relative_eq!(params.linear_frequency(0.5), 600.0);
        assert_relative_eq!(params.linear_frequency(1.0), 1100.0);

        let h = 1e-7;
        let t = 0.25;
        let numeric =
            (params.linear_phase(t + h) - params.linear_phase(t - h)) / (2.0 * h) / (2.0 * PI);
        assert_relative_eq!(numeric, params.linear_frequency(t), max_relative = 1e-5);

        let sweep = linear_sweep(&params, &mut NoProgress);
        assert_eq!(sweep.len(), 48000);
        assert_eq!(sweep[0], 0.0);
        assert!(sweep.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_octave_secs() {
        // 10 octaves in 10 seconds
        let params = SweepParams::new(20.0, 20480.0, 10.0, 48000);
        assert_relative_eq!(params.octave_secs(), 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_inverse_filter_shape() {
        let params = SweepParams::new(100.0, 3000.0, 0.5, 8000);
        let sweep = exponential_sweep(&params, &mut NoProgress);
        let inverse = inverse_filter(&sweep, &params);
        assert_eq!(inverse.len(), sweep.len());

        let norm = params.log_ratio() / (2.0 * PI * 100.0 * 0.5);
        let last = sweep.len() - 1;
        // First inverse sample is the last sweep sample at unity envelope
        assert_relative_eq!(inverse[0], sweep[last] * norm, epsilon = 1e-15);
        // Last inverse sample is attenuated by f1/f2
        let t = last as f64 / 8000.0;
        let expected = sweep[0] * (-t / 0.5 * params.log_ratio()).exp() * norm;
        assert_relative_eq!(inverse[last], expected, epsilon = 1e-15);
    }

    #[test]
    fn test_inverse_filter_deconvolves_to_impulse() {
        let params = SweepParams::new(100.0, 3000.0, 0.5, 8000);
        let sweep = exponential_sweep(&params, &mut NoProgress);
        let inverse = inverse_filter(&sweep, &params);
        let n = sweep.len();

        // Full linear convolution
        let mut conv = vec![0.0; 2 * n - 1];
        for (i, &a) in sweep.iter().enumerate() {
            for (j, &b) in inverse.iter().enumerate() {
                conv[i + j] += a * b;
            }
        }

        let (peak_idx, peak) = conv
            .iter()
            .enumerate()
            .fold((0, 0.0_f64), |(bi, bv), (i, &v)| {
                if v.abs() > bv {
                    (i, v.abs())
                } else {
                    (bi, bv)
                }
            });
        assert!(
            (peak_idx as i64 - (n as i64 - 1)).abs() <= 1,
            "Peak at {} instead of {}",
            peak_idx,
            n - 1
        );

        // Far from the peak the response is small
        let far_max = conv
            .iter()
            .enumerate()
            .filter(|(i, _)| (*i as i64 - peak_idx as i64).abs() > 200)
            .map(|(_, v)| v.abs())
            .fold(0.0, f64::max);
        assert!(
            far_max < 0.2 * peak,
            "Residual {} too large relative to peak {}",
            far_max,
            peak
        );
    }

    #[test]
    fn test_progress_reaches_one() {
        let params = SweepParams::new(20.0, 20000.0, 3.0, 48000);
        let mut seen = Vec::new();
        let mut record = |f: f64| seen.push(f);
        exponential_sweep(&params, &mut record);
        assert_eq!(*seen.last().unwrap(), 1.0);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        // 144000 samples at a 65536-sample cadence plus the final report
        assert_eq!(seen.len(), 4);
    }
}
