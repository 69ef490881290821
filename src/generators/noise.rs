//! Noise generators
//!
//! The entropy source is always passed in, so a seeded `StdRng` and an
//! OS-seeded one go through exactly the same code.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::SampleBuffer;
use crate::progress::{tick, Progress};

/// Build the entropy source for a generator: seeded when `seed` is given,
/// OS-seeded otherwise.
pub fn entropy(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Uniform white noise in [-1, 1)
pub fn white_noise<R: Rng + ?Sized>(
    num_samples: usize,
    rng: &mut R,
    progress: &mut dyn Progress,
) -> SampleBuffer {
    let mut out = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        tick(progress, i, num_samples);
        out.push(rng.random::<f64>() * 2.0 - 1.0);
    }
    progress.report(1.0);
    out
}

/// Pink noise from Paul Kellett's refined six-pole filter.
///
/// The output is divided by its own peak, so the largest magnitude is
/// exactly 1.0.
pub fn pink_noise<R: Rng + ?Sized>(
    num_samples: usize,
    rng: &mut R,
    progress: &mut dyn Progress,
) -> SampleBuffer {
    let mut out = Vec::with_capacity(num_samples);

    let (mut b0, mut b1, mut b2, mut b3, mut b4, mut b5, mut b6) =
        (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);

    for i in 0..num_samples {
        tick(progress, i, num_samples);
        let white = rng.random::<f64>() * 2.0 - 1.0;

        b0 = 0.99886 * b0 + white * 0.0555179;
        b1 = 0.99332 * b1 + white * 0.0750759;
        b2 = 0.96900 * b2 + white * 0.1538520;
        b3 = 0.86650 * b3 + white * 0.3104856;
        b4 = 0.55000 * b4 + white * 0.5329522;
        b5 = -0.7616 * b5 - white * 0.0168980;

        out.push(b0 + b1 + b2 + b3 + b4 + b5 + b6 + white * 0.5362);
        b6 = white * 0.115926;
    }

    normalize_peak(&mut out);
    progress.report(1.0);
    out
}

/// Divide every sample by the peak magnitude. Silent buffers are untouched.
fn normalize_peak(samples: &mut [f64]) {
    let peak = samples.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        for s in samples.iter_mut() {
            *s /= peak;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use rustfft::{num_complex::Complex, FftPlanner};

    #[test]
    fn test_white_noise_range() {
        let noise = white_noise(48000, &mut entropy(Some(1)), &mut NoProgress);
        assert_eq!(noise.len(), 48000);
        assert!(noise.iter().all(|&s| (-1.0..1.0).contains(&s)));

        let mean = noise.iter().sum::<f64>() / noise.len() as f64;
        assert!(mean.abs() < 0.02, "Mean too far from zero: {}", mean);
    }

    #[test]
    fn test_seeded_noise_is_deterministic() {
        let a = white_noise(10000, &mut entropy(Some(42)), &mut NoProgress);
        let b = white_noise(10000, &mut entropy(Some(42)), &mut NoProgress);
        let c = white_noise(10000, &mut entropy(Some(43)), &mut NoProgress);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
        assert_ne!(a, c);

        let p = pink_noise(10000, &mut entropy(Some(42)), &mut NoProgress);
        let q = pink_noise(10000, &mut entropy(Some(42)), &mut NoProgress);
        assert!(p.iter().zip(&q).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn test_unseeded_noise_uses_same_path() {
        let noise = white_noise(1000, &mut entropy(None), &mut NoProgress);
        assert_eq!(noise.len(), 1000);
        assert!(noise.iter().any(|&s| s != noise[0]));
    }

    #[test]
    fn test_pink_noise_peak_is_unity() {
        for seed in [1, 2, 3] {
            let pink = pink_noise(48000, &mut entropy(Some(seed)), &mut NoProgress);
            let peak = pink.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
            assert_eq!(peak, 1.0);
        }
    }

    #[test]
    fn test_pink_noise_slope() {
        let n = 1 << 16;
        let sr = 48000.0;
        let pink = pink_noise(n, &mut entropy(Some(9)), &mut NoProgress);

        let mut spectrum: Vec<Complex<f64>> =
            pink.iter().map(|&s| Complex::new(s, 0.0)).collect();
        FftPlanner::new().plan_fft_forward(n).process(&mut spectrum);

        // Average power over an octave band starting at `lo` Hz
        let band_power = |lo: f64| {
            let a = (lo / sr * n as f64) as usize;
            let b = (2.0 * lo / sr * n as f64) as usize;
            spectrum[a..b].iter().map(|c| c.norm_sqr()).sum::<f64>() / (b - a) as f64
        };

        // Per-bin power of pink noise falls 3 dB per octave
        let octaves = 5.0;
        let low = band_power(250.0);
        let high = band_power(250.0 * 2f64.powf(octaves));
        let slope_db = 10.0 * (high / low).log10() / octaves;
        assert!(
            (slope_db + 3.0).abs() < 1.0,
            "Slope {:.2} dB/octave, expected about -3",
            slope_db
        );
    }
}
