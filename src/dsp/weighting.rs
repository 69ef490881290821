//! Equalization envelope
//!
//! Sweeps and stepped tones know their frequency at every sample, so an
//! inverse weighting curve can be applied as a time-varying gain instead of
//! a filter. The gain is `W(1 kHz) / W(f)` with `f` clamped to the audio
//! band, then the buffer is rescaled if the envelope pushed its peak above
//! full scale.

use crate::dsp::Processor;
use crate::engine::{peak, SampleBuffer};
use crate::generators::{step_frequencies, SweepParams};
use crate::request::{EqCurve, SignalKind};

// ============================================================================
// Constants
// ============================================================================

/// Reference frequency where every envelope has unity gain
pub const REFERENCE_HZ: f64 = 1000.0;

/// Band the envelope frequency is clamped to
pub const MIN_EQ_HZ: f64 = 20.0;
pub const MAX_EQ_HZ: f64 = 20000.0;

// IEC 61672 A-weighting pole frequencies
const A_F1: f64 = 20.6;
const A_F2: f64 = 107.7;
const A_F3: f64 = 737.9;
const A_F4: f64 = 12194.0;
const A_OFFSET_DB: f64 = 2.00;

// RIAA time constants in seconds
const RIAA_T1: f64 = 3180e-6;
const RIAA_T2: f64 = 318e-6;
const RIAA_T3: f64 = 75e-6;

// ============================================================================
// Weighting curves
// ============================================================================

/// A-weighting magnitude (linear), 1.0 at 1 kHz within 0.01 dB
pub fn a_weighting(f: f64) -> f64 {
    let f2 = f * f;
    let num = A_F4 * A_F4 * f2 * f2;
    let den = (f2 + A_F1 * A_F1)
        * ((f2 + A_F2 * A_F2) * (f2 + A_F3 * A_F3)).sqrt()
        * (f2 + A_F4 * A_F4);
    num / den * 10f64.powf(A_OFFSET_DB / 20.0)
}

/// RIAA playback magnitude (linear, unnormalized)
pub fn riaa_playback(f: f64) -> f64 {
    let w = 2.0 * std::f64::consts::PI * f;
    let pole = |t: f64| (1.0 + (w * t).powi(2)).sqrt();
    pole(RIAA_T2) / (pole(RIAA_T1) * pole(RIAA_T3))
}

/// Envelope gain of `curve` at frequency `f`
pub fn envelope_gain(curve: EqCurve, f: f64) -> f64 {
    let f = f.clamp(MIN_EQ_HZ, MAX_EQ_HZ);
    match curve {
        EqCurve::None => 1.0,
        EqCurve::InverseAWeighting => a_weighting(REFERENCE_HZ) / a_weighting(f),
        EqCurve::InverseRiaa => riaa_playback(REFERENCE_HZ) / riaa_playback(f),
    }
}

// ============================================================================
// Frequency tracks
// ============================================================================

/// Instantaneous frequency of a generated signal, sample by sample
#[derive(Debug, Clone, PartialEq)]
pub enum FrequencyTrack {
    Exponential(SweepParams),
    Linear(SweepParams),
    /// One frequency per `step_len` samples (dwell plus gap)
    Stepped {
        frequencies: Vec<f64>,
        step_len: usize,
    },
}

impl FrequencyTrack {
    /// Track for the kinds that support equalization
    pub fn for_signal(signal: &SignalKind, sample_rate: u32) -> Option<Self> {
        let sr = sample_rate as f64;
        match *signal {
            SignalKind::ExponentialSweep {
                start_hz,
                end_hz,
                duration_secs,
            } => Some(FrequencyTrack::Exponential(SweepParams::new(
                start_hz,
                end_hz,
                duration_secs,
                sample_rate,
            ))),
            SignalKind::LinearSweep {
                start_hz,
                end_hz,
                duration_secs,
            } => Some(FrequencyTrack::Linear(SweepParams::new(
                start_hz,
                end_hz,
                duration_secs,
                sample_rate,
            ))),
            SignalKind::SteppedTone {
                start_hz,
                end_hz,
                steps_per_octave,
                spacing,
                dwell_secs,
                gap_secs,
            } => Some(FrequencyTrack::Stepped {
                frequencies: step_frequencies(start_hz, end_hz, steps_per_octave, spacing),
                step_len: (dwell_secs * sr).round() as usize + (gap_secs * sr).round() as usize,
            }),
            _ => None,
        }
    }

    /// Frequency at sample index `n`
    pub fn frequency_at(&self, n: usize) -> f64 {
        match self {
            FrequencyTrack::Exponential(p) => p.ess_frequency(n as f64 / p.sample_rate as f64),
            FrequencyTrack::Linear(p) => p.linear_frequency(n as f64 / p.sample_rate as f64),
            FrequencyTrack::Stepped {
                frequencies,
                step_len,
            } => {
                let step = if *step_len == 0 { 0 } else { n / step_len };
                frequencies
                    .get(step)
                    .or(frequencies.last())
                    .copied()
                    .unwrap_or(REFERENCE_HZ)
            }
        }
    }
}

// ============================================================================
// Equalizer
// ============================================================================

/// Applies an inverse weighting envelope along a frequency track
#[derive(Debug, Clone, PartialEq)]
pub struct Equalizer {
    curve: EqCurve,
    track: FrequencyTrack,
}

impl Equalizer {
    pub fn new(curve: EqCurve, track: FrequencyTrack) -> Self {
        Self { curve, track }
    }

    /// Equalizer for a request, or `None` when nothing would change
    pub fn for_signal(curve: EqCurve, signal: &SignalKind, sample_rate: u32) -> Option<Self> {
        if curve == EqCurve::None {
            return None;
        }
        FrequencyTrack::for_signal(signal, sample_rate).map(|track| Self::new(curve, track))
    }

    pub fn apply(&self, samples: &mut [f64]) {
        for (n, s) in samples.iter_mut().enumerate() {
            *s *= envelope_gain(self.curve, self.track.frequency_at(n));
        }
        let p = peak(samples);
        if p > 1.0 {
            for s in samples.iter_mut() {
                *s /= p;
            }
        }
    }
}

impl Processor for Equalizer {
    fn name(&self) -> &'static str {
        "equalization"
    }

    fn process(&mut self, mut buffer: SampleBuffer) -> SampleBuffer {
        self.apply(&mut buffer);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::linear_to_db;
    use crate::generators::StepSpacing;

    fn db(curve: EqCurve, f: f64) -> f64 {
        linear_to_db(envelope_gain(curve, f))
    }

    #[test]
    fn test_a_weighting_reference_points() {
        assert!(linear_to_db(a_weighting(1000.0)).abs() < 0.01);
        assert!((linear_to_db(a_weighting(100.0)) + 19.1).abs() < 0.1);
        assert!((linear_to_db(a_weighting(10000.0)) + 2.5).abs() < 0.1);
    }

    #[test]
    fn test_inverse_curves_are_unity_at_reference() {
        assert!(db(EqCurve::InverseAWeighting, 1000.0).abs() < 1e-9);
        assert!(db(EqCurve::InverseRiaa, 1000.0).abs() < 1e-9);
        assert_eq!(envelope_gain(EqCurve::None, 50.0), 1.0);
    }

    #[test]
    fn test_inverse_riaa_shape() {
        // Playback boosts bass by ~19.3 dB at 20 Hz and cuts ~19.6 dB at 20 kHz
        assert!((db(EqCurve::InverseRiaa, 20.0) + 19.27).abs() < 0.05);
        assert!((db(EqCurve::InverseRiaa, 20000.0) - 19.62).abs() < 0.05);
    }

    #[test]
    fn test_frequency_is_clamped() {
        assert_eq!(
            envelope_gain(EqCurve::InverseAWeighting, 5.0),
            envelope_gain(EqCurve::InverseAWeighting, 20.0)
        );
        assert_eq!(
            envelope_gain(EqCurve::InverseRiaa, 40000.0),
            envelope_gain(EqCurve::InverseRiaa, 20000.0)
        );
    }

    #[test]
    fn test_envelope_rescales_peak() {
        let signal = SignalKind::ExponentialSweep {
            start_hz: 20.0,
            end_hz: 20000.0,
            duration_secs: 1.0,
        };
        let eq = Equalizer::for_signal(EqCurve::InverseAWeighting, &signal, 8000).unwrap();
        let mut samples = vec![1.0; 8000];
        eq.apply(&mut samples);
        assert!((peak(&samples) - 1.0).abs() < 1e-12);
        // Low end gets the most gain under inverse A-weighting
        assert!(samples[0] > samples[7999]);
    }

    #[test]
    fn test_unsupported_kinds_have_no_equalizer() {
        let noise = SignalKind::PinkNoise {
            duration_secs: 1.0,
            seed: None,
        };
        assert!(Equalizer::for_signal(EqCurve::InverseRiaa, &noise, 48000).is_none());

        let sweep = SignalKind::LinearSweep {
            start_hz: 20.0,
            end_hz: 20000.0,
            duration_secs: 1.0,
        };
        assert!(Equalizer::for_signal(EqCurve::None, &sweep, 48000).is_none());
    }

    #[test]
    fn test_stepped_track_holds_frequency_per_step() {
        let signal = SignalKind::SteppedTone {
            start_hz: 100.0,
            end_hz: 400.0,
            steps_per_octave: 1.0,
            spacing: StepSpacing::Logarithmic,
            dwell_secs: 0.01,
            gap_secs: 0.01,
        };
        let track = FrequencyTrack::for_signal(&signal, 1000).unwrap();
        assert_eq!(track.frequency_at(0), 100.0);
        assert_eq!(track.frequency_at(19), 100.0);
        assert_eq!(track.frequency_at(20), 200.0);
        assert_eq!(track.frequency_at(59), 400.0);
    }

    #[test]
    fn test_small_gains_leave_peak_alone() {
        let signal = SignalKind::LinearSweep {
            start_hz: 1000.0,
            end_hz: 2000.0,
            duration_secs: 1.0,
        };
        // Inverse RIAA attenuates below 1 kHz and boosts above: 1-2 kHz is a mild boost
        let eq = Equalizer::for_signal(EqCurve::InverseRiaa, &signal, 1000).unwrap();
        let mut samples = vec![0.1; 1000];
        eq.apply(&mut samples);
        assert!((samples[0] - 0.1).abs() < 1e-9);
        assert!(samples[999] > 0.1 && samples[999] < 0.2);
    }
}
