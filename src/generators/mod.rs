//! Waveform generators
//!
//! Stateless functions mapping parameters to normalized samples. The signal
//! kind is a closed enum, so [`render`] dispatches with an exhaustive match.

pub mod burst;
pub mod mls;
pub mod noise;
pub mod stepped;
pub mod sweep;

pub use burst::tone_burst;
pub use mls::mls;
pub use noise::{entropy, pink_noise, white_noise};
pub use stepped::{step_frequencies, stepped_tone, StepSpacing};
pub use sweep::{exponential_sweep, inverse_filter, linear_sweep, SweepParams};

use log::debug;

use crate::engine::SampleBuffer;
use crate::error::Result;
use crate::progress::Progress;
use crate::request::SignalKind;

/// Generate the raw single-signal buffer for `signal`.
///
/// Expects a validated request; only the MLS order is re-checked here since
/// the generator owns its tap table.
pub fn render(
    signal: &SignalKind,
    sample_rate: u32,
    progress: &mut dyn Progress,
) -> Result<SampleBuffer> {
    debug!("Generating {} at {} Hz", signal.tag(), sample_rate);

    let buffer = match signal {
        SignalKind::ExponentialSweep {
            start_hz,
            end_hz,
            duration_secs,
        } => {
            let params = SweepParams::new(*start_hz, *end_hz, *duration_secs, sample_rate);
            exponential_sweep(&params, progress)
        }
        SignalKind::LinearSweep {
            start_hz,
            end_hz,
            duration_secs,
        } => {
            let params = SweepParams::new(*start_hz, *end_hz, *duration_secs, sample_rate);
            linear_sweep(&params, progress)
        }
        SignalKind::WhiteNoise {
            duration_secs,
            seed,
        } => {
            let n = (duration_secs * sample_rate as f64).round() as usize;
            white_noise(n, &mut entropy(*seed), progress)
        }
        SignalKind::PinkNoise {
            duration_secs,
            seed,
        } => {
            let n = (duration_secs * sample_rate as f64).round() as usize;
            pink_noise(n, &mut entropy(*seed), progress)
        }
        SignalKind::Mls { order, periods } => mls(*order, *periods, progress)?,
        SignalKind::SteppedTone {
            start_hz,
            end_hz,
            steps_per_octave,
            spacing,
            dwell_secs,
            gap_secs,
        } => {
            let freqs = step_frequencies(*start_hz, *end_hz, *steps_per_octave, *spacing);
            stepped_tone(&freqs, *dwell_secs, *gap_secs, sample_rate, progress)
        }
        SignalKind::ToneBurst { steps } => tone_burst(steps, sample_rate, progress),
    };

    debug!("Generated {} samples", buffer.len());
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::request::{SignalRequest, ToneBurstStep};

    #[test]
    fn test_render_lengths_match_estimate() {
        let kinds = vec![
            SignalKind::ExponentialSweep {
                start_hz: 20.0,
                end_hz: 20000.0,
                duration_secs: 0.5,
            },
            SignalKind::LinearSweep {
                start_hz: 20.0,
                end_hz: 20000.0,
                duration_secs: 0.25,
            },
            SignalKind::WhiteNoise {
                duration_secs: 0.1,
                seed: Some(1),
            },
            SignalKind::PinkNoise {
                duration_secs: 0.1,
                seed: Some(1),
            },
            SignalKind::Mls {
                order: 12,
                periods: 2,
            },
            SignalKind::SteppedTone {
                start_hz: 100.0,
                end_hz: 1000.0,
                steps_per_octave: 3.0,
                spacing: StepSpacing::Logarithmic,
                dwell_secs: 0.05,
                gap_secs: 0.01,
            },
            SignalKind::ToneBurst {
                steps: vec![ToneBurstStep {
                    frequency_hz: 1000.0,
                    level_db: -6.0,
                    on_ms: 12.0,
                    off_ms: 8.0,
                }],
            },
        ];

        for kind in kinds {
            let request = SignalRequest::new(kind.clone());
            request.validate().unwrap();
            let buffer = render(&kind, 48000, &mut NoProgress).unwrap();
            assert_eq!(
                buffer.len() as f64,
                kind.estimated_samples(48000),
                "Length mismatch for {}",
                kind.tag()
            );
            assert!(buffer.iter().all(|s| s.abs() <= 1.0));
        }
    }

    #[test]
    fn test_render_rejects_bad_mls_order() {
        let kind = SignalKind::Mls {
            order: 4,
            periods: 1,
        };
        assert!(render(&kind, 48000, &mut NoProgress).is_err());
    }
}
