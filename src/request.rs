//! Signal request model
//!
//! A [`SignalRequest`] is the immutable parameter bundle for one generation
//! run. It deserializes from JSON with defaults for every shared field, so a
//! request file only has to name the signal.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};
use crate::generators::mls::{MAX_ORDER, MIN_ORDER};
use crate::generators::stepped::{step_count, step_frequencies, StepSpacing, MAX_STEPS};

/// Lowest accepted sample rate in Hz
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Highest accepted sample rate in Hz
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Output level range in dBFS
pub const MIN_LEVEL_DBFS: f64 = -60.0;
pub const MAX_LEVEL_DBFS: f64 = 0.0;

/// Upper bound on the total number of frames in one file (u32 data chunk)
pub const MAX_FRAMES: usize = 500_000_000;

// ============================================================================
// Signal kinds
// ============================================================================

/// One step of a tone-burst pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneBurstStep {
    pub frequency_hz: f64,
    pub level_db: f64,
    pub on_ms: f64,
    pub off_ms: f64,
}

/// The kind of stimulus to synthesize, with its kind-specific parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalKind {
    /// Exponential (Farina) sine sweep
    ExponentialSweep {
        start_hz: f64,
        end_hz: f64,
        duration_secs: f64,
    },
    /// Linear sine sweep
    LinearSweep {
        start_hz: f64,
        end_hz: f64,
        duration_secs: f64,
    },
    WhiteNoise {
        duration_secs: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
    PinkNoise {
        duration_secs: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Maximum length sequence
    Mls {
        order: u32,
        #[serde(default = "default_periods")]
        periods: u32,
    },
    SteppedTone {
        start_hz: f64,
        end_hz: f64,
        steps_per_octave: f64,
        #[serde(default)]
        spacing: StepSpacing,
        dwell_secs: f64,
        gap_secs: f64,
    },
    ToneBurst { steps: Vec<ToneBurstStep> },
}

fn default_periods() -> u32 {
    1
}

impl SignalKind {
    /// Short machine-friendly tag, used in filenames
    pub fn tag(&self) -> &'static str {
        match self {
            SignalKind::ExponentialSweep { .. } => "ess",
            SignalKind::LinearSweep { .. } => "linsweep",
            SignalKind::WhiteNoise { .. } => "white",
            SignalKind::PinkNoise { .. } => "pink",
            SignalKind::Mls { .. } => "mls",
            SignalKind::SteppedTone { .. } => "stepped",
            SignalKind::ToneBurst { .. } => "bursts",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            SignalKind::ExponentialSweep { .. } => "Exponential sine sweep",
            SignalKind::LinearSweep { .. } => "Linear sine sweep",
            SignalKind::WhiteNoise { .. } => "White noise",
            SignalKind::PinkNoise { .. } => "Pink noise",
            SignalKind::Mls { .. } => "Maximum length sequence",
            SignalKind::SteppedTone { .. } => "Stepped sine tones",
            SignalKind::ToneBurst { .. } => "Tone burst pattern",
        }
    }

    /// Frequency bounds for kinds that have them
    pub fn frequency_range(&self) -> Option<(f64, f64)> {
        match *self {
            SignalKind::ExponentialSweep {
                start_hz, end_hz, ..
            }
            | SignalKind::LinearSweep {
                start_hz, end_hz, ..
            }
            | SignalKind::SteppedTone {
                start_hz, end_hz, ..
            } => Some((start_hz, end_hz)),
            _ => None,
        }
    }

    /// Number of samples the generator will produce at `sample_rate`.
    ///
    /// Computed in floating point so that absurd requests surface as a
    /// non-finite or oversized value instead of wrapping.
    pub fn estimated_samples(&self, sample_rate: u32) -> f64 {
        let sr = sample_rate as f64;
        match self {
            SignalKind::ExponentialSweep { duration_secs, .. }
            | SignalKind::LinearSweep { duration_secs, .. }
            | SignalKind::WhiteNoise { duration_secs, .. }
            | SignalKind::PinkNoise { duration_secs, .. } => (sr * duration_secs).round(),
            SignalKind::Mls { order, periods } => {
                (2f64.powi(*order as i32) - 1.0) * (*periods).max(1) as f64
            }
            SignalKind::SteppedTone {
                start_hz,
                end_hz,
                steps_per_octave,
                spacing,
                dwell_secs,
                gap_secs,
            } => {
                let steps =
                    step_frequencies(*start_hz, *end_hz, *steps_per_octave, *spacing).len();
                steps as f64 * ((sr * dwell_secs).round() + (sr * gap_secs).round())
            }
            SignalKind::ToneBurst { steps } => steps
                .iter()
                .map(|s| (s.on_ms * sr / 1000.0).round() + (s.off_ms * sr / 1000.0).round())
                .sum(),
        }
    }
}

// ============================================================================
// Shaping options
// ============================================================================

/// Fade window shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeShape {
    #[default]
    None,
    /// Half-Hanning (raised cosine) window
    Hann,
    Linear,
}

/// Fade length, either explicit or derived from the sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeLength {
    Secs(f64),
    /// Time the exponential sweep needs to traverse its first octave
    Octave,
}

impl Default for FadeLength {
    fn default() -> Self {
        FadeLength::Secs(0.0)
    }
}

/// Fade applied to one edge of the signal
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fade {
    pub shape: FadeShape,
    pub length: FadeLength,
}

impl Fade {
    pub fn new(shape: FadeShape, secs: f64) -> Self {
        Self {
            shape,
            length: FadeLength::Secs(secs),
        }
    }

    pub fn octave(shape: FadeShape) -> Self {
        Self {
            shape,
            length: FadeLength::Octave,
        }
    }

    pub fn is_none(&self) -> bool {
        self.shape == FadeShape::None
    }
}

/// Equalization envelope applied to sweep and stepped kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqCurve {
    #[default]
    None,
    /// Inverse of the A-weighting curve, 0 dB at 1 kHz
    InverseAWeighting,
    /// Inverse of the RIAA playback curve, 0 dB at 1 kHz
    InverseRiaa,
}

/// Dither noise distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DitherMode {
    #[default]
    Off,
    /// Triangular PDF noise of one quantization step
    Tpdf,
}

/// Which part of the padded buffer receives dither
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DitherRegion {
    #[default]
    All,
    /// Only the repetitions themselves
    Signal,
    /// Lead, trail and the gaps between repetitions
    Silence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dither {
    pub mode: DitherMode,
    pub region: DitherRegion,
    pub seed: Option<u64>,
}

/// Output channel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    #[default]
    Mono,
    /// Same signal on both channels
    Stereo,
    /// Signal on the left, a unit impulse at the signal start on the right
    SyncImpulse,
    /// Whole repetitions alternate between left and right
    Alternating,
    /// Repetitions cycle left only, right only, both
    Rotating,
}

impl ChannelMode {
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }
}

/// Numeric format of the samples in the data chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    Pcm,
    Float,
}

/// The three supported bit-depth/format pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingFormat {
    Pcm16,
    #[default]
    Pcm24,
    Float32,
}

impl EncodingFormat {
    /// Validate a bit-depth/format pair
    pub fn new(bits: u16, encoding: SampleEncoding) -> Result<Self> {
        match (bits, encoding) {
            (16, SampleEncoding::Pcm) => Ok(EncodingFormat::Pcm16),
            (24, SampleEncoding::Pcm) => Ok(EncodingFormat::Pcm24),
            (32, SampleEncoding::Float) => Ok(EncodingFormat::Float32),
            _ => Err(SignalError::invalid(
                "format",
                format!(
                    "{}-bit {:?} is not supported (16-bit PCM, 24-bit PCM or 32-bit float)",
                    bits, encoding
                ),
            )),
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        match self {
            EncodingFormat::Pcm16 => 16,
            EncodingFormat::Pcm24 => 24,
            EncodingFormat::Float32 => 32,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample() as usize / 8
    }

    pub fn encoding(&self) -> SampleEncoding {
        match self {
            EncodingFormat::Float32 => SampleEncoding::Float,
            _ => SampleEncoding::Pcm,
        }
    }

    /// Whether the format chunk uses WAVE_FORMAT_EXTENSIBLE (and needs `fact`)
    pub fn is_extensible(&self) -> bool {
        !matches!(self, EncodingFormat::Pcm16)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EncodingFormat::Pcm16 => "16-bit PCM",
            EncodingFormat::Pcm24 => "24-bit PCM",
            EncodingFormat::Float32 => "32-bit float",
        }
    }
}

/// Options for the broadcast-wave metadata chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataOptions {
    pub include_bext: bool,
    pub originator: String,
    /// Defaults to a fresh UUID when absent
    pub originator_reference: Option<String>,
    /// `yyyy-mm-dd`; defaults to the local date at generation time
    pub origination_date: Option<String>,
    /// `hh:mm:ss`; defaults to the local time at generation time
    pub origination_time: Option<String>,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            include_bext: true,
            originator: "sweepgen".to_string(),
            originator_reference: None,
            origination_date: None,
            origination_time: None,
        }
    }
}

// ============================================================================
// Signal request
// ============================================================================

/// Immutable parameter bundle for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalRequest {
    pub signal: SignalKind,
    pub sample_rate: u32,
    pub level_dbfs: f64,
    pub fade_in: Fade,
    pub fade_out: Fade,
    pub equalization: EqCurve,
    pub dither: Dither,
    pub repetitions: u32,
    pub repetition_gap_secs: f64,
    pub lead_silence_secs: f64,
    pub trail_silence_secs: f64,
    pub channels: ChannelMode,
    pub format: EncodingFormat,
    pub inverse_filter: bool,
    pub metadata: MetadataOptions,
}

impl Default for SignalRequest {
    fn default() -> Self {
        Self {
            signal: SignalKind::ExponentialSweep {
                start_hz: 20.0,
                end_hz: 20000.0,
                duration_secs: 10.0,
            },
            sample_rate: 48000,
            level_dbfs: -3.0,
            fade_in: Fade::octave(FadeShape::Hann),
            fade_out: Fade::new(FadeShape::Hann, 0.01),
            equalization: EqCurve::None,
            dither: Dither::default(),
            repetitions: 1,
            repetition_gap_secs: 0.0,
            lead_silence_secs: 0.0,
            trail_silence_secs: 0.0,
            channels: ChannelMode::Mono,
            format: EncodingFormat::Pcm24,
            inverse_filter: false,
            metadata: MetadataOptions::default(),
        }
    }
}

impl SignalRequest {
    /// Create a request for `signal` with default shaping
    pub fn new(signal: SignalKind) -> Self {
        Self {
            signal,
            fade_in: Fade::default(),
            fade_out: Fade::default(),
            ..Self::default()
        }
    }

    /// Parse a request from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a request from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize as pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Convert seconds to a whole number of samples at the request's rate
    pub fn secs_to_samples(&self, secs: f64) -> usize {
        (secs * self.sample_rate as f64).round().max(0.0) as usize
    }

    /// Total frames of the final file, including repetitions and silence
    pub fn estimated_frames(&self) -> f64 {
        let sr = self.sample_rate as f64;
        let single = self.signal.estimated_samples(self.sample_rate);
        let reps = self.repetitions.max(1) as f64;
        let gap = (self.repetition_gap_secs * sr).round();
        let lead = (self.lead_silence_secs * sr).round();
        let trail = (self.trail_silence_secs * sr).round();
        single * reps + gap * (reps - 1.0) + lead + trail
    }

    /// Duration of the final file in seconds
    pub fn estimated_duration_secs(&self) -> f64 {
        self.estimated_frames() / self.sample_rate as f64
    }

    /// Check every field against the request contract.
    ///
    /// The pipeline assumes a validated request: finite, positive lengths
    /// and frequencies in the right order.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(SignalError::invalid(
                "sample_rate",
                format!(
                    "{} Hz is outside {}..={} Hz",
                    self.sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
                ),
            ));
        }
        if !self.level_dbfs.is_finite() {
            return Err(SignalError::invalid("level_dbfs", "must be finite"));
        }

        self.validate_signal()?;

        for (name, secs) in [
            ("repetition_gap_secs", self.repetition_gap_secs),
            ("lead_silence_secs", self.lead_silence_secs),
            ("trail_silence_secs", self.trail_silence_secs),
        ] {
            check_duration(name, secs)?;
        }
        for (name, fade) in [("fade_in", &self.fade_in), ("fade_out", &self.fade_out)] {
            match fade.length {
                FadeLength::Secs(secs) => check_duration(name, secs)?,
                FadeLength::Octave => {
                    if !fade.is_none()
                        && !matches!(self.signal, SignalKind::ExponentialSweep { .. })
                    {
                        return Err(SignalError::invalid(
                            name,
                            "octave fades are only defined for exponential sweeps",
                        ));
                    }
                }
            }
        }

        if self.inverse_filter && !matches!(self.signal, SignalKind::ExponentialSweep { .. }) {
            return Err(SignalError::invalid(
                "inverse_filter",
                "an inverse filter can only be derived from an exponential sweep",
            ));
        }

        let single = self.signal.estimated_samples(self.sample_rate);
        if !single.is_finite() || single <= 0.0 {
            return Err(SignalError::NonFiniteResult {
                what: "signal length".to_string(),
                value: single,
            });
        }
        let frames = self.estimated_frames();
        if !frames.is_finite() || frames <= 0.0 {
            return Err(SignalError::NonFiniteResult {
                what: "file length".to_string(),
                value: frames,
            });
        }
        if frames > MAX_FRAMES as f64 {
            return Err(SignalError::invalid(
                "duration",
                format!("{} frames exceeds the maximum of {}", frames, MAX_FRAMES),
            ));
        }
        Ok(())
    }

    fn validate_signal(&self) -> Result<()> {
        let nyquist = self.sample_rate as f64 / 2.0;
        match &self.signal {
            SignalKind::ExponentialSweep {
                start_hz,
                end_hz,
                duration_secs,
            }
            | SignalKind::LinearSweep {
                start_hz,
                end_hz,
                duration_secs,
            } => {
                check_frequency_range(*start_hz, *end_hz, nyquist)?;
                check_positive("duration_secs", *duration_secs)?;
            }
            SignalKind::WhiteNoise { duration_secs, .. }
            | SignalKind::PinkNoise { duration_secs, .. } => {
                check_positive("duration_secs", *duration_secs)?;
            }
            SignalKind::Mls { order, periods } => {
                if !(MIN_ORDER..=MAX_ORDER).contains(order) {
                    return Err(SignalError::UnsupportedOrder { order: *order });
                }
                if *periods == 0 {
                    return Err(SignalError::invalid("periods", "must be at least 1"));
                }
            }
            SignalKind::SteppedTone {
                start_hz,
                end_hz,
                steps_per_octave,
                spacing,
                dwell_secs,
                gap_secs,
            } => {
                check_frequency_range(*start_hz, *end_hz, nyquist)?;
                check_positive("steps_per_octave", *steps_per_octave)?;
                check_positive("dwell_secs", *dwell_secs)?;
                check_duration("gap_secs", *gap_secs)?;

                let count = step_count(*start_hz, *end_hz, *steps_per_octave);
                if count > MAX_STEPS {
                    return Err(SignalError::invalid(
                        "steps_per_octave",
                        format!(
                            "{} steps per octave gives more than {} steps",
                            steps_per_octave, MAX_STEPS
                        ),
                    ));
                }
                // The end tolerance can push the last step past the end frequency
                let top = step_frequencies(*start_hz, *end_hz, *steps_per_octave, *spacing)
                    .last()
                    .copied()
                    .unwrap_or(*start_hz);
                if top > nyquist {
                    return Err(SignalError::invalid(
                        "end_hz",
                        format!(
                            "top step {} Hz is above the Nyquist frequency {} Hz",
                            top, nyquist
                        ),
                    ));
                }
            }
            SignalKind::ToneBurst { steps } => {
                if steps.is_empty() {
                    return Err(SignalError::invalid("steps", "pattern has no steps"));
                }
                for (i, step) in steps.iter().enumerate() {
                    if !(step.frequency_hz > 0.0 && step.frequency_hz < nyquist) {
                        return Err(SignalError::invalid(
                            format!("steps[{}].frequency_hz", i),
                            format!("{} Hz is outside (0, {}) Hz", step.frequency_hz, nyquist),
                        ));
                    }
                    if !(step.level_db.is_finite() && step.level_db <= 0.0) {
                        return Err(SignalError::invalid(
                            format!("steps[{}].level_db", i),
                            format!(
                                "{} dB must be finite and <= 0 dB relative to full scale",
                                step.level_db
                            ),
                        ));
                    }
                    check_duration(&format!("steps[{}].on_ms", i), step.on_ms)?;
                    check_duration(&format!("steps[{}].off_ms", i), step.off_ms)?;
                }
            }
        }
        Ok(())
    }
}

fn check_duration(name: &str, secs: f64) -> Result<()> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(SignalError::invalid(
            name,
            format!("{} must be a finite value >= 0", secs),
        ));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SignalError::invalid(
            name,
            format!("{} must be a finite value > 0", value),
        ));
    }
    Ok(())
}

fn check_frequency_range(start_hz: f64, end_hz: f64, nyquist: f64) -> Result<()> {
    if !start_hz.is_finite() || start_hz <= 0.0 {
        return Err(SignalError::invalid(
            "start_hz",
            format!("{} Hz must be positive", start_hz),
        ));
    }
    if !end_hz.is_finite() || end_hz <= start_hz {
        return Err(SignalError::invalid(
            "end_hz",
            format!("{} Hz must be above the start frequency {} Hz", end_hz, start_hz),
        ));
    }
    if end_hz > nyquist {
        return Err(SignalError::invalid(
            "end_hz",
            format!("{} Hz is above the Nyquist frequency {} Hz", end_hz, nyquist),
        ));
    }
    Ok(())
}
