//! Generation pipeline
//!
//! Validates a [`SignalRequest`], runs generator → post-processing →
//! encoder, and returns the finished file with its name and description.
//! Progress is reported through one observer over fixed ranges:
//!
//! | range        | stage                                   |
//! |--------------|-----------------------------------------|
//! | 0.00 .. 0.40 | generation                              |
//! | 0.40 .. 0.55 | fade, EQ, gain, repetition, pad, dither |
//! | 0.55 .. 0.60 | overview                                |
//! | 0.60 .. 0.90 | encoding                                |
//! | 0.90 .. 1.00 | inverse-filter encoding                 |

pub mod naming;

use log::{debug, info};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::dsp::{
    build_layout, Ditherer, Equalizer, Fader, Gain, Padder, ProcessingChain, Processor, Repeater,
    RepetitionPlan,
};
use crate::engine::{encode, overview, BwfMetadata, ChannelSet, SampleBuffer};
use crate::error::{Result, SignalError};
use crate::generators::{self, inverse_filter, SweepParams};
use crate::progress::{Progress, Stage};
use crate::request::{EncodingFormat, MetadataOptions, SignalKind, SignalRequest};

/// Number of min/max windows in the overview
pub const OVERVIEW_POINTS: usize = 1000;

// ============================================================================
// Outputs
// ============================================================================

/// A finished file: bytes plus the strings that describe it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    bytes: Vec<u8>,
    filename: String,
    description: String,
}

impl EncodedFile {
    pub fn new(bytes: Vec<u8>, filename: String, description: String) -> Self {
        Self {
            bytes,
            filename,
            description,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take ownership of the bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// SHA-256 of the file contents as lowercase hex
    pub fn sha256_hex(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }
}

/// Everything a full generation run produces
#[derive(Debug, Clone)]
pub struct Rendered {
    pub signal: EncodedFile,
    /// Present when the request asked for an inverse filter
    pub inverse_filter: Option<EncodedFile>,
    /// `[min0, max0, min1, max1, ...]` of the first channel
    pub overview: Vec<f64>,
    pub duration_secs: f64,
}

/// Processed channels without encoding, for playback and plotting
#[derive(Debug, Clone)]
pub struct Preview {
    pub channels: ChannelSet,
    pub sample_rate: u32,
}

/// Output of the processing half of the pipeline
struct Processed {
    channels: ChannelSet,
    inverse: Option<SampleBuffer>,
}

// ============================================================================
// Entry points
// ============================================================================

/// Generate and encode the file described by `request`
pub fn generate(request: &SignalRequest, progress: &mut dyn Progress) -> Result<Rendered> {
    let processed = process(request, progress)?;
    let channels = processed.channels;
    let duration_secs = channels.duration_secs();

    let overview = {
        let mut stage = Stage::new(progress, 0.55, 0.60);
        let points = overview(channels.channel(0), OVERVIEW_POINTS);
        stage.finish();
        points
    };

    let filename = naming::filename(request, duration_secs);
    let description = naming::description(request, duration_secs);
    let metadata = bwf_metadata(request, &channels, &description);

    let bytes = {
        let mut stage = Stage::new(progress, 0.60, 0.90);
        encode(&channels, request.format, metadata.as_ref(), &mut stage)
    };
    let signal = EncodedFile::new(bytes, filename, description);

    let inverse_filter = match processed.inverse {
        Some(inverse) => {
            let mut stage = Stage::new(progress, 0.90, 1.0);
            let set = ChannelSet::mono(inverse, channels.sample_rate());
            let bytes = encode(&set, EncodingFormat::Float32, None, &mut stage);
            Some(EncodedFile::new(
                bytes,
                naming::inverse_filename(signal.filename()),
                format!("Inverse filter for {}", signal.description()),
            ))
        }
        None => None,
    };
    progress.report(1.0);

    info!(
        "Generated {} ({} bytes, {:.3} s)",
        signal.filename(),
        signal.len(),
        duration_secs
    );
    Ok(Rendered {
        signal,
        inverse_filter,
        overview,
        duration_secs,
    })
}

/// Run generation and post-processing only
pub fn generate_preview(request: &SignalRequest, progress: &mut dyn Progress) -> Result<Preview> {
    let processed = process(request, progress)?;
    progress.report(1.0);
    let sample_rate = processed.channels.sample_rate();
    Ok(Preview {
        channels: processed.channels,
        sample_rate,
    })
}

// ============================================================================
// Stages
// ============================================================================

/// Validate, generate and post-process: progress 0.0 .. 0.55
fn process(request: &SignalRequest, progress: &mut dyn Progress) -> Result<Processed> {
    request.validate()?;
    let sr = request.sample_rate;
    debug!(
        "Request: {} at {} Hz, {}",
        request.signal.display_name(),
        sr,
        request.format.label()
    );

    let raw = {
        let mut stage = Stage::new(progress, 0.0, 0.40);
        generators::render(&request.signal, sr, &mut stage)?
    };
    ensure_finite("generated signal", &raw)?;

    let mut stage = Stage::new(progress, 0.40, 0.55);

    let mut fader = Fader::for_signal(&request.fade_in, &request.fade_out, &request.signal, sr);
    let shaped = fader.process(raw);

    // The inverse filter matches the faded sweep before EQ and level
    let inverse = match request.signal {
        SignalKind::ExponentialSweep {
            start_hz,
            end_hz,
            duration_secs,
        } if request.inverse_filter => {
            let params = SweepParams::new(start_hz, end_hz, duration_secs, sr);
            Some(inverse_filter(&shaped, &params))
        }
        _ => None,
    };

    let plan = RepetitionPlan::for_request(request, shaped.len());
    let mut chain = build_chain(request, &plan);
    debug!("Processing chain ({} stages): {:?}", chain.len(), chain.names());
    let timeline = chain.process(shaped, &mut stage);
    ensure_finite("processed signal", &timeline)?;

    let channels = build_layout(timeline, request.channels, &plan, sr)?;
    stage.finish();

    Ok(Processed { channels, inverse })
}

/// Reject buffers carrying NaN or infinite samples before they reach the encoder
fn ensure_finite(what: &str, samples: &[f64]) -> Result<()> {
    match samples.iter().find(|s| !s.is_finite()) {
        Some(&value) => Err(SignalError::NonFiniteResult {
            what: what.to_string(),
            value,
        }),
        None => Ok(()),
    }
}

/// Post-fade stages in their fixed order
fn build_chain(request: &SignalRequest, plan: &RepetitionPlan) -> ProcessingChain {
    let mut chain = ProcessingChain::new();
    let equalizer =
        Equalizer::for_signal(request.equalization, &request.signal, request.sample_rate);
    if let Some(eq) = equalizer {
        chain.push(Box::new(eq));
    }
    chain.push(Box::new(Gain::new(request.level_dbfs)));
    chain.push(Box::new(Repeater::new(*plan)));
    chain.push(Box::new(Padder::new(*plan)));
    if let Some(dither) = Ditherer::for_request(&request.dither, request.format, plan) {
        chain.push(Box::new(dither));
    }
    chain
}

/// Resolve the `bext` fields, or `None` when the chunk is disabled
fn bwf_metadata(
    request: &SignalRequest,
    channels: &ChannelSet,
    description: &str,
) -> Option<BwfMetadata> {
    let options: &MetadataOptions = &request.metadata;
    if !options.include_bext {
        return None;
    }

    let mut meta = BwfMetadata::new(description, options.originator.as_str());
    meta.originator_reference = options
        .originator_reference
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
    if let Some(date) = &options.origination_date {
        meta.origination_date = date.clone();
    }
    if let Some(time) = &options.origination_time {
        meta.origination_time = time.clone();
    }
    meta.coding_history = BwfMetadata::coding_history_for(
        request.format,
        channels.num_channels(),
        channels.sample_rate(),
    );
    Some(meta)
}
