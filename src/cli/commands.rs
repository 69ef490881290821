//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::cli::{GenerateArgs, KindArg};
use crate::engine::probe::{decode, probe, WavLayout};
use crate::engine::{linear_to_db, peak, rms, SampleBuffer};
use crate::generators::{step_frequencies, StepSpacing};
use crate::pipeline::{self, EncodedFile};
use crate::request::{
    Dither, DitherMode, EncodingFormat, Fade, FadeShape, SampleEncoding, SignalKind, SignalRequest,
};

/// Edge fade for kinds without an octave fade
const EDGE_FADE_SECS: f64 = 0.01;

/// Build a request from command-line flags, or load it from `--request`
pub fn build_request(args: &GenerateArgs) -> Result<SignalRequest> {
    if let Some(path) = &args.request {
        return SignalRequest::from_json_file(path)
            .with_context(|| format!("Failed to load request from {}", path.display()));
    }

    let signal = match args.kind {
        KindArg::Ess => SignalKind::ExponentialSweep {
            start_hz: args.start_hz,
            end_hz: args.end_hz,
            duration_secs: args.duration,
        },
        KindArg::Linear => SignalKind::LinearSweep {
            start_hz: args.start_hz,
            end_hz: args.end_hz,
            duration_secs: args.duration,
        },
        KindArg::White => SignalKind::WhiteNoise {
            duration_secs: args.duration,
            seed: args.seed,
        },
        KindArg::Pink => SignalKind::PinkNoise {
            duration_secs: args.duration,
            seed: args.seed,
        },
        KindArg::Mls => SignalKind::Mls {
            order: args.order,
            periods: args.periods,
        },
        KindArg::Stepped => SignalKind::SteppedTone {
            start_hz: args.start_hz,
            end_hz: args.end_hz,
            steps_per_octave: args.steps_per_octave,
            spacing: StepSpacing::Logarithmic,
            dwell_secs: args.dwell,
            gap_secs: args.step_gap,
        },
    };

    let mut request = SignalRequest::new(signal);
    match args.kind {
        KindArg::Ess => {
            let defaults = SignalRequest::default();
            request.fade_in = defaults.fade_in;
            request.fade_out = defaults.fade_out;
        }
        KindArg::Linear => {
            request.fade_in = Fade::new(FadeShape::Hann, EDGE_FADE_SECS);
            request.fade_out = Fade::new(FadeShape::Hann, EDGE_FADE_SECS);
        }
        _ => {}
    }

    let encoding = if args.bits == 32 {
        SampleEncoding::Float
    } else {
        SampleEncoding::Pcm
    };
    request.format = EncodingFormat::new(args.bits, encoding)?;
    request.sample_rate = args.sample_rate;
    request.level_dbfs = args.level;
    request.channels = args.channels.into();
    request.repetitions = args.repetitions;
    request.repetition_gap_secs = args.gap;
    request.lead_silence_secs = args.lead;
    request.trail_silence_secs = args.trail;
    request.inverse_filter = args.inverse;
    request.metadata.include_bext = !args.no_bext;
    if args.dither {
        request.dither = Dither {
            mode: DitherMode::Tpdf,
            seed: args.seed,
            ..Dither::default()
        };
    }
    Ok(request)
}

/// Where to write a file: `output` itself when it names a .wav file,
/// otherwise `output/filename`
fn target_path(output: &Path, filename: &str) -> PathBuf {
    let is_file = output
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if is_file {
        output.to_path_buf()
    } else {
        output.join(filename)
    }
}

fn write_file(file: &EncodedFile, path: &Path) -> Result<()> {
    std::fs::write(path, file.bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {} ({} bytes)", path.display(), file.len());
    println!("  sha256: {}", file.sha256_hex());
    Ok(())
}

/// Generate a stimulus file (and its inverse filter when requested).
pub fn generate(args: &GenerateArgs) -> Result<()> {
    let request = build_request(args)?;
    info!(
        "Generating {} ({:.3} s)",
        request.signal.display_name(),
        request.estimated_duration_secs()
    );

    let mut next_decile = 0.1;
    let mut log_progress = |fraction: f64| {
        while fraction >= next_decile {
            debug!("Progress: {:.0}%", next_decile * 100.0);
            next_decile += 0.1;
        }
    };
    let rendered = pipeline::generate(&request, &mut log_progress)
        .context("Signal generation failed")?;

    if args.output.extension().is_none() {
        std::fs::create_dir_all(&args.output)
            .with_context(|| format!("Failed to create {}", args.output.display()))?;
    }

    let signal_path = target_path(&args.output, rendered.signal.filename());
    write_file(&rendered.signal, &signal_path)?;
    println!("  {}", rendered.signal.description());

    if let Some(inverse) = &rendered.inverse_filter {
        let inverse_path = match signal_path.parent() {
            Some(dir) => dir.join(inverse.filename()),
            None => PathBuf::from(inverse.filename()),
        };
        write_file(inverse, &inverse_path)?;
    }

    Ok(())
}

/// Print the layout of a WAVE file.
pub fn inspect(path: &Path) -> Result<()> {
    info!("Inspecting: {}", path.display());

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let layout = probe(&bytes)
        .with_context(|| format!("{} is not a valid WAVE file", path.display()))?;
    print_layout(path, &layout);

    let channels = decode(&bytes)
        .with_context(|| format!("Failed to decode samples of {}", path.display()))?;
    for (i, (peak_db, rms_db)) in channel_levels(&channels).into_iter().enumerate() {
        println!("Channel {}:     peak {:>7.2} dBFS  rms {:>7.2} dBFS", i, peak_db, rms_db);
    }
    Ok(())
}

/// Peak and RMS level of each channel, in dBFS
fn channel_levels(channels: &[SampleBuffer]) -> Vec<(f64, f64)> {
    channels
        .iter()
        .map(|c| (linear_to_db(peak(c)), linear_to_db(rms(c))))
        .collect()
}

fn print_layout(path: &Path, layout: &WavLayout) {
    let format = &layout.format;
    println!("File: {}", path.display());
    println!("{:-<60}", "");
    println!("RIFF size:     {}", layout.riff_size);
    for chunk in &layout.chunks {
        println!("  '{}' at {:>8}  size {:>10}", chunk.id, chunk.offset, chunk.size);
    }
    println!("{:-<60}", "");
    println!("Format tag:    0x{:04X}", format.format_tag);
    if let Some(code) = format.sub_format {
        println!("Sub-format:    0x{:04X}", code);
    }
    println!("Channels:      {}", format.channels);
    println!("Sample rate:   {} Hz", format.sample_rate);
    println!("Bits:          {}", format.bits_per_sample);
    if let Some(valid) = format.valid_bits {
        println!("Valid bits:    {}", valid);
    }
    println!("Frames:        {}", layout.num_frames());
    println!("Duration:      {:.3} s", layout.duration_secs());
}

/// List stepped-tone frequencies.
pub fn frequencies(start_hz: f64, end_hz: f64, steps_per_octave: f64, linear: bool) -> Result<()> {
    let spacing = if linear {
        StepSpacing::Linear
    } else {
        StepSpacing::Logarithmic
    };
    let freqs = step_frequencies(start_hz, end_hz, steps_per_octave, spacing);
    if freqs.is_empty() {
        anyhow::bail!(
            "No steps between {} Hz and {} Hz at {} steps/octave",
            start_hz,
            end_hz,
            steps_per_octave
        );
    }
    for (i, f) in freqs.iter().enumerate() {
        println!("{:>4}  {:>10.2} Hz", i + 1, f);
    }
    Ok(())
}

/// Print the default request as pretty JSON.
pub fn example_request() -> Result<()> {
    println!("{}", SignalRequest::default().to_json_pretty()?);
    Ok(())
}
