//! Output filenames and descriptions
//!
//! Both are pure functions of the request and the final duration, so the
//! same request always produces the same strings.

use crate::request::{ChannelMode, SignalKind, SignalRequest, MAX_LEVEL_DBFS, MIN_LEVEL_DBFS};

/// Suffix inserted before the extension of the inverse-filter file
pub const INVERSE_SUFFIX: &str = "_inverse";

/// Format a number without trailing zeros: 20.0 → "20", 31.5 → "31.5"
fn compact(value: f64) -> String {
    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

fn channel_label(mode: ChannelMode) -> &'static str {
    match mode {
        ChannelMode::Mono => "mono",
        ChannelMode::Stereo => "stereo",
        ChannelMode::SyncImpulse => "sync",
        ChannelMode::Alternating => "alt",
        ChannelMode::Rotating => "rot",
    }
}

/// Kind-specific part of the filename
fn signal_stem(signal: &SignalKind) -> String {
    match signal {
        SignalKind::Mls { order, periods } if *periods > 1 => {
            format!("{}{}x{}", signal.tag(), order, periods)
        }
        SignalKind::Mls { order, .. } => format!("{}{}", signal.tag(), order),
        SignalKind::ToneBurst { steps } => format!("{}{}", signal.tag(), steps.len()),
        _ => match signal.frequency_range() {
            Some((f1, f2)) => format!("{}_{}-{}Hz", signal.tag(), compact(f1), compact(f2)),
            None => signal.tag().to_string(),
        },
    }
}

/// Filename for the generated signal, e.g. `ess_20-20000Hz_10s_48k_24bit_mono.wav`
pub fn filename(request: &SignalRequest, duration_secs: f64) -> String {
    let format = match request.format.bits_per_sample() {
        32 => "32f".to_string(),
        bits => format!("{}bit", bits),
    };
    format!(
        "{}_{}s_{}k_{}_{}.wav",
        signal_stem(&request.signal),
        compact(duration_secs),
        compact(request.sample_rate as f64 / 1000.0),
        format,
        channel_label(request.channels)
    )
}

/// Filename of the inverse filter that belongs to `signal_filename`
pub fn inverse_filename(signal_filename: &str) -> String {
    match signal_filename.strip_suffix(".wav") {
        Some(stem) => format!("{}{}.wav", stem, INVERSE_SUFFIX),
        None => format!("{}{}", signal_filename, INVERSE_SUFFIX),
    }
}

/// Free-text description for the `bext` chunk
pub fn description(request: &SignalRequest, duration_secs: f64) -> String {
    let mut text = request.signal.display_name().to_string();
    match &request.signal {
        SignalKind::Mls { order, periods } => {
            text.push_str(&format!(", order {}, {} period(s)", order, periods));
        }
        SignalKind::ToneBurst { steps } => {
            text.push_str(&format!(", {} burst(s)", steps.len()));
        }
        SignalKind::WhiteNoise { seed: Some(seed), .. }
        | SignalKind::PinkNoise { seed: Some(seed), .. } => {
            text.push_str(&format!(", seed {}", seed));
        }
        signal => {
            if let Some((f1, f2)) = signal.frequency_range() {
                text.push_str(&format!(" {}-{} Hz", compact(f1), compact(f2)));
            }
        }
    }
    text.push_str(&format!(
        ", {:.3} s, {} Hz, {}, {:.1} dBFS, {}",
        duration_secs,
        request.sample_rate,
        request.format.label(),
        request.level_dbfs.clamp(MIN_LEVEL_DBFS, MAX_LEVEL_DBFS),
        channel_label(request.channels)
    ));
    if request.repetitions > 1 {
        text.push_str(&format!(", {} repetitions", request.repetitions));
    }
    text
}
