//! CLI Module
//!
//! Command-line front end: builds a request from flags or a JSON file,
//! runs the pipeline and writes the result to disk.

pub mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::request::ChannelMode;

/// Sweepgen - measurement stimulus generator
#[derive(Parser, Debug)]
#[command(name = "sweepgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a stimulus file
    #[command(name = "generate")]
    Generate(GenerateArgs),

    /// Print the chunk layout and format of a WAVE file
    #[command(name = "inspect")]
    Inspect {
        /// Path to the WAVE file
        path: PathBuf,
    },

    /// List the step frequencies of a stepped-tone sequence
    #[command(name = "frequencies")]
    Frequencies {
        /// Start frequency in Hz
        #[arg(long, default_value_t = 20.0)]
        start_hz: f64,

        /// End frequency in Hz
        #[arg(long, default_value_t = 20000.0)]
        end_hz: f64,

        /// Steps per octave
        #[arg(long, default_value_t = 3.0)]
        steps_per_octave: f64,

        /// Space steps evenly in Hz instead of per octave
        #[arg(long)]
        linear: bool,
    },

    /// Print the default request as JSON
    #[command(name = "example-request")]
    ExampleRequest,
}

/// Signal kinds selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Ess,
    Linear,
    White,
    Pink,
    Mls,
    Stepped,
}

/// Channel layouts selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChannelsArg {
    Mono,
    Stereo,
    SyncImpulse,
    Alternating,
    Rotating,
}

impl From<ChannelsArg> for ChannelMode {
    fn from(arg: ChannelsArg) -> Self {
        match arg {
            ChannelsArg::Mono => ChannelMode::Mono,
            ChannelsArg::Stereo => ChannelMode::Stereo,
            ChannelsArg::SyncImpulse => ChannelMode::SyncImpulse,
            ChannelsArg::Alternating => ChannelMode::Alternating,
            ChannelsArg::Rotating => ChannelMode::Rotating,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Load the whole request from a JSON file; signal flags are ignored
    #[arg(short, long)]
    pub request: Option<PathBuf>,

    /// Output directory, or a path ending in .wav
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Signal kind
    #[arg(short, long, value_enum, default_value_t = KindArg::Ess)]
    pub kind: KindArg,

    /// Start frequency in Hz (sweeps, stepped tones)
    #[arg(long, default_value_t = 20.0)]
    pub start_hz: f64,

    /// End frequency in Hz (sweeps, stepped tones)
    #[arg(long, default_value_t = 20000.0)]
    pub end_hz: f64,

    /// Duration in seconds (sweeps, noise)
    #[arg(short, long, default_value_t = 10.0)]
    pub duration: f64,

    /// MLS order (10-18)
    #[arg(long, default_value_t = 16)]
    pub order: u32,

    /// MLS periods
    #[arg(long, default_value_t = 1)]
    pub periods: u32,

    /// Noise/dither seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stepped tone: steps per octave
    #[arg(long, default_value_t = 3.0)]
    pub steps_per_octave: f64,

    /// Stepped tone: dwell per step in seconds
    #[arg(long, default_value_t = 1.0)]
    pub dwell: f64,

    /// Stepped tone: silence after each step in seconds
    #[arg(long, default_value_t = 0.1)]
    pub step_gap: f64,

    /// Sample rate in Hz
    #[arg(short = 's', long, default_value_t = 48000)]
    pub sample_rate: u32,

    /// Output level in dBFS
    #[arg(short, long, default_value_t = -3.0, allow_hyphen_values = true)]
    pub level: f64,

    /// Bits per sample: 16, 24 (PCM) or 32 (float)
    #[arg(short, long, default_value_t = 24)]
    pub bits: u16,

    /// Channel layout
    #[arg(short, long, value_enum, default_value_t = ChannelsArg::Mono)]
    pub channels: ChannelsArg,

    /// Number of repetitions
    #[arg(long, default_value_t = 1)]
    pub repetitions: u32,

    /// Silence between repetitions in seconds
    #[arg(long, default_value_t = 0.0)]
    pub gap: f64,

    /// Leading silence in seconds
    #[arg(long, default_value_t = 0.0)]
    pub lead: f64,

    /// Trailing silence in seconds
    #[arg(long, default_value_t = 0.0)]
    pub trail: f64,

    /// Add TPDF dither
    #[arg(long)]
    pub dither: bool,

    /// Also write the inverse filter (exponential sweeps only)
    #[arg(long)]
    pub inverse: bool,

    /// Omit the Broadcast Wave bext chunk
    #[arg(long)]
    pub no_bext: bool,
}
