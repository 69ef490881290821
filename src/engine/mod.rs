//! Buffers and containers
//!
//! - Sample buffers and the validated channel set
//! - RIFF/WAVE + Broadcast Wave encoding
//! - Reading files back for inspection
//! - Waveform overview for display

pub mod buffer;
pub mod overview;
pub mod probe;
pub mod wav;

pub use buffer::{db_to_linear, linear_to_db, peak, rms, ChannelSet, SampleBuffer};
pub use overview::overview;
pub use probe::{decode, probe, ChunkInfo, FormatSummary, WavLayout};
pub use wav::{encode, BwfMetadata, ChunkLayout};
