//! RIFF/WAVE container encoder
//!
//! Writes a byte-exact WAVE file with an optional Broadcast Wave `bext`
//! chunk. Chunk order is `bext`, `fmt `, `fact`, `data`:
//!
//! - 16-bit PCM uses the plain 16-byte format chunk and no `fact` chunk.
//! - 24-bit PCM and 32-bit float use the 40-byte WAVE_FORMAT_EXTENSIBLE
//!   format chunk followed by a `fact` chunk holding the frame count.
//!
//! Every chunk size field equals the number of payload bytes that follow.
//! An odd-length data payload is followed by one pad byte, which the RIFF
//! size counts and the data size does not.

use chrono::{DateTime, Local};

use crate::engine::buffer::ChannelSet;
use crate::progress::{tick, Progress};
use crate::request::{EncodingFormat, SampleEncoding};

/// Size of the RIFF header (`RIFF`, size, `WAVE`)
pub const RIFF_HEADER_LEN: usize = 12;

/// Size of a chunk header (id + size)
pub const CHUNK_HEADER_LEN: usize = 8;

/// Plain PCM format chunk payload
pub const FMT_PCM_LEN: usize = 16;

/// WAVE_FORMAT_EXTENSIBLE format chunk payload
pub const FMT_EXTENSIBLE_LEN: usize = 40;

/// `fact` chunk payload (frame count)
pub const FACT_LEN: usize = 4;

/// Fixed part of the `bext` payload before the coding history
pub const BEXT_FIXED_LEN: usize = 602;

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// KSDATAFORMAT sub-format GUID tail; the first two bytes hold the format code
const SUBFORMAT_GUID_TAIL: [u8; 14] = [
    0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

const SPEAKER_FRONT_LEFT: u32 = 0x1;
const SPEAKER_FRONT_RIGHT: u32 = 0x2;
const SPEAKER_FRONT_CENTER: u32 = 0x4;

// bext field widths (EBU Tech 3285)
const BEXT_DESCRIPTION_LEN: usize = 256;
const BEXT_ORIGINATOR_LEN: usize = 32;
const BEXT_REFERENCE_LEN: usize = 32;
const BEXT_DATE_LEN: usize = 10;
const BEXT_TIME_LEN: usize = 8;
const BEXT_UMID_LEN: usize = 64;
const BEXT_RESERVED_LEN: usize = 190;
const BEXT_VERSION: u16 = 1;

// ============================================================================
// Broadcast Wave metadata
// ============================================================================

/// Descriptive fields written verbatim into the `bext` chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BwfMetadata {
    pub description: String,
    pub originator: String,
    pub originator_reference: String,
    /// `yyyy-mm-dd`
    pub origination_date: String,
    /// `hh:mm:ss`
    pub origination_time: String,
    /// Sample count since midnight of the first sample
    pub time_reference: u64,
    pub coding_history: String,
}

impl BwfMetadata {
    /// Metadata stamped with the current local date and time
    pub fn new(description: impl Into<String>, originator: impl Into<String>) -> Self {
        Self::at(description, originator, Local::now())
    }

    /// Metadata stamped with a fixed timestamp
    pub fn at(
        description: impl Into<String>,
        originator: impl Into<String>,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            description: description.into(),
            originator: originator.into(),
            originator_reference: String::new(),
            origination_date: timestamp.format("%Y-%m-%d").to_string(),
            origination_time: timestamp.format("%H:%M:%S").to_string(),
            time_reference: 0,
            coding_history: String::new(),
        }
    }

    /// Standard coding-history line for a file produced by this encoder
    pub fn coding_history_for(format: EncodingFormat, channels: usize, sample_rate: u32) -> String {
        let algorithm = match format.encoding() {
            SampleEncoding::Pcm => "PCM",
            SampleEncoding::Float => "FLOAT",
        };
        let mode = if channels == 1 { "mono" } else { "stereo" };
        format!(
            "A={},F={},W={},M={},T=sweepgen {}\r\n",
            algorithm,
            sample_rate,
            format.bits_per_sample(),
            mode,
            env!("CARGO_PKG_VERSION")
        )
    }

    /// Coding history bytes, NUL-extended to an even length
    fn coding_history_bytes(&self) -> Vec<u8> {
        let mut bytes = ascii_bytes(&self.coding_history);
        if bytes.len() % 2 == 1 {
            bytes.push(0);
        }
        bytes
    }

    /// Size of the `bext` payload
    pub fn payload_len(&self) -> usize {
        BEXT_FIXED_LEN + self.coding_history_bytes().len()
    }
}

/// Text as ASCII bytes, anything else replaced with `?`
fn ascii_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

/// Write `text` into a fixed-width, NUL-padded field
fn put_fixed_ascii(buf: &mut Vec<u8>, text: &str, width: usize) {
    let mut bytes = ascii_bytes(text);
    bytes.truncate(width);
    bytes.resize(width, 0);
    buf.extend_from_slice(&bytes);
}

// ============================================================================
// Chunk layout
// ============================================================================

/// Sizes of every chunk for one encode, computed before writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    pub bext_len: Option<usize>,
    pub fmt_len: usize,
    pub fact: bool,
    pub data_len: usize,
}

impl ChunkLayout {
    pub fn new(
        format: EncodingFormat,
        channels: usize,
        frames: usize,
        metadata: Option<&BwfMetadata>,
    ) -> Self {
        Self {
            bext_len: metadata.map(BwfMetadata::payload_len),
            fmt_len: if format.is_extensible() {
                FMT_EXTENSIBLE_LEN
            } else {
                FMT_PCM_LEN
            },
            fact: format.is_extensible(),
            data_len: frames * channels * format.bytes_per_sample(),
        }
    }

    /// Value of the RIFF size field: everything after the first 8 bytes
    pub fn riff_len(&self) -> usize {
        let padded = |len: usize| CHUNK_HEADER_LEN + len + len % 2;
        4 + self.bext_len.map_or(0, padded)
            + padded(self.fmt_len)
            + if self.fact { padded(FACT_LEN) } else { 0 }
            + padded(self.data_len)
    }

    /// Total file length in bytes
    pub fn file_len(&self) -> usize {
        CHUNK_HEADER_LEN + self.riff_len()
    }
}

// ============================================================================
// Encoder
// ============================================================================

/// Encode a channel set into a complete WAVE file.
///
/// Progress is reported while the data chunk is written and does not change
/// the output bytes.
pub fn encode(
    channels: &ChannelSet,
    format: EncodingFormat,
    metadata: Option<&BwfMetadata>,
    progress: &mut dyn Progress,
) -> Vec<u8> {
    let num_channels = channels.num_channels();
    let frames = channels.num_frames();
    let layout = ChunkLayout::new(format, num_channels, frames, metadata);

    let mut buf = Vec::with_capacity(layout.file_len());

    buf.extend_from_slice(b"RIFF");
    put_u32(&mut buf, layout.riff_len());
    buf.extend_from_slice(b"WAVE");

    if let Some(meta) = metadata {
        write_bext(&mut buf, meta);
    }
    write_fmt(&mut buf, format, num_channels, channels.sample_rate());
    if layout.fact {
        buf.extend_from_slice(b"fact");
        put_u32(&mut buf, FACT_LEN);
        put_u32(&mut buf, frames);
    }

    buf.extend_from_slice(b"data");
    put_u32(&mut buf, layout.data_len);
    write_samples(&mut buf, channels, format, progress);
    if layout.data_len % 2 == 1 {
        buf.push(0);
    }
    progress.report(1.0);

    debug_assert_eq!(buf.len(), layout.file_len());
    buf
}

fn put_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Sizes are bounded by request validation, well below u32::MAX
fn put_u32(buf: &mut Vec<u8>, value: usize) {
    buf.extend_from_slice(&(value as u32).to_le_bytes());
}

fn write_bext(buf: &mut Vec<u8>, meta: &BwfMetadata) {
    let history = meta.coding_history_bytes();
    buf.extend_from_slice(b"bext");
    put_u32(buf, BEXT_FIXED_LEN + history.len());

    put_fixed_ascii(buf, &meta.description, BEXT_DESCRIPTION_LEN);
    put_fixed_ascii(buf, &meta.originator, BEXT_ORIGINATOR_LEN);
    put_fixed_ascii(buf, &meta.originator_reference, BEXT_REFERENCE_LEN);
    put_fixed_ascii(buf, &meta.origination_date, BEXT_DATE_LEN);
    put_fixed_ascii(buf, &meta.origination_time, BEXT_TIME_LEN);
    buf.extend_from_slice(&meta.time_reference.to_le_bytes());
    put_u16(buf, BEXT_VERSION);
    buf.resize(buf.len() + BEXT_UMID_LEN + BEXT_RESERVED_LEN, 0);
    buf.extend_from_slice(&history);
}

fn write_fmt(buf: &mut Vec<u8>, format: EncodingFormat, channels: usize, sample_rate: u32) {
    let bits = format.bits_per_sample();
    let block_align = (channels * format.bytes_per_sample()) as u16;
    let byte_rate = sample_rate * block_align as u32;

    buf.extend_from_slice(b"fmt ");
    if format.is_extensible() {
        put_u32(buf, FMT_EXTENSIBLE_LEN);
        put_u16(buf, WAVE_FORMAT_EXTENSIBLE);
    } else {
        put_u32(buf, FMT_PCM_LEN);
        put_u16(buf, WAVE_FORMAT_PCM);
    }
    put_u16(buf, channels as u16);
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    put_u16(buf, block_align);
    put_u16(buf, bits);

    if format.is_extensible() {
        let mask = if channels == 1 {
            SPEAKER_FRONT_CENTER
        } else {
            SPEAKER_FRONT_LEFT | SPEAKER_FRONT_RIGHT
        };
        let code = match format.encoding() {
            SampleEncoding::Pcm => WAVE_FORMAT_PCM,
            SampleEncoding::Float => WAVE_FORMAT_IEEE_FLOAT,
        };
        put_u16(buf, 22);
        put_u16(buf, bits);
        buf.extend_from_slice(&mask.to_le_bytes());
        put_u16(buf, code);
        buf.extend_from_slice(&SUBFORMAT_GUID_TAIL);
    }
}

/// Quantize to signed 16-bit
#[inline]
pub fn to_i16(sample: f64) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

/// Quantize to signed 24-bit, held in an i32
#[inline]
pub fn to_i24(sample: f64) -> i32 {
    (sample.clamp(-1.0, 1.0) * 8_388_607.0).round() as i32
}

fn write_samples(
    buf: &mut Vec<u8>,
    channels: &ChannelSet,
    format: EncodingFormat,
    progress: &mut dyn Progress,
) {
    let frames = channels.num_frames();
    for frame in 0..frames {
        tick(progress, frame, frames);
        for channel in channels.channels() {
            let sample = channel[frame];
            match format {
                EncodingFormat::Pcm16 => buf.extend_from_slice(&to_i16(sample).to_le_bytes()),
                EncodingFormat::Pcm24 => {
                    buf.extend_from_slice(&to_i24(sample).to_le_bytes()[..3]);
                }
                EncodingFormat::Float32 => {
                    buf.extend_from_slice(&(sample as f32).to_le_bytes());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use chrono::TimeZone;

    fn silence(frames: usize) -> ChannelSet {
        ChannelSet::mono(vec![0.0; frames], 48000)
    }

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn read_u16(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn fixed_metadata() -> BwfMetadata {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let mut meta = BwfMetadata::at("Test sweep", "sweepgen", ts);
        meta.originator_reference = "0123456789abcdef0123456789abcdef".to_string();
        meta.coding_history = "A=PCM,F=48000,W=16,M=mono\r\n".to_string();
        meta
    }

    #[test]
    fn test_pcm16_header_layout() {
        let wav = encode(&silence(48000), EncodingFormat::Pcm16, None, &mut NoProgress);
        assert_eq!(wav.len(), 44 + 96000);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(read_u32(&wav, 4) as usize, wav.len() - 8);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(read_u32(&wav, 16), 16);
        assert_eq!(read_u16(&wav, 20), WAVE_FORMAT_PCM);
        assert_eq!(read_u16(&wav, 22), 1);
        assert_eq!(read_u32(&wav, 24), 48000);
        assert_eq!(read_u32(&wav, 28), 96000);
        assert_eq!(read_u16(&wav, 32), 2);
        assert_eq!(read_u16(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(read_u32(&wav, 40), 96000);
    }

    #[test]
    fn test_pcm24_extensible_layout() {
        let wav = encode(&silence(48000), EncodingFormat::Pcm24, None, &mut NoProgress);
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(read_u32(&wav, 16), 40);
        assert_eq!(read_u16(&wav, 20), WAVE_FORMAT_EXTENSIBLE);
        assert_eq!(read_u16(&wav, 32), 3);
        assert_eq!(read_u16(&wav, 34), 24);
        assert_eq!(read_u16(&wav, 36), 22);
        assert_eq!(read_u16(&wav, 38), 24);
        assert_eq!(read_u32(&wav, 40), SPEAKER_FRONT_CENTER);
        assert_eq!(read_u16(&wav, 44), WAVE_FORMAT_PCM);
        assert_eq!(&wav[46..60], &SUBFORMAT_GUID_TAIL);

        assert_eq!(&wav[60..64], b"fact");
        assert_eq!(read_u32(&wav, 64), 4);
        assert_eq!(read_u32(&wav, 68), 48000);
        assert_eq!(&wav[72..76], b"data");
        assert_eq!(read_u32(&wav, 76), 144000);
        assert_eq!(wav.len(), 80 + 144000);
        assert_eq!(read_u32(&wav, 4) as usize, wav.len() - 8);
    }

    #[test]
    fn test_float32_subformat() {
        let set = ChannelSet::new(vec![vec![0.25; 10], vec![-2.0; 10]], 44100).unwrap();
        let wav = encode(&set, EncodingFormat::Float32, None, &mut NoProgress);
        assert_eq!(read_u16(&wav, 20), WAVE_FORMAT_EXTENSIBLE);
        assert_eq!(read_u32(&wav, 40), SPEAKER_FRONT_LEFT | SPEAKER_FRONT_RIGHT);
        assert_eq!(read_u16(&wav, 44), WAVE_FORMAT_IEEE_FLOAT);

        // Float samples are not clamped
        let first = f32::from_le_bytes([wav[80], wav[81], wav[82], wav[83]]);
        let second = f32::from_le_bytes([wav[84], wav[85], wav[86], wav[87]]);
        assert_eq!(first, 0.25);
        assert_eq!(second, -2.0);
    }

    #[test]
    fn test_pcm_quantization() {
        assert_eq!(to_i16(1.0), 32767);
        assert_eq!(to_i16(-1.0), -32767);
        assert_eq!(to_i16(2.0), 32767);
        assert_eq!(to_i16(0.5), 16384);
        assert_eq!(to_i24(1.0), 8_388_607);
        assert_eq!(to_i24(-1.5), -8_388_607);
    }

    #[test]
    fn test_pcm24_negative_twos_complement() {
        let set = ChannelSet::mono(vec![-1.0, 1.0, -1.0 / 8_388_607.0], 48000);
        let wav = encode(&set, EncodingFormat::Pcm24, None, &mut NoProgress);
        let data = &wav[80..];
        assert_eq!(&data[0..3], &[0x01, 0x00, 0x80]);
        assert_eq!(&data[3..6], &[0xFF, 0xFF, 0x7F]);
        assert_eq!(&data[6..9], &[0xFF, 0xFF, 0xFF]);
        // 9 data bytes are odd: one pad byte follows
        assert_eq!(read_u32(&wav, 76), 9);
        assert_eq!(wav.len(), 80 + 10);
        assert_eq!(read_u32(&wav, 4) as usize, wav.len() - 8);
    }

    #[test]
    fn test_stereo_interleaving() {
        let set = ChannelSet::new(vec![vec![1.0, 0.0], vec![-1.0, 0.5]], 48000).unwrap();
        let wav = encode(&set, EncodingFormat::Pcm16, None, &mut NoProgress);
        let data = &wav[44..];
        let samples: Vec<i16> = data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![32767, -32767, 0, 16384]);
    }

    #[test]
    fn test_bext_chunk_layout() {
        let meta = fixed_metadata();
        let wav = encode(&silence(100), EncodingFormat::Pcm16, Some(&meta), &mut NoProgress);

        assert_eq!(&wav[12..16], b"bext");
        let bext_len = read_u32(&wav, 16) as usize;
        assert_eq!(bext_len, 602 + 28);
        assert_eq!(bext_len % 2, 0);

        let payload = &wav[20..20 + bext_len];
        assert_eq!(&payload[..10], b"Test sweep");
        assert!(payload[10..256].iter().all(|&b| b == 0));
        assert_eq!(&payload[256..264], b"sweepgen");
        assert_eq!(&payload[288..320], b"0123456789abcdef0123456789abcdef");
        assert_eq!(&payload[320..330], b"2024-03-09");
        assert_eq!(&payload[330..338], b"14:05:07");
        assert_eq!(&payload[338..346], &[0u8; 8]);
        assert_eq!(read_u16(payload, 346), 1);
        assert!(payload[348..602].iter().all(|&b| b == 0));
        // 27-byte history plus one NUL
        assert_eq!(&payload[602..629], b"A=PCM,F=48000,W=16,M=mono\r\n".as_slice());
        assert_eq!(payload[629], 0);

        let fmt_at = 20 + bext_len;
        assert_eq!(&wav[fmt_at..fmt_at + 4], b"fmt ");
        assert_eq!(read_u32(&wav, 4) as usize, wav.len() - 8);
        assert_eq!(wav.len(), 8 + 4 + (8 + bext_len) + (8 + 16) + (8 + 200));
    }

    #[test]
    fn test_bext_odd_history_is_padded() {
        let mut meta = fixed_metadata();
        meta.coding_history = "abc".to_string();
        assert_eq!(meta.payload_len(), 606);
        meta.coding_history = String::new();
        assert_eq!(meta.payload_len(), 602);
    }

    #[test]
    fn test_bext_text_is_truncated_and_ascii() {
        let mut meta = fixed_metadata();
        meta.description = "é".repeat(300);
        let wav = encode(&silence(2), EncodingFormat::Pcm16, Some(&meta), &mut NoProgress);
        let payload = &wav[20..];
        assert!(payload[..256].iter().all(|&b| b == b'?'));
        assert_eq!(&payload[256..264], b"sweepgen");
    }

    #[test]
    fn test_layout_matches_output_len() {
        let meta = fixed_metadata();
        for format in [
            EncodingFormat::Pcm16,
            EncodingFormat::Pcm24,
            EncodingFormat::Float32,
        ] {
            for channels in [1usize, 2] {
                for frames in [0usize, 1, 7, 1000] {
                    let set =
                        ChannelSet::new(vec![vec![0.1; frames]; channels], 48000).unwrap();
                    for meta in [None, Some(&meta)] {
                        let wav = encode(&set, format, meta, &mut NoProgress);
                        let layout = ChunkLayout::new(format, channels, frames, meta);
                        assert_eq!(wav.len(), layout.file_len());
                        assert_eq!(read_u32(&wav, 4) as usize, layout.riff_len());
                        assert_eq!(wav.len() % 2, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_encoding_is_idempotent() {
        let set = ChannelSet::mono((0..1000).map(|i| (i as f64 * 0.01).sin()).collect(), 48000);
        let meta = fixed_metadata();
        let a = encode(&set, EncodingFormat::Pcm24, Some(&meta), &mut NoProgress);
        let b = encode(&set, EncodingFormat::Pcm24, Some(&meta), &mut NoProgress);
        assert_eq!(a, b);
    }

    #[test]
    fn test_coding_history_line() {
        let line = BwfMetadata::coding_history_for(EncodingFormat::Float32, 2, 96000);
        assert!(line.starts_with("A=FLOAT,F=96000,W=32,M=stereo,T=sweepgen"));
        assert!(line.ends_with("\r\n"));
    }
}
