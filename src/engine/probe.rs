//! Reading generated files back
//!
//! [`probe`] walks the RIFF chunk list and reports the layout exactly as it
//! sits on disk. [`decode`] hands the bytes to `hound` and returns
//! per-channel samples normalized to [-1, 1].

use std::io::Cursor;

use hound::{SampleFormat, WavReader};

use crate::engine::buffer::SampleBuffer;
use crate::engine::wav::{
    CHUNK_HEADER_LEN, FMT_PCM_LEN, RIFF_HEADER_LEN, WAVE_FORMAT_EXTENSIBLE,
};
use crate::error::{Result, SignalError};

/// One chunk as found in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    pub id: String,
    /// Offset of the chunk header from the start of the file
    pub offset: usize,
    /// Value of the size field (payload only, pad byte excluded)
    pub size: usize,
}

/// Parsed `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSummary {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Valid bits and sub-format code, present for WAVE_FORMAT_EXTENSIBLE
    pub valid_bits: Option<u16>,
    pub sub_format: Option<u16>,
}

impl FormatSummary {
    /// Effective format code: the sub-format for extensible files
    pub fn format_code(&self) -> u16 {
        self.sub_format.unwrap_or(self.format_tag)
    }
}

/// Everything [`probe`] learns about a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavLayout {
    pub riff_size: usize,
    pub chunks: Vec<ChunkInfo>,
    pub format: FormatSummary,
    pub data_size: usize,
}

impl WavLayout {
    pub fn chunk(&self, id: &str) -> Option<&ChunkInfo> {
        self.chunks.iter().find(|c| c.id == id)
    }

    pub fn chunk_ids(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.id.as_str()).collect()
    }

    pub fn num_frames(&self) -> usize {
        match self.format.block_align {
            0 => 0,
            align => self.data_size / align as usize,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.num_frames() as f64 / self.format.sample_rate as f64
    }
}

fn malformed(reason: impl Into<String>) -> SignalError {
    SignalError::InvalidContainer {
        reason: reason.into(),
        source: None,
    }
}

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Walk the chunk list of a RIFF/WAVE buffer
pub fn probe(bytes: &[u8]) -> Result<WavLayout> {
    if bytes.len() < RIFF_HEADER_LEN || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(malformed("missing RIFF/WAVE header"));
    }
    let riff_size = le_u32(bytes, 4) as usize;
    if riff_size + 8 != bytes.len() {
        return Err(malformed(format!(
            "RIFF size {} does not match file length {}",
            riff_size,
            bytes.len()
        )));
    }

    let mut chunks = Vec::new();
    let mut offset = RIFF_HEADER_LEN;
    while offset < bytes.len() {
        if offset + CHUNK_HEADER_LEN > bytes.len() {
            return Err(malformed(format!("truncated chunk header at {}", offset)));
        }
        let id = String::from_utf8_lossy(&bytes[offset..offset + 4]).into_owned();
        let size = le_u32(bytes, offset + 4) as usize;
        let end = offset + CHUNK_HEADER_LEN + size;
        if end > bytes.len() {
            return Err(malformed(format!(
                "chunk '{}' at {} overruns the file",
                id, offset
            )));
        }
        chunks.push(ChunkInfo { id, offset, size });
        offset = end + size % 2;
    }

    let fmt = chunks
        .iter()
        .find(|c| c.id == "fmt ")
        .ok_or_else(|| malformed("no fmt chunk"))?;
    let format = parse_format(&bytes[fmt.offset + CHUNK_HEADER_LEN..][..fmt.size])?;
    let data_size = chunks
        .iter()
        .find(|c| c.id == "data")
        .map(|c| c.size)
        .ok_or_else(|| malformed("no data chunk"))?;

    Ok(WavLayout {
        riff_size,
        chunks,
        format,
        data_size,
    })
}

fn parse_format(payload: &[u8]) -> Result<FormatSummary> {
    if payload.len() < FMT_PCM_LEN {
        return Err(malformed(format!("fmt chunk is {} bytes", payload.len())));
    }
    let format_tag = le_u16(payload, 0);
    let (valid_bits, sub_format) = if format_tag == WAVE_FORMAT_EXTENSIBLE {
        if payload.len() < 26 {
            return Err(malformed("extensible fmt chunk is too short"));
        }
        (Some(le_u16(payload, 18)), Some(le_u16(payload, 24)))
    } else {
        (None, None)
    };

    Ok(FormatSummary {
        format_tag,
        channels: le_u16(payload, 2),
        sample_rate: le_u32(payload, 4),
        byte_rate: le_u32(payload, 8),
        block_align: le_u16(payload, 12),
        bits_per_sample: le_u16(payload, 14),
        valid_bits,
        sub_format,
    })
}

/// Decode the samples of a WAVE buffer into per-channel buffers
pub fn decode(bytes: &[u8]) -> Result<Vec<SampleBuffer>> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| SignalError::InvalidContainer {
        reason: format!("Failed to read WAV data: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(malformed("zero channels"));
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<f64>, _>>(),
        SampleFormat::Int => {
            let scale = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<std::result::Result<Vec<f64>, _>>()
        }
    }
    .map_err(|e| SignalError::InvalidContainer {
        reason: format!("Failed to decode samples: {}", e),
        source: Some(Box::new(e)),
    })?;

    Ok(deinterleave(&interleaved, channels))
}

fn deinterleave(samples: &[f64], channels: usize) -> Vec<SampleBuffer> {
    let frames = samples.len() / channels;
    let mut out = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (ch, &s) in frame.iter().enumerate() {
            out[ch].push(s);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::ChannelSet;
    use crate::engine::wav::{encode, BwfMetadata};
    use crate::progress::NoProgress;
    use crate::request::EncodingFormat;

    fn ramp(frames: usize) -> Vec<f64> {
        (0..frames)
            .map(|i| -1.0 + 2.0 * i as f64 / (frames - 1) as f64)
            .collect()
    }

    #[test]
    fn test_probe_finds_all_chunks() {
        let set = ChannelSet::mono(ramp(100), 48000);
        let meta = BwfMetadata::new("probe", "sweepgen");
        let wav = encode(&set, EncodingFormat::Float32, Some(&meta), &mut NoProgress);
        let layout = probe(&wav).unwrap();

        assert_eq!(layout.chunk_ids(), vec!["bext", "fmt ", "fact", "data"]);
        assert_eq!(layout.riff_size + 8, wav.len());
        assert_eq!(layout.format.format_tag, WAVE_FORMAT_EXTENSIBLE);
        assert_eq!(layout.format.format_code(), 3);
        assert_eq!(layout.format.valid_bits, Some(32));
        assert_eq!(layout.num_frames(), 100);
        assert_eq!(layout.chunk("bext").unwrap().size, meta.payload_len());
    }

    #[test]
    fn test_probe_respects_pad_byte() {
        let set = ChannelSet::mono(vec![0.5; 3], 8000);
        let wav = encode(&set, EncodingFormat::Pcm24, None, &mut NoProgress);
        let layout = probe(&wav).unwrap();
        assert_eq!(layout.data_size, 9);
        assert_eq!(layout.num_frames(), 3);
    }

    #[test]
    fn test_probe_rejects_garbage() {
        assert!(probe(b"not a wav file").is_err());

        let set = ChannelSet::mono(vec![0.0; 10], 48000);
        let mut wav = encode(&set, EncodingFormat::Pcm16, None, &mut NoProgress);
        wav.truncate(wav.len() - 4);
        let err = probe(&wav).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONTAINER");
    }

    #[test]
    fn test_decode_all_formats() {
        let left = ramp(256);
        let right: Vec<f64> = left.iter().map(|s| -s * 0.5).collect();
        let set = ChannelSet::new(vec![left.clone(), right.clone()], 44100).unwrap();

        for (format, tolerance) in [
            (EncodingFormat::Pcm16, 1.0 / 32767.0),
            (EncodingFormat::Pcm24, 1.0 / 8_388_607.0),
            (EncodingFormat::Float32, 1e-7),
        ] {
            let wav = encode(&set, format, None, &mut NoProgress);
            let decoded = decode(&wav).unwrap();
            assert_eq!(decoded.len(), 2);
            for (a, b) in decoded[0].iter().zip(&left) {
                assert!((a - b).abs() <= tolerance, "{:?}: {} vs {}", format, a, b);
            }
            for (a, b) in decoded[1].iter().zip(&right) {
                assert!((a - b).abs() <= tolerance, "{:?}: {} vs {}", format, a, b);
            }
        }
    }

    #[test]
    fn test_decode_with_bext() {
        let set = ChannelSet::mono(vec![0.25; 50], 48000);
        let meta = BwfMetadata::new("decode", "sweepgen");
        let wav = encode(&set, EncodingFormat::Pcm16, Some(&meta), &mut NoProgress);
        let decoded = decode(&wav).unwrap();
        assert_eq!(decoded[0].len(), 50);
    }
}
