//! MPEG audio frame header scanner.

use super::Mp3Info;
use crate::error::CodecError;

// Bitrates in kbps, index 0 (free format) and 15 (bad) excluded at lookup.
const V1_L1: [u32; 15] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448];
const V1_L2: [u32; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384];
const V1_L3: [u32; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
const V2_L1: [u32; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256];
const V2_L23: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

const SAMPLE_RATES_V1: [u32; 3] = [44100, 48000, 32000];
const SAMPLE_RATES_V2: [u32; 3] = [22050, 24000, 16000];
const SAMPLE_RATES_V25: [u32; 3] = [11025, 12000, 8000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    V1,
    V2,
    V25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    I,
    II,
    III,
}

/// One parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub bitrate: u32,
    pub sample_rate: u32,
    pub samples: u32,
    pub length: usize,
}

/// Parse a 4-byte frame header. Returns `None` for anything that is not a
/// valid, fixed-bitrate frame.
pub fn parse_frame_header(h: &[u8]) -> Option<FrameHeader> {
    if h.len() < 4 || h[0] != 0xFF || h[1] & 0xE0 != 0xE0 {
        return None;
    }

    let version = match (h[1] >> 3) & 0x03 {
        0 => Version::V25,
        2 => Version::V2,
        3 => Version::V1,
        _ => return None,
    };
    let layer = match (h[1] >> 1) & 0x03 {
        1 => Layer::III,
        2 => Layer::II,
        3 => Layer::I,
        _ => return None,
    };

    let bitrate_index = (h[2] >> 4) as usize;
    if bitrate_index == 0 || bitrate_index == 15 {
        return None;
    }
    let table = match (version, layer) {
        (Version::V1, Layer::I) => &V1_L1,
        (Version::V1, Layer::II) => &V1_L2,
        (Version::V1, Layer::III) => &V1_L3,
        (_, Layer::I) => &V2_L1,
        (_, _) => &V2_L23,
    };
    let bitrate = table[bitrate_index] * 1000;

    let rate_index = ((h[2] >> 2) & 0x03) as usize;
    if rate_index == 3 {
        return None;
    }
    let sample_rate = match version {
        Version::V1 => SAMPLE_RATES_V1[rate_index],
        Version::V2 => SAMPLE_RATES_V2[rate_index],
        Version::V25 => SAMPLE_RATES_V25[rate_index],
    };
    let padding = ((h[2] >> 1) & 0x01) as u32;

    let (samples, length) = match layer {
        Layer::I => (384, (12 * bitrate / sample_rate + padding) * 4),
        Layer::II => (1152, 144 * bitrate / sample_rate + padding),
        Layer::III if version == Version::V1 => (1152, 144 * bitrate / sample_rate + padding),
        Layer::III => (576, 72 * bitrate / sample_rate + padding),
    };

    Some(FrameHeader {
        bitrate,
        sample_rate,
        samples,
        length: length as usize,
    })
}

/// Length of a leading ID3v2 tag, 0 if there is none.
fn id3v2_len(bytes: &[u8]) -> usize {
    if bytes.len() < 10 || &bytes[..3] != b"ID3" {
        return 0;
    }
    // Syncsafe 28-bit size, excluding the 10-byte header and optional footer
    let size = bytes[6..10]
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | (*b as usize & 0x7F));
    let footer = if bytes[5] & 0x10 != 0 { 10 } else { 0 };
    10 + size + footer
}

/// Walk every frame of the stream, resyncing over junk between frames.
pub fn scan(bytes: &[u8]) -> Result<Mp3Info, CodecError> {
    let mut pos = id3v2_len(bytes);
    let mut frame_bitrates = Vec::new();
    let mut total_bytes: u64 = 0;
    let mut total_seconds = 0f64;

    while pos + 4 <= bytes.len() {
        match parse_frame_header(&bytes[pos..pos + 4]) {
            Some(frame) if frame.length >= 4 && pos + frame.length <= bytes.len() => {
                frame_bitrates.push(frame.bitrate);
                total_bytes += frame.length as u64;
                total_seconds += frame.samples as f64 / frame.sample_rate as f64;
                pos += frame.length;
            }
            _ => pos += 1,
        }
    }

    if frame_bitrates.is_empty() || total_seconds <= 0.0 {
        return Err(CodecError::Decode("no MPEG audio frames found".into()));
    }

    let average_bitrate = (total_bytes as f64 * 8.0 / total_seconds).round() as u32;
    Ok(Mp3Info {
        average_bitrate,
        frame_bitrates,
    })
}
