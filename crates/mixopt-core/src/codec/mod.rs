//! Image and audio collaborators.
//!
//! Metadata (dimensions, bitrates) is read directly from the container
//! headers. Pixel and sample processing is delegated to external encoders
//! (ImageMagick and LAME) through pipes.

pub mod external;
pub mod header;
pub mod mpeg;
pub mod riff;
pub mod tool;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

pub use external::{LameAudioCodec, MagickImageCodec};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(side: u32) -> Self {
        Self::new(side, side)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Dds,
    Tga,
}

impl ImageFormat {
    /// ImageMagick coder name
    pub fn coder(self) -> &'static str {
        match self {
            ImageFormat::Dds => "dds",
            ImageFormat::Tga => "tga",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundFormat {
    Mp3,
    Wav,
}

/// Bitrate facts of an MPEG audio stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mp3Info {
    /// Average over the whole stream, bits per second
    pub average_bitrate: u32,
    /// Bitrate of every frame in stream order, bits per second
    pub frame_bitrates: Vec<u32>,
}

/// Format facts of a RIFF/WAVE file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Average bits per second as declared by the format chunk
    pub bitrate: u32,
}

pub trait ImageCodec {
    /// Natural width and height of the encoded image.
    fn dimensions(&self, bytes: &[u8], format: ImageFormat) -> Result<Dimensions, CodecError>;

    /// Decode, optionally resize ignoring aspect ratio, and encode as `to`.
    fn transcode(
        &self,
        bytes: &[u8],
        from: ImageFormat,
        resize: Option<Dimensions>,
        to: ImageFormat,
    ) -> Result<Vec<u8>, CodecError>;
}

pub trait AudioCodec {
    fn mp3_info(&self, bytes: &[u8]) -> Result<Mp3Info, CodecError>;

    fn wav_info(&self, bytes: &[u8]) -> Result<WavInfo, CodecError>;

    /// Encode the sound as a constant bitrate MP3.
    fn encode_mp3(&self, bytes: &[u8], from: SoundFormat, bitrate: u32) -> Result<Vec<u8>, CodecError>;
}
