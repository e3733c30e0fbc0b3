//! Fixtures shared by the integration tests: header builders and codecs that
//! "encode" by writing a fresh header.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use mixopt_core::codec::{
    header, mpeg, riff, AudioCodec, Dimensions, ImageCodec, ImageFormat, Mp3Info, SoundFormat, WavInfo,
};
use mixopt_core::{CodecError, KeySource};

pub fn tga(width: u16, height: u16) -> Vec<u8> {
    let mut h = vec![0u8; 18];
    h[2] = 2;
    h[12..14].copy_from_slice(&width.to_le_bytes());
    h[14..16].copy_from_slice(&height.to_le_bytes());
    h[16] = 32;
    h
}

pub fn dds(width: u32, height: u32) -> Vec<u8> {
    let mut h = vec![0u8; 128];
    h[..4].copy_from_slice(b"DDS ");
    h[4..8].copy_from_slice(&124u32.to_le_bytes());
    h[12..16].copy_from_slice(&height.to_le_bytes());
    h[16..20].copy_from_slice(&width.to_le_bytes());
    h
}

/// MPEG-1 Layer III frames at 44.1 kHz.
pub fn mp3(kbps: &[u32]) -> Vec<u8> {
    const RATES: [u32; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
    let mut out = Vec::new();
    for rate in kbps {
        let index = RATES.iter().position(|r| r == rate).unwrap() as u8;
        let mut frame = vec![0xFF, 0xFB, index << 4, 0x00];
        frame.resize((144_000 * rate / 44_100) as usize, 0);
        out.extend(frame);
    }
    out
}

pub fn wav(sample_rate: u32, channels: u16, bits: u16) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let mut b = Vec::new();
    b.extend_from_slice(b"RIFF");
    b.extend_from_slice(&(36u32 + 8).to_le_bytes());
    b.extend_from_slice(b"WAVE");
    b.extend_from_slice(b"fmt ");
    b.extend_from_slice(&16u32.to_le_bytes());
    b.extend_from_slice(&1u16.to_le_bytes());
    b.extend_from_slice(&channels.to_le_bytes());
    b.extend_from_slice(&sample_rate.to_le_bytes());
    b.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    b.extend_from_slice(&block_align.to_le_bytes());
    b.extend_from_slice(&bits.to_le_bytes());
    b.extend_from_slice(b"data");
    b.extend_from_slice(&8u32.to_le_bytes());
    b.extend_from_slice(&[0u8; 8]);
    b
}

pub fn utf16be(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
}

pub struct HeaderImages;

impl ImageCodec for HeaderImages {
    fn dimensions(&self, bytes: &[u8], format: ImageFormat) -> Result<Dimensions, CodecError> {
        header::image_dimensions(bytes, format)
    }

    fn transcode(
        &self,
        bytes: &[u8],
        from: ImageFormat,
        resize: Option<Dimensions>,
        to: ImageFormat,
    ) -> Result<Vec<u8>, CodecError> {
        let size = match resize {
            Some(size) => size,
            None => header::image_dimensions(bytes, from)?,
        };
        Ok(match to {
            ImageFormat::Dds => dds(size.width, size.height),
            ImageFormat::Tga => tga(size.width as u16, size.height as u16),
        })
    }
}

pub struct HeaderAudio;

impl AudioCodec for HeaderAudio {
    fn mp3_info(&self, bytes: &[u8]) -> Result<Mp3Info, CodecError> {
        mpeg::scan(bytes)
    }

    fn wav_info(&self, bytes: &[u8]) -> Result<WavInfo, CodecError> {
        riff::wav_info(bytes)
    }

    fn encode_mp3(&self, _bytes: &[u8], _from: SoundFormat, bitrate: u32) -> Result<Vec<u8>, CodecError> {
        Ok(mp3(&[bitrate / 1000; 8]))
    }
}

pub struct Keys(pub Vec<char>);

impl KeySource for Keys {
    fn read_key(&mut self) -> io::Result<Option<char>> {
        Ok(if self.0.is_empty() { None } else { Some(self.0.remove(0)) })
    }
}

#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
