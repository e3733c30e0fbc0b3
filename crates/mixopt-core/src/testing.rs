//! In-memory codecs for unit tests. They read real headers but "encode" by
//! writing a fresh header with the requested size or bitrate.

use std::cell::Cell;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use indicatif::TermLike;

use crate::codec::header::tests::{dds_header, tga_header};
use crate::codec::mpeg::tests::stream;
use crate::codec::{
    header, mpeg, riff, AudioCodec, Dimensions, ImageCodec, ImageFormat, Mp3Info, SoundFormat, WavInfo,
};
use crate::error::CodecError;
use crate::optimizer::KeySource;

pub(crate) struct FakeImageCodec;

impl ImageCodec for FakeImageCodec {
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
            ImageFormat::Dds => dds_header(size.width, size.height),
            ImageFormat::Tga => tga_header(size.width as u16, size.height as u16),
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeAudioCodec {
    encodes: Cell<usize>,
}

impl FakeAudioCodec {
    pub(crate) fn encodes(&self) -> usize {
        self.encodes.get()
    }
}

impl AudioCodec for FakeAudioCodec {
    fn mp3_info(&self, bytes: &[u8]) -> Result<Mp3Info, CodecError> {
        mpeg::scan(bytes)
    }

    fn wav_info(&self, bytes: &[u8]) -> Result<WavInfo, CodecError> {
        riff::wav_info(bytes)
    }

    fn encode_mp3(&self, bytes: &[u8], from: SoundFormat, bitrate: u32) -> Result<Vec<u8>, CodecError> {
        match from {
            SoundFormat::Mp3 => mpeg::scan(bytes).map(|_| ())?,
            SoundFormat::Wav => riff::wav_info(bytes).map(|_| ())?,
        }
        self.encodes.set(self.encodes.get() + 1);
        Ok(stream(&[bitrate / 1000; 4]))
    }
}

/// Console sink that can be inspected after the console took ownership.
#[derive(Clone, Debug, Default)]
pub(crate) struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    fn append(&self, s: &str) {
        self.0.lock().unwrap().extend_from_slice(s.as_bytes());
    }
}

/// Fixed-width terminal that records what the status bar draws. Cursor
/// moves are dropped and a line clear shows up as `\r`.
#[derive(Debug)]
pub(crate) struct TestTerm {
    pub(crate) width: u16,
    pub(crate) buf: SharedBuf,
}

impl TermLike for TestTerm {
    fn width(&self) -> u16 {
        self.width
    }

    fn move_cursor_up(&self, _n: usize) -> io::Result<()> {
        Ok(())
    }

    fn move_cursor_down(&self, _n: usize) -> io::Result<()> {
        Ok(())
    }

    fn move_cursor_right(&self, _n: usize) -> io::Result<()> {
        Ok(())
    }

    fn move_cursor_left(&self, _n: usize) -> io::Result<()> {
        Ok(())
    }

    fn write_line(&self, s: &str) -> io::Result<()> {
        self.buf.append(s);
        self.buf.append("\n");
        Ok(())
    }

    fn write_str(&self, s: &str) -> io::Result<()> {
        self.buf.append(s);
        Ok(())
    }

    fn clear_line(&self) -> io::Result<()> {
        self.buf.append("\r");
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Confirmation answers fed one key at a time.
pub(crate) struct ScriptedKeys(std::vec::IntoIter<char>);

impl ScriptedKeys {
    pub(crate) fn new(keys: &str) -> Self {
        Self(keys.chars().collect::<Vec<_>>().into_iter())
    }
}

impl KeySource for ScriptedKeys {
    fn read_key(&mut self) -> io::Result<Option<char>> {
        Ok(self.0.next())
    }
}
