use super::{
    header, mpeg, riff, tool, AudioCodec, Dimensions, ImageCodec, ImageFormat, Mp3Info, SoundFormat,
    WavInfo,
};
use crate::error::CodecError;

pub const DEFAULT_MAGICK: &str = "magick";
pub const DEFAULT_LAME: &str = "lame";

/// Texture codec backed by ImageMagick.
#[derive(Debug, Clone)]
pub struct MagickImageCodec {
    program: String,
}

impl MagickImageCodec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for MagickImageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAGICK)
    }
}

impl ImageCodec for MagickImageCodec {
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
        let mut args = vec![format!("{}:-", from.coder())];
        if let Some(size) = resize {
            // '!' ignores the aspect ratio
            args.push("-resize".to_string());
            args.push(format!("{}!", size));
        }
        args.push(format!("{}:-", to.coder()));

        let out = tool::pipe_through(&self.program, &args, bytes)?;
        if to == ImageFormat::Dds {
            header::image_dimensions(&out, ImageFormat::Dds)
                .map_err(|e| CodecError::Encode(format!("{} wrote an invalid DDS: {}", self.program, e)))?;
        }
        Ok(out)
    }
}

/// Sound codec backed by the LAME encoder.
#[derive(Debug, Clone)]
pub struct LameAudioCodec {
    program: String,
}

impl LameAudioCodec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for LameAudioCodec {
    fn default() -> Self {
        Self::new(DEFAULT_LAME)
    }
}

impl AudioCodec for LameAudioCodec {
    fn mp3_info(&self, bytes: &[u8]) -> Result<Mp3Info, CodecError> {
        mpeg::scan(bytes)
    }

    fn wav_info(&self, bytes: &[u8]) -> Result<WavInfo, CodecError> {
        riff::wav_info(bytes)
    }

    fn encode_mp3(&self, bytes: &[u8], from: SoundFormat, bitrate: u32) -> Result<Vec<u8>, CodecError> {
        let mut args = vec!["--quiet".to_string()];
        if from == SoundFormat::Mp3 {
            args.push("--mp3input".to_string());
        }
        args.push("--cbr".to_string());
        args.push("-b".to_string());
        args.push((bitrate / 1000).to_string());
        args.push("-".to_string());
        args.push("-".to_string());

        let out = tool::pipe_through(&self.program, &args, bytes)?;
        mpeg::scan(&out)
            .map_err(|e| CodecError::Encode(format!("{} wrote an invalid MP3: {}", self.program, e)))?;
        Ok(out)
    }
}
