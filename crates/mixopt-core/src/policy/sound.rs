use std::borrow::Cow;

use tracing::trace;

use crate::analysis::AudioAnalysis;
use crate::codec::{AudioCodec, SoundFormat};
use crate::error::CodecError;

/// Target bitrate for every sound, bits per second.
pub const TARGET_BITRATE: u32 = 128_000;
/// How far above the target a bitrate may be before it is re-encoded.
pub const BITRATE_TOLERANCE: u32 = 3_000;

fn exceeds_target(bitrate: u32) -> bool {
    bitrate > TARGET_BITRATE + BITRATE_TOLERANCE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    /// MP3
    Compressed,
    /// WAV
    Uncompressed,
}

impl SoundKind {
    pub fn format(self) -> SoundFormat {
        match self {
            SoundKind::Compressed => SoundFormat::Mp3,
            SoundKind::Uncompressed => SoundFormat::Wav,
        }
    }
}

/// Sound rules: MP3 at no more than 128 kbps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoundPolicy;

impl SoundPolicy {
    pub fn analyze(
        &self,
        codec: &dyn AudioCodec,
        bytes: &[u8],
        kind: SoundKind,
    ) -> Result<AudioAnalysis, CodecError> {
        match kind {
            SoundKind::Compressed => {
                let info = codec.mp3_info(bytes)?;
                let too_high = exceeds_target(info.average_bitrate)
                    || info.frame_bitrates.iter().copied().any(exceeds_target);
                trace!(average = info.average_bitrate, too_high, "mp3 analyzed");

                Ok(AudioAnalysis {
                    needs_conversion: false,
                    needs_bitrate_processing: too_high,
                    old_bitrate: info.average_bitrate,
                    new_bitrate: too_high.then_some(TARGET_BITRATE),
                })
            }
            SoundKind::Uncompressed => {
                let info = codec.wav_info(bytes)?;
                let too_high = exceeds_target(info.bitrate);
                trace!(bitrate = info.bitrate, too_high, "wav analyzed");

                Ok(AudioAnalysis {
                    needs_conversion: true,
                    needs_bitrate_processing: too_high,
                    old_bitrate: info.bitrate,
                    new_bitrate: too_high.then_some(TARGET_BITRATE),
                })
            }
        }
    }

    /// Carry out an analysis. Uncompressed sounds flagged for conversion are
    /// always encoded, so the renamed `.mp3` entry really holds MP3 data.
    pub fn apply<'a>(
        &self,
        codec: &dyn AudioCodec,
        bytes: &'a [u8],
        kind: SoundKind,
        analysis: &AudioAnalysis,
    ) -> Result<Cow<'a, [u8]>, CodecError> {
        let encode = match kind {
            SoundKind::Compressed => analysis.needs_bitrate_processing,
            SoundKind::Uncompressed => analysis.needs_conversion,
        };
        if !encode {
            return Ok(Cow::Borrowed(bytes));
        }

        codec
            .encode_mp3(bytes, kind.format(), TARGET_BITRATE)
            .map(Cow::Owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::mpeg::tests::stream;
    use crate::codec::riff::tests::wav;
    use crate::testing::FakeAudioCodec;

    #[test]
    fn test_mp3_within_tolerance_needs_nothing() {
        let r = SoundPolicy
            .analyze(&FakeAudioCodec::default(), &stream(&[128; 8]), SoundKind::Compressed)
            .unwrap();
        assert!(!r.needs_action());
        assert_eq!(r.new_bitrate, None);
    }

    #[test]
    fn test_mp3_high_average_bitrate() {
        let r = SoundPolicy
            .analyze(&FakeAudioCodec::default(), &stream(&[192; 4]), SoundKind::Compressed)
            .unwrap();
        assert!(r.needs_bitrate_processing);
        assert!(!r.needs_conversion);
        assert_eq!(r.new_bitrate, Some(TARGET_BITRATE));
    }

    #[test]
    fn test_mp3_single_high_frame() {
        // Average stays under the tolerance, one frame does not
        let mut frames = vec![112; 30];
        frames.push(160);
        let r = SoundPolicy
            .analyze(&FakeAudioCodec::default(), &stream(&frames), SoundKind::Compressed)
            .unwrap();
        assert!(r.old_bitrate <= TARGET_BITRATE + BITRATE_TOLERANCE);
        assert!(r.needs_bitrate_processing);
    }

    #[test]
    fn test_wav_always_converts() {
        // 8 kHz mono 16-bit = 128 kbps
        let r = SoundPolicy
            .analyze(&FakeAudioCodec::default(), &wav(8000, 1, 16), SoundKind::Uncompressed)
            .unwrap();
        assert!(r.needs_conversion);
        assert!(!r.needs_bitrate_processing);

        // 44.1 kHz stereo 16-bit = 1411.2 kbps
        let r = SoundPolicy
            .analyze(&FakeAudioCodec::default(), &wav(44100, 2, 16), SoundKind::Uncompressed)
            .unwrap();
        assert!(r.needs_conversion);
        assert!(r.needs_bitrate_processing);
        assert_eq!(r.old_bitrate, 1_411_200);
    }

    #[test]
    fn test_tolerance_boundary() {
        assert!(!exceeds_target(TARGET_BITRATE + BITRATE_TOLERANCE));
        assert!(exceeds_target(TARGET_BITRATE + BITRATE_TOLERANCE + 1));
        assert!(!exceeds_target(96_000));
    }

    #[test]
    fn test_apply_mp3_untouched_without_flag() {
        let codec = FakeAudioCodec::default();
        let bytes = stream(&[128; 2]);
        let analysis = SoundPolicy.analyze(&codec, &bytes, SoundKind::Compressed).unwrap();
        let out = SoundPolicy.apply(&codec, &bytes, SoundKind::Compressed, &analysis).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(codec.encodes(), 0);
    }

    #[test]
    fn test_apply_low_bitrate_wav_still_encodes() {
        let codec = FakeAudioCodec::default();
        let bytes = wav(11025, 1, 8);
        let analysis = SoundPolicy.analyze(&codec, &bytes, SoundKind::Uncompressed).unwrap();
        assert!(!analysis.needs_bitrate_processing);

        let out = SoundPolicy.apply(&codec, &bytes, SoundKind::Uncompressed, &analysis).unwrap();
        assert_eq!(codec.encodes(), 1);
        assert!(codec.mp3_info(&out).is_ok());
    }

    #[test]
    fn test_decode_error_propagates() {
        let codec = FakeAudioCodec::default();
        assert!(SoundPolicy.analyze(&codec, b"nope", SoundKind::Uncompressed).is_err());
        assert!(SoundPolicy.analyze(&codec, b"nope", SoundKind::Compressed).is_err());
    }
}
