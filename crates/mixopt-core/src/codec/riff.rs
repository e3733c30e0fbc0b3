use std::io::{Cursor, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use super::WavInfo;
use crate::error::CodecError;

/// Read the `fmt ` chunk of a RIFF/WAVE file.
pub fn wav_info(bytes: &[u8]) -> Result<WavInfo, CodecError> {
    if bytes.len() < 12 || &bytes[..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(CodecError::Decode("not a RIFF/WAVE file".into()));
    }

    let mut rdr = Cursor::new(bytes);
    rdr.set_position(12);

    while (rdr.position() as usize) + 8 <= bytes.len() {
        let mut id = [0u8; 4];
        for b in id.iter_mut() {
            *b = rdr.read_u8().map_err(decode)?;
        }
        let size = rdr.read_u32::<LittleEndian>().map_err(decode)?;

        if &id == b"fmt " {
            if size < 16 {
                return Err(CodecError::Decode(format!("fmt chunk too small ({} bytes)", size)));
            }
            let _format_tag = rdr.read_u16::<LittleEndian>().map_err(decode)?;
            let channels = rdr.read_u16::<LittleEndian>().map_err(decode)?;
            let sample_rate = rdr.read_u32::<LittleEndian>().map_err(decode)?;
            let byte_rate = rdr.read_u32::<LittleEndian>().map_err(decode)?;
            let _block_align = rdr.read_u16::<LittleEndian>().map_err(decode)?;
            let bits_per_sample = rdr.read_u16::<LittleEndian>().map_err(decode)?;

            if channels == 0 || sample_rate == 0 {
                return Err(CodecError::Decode("invalid WAVE format".into()));
            }
            return Ok(WavInfo {
                sample_rate,
                channels,
                bits_per_sample,
                bitrate: byte_rate.saturating_mul(8),
            });
        }

        // Chunks are word aligned
        let skip = size as i64 + (size & 1) as i64;
        rdr.seek(SeekFrom::Current(skip)).map_err(decode)?;
    }

    Err(CodecError::Decode("missing fmt chunk".into()))
}

fn decode(e: std::io::Error) -> CodecError {
    CodecError::Decode(e.to_string())
}
