use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use super::{Dimensions, ImageFormat};
use crate::error::CodecError;

const TGA_HEADER_LEN: usize = 18;
const DDS_MAGIC: &[u8; 4] = b"DDS ";
const DDS_HEADER_SIZE: u32 = 124;

/// Read width and height from a texture header without decoding pixels.
pub fn image_dimensions(bytes: &[u8], format: ImageFormat) -> Result<Dimensions, CodecError> {
    let dims = match format {
        ImageFormat::Tga => tga_dimensions(bytes)?,
        ImageFormat::Dds => dds_dimensions(bytes)?,
    };
    if dims.width == 0 || dims.height == 0 {
        return Err(CodecError::Decode(format!("zero-sized image ({})", dims)));
    }
    Ok(dims)
}

fn tga_dimensions(bytes: &[u8]) -> Result<Dimensions, CodecError> {
    if bytes.len() < TGA_HEADER_LEN {
        return Err(CodecError::Decode("truncated TGA header".into()));
    }
    // 1-3 uncompressed, 9-11 run-length encoded
    let image_type = bytes[2];
    if !matches!(image_type, 1 | 2 | 3 | 9 | 10 | 11) {
        return Err(CodecError::Decode(format!("unsupported TGA image type {}", image_type)));
    }

    let mut rdr = Cursor::new(&bytes[12..16]);
    let width = rdr.read_u16::<LittleEndian>().map_err(decode)?;
    let height = rdr.read_u16::<LittleEndian>().map_err(decode)?;
    Ok(Dimensions::new(width as u32, height as u32))
}

fn dds_dimensions(bytes: &[u8]) -> Result<Dimensions, CodecError> {
    if bytes.len() < 20 || &bytes[..4] != DDS_MAGIC {
        return Err(CodecError::Decode("missing DDS magic".into()));
    }

    let mut rdr = Cursor::new(&bytes[4..20]);
    let header_size = rdr.read_u32::<LittleEndian>().map_err(decode)?;
    if header_size != DDS_HEADER_SIZE {
        return Err(CodecError::Decode(format!("bad DDS header size {}", header_size)));
    }
    let _flags = rdr.read_u32::<LittleEndian>().map_err(decode)?;
    let height = rdr.read_u32::<LittleEndian>().map_err(decode)?;
    let width = rdr.read_u32::<LittleEndian>().map_err(decode)?;
    Ok(Dimensions::new(width, height))
}

fn decode(e: std::io::Error) -> CodecError {
    CodecError::Decode(e.to_string())
}
