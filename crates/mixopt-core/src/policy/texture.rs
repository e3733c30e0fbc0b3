use std::borrow::Cow;

use tracing::trace;

use crate::analysis::ImageAnalysis;
use crate::codec::{Dimensions, ImageCodec, ImageFormat};
use crate::error::{CodecError, ConfigError};

/// Default largest allowed side: 2^9 = 512 px.
pub const DEFAULT_MAX_EXPONENT: u32 = 9;
/// Largest exponent accepted from configuration.
pub const MAX_EXPONENT_LIMIT: u32 = 30;

/// Parse a `--max-exponent` value. Callers fall back to
/// [`DEFAULT_MAX_EXPONENT`] on error.
pub fn parse_max_exponent(value: &str) -> Result<u32, ConfigError> {
    let exponent: u32 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::MaxExponentNotNumeric(value.to_string()))?;
    if exponent > MAX_EXPONENT_LIMIT {
        return Err(ConfigError::MaxExponentOutOfRange {
            value: exponent,
            max: MAX_EXPONENT_LIMIT,
        });
    }
    Ok(exponent)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    /// Already in the target format (DDS); may only be resized.
    Square,
    /// Convertible to the target format (TGA).
    Convertible,
}

impl TextureKind {
    pub fn format(self) -> ImageFormat {
        match self {
            TextureKind::Square => ImageFormat::Dds,
            TextureKind::Convertible => ImageFormat::Tga,
        }
    }
}

/// Square power-of-two side for an image, or `None` if it already fits.
///
/// Non-square images grow to their larger side, non power-of-two sides round
/// up to the next power of two, and the result is capped at `2^max_exponent`.
pub fn fit_square(width: u32, height: u32, max_exponent: u32) -> Option<u32> {
    let max_exponent = max_exponent.min(MAX_EXPONENT_LIMIT);
    let mut resize = false;

    let side = if width != height {
        resize = true;
        width.max(height)
    } else {
        width
    };
    if side == 0 {
        return None;
    }

    let mut exponent = if side.is_power_of_two() {
        side.trailing_zeros()
    } else {
        resize = true;
        32 - (side - 1).leading_zeros()
    };

    if exponent > max_exponent {
        exponent = max_exponent;
        resize = true;
    }

    resize.then(|| 1u32 << exponent)
}

/// Texture rules: square power-of-two sizes and DDS as the storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexturePolicy {
    pub max_exponent: u32,
    pub skip_resize: bool,
    pub skip_conversion: bool,
}

impl Default for TexturePolicy {
    fn default() -> Self {
        Self {
            max_exponent: DEFAULT_MAX_EXPONENT,
            skip_resize: false,
            skip_conversion: false,
        }
    }
}

impl TexturePolicy {
    pub fn analyze(
        &self,
        codec: &dyn ImageCodec,
        bytes: &[u8],
        kind: TextureKind,
    ) -> Result<ImageAnalysis, CodecError> {
        let old_size = codec.dimensions(bytes, kind.format())?;
        let needs_conversion = kind == TextureKind::Convertible && !self.skip_conversion;

        if self.skip_resize {
            return Ok(ImageAnalysis {
                needs_conversion,
                needs_resizing: false,
                old_size,
                new_size: None,
            });
        }

        let new_size = fit_square(old_size.width, old_size.height, self.max_exponent).map(Dimensions::square);
        trace!(%old_size, ?new_size, needs_conversion, "texture analyzed");

        Ok(ImageAnalysis {
            needs_conversion,
            needs_resizing: new_size.is_some(),
            old_size,
            new_size,
        })
    }

    /// Carry out an analysis. Returns the input untouched when nothing is
    /// flagged, otherwise a freshly encoded buffer.
    pub fn apply<'a>(
        &self,
        codec: &dyn ImageCodec,
        bytes: &'a [u8],
        kind: TextureKind,
        analysis: &ImageAnalysis,
    ) -> Result<Cow<'a, [u8]>, CodecError> {
        if !analysis.needs_action() {
            return Ok(Cow::Borrowed(bytes));
        }

        let target = if kind == TextureKind::Convertible && analysis.needs_conversion {
            ImageFormat::Dds
        } else {
            kind.format()
        };
        let resize = if analysis.needs_resizing { analysis.new_size } else { None };

        codec
            .transcode(bytes, kind.format(), resize, target)
            .map(Cow::Owned)
    }
}
