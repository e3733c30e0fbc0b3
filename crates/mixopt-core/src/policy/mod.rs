//! Per-asset decisions: what, if anything, should happen to a texture or a
//! sound, and carrying that decision out.

pub mod sound;
pub mod texture;

pub use sound::{SoundKind, SoundPolicy, BITRATE_TOLERANCE, TARGET_BITRATE};
pub use texture::{
    fit_square, parse_max_exponent, TextureKind, TexturePolicy, DEFAULT_MAX_EXPONENT,
    MAX_EXPONENT_LIMIT,
};
