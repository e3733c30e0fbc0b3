pub mod analysis;
pub mod asset;
pub mod codec;
pub mod error;
pub mod optimizer;
pub mod package;
pub mod patcher;
pub mod policy;
pub mod report;
pub mod status;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use analysis::{AnalysisResult, AudioAnalysis, ImageAnalysis, ResultSet};
pub use asset::{Asset, AssetKind};
pub use codec::{LameAudioCodec, MagickImageCodec};
pub use error::{AssetError, CodecError, ConfigError, OptimizeError, PackageError, Result};
pub use optimizer::{Input, KeySource, OptimizeOutcome, Optimizer, Phase, StdinKeys};
pub use package::{Package, PackageFormat, ZipPackageFormat};
pub use report::{write_report, OptimizeReport};
pub use status::{CancellationToken, InterruptGuard, StatusConsole};

fn default_max_exponent() -> u32 {
    policy::DEFAULT_MAX_EXPONENT
}

fn default_magick() -> String {
    codec::external::DEFAULT_MAGICK.to_string()
}

fn default_lame() -> String {
    codec::external::DEFAULT_LAME.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeOptions {
    #[serde(default)]
    pub skip_texture_conversion: bool,
    #[serde(default)]
    pub skip_texture_resize: bool,
    /// Largest texture side is `2^max_exponent`
    #[serde(default = "default_max_exponent")]
    pub max_exponent: u32,
    #[serde(default)]
    pub skip_sounds: bool,
    #[serde(default)]
    pub skip_confirmation: bool,
    #[serde(default)]
    pub read_stdin: bool,
    /// Defaults to overwriting the input file
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_magick")]
    pub magick: String,
    #[serde(default = "default_lame")]
    pub lame: String,
    #[serde(default)]
    pub report: Option<PathBuf>,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            skip_texture_conversion: false,
            skip_texture_resize: false,
            max_exponent: default_max_exponent(),
            skip_sounds: false,
            skip_confirmation: false,
            read_stdin: false,
            output: None,
            magick: default_magick(),
            lame: default_lame(),
            report: None,
        }
    }
}

/// Run the pipeline with the external encoders and ZIP packages.
pub fn optimize(
    options: &OptimizeOptions,
    console: &StatusConsole,
    input: Input,
    keys: &mut dyn KeySource,
) -> Result<OptimizeOutcome> {
    let images = MagickImageCodec::new(options.magick.as_str());
    let audio = LameAudioCodec::new(options.lame.as_str());
    Optimizer::new(options, console, &images, &audio, &ZipPackageFormat).run(input, keys)
}
