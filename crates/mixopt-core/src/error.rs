use std::path::PathBuf;

use thiserror::Error;

/// Failure reading or transforming a single asset. Always recoverable at the
/// pipeline level: the asset is reported and left untouched.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("failed to run {program}: {source}")]
    ToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Failure in the package (archive) collaborator.
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("{0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Failure applying the optimizations of one asset. The asset is left as it
/// was and the run continues.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("an asset named {0} already exists")]
    NameTaken(String),

    #[error("no asset at index {0}")]
    Missing(usize),
}

/// Bad flag value. Recovered with a default and a warning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for switch \"--max-exponent\" specified. Using default value... (Must be numeric)")]
    MaxExponentNotNumeric(String),

    #[error("Invalid value for switch \"--max-exponent\" specified. Using default value... (Must be between 0 and {max})")]
    MaxExponentOutOfRange { value: u32, max: u32 },

    #[error("--out switch has to be specified when --read-stdin is used!")]
    MissingOutput,
}

/// Fatal pipeline errors. Each one ends the run before anything is written.
#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("Could not find the specified file \"{}\".", .0.display())]
    MissingInput(PathBuf),

    #[error("The specified package is empty.")]
    EmptyInput,

    #[error("Failed to read the package: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to load package: {0}")]
    ArchiveLoad(#[source] PackageError),

    #[error("Failed to create backup {}: {source}", .path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save package to {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: PackageError,
    },

    #[error("Failed to read confirmation: {0}")]
    Prompt(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
