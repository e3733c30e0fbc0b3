use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mixopt_core::codec::external::{DEFAULT_LAME, DEFAULT_MAGICK};
use mixopt_core::policy::{parse_max_exponent, DEFAULT_MAX_EXPONENT};
use mixopt_core::{
    optimize, write_report, ConfigError, Input, OptimizeOptions, OptimizeOutcome, StatusConsole, StdinKeys,
};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "mixoptimize",
    version,
    about = "Decrease the size and improve the load time of game asset packages",
    arg_required_else_help = true
)]
struct Cli {
    /// Skip texture conversion to DDS
    #[arg(long)]
    skip_texture_conversion: bool,

    /// Skip resizing textures to a power-of-two square
    #[arg(long)]
    skip_texture_resize: bool,

    /// Largest power of two to use while resizing (2^9 = 512)
    #[arg(long, value_name = "VALUE", allow_hyphen_values = true)]
    max_exponent: Option<String>,

    /// Skip re-encoding sounds to MP3 at 128 kbps
    #[arg(long)]
    skip_sounds: bool,

    /// Apply changes without asking
    #[arg(long)]
    skip_confirmation: bool,

    /// Read the package from standard input (implies --skip-confirmation, requires --out)
    #[arg(long)]
    read_stdin: bool,

    /// Output file (default: overwrite the input)
    #[arg(long)]
    out: Option<PathBuf>,

    /// ImageMagick executable
    #[arg(long, default_value = DEFAULT_MAGICK)]
    magick: String,

    /// LAME executable
    #[arg(long, default_value = DEFAULT_LAME)]
    lame: String,

    /// Write a JSON report of the applied changes
    #[arg(long)]
    report: Option<PathBuf>,

    /// Input package; the words are joined with spaces
    #[arg(trailing_var_arg = true)]
    input: Vec<String>,
}

impl Cli {
    fn max_exponent(&self) -> Result<u32, ConfigError> {
        match &self.max_exponent {
            Some(value) => parse_max_exponent(value),
            None => Ok(DEFAULT_MAX_EXPONENT),
        }
    }

    fn target(&self) -> Option<PathBuf> {
        let joined = self.input.join(" ");
        (!joined.trim().is_empty()).then(|| PathBuf::from(joined))
    }

    fn into_options(self, max_exponent: u32) -> OptimizeOptions {
        OptimizeOptions {
            skip_texture_conversion: self.skip_texture_conversion,
            skip_texture_resize: self.skip_texture_resize,
            max_exponent,
            skip_sounds: self.skip_sounds,
            skip_confirmation: self.skip_confirmation || self.read_stdin,
            read_stdin: self.read_stdin,
            output: self.out,
            magick: self.magick,
            lame: self.lame,
            report: self.report,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    // RUST_LOG controls diagnostics on stderr, "error" when unset
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .try_init();

    println!("MixOptimize utility {}", env!("CARGO_PKG_VERSION"));
    let cli = Cli::parse();

    let console = StatusConsole::stdout();
    let guard = console.interrupt_guard();
    ctrlc::set_handler(move || {
        guard.clear();
        std::process::exit(130);
    })
    .context("failed to set Ctrl-C handler")?;

    let max_exponent = cli.max_exponent().unwrap_or_else(|e| {
        console.print(e.to_string());
        DEFAULT_MAX_EXPONENT
    });

    let input = if cli.read_stdin {
        if cli.out.is_none() {
            console.print(ConfigError::MissingOutput.to_string());
            console.shutdown();
            return Ok(ExitCode::FAILURE);
        }
        Input::stdin()
    } else {
        match cli.target() {
            Some(path) => Input::File(path),
            None => {
                console.print("No input file specified.");
                console.shutdown();
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    let options = cli.into_options(max_exponent);
    debug!(?options, "starting");

    let code = match optimize(&options, &console, input, &mut StdinKeys) {
        Ok(OptimizeOutcome::Applied(report)) => {
            if let Some(path) = &options.report {
                write_report(&report, path)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                console.print(format!("Report written to {}.", path.display()));
            }
            ExitCode::SUCCESS
        }
        Ok(OptimizeOutcome::NothingToDo | OptimizeOutcome::Declined) => ExitCode::SUCCESS,
        Err(e) => {
            console.print(e.to_string());
            ExitCode::FAILURE
        }
    };

    console.shutdown();
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mixoptimize").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_input_words_joined() {
        let cli = parse(&["--skip-sounds", "My", "Map.pkg"]);
        assert_eq!(cli.target(), Some(PathBuf::from("My Map.pkg")));
        assert!(cli.skip_sounds);
    }

    #[test]
    fn test_read_stdin_implies_skip_confirmation() {
        let cli = parse(&["--read-stdin", "--out", "out.pkg"]);
        assert_eq!(cli.target(), None);
        let options = cli.into_options(DEFAULT_MAX_EXPONENT);
        assert!(options.skip_confirmation);
        assert_eq!(options.output, Some(PathBuf::from("out.pkg")));
    }

    #[test]
    fn test_max_exponent_values() {
        assert_eq!(parse(&["a.pkg"]).max_exponent(), Ok(9));
        assert_eq!(parse(&["--max-exponent", "11", "a.pkg"]).max_exponent(), Ok(11));
        assert!(parse(&["--max-exponent", "huge", "a.pkg"]).max_exponent().is_err());
        assert!(parse(&["--max-exponent", "-4", "a.pkg"]).max_exponent().is_err());
    }

    #[test]
    fn test_no_arguments_is_an_error() {
        assert!(Cli::try_parse_from(["mixoptimize"]).is_err());
    }
}
