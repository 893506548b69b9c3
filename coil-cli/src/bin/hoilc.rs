//! `hoilc` — compiles a HOIL source file to a COIL module image.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Compile a HOIL source file.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HOIL source file to compile.
    input: PathBuf,

    /// Output path for the compiled module. Defaults to `input` with
    /// its extension replaced by `.coil`.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Increase diagnostic verbosity (repeatable: -v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Configuration assembled once at the edge and threaded down by
/// reference, rather than read from ambient globals mid-compile.
struct Config {
    input: PathBuf,
    output: PathBuf,
}

impl Config {
    fn from_args(args: Args) -> Self {
        let output = args.output.unwrap_or_else(|| args.input.with_extension("coil"));
        Config {
            input: args.input,
            output,
        }
    }
}

fn install_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();
}

#[tracing::instrument(skip(config), fields(input = %config.input.display()))]
fn run(config: &Config) -> anyhow::Result<()> {
    let source = fs::read_to_string(&config.input)
        .map_err(|e| anyhow::anyhow!("{}: {e}", config.input.display()))?;
    let filename: std::rc::Rc<str> = config
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.input.display().to_string())
        .into();

    let module = hoil_syntax::parse_module(&source, filename)?;
    let checked = hoil_syntax::check_module(&module)?;
    let bytes = hoil_syntax::generate(&module, &checked)?;

    fs::write(&config.output, &bytes)
        .map_err(|e| anyhow::anyhow!("{}: {e}", config.output.display()))?;

    tracing::info!(output = %config.output.display(), bytes = bytes.len(), "compiled");
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    install_tracing(args.verbose);
    let config = Config::from_args(args);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("hoilc: {err}");
            ExitCode::FAILURE
        }
    }
}
