//! `coilvm` — runs a compiled module, or a raw streaming instruction
//! file, on the COIL VM.
//!
//! Two input shapes share the `.coil` extension: the sectioned module
//! image `hoilc` writes, and the flat streaming record format the VM
//! executor actually reads. Without `-b`, `program.coil` is parsed as
//! a sectioned module and lowered through `hoil2stream` first; `-b`
//! treats it as an already-streaming byte file, handed to the
//! executor untranslated.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Compiled module or streaming-record file to run.
    input: PathBuf,

    /// Treat `input` as a raw streaming instruction stream rather
    /// than a sectioned module image.
    #[arg(short = 'b', long = "binary")]
    binary: bool,

    /// Print instruction/memory/stack statistics after the run.
    #[arg(short = 's', long = "stats")]
    stats: bool,

    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn install_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();
}

#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
fn load_stream(bytes: &[u8], binary: bool) -> anyhow::Result<Vec<u8>> {
    if binary {
        Ok(bytes.to_vec())
    } else {
        Ok(hoil2stream::translate(bytes)?)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    install_tracing(args.verbose);

    let bytes = match fs::read(&args.input) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("coilvm: {}: {e}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let stream = match load_stream(&bytes, args.binary) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("coilvm: {e}");
            return ExitCode::FAILURE;
        }
    };

    let state = match coil_vm::run(&stream) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("coilvm: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.stats {
        eprintln!(
            "instructions={} memoryUsed={} stackUsed={} callStackUsed={} exitCode={}",
            state.instruction_count(),
            state.memory_used(),
            state.stack_used(),
            state.call_stack_used(),
            state.exit_code(),
        );
    }

    (state.exit_code() as u8).into()
}
