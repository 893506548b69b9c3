//! `coil_dump` — prints a sectioned module image's header and section
//! table.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use coil_format::{all_section_kinds, ModuleImage};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Compiled module image to inspect.
    input: PathBuf,
}

fn run(input: &PathBuf) -> anyhow::Result<()> {
    let bytes = fs::read(input).map_err(|e| anyhow::anyhow!("{}: {e}", input.display()))?;
    let image = ModuleImage::parse(&bytes)?;
    let header = image.header();

    println!(
        "magic={:#010x} version={:#010x} sectionCount={}",
        header.magic, header.version, header.section_count
    );

    for kind in all_section_kinds() {
        match image.section_headers().iter().find(|sh| sh.kind().ok() == Some(*kind)) {
            Some(sh) => println!("  {kind:?}: offset={} size={}", sh.offset, sh.size),
            None => println!("  {kind:?}: <absent>"),
        }
    }

    if let Ok(name) = image.module_name() {
        println!("module name: {name}");
    }
    if let Ok(functions) = image.functions() {
        println!("functions: {}", functions.len());
        for f in &functions {
            println!("  {} (index={}, external={})", f.name, f.index, f.is_external);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args.input) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("coil_dump: {err}");
            ExitCode::FAILURE
        }
    }
}
