//! `coildbg` — interactive REPL around the COIL VM executor
//! (`SPEC_FULL.md` §4.L). The stepping/breakpoint bookkeeping lives in
//! `coil_vm::Debugger`; this binary owns the command loop itself.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use coil_vm::{Debugger, Executor, StepOutcome};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Compiled module or streaming-record file to debug.
    input: PathBuf,

    /// Treat `input` as a raw streaming instruction stream rather
    /// than a sectioned module image.
    #[arg(short = 'b', long = "binary")]
    binary: bool,
}

const HELP: &str = "\
help, h                 print this help
step, s                 execute one instruction, stop before next
continue, c, run, r     leave step mode; run until breakpoint, EOF, or fatal error
break <pos>             add breakpoint at file offset (decimal) or label id
delete <idx>            remove breakpoint by list index
list, l                 list labels
breakpoints, bp         list breakpoints
memory <addr> [len=64]  hex+ASCII dump
stack                   dump the data stack
goto <pos|label>        seek the input stream (does not execute)
info, i                 instruction count, memory used, stack used, position
quit, q                 terminate debugger";

fn hex_dump(bytes: &[u8], base: u16) {
    for (row, chunk) in bytes.chunks(16).enumerate() {
        let addr = base as usize + row * 16;
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| if (0x20..0x7f).contains(&b) { b as char } else { '.' })
            .collect();
        println!("{addr:04x}: {:<47} {ascii}", hex.join(" "));
    }
}

/// Resolves a `break`/`goto` argument to a file offset: a plain decimal
/// number is taken as a literal offset; anything else is tried as a
/// label id and resolved against the collected label table.
fn resolve_pos(arg: &str, executor: &Executor<'_>) -> Option<usize> {
    if let Ok(pos) = arg.parse::<usize>() {
        return Some(pos);
    }
    let label: u16 = arg.parse().ok()?;
    executor.state().label_offset(label).ok().map(|off| off as usize)
}

/// Prints one decoded record with label resolution where possible.
fn describe(executor: &Executor<'_>) {
    match executor.peek() {
        Ok(Some(instr)) => println!("{:06} {:?}", executor.position(), instr.opcode),
        Ok(None) => println!("{:06} <end of stream>", executor.position()),
        Err(err) => println!("{:06} <decode error: {err}>", executor.position()),
    }
}

fn read_line(prompt: &str, last: &mut String) -> Option<String> {
    print!("{prompt}");
    io::stdout().flush().ok()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line).ok()? == 0 {
        return None;
    }
    let trimmed = line.trim().to_string();
    if trimmed.is_empty() {
        Some(last.clone())
    } else {
        *last = trimmed.clone();
        Some(trimmed)
    }
}

/// Runs the command loop while stopped. Returns `true` if the user
/// asked to quit the whole session.
fn command_loop(executor: &mut Executor<'_>, debugger: &mut Debugger) -> bool {
    let mut last = String::from("step");
    loop {
        let Some(line) = read_line("(coildbg) ", &mut last) else {
            return true;
        };
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("").to_ascii_lowercase();
        match cmd.as_str() {
            "" => continue,
            "help" | "h" => println!("{HELP}"),
            "step" | "s" => {
                debugger.set_single_stepping(true);
                match executor.step() {
                    Ok(_) => describe(executor),
                    Err(err) => println!("fatal: {err}"),
                }
            }
            "continue" | "c" | "run" | "r" => {
                debugger.set_single_stepping(false);
                return false;
            }
            "break" => {
                let Some(arg) = parts.next() else {
                    println!("usage: break <pos|label>");
                    continue;
                };
                match resolve_pos(arg, executor) {
                    Some(pos) => match debugger.set_breakpoint(pos) {
                        Ok(()) => println!("breakpoint at {pos}"),
                        Err(err) => println!("{err}"),
                    },
                    None => println!("not a file offset or label: {arg}"),
                }
            }
            "delete" => {
                let Some(arg) = parts.next().and_then(|a| a.parse::<usize>().ok()) else {
                    println!("usage: delete <idx>");
                    continue;
                };
                match debugger.remove_breakpoint(arg) {
                    Some(pos) => println!("removed breakpoint at {pos}"),
                    None => println!("no breakpoint at index {arg}"),
                }
            }
            "list" | "l" => {
                let mut labels: Vec<_> = executor.state().labels().collect();
                labels.sort_by_key(|&(id, _)| id);
                for (id, offset) in labels {
                    println!("label {id} -> offset {offset}");
                }
            }
            "breakpoints" | "bp" => {
                for (idx, pos) in debugger.breakpoints().iter().enumerate() {
                    println!("[{idx}] {pos}");
                }
            }
            "memory" => {
                let Some(addr) = parts.next().and_then(|a| a.parse::<u16>().ok()) else {
                    println!("usage: memory <addr> [len=64]");
                    continue;
                };
                let len = parts.next().and_then(|a| a.parse::<usize>().ok()).unwrap_or(64);
                match executor.state().read_memory(addr, len) {
                    Ok(bytes) => hex_dump(bytes, addr),
                    Err(err) => println!("{err}"),
                }
            }
            "stack" => hex_dump(executor.state().stack_bytes(), 0),
            "goto" => {
                let Some(arg) = parts.next().and_then(|a| resolve_pos(a, executor)) else {
                    println!("usage: goto <pos|label>");
                    continue;
                };
                executor.seek(arg);
                describe(executor);
            }
            "info" | "i" => {
                let state = executor.state();
                println!(
                    "pos={} instructions={} memoryUsed={} stackUsed={} callStackUsed={}",
                    executor.position(),
                    state.instruction_count(),
                    state.memory_used(),
                    state.stack_used(),
                    state.call_stack_used(),
                );
            }
            "quit" | "q" => return true,
            other => println!("unknown command: {other} (try 'help')"),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let bytes = match fs::read(&args.input) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("coildbg: {}: {e}", args.input.display());
            return ExitCode::FAILURE;
        }
    };
    let stream = if args.binary {
        bytes
    } else {
        match hoil2stream::translate(&bytes) {
            Ok(s) => s,
            Err(err) => {
                eprintln!("coildbg: {err}");
                return ExitCode::FAILURE;
            }
        }
    };

    let mut executor = Executor::new(&stream);
    if let Err(err) = executor.collect_labels() {
        eprintln!("coildbg: {err}");
        return ExitCode::FAILURE;
    }
    executor.seek(0);

    let mut debugger = Debugger::new();
    debugger.set_single_stepping(true);

    loop {
        if !executor.state().running() {
            break;
        }
        describe(&executor);
        if debugger.should_break(executor.position()) {
            println!("Breakpoint hit at {}", executor.position());
            if command_loop(&mut executor, &mut debugger) {
                break;
            }
            continue;
        }
        if let Err(err) = executor.step() {
            println!("fatal: {err}");
            break;
        }
    }

    println!(
        "exitCode={} instructions={}",
        executor.state().exit_code(),
        executor.state().instruction_count(),
    );
    ExitCode::SUCCESS
}
