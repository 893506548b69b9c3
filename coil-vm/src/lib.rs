//! The streaming COIL VM: runtime state, the record-by-record
//! executor, and a debugger kernel for driving both interactively.
//!
//! This crate only ever sees the streaming instruction encoding
//! (`coil_asm::Instruction`/`WideOpcode`) — the compact Code-section
//! encoding the `hoil-syntax` code generator writes is translated to
//! this stream by `hoil2stream` before it ever reaches an [`Executor`].

pub mod debugger;
pub mod error;
pub mod executor;
pub mod memory;

pub use debugger::{Debugger, BREAKPOINT_CAPACITY};
pub use error::Error;
pub use executor::{Executor, StepOutcome};
pub use memory::{State, CALL_STACK_SIZE, LABEL_TABLE_SIZE, STACK_SIZE, STATIC_MEMORY_SIZE};

/// Runs a streaming program to completion and returns its final state.
/// A thin convenience wrapper over [`Executor::run`] for callers (like
/// the `coilvm` binary) that don't need step-by-step control.
pub fn run(program: &[u8]) -> Result<State, Error> {
    Executor::new(program).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coil_asm::{Instruction, WideOpcode};

    #[test]
    fn run_executes_a_program_to_a_clean_halt() {
        let mut bytes = Vec::new();
        bytes.extend(Instruction::new(WideOpcode::Exit, 0, 0, 3).encode());
        let state = run(&bytes).unwrap();
        assert_eq!(state.exit_code(), 3);
        assert!(!state.running());
    }
}
